//! Per-connection request loop.

use std::sync::Arc;

use osi_core::{encode_response, LineFramer, Response};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, error};

use super::{FrameHandler, TransportError};

/// Bytes requested per read. Frames larger than this simply span reads.
const READ_CHUNK: usize = 8 * 1024;

/// Why [`serve_connection`] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The peer closed its end (zero-length read).
    PeerClosed,
    /// The shutdown signal fired.
    Shutdown,
}

/// Serves one connected peer until it disconnects, an I/O error occurs, or
/// `shutdown` fires.
///
/// Each complete frame is handled on the blocking pool; its response is
/// written and flushed before the next frame is processed. A panicking
/// handler is answered with an Error envelope and the connection continues.
///
/// # Errors
///
/// Returns [`TransportError`] on read/write failures. The caller decides
/// whether to listen again.
pub async fn serve_connection<S>(
    mut stream: S,
    handler: Arc<dyn FrameHandler>,
    max_frame_bytes: usize,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<ConnectionEnd, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framer = LineFramer::new(max_frame_bytes);
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        if *shutdown.borrow() {
            return Ok(ConnectionEnd::Shutdown);
        }

        let n = tokio::select! {
            read = stream.read(&mut buf) => read?,
            _ = shutdown.changed() => return Ok(ConnectionEnd::Shutdown),
        };
        if n == 0 {
            debug!("peer closed the channel");
            return Ok(ConnectionEnd::PeerClosed);
        }

        for frame in framer.push(&buf[..n]) {
            let handler = Arc::clone(&handler);
            let task = tokio::task::spawn_blocking(move || handler.handle(frame));

            let response = tokio::select! {
                joined = task => joined.unwrap_or_else(|e| {
                    error!("request handler failed: {e}");
                    Response::error(format!("Internal error while handling request: {e}"))
                }),
                _ = shutdown.changed() => return Ok(ConnectionEnd::Shutdown),
            };

            let bytes = encode_response(&response)?;
            stream.write_all(&bytes).await?;
            stream.flush().await?;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use osi_core::protocol::Frame;
    use serde_json::{json, Value};
    use tokio::io::{duplex, AsyncBufReadExt, BufReader};

    /// Echoes the command name, panics on "Boom".
    struct EchoHandler;

    impl FrameHandler for EchoHandler {
        fn handle(&self, frame: Frame) -> Response {
            match frame {
                Ok(line) => {
                    let request = osi_core::decode_request(&line).unwrap_or_default();
                    match request.command_name() {
                        Some("Boom") => panic!("handler exploded"),
                        Some(name) => Response::success(json!({ "echo": name })),
                        None => Response::error("no command"),
                    }
                }
                Err(e) => Response::error(e.to_string()),
            }
        }
    }

    fn parse(line: &str) -> Value {
        serde_json::from_str(line.trim_end()).expect("response must be JSON")
    }

    #[tokio::test]
    async fn test_responses_follow_request_order() {
        // Arrange
        let (client, server) = duplex(4096);
        let (_tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            serve_connection(server, Arc::new(EchoHandler), 1024, &mut rx).await
        });
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut lines = BufReader::new(read_half).lines();

        // Act
        write_half
            .write_all(b"{\"Command\":\"A\"}\n{\"Command\":\"B\"}\n")
            .await
            .unwrap();

        // Assert
        let first = parse(&lines.next_line().await.unwrap().unwrap());
        let second = parse(&lines.next_line().await.unwrap().unwrap());
        assert_eq!(first["Result"]["echo"], "A");
        assert_eq!(second["Result"]["echo"], "B");

        drop(write_half);
        drop(lines);
        assert_eq!(task.await.unwrap().unwrap(), ConnectionEnd::PeerClosed);
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_error_envelope_and_connection_survives() {
        // Arrange
        let (client, server) = duplex(4096);
        let (_tx, mut rx) = watch::channel(false);
        tokio::spawn(async move {
            serve_connection(server, Arc::new(EchoHandler), 1024, &mut rx).await
        });
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut lines = BufReader::new(read_half).lines();

        // Act
        write_half
            .write_all(b"{\"Command\":\"Boom\"}\n{\"Command\":\"After\"}\n")
            .await
            .unwrap();

        // Assert
        let failed = parse(&lines.next_line().await.unwrap().unwrap());
        assert_eq!(failed["Status"], "Error");
        let after = parse(&lines.next_line().await.unwrap().unwrap());
        assert_eq!(after["Result"]["echo"], "After");
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pending_read() {
        // Arrange
        let (_client, server) = duplex(64);
        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            serve_connection(server, Arc::new(EchoHandler), 1024, &mut rx).await
        });

        // Act
        tx.send(true).unwrap();

        // Assert
        assert_eq!(task.await.unwrap().unwrap(), ConnectionEnd::Shutdown);
    }

    #[tokio::test]
    async fn test_split_frame_across_writes_is_reassembled() {
        // Arrange
        let stream = tokio_test::io::Builder::new()
            .read(b"{\"Comm")
            .read(b"and\":\"Ping\"}\n")
            .write(b"{\"Status\":\"Success\",\"Message\":null,\"Result\":{\"echo\":\"Ping\"}}\n")
            .build();
        let (_tx, mut rx) = watch::channel(false);

        // Act
        let end = serve_connection(stream, Arc::new(EchoHandler), 1024, &mut rx)
            .await
            .unwrap();

        // Assert
        assert_eq!(end, ConnectionEnd::PeerClosed);
    }
}
