//! Integration tests for one controller connection.
//!
//! A real `Dispatcher` (over mocks) is served on one end of an in-memory
//! duplex stream; the test plays the controller on the other end, writing raw
//! bytes and reading response lines exactly as the pipe client would.

use std::sync::Arc;
use std::time::Duration;

use osi_service::application::Dispatcher;
use osi_service::infrastructure::capture_surface::mock::ScriptedBackend;
use osi_service::infrastructure::input_injection::mock::MockInputInjector;
use osi_service::infrastructure::screen::mock::MockScreen;
use osi_service::infrastructure::system::UnsupportedSystem;
use osi_service::infrastructure::transport::{serve_connection, ConnectionEnd};
use osi_service::infrastructure::Platform;
use serde_json::Value;
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::sync::watch;
use tokio::task::JoinHandle;

type Reader = Lines<BufReader<ReadHalf<DuplexStream>>>;

struct Controller {
    lines: Reader,
    writer: WriteHalf<DuplexStream>,
    task: JoinHandle<ConnectionEnd>,
    shutdown: watch::Sender<bool>,
}

fn dispatcher(backend: ScriptedBackend) -> Arc<Dispatcher> {
    let platform = Platform {
        injector: Arc::new(MockInputInjector::new()),
        screen: Arc::new(MockScreen::single_1080p()),
        system: Arc::new(UnsupportedSystem),
        capture: Arc::new(backend),
    };
    Arc::new(Dispatcher::from_platform(platform, None))
}

fn connect(max_frame_bytes: usize, backend: ScriptedBackend) -> Controller {
    let (client, server) = duplex(64 * 1024);
    let (shutdown, mut rx) = watch::channel(false);
    let handler = dispatcher(backend);
    let task = tokio::spawn(async move {
        serve_connection(server, handler, max_frame_bytes, &mut rx)
            .await
            .expect("connection must not fault")
    });
    let (read_half, writer) = tokio::io::split(client);
    Controller {
        lines: BufReader::new(read_half).lines(),
        writer,
        task,
        shutdown,
    }
}

async fn next_response(lines: &mut Reader) -> Value {
    let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
        .await
        .expect("response within 5 s")
        .expect("readable")
        .expect("a response line");
    serde_json::from_str(&line).expect("response is JSON")
}

#[tokio::test]
async fn test_ping_round_trip() {
    // Arrange
    let mut c = connect(1024, ScriptedBackend::new());

    // Act
    c.writer.write_all(b"{\"Command\":\"Ping\"}\n").await.unwrap();

    // Assert
    let response = next_response(&mut c.lines).await;
    assert_eq!(response["Status"], "Success");
    assert_eq!(response["Result"]["message"], "Pong");
    assert!(response["Message"].is_null());
}

#[tokio::test]
async fn test_blank_lines_get_no_response() {
    // Arrange
    let mut c = connect(1024, ScriptedBackend::new());

    // Act
    c.writer
        .write_all(b"\n\r\n   \n{\"Command\":\"GetScreenSize\"}\n")
        .await
        .unwrap();

    // Assert: the first line back answers the only real request
    let response = next_response(&mut c.lines).await;
    assert_eq!(response["Result"]["width"], 1920);
}

#[tokio::test]
async fn test_invalid_json_then_valid_request() {
    // Arrange
    let mut c = connect(1024, ScriptedBackend::new());

    // Act
    c.writer
        .write_all(b"{\"Command\": Ping}\n{\"Command\":\"Ping\"}\n")
        .await
        .unwrap();

    // Assert
    let bad = next_response(&mut c.lines).await;
    assert_eq!(bad["Status"], "Error");
    assert!(bad["Message"].as_str().unwrap().starts_with("Invalid JSON request:"));
    let good = next_response(&mut c.lines).await;
    assert_eq!(good["Status"], "Success");
}

#[tokio::test]
async fn test_oversized_frame_yields_one_error_and_next_frame_is_intact() {
    // Arrange
    let mut c = connect(64, ScriptedBackend::new());
    let mut payload = vec![b'x'; 500];
    payload.push(b'\n');
    payload.extend_from_slice(b"{\"Command\":\"Ping\"}\n");

    // Act
    c.writer.write_all(&payload).await.unwrap();

    // Assert
    let oversized = next_response(&mut c.lines).await;
    assert_eq!(oversized["Status"], "Error");
    assert!(oversized["Message"].as_str().unwrap().contains("64"));
    let ping = next_response(&mut c.lines).await;
    assert_eq!(ping["Result"]["message"], "Pong");
}

#[tokio::test]
async fn test_request_split_across_writes() {
    // Arrange
    let mut c = connect(1024, ScriptedBackend::new());

    // Act
    c.writer.write_all(b"{\"Comm").await.unwrap();
    c.writer.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    c.writer.write_all(b"and\":\"Ping\"}\n").await.unwrap();

    // Assert
    let response = next_response(&mut c.lines).await;
    assert_eq!(response["Result"]["message"], "Pong");
}

#[tokio::test]
async fn test_capture_session_answers_on_same_connection() {
    // Arrange
    let backend = ScriptedBackend::with_script(vec![osi_core::SessionEvent::KeyDown(
        osi_core::SessionKey::Escape,
    )]);
    let mut c = connect(1024, backend);

    // Act
    c.writer
        .write_all(b"{\"Command\":\"StartInteractiveRegionSelect\"}\n{\"Command\":\"Ping\"}\n")
        .await
        .unwrap();

    // Assert
    let capture = next_response(&mut c.lines).await;
    assert_eq!(capture["Status"], "Success");
    assert!(capture["Result"].is_null());
    let ping = next_response(&mut c.lines).await;
    assert_eq!(ping["Result"]["message"], "Pong");
}

#[tokio::test]
async fn test_peer_close_ends_connection() {
    // Arrange
    let c = connect(1024, ScriptedBackend::new());

    // Act
    drop(c.writer);
    drop(c.lines);

    // Assert
    let end = tokio::time::timeout(Duration::from_secs(5), c.task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(end, ConnectionEnd::PeerClosed);
}

#[tokio::test]
async fn test_shutdown_ends_idle_connection() {
    // Arrange
    let c = connect(1024, ScriptedBackend::new());

    // Act
    c.shutdown.send(true).unwrap();

    // Assert
    let end = tokio::time::timeout(Duration::from_secs(5), c.task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(end, ConnectionEnd::Shutdown);
}
