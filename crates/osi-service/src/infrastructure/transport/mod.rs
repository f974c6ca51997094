//! The local duplex channel to the automation controller.
//!
//! # Connection lifecycle (for beginners)
//!
//! ```text
//!            ┌───────────────────── fault: warn + cooldown ─────────────┐
//!            ▼                                                          │
//!  Idle ──▶ Listening ──accept──▶ Connected ──peer closed──▶ Idle ──────┘
//!            ▲                                                  │
//!            └──────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one controller is served at a time. While connected, every request
//! line is handed to a [`FrameHandler`] on Tokio's blocking pool and its single
//! response is written and flushed before the next line is looked at, so
//! responses always leave in request order.
//!
//! A shutdown signal (a `tokio::sync::watch` flag) interrupts a pending accept,
//! read, or handler wait and makes [`run_server`] return `Ok(())`.
//!
//! | Module       | Purpose                                               |
//! |--------------|-------------------------------------------------------|
//! | `connection` | Per-connection read → dispatch → write loop           |
//! | `listener`   | Named pipe (Windows) or Unix socket (other targets)   |
//! | `server`     | The Idle/Listening/Connected state loop               |

use std::io;

use osi_core::protocol::{Frame, ProtocolError};
use osi_core::Response;
use thiserror::Error;

pub mod connection;
pub mod listener;
pub mod server;

pub use connection::{serve_connection, ConnectionEnd};
pub use listener::EndpointListener;
pub use server::{run_server, ServerSettings, ServerState};

/// Errors that end one connection. The server loop recovers from all of them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from or writing to the channel failed.
    #[error("channel I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A response could not be serialized.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// Turns one request frame into exactly one response.
///
/// Called on Tokio's blocking pool, so implementations may block (sleeps
/// between injected events, waiting for a capture session).
pub trait FrameHandler: Send + Sync + 'static {
    fn handle(&self, frame: Frame) -> Response;
}
