//! Interactive capture sessions at runtime.
//!
//! | Module        | Purpose                                                  |
//! |---------------|----------------------------------------------------------|
//! | `coordinator` | One-session-at-a-time rule, spawn, wait, force-cancel    |
//! | `actor`       | The session thread: pump, apply events, clean up         |
//! | `outcome`     | Payload types, JSON shape, single-assignment result slot |
//!
//! The decision logic itself (strokes, rubber band, point counting) lives in
//! `osi_core::domain::capture`.

mod actor;
pub mod coordinator;
pub mod outcome;

pub use coordinator::CaptureCoordinator;
pub use outcome::{CaptureError, CaptureOutcome, CapturePayload};
