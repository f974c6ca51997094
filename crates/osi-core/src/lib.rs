//! # osi-core
//!
//! Shared library for the OS interaction service containing the wire protocol,
//! the typed command catalog, screen geometry, the interactive capture session
//! state machine, and the key-name table.
//!
//! It has zero dependencies on OS APIs, threads, or sockets, so everything here
//! is testable on any host.
//!
//! # Architecture overview (for beginners)
//!
//! The service runs in the background and lets an automation controller drive
//! the mouse, keyboard, and screen of the machine it runs on. The controller
//! talks to it over a local pipe, one JSON object per line.
//!
//! - **`protocol`** – How bytes become requests and responses: line framing,
//!   the `Command`/`Params` and `Status`/`Message`/`Result` envelopes, and a
//!   typed command for every operation with its parameter defaults.
//!
//! - **`domain`** – The virtual-screen coordinate space (clamping and the
//!   normalization used for pointer injection) and the capture session that
//!   turns pointer and key events into strokes, a rectangle, or points.
//!
//! - **`keymap`** – Translates human-readable key names (`"enter"`, `"f5"`)
//!   into Windows virtual key codes.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::capture::{
    CancelReason, CaptureMode, CaptureResult, CaptureSession, OverlayScene, PointerButton,
    Resolution, SessionEvent, SessionKey, SessionState, Step, Stroke,
};
pub use domain::geometry::{Point, Region, ScreenSize, VirtualScreen};
pub use keymap::{resolve_key_name, VirtualKey};
pub use protocol::{
    decode_request, encode_response, Command, CommandError, FrameError, LineFramer, Request,
    Response, ResponseStatus,
};
