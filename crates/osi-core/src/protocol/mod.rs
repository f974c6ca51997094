//! Wire protocol for the controller channel.
//!
//! # How a request travels (for beginners)
//!
//! 1. Raw bytes arrive from the pipe and are fed to a [`framer::LineFramer`],
//!    which cuts them into one string per `\n`-terminated line.
//! 2. Each line is decoded into an [`envelope::Request`] with `serde_json`.
//! 3. [`commands::Command::parse`] turns the request into a typed command,
//!    filling optional parameters from [`params::Params`] with their defaults.
//! 4. The service executes the command and answers with exactly one
//!    [`envelope::Response`], encoded back to a single line.

pub mod commands;
pub mod envelope;
pub mod framer;
pub mod params;

pub use commands::{Command, CommandError};
pub use envelope::{decode_request, encode_response, ProtocolError, Request, Response, ResponseStatus};
pub use framer::{Frame, FrameError, LineFramer, DEFAULT_MAX_FRAME_BYTES};
pub use params::Params;
