//! Domain layer for osi-service.
//!
//! Pure service-level types with no dependency on OS APIs, sockets or the
//! async runtime. The wire protocol and the capture state machine live one
//! level lower, in `osi-core`; what remains here is the service's own
//! configuration.

pub mod config;

pub use config::{ConfigError, ServiceConfig};
