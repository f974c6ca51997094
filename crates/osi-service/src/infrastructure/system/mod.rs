//! Window and process existence lookups.
//!
//! The inspector only reports raw OS facts (does a matching top-level window
//! exist, which executables are running); name normalisation and matching
//! live in the facade so they can be tested without an OS.

use osi_core::protocol::commands::WindowQuery;
use thiserror::Error;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for system lookups.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("system query failed: {0}")]
    Platform(String),

    #[error("system queries are not supported on this platform")]
    Unsupported,
}

/// OS-level window and process lookups.
#[cfg_attr(test, mockall::automock)]
pub trait SystemInspector: Send + Sync {
    /// Whether a top-level window matches the class and/or title in `query`.
    fn window_exists(&self, query: &WindowQuery) -> Result<bool, SystemError>;

    /// Executable names of all running processes (e.g. `"notepad.exe"`).
    fn process_names(&self) -> Result<Vec<String>, SystemError>;
}

/// Inspector for builds without a system backend.
#[derive(Debug, Default)]
pub struct UnsupportedSystem;

impl SystemInspector for UnsupportedSystem {
    fn window_exists(&self, _query: &WindowQuery) -> Result<bool, SystemError> {
        Err(SystemError::Unsupported)
    }

    fn process_names(&self) -> Result<Vec<String>, SystemError> {
        Err(SystemError::Unsupported)
    }
}

#[cfg(target_os = "windows")]
pub use windows::WindowsSystem as NativeSystem;

#[cfg(not(target_os = "windows"))]
pub use UnsupportedSystem as NativeSystem;
