//! Service configuration.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults ([`ServiceConfig::default`]).
//! 2. An optional TOML file passed with `--config`.
//! 3. Command-line flags and `OSI_*` environment variables (see `main.rs`).
//!
//! Example file:
//!
//! ```toml
//! endpoint = '\\.\pipe\AutoClickerEnhanced_OS_Interaction_Pipe'
//! fault_cooldown_ms = 500
//! max_frame_bytes = 1048576
//! capture_timeout_secs = 0
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so a partial file (or an empty one) is
//! valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use osi_core::protocol::DEFAULT_MAX_FRAME_BYTES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings for the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Pipe name (Windows) or socket path (elsewhere) to listen on.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Pause after a transport fault before listening again.
    #[serde(default = "default_fault_cooldown_ms")]
    pub fault_cooldown_ms: u64,
    /// Largest accepted request line, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Seconds before an unattended capture session cancels itself; `0` waits
    /// forever.
    #[serde(default)]
    pub capture_timeout_secs: u64,
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Pipe name the automation controller connects to.
pub const DEFAULT_PIPE_NAME: &str = r"\\.\pipe\AutoClickerEnhanced_OS_Interaction_Pipe";

/// The endpoint used when none is configured: the controller's pipe on
/// Windows, a socket in the temp directory elsewhere.
pub fn default_endpoint() -> String {
    if cfg!(target_os = "windows") {
        DEFAULT_PIPE_NAME.to_string()
    } else {
        std::env::temp_dir()
            .join("osi-service.sock")
            .to_string_lossy()
            .into_owned()
    }
}

fn default_fault_cooldown_ms() -> u64 {
    500
}
fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            fault_cooldown_ms: default_fault_cooldown_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            capture_timeout_secs: 0,
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Reads a config file. A missing file is an error here; callers only
    /// pass paths the user asked for.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn fault_cooldown(&self) -> Duration {
        Duration::from_millis(self.fault_cooldown_ms)
    }

    /// `None` when the timeout is disabled.
    pub fn capture_timeout(&self) -> Option<Duration> {
        (self.capture_timeout_secs > 0).then(|| Duration::from_secs(self.capture_timeout_secs))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        // Arrange / Act
        let cfg = ServiceConfig::default();

        // Assert
        assert_eq!(cfg.endpoint, default_endpoint());
        assert_eq!(cfg.fault_cooldown_ms, 500);
        assert_eq!(cfg.max_frame_bytes, 1024 * 1024);
        assert_eq!(cfg.capture_timeout_secs, 0);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg = ServiceConfig::from_toml("").unwrap();
        assert_eq!(cfg, ServiceConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        // Arrange
        let text = "fault_cooldown_ms = 2000\nlog_level = \"debug\"\n";

        // Act
        let cfg = ServiceConfig::from_toml(text).unwrap();

        // Assert
        assert_eq!(cfg.fault_cooldown_ms, 2000);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.max_frame_bytes, 1024 * 1024);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = ServiceConfig::from_toml("fault_cooldown_ms = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ServiceConfig::load(Path::new("/nonexistent/osi/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_capture_timeout_zero_is_disabled() {
        let mut cfg = ServiceConfig::default();
        assert_eq!(cfg.capture_timeout(), None);

        cfg.capture_timeout_secs = 30;
        assert_eq!(cfg.capture_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_default_endpoint_is_controller_pipe_on_windows() {
        let endpoint = default_endpoint();
        if cfg!(target_os = "windows") {
            assert_eq!(endpoint, DEFAULT_PIPE_NAME);
        } else {
            assert!(endpoint.ends_with("osi-service.sock"));
        }
    }
}
