//! OS interaction service: entry point.
//!
//! Runs in the background and lets an automation controller drive the mouse,
//! keyboard and screen of this machine over a local pipe, one JSON object per
//! line.
//!
//! # Usage
//!
//! ```text
//! osi-service [OPTIONS]
//!
//! Options:
//!   --config <PATH>               TOML config file
//!   --endpoint <NAME>             Pipe name or socket path
//!   --fault-cooldown-ms <MS>      Pause after a transport fault [default: 500]
//!   --max-frame-bytes <BYTES>     Largest accepted request line [default: 1048576]
//!   --capture-timeout-secs <SECS> Cancel unattended captures; 0 = never [default: 0]
//!   --log-level <LEVEL>           Used when RUST_LOG is unset [default: info]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                   | Flag                     |
//! |----------------------------|--------------------------|
//! | `OSI_CONFIG`               | `--config`               |
//! | `OSI_ENDPOINT`             | `--endpoint`             |
//! | `OSI_FAULT_COOLDOWN_MS`    | `--fault-cooldown-ms`    |
//! | `OSI_MAX_FRAME_BYTES`      | `--max-frame-bytes`      |
//! | `OSI_CAPTURE_TIMEOUT_SECS` | `--capture-timeout-secs` |
//! | `OSI_LOG_LEVEL`            | `--log-level`            |
//!
//! Flags and variables override the config file, which overrides the
//! built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use osi_service::application::Dispatcher;
use osi_service::domain::ServiceConfig;
use osi_service::infrastructure::transport::{run_server, ServerSettings};
use osi_service::infrastructure::Platform;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Background OS interaction service for automation controllers.
#[derive(Debug, Parser)]
#[command(
    name = "osi-service",
    about = "Exposes mouse, keyboard and screen operations over a local JSON-lines pipe",
    version
)]
struct Cli {
    /// Optional TOML config file.
    #[arg(long, env = "OSI_CONFIG")]
    config: Option<PathBuf>,

    /// Pipe name (Windows) or Unix socket path to listen on.
    #[arg(long, env = "OSI_ENDPOINT")]
    endpoint: Option<String>,

    /// Milliseconds to wait after a transport fault before listening again.
    #[arg(long, env = "OSI_FAULT_COOLDOWN_MS")]
    fault_cooldown_ms: Option<u64>,

    /// Largest accepted request line, in bytes.
    #[arg(long, env = "OSI_MAX_FRAME_BYTES")]
    max_frame_bytes: Option<usize>,

    /// Seconds before an unattended capture session cancels itself (0 = never).
    #[arg(long, env = "OSI_CAPTURE_TIMEOUT_SECS")]
    capture_timeout_secs: Option<u64>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "OSI_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Layers the config file (if any) and then the CLI values over the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    fn into_service_config(self) -> anyhow::Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load(path)
                .with_context(|| format!("failed to load config from '{}'", path.display()))?,
            None => ServiceConfig::default(),
        };

        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(ms) = self.fault_cooldown_ms {
            config.fault_cooldown_ms = ms;
        }
        if let Some(bytes) = self.max_frame_bytes {
            config.max_frame_bytes = bytes;
        }
        if let Some(secs) = self.capture_timeout_secs {
            config.capture_timeout_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// # What happens at startup
///
/// 1. CLI arguments and the optional config file are merged into a
///    [`ServiceConfig`].
/// 2. `tracing_subscriber` is initialised. `RUST_LOG` wins over the
///    configured level.
/// 3. The native platform adapters are wired into a [`Dispatcher`].
/// 4. A Ctrl+C task flips the shutdown watch channel and cancels any active
///    capture session.
/// 5. [`run_server`] serves controllers until shutdown.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_service_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        endpoint = %config.endpoint,
        capture_timeout_secs = config.capture_timeout_secs,
        "OS interaction service starting"
    );

    let dispatcher = Arc::new(Dispatcher::from_platform(
        Platform::native(),
        config.capture_timeout(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received Ctrl+C, shutting down");
                    let _ = shutdown_tx.send(true);
                    dispatcher.shutdown();
                }
                Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
            }
        });
    }

    run_server(ServerSettings::from(&config), dispatcher, shutdown_rx).await;

    info!("OS interaction service stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn bare() -> Cli {
        Cli {
            config: None,
            endpoint: None,
            fault_cooldown_ms: None,
            max_frame_bytes: None,
            capture_timeout_secs: None,
            log_level: None,
        }
    }

    #[test]
    fn test_no_arguments_yield_default_config() {
        // Arrange
        let cli = bare();

        // Act
        let config = cli.into_service_config().unwrap();

        // Assert
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_cli_flag_overrides_default() {
        let cli = Cli::try_parse_from(["osi-service", "--fault-cooldown-ms", "1500"]).unwrap();
        let config = cli.into_service_config().unwrap();
        assert_eq!(config.fault_cooldown_ms, 1500);
    }

    #[test]
    fn test_cli_flag_overrides_config_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("osi-cli-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "log_level = \"debug\"\ncapture_timeout_secs = 10").unwrap();
        let cli = Cli {
            config: Some(path.clone()),
            capture_timeout_secs: Some(45),
            ..bare()
        };

        // Act
        let config = cli.into_service_config().unwrap();
        std::fs::remove_file(&path).ok();

        // Assert
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.capture_timeout_secs, 45);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        // Arrange
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/osi-service.toml")),
            ..bare()
        };

        // Act
        let result = cli.into_service_config();

        // Assert
        assert!(result.is_err());
    }
}
