//! The Idle → Listening → Connected state loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::connection::{serve_connection, ConnectionEnd};
use super::listener::EndpointListener;
use super::FrameHandler;
use crate::domain::ServiceConfig;

/// Where the server loop currently is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Listening,
    Connected,
}

/// Settings the loop needs from the service configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub endpoint: String,
    pub fault_cooldown: Duration,
    pub max_frame_bytes: usize,
}

impl From<&ServiceConfig> for ServerSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            fault_cooldown: config.fault_cooldown(),
            max_frame_bytes: config.max_frame_bytes,
        }
    }
}

/// Serves controllers one at a time until `shutdown` becomes `true` (or its
/// sender is dropped).
///
/// Faults while listening or connected are logged and followed by
/// `fault_cooldown` before the next listen; they never end the loop.
pub async fn run_server(
    settings: ServerSettings,
    handler: Arc<dyn FrameHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut listener = EndpointListener::new(&settings.endpoint);
    let mut state = ServerState::Idle;
    info!(endpoint = listener.endpoint(), "server loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        transition(&mut state, ServerState::Listening);
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.changed() => break,
        };

        let stream = match accepted {
            Ok(stream) => stream,
            Err(e) => {
                warn!("listen failed: {e}");
                transition(&mut state, ServerState::Idle);
                if cooldown(settings.fault_cooldown, &mut shutdown).await {
                    break;
                }
                continue;
            }
        };

        transition(&mut state, ServerState::Connected);
        info!("controller connected");
        let outcome = serve_connection(
            stream,
            Arc::clone(&handler),
            settings.max_frame_bytes,
            &mut shutdown,
        )
        .await;
        transition(&mut state, ServerState::Idle);

        match outcome {
            Ok(ConnectionEnd::PeerClosed) => info!("controller disconnected"),
            Ok(ConnectionEnd::Shutdown) => break,
            Err(e) => {
                warn!("connection fault: {e}");
                if cooldown(settings.fault_cooldown, &mut shutdown).await {
                    break;
                }
            }
        }
    }

    info!("server loop stopped");
}

fn transition(state: &mut ServerState, next: ServerState) {
    if *state != next {
        debug!(from = ?*state, to = ?next, "server state");
        *state = next;
    }
}

/// Sleeps for `period`. Returns `true` if shutdown was requested meanwhile.
async fn cooldown(period: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(period) => *shutdown.borrow(),
        _ = shutdown.changed() => true,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
