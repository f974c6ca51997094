//! What a capture session hands back to the dispatcher.

use std::sync::{Mutex, PoisonError};

use osi_core::{CancelReason, Point, Region, Stroke};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::warn;

/// Errors that prevent a session from producing an outcome at all.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("an interactive capture session is already active")]
    SessionActive,

    #[error("failed to start capture thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("capture session ended without reporting an outcome")]
    Abandoned,
}

/// A completed session's result, with the region image attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturePayload {
    Drawing(Vec<Stroke>),
    Region {
        region: Region,
        /// Base64 PNG of the region, `None` if the capture failed.
        image_base64: Option<String>,
    },
    Points(Vec<Point>),
}

impl CapturePayload {
    /// The `Result` value sent to the controller.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Drawing(strokes) => Value::Array(
                strokes
                    .iter()
                    .map(|stroke| Value::Array(stroke.iter().map(point_json).collect()))
                    .collect(),
            ),
            Self::Region {
                region,
                image_base64,
            } => json!({
                "x1": region.x1,
                "y1": region.y1,
                "x2": region.x2,
                "y2": region.y2,
                "image_base64": image_base64,
            }),
            Self::Points(points) => Value::Array(points.iter().map(point_json).collect()),
        }
    }
}

fn point_json(p: &Point) -> Value {
    json!({ "x": p.x, "y": p.y })
}

/// Final outcome of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Completed(CapturePayload),
    Cancelled(CancelReason),
}

impl CaptureOutcome {
    /// The `Result` value sent to the controller; cancellations are `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Completed(payload) => payload.to_json(),
            Self::Cancelled(_) => Value::Null,
        }
    }
}

/// Single-assignment slot for a session outcome.
///
/// The first [`publish`](Self::publish) wins; later calls are ignored and
/// return `false`, so the waiting dispatcher sees exactly one outcome.
#[derive(Debug)]
pub(crate) struct OutcomeSlot {
    sender: Mutex<Option<oneshot::Sender<CaptureOutcome>>>,
}

impl OutcomeSlot {
    pub(crate) fn new(sender: oneshot::Sender<CaptureOutcome>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    pub(crate) fn publish(&self, outcome: CaptureOutcome) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    warn!("capture outcome had no waiter");
                }
                true
            }
            None => {
                warn!(?outcome, "capture session already resolved; outcome dropped");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
