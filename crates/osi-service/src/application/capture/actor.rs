//! The session thread.
//!
//! One actor runs per capture session, on its own OS thread. It opens the
//! capture surface (overlay + interceptors must live on the thread that pumps
//! their messages), then alternates between pumping OS messages and draining
//! its inbox until the session resolves.
//!
//! Resolution order is fixed: close the surface, finalize the payload (the
//! region image is grabbed only after the overlay is gone, so the overlay never
//! appears in it), then publish.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use osi_core::{
    CancelReason, CaptureMode, CaptureResult, CaptureSession, Point, Region, Resolution,
    SessionEvent, Step,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::outcome::{CaptureOutcome, CapturePayload, OutcomeSlot};
use crate::application::imaging::{encode_base64_png, ImageOptions};
use crate::infrastructure::capture_surface::CaptureBackend;
use crate::infrastructure::screen::ScreenAccess;

/// Longest wait for an inbox event before OS messages are pumped again.
const PUMP_INTERVAL: Duration = Duration::from_millis(15);

pub(crate) struct SessionActor {
    pub(crate) id: Uuid,
    pub(crate) session: CaptureSession,
    pub(crate) backend: Arc<dyn CaptureBackend>,
    pub(crate) screen: Arc<dyn ScreenAccess>,
    pub(crate) inbox: Receiver<SessionEvent>,
    /// Handed to the surface so interceptor callbacks can post events.
    pub(crate) events: Sender<SessionEvent>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) slot: OutcomeSlot,
}

impl SessionActor {
    pub(crate) fn run(mut self) {
        let mode = self.session.mode();
        let resolution = self.drive(mode);
        let outcome = self.finalize(resolution);
        match &outcome {
            CaptureOutcome::Completed(_) => info!(session = %self.id, "capture completed"),
            CaptureOutcome::Cancelled(reason) => {
                info!(session = %self.id, ?reason, "capture cancelled")
            }
        }
        self.slot.publish(outcome);
    }

    /// Runs the surface until the session resolves. The surface is closed
    /// before this returns.
    fn drive(&mut self, mode: CaptureMode) -> Resolution {
        let bounds = match self.screen.virtual_bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!(session = %self.id, "cannot read screen bounds: {e}");
                return self.cancel(CancelReason::InterceptorUnavailable);
            }
        };

        let mut surface = match self.backend.open(mode, bounds, self.events.clone()) {
            Ok(surface) => surface,
            Err(e) => {
                warn!(session = %self.id, "capture surface unavailable: {e}");
                return self.cancel(CancelReason::InterceptorUnavailable);
            }
        };

        self.session.activate();
        surface.render(&self.session.scene());
        debug!(session = %self.id, mode = mode.label(), "capture active");

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let resolution = loop {
            surface.pump();

            let step = match self.inbox.recv_timeout(PUMP_INTERVAL) {
                Ok(event) => self.session.apply(event),
                Err(RecvTimeoutError::Timeout) => Step::Continue { repaint: false },
                Err(RecvTimeoutError::Disconnected) => {
                    self.session.apply(SessionEvent::Cancel(CancelReason::Shutdown))
                }
            };
            match step {
                Step::Resolved(resolution) => break resolution,
                Step::Continue { repaint: true } => surface.render(&self.session.scene()),
                Step::Continue { repaint: false } => {}
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                if let Step::Resolved(resolution) =
                    self.session.apply(SessionEvent::Cancel(CancelReason::TimedOut))
                {
                    break resolution;
                }
            }
        };

        surface.close();
        debug!(session = %self.id, "capture surface closed");
        resolution
    }

    fn cancel(&mut self, reason: CancelReason) -> Resolution {
        match self.session.apply(SessionEvent::Cancel(reason)) {
            Step::Resolved(resolution) => resolution,
            Step::Continue { .. } => Resolution::Cancelled(reason),
        }
    }

    fn finalize(&self, resolution: Resolution) -> CaptureOutcome {
        match resolution {
            Resolution::Cancelled(reason) => CaptureOutcome::Cancelled(reason),
            Resolution::Completed(CaptureResult::Drawing(strokes)) => {
                CaptureOutcome::Completed(CapturePayload::Drawing(strokes))
            }
            Resolution::Completed(CaptureResult::Points(points)) => {
                CaptureOutcome::Completed(CapturePayload::Points(points))
            }
            Resolution::Completed(CaptureResult::Region(region)) => {
                CaptureOutcome::Completed(CapturePayload::Region {
                    region,
                    image_base64: self.region_image(region),
                })
            }
        }
    }

    fn region_image(&self, region: Region) -> Option<String> {
        let captured = self.screen.virtual_bounds().ok().and_then(|bounds| {
            bounds.clip_region(Point::new(region.x1, region.y1), Point::new(region.x2, region.y2))
        });
        let Some(clipped) = captured else {
            warn!(session = %self.id, ?region, "selected region is outside the screen");
            return None;
        };
        match self
            .screen
            .capture(clipped)
            .map_err(|e| e.to_string())
            .and_then(|image| {
                encode_base64_png(&image, ImageOptions::default()).map_err(|e| e.to_string())
            }) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!(session = %self.id, "region image capture failed: {e}");
                None
            }
        }
    }
}
