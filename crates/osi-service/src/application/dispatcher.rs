//! Command dispatcher: one request frame in, exactly one response out.
//!
//! # Request pipeline
//!
//! ```text
//! Frame ─▶ decode_request ─▶ Command::parse ─▶ execute ─▶ Response
//!   │            │                 │               │
//!   └─ FrameError└─ Invalid JSON   └─ CommandError └─ FacadeError / CaptureError
//!        (each fault becomes an Error envelope; nothing else runs)
//! ```
//!
//! The dispatcher is synchronous and may block (timed input, capture
//! sessions). The transport calls it from Tokio's blocking pool through the
//! [`FrameHandler`] trait.

use std::sync::Arc;

use osi_core::protocol::Frame;
use osi_core::{decode_request, CancelReason, CaptureMode, Command, Response};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::capture::{CaptureCoordinator, CaptureOutcome};
use super::facade::{KeyOutcome, OsFacade};
use crate::infrastructure::transport::FrameHandler;
use crate::infrastructure::Platform;

/// Routes typed commands to the facade or the capture coordinator.
pub struct Dispatcher {
    facade: OsFacade,
    capture: Arc<CaptureCoordinator>,
}

impl Dispatcher {
    pub fn new(facade: OsFacade, capture: Arc<CaptureCoordinator>) -> Self {
        Self { facade, capture }
    }

    /// Builds a dispatcher over a set of platform adapters.
    pub fn from_platform(platform: Platform, capture_timeout: Option<std::time::Duration>) -> Self {
        let capture = Arc::new(CaptureCoordinator::new(
            platform.capture,
            Arc::clone(&platform.screen),
            capture_timeout,
        ));
        let facade = OsFacade::new(platform.injector, platform.screen, platform.system);
        Self::new(facade, capture)
    }

    /// Handles one framed line.
    pub fn handle_frame(&self, frame: Frame) -> Response {
        match frame {
            Ok(line) => self.handle_line(&line),
            Err(e) => {
                warn!("rejected frame: {e}");
                Response::error(e.to_string())
            }
        }
    }

    /// Decodes, parses and executes one request line.
    pub fn handle_line(&self, line: &str) -> Response {
        let request = match decode_request(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("{e}");
                return Response::error(e.to_string());
            }
        };
        let command = match Command::parse(&request) {
            Ok(command) => command,
            Err(e) => {
                warn!("{e}");
                return Response::error(e.to_string());
            }
        };
        debug!(command = command.name(), "dispatching");
        self.execute(command)
    }

    /// Runs a typed command.
    pub fn execute(&self, command: Command) -> Response {
        let name = command.name();
        let result = match command {
            Command::Ping => Ok(Response::success(json!({
                "message": "Pong",
                "pid": std::process::id(),
            }))),
            Command::GetScreenSize => self.facade.screen_size().map(|size| {
                Response::success(json!({ "width": size.width, "height": size.height }))
            }),
            Command::GetVirtualScreenBounds => self.facade.virtual_bounds().map(|b| {
                Response::success(json!({
                    "x": b.x,
                    "y": b.y,
                    "width": b.width,
                    "height": b.height,
                }))
            }),
            Command::GetPixelColor(params) => self
                .facade
                .pixel_color(params)
                .map(|hex| Response::success(json!({ "color_hex": hex }))),
            Command::CaptureRegion(params) => self.facade.capture_region(params).map(|c| {
                Response::success(json!({
                    "captured_image_bytes": c.image_base64,
                    "actual_x1": c.region.x1,
                    "actual_y1": c.region.y1,
                    "actual_x2": c.region.x2,
                    "actual_y2": c.region.y2,
                }))
            }),
            Command::SimulateClick(params) => self.facade.click(params).map(|()| Response::empty()),
            Command::SimulateMouseMove(params) => {
                self.facade.move_to(params).map(|()| Response::empty())
            }
            Command::SimulateDrag(params) => self.facade.drag(params).map(|()| Response::empty()),
            Command::SimulateScroll(params) => {
                self.facade.scroll(params).map(|()| Response::empty())
            }
            Command::SimulateKeyPress(p) => self.facade.key_press(&p.key_name).map(key_response),
            Command::SimulateKeyDown(p) => self.facade.key_down(&p.key_name).map(key_response),
            Command::SimulateKeyUp(p) => self.facade.key_up(&p.key_name).map(key_response),
            Command::SimulateTextEntry(p) => {
                self.facade.type_text(&p.text).map(|()| Response::empty())
            }
            Command::SimulateModifiedKeyStroke(p) => {
                self.facade.modified_keystroke(&p).map(key_response)
            }
            Command::CheckWindowExists(query) => self
                .facade
                .window_exists(&query)
                .map(|exists| Response::success(json!({ "exists": exists }))),
            Command::CheckProcessExists(query) => self
                .facade
                .process_exists(&query)
                .map(|exists| Response::success(json!({ "exists": exists }))),
            Command::StartInteractiveDrawingCapture => return self.capture(CaptureMode::Drawing),
            Command::StartInteractiveRegionSelect => {
                return self.capture(CaptureMode::RegionSelect)
            }
            Command::StartInteractivePointSelect(p) => {
                return self.capture(CaptureMode::PointSelect {
                    target: p.num_points,
                })
            }
        };

        result.unwrap_or_else(|e| {
            error!(command = name, "command failed: {e}");
            Response::error(e.to_string())
        })
    }

    fn capture(&self, mode: CaptureMode) -> Response {
        match self.capture.run(mode) {
            Ok(outcome) => {
                if let CaptureOutcome::Cancelled(reason) = &outcome {
                    info!(mode = mode.label(), ?reason, "interactive capture returned no result");
                }
                Response::success(outcome.to_json())
            }
            Err(e) => {
                error!(mode = mode.label(), "interactive capture failed: {e}");
                Response::error(e.to_string())
            }
        }
    }

    /// Ends any active capture session. Called once on process shutdown.
    pub fn shutdown(&self) {
        if self.capture.cancel_active(CancelReason::Shutdown) {
            info!("active capture session cancelled for shutdown");
        }
    }
}

fn key_response(outcome: KeyOutcome) -> Response {
    match outcome.diagnostic() {
        Some(message) => {
            warn!("{message}");
            Response::success_with_message(message, Value::Null)
        }
        None => Response::empty(),
    }
}

impl FrameHandler for Dispatcher {
    fn handle(&self, frame: Frame) -> Response {
        self.handle_frame(frame)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
