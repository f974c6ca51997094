//! OS interaction facade: the non-interactive commands.
//!
//! The facade owns all policy that sits between a typed command and the OS:
//! coordinate clamping, normalization for absolute pointer injection, step
//! interpolation and pacing for timed moves and drags, key-name resolution, and
//! image post-processing. The injected adapters only perform single OS calls.
//!
//! It holds no state between calls. Screen bounds in particular are re-read
//! for every operation because monitors can change while the service runs.
//!
//! Timed operations sleep on the calling thread; the dispatcher always runs on
//! Tokio's blocking pool, so this never stalls the runtime.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use osi_core::domain::geometry::interpolate;
use osi_core::protocol::commands::{
    CaptureRegionParams, ClickKind, ClickParams, DragParams, ModifiedKeyParams, MouseButton,
    MoveParams, PixelParams, ProcessQuery, ScrollParams, WindowQuery,
};
use osi_core::{resolve_key_name, Point, Region, ScreenSize, VirtualKey, VirtualScreen};
use thiserror::Error;
use tracing::debug;

use super::imaging::{encode_base64_png, ImageOptions, ImagingError};
use crate::infrastructure::input_injection::{InjectionError, InputInjector};
use crate::infrastructure::screen::{ScreenAccess, ScreenError};
use crate::infrastructure::system::{SystemError, SystemInspector};

/// Interval between interpolated pointer moves.
const MOVE_STEP: Duration = Duration::from_millis(10);

/// Pause after pressing and before releasing the button in a drag.
const DRAG_SETTLE: Duration = Duration::from_millis(50);

/// Wheel delta of one notch.
const WHEEL_DELTA: i32 = 120;

/// Longest hold, move or drag duration honoured; larger requests are clamped.
const MAX_PACING: Duration = Duration::from_secs(60);

/// Errors raised by facade operations. The display text is what the
/// controller sees in the Error envelope.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error(transparent)]
    Screen(#[from] ScreenError),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("virtual screen has no usable area ({width}x{height})")]
    DegenerateScreen { width: i32, height: i32 },

    #[error("capture region ({x1}, {y1})-({x2}, {y2}) has no area after clamping")]
    EmptyRegion { x1: i32, y1: i32, x2: i32, y2: i32 },
}

/// A captured and encoded region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCapture {
    /// The clamped, sorted region that was actually captured.
    pub region: Region,
    /// Base64 PNG.
    pub image_base64: String,
}

/// Whether a keyboard command injected anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Sent,
    /// A key name was not in the table; nothing was injected.
    UnknownKey(String),
}

impl KeyOutcome {
    /// Diagnostic text for a Success envelope, if any.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Sent => None,
            Self::UnknownKey(name) => Some(format!("Unknown key name: '{name}'. No input was sent.")),
        }
    }
}

/// Stateless front door to the OS adapters.
#[derive(Clone)]
pub struct OsFacade {
    injector: Arc<dyn InputInjector>,
    screen: Arc<dyn ScreenAccess>,
    system: Arc<dyn SystemInspector>,
}

impl OsFacade {
    pub fn new(
        injector: Arc<dyn InputInjector>,
        screen: Arc<dyn ScreenAccess>,
        system: Arc<dyn SystemInspector>,
    ) -> Self {
        Self {
            injector,
            screen,
            system,
        }
    }

    /// Screen access, shared with the capture coordinator.
    pub fn screen(&self) -> Arc<dyn ScreenAccess> {
        Arc::clone(&self.screen)
    }

    // ── Screen ────────────────────────────────────────────────────────────────

    pub fn screen_size(&self) -> Result<ScreenSize, FacadeError> {
        Ok(self.screen.primary_size()?)
    }

    pub fn virtual_bounds(&self) -> Result<VirtualScreen, FacadeError> {
        Ok(self.screen.virtual_bounds()?)
    }

    /// Fresh bounds that have at least one addressable pixel.
    fn usable_bounds(&self) -> Result<VirtualScreen, FacadeError> {
        let bounds = self.screen.virtual_bounds()?;
        if bounds.is_degenerate() {
            return Err(FacadeError::DegenerateScreen {
                width: bounds.width,
                height: bounds.height,
            });
        }
        Ok(bounds)
    }

    /// Colour at a point as `"#RRGGBB"`. The point is clamped into the
    /// virtual screen first.
    pub fn pixel_color(&self, params: PixelParams) -> Result<String, FacadeError> {
        let bounds = self.usable_bounds()?;
        let at = bounds.clamp_pixel(Point::new(params.x, params.y));
        let [r, g, b] = self.screen.pixel(at)?;
        Ok(format!("#{r:02X}{g:02X}{b:02X}"))
    }

    /// Captures a rectangle. Missing far corners extend to the virtual screen's
    /// right/bottom edge.
    pub fn capture_region(&self, params: CaptureRegionParams) -> Result<RegionCapture, FacadeError> {
        let bounds = self.usable_bounds()?;
        let a = Point::new(params.x1, params.y1);
        let b = Point::new(
            params.x2.unwrap_or_else(|| bounds.right()),
            params.y2.unwrap_or_else(|| bounds.bottom()),
        );
        let region = bounds.clip_region(a, b).ok_or_else(|| {
            let clamped = Region::from_corners(bounds.clamp_corner(a), bounds.clamp_corner(b));
            FacadeError::EmptyRegion {
                x1: clamped.x1,
                y1: clamped.y1,
                x2: clamped.x2,
                y2: clamped.y2,
            }
        })?;

        let image = self.screen.capture(region)?;
        let options = ImageOptions {
            grayscale: params.grayscale,
            binarize: params.binarize,
        };
        let image_base64 = encode_base64_png(&image, options)?;
        debug!(?region, ?options, "region captured");
        Ok(RegionCapture {
            region,
            image_base64,
        })
    }

    // ── Pointer ───────────────────────────────────────────────────────────────

    fn move_exact(&self, bounds: &VirtualScreen, to: Point) -> Result<(), FacadeError> {
        Ok(self.injector.move_absolute(bounds.normalize(to))?)
    }

    /// Moves along a straight line in `duration`, then lands exactly on `to`.
    fn move_paced(&self, bounds: &VirtualScreen, to: Point, duration: Duration) -> Result<(), FacadeError> {
        let target = bounds.clamp_pixel(to);
        if duration.is_zero() {
            return self.move_exact(bounds, target);
        }

        let steps = step_count(duration);
        let pause = duration / steps;
        let from = self.injector.cursor_position()?;
        for point in interpolate(from, target, steps) {
            self.move_exact(bounds, point)?;
            thread::sleep(pause);
        }
        self.move_exact(bounds, target)
    }

    pub fn click(&self, params: ClickParams) -> Result<(), FacadeError> {
        let bounds = self.usable_bounds()?;
        self.move_exact(&bounds, Point::new(params.x, params.y))?;
        let hold = secs(params.hold_secs);

        match params.kind {
            ClickKind::Single => self.press_release(params.button, hold)?,
            ClickKind::Double => {
                self.press_release(params.button, hold)?;
                self.press_release(params.button, hold)?;
            }
            ClickKind::Press => self.injector.button(params.button, true)?,
            ClickKind::Release => self.injector.button(params.button, false)?,
        }
        Ok(())
    }

    fn press_release(&self, button: MouseButton, hold: Duration) -> Result<(), FacadeError> {
        self.injector.button(button, true)?;
        if !hold.is_zero() {
            thread::sleep(hold);
        }
        self.injector.button(button, false)?;
        Ok(())
    }

    pub fn move_to(&self, params: MoveParams) -> Result<(), FacadeError> {
        let bounds = self.usable_bounds()?;
        self.move_paced(&bounds, Point::new(params.x, params.y), secs(params.duration_secs))
    }

    /// Press at the current position, move, release.
    pub fn drag(&self, params: DragParams) -> Result<(), FacadeError> {
        let bounds = self.usable_bounds()?;
        let target = Point::new(params.end_x, params.end_y);
        let duration = secs(params.duration_secs).max(MOVE_STEP);

        self.injector.button(params.button, true)?;
        thread::sleep(DRAG_SETTLE);
        let moved = self.move_paced(&bounds, target, duration);
        thread::sleep(DRAG_SETTLE);
        // Release even if the move failed so the button is never left down.
        let released = self.injector.button(params.button, false);
        moved?;
        Ok(released?)
    }

    pub fn scroll(&self, params: ScrollParams) -> Result<(), FacadeError> {
        if params.amount == 0 {
            return Ok(());
        }
        let delta = params.amount.saturating_mul(WHEEL_DELTA);
        Ok(self.injector.wheel(params.axis, delta)?)
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────

    /// Press and release a named key. A single-character name is typed as
    /// text instead so it is layout independent.
    pub fn key_press(&self, name: &str) -> Result<KeyOutcome, FacadeError> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            debug!(character = %c, "single-character key press sent as text");
            self.injector.text(name)?;
            return Ok(KeyOutcome::Sent);
        }
        self.with_key(name, |key| {
            self.injector.key(key, true)?;
            self.injector.key(key, false)
        })
    }

    pub fn key_down(&self, name: &str) -> Result<KeyOutcome, FacadeError> {
        self.with_key(name, |key| self.injector.key(key, true))
    }

    pub fn key_up(&self, name: &str) -> Result<KeyOutcome, FacadeError> {
        self.with_key(name, |key| self.injector.key(key, false))
    }

    fn with_key(
        &self,
        name: &str,
        send: impl FnOnce(VirtualKey) -> Result<(), InjectionError>,
    ) -> Result<KeyOutcome, FacadeError> {
        match resolve_key_name(name) {
            Some(key) => {
                send(key)?;
                Ok(KeyOutcome::Sent)
            }
            None => Ok(KeyOutcome::UnknownKey(name.to_string())),
        }
    }

    pub fn type_text(&self, text: &str) -> Result<(), FacadeError> {
        if text.is_empty() {
            return Ok(());
        }
        Ok(self.injector.text(text)?)
    }

    /// Modifier down, main key down, main key up, modifier up.
    pub fn modified_keystroke(&self, params: &ModifiedKeyParams) -> Result<KeyOutcome, FacadeError> {
        let Some(modifier) = resolve_key_name(&params.modifier) else {
            return Ok(KeyOutcome::UnknownKey(params.modifier.clone()));
        };
        let Some(main) = resolve_key_name(&params.main_key) else {
            return Ok(KeyOutcome::UnknownKey(params.main_key.clone()));
        };

        self.injector.key(modifier, true)?;
        let stroke = self
            .injector
            .key(main, true)
            .and_then(|()| self.injector.key(main, false));
        // The modifier is released even when the main key failed.
        let released = self.injector.key(modifier, false);
        stroke?;
        released?;
        Ok(KeyOutcome::Sent)
    }

    // ── System ────────────────────────────────────────────────────────────────

    pub fn window_exists(&self, query: &WindowQuery) -> Result<bool, FacadeError> {
        Ok(self.system.window_exists(query)?)
    }

    /// Case-insensitive, ignoring a trailing extension on either side, so
    /// `"notepad"` matches `"Notepad.exe"`.
    pub fn process_exists(&self, query: &ProcessQuery) -> Result<bool, FacadeError> {
        let wanted = process_stem(&query.process_name);
        if wanted.is_empty() {
            return Ok(false);
        }
        let names = self.system.process_names()?;
        Ok(names.iter().any(|name| process_stem(name) == wanted))
    }
}

/// Seconds as a [`Duration`], clamped to `0..=MAX_PACING`. Non-finite and
/// negative values are zero.
fn secs(value: f64) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value)
        .unwrap_or(MAX_PACING)
        .min(MAX_PACING)
}

/// At least two steps, otherwise one per `MOVE_STEP`.
fn step_count(duration: Duration) -> u32 {
    let steps = duration.as_millis() / MOVE_STEP.as_millis();
    u32::try_from(steps).unwrap_or(u32::MAX).max(2)
}

fn process_stem(name: &str) -> String {
    let name = name.trim();
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    stem.to_lowercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
