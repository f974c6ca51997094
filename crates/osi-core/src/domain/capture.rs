//! Interactive capture session state machine.
//!
//! A capture session lets a human specify freehand strokes, a rectangle, or a
//! set of points by interacting with a transparent overlay while system-wide
//! input interception is active. This module holds only the *decision logic*:
//! it consumes [`SessionEvent`]s and decides when the session resolves. The
//! overlay window, the hooks, and the thread that drives them live in the
//! service crate.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──activate()──▶ Active ──┬──▶ Resolved(Completed(payload))
//!    │                             └──▶ Resolved(Cancelled(reason))
//!    └──── Cancel(InterceptorUnavailable) ──▶ Resolved(Cancelled)
//! ```
//!
//! Once resolved, further events are ignored; a session resolves exactly once.
//! A `Completed` outcome always carries a non-empty payload; empty results are
//! turned into `Cancelled(EmptyResult)`.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Region};

/// Movement below or at this many pixels on both axes is not recorded as a
/// new stroke point.
pub const STROKE_TOLERANCE_PX: i32 = 1;

/// Virtual key codes the session reacts to.
const VK_RETURN: u32 = 0x0D;
const VK_ESCAPE: u32 = 0x1B;
const VK_SPACE: u32 = 0x20;

/// An ordered sequence of points drawn with one continuous gesture.
pub type Stroke = Vec<Point>;

/// What the user is asked to specify. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Drawing,
    RegionSelect,
    PointSelect { target: u32 },
}

impl CaptureMode {
    /// Short label used for thread names and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Drawing => "drawing",
            Self::RegionSelect => "region",
            Self::PointSelect { .. } => "points",
        }
    }
}

/// Pointer buttons as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keys as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Escape,
    Enter,
    Space,
    Other(u32),
}

impl SessionKey {
    /// Classifies a Windows virtual key code.
    pub fn from_virtual_key(vk: u32) -> Self {
        match vk {
            VK_ESCAPE => Self::Escape,
            VK_RETURN => Self::Enter,
            VK_SPACE => Self::Space,
            other => Self::Other(other),
        }
    }
}

/// Why a session ended without a result. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// The user pressed Escape.
    Escape,
    /// The overlay window was closed by something other than the session.
    OverlayClosed,
    /// Input interception or the overlay could not be set up.
    InterceptorUnavailable,
    /// The service is shutting down.
    Shutdown,
    /// The configured capture timeout elapsed.
    TimedOut,
    /// The session ended normally but nothing was captured.
    EmptyResult,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    PointerDown { button: PointerButton, at: Point },
    PointerUp { button: PointerButton, at: Point },
    PointerMove { at: Point },
    KeyDown(SessionKey),
    Cancel(CancelReason),
}

/// What a completed session produced, before any screen capture is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Drawing(Vec<Stroke>),
    Region(Region),
    Points(Vec<Point>),
}

/// Final outcome of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Completed(CaptureResult),
    Cancelled(CancelReason),
}

/// Result of feeding one event to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep going. `repaint` is set when the visible scene changed.
    Continue { repaint: bool },
    /// The session just resolved. Returned at most once.
    Resolved(Resolution),
}

impl Step {
    const IDLE: Step = Step::Continue { repaint: false };
    const REPAINT: Step = Step::Continue { repaint: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Active,
    Resolved,
}

/// Snapshot of what the overlay should draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayScene {
    /// Committed strokes followed by the open one, if any.
    pub strokes: Vec<Stroke>,
    /// Rubber-band rectangle while a region is being dragged.
    pub selection: Option<Region>,
    /// Points collected so far.
    pub points: Vec<Point>,
}

/// The capture session state machine.
#[derive(Debug)]
pub struct CaptureSession {
    mode: CaptureMode,
    state: SessionState,
    // Drawing
    strokes: Vec<Stroke>,
    open_stroke: Stroke,
    button_held: bool,
    // RegionSelect
    anchor: Option<Point>,
    cursor: Option<Point>,
    // PointSelect
    points: Vec<Point>,
}

impl CaptureSession {
    pub fn new(mode: CaptureMode) -> Self {
        let mode = match mode {
            CaptureMode::PointSelect { target } => CaptureMode::PointSelect {
                target: target.max(1),
            },
            other => other,
        };
        Self {
            mode,
            state: SessionState::Created,
            strokes: Vec::new(),
            open_stroke: Vec::new(),
            button_held: false,
            anchor: None,
            cursor: None,
            points: Vec::new(),
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Marks the session Active. Call once the overlay exists and both
    /// interceptors are installed. Has no effect unless the session is Created.
    pub fn activate(&mut self) {
        if self.state == SessionState::Created {
            self.state = SessionState::Active;
        }
    }

    /// Feeds one event and reports whether the session continues or resolved.
    pub fn apply(&mut self, event: SessionEvent) -> Step {
        match (self.state, event) {
            (SessionState::Resolved, _) => Step::IDLE,
            (_, SessionEvent::Cancel(reason)) => self.resolve(Resolution::Cancelled(reason)),
            (SessionState::Created, _) => Step::IDLE,
            (SessionState::Active, SessionEvent::KeyDown(SessionKey::Escape)) => {
                self.resolve(Resolution::Cancelled(CancelReason::Escape))
            }
            (SessionState::Active, event) => match self.mode {
                CaptureMode::Drawing => self.apply_drawing(event),
                CaptureMode::RegionSelect => self.apply_region(event),
                CaptureMode::PointSelect { target } => self.apply_points(event, target),
            },
        }
    }

    /// Current visual state for the overlay.
    pub fn scene(&self) -> OverlayScene {
        let mut strokes = self.strokes.clone();
        if !self.open_stroke.is_empty() {
            strokes.push(self.open_stroke.clone());
        }
        let selection = match (self.anchor, self.cursor) {
            (Some(a), Some(c)) => Some(Region::from_corners(a, c)),
            _ => None,
        };
        OverlayScene {
            strokes,
            selection,
            points: self.points.clone(),
        }
    }

    fn resolve(&mut self, resolution: Resolution) -> Step {
        self.state = SessionState::Resolved;
        Step::Resolved(resolution)
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn apply_drawing(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::PointerDown {
                button: PointerButton::Primary,
                at,
            } => {
                self.button_held = true;
                self.open_stroke.push(at);
                Step::REPAINT
            }
            SessionEvent::PointerMove { at } if self.button_held => self.extend_stroke(at),
            SessionEvent::PointerUp {
                button: PointerButton::Primary,
                at,
            } if self.button_held => {
                self.button_held = false;
                self.extend_stroke(at)
            }
            SessionEvent::PointerDown {
                button: PointerButton::Secondary,
                ..
            }
            | SessionEvent::KeyDown(SessionKey::Space) => self.commit_stroke(),
            SessionEvent::KeyDown(SessionKey::Enter) => {
                if self.open_stroke.is_empty() {
                    self.finish_drawing()
                } else {
                    self.commit_stroke()
                }
            }
            _ => Step::IDLE,
        }
    }

    fn extend_stroke(&mut self, at: Point) -> Step {
        match self.open_stroke.last() {
            Some(last) if !last.differs_beyond(at, STROKE_TOLERANCE_PX) => Step::IDLE,
            _ => {
                self.open_stroke.push(at);
                Step::REPAINT
            }
        }
    }

    fn commit_stroke(&mut self) -> Step {
        self.button_held = false;
        if self.open_stroke.is_empty() {
            return Step::IDLE;
        }
        let stroke = std::mem::take(&mut self.open_stroke);
        self.strokes.push(stroke);
        Step::REPAINT
    }

    fn finish_drawing(&mut self) -> Step {
        if self.strokes.is_empty() {
            return self.resolve(Resolution::Cancelled(CancelReason::EmptyResult));
        }
        let strokes = std::mem::take(&mut self.strokes);
        self.resolve(Resolution::Completed(CaptureResult::Drawing(strokes)))
    }

    // ── RegionSelect ──────────────────────────────────────────────────────────

    fn apply_region(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::PointerDown {
                button: PointerButton::Primary,
                at,
            } => {
                self.anchor = Some(at);
                self.cursor = Some(at);
                Step::REPAINT
            }
            SessionEvent::PointerMove { at } if self.anchor.is_some() => {
                self.cursor = Some(at);
                Step::REPAINT
            }
            SessionEvent::PointerUp {
                button: PointerButton::Primary,
                at,
            } => match self.anchor.take() {
                Some(anchor) => {
                    self.cursor = None;
                    let region = Region::from_corners(anchor, at).widen_degenerate();
                    self.resolve(Resolution::Completed(CaptureResult::Region(region)))
                }
                None => Step::IDLE,
            },
            _ => Step::IDLE,
        }
    }

    // ── PointSelect ───────────────────────────────────────────────────────────

    fn apply_points(&mut self, event: SessionEvent, target: u32) -> Step {
        match event {
            SessionEvent::PointerDown {
                button: PointerButton::Primary,
                at,
            } => {
                self.points.push(at);
                if self.points.len() >= target as usize {
                    let points = std::mem::take(&mut self.points);
                    self.resolve(Resolution::Completed(CaptureResult::Points(points)))
                } else {
                    Step::REPAINT
                }
            }
            _ => Step::IDLE,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn active(mode: CaptureMode) -> CaptureSession {
        let mut session = CaptureSession::new(mode);
        session.activate();
        session
    }

    fn down(x: i32, y: i32) -> SessionEvent {
        SessionEvent::PointerDown {
            button: PointerButton::Primary,
            at: Point::new(x, y),
        }
    }

    fn up(x: i32, y: i32) -> SessionEvent {
        SessionEvent::PointerUp {
            button: PointerButton::Primary,
            at: Point::new(x, y),
        }
    }

    fn mv(x: i32, y: i32) -> SessionEvent {
        SessionEvent::PointerMove { at: Point::new(x, y) }
    }

    fn key(k: SessionKey) -> SessionEvent {
        SessionEvent::KeyDown(k)
    }

    #[test]
    fn test_events_before_activation_are_ignored() {
        let mut session = CaptureSession::new(CaptureMode::PointSelect { target: 1 });
        assert_eq!(session.apply(down(1, 1)), Step::Continue { repaint: false });
        assert_eq!(session.state(), SessionState::Created);
    }

    #[test]
    fn test_cancel_before_activation_resolves() {
        let mut session = CaptureSession::new(CaptureMode::Drawing);
        let step = session.apply(SessionEvent::Cancel(CancelReason::InterceptorUnavailable));
        assert_eq!(
            step,
            Step::Resolved(Resolution::Cancelled(CancelReason::InterceptorUnavailable))
        );
    }

    #[test]
    fn test_escape_cancels_every_mode() {
        for mode in [
            CaptureMode::Drawing,
            CaptureMode::RegionSelect,
            CaptureMode::PointSelect { target: 3 },
        ] {
            let mut session = active(mode);
            session.apply(down(10, 10));
            let step = session.apply(key(SessionKey::Escape));
            assert_eq!(
                step,
                Step::Resolved(Resolution::Cancelled(CancelReason::Escape)),
                "{mode:?}"
            );
        }
    }

    #[test]
    fn test_session_resolves_only_once() {
        // Arrange
        let mut session = active(CaptureMode::PointSelect { target: 1 });

        // Act
        let first = session.apply(down(1, 2));
        let second = session.apply(key(SessionKey::Escape));
        let third = session.apply(SessionEvent::Cancel(CancelReason::Shutdown));

        // Assert
        assert!(matches!(first, Step::Resolved(Resolution::Completed(_))));
        assert_eq!(second, Step::Continue { repaint: false });
        assert_eq!(third, Step::Continue { repaint: false });
        assert_eq!(session.state(), SessionState::Resolved);
    }

    #[test]
    fn test_point_select_completes_exactly_at_target() {
        // Arrange
        let mut session = active(CaptureMode::PointSelect { target: 3 });

        // Act
        let s1 = session.apply(down(1, 1));
        let s2 = session.apply(down(2, 2));
        let s3 = session.apply(down(3, 3));

        // Assert
        assert_eq!(s1, Step::Continue { repaint: true });
        assert_eq!(s2, Step::Continue { repaint: true });
        assert_eq!(
            s3,
            Step::Resolved(Resolution::Completed(CaptureResult::Points(vec![
                Point::new(1, 1),
                Point::new(2, 2),
                Point::new(3, 3),
            ])))
        );
    }

    #[test]
    fn test_point_select_zero_target_is_one() {
        let mut session = active(CaptureMode::PointSelect { target: 0 });
        assert_eq!(session.mode(), CaptureMode::PointSelect { target: 1 });
        assert!(matches!(session.apply(down(4, 4)), Step::Resolved(_)));
    }

    #[test]
    fn test_point_select_ignores_secondary_button() {
        let mut session = active(CaptureMode::PointSelect { target: 1 });
        let step = session.apply(SessionEvent::PointerDown {
            button: PointerButton::Secondary,
            at: Point::new(1, 1),
        });
        assert_eq!(step, Step::Continue { repaint: false });
    }

    #[test]
    fn test_region_select_sorts_corners() {
        // Arrange
        let mut session = active(CaptureMode::RegionSelect);

        // Act
        session.apply(down(300, 400));
        session.apply(mv(250, 100));
        let step = session.apply(up(100, 200));

        // Assert
        assert_eq!(
            step,
            Step::Resolved(Resolution::Completed(CaptureResult::Region(Region {
                x1: 100,
                y1: 200,
                x2: 300,
                y2: 400,
            })))
        );
    }

    #[test]
    fn test_region_select_click_without_drag_is_one_pixel() {
        let mut session = active(CaptureMode::RegionSelect);
        session.apply(down(50, 60));
        let Step::Resolved(Resolution::Completed(CaptureResult::Region(r))) =
            session.apply(up(50, 60))
        else {
            panic!("expected a completed region");
        };
        assert_eq!((r.width(), r.height()), (1, 1));
    }

    #[test]
    fn test_region_move_updates_rubber_band() {
        let mut session = active(CaptureMode::RegionSelect);
        assert_eq!(session.apply(mv(5, 5)), Step::Continue { repaint: false });
        session.apply(down(10, 10));
        assert_eq!(session.apply(mv(40, 30)), Step::Continue { repaint: true });
        assert_eq!(
            session.scene().selection,
            Some(Region {
                x1: 10,
                y1: 10,
                x2: 40,
                y2: 30
            })
        );
    }

    #[test]
    fn test_drawing_coalesces_near_duplicate_moves() {
        // Arrange
        let mut session = active(CaptureMode::Drawing);

        // Act
        session.apply(down(0, 0));
        session.apply(mv(1, 1)); // within tolerance
        session.apply(mv(1, 0)); // within tolerance
        session.apply(mv(5, 0));
        session.apply(up(6, 1)); // within tolerance of (5, 0)

        // Assert
        assert_eq!(
            session.scene().strokes,
            vec![vec![Point::new(0, 0), Point::new(5, 0)]]
        );
    }

    #[test]
    fn test_drawing_moves_without_button_are_ignored() {
        let mut session = active(CaptureMode::Drawing);
        assert_eq!(session.apply(mv(100, 100)), Step::Continue { repaint: false });
        assert!(session.scene().strokes.is_empty());
    }

    #[test]
    fn test_drawing_multiple_strokes_then_enter_finishes() {
        // Arrange
        let mut session = active(CaptureMode::Drawing);

        // Act
        session.apply(down(0, 0));
        session.apply(mv(10, 0));
        session.apply(up(20, 0));
        session.apply(SessionEvent::PointerDown {
            button: PointerButton::Secondary,
            at: Point::new(20, 0),
        });
        session.apply(down(0, 50));
        session.apply(up(0, 80));
        let commit = session.apply(key(SessionKey::Enter));
        let finish = session.apply(key(SessionKey::Enter));

        // Assert
        assert_eq!(commit, Step::Continue { repaint: true });
        assert_eq!(
            finish,
            Step::Resolved(Resolution::Completed(CaptureResult::Drawing(vec![
                vec![Point::new(0, 0), Point::new(10, 0), Point::new(20, 0)],
                vec![Point::new(0, 50), Point::new(0, 80)],
            ])))
        );
    }

    #[test]
    fn test_drawing_stroke_stays_open_after_release() {
        let mut session = active(CaptureMode::Drawing);
        session.apply(down(0, 0));
        session.apply(up(10, 10));
        session.apply(down(30, 30));
        session.apply(key(SessionKey::Space));
        assert_eq!(
            session.scene().strokes,
            vec![vec![Point::new(0, 0), Point::new(10, 10), Point::new(30, 30)]]
        );
    }

    #[test]
    fn test_drawing_finish_without_strokes_is_empty_cancel() {
        let mut session = active(CaptureMode::Drawing);
        assert_eq!(
            session.apply(key(SessionKey::Enter)),
            Step::Resolved(Resolution::Cancelled(CancelReason::EmptyResult))
        );
    }

    #[test]
    fn test_drawing_escape_discards_strokes() {
        let mut session = active(CaptureMode::Drawing);
        session.apply(down(0, 0));
        session.apply(mv(10, 10));
        session.apply(key(SessionKey::Space));
        assert_eq!(
            session.apply(key(SessionKey::Escape)),
            Step::Resolved(Resolution::Cancelled(CancelReason::Escape))
        );
    }

    #[test]
    fn test_session_key_classification() {
        assert_eq!(SessionKey::from_virtual_key(0x1B), SessionKey::Escape);
        assert_eq!(SessionKey::from_virtual_key(0x0D), SessionKey::Enter);
        assert_eq!(SessionKey::from_virtual_key(0x20), SessionKey::Space);
        assert_eq!(SessionKey::from_virtual_key(0x41), SessionKey::Other(0x41));
    }
}
