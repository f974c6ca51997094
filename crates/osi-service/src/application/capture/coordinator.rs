//! Starts capture sessions and waits for their outcome.
//!
//! The dispatcher calls [`CaptureCoordinator::run`] from Tokio's blocking pool.
//! `run` spawns the session thread, blocks on a oneshot receiver until the
//! session publishes, then joins the thread. The coordinator keeps the active
//! session's inbox sender so [`CaptureCoordinator::cancel_active`] can end a
//! session from any thread (process shutdown).

use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use osi_core::{CancelReason, CaptureMode, CaptureSession, SessionEvent};
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

use super::actor::SessionActor;
use super::outcome::{CaptureError, CaptureOutcome, OutcomeSlot};
use crate::infrastructure::capture_surface::CaptureBackend;
use crate::infrastructure::screen::ScreenAccess;

struct ActiveSession {
    id: Uuid,
    inbox: mpsc::Sender<SessionEvent>,
}

/// Owner of the "at most one active session" rule.
pub struct CaptureCoordinator {
    backend: Arc<dyn CaptureBackend>,
    screen: Arc<dyn ScreenAccess>,
    timeout: Option<Duration>,
    active: Mutex<Option<ActiveSession>>,
}

impl CaptureCoordinator {
    /// `timeout` of `None` lets a session wait for the user indefinitely.
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        screen: Arc<dyn ScreenAccess>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            screen,
            timeout,
            active: Mutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    /// Runs one session to completion and returns its outcome. Blocks.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::SessionActive`] if another session is running.
    /// - [`CaptureError::Spawn`] if the session thread could not start.
    /// - [`CaptureError::Abandoned`] if the session thread died without
    ///   publishing.
    pub fn run(&self, mode: CaptureMode) -> Result<CaptureOutcome, CaptureError> {
        let id = Uuid::new_v4();
        let (events, inbox) = mpsc::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        {
            let mut active = self.active();
            if active.is_some() {
                return Err(CaptureError::SessionActive);
            }
            *active = Some(ActiveSession {
                id,
                inbox: events.clone(),
            });
        }
        info!(session = %id, mode = mode.label(), "capture session starting");

        let actor = SessionActor {
            id,
            session: CaptureSession::new(mode),
            backend: Arc::clone(&self.backend),
            screen: Arc::clone(&self.screen),
            inbox,
            events,
            timeout: self.timeout,
            slot: OutcomeSlot::new(outcome_tx),
        };

        let spawned = thread::Builder::new()
            .name(format!("osi-capture-{}", mode.label()))
            .spawn(move || actor.run());
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.clear(id);
                return Err(CaptureError::Spawn(e));
            }
        };

        let outcome = outcome_rx.blocking_recv();
        if handle.join().is_err() {
            warn!(session = %id, "capture thread panicked");
        }
        self.clear(id);
        outcome.map_err(|_| CaptureError::Abandoned)
    }

    /// Posts `Cancel(reason)` to the active session, if any. Returns whether a
    /// session was signalled.
    pub fn cancel_active(&self, reason: CancelReason) -> bool {
        match self.active().as_ref() {
            Some(session) => {
                info!(session = %session.id, ?reason, "cancelling active capture session");
                session.inbox.send(SessionEvent::Cancel(reason)).is_ok()
            }
            None => false,
        }
    }

    fn clear(&self, id: Uuid) {
        let mut active = self.active();
        if active.as_ref().is_some_and(|s| s.id == id) {
            *active = None;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::capture::CapturePayload;
    use crate::infrastructure::capture_surface::mock::{EventLog, ScriptedBackend};
    use crate::infrastructure::screen::mock::MockScreen;
    use osi_core::{Point, PointerButton, Region, SessionKey};

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

    fn moved(x: i32, y: i32) -> SessionEvent {
        SessionEvent::PointerMove { at: Point::new(x, y) }
    }

    fn coordinator(backend: Arc<ScriptedBackend>, screen: Arc<MockScreen>) -> CaptureCoordinator {
        CaptureCoordinator::new(backend, screen, None)
    }

    #[test]
    fn test_region_select_captures_image_after_overlay_closed() {
        // Arrange
        let log: EventLog = Arc::default();
        let backend = Arc::new(
            ScriptedBackend::with_script(vec![down(10, 10), moved(40, 30), up(50, 40)])
                .with_log(Arc::clone(&log)),
        );
        let mut screen = MockScreen::single_1080p();
        screen.log = Some(Arc::clone(&log));
        let coordinator = coordinator(backend.clone(), Arc::new(screen));

        // Act
        let outcome = coordinator.run(CaptureMode::RegionSelect).unwrap();

        // Assert
        let CaptureOutcome::Completed(CapturePayload::Region {
            region,
            image_base64,
        }) = outcome
        else {
            panic!("expected a region, got {outcome:?}");
        };
        assert_eq!(
            region,
            Region {
                x1: 10,
                y1: 10,
                x2: 50,
                y2: 40
            }
        );
        assert!(image_base64.is_some());

        let entries = backend.entries();
        let closed = entries.iter().position(|e| *e == "close").unwrap();
        let captured = entries.iter().position(|e| *e == "capture").unwrap();
        assert!(closed < captured, "log: {entries:?}");
    }

    #[test]
    fn test_point_select_completes_at_target_count() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::with_script(vec![
            down(1, 1),
            down(2, 2),
            down(3, 3),
        ]));
        let coordinator = coordinator(backend.clone(), Arc::new(MockScreen::single_1080p()));

        // Act
        let outcome = coordinator
            .run(CaptureMode::PointSelect { target: 2 })
            .unwrap();

        // Assert
        assert_eq!(
            outcome,
            CaptureOutcome::Completed(CapturePayload::Points(vec![
                Point::new(1, 1),
                Point::new(2, 2)
            ]))
        );
        assert_eq!(backend.close_count(), 1);
    }

    #[test]
    fn test_drawing_finishes_on_enter_with_no_open_stroke() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::with_script(vec![
            down(0, 0),
            moved(1, 1),
            moved(10, 10),
            up(20, 20),
            SessionEvent::KeyDown(SessionKey::Enter),
            SessionEvent::KeyDown(SessionKey::Enter),
        ]));
        let coordinator = coordinator(backend, Arc::new(MockScreen::single_1080p()));

        // Act
        let outcome = coordinator.run(CaptureMode::Drawing).unwrap();

        // Assert
        assert_eq!(
            outcome,
            CaptureOutcome::Completed(CapturePayload::Drawing(vec![vec![
                Point::new(0, 0),
                Point::new(10, 10),
                Point::new(20, 20),
            ]]))
        );
    }

    #[test]
    fn test_escape_cancels_and_closes_surface() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::with_script(vec![
            down(5, 5),
            SessionEvent::KeyDown(SessionKey::Escape),
        ]));
        let coordinator = coordinator(backend.clone(), Arc::new(MockScreen::single_1080p()));

        // Act
        let outcome = coordinator.run(CaptureMode::RegionSelect).unwrap();

        // Assert
        assert_eq!(outcome, CaptureOutcome::Cancelled(CancelReason::Escape));
        assert_eq!(backend.close_count(), 1);
        assert!(!coordinator.is_active());
    }

    #[test]
    fn test_surface_failure_cancels_with_interceptor_unavailable() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::failing());
        let coordinator = coordinator(backend.clone(), Arc::new(MockScreen::single_1080p()));

        // Act
        let outcome = coordinator.run(CaptureMode::Drawing).unwrap();

        // Assert
        assert_eq!(
            outcome,
            CaptureOutcome::Cancelled(CancelReason::InterceptorUnavailable)
        );
        assert_eq!(backend.open_count(), 0);
    }

    #[test]
    fn test_timeout_cancels_idle_session() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = CaptureCoordinator::new(
            backend.clone(),
            Arc::new(MockScreen::single_1080p()),
            Some(Duration::from_millis(50)),
        );

        // Act
        let outcome = coordinator.run(CaptureMode::Drawing).unwrap();

        // Assert
        assert_eq!(outcome, CaptureOutcome::Cancelled(CancelReason::TimedOut));
        assert_eq!(backend.close_count(), 1);
    }

    #[test]
    fn test_cancel_active_ends_waiting_session() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = Arc::new(coordinator(
            backend.clone(),
            Arc::new(MockScreen::single_1080p()),
        ));
        let runner = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.run(CaptureMode::RegionSelect))
        };
        while !coordinator.is_active() {
            thread::sleep(Duration::from_millis(5));
        }

        // Act
        let signalled = coordinator.cancel_active(CancelReason::Shutdown);

        // Assert
        assert!(signalled);
        let outcome = runner.join().unwrap().unwrap();
        assert_eq!(outcome, CaptureOutcome::Cancelled(CancelReason::Shutdown));
        assert!(!coordinator.is_active());
    }

    #[test]
    fn test_concurrent_start_is_rejected() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = Arc::new(coordinator(
            backend.clone(),
            Arc::new(MockScreen::single_1080p()),
        ));
        let runner = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.run(CaptureMode::Drawing))
        };
        while !coordinator.is_active() {
            thread::sleep(Duration::from_millis(5));
        }

        // Act
        let second = coordinator.run(CaptureMode::RegionSelect);

        // Assert
        assert!(matches!(second, Err(CaptureError::SessionActive)));
        coordinator.cancel_active(CancelReason::Shutdown);
        runner.join().unwrap().unwrap();
    }

    #[test]
    fn test_repeated_sessions_leave_nothing_active() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::new());
        for _ in 0..5 {
            backend.push_script(vec![SessionEvent::KeyDown(SessionKey::Escape)]);
        }
        let coordinator = coordinator(backend.clone(), Arc::new(MockScreen::single_1080p()));

        // Act
        for _ in 0..5 {
            coordinator.run(CaptureMode::Drawing).unwrap();
        }

        // Assert
        assert_eq!(backend.open_count(), 5);
        assert_eq!(backend.close_count(), 5);
        assert!(!coordinator.is_active());
        assert!(!coordinator.cancel_active(CancelReason::Shutdown));
    }

    #[test]
    fn test_selected_points_are_rendered_before_resolution() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::with_script(vec![
            down(12, 34),
            SessionEvent::KeyDown(SessionKey::Escape),
        ]));
        let coordinator = coordinator(backend.clone(), Arc::new(MockScreen::single_1080p()));

        // Act
        let outcome = coordinator
            .run(CaptureMode::PointSelect { target: 3 })
            .unwrap();

        // Assert
        assert_eq!(outcome, CaptureOutcome::Cancelled(CancelReason::Escape));
        let scene = backend.last_scene.lock().unwrap().clone().unwrap();
        assert_eq!(scene.points, vec![Point::new(12, 34)]);
    }
}
