//! Scripted capture backend for tests.
//!
//! Each call to `open` takes the next queued script (a list of
//! [`SessionEvent`]s standing in for what a human would do) and replays it,
//! one event per `pump`, into the session inbox. An empty script models a user
//! who never reacts, which is what shutdown and timeout tests need.
//!
//! Every lifecycle call is appended to a shared log so tests can check that
//! the surface was closed before anything happened afterwards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use osi_core::{CaptureMode, OverlayScene, SessionEvent, VirtualScreen};

use super::{CaptureBackend, CaptureSurface, SurfaceError};

/// Shared ordered record of lifecycle calls.
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

fn log_entry(log: &EventLog, entry: &'static str) {
    if let Ok(mut log) = log.lock() {
        log.push(entry);
    }
}

/// A backend that replays queued scripts.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<VecDeque<Vec<SessionEvent>>>,
    pub log: EventLog,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub last_scene: Arc<Mutex<Option<OverlayScene>>>,
    /// When `true`, `open` fails as if a hook could not be installed.
    pub fail_open: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose first session replays `events`.
    pub fn with_script(events: Vec<SessionEvent>) -> Self {
        let backend = Self::new();
        backend.push_script(events);
        backend
    }

    /// A backend that refuses to open.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Shares `log` with another mock (e.g. a screen) for ordering checks.
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Queues a script for the next session.
    pub fn push_script(&self, events: Vec<SessionEvent>) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push_back(events);
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl CaptureBackend for ScriptedBackend {
    fn open(
        &self,
        _mode: CaptureMode,
        _bounds: VirtualScreen,
        events: Sender<SessionEvent>,
    ) -> Result<Box<dyn CaptureSurface>, SurfaceError> {
        if self.fail_open {
            log_entry(&self.log, "open-failed");
            return Err(SurfaceError::HookInstall {
                kind: "mouse",
                reason: "mock failure".into(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        log_entry(&self.log, "open");
        let pending = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_default();
        Ok(Box::new(ScriptedSurface {
            pending: pending.into(),
            events,
            log: Arc::clone(&self.log),
            closed: Arc::clone(&self.closed),
            last_scene: Arc::clone(&self.last_scene),
        }))
    }
}

struct ScriptedSurface {
    pending: VecDeque<SessionEvent>,
    events: Sender<SessionEvent>,
    log: EventLog,
    closed: Arc<AtomicUsize>,
    last_scene: Arc<Mutex<Option<OverlayScene>>>,
}

impl CaptureSurface for ScriptedSurface {
    fn pump(&mut self) {
        if let Some(event) = self.pending.pop_front() {
            let _ = self.events.send(event);
        }
    }

    fn render(&mut self, scene: &OverlayScene) {
        log_entry(&self.log, "render");
        if let Ok(mut last) = self.last_scene.lock() {
            *last = Some(scene.clone());
        }
    }

    fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        log_entry(&self.log, "close");
    }
}
