//! Recording input injector for tests.
//!
//! Every call is appended to [`MockInputInjector::events`] in order, so a test
//! can assert the exact sequence a facade operation produced without moving
//! the real cursor. Set `should_fail` to exercise error paths.

use std::sync::Mutex;

use osi_core::{
    protocol::commands::{MouseButton, ScrollAxis},
    Point, VirtualKey,
};

use super::{InjectionError, InputInjector};

/// One recorded injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Move(Point),
    Button(MouseButton, bool),
    Wheel(ScrollAxis, i32),
    Key(u8, bool),
    Text(String),
}

/// A mock injector that records calls instead of touching the OS.
#[derive(Debug, Default)]
pub struct MockInputInjector {
    /// Every injected event, in call order.
    pub events: Mutex<Vec<Injected>>,
    /// Position reported by `cursor_position`.
    pub cursor: Mutex<Point>,
    /// When `true`, every method returns `InjectionError::Platform`.
    pub should_fail: bool,
}

impl MockInputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose cursor starts at `at`.
    pub fn with_cursor(at: Point) -> Self {
        Self {
            cursor: Mutex::new(at),
            ..Self::default()
        }
    }

    /// A mock that fails every call.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded events.
    pub fn recorded(&self) -> Vec<Injected> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: Injected) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

impl InputInjector for MockInputInjector {
    fn move_absolute(&self, normalized: Point) -> Result<(), InjectionError> {
        self.record(Injected::Move(normalized))
    }

    fn button(&self, button: MouseButton, pressed: bool) -> Result<(), InjectionError> {
        self.record(Injected::Button(button, pressed))
    }

    fn wheel(&self, axis: ScrollAxis, delta: i32) -> Result<(), InjectionError> {
        self.record(Injected::Wheel(axis, delta))
    }

    fn key(&self, key: VirtualKey, pressed: bool) -> Result<(), InjectionError> {
        self.record(Injected::Key(key.code, pressed))
    }

    fn text(&self, text: &str) -> Result<(), InjectionError> {
        self.record(Injected::Text(text.to_string()))
    }

    fn cursor_position(&self) -> Result<Point, InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        self.cursor
            .lock()
            .map(|p| *p)
            .map_err(|e| InjectionError::Platform(e.to_string()))
    }
}
