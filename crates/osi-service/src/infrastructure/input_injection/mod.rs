//! Synthetic pointer and keyboard input.
//!
//! The facade decides *what* to inject (clamping, normalization, step
//! interpolation, timing); an [`InputInjector`] only knows *how* to hand a
//! single event to the OS. Pointer positions reach the injector already
//! normalized to the `[0, 65535]` absolute range.
//!
//! | Module        | OS      | API used                          |
//! |---------------|---------|-----------------------------------|
//! | `windows`     | Windows | `SendInput`, `GetCursorPos`       |
//! | `unsupported` | others  | none, every call fails            |
//!
//! [`mock::MockInputInjector`] is always compiled so tests on any platform can
//! observe exactly what would have been injected.

use osi_core::{
    protocol::commands::{MouseButton, ScrollAxis},
    Point, VirtualKey,
};
use thiserror::Error;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for input injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The OS rejected or failed to deliver the event.
    #[error("input injection failed: {0}")]
    Platform(String),

    /// This build has no input backend.
    #[error("input injection is not supported on this platform")]
    Unsupported,
}

/// One-event-at-a-time access to the OS input queue.
pub trait InputInjector: Send + Sync {
    /// Moves the pointer to an absolute normalized position.
    fn move_absolute(&self, normalized: Point) -> Result<(), InjectionError>;

    /// Presses or releases a pointer button at the current position.
    fn button(&self, button: MouseButton, pressed: bool) -> Result<(), InjectionError>;

    /// Rotates the wheel by `delta` units (120 per notch).
    fn wheel(&self, axis: ScrollAxis, delta: i32) -> Result<(), InjectionError>;

    /// Presses or releases a virtual key.
    fn key(&self, key: VirtualKey, pressed: bool) -> Result<(), InjectionError>;

    /// Types `text` as Unicode characters, independent of the keyboard layout.
    fn text(&self, text: &str) -> Result<(), InjectionError>;

    /// Current pointer position in virtual-screen pixels.
    fn cursor_position(&self) -> Result<Point, InjectionError>;
}

/// Injector for builds without an input backend.
#[derive(Debug, Default)]
pub struct UnsupportedInjector;

impl InputInjector for UnsupportedInjector {
    fn move_absolute(&self, _normalized: Point) -> Result<(), InjectionError> {
        Err(InjectionError::Unsupported)
    }

    fn button(&self, _button: MouseButton, _pressed: bool) -> Result<(), InjectionError> {
        Err(InjectionError::Unsupported)
    }

    fn wheel(&self, _axis: ScrollAxis, _delta: i32) -> Result<(), InjectionError> {
        Err(InjectionError::Unsupported)
    }

    fn key(&self, _key: VirtualKey, _pressed: bool) -> Result<(), InjectionError> {
        Err(InjectionError::Unsupported)
    }

    fn text(&self, _text: &str) -> Result<(), InjectionError> {
        Err(InjectionError::Unsupported)
    }

    fn cursor_position(&self) -> Result<Point, InjectionError> {
        Err(InjectionError::Unsupported)
    }
}

#[cfg(target_os = "windows")]
pub use windows::WindowsInputInjector as NativeInputInjector;

#[cfg(not(target_os = "windows"))]
pub use UnsupportedInjector as NativeInputInjector;
