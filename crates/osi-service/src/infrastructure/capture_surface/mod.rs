//! The visible and interceptive side of an interactive capture session.
//!
//! A [`CaptureBackend`] opens a [`CaptureSurface`]: a transparent overlay
//! covering the whole virtual screen plus system-wide pointer and keyboard
//! interceptors. Both are created on, and only touched from, the session's
//! dedicated thread; the surface is therefore not `Send`.
//!
//! Interceptor and overlay callbacks do no session logic of their own. They
//! translate OS notifications into [`SessionEvent`]s and post them to the
//! session's inbox, where the actor loop applies them in order.
//!
//! # Lifecycle
//!
//! ```text
//! open() ──▶ render(scene) ──▶ { pump() ; render(scene)? }* ──▶ close()
//! ```
//!
//! `close()` uninstalls the interceptors and destroys the overlay. The actor
//! calls it before publishing the session outcome.

use std::sync::mpsc::Sender;

use osi_core::{CaptureMode, OverlayScene, SessionEvent, VirtualScreen};
use thiserror::Error;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Errors raised while setting up a capture surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// A low-level input hook could not be installed.
    #[error("failed to install {kind} hook: {reason}")]
    HookInstall { kind: &'static str, reason: String },

    /// The overlay window could not be created.
    #[error("failed to create capture overlay: {0}")]
    Overlay(String),

    /// This build has no capture backend.
    #[error("interactive capture is not supported on this platform")]
    Unsupported,
}

/// Factory for capture surfaces.
pub trait CaptureBackend: Send + Sync {
    /// Creates the overlay and installs both interceptors on the calling
    /// thread. Interceptor callbacks post to `events`.
    ///
    /// On error nothing is left installed.
    fn open(
        &self,
        mode: CaptureMode,
        bounds: VirtualScreen,
        events: Sender<SessionEvent>,
    ) -> Result<Box<dyn CaptureSurface>, SurfaceError>;
}

/// A live overlay + interceptor pair, owned by the session thread.
pub trait CaptureSurface {
    /// Processes pending OS messages for this thread without blocking.
    /// Interceptor callbacks run from inside this call.
    fn pump(&mut self);

    /// Replaces the drawn scene and requests a repaint. Repaint requests are
    /// coalesced by the OS and never block input processing.
    fn render(&mut self, scene: &OverlayScene);

    /// Uninstalls interceptors and destroys the overlay.
    fn close(self: Box<Self>);
}

/// Backend for builds without interactive capture.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl CaptureBackend for UnsupportedBackend {
    fn open(
        &self,
        _mode: CaptureMode,
        _bounds: VirtualScreen,
        _events: Sender<SessionEvent>,
    ) -> Result<Box<dyn CaptureSurface>, SurfaceError> {
        Err(SurfaceError::Unsupported)
    }
}

#[cfg(target_os = "windows")]
pub use windows::WindowsCaptureBackend as NativeCaptureBackend;

#[cfg(not(target_os = "windows"))]
pub use UnsupportedBackend as NativeCaptureBackend;
