//! Infrastructure layer for the service.
//!
//! Contains OS-facing adapters: the controller channel, synthetic input, screen
//! access, window/process lookups, and the interactive capture overlay.
//!
//! **Dependency rule**: the application layer depends on the port traits
//! declared here (`InputInjector`, `ScreenAccess`, `SystemInspector`,
//! `CaptureBackend`, `FrameHandler`); this layer may read `crate::domain`
//! but never imports the application layer.

use std::sync::Arc;

pub mod capture_surface;
pub mod input_injection;
pub mod screen;
pub mod system;
pub mod transport;

use capture_surface::{CaptureBackend, NativeCaptureBackend};
use input_injection::{InputInjector, NativeInputInjector};
use screen::{NativeScreen, ScreenAccess};
use system::{NativeSystem, SystemInspector};

/// The set of OS capabilities the application layer is built from.
///
/// Constructed once in `main.rs` and handed to the dispatcher; tests build one
/// from mocks instead.
#[derive(Clone)]
pub struct Platform {
    pub injector: Arc<dyn InputInjector>,
    pub screen: Arc<dyn ScreenAccess>,
    pub system: Arc<dyn SystemInspector>,
    pub capture: Arc<dyn CaptureBackend>,
}

impl Platform {
    /// The adapters for the platform this binary was compiled for.
    pub fn native() -> Self {
        Self {
            injector: Arc::new(NativeInputInjector::default()),
            screen: Arc::new(NativeScreen::default()),
            system: Arc::new(NativeSystem::default()),
            capture: Arc::new(NativeCaptureBackend::default()),
        }
    }
}
