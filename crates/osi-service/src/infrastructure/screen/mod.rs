//! Screen geometry queries, pixel sampling, and region capture.
//!
//! Bounds are read from the OS on every call; callers must not cache them
//! across commands because monitors can be attached, removed, or rearranged
//! while the service runs.
//!
//! | Module        | OS      | API used                                          |
//! |---------------|---------|---------------------------------------------------|
//! | `windows`     | Windows | `GetSystemMetrics`, `GetPixel`, `BitBlt` + `GetDIBits` |
//! | `unsupported` | others  | none, every call fails                            |

use image::RgbaImage;
use osi_core::{Point, Region, ScreenSize, VirtualScreen};
use thiserror::Error;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for screen access.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A platform API call failed.
    #[error("screen access failed: {0}")]
    Platform(String),

    /// This build has no screen backend.
    #[error("screen access is not supported on this platform")]
    Unsupported,
}

/// Read access to the display.
pub trait ScreenAccess: Send + Sync {
    /// Size of the primary monitor.
    fn primary_size(&self) -> Result<ScreenSize, ScreenError>;

    /// Bounding rectangle of all monitors.
    fn virtual_bounds(&self) -> Result<VirtualScreen, ScreenError>;

    /// RGB colour of one pixel. `at` is already clamped into bounds.
    fn pixel(&self, at: Point) -> Result<[u8; 3], ScreenError>;

    /// Pixels of `region` (already clamped, non-empty) as RGBA.
    fn capture(&self, region: Region) -> Result<RgbaImage, ScreenError>;
}

/// Screen access for builds without a display backend.
#[derive(Debug, Default)]
pub struct UnsupportedScreen;

impl ScreenAccess for UnsupportedScreen {
    fn primary_size(&self) -> Result<ScreenSize, ScreenError> {
        Err(ScreenError::Unsupported)
    }

    fn virtual_bounds(&self) -> Result<VirtualScreen, ScreenError> {
        Err(ScreenError::Unsupported)
    }

    fn pixel(&self, _at: Point) -> Result<[u8; 3], ScreenError> {
        Err(ScreenError::Unsupported)
    }

    fn capture(&self, _region: Region) -> Result<RgbaImage, ScreenError> {
        Err(ScreenError::Unsupported)
    }
}

#[cfg(target_os = "windows")]
pub use windows::WindowsScreen as NativeScreen;

#[cfg(not(target_os = "windows"))]
pub use UnsupportedScreen as NativeScreen;
