//! In-memory screen for tests.
//!
//! Captures are synthesised from a per-pixel function so tests can check
//! grayscale and threshold processing, and every read is recorded so tests can
//! assert on the clamped coordinates the facade actually asked for.

use std::sync::Mutex;

use image::{Rgba, RgbaImage};
use osi_core::{Point, Region, ScreenSize, VirtualScreen};

use super::{ScreenAccess, ScreenError};

/// Colour of a synthetic pixel at absolute coordinates.
pub type PixelFn = fn(Point) -> [u8; 3];

/// A mock screen with fixed geometry.
pub struct MockScreen {
    pub bounds: VirtualScreen,
    pub primary: ScreenSize,
    pub paint: PixelFn,
    /// Every point passed to `pixel`.
    pub pixel_reads: Mutex<Vec<Point>>,
    /// Every region passed to `capture`.
    pub captures: Mutex<Vec<Region>>,
    /// Shared log that records `"capture"` on each capture, for ordering checks.
    pub log: Option<std::sync::Arc<Mutex<Vec<&'static str>>>>,
    pub should_fail: bool,
}

fn stripes(p: Point) -> [u8; 3] {
    // Dark and light vertical bands, 4 px wide.
    if p.x.rem_euclid(8) < 4 {
        [20, 40, 60]
    } else {
        [230, 210, 190]
    }
}

impl MockScreen {
    fn with_bounds(bounds: VirtualScreen, primary: ScreenSize) -> Self {
        Self {
            bounds,
            primary,
            paint: stripes,
            pixel_reads: Mutex::new(Vec::new()),
            captures: Mutex::new(Vec::new()),
            log: None,
            should_fail: false,
        }
    }

    /// A single 1920×1080 monitor at the origin.
    pub fn single_1080p() -> Self {
        Self::with_bounds(
            VirtualScreen::new(0, 0, 1920, 1080),
            ScreenSize {
                width: 1920,
                height: 1080,
            },
        )
    }

    /// Two 1920×1080 monitors, the secondary to the left of the primary, so the
    /// virtual origin is negative.
    pub fn dual_left_1080p() -> Self {
        Self::with_bounds(
            VirtualScreen::new(-1920, 0, 3840, 1080),
            ScreenSize {
                width: 1920,
                height: 1080,
            },
        )
    }

    /// A screen reporting zero-sized bounds.
    pub fn degenerate() -> Self {
        Self::with_bounds(
            VirtualScreen::new(0, 0, 0, 0),
            ScreenSize {
                width: 0,
                height: 0,
            },
        )
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::single_1080p()
        }
    }

    fn check(&self) -> Result<(), ScreenError> {
        if self.should_fail {
            Err(ScreenError::Platform("mock failure".into()))
        } else {
            Ok(())
        }
    }
}

impl ScreenAccess for MockScreen {
    fn primary_size(&self) -> Result<ScreenSize, ScreenError> {
        self.check()?;
        Ok(self.primary)
    }

    fn virtual_bounds(&self) -> Result<VirtualScreen, ScreenError> {
        self.check()?;
        Ok(self.bounds)
    }

    fn pixel(&self, at: Point) -> Result<[u8; 3], ScreenError> {
        self.check()?;
        if let Ok(mut reads) = self.pixel_reads.lock() {
            reads.push(at);
        }
        Ok((self.paint)(at))
    }

    fn capture(&self, region: Region) -> Result<RgbaImage, ScreenError> {
        self.check()?;
        if let Ok(mut captures) = self.captures.lock() {
            captures.push(region);
        }
        if let Some(log) = &self.log {
            if let Ok(mut log) = log.lock() {
                log.push("capture");
            }
        }
        let paint = self.paint;
        Ok(RgbaImage::from_fn(
            region.width() as u32,
            region.height() as u32,
            |x, y| {
                let [r, g, b] = paint(Point::new(region.x1 + x as i32, region.y1 + y as i32));
                Rgba([r, g, b, 255])
            },
        ))
    }
}
