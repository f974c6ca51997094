//! Virtual-screen geometry: points, bounds, clamping, and the coordinate
//! normalization used for absolute pointer injection.
//!
//! The *virtual screen* is the bounding rectangle of all attached monitors.
//! Its origin is the top-left of that rectangle and may be negative when a
//! monitor sits left of or above the primary one. Bounds are always queried
//! fresh from the OS before a geometry operation; nothing here caches them.

use serde::{Deserialize, Serialize};

/// Upper end of the absolute-coordinate range expected by pointer injection.
pub const NORMALIZED_MAX: i32 = 65_535;

/// An absolute position in virtual-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when `other` is more than `tolerance` pixels away on either axis.
    pub fn differs_beyond(&self, other: Point, tolerance: i32) -> bool {
        (self.x - other.x).abs() > tolerance || (self.y - other.y).abs() > tolerance
    }
}

/// Width and height of a single display, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

/// Bounding rectangle of all monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualScreen {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl VirtualScreen {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the last addressable column.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// One past the last addressable row.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// A screen with no addressable pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Clamps a pixel address into `[min, max - 1]` on each axis.
    ///
    /// Degenerate axes collapse onto the origin.
    pub fn clamp_pixel(&self, p: Point) -> Point {
        Point {
            x: clamp_axis(p.x, self.x, self.right() - 1),
            y: clamp_axis(p.y, self.y, self.bottom() - 1),
        }
    }

    /// Clamps a rectangle corner into `[min, max]` on each axis.
    ///
    /// Corners use an inclusive upper bound because a region's far edge is
    /// exclusive: a region ending at `right()` includes the last column.
    pub fn clamp_corner(&self, p: Point) -> Point {
        Point {
            x: clamp_axis(p.x, self.x, self.right()),
            y: clamp_axis(p.y, self.y, self.bottom()),
        }
    }

    /// Maps a pixel address to the `[0, 65535]` absolute range used for
    /// pointer injection. The point is clamped first.
    pub fn normalize(&self, p: Point) -> Point {
        let clamped = self.clamp_pixel(p);
        Point {
            x: normalize_axis(clamped.x, self.x, self.width),
            y: normalize_axis(clamped.y, self.y, self.height),
        }
    }

    /// Clamps both corners, sorts them, and returns the resulting region, or
    /// `None` when it has no area.
    pub fn clip_region(&self, a: Point, b: Point) -> Option<Region> {
        let region = Region::from_corners(self.clamp_corner(a), self.clamp_corner(b));
        (region.width() > 0 && region.height() > 0).then_some(region)
    }
}

fn clamp_axis(v: i32, min: i32, max: i32) -> i32 {
    if max < min {
        min
    } else {
        v.clamp(min, max)
    }
}

fn normalize_axis(v: i32, origin: i32, extent: i32) -> i32 {
    if extent <= 1 {
        return 0;
    }
    let scaled = (i64::from(v) - i64::from(origin)) * i64::from(NORMALIZED_MAX) / i64::from(extent);
    scaled.clamp(0, i64::from(NORMALIZED_MAX)) as i32
}

/// An axis-aligned rectangle with `x1 <= x2` and `y1 <= y2`.
///
/// `x2`/`y2` are exclusive, so `width = x2 - x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Region {
    /// Builds a region from two arbitrary corners, sorting each axis.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Widens a zero-width or zero-height region by one pixel on that axis.
    pub fn widen_degenerate(mut self) -> Self {
        if self.x2 == self.x1 {
            self.x2 = self.x1.saturating_add(1);
        }
        if self.y2 == self.y1 {
            self.y2 = self.y1.saturating_add(1);
        }
        self
    }
}

/// Linear path from `from` to `to` in `steps` increments.
///
/// Returns `steps` points; the last one is `to`. `steps` below 1 is treated
/// as 1.
pub fn interpolate(from: Point, to: Point, steps: u32) -> Vec<Point> {
    let steps = steps.max(1);
    let dx = f64::from(to.x - from.x);
    let dy = f64::from(to.y - from.y);
    (1..=steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps);
            Point {
                x: from.x + (dx * t).round() as i32,
                y: from.y + (dy * t).round() as i32,
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Two 1920x1080 monitors, the second one left of the primary.
    fn dual() -> VirtualScreen {
        VirtualScreen::new(-1920, 0, 3840, 1080)
    }

    #[test]
    fn test_clamp_pixel_keeps_in_bounds_points() {
        let screen = dual();
        assert_eq!(screen.clamp_pixel(Point::new(-100, 50)), Point::new(-100, 50));
    }

    #[test]
    fn test_clamp_pixel_uses_inclusive_last_pixel() {
        // Arrange
        let screen = dual();

        // Act
        let low = screen.clamp_pixel(Point::new(-5000, -1));
        let high = screen.clamp_pixel(Point::new(5000, 5000));

        // Assert
        assert_eq!(low, Point::new(-1920, 0));
        assert_eq!(high, Point::new(1919, 1079));
    }

    #[test]
    fn test_normalize_origin_is_zero() {
        let screen = dual();
        assert_eq!(screen.normalize(Point::new(-1920, 0)), Point::new(0, 0));
    }

    #[test]
    fn test_normalize_stays_in_range_for_any_input() {
        let screen = dual();
        for p in [
            Point::new(i32::MIN, i32::MIN),
            Point::new(i32::MAX, i32::MAX),
            Point::new(0, 540),
            Point::new(1919, 1079),
        ] {
            let n = screen.normalize(p);
            assert!((0..=NORMALIZED_MAX).contains(&n.x), "{p:?} -> {n:?}");
            assert!((0..=NORMALIZED_MAX).contains(&n.y), "{p:?} -> {n:?}");
        }
    }

    #[test]
    fn test_normalize_midpoint() {
        let screen = VirtualScreen::new(0, 0, 1920, 1080);
        let n = screen.normalize(Point::new(960, 540));
        assert_eq!(n, Point::new(32767, 32767));
    }

    #[test]
    fn test_normalize_degenerate_extent_maps_to_zero() {
        let screen = VirtualScreen::new(10, 10, 1, 0);
        assert_eq!(screen.normalize(Point::new(500, 500)), Point::new(0, 0));
    }

    #[test]
    fn test_clip_region_sorts_and_clamps() {
        // Arrange
        let screen = VirtualScreen::new(0, 0, 1920, 1080);

        // Act
        let region = screen
            .clip_region(Point::new(2500, 900), Point::new(100, -50))
            .expect("region has area");

        // Assert
        assert_eq!(
            region,
            Region {
                x1: 100,
                y1: 0,
                x2: 1920,
                y2: 900
            }
        );
    }

    #[test]
    fn test_clip_region_without_area_is_none() {
        let screen = VirtualScreen::new(0, 0, 1920, 1080);
        assert!(screen
            .clip_region(Point::new(3000, 10), Point::new(4000, 20))
            .is_none());
    }

    #[test]
    fn test_widen_degenerate_region() {
        let r = Region::from_corners(Point::new(5, 5), Point::new(5, 5)).widen_degenerate();
        assert_eq!((r.width(), r.height()), (1, 1));
    }

    #[test]
    fn test_interpolate_ends_on_target() {
        let path = interpolate(Point::new(0, 0), Point::new(100, -50), 4);
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], Point::new(25, -13));
        assert_eq!(path[3], Point::new(100, -50));
    }

    #[test]
    fn test_interpolate_zero_steps_is_single_move() {
        assert_eq!(
            interpolate(Point::new(1, 1), Point::new(9, 9), 0),
            vec![Point::new(9, 9)]
        );
    }

    #[test]
    fn test_differs_beyond_tolerance() {
        let p = Point::new(10, 10);
        assert!(!p.differs_beyond(Point::new(11, 9), 1));
        assert!(p.differs_beyond(Point::new(12, 10), 1));
    }
}
