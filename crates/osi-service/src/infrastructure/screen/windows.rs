//! Windows screen access via `GetSystemMetrics` and GDI.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments. GDI handles
//! are released by the [`ScreenDc`] and [`MemoryBitmap`] guards on every path.

#![cfg(target_os = "windows")]

use image::RgbaImage;
use osi_core::{Point, Region, ScreenSize, VirtualScreen};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, GetPixel, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    CAPTUREBLT, CLR_INVALID, DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXSCREEN, SM_CXVIRTUALSCREEN, SM_CYSCREEN, SM_CYVIRTUALSCREEN,
    SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};

use super::{ScreenAccess, ScreenError};

/// Windows implementation of [`ScreenAccess`].
#[derive(Debug, Default)]
pub struct WindowsScreen;

impl WindowsScreen {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenAccess for WindowsScreen {
    fn primary_size(&self) -> Result<ScreenSize, ScreenError> {
        // SAFETY: GetSystemMetrics is always safe to call.
        let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        Ok(ScreenSize { width, height })
    }

    fn virtual_bounds(&self) -> Result<VirtualScreen, ScreenError> {
        // SAFETY: GetSystemMetrics is always safe to call.
        let bounds = unsafe {
            VirtualScreen::new(
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        Ok(bounds)
    }

    fn pixel(&self, at: Point) -> Result<[u8; 3], ScreenError> {
        let screen = ScreenDc::acquire()?;
        // SAFETY: screen.0 is a valid screen DC for the lifetime of the guard.
        let color = unsafe { GetPixel(screen.0, at.x, at.y) };
        if color.0 == CLR_INVALID {
            return Err(ScreenError::Platform(format!(
                "GetPixel failed at ({}, {})",
                at.x, at.y
            )));
        }
        // COLORREF is 0x00BBGGRR.
        Ok([
            (color.0 & 0xFF) as u8,
            ((color.0 >> 8) & 0xFF) as u8,
            ((color.0 >> 16) & 0xFF) as u8,
        ])
    }

    fn capture(&self, region: Region) -> Result<RgbaImage, ScreenError> {
        let (width, height) = (region.width(), region.height());
        if width <= 0 || height <= 0 {
            return Err(ScreenError::Platform("capture region has no area".into()));
        }

        let screen = ScreenDc::acquire()?;
        let bitmap = MemoryBitmap::create(&screen, width, height)?;

        // SAFETY: both DCs are valid; the blit stays inside the bitmap.
        unsafe {
            BitBlt(
                bitmap.dc,
                0,
                0,
                width,
                height,
                screen.0,
                region.x1,
                region.y1,
                SRCCOPY | CAPTUREBLT,
            )
        }
        .map_err(|e| ScreenError::Platform(format!("BitBlt failed: {e}")))?;

        let mut info = BITMAPINFO::default();
        info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            // Negative height requests a top-down DIB.
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        };

        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        // SAFETY: `pixels` holds exactly width*height 32-bit pixels and `info`
        // describes that layout.
        let lines = unsafe {
            GetDIBits(
                bitmap.dc,
                bitmap.bitmap,
                0,
                height as u32,
                Some(pixels.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        if lines != height {
            return Err(ScreenError::Platform(format!(
                "GetDIBits copied {lines} of {height} scan lines"
            )));
        }

        // GDI hands back BGRA with an undefined alpha byte.
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }

        RgbaImage::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| ScreenError::Platform("captured buffer has the wrong size".into()))
    }
}

// ── GDI guards ────────────────────────────────────────────────────────────────

/// The desktop DC, released on drop.
struct ScreenDc(HDC);

impl ScreenDc {
    fn acquire() -> Result<Self, ScreenError> {
        // SAFETY: a null HWND requests the DC of the entire screen.
        let dc = unsafe { GetDC(HWND::default()) };
        if dc.0.is_null() {
            return Err(ScreenError::Platform("GetDC returned no screen DC".into()));
        }
        Ok(Self(dc))
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        // SAFETY: self.0 was obtained from GetDC(NULL) and is released once.
        unsafe {
            ReleaseDC(HWND::default(), self.0);
        }
    }
}

/// An off-screen bitmap selected into its own memory DC.
struct MemoryBitmap {
    dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
}

impl MemoryBitmap {
    fn create(screen: &ScreenDc, width: i32, height: i32) -> Result<Self, ScreenError> {
        // SAFETY: screen.0 is a valid DC.
        let dc = unsafe { CreateCompatibleDC(screen.0) };
        if dc.0.is_null() {
            return Err(ScreenError::Platform("CreateCompatibleDC failed".into()));
        }
        // SAFETY: screen.0 is a valid DC; dimensions are positive.
        let bitmap = unsafe { CreateCompatibleBitmap(screen.0, width, height) };
        if bitmap.0.is_null() {
            // SAFETY: dc was created above and is not used afterwards.
            unsafe {
                let _ = DeleteDC(dc);
            }
            return Err(ScreenError::Platform("CreateCompatibleBitmap failed".into()));
        }
        // SAFETY: both handles are valid and owned by us.
        let previous = unsafe { SelectObject(dc, bitmap) };
        Ok(Self {
            dc,
            bitmap,
            previous,
        })
    }
}

impl Drop for MemoryBitmap {
    fn drop(&mut self) {
        // SAFETY: handles were created in `create` and are released exactly once,
        // after restoring the DC's original bitmap.
        unsafe {
            SelectObject(self.dc, self.previous);
            let _ = DeleteObject(self.bitmap);
            let _ = DeleteDC(self.dc);
        }
    }
}
