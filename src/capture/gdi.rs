//! GDI-based desktop region capture.
//!
//! BitBlts the requested rectangle from the screen DC into a 32-bit DIB and
//! converts BGRA to RGBA. Slower than the Graphics Capture API but fine for
//! a poll interval measured in seconds, and it needs no D3D device.

use anyhow::{anyhow, Result};
use image::RgbaImage;

use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};

use crate::capture::ScreenGrabber;
use crate::config::Region;

/// Captures screen regions via GDI BitBlt.
pub struct GdiGrabber;

impl GdiGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GdiGrabber {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenGrabber for GdiGrabber {
    fn grab(&mut self, region: &Region) -> Result<RgbaImage> {
        capture_screen_region(region)
    }
}

/// Captures one absolute-pixel rectangle from the primary display.
pub fn capture_screen_region(region: &Region) -> Result<RgbaImage> {
    let width = region.width as i32;
    let height = region.height as i32;
    if width <= 0 || height <= 0 {
        return Err(anyhow!("Empty capture region"));
    }

    unsafe {
        let screen_dc = GetDC(None);
        if screen_dc.is_invalid() {
            return Err(anyhow!("GetDC failed"));
        }

        let mem_dc = CreateCompatibleDC(Some(screen_dc));
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        let old = SelectObject(mem_dc, bitmap.into());

        let blt_result = BitBlt(
            mem_dc,
            0,
            0,
            width,
            height,
            screen_dc,
            region.left as i32,
            region.top as i32,
            SRCCOPY,
        );

        let mut pixels = vec![0u8; (width * height * 4) as usize];
        let mut scan_lines = 0;

        if blt_result.is_ok() {
            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height = top-down rows
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            scan_lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(pixels.as_mut_ptr() as *mut std::ffi::c_void),
                &mut info,
                DIB_RGB_COLORS,
            );
        }

        SelectObject(mem_dc, old);
        let _ = DeleteObject(bitmap.into());
        let _ = DeleteDC(mem_dc);
        ReleaseDC(None, screen_dc);

        blt_result.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
        if scan_lines == 0 {
            return Err(anyhow!("GetDIBits returned no scan lines"));
        }

        // BGRA -> RGBA in place
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }

        RgbaImage::from_raw(region.width, region.height, pixels)
            .ok_or_else(|| anyhow!("Capture buffer size mismatch"))
    }
}
