//! Screen capture for fixed desktop regions.
//!
//! The controller only ever captures two configured rectangles (the keyword
//! region and the box-score table), so capture is expressed as a small trait
//! over absolute-pixel regions. The GDI backend is the real implementation;
//! tests substitute scripted grabbers.

#[cfg(windows)]
pub mod gdi;

use anyhow::Result;
use image::RgbaImage;

use crate::config::Region;

/// Synchronous capture of a fixed screen area.
pub trait ScreenGrabber {
    fn grab(&mut self, region: &Region) -> Result<RgbaImage>;
}

#[cfg(windows)]
pub use gdi::GdiGrabber;
