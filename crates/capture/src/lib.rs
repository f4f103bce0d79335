//! Capture source module for SnapTag
//!
//! Defines the boundary to whatever produces the raster an overlay displays:
//! native pixel rectangles, source images and the provider trait.

pub mod crop;
pub mod source;

pub use crop::{crop_region, CropPolicy};
pub use source::{CaptureProvider, CaptureTarget, MemoryProvider, SourceImage};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No screens available")]
    NoScreens,

    #[error("Screen {index} out of range ({count} available)")]
    ScreenOutOfRange { index: usize, count: usize },

    #[error("Capture backend error: {0}")]
    Backend(String),

    #[error("Source image has no pixel data")]
    NoPixels,

    #[error("Region {region:?} does not overlap the {width}x{height} image")]
    EmptyRegion { region: Rect, width: u32, height: u32 },

    #[error("Region {region:?} exceeds the {width}x{height} image")]
    OutOfBounds { region: Rect, width: u32, height: u32 },
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Rectangle in native image pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the rectangle lies completely inside `[0, width] x [0, height]`
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width as i64 && self.bottom() <= height as i64
    }

    /// Intersection with `[0, width] x [0, height]`, `None` when nothing overlaps
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        let left = (self.x as i64).max(0);
        let top = (self.y as i64).max(0);
        let right = self.right().min(width as i64);
        let bottom = self.bottom().min(height as i64);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect::new(
            left as i32,
            top as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}
