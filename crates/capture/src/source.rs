//! Source images and the provider boundary

use crate::{CaptureError, CaptureResult};
use image::RgbaImage;
use std::sync::Arc;

/// What to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureTarget {
    /// Single-capture mode, no monitor addressing
    Primary,
    /// A specific monitor by index
    Screen(usize),
}

impl CaptureTarget {
    /// Monitor index handed to downstream processing
    pub fn screen_index(&self) -> Option<usize> {
        match self {
            CaptureTarget::Primary => None,
            CaptureTarget::Screen(index) => Some(*index),
        }
    }
}

/// Image displayed by one overlay session
///
/// Immutable once fetched. Zero natural dimensions mark a broken capture,
/// and no coordinate mapping may use it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
    natural_width: u32,
    natural_height: u32,
    screen_index: Option<usize>,
}

impl SourceImage {
    pub fn from_pixels(pixels: Arc<RgbaImage>, screen_index: Option<usize>) -> Self {
        let (natural_width, natural_height) = pixels.dimensions();
        Self {
            pixels,
            natural_width,
            natural_height,
            screen_index,
        }
    }

    pub fn pixels(&self) -> &Arc<RgbaImage> {
        &self.pixels
    }

    pub fn natural_width(&self) -> u32 {
        self.natural_width
    }

    pub fn natural_height(&self) -> u32 {
        self.natural_height
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn screen_index(&self) -> Option<usize> {
        self.screen_index
    }

    /// Both natural dimensions are non-zero
    pub fn is_valid(&self) -> bool {
        self.natural_width > 0 && self.natural_height > 0
    }
}

/// Produces the raster shown by an overlay
///
/// Calls may block; sessions run them on a worker thread.
pub trait CaptureProvider: Send + Sync {
    /// Number of addressable screens
    fn screen_count(&self) -> CaptureResult<usize>;

    /// Capture the given target
    fn capture(&self, target: CaptureTarget) -> CaptureResult<SourceImage>;
}

/// Provider serving pre-rendered images, one per screen
///
/// Screen 0 doubles as the primary capture.
#[derive(Default)]
pub struct MemoryProvider {
    screens: Vec<Arc<RgbaImage>>,
}

impl MemoryProvider {
    pub fn new(screens: Vec<RgbaImage>) -> Self {
        Self {
            screens: screens.into_iter().map(Arc::new).collect(),
        }
    }
}

impl CaptureProvider for MemoryProvider {
    fn screen_count(&self) -> CaptureResult<usize> {
        Ok(self.screens.len())
    }

    fn capture(&self, target: CaptureTarget) -> CaptureResult<SourceImage> {
        let screens = &self.screens;
        let index = target.screen_index().unwrap_or(0);

        if screens.is_empty() {
            return Err(CaptureError::NoScreens);
        }

        let image = screens.get(index).ok_or(CaptureError::ScreenOutOfRange {
            index,
            count: screens.len(),
        })?;

        log::debug!("Serving in-memory capture for {:?}", target);
        Ok(SourceImage::from_pixels(Arc::clone(image), target.screen_index()))
    }
}
