//! Monitor capture through xcap

use capture::{CaptureError, CaptureProvider, CaptureResult, CaptureTarget, SourceImage};
use image::RgbaImage;
use std::sync::Arc;
use xcap::Monitor;

fn backend<E: std::fmt::Display>(e: E) -> CaptureError {
    CaptureError::Backend(e.to_string())
}

/// Physical pixel position to logical points; bogus scales count as 1
fn to_logical((x, y): (i32, i32), scale: f32) -> (f32, f32) {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    (x as f32 / scale, y as f32 / scale)
}

/// Screenshots of the attached monitors
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapProvider;

impl XcapProvider {
    pub fn new() -> Self {
        Self
    }

    fn monitors() -> CaptureResult<Vec<Monitor>> {
        let monitors = Monitor::all().map_err(backend)?;
        if monitors.is_empty() {
            return Err(CaptureError::NoScreens);
        }
        Ok(monitors)
    }

    /// Top-left corner of a monitor in logical desktop points
    pub fn monitor_origin(&self, index: usize) -> Option<(f32, f32)> {
        let monitors = Self::monitors().ok()?;
        let monitor = monitors.get(index)?;
        let scale = monitor.scale_factor().unwrap_or(1.0);
        Some(to_logical((monitor.x().ok()?, monitor.y().ok()?), scale))
    }

    fn primary_index(monitors: &[Monitor]) -> usize {
        monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0)
    }
}

impl CaptureProvider for XcapProvider {
    fn screen_count(&self) -> CaptureResult<usize> {
        Ok(Self::monitors()?.len())
    }

    fn capture(&self, target: CaptureTarget) -> CaptureResult<SourceImage> {
        let monitors = Self::monitors()?;
        let index = match target {
            CaptureTarget::Primary => Self::primary_index(&monitors),
            CaptureTarget::Screen(index) => index,
        };
        let monitor = monitors.get(index).ok_or(CaptureError::ScreenOutOfRange {
            index,
            count: monitors.len(),
        })?;

        let shot = monitor.capture_image().map_err(backend)?;
        let (width, height) = (shot.width(), shot.height());
        let pixels = RgbaImage::from_raw(width, height, shot.into_raw()).ok_or(CaptureError::NoPixels)?;
        log::debug!("Captured monitor {} at {}x{}", index, width, height);

        Ok(SourceImage::from_pixels(Arc::new(pixels), target.screen_index()))
    }
}
