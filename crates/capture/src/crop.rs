//! Cropping native-pixel regions out of a source image

use crate::{CaptureError, CaptureResult, Rect};
use image::{imageops, RgbaImage};

/// How to treat a region that reaches outside the image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CropPolicy {
    /// Intersect with the image bounds
    #[default]
    Clamp,
    /// Fail unless the region lies fully inside the image
    Reject,
}

/// Crop `region` out of `image`
///
/// Overflowing regions are trimmed or refused according to `policy`.
/// A region with no overlap is always an error.
pub fn crop_region(image: &RgbaImage, region: Rect, policy: CropPolicy) -> CaptureResult<RgbaImage> {
    let (width, height) = image.dimensions();

    if policy == CropPolicy::Reject && !region.fits_within(width, height) {
        return Err(CaptureError::OutOfBounds { region, width, height });
    }

    let clamped = region
        .clamp_to(width, height)
        .ok_or(CaptureError::EmptyRegion { region, width, height })?;

    if clamped != region {
        log::debug!("Clamped crop region {:?} to {:?}", region, clamped);
    }

    Ok(imageops::crop_imm(
        image,
        clamped.x as u32,
        clamped.y as u32,
        clamped.width,
        clamped.height,
    )
    .to_image())
}
