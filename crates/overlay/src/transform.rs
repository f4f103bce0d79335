//! Display-to-native coordinate mapping
//!
//! The source image is drawn "contain"-fit into its container: scaled
//! uniformly until it touches two opposite edges, centered on the other
//! axis. Mapping undoes the centering offset and the scale. Results are
//! not clamped to the image; callers decide what to do with overflow.

use crate::geometry::{DisplayRect, Point};
use crate::{OverlayError, OverlayResult};
use capture::Rect;

/// Box the image is rendered into, in display pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Container {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Container {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

/// Resolved contain-fit of one image in one container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    container: Container,
    display_width: f64,
    display_height: f64,
    offset_left: f64,
    offset_top: f64,
    scale_x: f64,
    scale_y: f64,
}

impl ContainFit {
    pub fn new(container: Container, natural_width: u32, natural_height: u32) -> OverlayResult<Self> {
        if natural_width == 0 || natural_height == 0 {
            return Err(OverlayError::InvalidSourceImage {
                width: natural_width,
                height: natural_height,
            });
        }
        if !(container.width > 0.0 && container.height > 0.0) {
            return Err(OverlayError::InvalidContainer {
                width: container.width,
                height: container.height,
            });
        }

        let natural_w = natural_width as f64;
        let natural_h = natural_height as f64;
        let c_width = container.width as f64;
        let c_height = container.height as f64;

        let image_aspect = natural_w / natural_h;
        let container_aspect = c_width / c_height;

        let (display_width, display_height, offset_left, offset_top) = if image_aspect > container_aspect {
            // Wider than the box: full width, bars top and bottom
            let display_height = c_width / image_aspect;
            (c_width, display_height, 0.0, (c_height - display_height) / 2.0)
        } else {
            // Taller or equal: full height, bars left and right
            let display_width = c_height * image_aspect;
            (display_width, c_height, (c_width - display_width) / 2.0, 0.0)
        };

        Ok(Self {
            container,
            display_width,
            display_height,
            offset_left,
            offset_top,
            scale_x: natural_w / display_width,
            scale_y: natural_h / display_height,
        })
    }

    pub fn container(&self) -> Container {
        self.container
    }

    /// Area actually covered by image pixels, in display space
    pub fn displayed_area(&self) -> DisplayRect {
        DisplayRect::new(
            (self.container.left as f64 + self.offset_left) as f32,
            (self.container.top as f64 + self.offset_top) as f32,
            self.display_width as f32,
            self.display_height as f32,
        )
    }

    /// Native coordinates of a display point, unrounded
    pub fn point_to_native(&self, p: Point) -> (f64, f64) {
        (
            (p.x as f64 - self.container.left as f64 - self.offset_left) * self.scale_x,
            (p.y as f64 - self.container.top as f64 - self.offset_top) * self.scale_y,
        )
    }

    /// Map a display rectangle to native pixels
    pub fn to_native(&self, r: &DisplayRect) -> Rect {
        let (x, y) = self.point_to_native(Point::new(r.x, r.y));
        Rect::new(
            x.round() as i32,
            y.round() as i32,
            (r.w as f64 * self.scale_x).round() as u32,
            (r.h as f64 * self.scale_y).round() as u32,
        )
    }
}

/// One-shot mapping of `rect` for an image of the given natural size
pub fn map_to_native(
    container: Container,
    natural_width: u32,
    natural_height: u32,
    rect: &DisplayRect,
) -> OverlayResult<Rect> {
    Ok(ContainFit::new(container, natural_width, natural_height)?.to_native(rect))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Rect, expected: Rect, tolerance: i64) {
        let pairs = [
            (actual.x as i64, expected.x as i64),
            (actual.y as i64, expected.y as i64),
            (actual.width as i64, expected.width as i64),
            (actual.height as i64, expected.height as i64),
        ];
        for (a, e) in pairs {
            assert!((a - e).abs() <= tolerance, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn letterboxed_full_area_maps_to_whole_image() {
        let fit = ContainFit::new(Container::new(0.0, 0.0, 960.0, 600.0), 1920, 1080).unwrap();
        let area = fit.displayed_area();
        assert_eq!(area, DisplayRect::new(0.0, 30.0, 960.0, 540.0));
        assert_close(fit.to_native(&area), Rect::new(0, 0, 1920, 1080), 1);
    }

    #[test]
    fn exact_fit_has_no_bars() {
        let rect = DisplayRect::new(480.0, 270.0, 480.0, 270.0);
        let native = map_to_native(Container::new(0.0, 0.0, 960.0, 540.0), 1920, 1080, &rect).unwrap();
        assert_eq!(native, Rect::new(960, 540, 960, 540));
    }

    #[test]
    fn pillarboxed_portrait_image() {
        let fit = ContainFit::new(Container::new(0.0, 0.0, 1000.0, 1000.0), 1080, 1920).unwrap();
        let area = fit.displayed_area();
        assert_eq!(area.x, 218.75);
        assert_eq!(area.y, 0.0);
        assert_close(fit.to_native(&area), Rect::new(0, 0, 1080, 1920), 1);
    }

    #[test]
    fn container_origin_is_subtracted() {
        let container = Container::new(100.0, 50.0, 960.0, 540.0);
        let rect = DisplayRect::new(100.0, 50.0, 10.0, 10.0);
        let native = map_to_native(container, 1920, 1080, &rect).unwrap();
        assert_eq!(native, Rect::new(0, 0, 20, 20));
    }

    #[test]
    fn overflow_is_passed_through() {
        let rect = DisplayRect::new(-10.0, 0.0, 980.0, 540.0);
        let native = map_to_native(Container::new(0.0, 0.0, 960.0, 540.0), 1920, 1080, &rect).unwrap();
        assert_eq!(native.x, -20);
        assert_eq!(native.width, 1960);
    }

    #[test]
    fn zero_natural_size_is_rejected() {
        let err = ContainFit::new(Container::new(0.0, 0.0, 960.0, 540.0), 0, 1080).unwrap_err();
        assert_eq!(err, OverlayError::InvalidSourceImage { width: 0, height: 1080 });
    }

    #[test]
    fn empty_container_is_rejected() {
        let err = ContainFit::new(Container::new(0.0, 0.0, 0.0, 540.0), 1920, 1080).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidContainer { .. }));
    }
}
