//! Bounded image payloads

use crate::{
    fetch_image, DataUri, DeliveryConfig, DeliveryError, DeliveryResult, ImageRef, NativeRequest,
    PayloadFormat,
};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Encoded image ready for transport
#[derive(Debug, Clone)]
pub struct Payload {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Payload {
    pub fn to_data_uri(&self) -> String {
        DataUri::encode(self.mime, &self.bytes)
    }

    pub fn encoded_len(&self) -> usize {
        DataUri::encoded_len(self.mime, self.bytes.len())
    }

    pub fn extension(&self) -> &'static str {
        match self.mime {
            "image/jpeg" => "jpg",
            _ => "png",
        }
    }
}

/// Downscale so the longer edge is at most `max_edge`, keeping the aspect ratio
pub fn fit_longest_edge(image: &DynamicImage, max_edge: u32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    if w <= max_edge && h <= max_edge {
        return image.clone();
    }

    let scale = max_edge as f32 / w.max(h) as f32;
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, max_edge);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, max_edge);
    log::debug!("Resizing {}x{} to {}x{}", w, h, new_w, new_h);
    image.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Resize and encode `image`, failing when the result does not fit the transport
pub fn encode_payload(image: &DynamicImage, config: &DeliveryConfig) -> DeliveryResult<Payload> {
    let resized = fit_longest_edge(image, config.max_edge);
    let mut bytes = Vec::new();

    let mime = match config.format {
        PayloadFormat::Png => {
            resized.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
            "image/png"
        }
        PayloadFormat::Jpeg { quality } => {
            let rgb = resized.to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )?;
            "image/jpeg"
        }
    };

    let payload = Payload {
        mime,
        bytes,
        width: resized.width(),
        height: resized.height(),
    };

    let size = payload.encoded_len();
    if size > config.payload_limit {
        return Err(DeliveryError::TransportTooLarge {
            size,
            limit: config.payload_limit,
        });
    }

    Ok(payload)
}

/// Image Delivery Adapter: request in, bounded payload out
#[derive(Debug, Clone, Default)]
pub struct ImageDelivery {
    config: DeliveryConfig,
}

impl ImageDelivery {
    pub fn new(config: DeliveryConfig) -> Self {
        Self { config }
    }

    /// Load the referenced image
    pub fn load(&self, source: &ImageRef) -> DeliveryResult<DynamicImage> {
        match source {
            ImageRef::Url(url) => fetch_image(url),
            ImageRef::Data(uri) => Ok(image::load_from_memory(&uri.bytes)?),
        }
    }

    pub fn prepare(&self, source: &ImageRef) -> DeliveryResult<Payload> {
        let image = self.load(source)?;
        let payload = encode_payload(&image, &self.config)?;
        log::info!(
            "Prepared {}x{} {} payload ({} bytes)",
            payload.width,
            payload.height,
            payload.mime,
            payload.bytes.len()
        );
        Ok(payload)
    }

    pub fn prepare_request(&self, request: &NativeRequest) -> DeliveryResult<Payload> {
        self.prepare(&request.source()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn noise(width: u32, height: u32) -> DynamicImage {
        let mut state = 0x2545_f491_u32;
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgba([a, b, c, 255])
        }))
    }

    #[test]
    fn longest_edge_is_capped() {
        let out = fit_longest_edge(&DynamicImage::new_rgba8(2048, 1024), 512);
        assert_eq!((out.width(), out.height()), (512, 256));

        let tall = fit_longest_edge(&DynamicImage::new_rgba8(300, 1200), 512);
        assert_eq!((tall.width(), tall.height()), (128, 512));
    }

    #[test]
    fn small_images_keep_their_size() {
        let out = fit_longest_edge(&DynamicImage::new_rgba8(200, 100), 512);
        assert_eq!((out.width(), out.height()), (200, 100));
    }

    #[test]
    fn payload_round_trips_through_data_uri() {
        let payload = encode_payload(&DynamicImage::new_rgba8(1600, 900), &DeliveryConfig::default()).unwrap();
        assert_eq!((payload.width, payload.height), (512, 288));
        let uri = payload.to_data_uri();
        assert_eq!(uri.len(), payload.encoded_len());

        let decoded = image::load_from_memory(&DataUri::parse(&uri).unwrap().bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 288));
    }

    #[test]
    fn oversize_payload_is_reported() {
        let config = DeliveryConfig {
            payload_limit: 10_000,
            ..Default::default()
        };
        let err = encode_payload(&noise(400, 400), &config).unwrap_err();
        assert!(matches!(err, DeliveryError::TransportTooLarge { limit: 10_000, .. }));
    }

    #[test]
    fn jpeg_payload_is_smaller_for_photos() {
        let image = noise(256, 256);
        let png = encode_payload(&image, &DeliveryConfig::default()).unwrap();
        let jpeg = encode_payload(
            &image,
            &DeliveryConfig {
                format: PayloadFormat::Jpeg { quality: 70 },
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(jpeg.mime, "image/jpeg");
        assert!(jpeg.bytes.len() < png.bytes.len());
    }

    #[test]
    fn blob_request_fails_before_loading() {
        let request = NativeRequest {
            url: Some("blob:https://example.com/x".into()),
            data: None,
        };
        let err = ImageDelivery::default().prepare_request(&request).unwrap_err();
        assert!(matches!(err, DeliveryError::BlobUrl(_)));
    }
}
