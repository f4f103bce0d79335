//! Delivery module for SnapTag
//!
//! Turns an image referenced by the browser extension into a bounded payload
//! for the native host: request parsing, fetching, downscaling, encoding and
//! the length-prefixed native messaging framing.

mod data_uri;
mod fetch;
mod framing;
mod payload;
mod request;

pub use data_uri::DataUri;
pub use fetch::{fetch_bytes, fetch_image};
pub use framing::{read_json, read_message, write_json, write_message, INBOUND_LIMIT, OUTBOUND_LIMIT};
pub use payload::{encode_payload, fit_longest_edge, ImageDelivery, Payload};
pub use request::{ImageRef, NativeRequest, NativeResponse, ResponseStatus};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Payload of {size} bytes exceeds the {limit} byte transport limit")]
    TransportTooLarge { size: usize, limit: usize },

    #[error("Cannot read blob URL outside the page that created it: {0}")]
    BlobUrl(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Not a local file URL: {0}")]
    InvalidFileUrl(String),

    #[error("Unsupported URL: {0}")]
    UnsupportedScheme(String),

    #[error("No URL or data provided")]
    MissingPayload,

    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Longest edge of a delivered image
pub const MAX_EDGE: u32 = 512;

/// Ceiling for an encoded payload, below the 1 MB host message limit
pub const PAYLOAD_LIMIT: usize = 1_000_000;

/// Encoding of a delivered image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Png,
    Jpeg { quality: u8 },
}

/// Delivery configuration
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub max_edge: u32,
    pub payload_limit: usize,
    pub format: PayloadFormat,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_edge: MAX_EDGE,
            payload_limit: PAYLOAD_LIMIT,
            format: PayloadFormat::Png,
        }
    }
}
