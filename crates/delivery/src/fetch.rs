//! Fetching referenced images

use crate::{DataUri, DeliveryError, DeliveryResult};
use image::DynamicImage;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::time::Duration;

static HTTP: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("snaptag/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
});

/// Raw bytes behind a URL
///
/// `blob:` URLs only resolve inside the page that created them and are
/// refused outright.
pub fn fetch_bytes(url: &str) -> DeliveryResult<Vec<u8>> {
    let scheme = url.split_once(':').map(|(s, _)| s.to_ascii_lowercase()).unwrap_or_default();

    match scheme.as_str() {
        "blob" => Err(DeliveryError::BlobUrl(url.to_string())),
        "data" => Ok(DataUri::parse(url)?.bytes),
        "http" | "https" => {
            log::debug!("Fetching {}", url);
            let response = HTTP.get(url).send()?.error_for_status()?;
            Ok(response.bytes()?.to_vec())
        }
        "file" => {
            let path = reqwest::Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.to_file_path().ok())
                .ok_or_else(|| DeliveryError::InvalidFileUrl(url.to_string()))?;
            log::debug!("Reading {:?}", path);
            Ok(std::fs::read(path)?)
        }
        _ => Err(DeliveryError::UnsupportedScheme(url.to_string())),
    }
}

/// Fetch and decode an image
pub fn fetch_image(url: &str) -> DeliveryResult<DynamicImage> {
    let bytes = fetch_bytes(url)?;
    Ok(image::load_from_memory(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_urls_are_terminal() {
        let err = fetch_bytes("blob:https://example.com/5d1c0c1e").unwrap_err();
        assert!(matches!(err, DeliveryError::BlobUrl(_)));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = fetch_bytes("chrome-extension://abc/icon.png").unwrap_err();
        assert!(matches!(err, DeliveryError::UnsupportedScheme(_)));
    }

    #[test]
    fn file_urls_are_percent_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen shot #1.png");
        std::fs::write(&path, [7u8, 8, 9]).unwrap();

        let url = reqwest::Url::from_file_path(&path).unwrap();
        assert!(url.as_str().contains("%20"));
        assert_eq!(fetch_bytes(url.as_str()).unwrap(), vec![7, 8, 9]);
    }

    #[cfg(unix)]
    #[test]
    fn remote_file_urls_are_rejected() {
        let err = fetch_bytes("file://fileserver/share/x.png").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidFileUrl(_)));
    }

    #[test]
    fn data_urls_decode_locally() {
        let bytes = fetch_bytes("data:image/png;base64,AAEC").unwrap();
        assert_eq!(bytes, vec![0, 1, 2]);
    }
}
