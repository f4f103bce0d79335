//! Base64 `data:` URIs

use crate::{DeliveryError, DeliveryResult};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Decoded `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> DeliveryResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| DeliveryError::InvalidDataUri("must start with data:".into()))?;
        let (header, body) = rest
            .split_once(',')
            .ok_or_else(|| DeliveryError::InvalidDataUri("missing ',' separator".into()))?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DeliveryError::InvalidDataUri("only base64 payloads are supported".into()));
        }

        let bytes = STANDARD.decode(body.trim())?;
        Ok(Self {
            mime: if mime.is_empty() { "image/png".to_string() } else { mime },
            bytes,
        })
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }

    /// Length of `encode(mime, bytes)` without building it
    pub fn encoded_len(mime: &str, byte_len: usize) -> usize {
        "data:;base64,".len() + mime.len() + byte_len.div_ceil(3) * 4
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_image() {
        let uri = DataUri::encode("image/jpeg", b"\xff\xd8\xff");
        let parsed = DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.mime, "image/jpeg");
        assert_eq!(parsed.bytes, b"\xff\xd8\xff");
        assert_eq!(parsed.extension(), "jpg");
        assert_eq!(uri.len(), DataUri::encoded_len("image/jpeg", 3));
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(matches!(
            DataUri::parse("image/png;base64,AAAA"),
            Err(DeliveryError::InvalidDataUri(_))
        ));
        assert!(matches!(
            DataUri::parse("data:image/png;base64"),
            Err(DeliveryError::InvalidDataUri(_))
        ));
        assert!(matches!(
            DataUri::parse("data:text/plain,hello"),
            Err(DeliveryError::InvalidDataUri(_))
        ));
        assert!(matches!(
            DataUri::parse("data:image/png;base64,@@@"),
            Err(DeliveryError::Base64(_))
        ));
    }

    #[test]
    fn unknown_mime_defaults_to_png_extension() {
        let parsed = DataUri::parse("data:;base64,AAAA").unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.extension(), "png");
    }
}
