//! Native messaging request/response bodies

use crate::{DataUri, DeliveryError, DeliveryResult};
use serde::{Deserialize, Serialize};

/// Message sent by the browser extension
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NativeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Base64 data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Where the image of a request lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    Data(DataUri),
}

impl NativeRequest {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            data: None,
        }
    }

    /// Resolve the image reference; `url` wins when both are set
    pub fn source(&self) -> DeliveryResult<ImageRef> {
        if let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            if url.starts_with("blob:") {
                return Err(DeliveryError::BlobUrl(url.to_string()));
            }
            if url.starts_with("data:") {
                return Ok(ImageRef::Data(DataUri::parse(url)?));
            }
            return Ok(ImageRef::Url(url.to_string()));
        }

        match self.data.as_deref() {
            Some(data) => Ok(ImageRef::Data(DataUri::parse(data)?)),
            None => Err(DeliveryError::MissingPayload),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Reply sent back to the extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl NativeResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_request_parses() {
        let request: NativeRequest = serde_json::from_str(r#"{"url":"https://example.com/a.png"}"#).unwrap();
        assert_eq!(
            request.source().unwrap(),
            ImageRef::Url("https://example.com/a.png".into())
        );
    }

    #[test]
    fn data_request_parses() {
        let request: NativeRequest = serde_json::from_str(r#"{"data":"data:image/webp;base64,AAEC"}"#).unwrap();
        match request.source().unwrap() {
            ImageRef::Data(uri) => {
                assert_eq!(uri.mime, "image/webp");
                assert_eq!(uri.bytes, vec![0, 1, 2]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blob_url_is_refused() {
        let request = NativeRequest::from_url("blob:https://example.com/uuid");
        assert!(matches!(request.source(), Err(DeliveryError::BlobUrl(_))));
    }

    #[test]
    fn empty_request_is_refused() {
        let request: NativeRequest = serde_json::from_str("{}").unwrap();
        assert!(matches!(request.source(), Err(DeliveryError::MissingPayload)));
    }

    #[test]
    fn response_serializes_lowercase_status() {
        let json = serde_json::to_string(&NativeResponse::error("boom")).unwrap();
        assert_eq!(json, r#"{"status":"error","message":"boom"}"#);
    }
}
