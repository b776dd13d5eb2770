//! Event image uploads to Cloudinary.
//!
//! Uploads are signed server-side (SHA-256 signatures must be enabled on the
//! Cloudinary product environment) and limited to 800x600 on the host side.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use shared::crypto::sign_params;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::config::ImageConfig;

const UPLOAD_TRANSFORMATION: &str = "c_limit,h_600,w_800";

lazy_static! {
    static ref UNSAFE_ID_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
}

#[derive(Debug, Error)]
pub enum ImageUploadError {
    #[error("Image uploads are not configured")]
    NotConfigured,

    #[error("Unsupported file type. Use JPEG, PNG or GIF")]
    UnsupportedType,

    #[error("Image exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("Image is empty")]
    Empty,

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    /// Detect the format from the file signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else {
            None
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }
}

/// A received file, before it is sent to the host.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check size and format. The declared content type, when present, must
    /// agree with the file signature.
    pub fn validate(&self, max_bytes: usize) -> Result<ImageKind, ImageUploadError> {
        if self.bytes.is_empty() {
            return Err(ImageUploadError::Empty);
        }
        if self.bytes.len() > max_bytes {
            return Err(ImageUploadError::TooLarge(max_bytes));
        }

        let sniffed = ImageKind::sniff(&self.bytes).ok_or(ImageUploadError::UnsupportedType)?;
        match self.content_type.as_deref().map(ImageKind::from_content_type) {
            Some(Some(declared)) if declared != sniffed => Err(ImageUploadError::UnsupportedType),
            Some(None) => Err(ImageUploadError::UnsupportedType),
            _ => Ok(sniffed),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
}

/// Client for the Cloudinary upload API.
#[derive(Clone)]
pub struct ImageUploadService {
    config: Arc<ImageConfig>,
    client: reqwest::Client,
    endpoint: String,
}

impl ImageUploadService {
    /// Returns `None` when credentials are missing.
    pub fn new(config: ImageConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Some(Self {
            config: Arc::new(config),
            client,
            endpoint,
        })
    }

    pub fn max_bytes(&self) -> usize {
        self.config.max_bytes
    }

    /// Validate and upload an image. Returns the hosted HTTPS URL.
    pub async fn upload(&self, image: ImageUpload) -> Result<String, ImageUploadError> {
        let kind = image.validate(self.config.max_bytes)?;

        let timestamp = Utc::now().timestamp();
        let public_id = public_id_for(&image.file_name, Utc::now().timestamp_millis());
        let params = [
            ("folder", self.config.folder.clone()),
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ];
        let signature = sign_params(&params, &self.config.api_secret);

        let file_part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(kind.mime())
            .map_err(|e| ImageUploadError::UploadFailed(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageUploadError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Cloudinary upload rejected");
            return Err(ImageUploadError::UploadFailed(format!(
                "image host returned {}",
                status
            )));
        }

        let uploaded: CloudinaryResponse = response
            .json()
            .await
            .map_err(|e| ImageUploadError::UploadFailed(e.to_string()))?;

        info!(public_id = %public_id, "Image uploaded");
        Ok(uploaded.secure_url)
    }
}

/// `event_<millis>_<sanitized file stem>`
fn public_id_for(file_name: &str, millis: i64) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let cleaned = UNSAFE_ID_CHARS.replace_all(stem.trim(), "_");
    let cleaned: String = cleaned.trim_matches('_').chars().take(64).collect();

    if cleaned.is_empty() {
        format!("event_{}", millis)
    } else {
        format!("event_{}_{}", millis, cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn upload(bytes: &[u8], content_type: Option<&str>) -> ImageUpload {
        ImageUpload {
            file_name: "poster.png".to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageKind::sniff(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(JPEG), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"GIF89a...."), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_validate_accepts_matching_type() {
        assert_eq!(upload(PNG, Some("image/png")).validate(1024).unwrap(), ImageKind::Png);
        assert_eq!(upload(JPEG, None).validate(1024).unwrap(), ImageKind::Jpeg);
    }

    #[test]
    fn test_validate_rejects_mismatched_or_unknown_type() {
        assert!(matches!(
            upload(PNG, Some("image/gif")).validate(1024),
            Err(ImageUploadError::UnsupportedType)
        ));
        assert!(matches!(
            upload(PNG, Some("application/pdf")).validate(1024),
            Err(ImageUploadError::UnsupportedType)
        ));
        assert!(matches!(
            upload(b"plain text", None).validate(1024),
            Err(ImageUploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_validate_size_limits() {
        assert!(matches!(
            upload(PNG, None).validate(4),
            Err(ImageUploadError::TooLarge(4))
        ));
        assert!(matches!(
            upload(&[], None).validate(1024),
            Err(ImageUploadError::Empty)
        ));
    }

    #[test]
    fn test_public_id_sanitizes_file_name() {
        assert_eq!(
            public_id_for("Hackathon Poster (final).png", 42),
            "event_42_Hackathon_Poster_final"
        );
        assert_eq!(public_id_for("../../etc/passwd", 7), "event_7_etc_passwd");
        assert_eq!(public_id_for("   .png", 1), "event_1");
    }

    #[test]
    fn test_service_requires_credentials() {
        assert!(ImageUploadService::new(ImageConfig::default()).is_none());

        let config = ImageConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            ..ImageConfig::default()
        };
        let service = ImageUploadService::new(config).expect("configured");
        assert_eq!(service.max_bytes(), 5 * 1024 * 1024);
        assert!(service.endpoint.ends_with("/demo/image/upload"));
    }
}
