//! Image uploads for event posters.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::{ImageUpload, ImageUploadError};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

impl From<ImageUploadError> for ApiError {
    fn from(err: ImageUploadError) -> Self {
        match err {
            ImageUploadError::NotConfigured => ApiError::ServiceUnavailable(err.to_string()),
            ImageUploadError::UnsupportedType
            | ImageUploadError::TooLarge(_)
            | ImageUploadError::Empty => ApiError::Validation(err.to_string()),
            ImageUploadError::UploadFailed(msg) => {
                ApiError::Internal(format!("Image upload failed: {}", msg))
            }
        }
    }
}

/// Upload an image from the multipart field `file`; returns its hosted URL.
///
/// POST /api/v1/uploads/images
pub async fn upload_image(
    State(state): State<AppState>,
    user_auth: UserAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let images = state
        .images
        .as_ref()
        .ok_or(ImageUploadError::NotConfigured)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Could not read uploaded file: {}", e)))?;

        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| {
        ApiError::Validation(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    let url = images.upload(upload).await?;
    info!(user_id = %user_auth.user_id, url = %url, "Image uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
