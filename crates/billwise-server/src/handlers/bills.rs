//! Bill upload handler

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use billwise_core::ai::AIBackend;
use billwise_core::models::BillData;

use super::require_ai;
use crate::{AppError, AppState, MAX_UPLOAD_SIZE};

/// Response for a processed bill
#[derive(Debug, Serialize)]
pub struct BillUploadResponse {
    pub success: bool,
    pub message: String,
    pub data: BillData,
}

fn too_large() -> AppError {
    AppError::bad_request(&format!(
        "File size exceeds {}MB limit",
        MAX_UPLOAD_SIZE / 1024 / 1024
    ))
}

fn multipart_error(e: MultipartError, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        AppError::bad_request(&format!("{}: {}", context, e.body_text()))
    }
}

/// POST /api/upload-bill - Extract structured data from a bill image
///
/// Expects multipart form with:
/// - file: image (`image/*`, max 10MB)
///
/// The extracted bill is returned but not saved; the client confirms it by
/// posting to /api/transactions.
pub async fn upload_bill(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<BillUploadResponse>, AppError> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read form field"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(AppError::bad_request("Only image files are accepted"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data"))?;
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(too_large());
        }

        upload = Some((bytes.to_vec(), content_type));
    }

    let (image_data, mime_type) = upload.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    if image_data.is_empty() {
        return Err(AppError::bad_request("Uploaded file is empty"));
    }

    let ai = require_ai(&state)?;
    let bill = ai
        .extract_bill(&image_data, &mime_type)
        .await
        .map_err(|e| AppError::bad_gateway(&format!("Error processing bill: {}", e)))?;

    info!(
        merchant = %bill.merchant,
        category = %bill.category,
        total = bill.total_amount,
        "Bill processed"
    );

    Ok(Json(BillUploadResponse {
        success: true,
        message: "Bill processed successfully".to_string(),
        data: bill,
    }))
}
