//! Spreadsheet extraction handler.

use axum::Json;
use axum::extract::Multipart;
use tracing::info;

use conta_extract::{SheetExtraction, extract_spreadsheet};

use crate::error::ApiError;

/// `POST /api/excel/extract`
///
/// Multipart upload of one workbook; returns `{text, sheets, sheetNames,
/// details}`.
pub async fn extract(mut multipart: Multipart) -> Result<Json<SheetExtraction>, ApiError> {
    let mut upload: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|_| ApiError::MissingFile)? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(|_| ApiError::MissingFile)?;
            upload = Some(bytes.to_vec());
        }
    }

    let bytes = upload.ok_or(ApiError::MissingFile)?;
    info!(size = bytes.len(), "extracting uploaded spreadsheet");

    let extracted = extract_spreadsheet(&bytes)?;
    Ok(Json(extracted))
}
