//! Webhook trigger handlers.
//!
//! Each trigger fires an outbound POST to the configured automation
//! endpoint carrying a timestamp, an action tag, and a source tag. When
//! the incoming request is multipart, its fields and files are forwarded
//! alongside the tags; otherwise the payload is plain JSON.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Tag identifying this application on the webhook sink.
const SOURCE_TAG: &str = "web_app";

#[derive(serde::Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
    pub response: String,
}

/// `POST /api/trigger/accounting`
pub async fn accounting(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<TriggerResponse>, ApiError> {
    let url = state.webhooks.accounting_url.clone();
    forward(
        &state,
        url.as_deref(),
        "trigger_accounting_process",
        "Proceso contable activado correctamente",
        request,
    )
    .await
}

/// `POST /api/trigger/gastos`
pub async fn gastos(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<TriggerResponse>, ApiError> {
    let url = state.webhooks.gastos_url.clone();
    forward(&state, url.as_deref(), "subir_gastos", "Gastos enviados", request).await
}

/// `POST /api/trigger/ingresos`
pub async fn ingresos(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<TriggerResponse>, ApiError> {
    let url = state.webhooks.ingresos_url.clone();
    forward(&state, url.as_deref(), "subir_ingresos", "Ingresos enviados", request).await
}

async fn forward(
    state: &AppState,
    url: Option<&str>,
    action: &str,
    success_message: &str,
    request: Request,
) -> Result<Json<TriggerResponse>, ApiError> {
    let url = url.ok_or_else(|| ApiError::Webhook(format!("missing_webhook_url:{action}")))?;

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let outbound = if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::Webhook("malformed multipart payload".to_string()))?;
        let form = passthrough_form(multipart, action).await?;
        state.http.post(url).multipart(form)
    } else {
        state.http.post(url).json(&json!({
            "timestamp": Utc::now().to_rfc3339(),
            "action": action,
            "source": SOURCE_TAG,
        }))
    };

    let response = outbound.send().await.map_err(|e| {
        error!(action, error = %e, "webhook call failed");
        ApiError::Webhook(format!("Error al comunicarse con el webhook ({action})"))
    })?;

    if !response.status().is_success() {
        error!(action, status = %response.status(), "webhook rejected the trigger");
        return Err(ApiError::Webhook(format!("Error al comunicarse con el webhook ({action})")));
    }

    let text = response.text().await.unwrap_or_default();
    info!(action, "webhook triggered");

    Ok(Json(TriggerResponse {
        success: true,
        message: success_message.to_string(),
        response: text,
    }))
}

/// Rebuild the incoming multipart form for the outbound call, appending
/// the timestamp/action/source tags. A `source` supplied by the caller is
/// preserved.
async fn passthrough_form(
    mut multipart: Multipart,
    action: &str,
) -> Result<reqwest::multipart::Form, ApiError> {
    let mut form = reqwest::multipart::Form::new();
    let mut has_source = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Webhook("malformed multipart payload".to_string()))?
    {
        let name = field.name().unwrap_or("file").to_string();
        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::Webhook("unreadable multipart file".to_string()))?;
            form = form
                .part(name, reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(filename));
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| ApiError::Webhook("unreadable multipart field".to_string()))?;
            if name == "source" {
                has_source = true;
            }
            form = form.text(name, value);
        }
    }

    form = form
        .text("timestamp", Utc::now().to_rfc3339())
        .text("action", action.to_string());
    if !has_source {
        form = form.text("source", SOURCE_TAG);
    }
    Ok(form)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub folder_name: String,
    pub files_uploaded: usize,
    pub message: String,
    pub webhook_response: String,
}

const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

/// `POST /api/upload`
///
/// Forwards the uploaded files to the drive webhook under a
/// date-derived folder name.
pub async fn upload_to_drive(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let url = state
        .webhooks
        .drive_url
        .clone()
        .ok_or_else(|| ApiError::Webhook("missing_webhook_url:upload".to_string()))?;

    let now = Utc::now();
    let folder_name = format!(
        "{} de {} {}",
        now.day(),
        MONTHS_ES[now.month0() as usize],
        now.year()
    );

    let mut form = reqwest::multipart::Form::new();
    let mut files = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(|_| ApiError::MissingFile)? {
        if field.name() == Some("files") {
            let filename = field.file_name().unwrap_or("archivo").to_string();
            let bytes = field.bytes().await.map_err(|_| ApiError::MissingFile)?;
            form = form.part(
                "files",
                reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(filename),
            );
            files += 1;
        }
    }

    if files == 0 {
        return Err(ApiError::MissingFile);
    }

    form = form
        .text("folderName", folder_name.clone())
        .text("timestamp", now.to_rfc3339());

    info!(files, folder = %folder_name, "forwarding files to drive webhook");

    let response = state.http.post(&url).multipart(form).send().await.map_err(|e| {
        error!(error = %e, "drive webhook call failed");
        ApiError::Webhook("Error al enviar archivos al webhook".to_string())
    })?;

    if !response.status().is_success() {
        return Err(ApiError::Webhook(format!(
            "Error al enviar archivos al webhook: {}",
            response.status()
        )));
    }

    let webhook_response = response.text().await.unwrap_or_default();

    Ok(Json(UploadResponse {
        success: true,
        folder_name,
        files_uploaded: files,
        message: "Archivos enviados correctamente al webhook".to_string(),
        webhook_response,
    }))
}
