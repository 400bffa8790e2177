//! QR code API endpoint
//!
//! - POST /api/admin/generar-qr - Render a marketing link as a QR data URL

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};

/// Optional body; without a `url` the public contact form is encoded
#[derive(Debug, Default, Deserialize)]
pub struct QrRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub success: bool,
    pub url: String,
    pub qr: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generar-qr", post(generate_qr))
}

/// POST /api/admin/generar-qr
async fn generate_qr(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QrResponse>, ApiError> {
    let request = parse_request(&body)?;
    let generated = state.qr_service.generate(request.url.as_deref())?;

    Ok(Json(QrResponse {
        success: true,
        url: generated.url,
        qr: generated.qr,
    }))
}

fn parse_request(body: &[u8]) -> Result<QrRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(QrRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::validation_error(format!("Invalid JSON body: {}", e)))
}
