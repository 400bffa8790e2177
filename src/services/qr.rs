//! QR codes for marketing links
//!
//! Renders a URL as an SVG QR code and returns it as a base64 data URL the
//! admin panel can drop straight into an `<img>`.

use anyhow::anyhow;
use data_encoding::BASE64;
use qrcode::render::svg;
use qrcode::QrCode;
use serde::Serialize;

/// Longest URL we agree to encode
pub const MAX_URL_LENGTH: usize = 2048;

const DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

#[derive(Debug, thiserror::Error)]
pub enum QrServiceError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A rendered code and the URL it points to
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQr {
    pub url: String,
    pub qr: String,
}

pub struct QrService {
    default_url: String,
}

impl QrService {
    /// `default_url` is used when a request names no target
    pub fn new(default_url: impl Into<String>) -> Self {
        Self {
            default_url: default_url.into(),
        }
    }

    pub fn generate(&self, url: Option<&str>) -> Result<GeneratedQr, QrServiceError> {
        let url = match url.map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => self.default_url.as_str(),
        };
        validate_url(url)?;

        let code = QrCode::new(url.as_bytes()).map_err(|e| anyhow!("Failed to encode QR: {}", e))?;
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(256, 256)
            .quiet_zone(true)
            .build();

        Ok(GeneratedQr {
            url: url.to_string(),
            qr: format!("{}{}", DATA_URL_PREFIX, BASE64.encode(image.as_bytes())),
        })
    }
}

fn validate_url(url: &str) -> Result<(), QrServiceError> {
    if url.len() > MAX_URL_LENGTH {
        return Err(QrServiceError::InvalidUrl(format!(
            "url must be at most {} characters",
            MAX_URL_LENGTH
        )));
    }

    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') && !url.contains(char::is_whitespace) => Ok(()),
        _ => Err(QrServiceError::InvalidUrl(
            "url must be an http(s) address".to_string(),
        )),
    }
}
