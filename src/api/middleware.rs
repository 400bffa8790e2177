//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type every handler returns
//! - Session authentication for admin API routes
//! - Login redirect for admin pages of the bundled SPA

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxContactRepository, SqlxModelRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    ContactService, ContactServiceError, EmailService, ModelService, ModelServiceError,
    QrService, QrServiceError, UserService, UserServiceError, INVALID_CREDENTIALS,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub model_service: Arc<ModelService>,
    pub contact_service: Arc<ContactService>,
    pub qr_service: Arc<QrService>,
    /// Add `Secure` to the session cookie
    pub cookie_secure: bool,
}

impl AppState {
    /// Wire repositories and services for a migrated pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let user_service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.auth.session_hours,
        );
        let email = EmailService::from_config(&config.mail).map(Arc::new);

        Self {
            user_service: Arc::new(user_service),
            model_service: Arc::new(ModelService::new(SqlxModelRepository::boxed(pool.clone()))),
            contact_service: Arc::new(ContactService::new(
                SqlxContactRepository::boxed(pool.clone()),
                email,
            )),
            qr_service: Arc::new(QrService::new(config.site.contact_url())),
            cookie_secure: config.auth.cookie_secure,
            pool,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message)
    }

    /// Log the full error chain and hand the client a generic message
    pub fn internal(err: &anyhow::Error) -> Self {
        tracing::error!("{:#}", err);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "SERVICE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ModelServiceError> for ApiError {
    fn from(err: ModelServiceError) -> Self {
        match err {
            ModelServiceError::NotFound(_) => ApiError::not_found("Model not found"),
            ModelServiceError::Validation(msg) => ApiError::validation_error(msg),
            ModelServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidCredentials => ApiError::unauthorized(INVALID_CREDENTIALS),
            UserServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<ContactServiceError> for ApiError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<QrServiceError> for ApiError {
    fn from(err: QrServiceError) -> Self {
        match err {
            QrServiceError::InvalidUrl(msg) => ApiError::validation_error(msg),
            QrServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Session token from the `session` cookie or a bearer header.
/// The cookie wins when both are present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Resolve the request's session to a user, if any
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    Ok(state.user_service.validate_session(&token).await?)
}

/// Authentication middleware for admin API routes
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if current_user(&state, request.headers()).await?.is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(next.run(request).await)
}

/// Guard for the static SPA.
///
/// Admin pages need a session and redirect to `/login` without one. Unknown
/// `/api` paths get a JSON 404 instead of the SPA shell.
pub async fn spa_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();

    if path == "/api" || path.starts_with("/api/") {
        return ApiError::not_found("Route not found").into_response();
    }

    if path == "/admin" || path.starts_with("/admin/") {
        match current_user(&state, request.headers()).await {
            Ok(Some(_)) => {}
            Ok(None) => return Redirect::to("/login").into_response(),
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}
