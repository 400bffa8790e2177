//! Authentication API endpoints
//!
//! - POST /api/login - Check credentials, set the session cookie
//! - GET /api/session - Who is logged in, if anyone
//! - GET /api/logout - End the session and clear the cookie

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{current_user, extract_session_token, ApiError, AppState, SESSION_COOKIE};
use crate::api::validation::ValidatedJson;
use crate::models::User;
use crate::services::LoginInput;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/session", get(session))
        .route("/logout", get(logout))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, user) = state.user_service.login(input).await?;

    let max_age = state.user_service.session_lifetime().num_seconds();
    let cookie = session_cookie(&session.id, max_age, state.cookie_secure);

    Ok((
        cookie_header(&cookie)?,
        Json(LoginResponse {
            success: true,
            user,
        }),
    ))
}

/// GET /api/session
async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(SessionResponse {
        authenticated: user.is_some(),
        user,
    }))
}

/// GET /api/logout
///
/// Always succeeds, with or without a live session.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let cookie = session_cookie("", 0, state.cookie_secure);
    Ok((cookie_header(&cookie)?, Json(LogoutResponse { success: true })))
}

fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_header(cookie: &str) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::internal(&anyhow::anyhow!("Invalid cookie header: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}
