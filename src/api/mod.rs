//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Public gallery, contact and raffle endpoints
//! - Login, session and logout
//! - Admin endpoints for models, contacts and QR codes (session required)
//! - Health check
//!
//! Everything else falls through to the built SPA when a static directory is
//! configured.

pub mod auth;
pub mod contacts;
pub mod health;
pub mod middleware;
pub mod models;
pub mod qr;
pub mod validation;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    response::IntoResponse,
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState};
pub use validation::{SanitizedJson, ValidatedJson};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need a session)
    let admin_routes = Router::new()
        .merge(models::admin_router())
        .merge(contacts::admin_router())
        .merge(qr::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(models::public_router())
        .merge(contacts::public_router())
        .nest("/admin", admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> anyhow::Result<Router> {
    let origin = server
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", server.cors_origin))?;

    // Credentials are allowed so the session cookie crosses origins in dev
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let router = Router::new().nest("/api", build_api_router(state.clone()));

    let router = match &server.static_dir {
        Some(dir) => {
            let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            let guarded = tower::ServiceBuilder::new()
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::spa_guard,
                ))
                .service(spa);
            router.fallback_service(guarded)
        }
        None => router.fallback(route_not_found),
    };

    Ok(router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn route_not_found() -> impl IntoResponse {
    ApiError::not_found("Route not found")
}
