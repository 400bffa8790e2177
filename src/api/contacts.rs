//! Lead capture API endpoints
//!
//! - POST /api/contacto - Contact form
//! - POST /api/sorteo - Raffle signup
//! - GET /api/admin/contactos - Admin list (requires auth middleware)

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::validation::{validate_input, SanitizedJson};
use crate::models::{Contact, ContactForm, ContactListQuery, Pagination, RaffleForm};

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub contactos: Vec<Contact>,
    pub pagination: Pagination,
}

/// Build public form routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/contacto", post(submit_contact))
        .route("/sorteo", post(submit_raffle))
}

/// Build admin contact routes
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/contactos", get(list_contacts))
}

/// POST /api/contacto
///
/// A filled honeypot gets the normal success reply before any validation,
/// so bots learn nothing from the response.
async fn submit_contact(
    State(state): State<AppState>,
    SanitizedJson(form): SanitizedJson<ContactForm>,
) -> Result<Json<SubmitResponse>, ApiError> {
    if !form.is_spam() {
        validate_input(&form)?;
    }
    state.contact_service.submit_contact(form).await?;
    Ok(Json(SubmitResponse { success: true }))
}

/// POST /api/sorteo
async fn submit_raffle(
    State(state): State<AppState>,
    SanitizedJson(form): SanitizedJson<RaffleForm>,
) -> Result<Json<SubmitResponse>, ApiError> {
    if !form.is_spam() {
        validate_input(&form)?;
    }
    state.contact_service.submit_raffle(form).await?;
    Ok(Json(SubmitResponse { success: true }))
}

/// GET /api/admin/contactos
async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let page = state.contact_service.list(&query).await?;
    let pagination = page.pagination();
    Ok(Json(ContactListResponse {
        contactos: page.rows,
        pagination,
    }))
}
