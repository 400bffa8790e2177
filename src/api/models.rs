//! Model gallery API endpoints
//!
//! Public:
//! - GET /api/modelos - Active models with photos
//! - GET /api/modelos/{id} - One active model
//!
//! Admin:
//! - GET /api/admin/modelos - Filtered, sorted, paginated list
//! - POST /api/admin/modelos - Create
//! - POST /api/admin/modelos/bulk - Activate, deactivate or delete many
//! - GET/PUT/DELETE /api/admin/modelos/{id}

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::validation::ValidatedJson;
use crate::models::{BulkActionRequest, Model, ModelInput, ModelListQuery, Pagination};

/// The `{id}` segment of a model route. A segment that isn't an integer
/// can't name a model, so it gets the same 404 as an unknown id.
pub struct ModelId(pub i64);

impl<S> FromRequestParts<S> for ModelId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        raw.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ApiError::not_found("Model not found"))
    }
}

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub modelos: Vec<Model>,
}

#[derive(Debug, Serialize)]
pub struct AdminModelListResponse {
    pub modelos: Vec<Model>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub modelo: Model,
}

#[derive(Debug, Serialize)]
pub struct SavedModelResponse {
    pub success: bool,
    pub modelo: Model,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub success: bool,
    pub action: &'static str,
    pub affected: u64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Build public model routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/modelos", get(list_public))
        .route("/modelos/{id}", get(get_public))
}

/// Build admin model routes (requires auth middleware)
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/modelos", get(list_admin).post(create))
        .route("/modelos/bulk", post(bulk))
        .route("/modelos/{id}", get(get_admin).put(update).delete(deactivate))
}

/// GET /api/modelos
async fn list_public(State(state): State<AppState>) -> Result<Json<ModelListResponse>, ApiError> {
    let modelos = state.model_service.list_public().await?;
    Ok(Json(ModelListResponse { modelos }))
}

/// GET /api/modelos/{id}
async fn get_public(
    State(state): State<AppState>,
    ModelId(id): ModelId,
) -> Result<Json<ModelResponse>, ApiError> {
    let modelo = state.model_service.get_public(id).await?;
    Ok(Json(ModelResponse { modelo }))
}

/// GET /api/admin/modelos
async fn list_admin(
    State(state): State<AppState>,
    Query(query): Query<ModelListQuery>,
) -> Result<Json<AdminModelListResponse>, ApiError> {
    let page = state.model_service.list(&query).await?;
    let pagination = page.pagination();
    Ok(Json(AdminModelListResponse {
        modelos: page.rows,
        pagination,
    }))
}

/// GET /api/admin/modelos/{id}
async fn get_admin(
    State(state): State<AppState>,
    ModelId(id): ModelId,
) -> Result<Json<ModelResponse>, ApiError> {
    let modelo = state.model_service.get(id).await?;
    Ok(Json(ModelResponse { modelo }))
}

/// POST /api/admin/modelos
async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ModelInput>,
) -> Result<impl IntoResponse, ApiError> {
    let modelo = state.model_service.create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SavedModelResponse {
            success: true,
            modelo,
        }),
    ))
}

/// PUT /api/admin/modelos/{id}
async fn update(
    State(state): State<AppState>,
    ModelId(id): ModelId,
    ValidatedJson(input): ValidatedJson<ModelInput>,
) -> Result<Json<SavedModelResponse>, ApiError> {
    let modelo = state.model_service.update(id, &input).await?;
    Ok(Json(SavedModelResponse {
        success: true,
        modelo,
    }))
}

/// DELETE /api/admin/modelos/{id}
///
/// Soft delete. The profile stays visible in the admin list.
async fn deactivate(
    State(state): State<AppState>,
    ModelId(id): ModelId,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.model_service.deactivate(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/admin/modelos/bulk
async fn bulk(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BulkActionRequest>,
) -> Result<Json<BulkResponse>, ApiError> {
    let outcome = state.model_service.bulk(&request).await?;
    Ok(Json(BulkResponse {
        success: true,
        action: outcome.action,
        affected: outcome.affected,
    }))
}
