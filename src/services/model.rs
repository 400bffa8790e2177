//! Model service
//!
//! Gallery reads for the public site and profile management for the admin
//! panel, including bulk activation and deletion.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

use crate::db::query::ListPlan;
use crate::db::repositories::ModelRepository;
use crate::models::{BulkAction, BulkActionRequest, Model, ModelInput, ModelListQuery, PagedResult};

/// Most ids accepted by one bulk request
pub const MAX_BULK_IDS: usize = 200;

/// Error types for model service operations
#[derive(Debug, thiserror::Error)]
pub enum ModelServiceError {
    #[error("Model not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Result of a bulk request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub action: &'static str,
    pub affected: u64,
}

pub struct ModelService {
    repo: Arc<dyn ModelRepository>,
}

impl ModelService {
    pub fn new(repo: Arc<dyn ModelRepository>) -> Self {
        Self { repo }
    }

    /// Active models for the public gallery, primary photo resolved
    pub async fn list_public(&self) -> Result<Vec<Model>, ModelServiceError> {
        let models = self
            .repo
            .list_active()
            .await
            .context("Failed to list active models")?;
        Ok(models.into_iter().map(Model::with_primary_fallback).collect())
    }

    /// One active model. Inactive models are reported as not found.
    pub async fn get_public(&self, id: i64) -> Result<Model, ModelServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get model")?
            .filter(|m| m.active)
            .map(Model::with_primary_fallback)
            .ok_or(ModelServiceError::NotFound(id))
    }

    /// Any model, active or not
    pub async fn get(&self, id: i64) -> Result<Model, ModelServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get model")?
            .ok_or(ModelServiceError::NotFound(id))
    }

    pub async fn list(&self, query: &ModelListQuery) -> Result<PagedResult<Model>, ModelServiceError> {
        let plan = ListPlan::for_models(query);
        let page = self.repo.list(&plan).await.context("Failed to list models")?;
        Ok(page)
    }

    pub async fn create(&self, input: &ModelInput) -> Result<Model, ModelServiceError> {
        let model = self.repo.create(input).await.context("Failed to create model")?;
        tracing::info!("Created model {} ({} photos)", model.id, model.photos.len());
        Ok(model)
    }

    pub async fn update(&self, id: i64, input: &ModelInput) -> Result<Model, ModelServiceError> {
        let model = self
            .repo
            .update(id, input)
            .await
            .context("Failed to update model")?
            .ok_or(ModelServiceError::NotFound(id))?;
        tracing::info!("Updated model {}", id);
        Ok(model)
    }

    /// Soft delete: the model disappears from the public site only
    pub async fn deactivate(&self, id: i64) -> Result<(), ModelServiceError> {
        let found = self
            .repo
            .set_active(id, false)
            .await
            .context("Failed to deactivate model")?;
        if !found {
            return Err(ModelServiceError::NotFound(id));
        }
        tracing::info!("Deactivated model {}", id);
        Ok(())
    }

    /// Apply a bulk action to the valid, de-duplicated subset of ids.
    ///
    /// # Errors
    ///
    /// `Validation` for an unknown action, more than [`MAX_BULK_IDS`]
    /// entries, or when no entry is a valid id.
    pub async fn bulk(&self, request: &BulkActionRequest) -> Result<BulkOutcome, ModelServiceError> {
        let action = BulkAction::parse(&request.action).ok_or_else(|| {
            ModelServiceError::Validation(
                "action must be one of: activate, deactivate, delete".to_string(),
            )
        })?;

        if request.ids.len() > MAX_BULK_IDS {
            return Err(ModelServiceError::Validation(format!(
                "ids accepts at most {} entries",
                MAX_BULK_IDS
            )));
        }

        let ids = normalize_ids(&request.ids);
        if ids.is_empty() {
            return Err(ModelServiceError::Validation(
                "ids must contain at least one positive integer".to_string(),
            ));
        }

        let affected = match action {
            BulkAction::Activate => self.repo.bulk_set_active(&ids, true).await,
            BulkAction::Deactivate => self.repo.bulk_set_active(&ids, false).await,
            BulkAction::Delete => self.repo.bulk_delete(&ids).await,
        }
        .with_context(|| format!("Failed to {} models", action))?;

        tracing::info!("Bulk {} on {} ids affected {} models", action, ids.len(), affected);
        Ok(BulkOutcome {
            action: action.as_str(),
            affected,
        })
    }
}

/// Keep positive integers (JSON numbers or numeric strings), first
/// occurrence wins.
pub fn normalize_ids(raw: &[Value]) -> Vec<i64> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(parse_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn parse_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        })?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}
