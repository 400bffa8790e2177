//! JSON body extractors that sanitize and validate
//!
//! ```rust,ignore
//! async fn create(ValidatedJson(input): ValidatedJson<ModelInput>) {
//!     // strings are trimmed and every rule on ModelInput has passed
//! }
//! ```

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::api::middleware::ApiError;
use crate::models::Sanitize;

/// Deserialized and trimmed, not yet validated. For handlers that must
/// look at the body before rejecting it.
pub struct SanitizedJson<T>(pub T);

impl<S, T> FromRequest<S> for SanitizedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Sanitize,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        value.sanitize();
        Ok(Self(value))
    }
}

/// Deserialized, trimmed and validated
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Sanitize + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let SanitizedJson(value) = SanitizedJson::<T>::from_request(req, state).await?;
        validate_input(&value)?;
        Ok(Self(value))
    }
}

pub fn validate_input<T: Validate>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|e| ApiError::validation_error(format_validation_errors(&e)))
}

/// One message per failing rule, ordered by field name
fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}
