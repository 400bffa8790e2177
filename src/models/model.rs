//! Model profile entity
//!
//! A model is a person listed in the public gallery, with an ordered set of
//! photos. The JSON field names match what the SPA renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::de::{optional_flag, optional_i32};
use super::sanitize::{trim, trim_optional, Sanitize};

/// Model profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    /// Unique identifier
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "edad")]
    pub age: Option<i32>,
    #[serde(rename = "altura")]
    pub height: Option<String>,
    #[serde(rename = "medidas")]
    pub measurements: Option<String>,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    /// Explicit primary photo URL
    #[serde(rename = "foto")]
    pub photo: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    /// Soft-delete marker; inactive models never reach public endpoints
    #[serde(rename = "activa")]
    pub active: bool,
    /// Photos in display order
    #[serde(rename = "fotos")]
    pub photos: Vec<ModelPhoto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Fill `photo` from the ordered photos when no primary is set, so
    /// gallery cards always have a cover image when one exists
    pub fn with_primary_fallback(mut self) -> Self {
        if self.photo.is_none() {
            self.photo = self.photos.first().map(|p| p.url.clone());
        }
        self
    }
}

/// One photo of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPhoto {
    pub id: i64,
    #[serde(skip)]
    pub model_id: i64,
    pub url: String,
    /// Display position, contiguous from 0
    #[serde(rename = "orden")]
    pub sort_order: i32,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a model.
///
/// Updates replace every profile field. `activa` missing means "keep" on
/// update and `true` on create. `fotos` missing leaves photos untouched;
/// `fotos: []` removes them all.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ModelInput {
    #[serde(rename = "nombre", default)]
    #[validate(length(min = 1, max = 100, message = "nombre is required (max 100 characters)"))]
    pub name: String,
    #[serde(rename = "apellido", default)]
    #[validate(length(max = 100, message = "apellido must be at most 100 characters"))]
    pub surname: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[serde(rename = "telefono", default)]
    #[validate(length(max = 50, message = "telefono must be at most 50 characters"))]
    pub phone: Option<String>,
    #[serde(rename = "edad", default, deserialize_with = "optional_i32")]
    #[validate(range(min = 16, max = 100, message = "edad must be between 16 and 100"))]
    pub age: Option<i32>,
    #[serde(rename = "altura", default)]
    #[validate(length(max = 20, message = "altura must be at most 20 characters"))]
    pub height: Option<String>,
    #[serde(rename = "medidas", default)]
    #[validate(length(max = 50, message = "medidas must be at most 50 characters"))]
    pub measurements: Option<String>,
    #[serde(rename = "ciudad", default)]
    #[validate(length(max = 100, message = "ciudad must be at most 100 characters"))]
    pub city: Option<String>,
    #[serde(rename = "foto", default)]
    #[validate(length(max = 2048, message = "foto must be at most 2048 characters"))]
    pub photo: Option<String>,
    #[serde(rename = "descripcion", default)]
    #[validate(length(max = 5000, message = "descripcion must be at most 5000 characters"))]
    pub description: Option<String>,
    #[serde(rename = "activa", default, deserialize_with = "optional_flag")]
    pub active: Option<bool>,
    #[serde(rename = "fotos", default)]
    #[validate(length(max = 50, message = "fotos accepts at most 50 photos"))]
    pub photos: Option<Vec<String>>,
}

impl ModelInput {
    /// Photo URLs to store, blanks removed. Positions are the indices of
    /// the returned vector.
    pub fn photo_urls(&self) -> Option<Vec<String>> {
        self.photos.as_ref().map(|urls| clean_photo_urls(urls))
    }
}

/// Drop blank URLs and trim the rest, preserving order
pub fn clean_photo_urls(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

impl Sanitize for ModelInput {
    fn sanitize(&mut self) {
        trim(&mut self.name);
        trim_optional(&mut self.surname);
        trim_optional(&mut self.email);
        trim_optional(&mut self.phone);
        trim_optional(&mut self.height);
        trim_optional(&mut self.measurements);
        trim_optional(&mut self.city);
        trim_optional(&mut self.photo);
        trim_optional(&mut self.description);
        if let Some(photos) = self.photos.as_mut() {
            *photos = clean_photo_urls(photos);
        }
    }
}

/// Raw admin list query string. Everything stays a string so that bad
/// values degrade to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListQuery {
    pub q: Option<String>,
    pub ciudad: Option<String>,
    pub activa: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

/// Bulk operation over many models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Activate,
    Deactivate,
    /// Hard delete; photos go with the row
    Delete,
}

impl BulkAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "activate" | "activar" => Some(Self::Activate),
            "deactivate" | "desactivar" => Some(Self::Deactivate),
            "delete" | "eliminar" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for BulkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bulk request body as sent by the admin table. `ids` is kept loose and
/// normalized by the model service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub ids: Vec<serde_json::Value>,
}

impl Sanitize for BulkActionRequest {
    fn sanitize(&mut self) {
        trim(&mut self.action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: i64, url: &str, order: i32) -> ModelPhoto {
        ModelPhoto {
            id,
            model_id: 1,
            url: url.to_string(),
            sort_order: order,
            created_at: Utc::now(),
        }
    }

    fn model(photo: Option<&str>, photos: Vec<ModelPhoto>) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            name: "Ana".to_string(),
            surname: None,
            email: None,
            phone: None,
            age: None,
            height: None,
            measurements: None,
            city: None,
            photo: photo.map(str::to_string),
            description: None,
            active: true,
            photos,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_primary_fallback_keeps_explicit_photo() {
        let m = model(Some("main.jpg"), vec![photo(1, "a.jpg", 0)]);
        assert_eq!(m.with_primary_fallback().photo.as_deref(), Some("main.jpg"));
    }

    #[test]
    fn test_primary_fallback_uses_first_photo() {
        let m = model(None, vec![photo(1, "a.jpg", 0), photo(2, "b.jpg", 1)]);
        assert_eq!(m.with_primary_fallback().photo.as_deref(), Some("a.jpg"));

        let m = model(None, vec![]);
        assert_eq!(m.with_primary_fallback().photo, None);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(model(None, vec![photo(9, "a.jpg", 0)])).unwrap();
        assert_eq!(json["nombre"], "Ana");
        assert_eq!(json["activa"], true);
        assert_eq!(json["fotos"][0], serde_json::json!({"id": 9, "url": "a.jpg", "orden": 0}));
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_input_distinguishes_missing_and_empty_photos() {
        let input: ModelInput = serde_json::from_str(r#"{"nombre": "Ana"}"#).unwrap();
        assert!(input.photos.is_none());

        let input: ModelInput = serde_json::from_str(r#"{"nombre": "Ana", "fotos": []}"#).unwrap();
        assert_eq!(input.photo_urls(), Some(vec![]));
    }

    #[test]
    fn test_photo_urls_filter_blanks_before_indexing() {
        let input: ModelInput =
            serde_json::from_str(r#"{"nombre": "Ana", "fotos": ["a.jpg", "  ", "", " b.jpg "]}"#)
                .unwrap();
        assert_eq!(
            input.photo_urls(),
            Some(vec!["a.jpg".to_string(), "b.jpg".to_string()])
        );
    }

    #[test]
    fn test_sanitize_then_validate() {
        let mut input: ModelInput = serde_json::from_str(
            r#"{"nombre": "  Ana  ", "email": "   ", "ciudad": " Lima ", "edad": "25"}"#,
        )
        .unwrap();
        input.sanitize();

        assert_eq!(input.name, "Ana");
        assert_eq!(input.email, None);
        assert_eq!(input.city.as_deref(), Some("Lima"));
        assert_eq!(input.age, Some(25));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_blank_name_and_bad_email() {
        let mut input: ModelInput =
            serde_json::from_str(r#"{"nombre": "   ", "email": "not-an-email"}"#).unwrap();
        input.sanitize();

        let errors = input.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn test_validation_rejects_out_of_range_age() {
        let input: ModelInput = serde_json::from_str(r#"{"nombre": "Ana", "edad": 7}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_bulk_action_parse() {
        assert_eq!(BulkAction::parse("activate"), Some(BulkAction::Activate));
        assert_eq!(BulkAction::parse("DESACTIVAR"), Some(BulkAction::Deactivate));
        assert_eq!(BulkAction::parse("delete"), Some(BulkAction::Delete));
        assert_eq!(BulkAction::parse("archive"), None);
    }

    #[test]
    fn test_list_query_uses_camel_case_keys() {
        let query: ModelListQuery =
            serde_json::from_str(r#"{"pageSize": "50", "sortBy": "edad", "sortDir": "asc"}"#)
                .unwrap();
        assert_eq!(query.page_size.as_deref(), Some("50"));
        assert_eq!(query.sort_by.as_deref(), Some("edad"));
        assert_eq!(query.sort_dir.as_deref(), Some("asc"));
    }
}
