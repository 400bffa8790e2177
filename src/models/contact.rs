//! Contact (lead) entity and the public form payloads that create it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::sanitize::{trim, trim_optional, Sanitize};

/// Where a lead came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    /// Contact form
    #[default]
    Contact,
    /// Raffle signup
    Raffle,
}

impl ContactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Raffle => "raffle",
        }
    }

    /// Parse a stored value or a filter value. Spanish names are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "contact" | "contacto" => Some(Self::Contact),
            "raffle" | "sorteo" => Some(Self::Raffle),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored lead. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "empresa")]
    pub company: Option<String>,
    #[serde(rename = "mensaje")]
    pub message: Option<String>,
    #[serde(rename = "origen")]
    pub source: ContactSource,
    /// Submission time
    #[serde(rename = "fecha")]
    pub created_at: DateTime<Utc>,
}

/// Repository input for a new lead
#[derive(Debug, Clone)]
pub struct CreateContactInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
    pub source: ContactSource,
}

/// `POST /api/contacto` body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(rename = "nombre", default)]
    #[validate(length(min = 1, max = 150, message = "nombre is required (max 150 characters)"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(rename = "telefono", default)]
    #[validate(length(max = 50, message = "telefono must be at most 50 characters"))]
    pub phone: Option<String>,
    #[serde(rename = "empresa", default)]
    #[validate(length(max = 150, message = "empresa must be at most 150 characters"))]
    pub company: Option<String>,
    #[serde(rename = "mensaje", default)]
    #[validate(length(max = 5000, message = "mensaje must be at most 5000 characters"))]
    pub message: Option<String>,
    /// Honeypot. Humans never see this field.
    #[serde(default)]
    pub website: Option<String>,
}

impl ContactForm {
    pub fn is_spam(&self) -> bool {
        is_filled(&self.website)
    }

    pub fn into_input(self) -> CreateContactInput {
        CreateContactInput {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            message: self.message,
            source: ContactSource::Contact,
        }
    }
}

impl Sanitize for ContactForm {
    fn sanitize(&mut self) {
        trim(&mut self.name);
        trim(&mut self.email);
        trim_optional(&mut self.phone);
        trim_optional(&mut self.company);
        trim_optional(&mut self.message);
    }
}

/// `POST /api/sorteo` body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RaffleForm {
    #[serde(rename = "nombre", default)]
    #[validate(length(min = 1, max = 150, message = "nombre is required (max 150 characters)"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(rename = "telefono", default)]
    #[validate(length(max = 50, message = "telefono must be at most 50 characters"))]
    pub phone: Option<String>,
    /// Honeypot
    #[serde(default)]
    pub website: Option<String>,
}

impl RaffleForm {
    pub fn is_spam(&self) -> bool {
        is_filled(&self.website)
    }

    pub fn into_input(self) -> CreateContactInput {
        CreateContactInput {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: None,
            message: None,
            source: ContactSource::Raffle,
        }
    }
}

impl Sanitize for RaffleForm {
    fn sanitize(&mut self) {
        trim(&mut self.name);
        trim(&mut self.email);
        trim_optional(&mut self.phone);
    }
}

fn is_filled(field: &Option<String>) -> bool {
    field.as_deref().map_or(false, |v| !v.trim().is_empty())
}

/// Raw admin contact list query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListQuery {
    pub q: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub from: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub to: Option<String>,
    pub origen: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}
