//! User model
//!
//! Admin accounts. There is a single permission tier: a user either has a
//! valid session or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Login name (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Name shown in the admin panel
    #[serde(rename = "nombre")]
    pub display_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
}
