//! User service
//!
//! Admin authentication:
//! - Login with username and password, creating a server-side session
//! - Logout and session validation (expired sessions are removed lazily)
//! - Seeding the first admin account from configuration
//! - Periodic purge of expired sessions

use crate::config::AdminConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Sanitize, Session, User};
use crate::services::password::{hash_password, verify_against_dummy, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Default session lifetime in hours
pub const DEFAULT_SESSION_HOURS: i64 = 24;

/// Message returned for every failed login. Wrong username and wrong
/// password are indistinguishable.
pub const INVALID_CREDENTIALS: &str = "Incorrect credentials";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown username or wrong password
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for authentication and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_lifetime: Duration,
}

impl UserService {
    /// Create a user service whose sessions live `session_hours` (at least one)
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_hours: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_lifetime: Duration::hours(session_hours.max(1)),
        }
    }

    /// How long a new session stays valid
    pub fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    /// Check credentials and open a session.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown username or a wrong password
    /// - `InternalError` for database errors or a corrupt stored hash
    pub async fn login(&self, input: LoginInput) -> Result<(Session, User), UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to look up user")?;

        let Some(user) = user else {
            verify_against_dummy(&input.password);
            tracing::info!("Login failed for unknown user '{}'", input.username);
            return Err(UserServiceError::InvalidCredentials);
        };

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::info!("Login failed for user '{}': wrong password", user.username);
            return Err(UserServiceError::InvalidCredentials);
        }

        let session = Session::new(user.id, self.session_lifetime);
        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!("User '{}' logged in", user.username);
        Ok((session, user))
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        let removed = self
            .session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        if !removed {
            tracing::debug!("Logout with unknown session token");
        }
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// deleted on the way out.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .find(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Create the configured admin account when no user exists yet.
    ///
    /// Returns the new user, or `None` if accounts already exist.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> Result<Option<User>, UserServiceError> {
        let count = self.user_repo.count().await.context("Failed to count users")?;
        if count > 0 {
            return Ok(None);
        }

        let password_hash = hash_password(&admin.password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(&CreateUserInput {
                username: admin.username.clone(),
                password_hash,
                display_name: admin.display_name.clone(),
            })
            .await
            .context("Failed to create admin user")?;

        tracing::info!("Seeded admin user '{}'", user.username);
        Ok(Some(user))
    }

    /// Delete every expired session. Returns the number removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired(Utc::now())
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }
}

/// `POST /api/login` body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "password is required"))]
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Sanitize for LoginInput {
    // Passwords are taken verbatim
    fn sanitize(&mut self) {
        crate::models::sanitize::trim(&mut self.username);
    }
}
