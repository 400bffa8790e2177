//! Session store
//!
//! Every admin request resolves its token here, so lookups are a single
//! primary-key read. Expired rows are dropped lazily by the user service and
//! in bulk by the hourly purge in `main`.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a freshly issued session
    async fn create(&self, session: &Session) -> Result<()>;

    /// Look up a session by token, expired or not
    async fn find(&self, token: &str) -> Result<Option<Session>>;

    /// Remove one session. Returns `false` when the token was unknown.
    async fn delete(&self, token: &str) -> Result<bool>;

    /// Remove every session that expired before `cutoff`
    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// The statements differ between backends only in their placeholders
struct SessionSql {
    insert: &'static str,
    find: &'static str,
    delete: &'static str,
    delete_expired: &'static str,
}

const SQLITE_SQL: SessionSql = SessionSql {
    insert: "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    find: "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
    delete: "DELETE FROM sessions WHERE id = ?",
    delete_expired: "DELETE FROM sessions WHERE expires_at < ?",
};

const POSTGRES_SQL: SessionSql = SessionSql {
    insert: "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
    find: "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = $1",
    delete: "DELETE FROM sessions WHERE id = $1",
    delete_expired: "DELETE FROM sessions WHERE expires_at < $1",
};

pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }

    fn sql(&self) -> &'static SessionSql {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => &SQLITE_SQL,
            DatabaseDriver::Postgres => &POSTGRES_SQL,
        }
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<()> {
        let sql = self.sql().insert;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&session.id)
                .bind(session.user_id)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(self.pool.sqlite()?)
                .await
                .map(|_| ()),
            DatabaseDriver::Postgres => sqlx::query(sql)
                .bind(&session.id)
                .bind(session.user_id)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(self.pool.postgres()?)
                .await
                .map(|_| ()),
        }
        .with_context(|| format!("Failed to create session for user {}", session.user_id))
    }

    async fn find(&self, token: &str) -> Result<Option<Session>> {
        let sql = self.sql().find;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_as::<_, Session>(sql)
                    .bind(token)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
            }
            DatabaseDriver::Postgres => {
                sqlx::query_as::<_, Session>(sql)
                    .bind(token)
                    .fetch_optional(self.pool.postgres()?)
                    .await
            }
        }
        .context("Failed to look up session")
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let sql = self.sql().delete;
        let removed = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(token)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Postgres => sqlx::query(sql)
                .bind(token)
                .execute(self.pool.postgres()?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete session")?;
        Ok(removed > 0)
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let sql = self.sql().delete_expired;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(cutoff)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Postgres => sqlx::query(sql)
                .bind(cutoff)
                .execute(self.pool.postgres()?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to purge expired sessions")
    }
}
