//! Contact repository
//!
//! Database operations for leads captured by the public forms.
//!
//! This module provides:
//! - `ContactRepository` trait defining the interface for contact data access
//! - `SqlxContactRepository` implementing the trait for SQLite and Postgres

use crate::config::DatabaseDriver;
use crate::db::query::{push_filters, push_order_by, push_page, ListPlan};
use crate::db::DynDatabasePool;
use crate::models::{Contact, ContactSource, CreateContactInput, PagedResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;

const CONTACT_COLUMNS: &str = "id, name, email, phone, company, message, source, created_at";

/// Contact repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Store a new lead
    async fn create(&self, input: &CreateContactInput) -> Result<Contact>;

    /// Admin list: filtered, sorted, paginated
    async fn list(&self, plan: &ListPlan) -> Result<PagedResult<Contact>>;
}

/// SQLx-based contact repository implementation
///
/// Supports both SQLite and Postgres databases.
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    /// Create a new SQLx contact repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, input: &CreateContactInput) -> Result<Contact> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_contact_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Postgres => {
                create_contact_postgres(self.pool.postgres()?, input).await
            }
        }
    }

    async fn list(&self, plan: &ListPlan) -> Result<PagedResult<Contact>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_contacts_sqlite(self.pool.sqlite()?, plan).await,
            DatabaseDriver::Postgres => list_contacts_postgres(self.pool.postgres()?, plan).await,
        }
    }
}

fn parse_source(raw: &str) -> ContactSource {
    ContactSource::parse(raw).unwrap_or_default()
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_contact_sqlite(pool: &SqlitePool, input: &CreateContactInput) -> Result<Contact> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO contacts (name, email, phone, company, message, source, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.company)
    .bind(&input.message)
    .bind(input.source.as_str())
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create contact")?;

    Ok(contact_from_input(result.last_insert_rowid(), input, now))
}

async fn list_contacts_sqlite(pool: &SqlitePool, plan: &ListPlan) -> Result<PagedResult<Contact>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM contacts");
    push_filters(&mut count, &plan.filters);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count contacts")?;

    let mut select =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM contacts", CONTACT_COLUMNS));
    push_filters(&mut select, &plan.filters);
    push_order_by(&mut select, plan);
    push_page(&mut select, plan);
    let rows = select
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list contacts")?;

    Ok(PagedResult::new(
        rows.iter().map(row_to_contact_sqlite).collect(),
        total,
        plan.page,
    ))
}

fn row_to_contact_sqlite(row: &sqlx::sqlite::SqliteRow) -> Contact {
    let source: String = row.get("source");
    Contact {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        message: row.get("message"),
        source: parse_source(&source),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// Postgres implementations
// ============================================================================

async fn create_contact_postgres(pool: &PgPool, input: &CreateContactInput) -> Result<Contact> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        INSERT INTO contacts (name, email, phone, company, message, source, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.company)
    .bind(&input.message)
    .bind(input.source.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create contact")?;

    Ok(contact_from_input(row.get("id"), input, now))
}

async fn list_contacts_postgres(pool: &PgPool, plan: &ListPlan) -> Result<PagedResult<Contact>> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contacts");
    push_filters(&mut count, &plan.filters);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count contacts")?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {} FROM contacts", CONTACT_COLUMNS));
    push_filters(&mut select, &plan.filters);
    push_order_by(&mut select, plan);
    push_page(&mut select, plan);
    let rows = select
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list contacts")?;

    Ok(PagedResult::new(
        rows.iter().map(row_to_contact_postgres).collect(),
        total,
        plan.page,
    ))
}

fn row_to_contact_postgres(row: &sqlx::postgres::PgRow) -> Contact {
    let source: String = row.get("source");
    Contact {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        message: row.get("message"),
        source: parse_source(&source),
        created_at: row.get("created_at"),
    }
}

fn contact_from_input(id: i64, input: &CreateContactInput, now: chrono::DateTime<Utc>) -> Contact {
    Contact {
        id,
        name: input.name.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
        company: input.company.clone(),
        message: input.message.clone(),
        source: input.source,
        created_at: now,
    }
}
