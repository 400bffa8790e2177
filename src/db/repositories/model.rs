//! Model repository
//!
//! Database operations for model profiles and their photos.
//!
//! This module provides:
//! - `ModelRepository` trait defining the interface for model data access
//! - `SqlxModelRepository` implementing the trait for SQLite and Postgres
//!
//! Writing a model and replacing its photos happen in one transaction, with
//! the photos inserted by a single multi-row statement. Listing loads the
//! photos of every listed model with one extra query.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::query::{push_filters, push_order_by, push_page, ListPlan};
use crate::db::DynDatabasePool;
use crate::models::{Model, ModelInput, ModelPhoto, PagedResult};

const MODEL_COLUMNS: &str = "id, name, surname, email, phone, age, height, measurements, city, \
     photo, description, active, created_at, updated_at";

const PHOTO_COLUMNS: &str = "id, model_id, url, sort_order, created_at";

/// Model repository trait
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Insert a model and its photos. `active` defaults to true.
    async fn create(&self, input: &ModelInput) -> Result<Model>;

    /// Get a model (active or not) with its photos
    async fn get_by_id(&self, id: i64) -> Result<Option<Model>>;

    /// Replace the profile fields. Photos are replaced only when
    /// `input.photos` is present. Returns `None` if the model doesn't exist.
    async fn update(&self, id: i64, input: &ModelInput) -> Result<Option<Model>>;

    /// Flip the active flag. Returns false if the model doesn't exist.
    async fn set_active(&self, id: i64, active: bool) -> Result<bool>;

    /// All active models, newest first, with photos
    async fn list_active(&self) -> Result<Vec<Model>>;

    /// Admin list: filtered, sorted, paginated, with photos
    async fn list(&self, plan: &ListPlan) -> Result<PagedResult<Model>>;

    /// Set the active flag on many models. Returns the affected row count.
    async fn bulk_set_active(&self, ids: &[i64], active: bool) -> Result<u64>;

    /// Hard delete many models; photos cascade. Returns the deleted count.
    async fn bulk_delete(&self, ids: &[i64]) -> Result<u64>;

    /// Photos of one model in display order
    async fn photos(&self, model_id: i64) -> Result<Vec<ModelPhoto>>;
}

/// SQLx-based model repository implementation
///
/// Supports both SQLite and Postgres databases.
pub struct SqlxModelRepository {
    pool: DynDatabasePool,
}

impl SqlxModelRepository {
    /// Create a new SQLx model repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ModelRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ModelRepository for SqlxModelRepository {
    async fn create(&self, input: &ModelInput) -> Result<Model> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_model_sqlite(self.pool.sqlite()?, input).await?,
            DatabaseDriver::Postgres => create_model_postgres(self.pool.postgres()?, input).await?,
        };
        self.get_by_id(id)
            .await?
            .context("Model vanished right after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_model_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Postgres => get_model_by_id_postgres(self.pool.postgres()?, id).await,
        }
    }

    async fn update(&self, id: i64, input: &ModelInput) -> Result<Option<Model>> {
        let updated = match self.pool.driver() {
            DatabaseDriver::Sqlite => update_model_sqlite(self.pool.sqlite()?, id, input).await?,
            DatabaseDriver::Postgres => {
                update_model_postgres(self.pool.postgres()?, id, input).await?
            }
        };
        if !updated {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        Ok(self.bulk_set_active(&[id], active).await? > 0)
    }

    async fn list_active(&self) -> Result<Vec<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_active_models_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Postgres => list_active_models_postgres(self.pool.postgres()?).await,
        }
    }

    async fn list(&self, plan: &ListPlan) -> Result<PagedResult<Model>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_models_sqlite(self.pool.sqlite()?, plan).await,
            DatabaseDriver::Postgres => list_models_postgres(self.pool.postgres()?, plan).await,
        }
    }

    async fn bulk_set_active(&self, ids: &[i64], active: bool) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bulk_set_active_sqlite(self.pool.sqlite()?, ids, active).await
            }
            DatabaseDriver::Postgres => {
                bulk_set_active_postgres(self.pool.postgres()?, ids, active).await
            }
        }
    }

    async fn bulk_delete(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => bulk_delete_sqlite(self.pool.sqlite()?, ids).await,
            DatabaseDriver::Postgres => bulk_delete_postgres(self.pool.postgres()?, ids).await,
        }
    }

    async fn photos(&self, model_id: i64) -> Result<Vec<ModelPhoto>> {
        let by_model = match self.pool.driver() {
            DatabaseDriver::Sqlite => load_photos_sqlite(self.pool.sqlite()?, &[model_id]).await?,
            DatabaseDriver::Postgres => {
                load_photos_postgres(self.pool.postgres()?, &[model_id]).await?
            }
        };
        Ok(by_model.into_values().next().unwrap_or_default())
    }
}

/// Hand each model its photos from a `model_id -> photos` map
fn attach_photos(models: &mut [Model], mut photos: HashMap<i64, Vec<ModelPhoto>>) {
    for model in models.iter_mut() {
        model.photos = photos.remove(&model.id).unwrap_or_default();
    }
}

fn group_photos(photos: Vec<ModelPhoto>) -> HashMap<i64, Vec<ModelPhoto>> {
    let mut grouped: HashMap<i64, Vec<ModelPhoto>> = HashMap::new();
    for photo in photos {
        grouped.entry(photo.model_id).or_default().push(photo);
    }
    grouped
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_model_sqlite(pool: &SqlitePool, input: &ModelInput) -> Result<i64> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO models (name, surname, email, phone, age, height, measurements, city,
                            photo, description, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.surname)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.age)
    .bind(&input.height)
    .bind(&input.measurements)
    .bind(&input.city)
    .bind(&input.photo)
    .bind(&input.description)
    .bind(input.active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create model")?;

    let id = result.last_insert_rowid();

    if let Some(urls) = input.photo_urls() {
        insert_photos_sqlite(&mut tx, id, &urls, now).await?;
    }

    tx.commit().await.context("Failed to commit model")?;
    Ok(id)
}

async fn update_model_sqlite(pool: &SqlitePool, id: i64, input: &ModelInput) -> Result<bool> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        UPDATE models
        SET name = ?, surname = ?, email = ?, phone = ?, age = ?, height = ?,
            measurements = ?, city = ?, photo = ?, description = ?,
            active = COALESCE(?, active), updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.name)
    .bind(&input.surname)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.age)
    .bind(&input.height)
    .bind(&input.measurements)
    .bind(&input.city)
    .bind(&input.photo)
    .bind(&input.description)
    .bind(input.active)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await
    .context("Failed to update model")?;

    if result.rows_affected() == 0 {
        tx.rollback().await.ok();
        return Ok(false);
    }

    if let Some(urls) = input.photo_urls() {
        sqlx::query("DELETE FROM model_photos WHERE model_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear model photos")?;
        insert_photos_sqlite(&mut tx, id, &urls, now).await?;
    }

    tx.commit().await.context("Failed to commit model update")?;
    Ok(true)
}

/// One multi-row insert; `sort_order` is the index in `urls`
async fn insert_photos_sqlite(
    conn: &mut SqliteConnection,
    model_id: i64,
    urls: &[String],
    now: DateTime<Utc>,
) -> Result<()> {
    if urls.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "INSERT INTO model_photos (model_id, url, sort_order, created_at) ",
    );
    qb.push_values(urls.iter().enumerate(), |mut row, (i, url)| {
        row.push_bind(model_id)
            .push_bind(url.clone())
            .push_bind(i as i32)
            .push_bind(now);
    });
    qb.build()
        .execute(conn)
        .await
        .context("Failed to insert model photos")?;
    Ok(())
}

async fn get_model_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Model>> {
    let row = sqlx::query(&format!("SELECT {} FROM models WHERE id = ?", MODEL_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get model by ID")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut models = vec![row_to_model_sqlite(&row)];
    let photos = load_photos_sqlite(pool, &[id]).await?;
    attach_photos(&mut models, photos);
    Ok(models.pop())
}

async fn list_active_models_sqlite(pool: &SqlitePool) -> Result<Vec<Model>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM models WHERE active = ? ORDER BY created_at DESC, id DESC",
        MODEL_COLUMNS
    ))
    .bind(true)
    .fetch_all(pool)
    .await
    .context("Failed to list active models")?;

    let mut models: Vec<Model> = rows.iter().map(row_to_model_sqlite).collect();
    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let photos = load_photos_sqlite(pool, &ids).await?;
    attach_photos(&mut models, photos);
    Ok(models)
}

async fn list_models_sqlite(pool: &SqlitePool, plan: &ListPlan) -> Result<PagedResult<Model>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM models");
    push_filters(&mut count, &plan.filters);
    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count models")?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM models", MODEL_COLUMNS));
    push_filters(&mut select, &plan.filters);
    push_order_by(&mut select, plan);
    push_page(&mut select, plan);
    let rows = select
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list models")?;

    let mut models: Vec<Model> = rows.iter().map(row_to_model_sqlite).collect();
    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let photos = load_photos_sqlite(pool, &ids).await?;
    attach_photos(&mut models, photos);

    Ok(PagedResult::new(models, total, plan.page))
}

async fn load_photos_sqlite(
    pool: &SqlitePool,
    model_ids: &[i64],
) -> Result<HashMap<i64, Vec<ModelPhoto>>> {
    if model_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM model_photos WHERE model_id IN (",
        PHOTO_COLUMNS
    ));
    let mut ids = qb.separated(", ");
    for id in model_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY model_id, sort_order ASC, created_at ASC, id ASC");

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to load model photos")?;

    Ok(group_photos(rows.iter().map(row_to_photo_sqlite).collect()))
}

async fn bulk_set_active_sqlite(pool: &SqlitePool, ids: &[i64], active: bool) -> Result<u64> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE models SET active = ");
    qb.push_bind(active);
    qb.push(", updated_at = ");
    qb.push_bind(Utc::now());
    qb.push(" WHERE id IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");

    let result = qb
        .build()
        .execute(pool)
        .await
        .context("Failed to update models")?;
    Ok(result.rows_affected())
}

async fn bulk_delete_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<u64> {
    let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM models WHERE id IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");

    let result = qb
        .build()
        .execute(pool)
        .await
        .context("Failed to delete models")?;
    Ok(result.rows_affected())
}

fn row_to_model_sqlite(row: &sqlx::sqlite::SqliteRow) -> Model {
    Model {
        id: row.get("id"),
        name: row.get("name"),
        surname: row.get("surname"),
        email: row.get("email"),
        phone: row.get("phone"),
        age: row.get("age"),
        height: row.get("height"),
        measurements: row.get("measurements"),
        city: row.get("city"),
        photo: row.get("photo"),
        description: row.get("description"),
        active: row.get("active"),
        photos: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_photo_sqlite(row: &sqlx::sqlite::SqliteRow) -> ModelPhoto {
    ModelPhoto {
        id: row.get("id"),
        model_id: row.get("model_id"),
        url: row.get("url"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// Postgres implementations
// ============================================================================

async fn create_model_postgres(pool: &PgPool, input: &ModelInput) -> Result<i64> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        INSERT INTO models (name, surname, email, phone, age, height, measurements, city,
                            photo, description, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(&input.name)
    .bind(&input.surname)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.age)
    .bind(&input.height)
    .bind(&input.measurements)
    .bind(&input.city)
    .bind(&input.photo)
    .bind(&input.description)
    .bind(input.active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to create model")?;

    let id: i64 = row.get("id");

    if let Some(urls) = input.photo_urls() {
        insert_photos_postgres(&mut tx, id, &urls, now).await?;
    }

    tx.commit().await.context("Failed to commit model")?;
    Ok(id)
}

async fn update_model_postgres(pool: &PgPool, id: i64, input: &ModelInput) -> Result<bool> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        UPDATE models
        SET name = $1, surname = $2, email = $3, phone = $4, age = $5, height = $6,
            measurements = $7, city = $8, photo = $9, description = $10,
            active = COALESCE($11, active), updated_at = $12
        WHERE id = $13
        "#,
    )
    .bind(&input.name)
    .bind(&input.surname)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.age)
    .bind(&input.height)
    .bind(&input.measurements)
    .bind(&input.city)
    .bind(&input.photo)
    .bind(&input.description)
    .bind(input.active)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await
    .context("Failed to update model")?;

    if result.rows_affected() == 0 {
        tx.rollback().await.ok();
        return Ok(false);
    }

    if let Some(urls) = input.photo_urls() {
        sqlx::query("DELETE FROM model_photos WHERE model_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear model photos")?;
        insert_photos_postgres(&mut tx, id, &urls, now).await?;
    }

    tx.commit().await.context("Failed to commit model update")?;
    Ok(true)
}

async fn insert_photos_postgres(
    conn: &mut PgConnection,
    model_id: i64,
    urls: &[String],
    now: DateTime<Utc>,
) -> Result<()> {
    if urls.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO model_photos (model_id, url, sort_order, created_at) ",
    );
    qb.push_values(urls.iter().enumerate(), |mut row, (i, url)| {
        row.push_bind(model_id)
            .push_bind(url.clone())
            .push_bind(i as i32)
            .push_bind(now);
    });
    qb.build()
        .execute(conn)
        .await
        .context("Failed to insert model photos")?;
    Ok(())
}

async fn get_model_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Model>> {
    let row = sqlx::query(&format!("SELECT {} FROM models WHERE id = $1", MODEL_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get model by ID")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut models = vec![row_to_model_postgres(&row)];
    let photos = load_photos_postgres(pool, &[id]).await?;
    attach_photos(&mut models, photos);
    Ok(models.pop())
}

async fn list_active_models_postgres(pool: &PgPool) -> Result<Vec<Model>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM models WHERE active = $1 ORDER BY created_at DESC, id DESC",
        MODEL_COLUMNS
    ))
    .bind(true)
    .fetch_all(pool)
    .await
    .context("Failed to list active models")?;

    let mut models: Vec<Model> = rows.iter().map(row_to_model_postgres).collect();
    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let photos = load_photos_postgres(pool, &ids).await?;
    attach_photos(&mut models, photos);
    Ok(models)
}

async fn list_models_postgres(pool: &PgPool, plan: &ListPlan) -> Result<PagedResult<Model>> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM models");
    push_filters(&mut count, &plan.filters);
    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count models")?;

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {} FROM models", MODEL_COLUMNS));
    push_filters(&mut select, &plan.filters);
    push_order_by(&mut select, plan);
    push_page(&mut select, plan);
    let rows = select
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list models")?;

    let mut models: Vec<Model> = rows.iter().map(row_to_model_postgres).collect();
    let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
    let photos = load_photos_postgres(pool, &ids).await?;
    attach_photos(&mut models, photos);

    Ok(PagedResult::new(models, total, plan.page))
}

async fn load_photos_postgres(
    pool: &PgPool,
    model_ids: &[i64],
) -> Result<HashMap<i64, Vec<ModelPhoto>>> {
    if model_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query(&format!(
        "SELECT {} FROM model_photos WHERE model_id = ANY($1) \
         ORDER BY model_id, sort_order ASC, created_at ASC, id ASC",
        PHOTO_COLUMNS
    ))
    .bind(model_ids)
    .fetch_all(pool)
    .await
    .context("Failed to load model photos")?;

    Ok(group_photos(rows.iter().map(row_to_photo_postgres).collect()))
}

async fn bulk_set_active_postgres(pool: &PgPool, ids: &[i64], active: bool) -> Result<u64> {
    let result =
        sqlx::query("UPDATE models SET active = $1, updated_at = $2 WHERE id = ANY($3)")
            .bind(active)
            .bind(Utc::now())
            .bind(ids)
            .execute(pool)
            .await
            .context("Failed to update models")?;
    Ok(result.rows_affected())
}

async fn bulk_delete_postgres(pool: &PgPool, ids: &[i64]) -> Result<u64> {
    let result = sqlx::query("DELETE FROM models WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await
        .context("Failed to delete models")?;
    Ok(result.rows_affected())
}

fn row_to_model_postgres(row: &sqlx::postgres::PgRow) -> Model {
    Model {
        id: row.get("id"),
        name: row.get("name"),
        surname: row.get("surname"),
        email: row.get("email"),
        phone: row.get("phone"),
        age: row.get("age"),
        height: row.get("height"),
        measurements: row.get("measurements"),
        city: row.get("city"),
        photo: row.get("photo"),
        description: row.get("description"),
        active: row.get("active"),
        photos: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_photo_postgres(row: &sqlx::postgres::PgRow) -> ModelPhoto {
    ModelPhoto {
        id: row.get("id"),
        model_id: row.get("model_id"),
        url: row.get("url"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
    }
}
