//! Database layer
//!
//! Storage for the gallery, leads and admin sessions. Two backends are
//! supported:
//! - SQLite (default, embedded file)
//! - Postgres (hosted deployments such as Supabase)
//!
//! The backend is selected by configuration. Everything above the
//! repositories talks to the `DatabasePool` trait and the repository traits,
//! never to a concrete driver.
//!
//! # Usage
//!
//! ```ignore
//! use vitrina::config::DatabaseConfig;
//! use vitrina::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod query;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, PostgresDatabase,
    SqliteDatabase,
};
