//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the operations for a specific entity and hides
//! which backend is in use.

pub mod contact;
pub mod model;
pub mod session;
pub mod user;

#[cfg(test)]
mod contract_tests;

pub use contact::{ContactRepository, SqlxContactRepository};
pub use model::{ModelRepository, SqlxModelRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
