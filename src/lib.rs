//! Vitrina - model agency gallery and admin backend
//!
//! Public gallery of model profiles, contact and raffle lead capture, and a
//! session-protected admin API, on SQLite or Postgres.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
