pub mod access;
pub mod auth;
pub mod billings;
pub mod collections;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod money;
pub mod orders;
pub mod receivables;
pub mod routes;

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;

/// Application state containing shared resources.
///
/// Holds the database connection pool and the loaded configuration that
/// route handlers and middleware need.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub db: PgPool,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
