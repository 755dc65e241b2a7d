//! Shared application state for all routes. Everything behind it is read-only after startup.

use crate::catalog::Catalog;
use crate::settings::Settings;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub catalog: Arc<Catalog>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        AppState {
            pool,
            catalog: Arc::new(Catalog::standard()),
            settings: Arc::new(settings),
        }
    }
}
