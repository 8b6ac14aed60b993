use std::sync::Arc;

use cms_core::locale::LocaleCatalog;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cms_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Countries and languages pages may be saved under.
    pub locales: Arc<LocaleCatalog>,
}

impl AppState {
    pub fn new(pool: cms_db::DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            locales: Arc::new(LocaleCatalog::default()),
        }
    }
}
