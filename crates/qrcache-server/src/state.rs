//! Shared application state.

use crate::config::Config;
use qrcache_core::{
    EntityCatalog, QueryResultStore, QueryResultsManager, SessionRegistry, StaticRole,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub results: Arc<QueryResultsManager>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> qrcache_core::Result<Self> {
        let store = Arc::new(QueryResultStore::open(&config.db_path)?);
        if let Some(path) = &config.init_sql {
            let sql = std::fs::read_to_string(path)?;
            store.execute_batch(&sql)?;
            info!(target: "qrcache::startup", "Applied init SQL from {}", path.display());
        }

        let catalog = Arc::new(EntityCatalog::from_entities(config.entities.clone())?);
        let sessions = Arc::new(SessionRegistry::new(config.recent_query_capacity));
        let cluster = Arc::new(StaticRole::new(config.coordinator));
        let results = Arc::new(QueryResultsManager::new(
            store,
            catalog,
            sessions.clone(),
            cluster,
            config.results.clone(),
        ));

        Ok(Self {
            sessions,
            results,
            config,
        })
    }
}
