//! Previous-query-results cache: persists the primary keys of a query's
//! result set per session so a later query can be narrowed to them.

mod catalog;
mod cluster;
mod error;
mod manager;
mod query;
mod recent;
mod session;
mod store;

pub use catalog::{EntityCatalog, EntityMeta};
pub use cluster::{ClusterRole, SingleNode, StaticRole};
pub use error::QueryCacheError;
pub use manager::{
    QueryResultsConfig, QueryResultsManager, DELETE_BATCH_SIZE, INSERT_BATCH_SIZE, SWEEP_SCAN_LIMIT,
};
pub use query::{BuiltQuery, QueryBuilder, SelectQuery};
pub use recent::{RecentQueries, DEFAULT_RECENT_QUERY_CAPACITY};
pub use session::{ActiveSessions, SessionRegistry, UserSession};
pub use store::{QueryResultStore, RESULT_TABLE};

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, QueryCacheError>;
