//! Error types for the query-results cache.

use qrcache_types::MixedKeyKinds;
use sqlparser::parser::ParserError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum QueryCacheError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("SQL parse error: {0}")]
    SqlParse(#[from] ParserError),

    #[error("Unsupported parameter '{name}': {reason}")]
    UnsupportedParameter { name: String, reason: String },

    #[error(transparent)]
    MixedKeyKinds(#[from] MixedKeyKinds),

    #[error("Error deleting query result records")]
    PurgeFailed {
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl QueryCacheError {
    /// Whether the error was caused by the caller's input rather than storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryCacheError::UnknownEntity(_)
                | QueryCacheError::InvalidQuery(_)
                | QueryCacheError::SqlParse(_)
                | QueryCacheError::UnsupportedParameter { .. }
                | QueryCacheError::MixedKeyKinds(_)
        )
    }
}
