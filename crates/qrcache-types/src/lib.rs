//! Shared types for the qrcache previous-query-results cache.

mod id;
mod query;
mod session;
mod sweep;

pub use id::*;
pub use query::*;
pub use session::*;
pub use sweep::*;
