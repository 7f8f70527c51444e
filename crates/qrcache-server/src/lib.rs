//! qrcache server library - HTTP API over the previous-query-results cache.
//!
//! Separated from main.rs so the router can be driven from integration tests.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
pub mod sweeper;
