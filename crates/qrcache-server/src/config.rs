//! Server configuration.

use anyhow::Result;
use qrcache_core::{EntityMeta, QueryResultsConfig, DEFAULT_RECENT_QUERY_CAPACITY};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// SQL executed once at startup, e.g. entity table definitions.
    #[serde(default)]
    pub init_sql: Option<PathBuf>,
    /// Whether this node coordinates cluster-wide maintenance.
    #[serde(default = "default_coordinator")]
    pub coordinator: bool,
    /// Seconds between inactive-session sweeps; 0 disables the sweeper.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_recent_query_capacity")]
    pub recent_query_capacity: usize,
    #[serde(default)]
    pub results: QueryResultsConfig,
    #[serde(default)]
    pub entities: Vec<EntityMeta>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qrcache")
        .join("qrcache.db")
}

fn default_coordinator() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_recent_query_capacity() -> usize {
    DEFAULT_RECENT_QUERY_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            init_sql: None,
            coordinator: default_coordinator(),
            sweep_interval_secs: default_sweep_interval_secs(),
            recent_query_capacity: default_recent_query_capacity(),
            results: QueryResultsConfig::default(),
            entities: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}
