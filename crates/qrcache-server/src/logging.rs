//! Logging configuration and initialization.
//!
//! Presets pick a baseline filter for the `qrcache::*` targets, CLI overrides
//! adjust single targets, and `RUST_LOG` replaces everything when set.

use std::collections::BTreeMap;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "qrcache::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, sessions and sweep summaries
    #[default]
    Production,
    /// Adds API requests and per-operation timings
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "qrcache::startup=info",
                "qrcache::session=info",
                "qrcache::sweep=info",
                "qrcache::api=warn",
                "qrcache::results=warn",
                "qrcache::db=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["qrcache=info", "tower_http=info"],
            LogPreset::Debug => &["qrcache=debug", "tower_http=debug"],
            LogPreset::Trace => &["qrcache=trace", "tower_http=trace"],
            LogPreset::Quiet => &["qrcache=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides (e.g., "qrcache::sweep" -> DEBUG)
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Create a new LogConfig from CLI arguments.
    ///
    /// When several preset flags are given, quiet beats trace, trace beats
    /// debug and debug beats verbose.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        let overrides = log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(|part| {
                let (target, level) = part.split_once('=')?;
                let level = parse_level(level.trim())?;
                Some((normalize_target(target.trim()), level))
            })
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Build an EnvFilter from this configuration.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Filter directives: the preset first, then overrides, which take precedence.
    pub fn directives(&self) -> String {
        let mut directives: Vec<String> = self
            .preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .collect();
        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level.as_str().to_lowercase()));
        }
        directives.join(",")
    }
}

/// "sweep" -> "qrcache::sweep"; full targets and tower_http pass through.
fn normalize_target(target: &str) -> String {
    if target == "qrcache" || target.starts_with(TARGET_PREFIX) || target.starts_with("tower_http") {
        target.to_string()
    } else {
        format!("{TARGET_PREFIX}{target}")
    }
}

fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_preset_priority() {
        let config = LogConfig::from_cli(true, true, true, true, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Quiet);

        let config = LogConfig::from_cli(true, true, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Debug);

        let config = LogConfig::from_cli(false, false, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Production);
    }

    #[test]
    fn test_overrides_are_normalized() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["sweep=debug,results=trace".into(), "qrcache::api=warn".into(), "tower_http=info".into()],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("qrcache::sweep"), Some(&Level::DEBUG));
        assert_eq!(config.overrides.get("qrcache::results"), Some(&Level::TRACE));
        assert_eq!(config.overrides.get("qrcache::api"), Some(&Level::WARN));
        assert_eq!(config.overrides.get("tower_http"), Some(&Level::INFO));
    }

    #[test]
    fn test_invalid_override_level_is_dropped() {
        let config = LogConfig::from_cli(false, false, false, false, vec!["sweep=loud".into()], LogFormat::Text);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_overrides_follow_preset_in_directives() {
        let config = LogConfig::from_cli(false, false, false, true, vec!["sweep=debug".into()], LogFormat::Text);
        assert_eq!(config.directives(), "qrcache=warn,tower_http=error,qrcache::sweep=debug");
    }
}
