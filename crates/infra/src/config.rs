//! Configuration loading and representation.

use std::path::PathBuf;
use std::sync::Arc;

use rolegate_observability::LogFormat;

use crate::store::{ConsoleStore, InMemoryConsoleStore, JsonFileStore, StoreError};

pub const DATA_DIR_VAR: &str = "ROLEGATE_DATA_DIR";
pub const AUDIT_DISPLAY_LIMIT_VAR: &str = "ROLEGATE_AUDIT_DISPLAY_LIMIT";
pub const SEED_DEMO_VAR: &str = "ROLEGATE_SEED_DEMO";
pub const LOG_FORMAT_VAR: &str = "ROLEGATE_LOG_FORMAT";

/// Number of audit entries a consumer shows by default.
pub const DEFAULT_AUDIT_DISPLAY_LIMIT: usize = 10;

/// Console runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Where the JSON store lives. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub audit_display_limit: usize,
    /// Seed a few demo users when the store is empty.
    pub seed_demo: bool,
    pub log_format: LogFormat,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            audit_display_limit: DEFAULT_AUDIT_DISPLAY_LIMIT,
            seed_demo: false,
            log_format: LogFormat::default(),
        }
    }
}

impl ConsoleConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Log format alone, for setting up logging before the rest is read.
    pub fn log_format_from_env() -> LogFormat {
        read_log_format(&|key: &str| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unparseable values fall back to
    /// defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let audit_display_limit = match lookup(AUDIT_DISPLAY_LIMIT_VAR) {
            None => defaults.audit_display_limit,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "{AUDIT_DISPLAY_LIMIT_VAR} is not a positive integer; using {DEFAULT_AUDIT_DISPLAY_LIMIT}"
                    );
                    defaults.audit_display_limit
                }
            },
        };

        let seed_demo = match lookup(SEED_DEMO_VAR) {
            None => defaults.seed_demo,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    tracing::warn!(value = %raw, "{SEED_DEMO_VAR} is not a boolean; ignoring");
                    defaults.seed_demo
                }
            },
        };

        Self {
            data_dir,
            audit_display_limit,
            seed_demo,
            log_format: read_log_format(&lookup),
        }
    }

    /// Build the configured store.
    pub fn open_store(&self) -> Result<Arc<dyn ConsoleStore>, StoreError> {
        match &self.data_dir {
            Some(dir) => Ok(Arc::new(JsonFileStore::open(dir)?)),
            None => {
                tracing::info!("{DATA_DIR_VAR} not set; using in-memory store");
                Ok(Arc::new(InMemoryConsoleStore::new()))
            }
        }
    }
}

fn read_log_format(lookup: &impl Fn(&str) -> Option<String>) -> LogFormat {
    match lookup(LOG_FORMAT_VAR) {
        None => LogFormat::default(),
        Some(raw) => LogFormat::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(value = %raw, "{LOG_FORMAT_VAR} is not json or pretty; using json");
            LogFormat::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(ConsoleConfig::from_lookup(lookup(&[])), ConsoleConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/var/lib/rolegate"),
            (AUDIT_DISPLAY_LIMIT_VAR, "25"),
            (SEED_DEMO_VAR, "yes"),
            (LOG_FORMAT_VAR, "pretty"),
        ]));

        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/rolegate")));
        assert_eq!(config.audit_display_limit, 25);
        assert!(config.seed_demo);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "   "),
            (AUDIT_DISPLAY_LIMIT_VAR, "0"),
            (SEED_DEMO_VAR, "maybe"),
            (LOG_FORMAT_VAR, "xml"),
        ]));
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn opens_file_store_when_data_dir_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig {
            data_dir: Some(dir.path().join("console")),
            ..ConsoleConfig::default()
        };

        let store = config.open_store().unwrap();
        assert!(store.load_all().unwrap().users.is_empty());
        assert!(dir.path().join("console").is_dir());
    }
}
