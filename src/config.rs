//! Configuration for the Memoria memory manager
//!
//! Settings are layered from an optional `memoria.toml` file and
//! `MEMORIA_*` environment variables. The database path resolves through
//! a chain of increasingly general sources: CLI flag, `MEMORIA_DB_PATH`,
//! the settings file, and finally the platform data directory.

use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Process-wide settings
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Settings {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Database-related settings
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the database file
    pub path: Option<String>,
}

impl Settings {
    /// Load settings from `memoria.toml` (if present) and `MEMORIA_*`
    /// environment variables.
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name("memoria").required(false))
            .add_source(config::Environment::with_prefix("MEMORIA").separator("__"))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

/// Get the default database path under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memoria")
        .join("memoria.db")
}

/// Resolve the database path from CLI arg, env var, settings, or default
pub fn resolve_db_path(cli_path: Option<String>, settings: &Settings) -> String {
    let path = cli_path
        .or_else(|| std::env::var("MEMORIA_DB_PATH").ok())
        .or_else(|| settings.database.path.clone())
        .unwrap_or_else(|| default_db_path().to_string_lossy().to_string());

    debug!("Resolved database path: {}", path);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_shape() {
        let path = default_db_path();
        assert!(path.ends_with("memoria/memoria.db") || path.ends_with("memoria\\memoria.db"));
    }

    #[test]
    fn test_cli_path_takes_precedence() {
        let settings = Settings {
            database: DatabaseSettings {
                path: Some("/from/settings.db".to_string()),
            },
        };

        let resolved = resolve_db_path(Some("/from/cli.db".to_string()), &settings);
        assert_eq!(resolved, "/from/cli.db");
    }

    #[test]
    fn test_settings_path_beats_default() {
        let settings = Settings {
            database: DatabaseSettings {
                path: Some("/from/settings.db".to_string()),
            },
        };

        // Only deterministic when MEMORIA_DB_PATH is not set in the test
        // environment.
        if std::env::var("MEMORIA_DB_PATH").is_err() {
            let resolved = resolve_db_path(None, &settings);
            assert_eq!(resolved, "/from/settings.db");
        }
    }
}
