//! Configuration loading from TOML with environment variable overrides.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file or key falls back to a local
//! SQLite database on port 8080.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Environment variable that replaces `database.url`.
pub const DATABASE_URL_ENV: &str = "BETLEDGER_DATABASE_URL";
/// Environment variable that replaces `server.port`.
pub const PORT_ENV: &str = "BETLEDGER_PORT";
/// Presence of this variable switches logging to JSON.
pub const LOG_JSON_ENV: &str = "BETLEDGER_LOG_JSON";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL, e.g. `sqlite://betledger.db` or `sqlite::memory:`.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://betledger.db".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// A private in-memory database (one connection, lives as long as the pool).
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "betledger=info,tower_http=info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load `path` if it exists (defaults otherwise), then apply env overrides.
    pub fn load_or_default(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::load(path)?
        } else {
            warn!(path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (usually the process env).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.database.url = url;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {port}"))?;
        }
        if lookup(LOG_JSON_ENV).is_some() {
            self.logging.json = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.url, "sqlite://betledger.db");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_parse_partial_file() {
        let cfg = AppConfig::parse(
            r#"
            [server]
            port = 9000

            [database]
            url = "sqlite://ledger-test.db"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.url, "sqlite://ledger-test.db");
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(AppConfig::parse("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (DATABASE_URL_ENV, "sqlite::memory:"),
            (PORT_ENV, "3030"),
            (LOG_JSON_ENV, "1"),
        ]);
        let mut cfg = AppConfig::default();
        cfg.apply_env(|name| env.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.server.port, 3030);
        assert!(cfg.database.is_in_memory());
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_env_bad_port() {
        let mut cfg = AppConfig::default();
        let result = cfg.apply_env(|name| (name == PORT_ENV).then(|| "abc".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(AppConfig::load("/nonexistent/betledger/config.toml").is_err());
    }

    #[test]
    fn test_load_repository_config() {
        // Only meaningful when run from the crate root.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert!(cfg.server.port > 0);
            assert!(cfg.database.url.starts_with("sqlite:"));
        }
    }
}
