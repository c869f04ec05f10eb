//! Pipeline configuration.
//!
//! Everything a run needs is collected into [`PipelineConfig`] once, at the
//! boundary, and handed to components at construction. Values come from an
//! optional TOML file (non-secret settings only) overridden by the process
//! environment. Secrets are read from the environment and have no defaults.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const API_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";
pub const API_URL_VAR: &str = "ALPHA_VANTAGE_URL";
pub const DB_HOST_VAR: &str = "STOCK_DB_HOST";
pub const DB_PORT_VAR: &str = "STOCK_DB_PORT";
pub const DB_NAME_VAR: &str = "STOCK_DB_NAME";
pub const DB_USER_VAR: &str = "STOCK_DB_USER";
pub const DB_PASSWORD_VAR: &str = "STOCK_DB_PASSWORD";

/// Alpha Vantage query endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Value shipped in sample deployment files; never a usable key.
const PLACEHOLDER_API_KEY: &str = "YOUR_DEFAULT_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("{0} holds the placeholder value; set a real Alpha Vantage API key")]
    Placeholder(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("config file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Validated Alpha Vantage API key. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Missing(API_KEY_VAR));
        }
        if trimmed == PLACEHOLDER_API_KEY {
            return Err(ConfigError::Placeholder(API_KEY_VAR));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct AlphaVantageConfig {
    pub api_key: ApiKey,
    pub base_url: String,
}

impl AlphaVantageConfig {
    pub fn from_lookup<F>(lookup: &F, file: Option<&FileConfig>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_key = non_empty(lookup(API_KEY_VAR)).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let api_key = ApiKey::new(raw_key)?;

        let base_url = non_empty(lookup(API_URL_VAR))
            .or_else(|| file.and_then(|f| f.alpha_vantage.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: API_URL_VAR,
                reason: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        Ok(Self { api_key, base_url })
    }
}

/// Connection settings for the `stock_data` database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    password: String,
}

impl DatabaseConfig {
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn from_lookup<F>(lookup: &F, file: Option<&FileConfig>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = file.map(|f| &f.database);

        let host = non_empty(lookup(DB_HOST_VAR))
            .or_else(|| section.and_then(|s| s.host.clone()))
            .ok_or(ConfigError::Missing(DB_HOST_VAR))?;

        let port = match non_empty(lookup(DB_PORT_VAR)) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: DB_PORT_VAR,
                reason: format!("'{raw}': {e}"),
            })?,
            None => section
                .and_then(|s| s.port)
                .ok_or(ConfigError::Missing(DB_PORT_VAR))?,
        };

        let name = non_empty(lookup(DB_NAME_VAR))
            .or_else(|| section.and_then(|s| s.name.clone()))
            .ok_or(ConfigError::Missing(DB_NAME_VAR))?;

        let user = non_empty(lookup(DB_USER_VAR))
            .or_else(|| section.and_then(|s| s.user.clone()))
            .ok_or(ConfigError::Missing(DB_USER_VAR))?;

        // Secret: environment only.
        let password = lookup(DB_PASSWORD_VAR).ok_or(ConfigError::Missing(DB_PASSWORD_VAR))?;

        Ok(Self {
            host,
            port,
            name,
            user,
            password,
        })
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Full configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub alpha_vantage: AlphaVantageConfig,
    pub database: DatabaseConfig,
}

impl PipelineConfig {
    /// Load through an arbitrary variable lookup. The API key is checked
    /// first so a missing key is always the reported error.
    pub fn from_lookup<F>(lookup: F, file: Option<&FileConfig>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let alpha_vantage = AlphaVantageConfig::from_lookup(&lookup, file)?;
        let database = DatabaseConfig::from_lookup(&lookup, file)?;
        Ok(Self {
            alpha_vantage,
            database,
        })
    }
}

/// Optional TOML overlay. Holds no secrets.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub alpha_vantage: AlphaVantageSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlphaVantageSection {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub user: Option<String>,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::File {
            path: "<inline>".into(),
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (API_KEY_VAR, "demo-key"),
            (DB_HOST_VAR, "db.internal"),
            (DB_PORT_VAR, "5432"),
            (DB_NAME_VAR, "stocks"),
            (DB_USER_VAR, "etl"),
            (DB_PASSWORD_VAR, "hunter2"),
        ])
    }

    fn lookup_in(env: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| env.get(key).map(|v| v.to_string())
    }

    #[test]
    fn loads_complete_environment() {
        let config = PipelineConfig::from_lookup(lookup_in(full_env()), None).unwrap();
        assert_eq!(config.alpha_vantage.api_key.expose(), "demo-key");
        assert_eq!(config.alpha_vantage.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.password(), "hunter2");
    }

    #[test]
    fn missing_api_key_is_reported_first() {
        let env = HashMap::from([(DB_HOST_VAR, "db.internal")]);
        let err = PipelineConfig::from_lookup(lookup_in(env), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut env = full_env();
        env.insert(API_KEY_VAR, "   ");
        let err = PipelineConfig::from_lookup(lookup_in(env), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));
    }

    #[test]
    fn placeholder_api_key_is_rejected() {
        let mut env = full_env();
        env.insert(API_KEY_VAR, "YOUR_DEFAULT_API_KEY");
        let err = PipelineConfig::from_lookup(lookup_in(env), None).unwrap_err();
        assert!(matches!(err, ConfigError::Placeholder(_)));
    }

    #[test]
    fn missing_password_has_no_default() {
        let mut env = full_env();
        env.remove(DB_PASSWORD_VAR);
        let err = PipelineConfig::from_lookup(lookup_in(env), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(DB_PASSWORD_VAR)));
    }

    #[test]
    fn bad_port_is_invalid() {
        let mut env = full_env();
        env.insert(DB_PORT_VAR, "postgres");
        let err = PipelineConfig::from_lookup(lookup_in(env), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: DB_PORT_VAR, .. }));
    }

    #[test]
    fn file_fills_gaps_and_env_wins() {
        let file = FileConfig::from_toml(
            r#"
[alpha_vantage]
base_url = "http://localhost:9000/query"

[database]
host = "from-file"
port = 6543
name = "file_db"
user = "file_user"
"#,
        )
        .unwrap();

        let env = HashMap::from([
            (API_KEY_VAR, "demo-key"),
            (DB_HOST_VAR, "from-env"),
            (DB_PASSWORD_VAR, "pw"),
        ]);
        let config = PipelineConfig::from_lookup(lookup_in(env), Some(&file)).unwrap();

        assert_eq!(config.alpha_vantage.base_url, "http://localhost:9000/query");
        assert_eq!(config.database.host, "from-env");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.name, "file_db");
        assert_eq!(config.database.user, "file_user");
    }

    #[test]
    fn file_rejects_secrets() {
        let err = FileConfig::from_toml("[database]\npassword = \"nope\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }

    #[test]
    fn non_http_base_url_is_invalid() {
        let mut env = full_env();
        env.insert(API_URL_VAR, "ftp://example.com");
        let err = PipelineConfig::from_lookup(lookup_in(env), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: API_URL_VAR, .. }));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = PipelineConfig::from_lookup(lookup_in(full_env()), None).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("demo-key"));
        assert!(!rendered.contains("hunter2"));
    }
}
