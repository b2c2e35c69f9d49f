use std::{env, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct IssueServerConfig {
    pub database_url: String,
    pub listen_addr: String,
    /// Adds a text-search clause over summary and description when listing.
    pub text_search_enabled: bool,
    pub pagination: PaginationConfig,
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryConfig {
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl SummaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let retry_attempts = parse_var("SUMMARY_RETRY_ATTEMPTS")?.unwrap_or(defaults.retry_attempts);
        if retry_attempts == 0 {
            return Err(ConfigError::InvalidVar("SUMMARY_RETRY_ATTEMPTS"));
        }

        let retry_backoff = parse_var("SUMMARY_RETRY_BACKOFF_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);

        Ok(Self {
            retry_attempts,
            retry_backoff,
        })
    }
}

impl PaginationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_limit =
            parse_var("PAGINATION_DEFAULT_LIMIT")?.unwrap_or(defaults.default_limit);
        let max_limit = parse_var("PAGINATION_MAX_LIMIT")?.unwrap_or(defaults.max_limit);

        if default_limit <= 0 {
            return Err(ConfigError::InvalidVar("PAGINATION_DEFAULT_LIMIT"));
        }
        if max_limit < default_limit {
            return Err(ConfigError::InvalidVar("PAGINATION_MAX_LIMIT"));
        }

        Ok(Self {
            default_limit,
            max_limit,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(&'static str),
}

impl IssueServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("SERVER_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .map_err(|_| ConfigError::MissingVar("SERVER_DATABASE_URL"))?;

        let listen_addr =
            env::var("SERVER_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let text_search_enabled = env::var("TEXT_SEARCH_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let pagination = PaginationConfig::from_env()?;
        let summary = SummaryConfig::from_env()?;

        tracing::info!(
            listen_addr = %listen_addr,
            text_search_enabled,
            default_limit = pagination.default_limit,
            max_limit = pagination.max_limit,
            "issue server config loaded"
        );

        Ok(Self {
            database_url,
            listen_addr,
            text_search_enabled,
            pagination,
            summary,
        })
    }

    /// Defaults for everything but the database location.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            listen_addr: "127.0.0.1:0".to_string(),
            text_search_enabled: false,
            pagination: PaginationConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar(name)),
        _ => Ok(None),
    }
}
