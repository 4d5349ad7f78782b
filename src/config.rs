use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::DEFAULT_MAX_COMMENT_DEPTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Credentials for the Reddit "script" application used to read the API.
#[derive(Clone)]
pub struct RedditCredentials {
    pub username: String,
    pub password: String,
    pub app_id: String,
    pub app_secret: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("username", &self.username)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub get_cache_time: Duration,

    // Admission
    pub post_cache_time: Duration,
    pub rate_limit_capacity: u32,
    pub rate_limit_interval: Duration,
    pub admission_sweep_interval: Duration,

    // Archiving
    pub max_comment_depth: usize,

    // Upstream API
    pub client_timeout: Duration,
    pub reddit_api_base: String,
    pub reddit_token_url: String,
    pub reddit: RedditCredentials,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/archive.sqlite")),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
            get_cache_time: Duration::from_secs(parse_env_u64("GET_CACHE_SECS", 60)?),

            // Admission
            post_cache_time: Duration::from_secs(parse_env_u64("POST_CACHE_SECS", 3600)?),
            rate_limit_capacity: parse_env_u32("RATE_LIMIT_CAPACITY", 5)?,
            rate_limit_interval: Duration::from_secs(parse_env_u64(
                "RATE_LIMIT_INTERVAL_SECS",
                60,
            )?),
            admission_sweep_interval: Duration::from_secs(parse_env_u64(
                "ADMISSION_SWEEP_SECS",
                300,
            )?),

            // Archiving
            max_comment_depth: parse_env_usize("MAX_COMMENT_DEPTH", DEFAULT_MAX_COMMENT_DEPTH)?,

            // Upstream API
            client_timeout: Duration::from_secs(parse_env_u64("CLIENT_TIMEOUT_SECS", 5)?),
            reddit_api_base: env_or_default("REDDIT_API_BASE", "https://oauth.reddit.com"),
            reddit_token_url: env_or_default(
                "REDDIT_TOKEN_URL",
                "https://www.reddit.com/api/v1/access_token",
            ),
            reddit: RedditCredentials {
                username: required_env("REDDIT_APP_DEV_NAME")?,
                password: required_env("REDDIT_APP_DEV_PW")?,
                app_id: required_env("REDDIT_APP_ID")?,
                app_secret: required_env("REDDIT_APP_SECRET")?,
            },
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_capacity == 0 {
            return Err(invalid("RATE_LIMIT_CAPACITY", "must be at least 1"));
        }
        if self.rate_limit_interval.is_zero() {
            return Err(invalid("RATE_LIMIT_INTERVAL_SECS", "must be at least 1"));
        }
        if self.admission_sweep_interval.is_zero() {
            return Err(invalid("ADMISSION_SWEEP_SECS", "must be at least 1"));
        }
        if self.max_comment_depth == 0 {
            return Err(invalid("MAX_COMMENT_DEPTH", "must be at least 1"));
        }
        if self.client_timeout.is_zero() {
            return Err(invalid("CLIENT_TIMEOUT_SECS", "must be at least 1"));
        }
        for (name, value) in [
            ("REDDIT_APP_DEV_NAME", &self.reddit.username),
            ("REDDIT_APP_DEV_PW", &self.reddit.password),
            ("REDDIT_APP_ID", &self.reddit.app_id),
            ("REDDIT_APP_SECRET", &self.reddit.app_secret),
        ] {
            if value.is_empty() {
                return Err(invalid(name, "cannot be empty"));
            }
        }
        if url::Url::parse(&self.reddit_api_base).is_err() {
            return Err(invalid("REDDIT_API_BASE", "must be an absolute URL"));
        }
        Ok(())
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_credentials() {
        std::env::set_var("REDDIT_APP_DEV_NAME", "archiver");
        std::env::set_var("REDDIT_APP_DEV_PW", "hunter2");
        std::env::set_var("REDDIT_APP_ID", "app-id");
        std::env::set_var("REDDIT_APP_SECRET", "app-secret");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        set_credentials();
        std::env::remove_var("RATE_LIMIT_CAPACITY");
        std::env::remove_var("MAX_COMMENT_DEPTH");

        let config = Config::from_env().unwrap();
        assert_eq!(config.rate_limit_capacity, 5);
        assert_eq!(config.rate_limit_interval, Duration::from_secs(60));
        assert_eq!(config.post_cache_time, Duration::from_secs(3600));
        assert_eq!(config.max_comment_depth, 100);
        assert_eq!(config.client_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_missing_credentials() {
        set_credentials();
        std::env::remove_var("REDDIT_APP_SECRET");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "REDDIT_APP_SECRET"));
    }

    #[test]
    #[serial]
    fn test_zero_capacity_rejected() {
        set_credentials();
        std::env::set_var("RATE_LIMIT_CAPACITY", "0");

        let config = Config::from_env().unwrap();
        assert!(config.validate().is_err());

        std::env::remove_var("RATE_LIMIT_CAPACITY");
    }

    #[test]
    #[serial]
    fn test_bad_integer() {
        set_credentials();
        std::env::set_var("MAX_COMMENT_DEPTH", "deep");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::ParseInt { .. })
        ));

        std::env::remove_var("MAX_COMMENT_DEPTH");
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = RedditCredentials {
            username: "archiver".to_string(),
            password: "hunter2".to_string(),
            app_id: "id".to_string(),
            app_secret: "shh".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("shh"));
    }
}
