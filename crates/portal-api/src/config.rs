//! Server configuration.
//!
//! Everything is read from the environment (after `dotenvy::dotenv()` in
//! `main`). Unset variables fall back to `portal_core::defaults`.

use std::env;
use std::str::FromStr;
use thiserror::Error;

use portal_core::{defaults, SubmissionLimits};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub file_storage_path: String,
    pub public_file_base_url: String,
    pub max_upload_bytes: u64,
    pub accepted_mime_type: String,
    pub semester_max: i16,
    /// SHA-256 hex digests of reviewer bearer tokens.
    pub reviewer_key_digests: Vec<String>,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u64,
    pub rate_limit_period_secs: u64,
    pub allowed_origins: Vec<String>,
    pub db_connect_attempts: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/portal".to_string(),
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            file_storage_path: defaults::FILE_STORAGE_PATH.to_string(),
            public_file_base_url: defaults::PUBLIC_FILE_BASE_URL.to_string(),
            max_upload_bytes: defaults::MAX_FILE_SIZE_BYTES,
            accepted_mime_type: defaults::ACCEPTED_MIME_TYPE.to_string(),
            semester_max: defaults::SEMESTER_MAX,
            reviewer_key_digests: Vec::new(),
            rate_limit_enabled: true,
            rate_limit_requests: defaults::RATE_LIMIT_REQUESTS,
            rate_limit_period_secs: defaults::RATE_LIMIT_PERIOD_SECS,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            db_connect_attempts: defaults::DB_CONNECT_ATTEMPTS,
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> ConfigResult<T> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value })
        }
        _ => Ok(default),
    }
}

fn parse_bool(name: &'static str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let base = Self::default();
        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(base.database_url),
            host: env::var("HOST").unwrap_or(base.host),
            port: parse_var("PORT", base.port)?,
            file_storage_path: env::var("FILE_STORAGE_PATH").unwrap_or(base.file_storage_path),
            public_file_base_url: env::var("PUBLIC_FILE_BASE_URL")
                .unwrap_or(base.public_file_base_url),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", base.max_upload_bytes)?,
            accepted_mime_type: env::var("ACCEPTED_MIME_TYPE").unwrap_or(base.accepted_mime_type),
            semester_max: parse_var("SEMESTER_MAX", base.semester_max)?,
            reviewer_key_digests: env::var("REVIEWER_API_KEYS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            rate_limit_enabled: parse_bool("RATE_LIMIT_ENABLED", base.rate_limit_enabled),
            rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS", base.rate_limit_requests)?,
            rate_limit_period_secs: parse_var(
                "RATE_LIMIT_PERIOD_SECS",
                base.rate_limit_period_secs,
            )?,
            allowed_origins: match env::var("ALLOWED_ORIGINS") {
                Ok(v) if !v.trim().is_empty() => split_list(&v),
                _ => base.allowed_origins,
            },
            db_connect_attempts: parse_var("DB_CONNECT_ATTEMPTS", base.db_connect_attempts)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "MAX_UPLOAD_BYTES must be greater than zero".to_string(),
            ));
        }
        if self.semester_max < 1 {
            return Err(ConfigError::Validation(
                "SEMESTER_MAX must be at least 1".to_string(),
            ));
        }
        if self.accepted_mime_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "ACCEPTED_MIME_TYPE cannot be empty".to_string(),
            ));
        }
        if self.rate_limit_enabled
            && (self.rate_limit_requests == 0 || self.rate_limit_period_secs == 0)
        {
            return Err(ConfigError::Validation(
                "Rate limit requests and period must be non-zero when enabled".to_string(),
            ));
        }
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(ConfigError::Validation(format!(
                "DATABASE_URL must be a postgres:// URL, got: {}",
                self.database_url
            )));
        }
        if let Some(bad) = self
            .reviewer_key_digests
            .iter()
            .find(|d| d.len() != 64 || !d.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(ConfigError::Validation(format!(
                "REVIEWER_API_KEYS entries must be SHA-256 hex digests, got: {}",
                bad
            )));
        }
        Ok(())
    }

    /// Validation limits for submissions.
    pub fn submission_limits(&self) -> SubmissionLimits {
        SubmissionLimits {
            max_file_size: self.max_upload_bytes,
            accepted_mime_type: self.accepted_mime_type.clone(),
            semester_max: self.semester_max,
            ..SubmissionLimits::default()
        }
    }

    /// Request body limit: the largest accepted file plus form overhead.
    pub fn body_limit_bytes(&self) -> usize {
        usize::try_from(self.max_upload_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(defaults::MULTIPART_OVERHEAD_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.body_limit_bytes(), 11 * 1024 * 1024);
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let config = ServerConfig {
            max_upload_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_postgres_url_rejected() {
        let config = ServerConfig {
            database_url: "mysql://localhost/portal".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reviewer_digests_must_be_hex() {
        let config = ServerConfig {
            reviewer_key_digests: vec!["not-a-digest".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            reviewer_key_digests: vec!["a".repeat(64)],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" https://a.example , ,http://localhost:3000"),
            vec!["https://a.example", "http://localhost:3000"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_submission_limits_follow_config() {
        let config = ServerConfig {
            max_upload_bytes: 1024,
            semester_max: 10,
            ..Default::default()
        };
        let limits = config.submission_limits();
        assert_eq!(limits.max_file_size, 1024);
        assert_eq!(limits.semester_max, 10);
        assert_eq!(limits.title_min_chars, 5);
    }

    #[test]
    fn test_body_limit_saturates() {
        let config = ServerConfig {
            max_upload_bytes: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.body_limit_bytes(), usize::MAX);
    }
}
