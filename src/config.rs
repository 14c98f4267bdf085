//! Runtime configuration from environment variables

use std::env;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the review runtime and dashboard
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct SentiflowConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Remote classifier endpoint; None selects the in-process lexicon
    pub classifier_url: Option<String>,

    /// Request timeout for the remote classifier (seconds)
    pub classifier_timeout_secs: u64,

    /// Buffer size of the submission channel
    pub channel_buffer: usize,

    /// `user:password` pairs for the static auth provider
    pub auth_users: String,
}

impl SentiflowConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SENTIFLOW_DB_PATH` (default: data/sentiflow.db)
    /// - `CLASSIFIER_URL` (default: unset, lexicon classifier)
    /// - `CLASSIFIER_TIMEOUT_SECS` (default: 10)
    /// - `SUBMISSION_CHANNEL_BUFFER` (default: 1000)
    /// - `AUTH_USERS` (default: "demo:demo")
    pub fn from_env() -> Result<Self, ConfigError> {
        let classifier_url = env::var("CLASSIFIER_URL").ok();

        if let Some(ref url) = classifier_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(
                    "CLASSIFIER_URL must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(Self {
            db_path: env::var("SENTIFLOW_DB_PATH")
                .unwrap_or_else(|_| "data/sentiflow.db".to_string()),

            classifier_url,

            classifier_timeout_secs: env::var("CLASSIFIER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            channel_buffer: env::var("SUBMISSION_CHANNEL_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),

            auth_users: env::var("AUTH_USERS").unwrap_or_else(|_| "demo:demo".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test because env vars are process-global and tests run in parallel
    #[test]
    fn test_config_from_env() {
        env::remove_var("SENTIFLOW_DB_PATH");
        env::remove_var("CLASSIFIER_URL");
        env::remove_var("CLASSIFIER_TIMEOUT_SECS");
        env::remove_var("SUBMISSION_CHANNEL_BUFFER");
        env::remove_var("AUTH_USERS");

        let config = SentiflowConfig::from_env().unwrap();

        assert_eq!(config.db_path, "data/sentiflow.db");
        assert!(config.classifier_url.is_none());
        assert_eq!(config.classifier_timeout_secs, 10);
        assert_eq!(config.channel_buffer, 1_000);
        assert_eq!(config.auth_users, "demo:demo");

        // Non-http classifier endpoints are rejected
        env::set_var("CLASSIFIER_URL", "ftp://model.internal/classify");
        let result = SentiflowConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
        env::remove_var("CLASSIFIER_URL");

        env::set_var("CLASSIFIER_URL", "https://model.internal/classify");
        let config = SentiflowConfig::from_env().unwrap();
        assert_eq!(
            config.classifier_url.as_deref(),
            Some("https://model.internal/classify")
        );
        env::remove_var("CLASSIFIER_URL");
    }
}
