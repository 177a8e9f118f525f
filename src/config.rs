//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default enrollment endpoint of the backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/api/matriculas";

/// Chat bot host configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Webhook bind host.
    pub host: String,
    /// Webhook bind port.
    pub port: u16,
    /// Enrollment endpoint the collected data is POSTed to.
    pub backend_url: reqwest::Url,
    /// Upper bound for a single submission call.
    pub submit_timeout: Duration,
    /// FAQ source file (JSON object of question → answer).
    pub faq_path: PathBuf,
    /// Ask the user to confirm the collected data before submitting.
    pub confirm_before_submit: bool,
    /// Conversation state records idle longer than this are dropped.
    pub state_idle_timeout: Duration,
    /// Also run the stdin/stdout channel.
    pub cli_enabled: bool,
    /// Directory for the rolling log file, if any.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url =
            lookup("MATRICULA_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = parse_url("MATRICULA_BACKEND_URL", &raw_url)?;

        let submit_timeout_secs: u64 = lookup("MATRICULA_SUBMIT_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(10);

        // Zero would expire every conversation between two turns.
        let state_idle_secs: u64 = lookup("MATRICULA_STATE_IDLE_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(3600); // 1 hour

        Ok(Self {
            host: lookup("MATRICULA_BOT_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("MATRICULA_BOT_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(3978),
            backend_url,
            submit_timeout: Duration::from_secs(submit_timeout_secs),
            faq_path: lookup("MATRICULA_FAQ_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("faq.json")),
            confirm_before_submit: lookup("MATRICULA_CONFIRM")
                .is_some_and(|s| parse_flag(&s)),
            state_idle_timeout: Duration::from_secs(state_idle_secs),
            cli_enabled: lookup("MATRICULA_CLI").is_some_and(|s| parse_flag(&s)),
            log_dir: lookup("MATRICULA_LOG_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    /// Address the webhook server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Enrollment backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    /// SQLite file holding the enrollments.
    pub db_path: PathBuf,
    pub log_dir: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            db_path: PathBuf::from("./data/matriculas.db"),
            log_dir: None,
        }
    }
}

impl BackendConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("MATRICULA_BACKEND_HOST").unwrap_or(defaults.host),
            port: lookup("MATRICULA_BACKEND_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            db_path: lookup("MATRICULA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_dir: lookup("MATRICULA_LOG_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_url(key: &str, raw: &str) -> Result<reqwest::Url, ConfigError> {
    let url = reqwest::Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
