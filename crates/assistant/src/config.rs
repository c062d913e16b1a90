//! Assistant configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `OPENAI_API_KEY` - API key for the chat-completions endpoint
//!
//! ## Optional
//! - `OPENAI_BASE_URL` - Endpoint base (default: <https://api.openai.com/v1>)
//! - `OPENAI_MODEL` - Model used to pick a tool (default: gpt-4)
//! - `OPENAI_HANDLER_MODEL` - Model used by the SQL and RAG handlers (default: gpt-4o)
//! - `OPENAI_TIMEOUT_SECS` - Transport timeout per request (default: 60)
//! - `ASSISTANT_HOST` - Bind address (default: 127.0.0.1)
//! - `ASSISTANT_PORT` - Listen port (default: 3002)
//! - `ASSISTANT_BASE_URL` - Public URL (default: `http://{host}:{port}`)
//! - `CATALOG_PATH` - Product catalog CSV (default: data/products.csv)
//! - `KNOWLEDGE_BASE_PATH` - Platform error notes (default: data/platform_errors.yaml)
//! - `SESSION_IDLE_MINUTES` - Session expiry on inactivity (default: 60)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` or `text` (default: text)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_KEY_ENTROPY: f64 = 3.3;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_RESOLVER_MODEL: &str = "gpt-4";
pub const DEFAULT_HANDLER_MODEL: &str = "gpt-4o";

/// Substrings of template keys, matched case-insensitively.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
    "add-your",
];

/// Invalid or unsafe configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(String),
    #[error("{0} is invalid: {1}")]
    InvalidEnvVar(String, String),
    #[error("{0} rejected: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Assistant application configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to decide whether cookies are `Secure`
    pub base_url: String,
    /// Chat-completions endpoint configuration
    pub openai: OpenAIConfig,
    /// Product catalog CSV
    pub catalog_path: PathBuf,
    /// Platform error knowledge base (YAML)
    pub knowledge_base_path: PathBuf,
    /// Session idle expiry in minutes
    pub session_idle_minutes: i64,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Chat-completions endpoint configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: SecretString,
    pub base_url: Url,
    /// Model used by the function-call resolver and the free-form fallback
    pub model: String,
    /// Model used by the SQL and RAG handlers
    pub handler_model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("handler_model", &self.handler_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AssistantConfig {
    /// Read the process environment, after merging a `.env` file if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing or unparseable variable, or an
    /// API key that looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside development
        let _ = dotenvy::dotenv();

        Self::from_vars(&Env::Process)
    }

    /// Load configuration from an explicit variable map.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_vars(&Env::Map(vars))
    }

    fn from_vars(env: &Env<'_>) -> Result<Self, ConfigError> {
        let host = env
            .get_or_default("ASSISTANT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ASSISTANT_HOST".to_string(), e.to_string()))?;
        let port = parse_var(env, "ASSISTANT_PORT", "3002")?;
        let base_url = env
            .get("ASSISTANT_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let session_idle_minutes: i64 = parse_var(env, "SESSION_IDLE_MINUTES", "60")?;
        if session_idle_minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_IDLE_MINUTES".to_string(),
                "must be positive".to_string(),
            ));
        }

        let log_format = match env.get_or_default("LOG_FORMAT", "text").as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'json' or 'text', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            base_url,
            openai: OpenAIConfig::from_vars(env)?,
            catalog_path: PathBuf::from(env.get_or_default("CATALOG_PATH", "data/products.csv")),
            knowledge_base_path: PathBuf::from(
                env.get_or_default("KNOWLEDGE_BASE_PATH", "data/platform_errors.yaml"),
            ),
            session_idle_minutes,
            log_format,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .get("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .get("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl OpenAIConfig {
    fn from_vars(env: &Env<'_>) -> Result<Self, ConfigError> {
        let api_key = env
            .get("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
        check_api_key(&api_key, "OPENAI_API_KEY")?;

        let base_url = Url::parse(&env.get_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("OPENAI_BASE_URL".to_string(), e.to_string()))?;
        let timeout_secs: u64 = parse_var(env, "OPENAI_TIMEOUT_SECS", "60")?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            model: env.get_or_default("OPENAI_MODEL", DEFAULT_RESOLVER_MODEL),
            handler_model: env.get_or_default("OPENAI_HANDLER_MODEL", DEFAULT_HANDLER_MODEL),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source: the process environment, or a map in tests and tools.
enum Env<'a> {
    Process,
    Map(&'a HashMap<String, String>),
}

impl Env<'_> {
    fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            Self::Process => std::env::var(key).ok(),
            Self::Map(vars) => vars.get(key).cloned(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

fn parse_var<T>(env: &Env<'_>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env.get_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Bits of information per character, from character frequencies.
fn entropy_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let share = f64::from(n) / total;
            -share * share.log2()
        })
        .sum()
}

/// Reject API keys copied from a template or typed by hand.
fn check_api_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| ConfigError::InsecureSecret(var_name.to_string(), reason);

    let lowered = key.to_lowercase();
    if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lowered.contains(**m)) {
        return Err(insecure(format!("looks like a placeholder ('{marker}')")));
    }

    let bits = entropy_per_char(key);
    if bits < MIN_KEY_ENTROPY {
        return Err(insecure(format!(
            "too predictable ({bits:.2} bits per character, minimum {MIN_KEY_ENTROPY:.1})"
        )));
    }
    Ok(())
}
