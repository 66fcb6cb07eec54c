use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::models::Tweaks;

pub const DEFAULT_BASE_URL: &str = "https://api.langflow.astra.datastax.com";

/// Reasons a flow configuration is rejected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (mandatory)")]
    Missing(&'static str),
    #[error("LANGFLOW_BASE_URL must start with http:// or https:// (got {0:?})")]
    InvalidBaseUrl(String),
    #[error("{key} must be a non-negative integer (got {value:?})")]
    InvalidNumber { key: &'static str, value: String },
    #[error("failed to load tweaks: {0:#}")]
    Tweaks(anyhow::Error),
}

/// Selects and parametrizes the one hosted flow this service talks to.
///
/// Environment:
/// - LANGFLOW_BASE_URL                  -> flow service base URL (default: DataStax Langflow)
/// - LANGFLOW_APPLICATION_TOKEN         -> bearer token (required)
/// - LANGFLOW_FLOW_ID                   -> flow id or name (required)
/// - LANGFLOW_SERVICE_ID                -> Langflow tenant/service id (required)
/// - LANGFLOW_TWEAKS_FILE               -> optional JSON file of per-node overrides
/// - CHAT2FLOW_HTTP_TIMEOUT_SECONDS     -> outbound request timeout (unset: none)
/// - CHAT2FLOW_TRANSPORT_RETRIES        -> extra attempts on connection failures (default 0)
#[derive(Clone)]
pub struct FlowConfig {
    pub base_url: String,
    pub application_token: String,
    pub flow_id: String,
    pub service_id: String,
    pub tweaks: Tweaks,
    pub http_timeout: Option<Duration>,
    pub transport_retries: u32,
}

impl std::fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowConfig")
            .field("base_url", &self.base_url)
            .field("application_token", &"<redacted>")
            .field("flow_id", &self.flow_id)
            .field("service_id", &self.service_id)
            .field("tweaks", &self.tweaks.len())
            .field("http_timeout", &self.http_timeout)
            .field("transport_retries", &self.transport_retries)
            .finish()
    }
}

impl FlowConfig {
    /// Read and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read and validate configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let base_url = normalize_base_url(
            &get("LANGFLOW_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let tweaks = match get("LANGFLOW_TWEAKS_FILE") {
            Some(path) => load_tweaks_from_file(&path).map_err(ConfigError::Tweaks)?,
            None => Tweaks::new(),
        };

        let http_timeout = match get("CHAT2FLOW_HTTP_TIMEOUT_SECONDS") {
            Some(v) => Some(Duration::from_secs(parse_number::<u64>(
                "CHAT2FLOW_HTTP_TIMEOUT_SECONDS",
                &v,
            )?)),
            None => None,
        };
        let transport_retries = match get("CHAT2FLOW_TRANSPORT_RETRIES") {
            Some(v) => parse_number::<u32>("CHAT2FLOW_TRANSPORT_RETRIES", &v)?,
            None => 0,
        };

        Ok(Self {
            base_url,
            application_token: require("LANGFLOW_APPLICATION_TOKEN")?,
            flow_id: require("LANGFLOW_FLOW_ID")?,
            service_id: require("LANGFLOW_SERVICE_ID")?,
            tweaks,
            http_timeout,
            transport_retries,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

/// Load per-node overrides from a JSON file shaped like
/// `{ "ChatInput-S6UmW": {}, "OpenAIModel-kCZ95": { "temperature": 0.2 } }`.
pub fn load_tweaks_from_file<P: AsRef<Path>>(path: P) -> Result<Tweaks> {
    let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
        format!("Failed to read tweaks file: {}", path.as_ref().display())
    })?;

    let tweaks: Tweaks = serde_json::from_str(&content)
        .with_context(|| "Tweaks file must be a JSON object of node id -> override object")?;

    Ok(tweaks)
}
