use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::client::{ConfiguredFlow, FlowRunner};
use crate::config::FlowConfig;

/// Load the env file (if any) and initialize structured tracing from RUST_LOG.
///
/// Env file lookup order:
/// - explicit path in ENV_FILE or DOTENV_PATH
/// - `.envfile` in the working directory
/// - standard `.env` discovery
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none"
        && std::path::Path::new(".envfile").is_file()
        && dotenvy::from_filename(".envfile").is_ok()
    {
        env_source = ".envfile".into();
    }

    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8088.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into())
}

fn truthy(value: Option<String>) -> bool {
    value
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn first_nonempty<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|&k| lookup(k))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Shared application state used by the HTTP server and handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<dyn FlowRunner>,
}

impl AppState {
    pub fn new(runner: Arc<dyn FlowRunner>) -> Self {
        Self { runner }
    }

    /// Wire the configured flow behind a freshly built HTTP client.
    pub fn from_config(config: &FlowConfig) -> Result<Self, reqwest::Error> {
        let http = build_http_client(config.http_timeout)?;
        Ok(Self::new(Arc::new(ConfiguredFlow::from_config(http, config))))
    }
}

/// Build the outbound HTTP client, honoring proxy environment variables.
///
/// Environment:
/// - CHAT2FLOW_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - CHAT2FLOW_PROXY_URL = <url>         -> proxy for all schemes
/// - HTTP_PROXY / http_proxy             -> HTTP proxy
/// - HTTPS_PROXY / https_proxy           -> HTTPS proxy
///
/// `timeout` of `None` leaves requests unbounded.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
    http_client_from_lookup(timeout, env_lookup)
}

/// Same as [`build_http_client`], reading proxy settings from an arbitrary key lookup.
pub fn http_client_from_lookup<F>(
    timeout: Option<Duration>,
    lookup: F,
) -> Result<reqwest::Client, reqwest::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = reqwest::Client::builder();

    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }

    if truthy(lookup("CHAT2FLOW_NO_PROXY")) {
        builder = builder.no_proxy();
    } else {
        if let Some(u) = first_nonempty(&lookup, &["CHAT2FLOW_PROXY_URL"]) {
            builder = builder.proxy(reqwest::Proxy::all(u.as_str())?);
        }
        if let Some(u) = first_nonempty(&lookup, &["HTTP_PROXY", "http_proxy"]) {
            builder = builder.proxy(reqwest::Proxy::http(u.as_str())?);
        }
        if let Some(u) = first_nonempty(&lookup, &["HTTPS_PROXY", "https_proxy"]) {
            builder = builder.proxy(reqwest::Proxy::https(u.as_str())?);
        }
    }

    builder = builder.user_agent(format!("chat2flow/{}", env!("CARGO_PKG_VERSION")));

    builder.build()
}

/// Split a comma-separated value into parsed items.
/// `None` means "any" (unset, `*`, or nothing parseable).
fn parse_list<T>(raw: Option<String>, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let raw = raw?;
    let raw = raw.trim();
    if raw == "*" {
        return None;
    }
    let items: Vec<T> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(parse)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
/// - CORS_ALLOW_CREDENTIALS: enable with 1,true,yes,on
/// - CORS_MAX_AGE: max age in seconds (u64)
///
/// Anything unset is permissive, so the chat UI can be served from another origin.
/// With credentials enabled, "any" mirrors the request instead of answering `*`.
pub fn cors_layer_from_env() -> CorsLayer {
    cors_layer_from_lookup(env_lookup)
}

pub fn cors_layer_from_lookup<F>(lookup: F) -> CorsLayer
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = truthy(lookup("CORS_ALLOW_CREDENTIALS"));
    let mut layer = CorsLayer::new();

    let origins = parse_list(lookup("CORS_ALLOWED_ORIGINS"), |p| {
        http::HeaderValue::from_str(p).ok()
    });
    layer = match origins {
        Some(origins) => layer.allow_origin(AllowOrigin::list(origins)),
        None if credentials => layer.allow_origin(AllowOrigin::mirror_request()),
        None => layer.allow_origin(Any),
    };

    let methods = parse_list(lookup("CORS_ALLOWED_METHODS"), |p| {
        http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok()
    });
    layer = match methods {
        Some(methods) => layer.allow_methods(AllowMethods::list(methods)),
        None if credentials => layer.allow_methods(AllowMethods::mirror_request()),
        None => layer.allow_methods(Any),
    };

    let headers = parse_list(lookup("CORS_ALLOWED_HEADERS"), |p| {
        http::header::HeaderName::try_from(p).ok()
    });
    layer = match headers {
        Some(headers) => layer.allow_headers(AllowHeaders::list(headers)),
        None if credentials => layer.allow_headers(AllowHeaders::mirror_request()),
        None => layer.allow_headers(Any),
    };

    if credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(secs) =
        first_nonempty(&lookup, &["CORS_MAX_AGE"]).and_then(|s| s.parse::<u64>().ok())
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    layer
}
