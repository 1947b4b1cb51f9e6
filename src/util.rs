use axum::response::{IntoResponse, Response};
use http::StatusCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::client::AnakinClient;
use crate::config::RelayConfig;

/// Initialize dotenv and structured tracing based on RUST_LOG.
///
/// `.env` is loaded first (if present) so RUST_LOG set there is honored.
pub fn init_tracing() {
    let env_source = if dotenvy::dotenv().is_ok() {
        ".env"
    } else {
        "none"
    };

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8080.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into())
}

/// Relay config file path: first CLI arg, then CHAT2ANAKIN_CONFIG, then ./config.yaml.
pub fn env_config_path() -> String {
    std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with('-'))
        .or_else(|| std::env::var("CHAT2ANAKIN_CONFIG").ok())
        .unwrap_or_else(|| "config.yaml".into())
}

/// Shared application state used by the HTTP server and handlers.
///
/// The model map is injected here rather than read from ambient globals so
/// tests can swap it per server instance.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub client: AnakinClient,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        let http = build_http_client_from_env();
        let client = AnakinClient::new(http, &config);
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

/// Build an HTTP client honoring proxy and timeout environment variables.
///
/// Environment:
/// - CHAT2ANAKIN_NO_PROXY = 1|true|yes|on   -> disable all proxies
/// - CHAT2ANAKIN_PROXY_URL = <url>          -> proxy for all schemes
/// - CHAT2ANAKIN_HTTP_TIMEOUT_SECONDS       -> overall request timeout (u64)
///
/// Note the timeout covers the whole request; streaming relays with no
/// configured timeout rely on the transport's own connect behavior.
pub fn build_http_client_from_env() -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if let Ok(secs) = std::env::var("CHAT2ANAKIN_HTTP_TIMEOUT_SECONDS") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            builder = builder.timeout(std::time::Duration::from_secs(n));
        }
    }

    let no_proxy = std::env::var("CHAT2ANAKIN_NO_PROXY")
        .map(|v| v.trim().to_ascii_lowercase())
        .map(|v| v == "1" || v == "true" || v == "yes" || v == "on")
        .unwrap_or(false);

    if no_proxy {
        builder = builder.no_proxy();
    } else if let Ok(url) = std::env::var("CHAT2ANAKIN_PROXY_URL") {
        let u = url.trim();
        if !u.is_empty() {
            if let Ok(p) = reqwest::Proxy::all(u) {
                builder = builder.proxy(p);
            }
        }
    }

    // User-Agent for observability
    builder = builder.user_agent(format!("chat2anakin/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

/// Build a JSON error response with the given HTTP status and message.
pub fn error_response(status: StatusCode, msg: &str) -> Response {
    let body = serde_json::json!({ "error": msg });
    (status, axum::Json(body)).into_response()
}

/// Extract the bearer credential from an Authorization header, verbatim.
pub fn bearer_token(headers: &http::HeaderMap) -> String {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_strips_prefix() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            "Bearer sk-anakin-123".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), "sk-anakin-123");
    }

    #[test]
    fn bearer_token_empty_when_missing() {
        let headers = http::HeaderMap::new();
        assert_eq!(bearer_token(&headers), "");
    }
}
