//! WordPress connection test.
//!
//! One authenticated `GET /wp-json/wp/v2/users/me` against the configured site
//! using the username and application password. Every failure is folded into
//! a [`ConnectionStatus`]; nothing is returned as an error.

use std::time::Duration;

use amzwp_shared::{AppConfig, NetworkSettings};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// REST route that requires authentication and echoes the current user.
const USERS_ME_PATH: &str = "wp-json/wp/v2/users/me";

/// Default bound on the whole request.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// User-Agent string for connection tests.
const USER_AGENT: &str = concat!("AmzWP/", env!("CARGO_PKG_VERSION"));

/// Outcome of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConnectionStatus {
    pub fn ok(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Options for [`test_connection`].
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Upper bound for the request, including connect.
    pub timeout_secs: u64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&NetworkSettings> for ConnectionOptions {
    fn from(settings: &NetworkSettings) -> Self {
        Self {
            timeout_secs: settings.connect_timeout_secs,
        }
    }
}

/// Check that the WordPress credentials in `config` are accepted.
///
/// `config` must hold plain-text credentials (the panel's draft, or a
/// committed config passed through `decrypt_secrets`).
#[instrument(skip_all, fields(wp_url = %config.wp_url))]
pub async fn test_connection(config: &AppConfig, opts: &ConnectionOptions) -> ConnectionStatus {
    if config.wp_url.trim().is_empty() {
        return ConnectionStatus::failed("WordPress URL is required");
    }
    if config.wp_user.trim().is_empty() || config.wp_app_password.is_empty() {
        return ConnectionStatus::failed("WordPress username and application password are required");
    }

    let endpoint = match users_me_url(&config.wp_url) {
        Ok(url) => url,
        Err(message) => return ConnectionStatus::failed(message),
    };

    let client = match Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(opts.timeout_secs))
        .connect_timeout(Duration::from_secs(opts.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => return ConnectionStatus::failed(format!("Connection failed: {e}")),
    };

    debug!(%endpoint, "testing WordPress connection");

    let response = match client
        .get(endpoint.as_str())
        .basic_auth(config.wp_user.trim(), Some(&config.wp_app_password))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "WordPress connection failed");
            let reason = if e.is_timeout() {
                format!("timed out after {}s", opts.timeout_secs)
            } else {
                e.to_string()
            };
            return ConnectionStatus::failed(format!("Connection failed: {reason}"));
        }
    };

    let status = response.status();
    match status {
        s if s.is_success() => {
            let name = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("name").and_then(|n| n.as_str()).map(String::from))
                .filter(|n| !n.is_empty());
            info!(user = name.as_deref().unwrap_or("?"), "WordPress connection ok");
            ConnectionStatus::ok(name.map(|n| format!("Connected as {n}")))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ConnectionStatus::failed(format!(
            "Authentication failed (HTTP {}). Check the username and application password.",
            status.as_u16()
        )),
        StatusCode::NOT_FOUND => ConnectionStatus::failed(
            "WordPress REST API not found (HTTP 404). Check the site URL and permalink settings.",
        ),
        _ => ConnectionStatus::failed(format!("Unexpected response: HTTP {}", status.as_u16())),
    }
}

/// Build `<site>/wp-json/wp/v2/users/me`, adding `https://` when missing.
fn users_me_url(site: &str) -> std::result::Result<Url, String> {
    let trimmed = site.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut base = Url::parse(&with_scheme)
        .map_err(|e| format!("Invalid WordPress URL '{trimmed}': {e}"))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(format!(
            "Invalid WordPress URL '{trimmed}': unsupported scheme '{}'",
            base.scheme()
        ));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(USERS_ME_PATH)
        .map_err(|e| format!("Invalid WordPress URL '{trimmed}': {e}"))
}
