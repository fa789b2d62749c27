//! Sitemap scanning and post preview loading.
//!
//! Before a post can be edited, AmzWP scans the site's sitemap to list its
//! posts ([`scan_sitemap`]), then loads a Markdown preview of the selected
//! post on demand ([`load_preview`]). Both talk to the public site only; no
//! credentials are sent.

mod preview;
mod sitemap;

use std::time::Duration;

use amzwp_shared::{AmzWpError, NetworkSettings, Result};
use reqwest::{Client, Response};
use url::Url;

pub use preview::{PostPreview, load_preview};
pub use sitemap::{SitemapDocument, parse_sitemap, scan_sitemap, title_from_url};

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for each fetch.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default cap on child sitemaps followed from an index.
const DEFAULT_MAX_CHILD_SITEMAPS: usize = 10;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// User-Agent string for scan requests.
const USER_AGENT: &str = concat!("AmzWP/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Scan options
// ---------------------------------------------------------------------------

/// Configuration for scanning and preview loading.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Timeout for each HTTP request in seconds.
    pub timeout_secs: u64,
    /// Maximum number of child sitemaps followed from a sitemap index.
    pub max_child_sitemaps: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_child_sitemaps: DEFAULT_MAX_CHILD_SITEMAPS,
        }
    }
}

impl From<&NetworkSettings> for ScanOptions {
    fn from(settings: &NetworkSettings) -> Self {
        Self {
            timeout_secs: settings.scan_timeout_secs,
            max_child_sitemaps: settings.max_child_sitemaps,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a user-entered site URL, adding `https://` when no scheme is given.
pub fn normalize_site_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmzWpError::validation("site URL is empty"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| AmzWpError::validation(format!("invalid URL '{trimmed}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AmzWpError::validation(format!(
            "unsupported URL scheme '{other}' in '{trimmed}'"
        ))),
    }
}

/// Extract the origin (scheme + host + port) from a URL.
fn origin_url(url: &Url) -> Result<String> {
    let scheme = url.scheme();
    let host = url
        .host_str()
        .ok_or_else(|| AmzWpError::validation(format!("URL has no host: {url}")))?;

    match url.port() {
        Some(port) => Ok(format!("{scheme}://{host}:{port}")),
        None => Ok(format!("{scheme}://{host}")),
    }
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &ScanOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| AmzWpError::Network(format!("failed to build HTTP client: {e}")))
}

/// Fetch a URL as text, rejecting non-success statuses and oversized bodies.
async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AmzWpError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AmzWpError::Network(format!("{url}: HTTP {status}")));
    }

    read_capped(response, url, MAX_RESPONSE_SIZE).await
}

/// Read a response body, failing once it exceeds `max` bytes. Bodies without
/// a declared length are counted as they stream in.
async fn read_capped(mut response: Response, url: &str, max: u64) -> Result<String> {
    if let Some(len) = response.content_length() {
        if len > max {
            return Err(AmzWpError::validation(format!(
                "{url}: response too large ({len} bytes, max {max})"
            )));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AmzWpError::Network(format!("{url}: failed to read body: {e}")))?
    {
        if (body.len() + chunk.len()) as u64 > max {
            return Err(AmzWpError::validation(format!(
                "{url}: response too large (over {max} bytes)"
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
