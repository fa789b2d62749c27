//! Sitemap discovery and parsing.
//!
//! Handles the two shapes of <https://www.sitemaps.org/protocol.html>:
//! - `<urlset>` with `<url><loc>..</loc><lastmod>..</lastmod></url>` entries
//! - `<sitemapindex>` with `<sitemap><loc>..</loc></sitemap>` children
//!
//! WordPress core publishes `/wp-sitemap.xml`; SEO plugins publish
//! `/sitemap.xml` or `/sitemap_index.xml`. All three are tried in order.

use std::collections::HashSet;
use std::sync::LazyLock;

use amzwp_shared::{AmzWpError, BlogPost, Result, SitemapState};
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{ScanOptions, build_client, fetch_text, normalize_site_url, origin_url};

/// Sitemap locations tried at the site origin, in order.
const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/wp-sitemap.xml", "/sitemap_index.xml"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A list of page URLs with optional `<lastmod>`.
    UrlSet(Vec<(String, Option<String>)>),
    /// A list of child sitemap URLs.
    Index(Vec<String>),
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

static SITEMAP_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:\w+:)?sitemapindex[\s>]").expect("sitemapindex regex"));

static URLSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:\w+:)?urlset[\s>]").expect("urlset regex"));

static URL_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?url>(.*?)</(?:\w+:)?url>").expect("url block regex")
});

static SITEMAP_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?sitemap>(.*?)</(?:\w+:)?sitemap>").expect("sitemap block regex")
});

static LOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?loc>\s*(.*?)\s*</(?:\w+:)?loc>").expect("loc regex")
});

static LASTMOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?lastmod>\s*(.*?)\s*</(?:\w+:)?lastmod>").expect("lastmod regex")
});

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Scan a site's sitemap and return its posts.
///
/// When `site_url` points at an `.xml` file it is fetched directly; otherwise
/// the well-known sitemap locations at its origin are tried. A sitemap index
/// is followed one level deep, preferring children whose URL mentions posts.
#[instrument(skip_all, fields(site = %site_url))]
pub async fn scan_sitemap(site_url: &str, opts: &ScanOptions) -> Result<SitemapState> {
    let url = normalize_site_url(site_url)?;
    let client = build_client(opts)?;

    let candidates: Vec<String> = if url.path().ends_with(".xml") {
        vec![url.to_string()]
    } else {
        let origin = origin_url(&url)?;
        SITEMAP_PATHS.iter().map(|p| format!("{origin}{p}")).collect()
    };

    let mut found = None;
    for candidate in &candidates {
        info!(url = %candidate, "checking for sitemap");
        match fetch_sitemap(&client, candidate).await {
            Ok(doc) => {
                found = Some(doc);
                break;
            }
            Err(e) => debug!(url = %candidate, error = %e, "no usable sitemap"),
        }
    }

    let document = found.ok_or_else(|| {
        AmzWpError::Network(format!("no sitemap found for {url} (tried {})", candidates.join(", ")))
    })?;

    let entries = match document {
        SitemapDocument::UrlSet(entries) => entries,
        SitemapDocument::Index(children) => {
            follow_index(&client, &children, opts.max_child_sitemaps).await
        }
    };

    let posts = build_posts(entries);
    info!(posts = posts.len(), "sitemap scanned");

    Ok(SitemapState {
        url: url.to_string(),
        posts,
        scanned_at: Some(Utc::now()),
    })
}

async fn fetch_sitemap(client: &Client, url: &str) -> Result<SitemapDocument> {
    let body = fetch_text(client, url).await?;
    parse_sitemap(&body)
}

/// Fetch child sitemaps of an index. Failing children are skipped.
async fn follow_index(
    client: &Client,
    children: &[String],
    max_children: usize,
) -> Vec<(String, Option<String>)> {
    let post_children: Vec<&String> = children
        .iter()
        .filter(|c| c.to_ascii_lowercase().contains("post"))
        .collect();
    let selected: Vec<&String> = if post_children.is_empty() {
        children.iter().collect()
    } else {
        post_children
    };

    if selected.len() > max_children {
        warn!(
            total = selected.len(),
            max_children, "sitemap index truncated to the first children"
        );
    }

    let mut entries = Vec::new();
    for child in selected.into_iter().take(max_children) {
        match fetch_sitemap(client, child).await {
            Ok(SitemapDocument::UrlSet(mut urls)) => {
                debug!(url = %child, count = urls.len(), "child sitemap parsed");
                entries.append(&mut urls);
            }
            Ok(SitemapDocument::Index(_)) => {
                debug!(url = %child, "nested sitemap index ignored");
            }
            Err(e) => warn!(url = %child, error = %e, "child sitemap skipped"),
        }
    }
    entries
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse sitemap XML into a [`SitemapDocument`].
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    if SITEMAP_INDEX_RE.is_match(xml) {
        let children = SITEMAP_BLOCK_RE
            .captures_iter(xml)
            .filter_map(|block| LOC_RE.captures(&block[1]).map(|c| unescape_xml(&c[1])))
            .filter(|loc| !loc.is_empty())
            .collect();
        return Ok(SitemapDocument::Index(children));
    }

    if URLSET_RE.is_match(xml) {
        let entries = URL_BLOCK_RE
            .captures_iter(xml)
            .filter_map(|block| {
                let inner = &block[1];
                let loc = LOC_RE.captures(inner).map(|c| unescape_xml(&c[1]))?;
                let lastmod = LASTMOD_RE.captures(inner).map(|c| unescape_xml(&c[1]));
                Some((loc, lastmod.filter(|m| !m.is_empty())))
            })
            .filter(|(loc, _)| !loc.is_empty())
            .collect();
        return Ok(SitemapDocument::UrlSet(entries));
    }

    Err(AmzWpError::parse(
        "document is neither a <urlset> nor a <sitemapindex>",
    ))
}

/// Turn sitemap entries into posts: drop home pages, dedupe, number from 1.
fn build_posts(entries: Vec<(String, Option<String>)>) -> Vec<BlogPost> {
    let mut seen = HashSet::new();
    let mut posts = Vec::new();

    for (loc, lastmod) in entries {
        let Ok(url) = Url::parse(&loc) else {
            debug!(%loc, "skipping unparsable sitemap URL");
            continue;
        };
        if url.path().trim_matches('/').is_empty() {
            continue;
        }
        if !seen.insert(url.to_string()) {
            continue;
        }

        let id = posts.len() as u64 + 1;
        let mut post = BlogPost::new(id, title_from_url(&url), url.to_string());
        post.lastmod = lastmod;
        posts.push(post);
    }

    posts
}

/// Derive a display title from the last path segment of a post URL.
pub fn title_from_url(url: &Url) -> String {
    let slug = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("");
    let slug = slug.trim_end_matches(".html").trim_end_matches(".htm");

    let title = slug
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        url.host_str().unwrap_or("Untitled").to_string()
    } else {
        title
    }
}

fn unescape_xml(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);
    inner
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://blog.example.com/</loc></url>
  <url>
    <loc>https://blog.example.com/best-air-fryers-2024/</loc>
    <lastmod>2024-03-01T10:00:00+00:00</lastmod>
  </url>
  <url><loc>https://blog.example.com/coffee_grinder-review/</loc></url>
  <url><loc>https://blog.example.com/best-air-fryers-2024/</loc></url>
  <url><loc>https://blog.example.com/search?q=a&amp;b=c</loc></url>
</urlset>"#;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://blog.example.com/post-sitemap.xml</loc></sitemap>
  <sitemap><loc>https://blog.example.com/page-sitemap.xml</loc></sitemap>
</sitemapindex>"#;

    #[test]
    fn parse_urlset_entries() {
        let doc = parse_sitemap(URLSET).unwrap();
        let SitemapDocument::UrlSet(entries) = doc else {
            panic!("expected urlset");
        };
        assert_eq!(entries.len(), 5);
        assert_eq!(
            entries[1],
            (
                "https://blog.example.com/best-air-fryers-2024/".to_string(),
                Some("2024-03-01T10:00:00+00:00".to_string())
            )
        );
        assert_eq!(entries[4].0, "https://blog.example.com/search?q=a&b=c");
    }

    #[test]
    fn parse_index_entries() {
        let doc = parse_sitemap(INDEX).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Index(vec![
                "https://blog.example.com/post-sitemap.xml".into(),
                "https://blog.example.com/page-sitemap.xml".into(),
            ])
        );
    }

    #[test]
    fn parse_cdata_loc() {
        let xml = "<urlset><url><loc><![CDATA[https://x.test/a-b/]]></loc></url></urlset>";
        let SitemapDocument::UrlSet(entries) = parse_sitemap(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(entries[0].0, "https://x.test/a-b/");
    }

    #[test]
    fn parse_rejects_html() {
        assert!(parse_sitemap("<html><body>Not found</body></html>").is_err());
    }

    #[test]
    fn build_posts_skips_home_and_duplicates() {
        let SitemapDocument::UrlSet(entries) = parse_sitemap(URLSET).unwrap() else {
            panic!("expected urlset");
        };
        let posts = build_posts(entries);

        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(posts[0].title, "Best Air Fryers 2024");
        assert_eq!(posts[0].lastmod.as_deref(), Some("2024-03-01T10:00:00+00:00"));
        assert_eq!(posts[1].title, "Coffee Grinder Review");
    }

    #[test]
    fn title_falls_back_to_host() {
        let url = Url::parse("https://blog.example.com/").unwrap();
        assert_eq!(title_from_url(&url), "blog.example.com");
        let url = Url::parse("https://blog.example.com/guides/kettle-guide.html").unwrap();
        assert_eq!(title_from_url(&url), "Kettle Guide");
    }

    #[tokio::test]
    async fn test_scan_with_mock_server() {
        let server = wiremock::MockServer::start().await;
        let urlset = format!(
            r#"<urlset>
  <url><loc>{0}/best-blenders/</loc></url>
  <url><loc>{0}/top-10-kettles/</loc></url>
</urlset>"#,
            server.uri()
        );

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/sitemap.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(urlset))
            .mount(&server)
            .await;

        let state = scan_sitemap(&server.uri(), &ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.posts[0].title, "Best Blenders");
        assert_eq!(state.posts[1].id, 2);
        assert!(state.scanned_at.is_some());
    }

    #[tokio::test]
    async fn test_scan_falls_back_and_follows_index() {
        let server = wiremock::MockServer::start().await;
        let index = format!(
            r#"<sitemapindex>
  <sitemap><loc>{0}/wp-sitemap-posts-post-1.xml</loc></sitemap>
  <sitemap><loc>{0}/wp-sitemap-users-1.xml</loc></sitemap>
</sitemapindex>"#,
            server.uri()
        );
        let posts = format!(
            "<urlset><url><loc>{0}/hello-world/</loc></url></urlset>",
            server.uri()
        );

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/sitemap.xml"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/wp-sitemap.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/wp-sitemap-posts-post-1.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(posts))
            .mount(&server)
            .await;

        let state = scan_sitemap(&server.uri(), &ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(state.posts.len(), 1);
        assert_eq!(state.posts[0].title, "Hello World");
    }

    #[tokio::test]
    async fn test_scan_not_found() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = scan_sitemap(&server.uri(), &ScanOptions::default()).await;
        assert!(matches!(result, Err(AmzWpError::Network(_))));
    }
}
