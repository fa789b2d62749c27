//! Post preview loading for the editor view.
//!
//! Fetches a post's public page, picks the article body and converts it to
//! Markdown with `htmd` so it can be shown in a terminal.

use amzwp_shared::{AmzWpError, BlogPost, Result};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::{ScanOptions, build_client, fetch_text};

/// Selectors tried, in order, to find the article body.
const BODY_SELECTORS: &[&str] = &["article", "main", ".entry-content", "body"];

/// A rendered preview of one post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPreview {
    pub post_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub markdown: String,
    pub word_count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Fetch `post.url` and build its preview.
#[instrument(skip_all, fields(post_id = post.id, url = %post.url))]
pub async fn load_preview(post: &BlogPost, opts: &ScanOptions) -> Result<PostPreview> {
    if post.url.is_empty() {
        return Err(AmzWpError::validation(format!("post {} has no URL", post.id)));
    }

    let client = build_client(opts)?;
    let html = fetch_text(&client, &post.url).await?;
    let preview = render_preview(post, &html)?;

    debug!(
        title = %preview.title,
        word_count = preview.word_count,
        "post preview loaded"
    );
    Ok(preview)
}

/// Build a preview from already-fetched HTML.
pub(crate) fn render_preview(post: &BlogPost, html: &str) -> Result<PostPreview> {
    let doc = Html::parse_document(html);

    let title = first_attr(&doc, r#"meta[property="og:title"]"#, "content")
        .or_else(|| first_text(&doc, "h1"))
        .or_else(|| first_text(&doc, "title"))
        .unwrap_or_else(|| post.title.clone());

    let description = first_attr(&doc, r#"meta[name="description"]"#, "content")
        .or_else(|| first_attr(&doc, r#"meta[property="og:description"]"#, "content"));

    let body_html = BODY_SELECTORS
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|sel| doc.select(&sel).next().map(|el| el.inner_html()))
        .unwrap_or_default();

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec![
            "script", "style", "nav", "iframe", "noscript", "svg", "header", "footer", "aside",
        ])
        .build();

    let markdown = converter
        .convert(&body_html)
        .map_err(|e| AmzWpError::Conversion(format!("htmd conversion failed: {e}")))?;
    let markdown = collapse_blank_lines(markdown.trim());
    let word_count = markdown.split_whitespace().count();

    Ok(PostPreview {
        post_id: post.id,
        title,
        description,
        markdown,
        word_count,
        fetched_at: Utc::now(),
    })
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head>
  <title>Best Blenders | Kitchen Blog</title>
  <meta name="description" content="Our favourite blenders this year.">
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <article>
    <h1>Best Blenders of 2024</h1>
    <p>We tested <strong>twelve</strong> blenders.</p>


    <p>Here are the winners.</p>
    <script>track()</script>
  </article>
  <footer>Copyright</footer>
</body>
</html>"#;

    #[test]
    fn render_extracts_article() {
        let post = BlogPost::new(3, "Best Blenders", "https://blog.example.com/best-blenders/");
        let preview = render_preview(&post, PAGE).unwrap();

        assert_eq!(preview.post_id, 3);
        assert_eq!(preview.title, "Best Blenders of 2024");
        assert_eq!(
            preview.description.as_deref(),
            Some("Our favourite blenders this year.")
        );
        assert!(preview.markdown.contains("**twelve**"));
        assert!(!preview.markdown.contains("track()"));
        assert!(!preview.markdown.contains("Copyright"));
        assert!(!preview.markdown.contains("\n\n\n"));
        assert!(preview.word_count > 5);
    }

    #[test]
    fn render_falls_back_to_post_title() {
        let post = BlogPost::new(1, "Fallback Title", "https://x.test/a/");
        let preview = render_preview(&post, "<html><body><p>Text only</p></body></html>").unwrap();
        assert_eq!(preview.title, "Fallback Title");
        assert!(preview.markdown.contains("Text only"));
    }

    #[test]
    fn main_wins_over_entry_content() {
        let html = r#"<html><body>
  <div class="entry-content"><p>Sidebar excerpt</p></div>
  <main><p>Main body text</p></main>
</body></html>"#;
        let post = BlogPost::new(2, "Layout", "https://x.test/b/");
        let preview = render_preview(&post, html).unwrap();
        assert!(preview.markdown.contains("Main body text"));
        assert!(!preview.markdown.contains("Sidebar excerpt"));
    }

    #[tokio::test]
    async fn test_load_preview_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/best-blenders/"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let post = BlogPost::new(1, "Best Blenders", format!("{}/best-blenders/", server.uri()));
        let preview = load_preview(&post, &ScanOptions::default()).await.unwrap();
        assert_eq!(preview.title, "Best Blenders of 2024");
    }

    #[tokio::test]
    async fn test_load_preview_http_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let post = BlogPost::new(1, "Gone", format!("{}/gone/", server.uri()));
        let result = load_preview(&post, &ScanOptions::default()).await;
        assert!(matches!(result, Err(AmzWpError::Network(_))));
    }

    #[tokio::test]
    async fn test_load_preview_requires_url() {
        let post = BlogPost::new(1, "No URL", "");
        let result = load_preview(&post, &ScanOptions::default()).await;
        assert!(matches!(result, Err(AmzWpError::Validation { .. })));
    }
}
