//! Core domain types: posts, sitemap state, navigation and the persisted
//! document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_config::AppConfig;

/// Key under which the persisted document is stored.
pub const STORE_KEY: &str = "amzwp-store-v1";

// ---------------------------------------------------------------------------
// BlogPost
// ---------------------------------------------------------------------------

/// A post discovered on the site. Only `id` is relied upon by the core; other
/// fields are carried through for the scanner and editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// `<lastmod>` value as published in the sitemap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    /// Fields added by other tools, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BlogPost {
    pub fn new(id: u64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            lastmod: None,
            extra: serde_json::Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SitemapState
// ---------------------------------------------------------------------------

/// The scanned site URL and the posts found there, in sitemap order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapState {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub posts: Vec<BlogPost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_at: Option<DateTime<Utc>>,
}

impl SitemapState {
    pub fn post(&self, id: u64) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// The post `offset` positions away from `id`, if any.
    pub fn neighbour(&self, id: u64, offset: isize) -> Option<&BlogPost> {
        let idx = self.posts.iter().position(|p| p.id == id)?;
        let target = idx.checked_add_signed(offset)?;
        self.posts.get(target)
    }
}

// ---------------------------------------------------------------------------
// AppStep
// ---------------------------------------------------------------------------

/// Coarse navigation state: browsing the sitemap or editing a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppStep {
    #[default]
    Sitemap,
    Editor,
}

// ---------------------------------------------------------------------------
// PersistedState
// ---------------------------------------------------------------------------

/// The durable subset of application state. Step and selection are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub has_entered: bool,
    #[serde(default)]
    pub config: AppConfig,
    #[serde(default)]
    pub sitemap: SitemapState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sitemap() -> SitemapState {
        SitemapState {
            url: "https://blog.example.com".into(),
            posts: vec![
                BlogPost::new(1, "First", "https://blog.example.com/first/"),
                BlogPost::new(2, "Second", "https://blog.example.com/second/"),
                BlogPost::new(3, "Third", "https://blog.example.com/third/"),
            ],
            scanned_at: None,
        }
    }

    #[test]
    fn neighbour_lookup_respects_bounds() {
        let state = sitemap();
        assert_eq!(state.neighbour(2, 1).map(|p| p.id), Some(3));
        assert_eq!(state.neighbour(2, -1).map(|p| p.id), Some(1));
        assert!(state.neighbour(1, -1).is_none());
        assert!(state.neighbour(3, 1).is_none());
        assert!(state.neighbour(42, 1).is_none());
    }

    #[test]
    fn blog_post_keeps_unknown_fields() {
        let json = r#"{"id": 7, "title": "Best Blenders", "url": "https://x.test/b/", "status": "draft"}"#;
        let post: BlogPost = serde_json::from_str(json).expect("parse");
        assert_eq!(post.id, 7);
        assert_eq!(post.extra["status"], "draft");

        let back = serde_json::to_value(&post).expect("serialize");
        assert_eq!(back["status"], "draft");
    }

    #[test]
    fn persisted_state_uses_documented_keys() {
        let state = PersistedState {
            has_entered: true,
            config: AppConfig::default(),
            sitemap: sitemap(),
        };
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["hasEntered"], true);
        assert!(json["config"].is_object());
        assert_eq!(json["sitemap"]["posts"].as_array().map(Vec::len), Some(3));
        assert!(json.get("currentStep").is_none());
        assert!(json.get("selectedPost").is_none());
    }

    #[test]
    fn app_step_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&AppStep::Editor).expect("serialize"),
            "\"EDITOR\""
        );
    }
}
