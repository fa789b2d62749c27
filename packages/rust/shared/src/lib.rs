//! Shared types, error model, and settings for AmzWP.
//!
//! This crate is the foundation depended on by all other AmzWP crates.
//! It provides:
//! - [`AmzWpError`], the unified error type
//! - The publishing configuration ([`AppConfig`], [`AiProvider`], [`ConfigPatch`])
//! - Domain types ([`BlogPost`], [`SitemapState`], [`AppStep`], [`PersistedState`])
//! - Tool settings ([`Settings`], settings loading)

pub mod app_config;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use app_config::{AiProvider, AiSettings, AppConfig, BoxStyle, ConfigPatch};
pub use config::{
    NetworkSettings, Settings, StorageSettings, init_settings, load_settings, load_settings_from,
    settings_dir, settings_file_path,
};
pub use error::{AmzWpError, Result};
pub use types::{AppStep, BlogPost, PersistedState, STORE_KEY, SitemapState};
