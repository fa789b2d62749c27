//! Tool settings for AmzWP.
//!
//! These are the settings of the tool itself (where state lives, network
//! timeouts), not the publishing configuration the user edits in the panel.
//! They live at `~/.amzwp/amzwp.toml`; every field has a default, so a missing
//! or partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AmzWpError, Result};

/// Default settings file name.
const SETTINGS_FILE_NAME: &str = "amzwp.toml";

/// Default settings directory name under the user's home.
const SETTINGS_DIR_NAME: &str = ".amzwp";

/// Default data directory name under the settings directory.
const DATA_DIR_NAME: &str = "data";

// ---------------------------------------------------------------------------
// Settings structs (matching amzwp.toml schema)
// ---------------------------------------------------------------------------

/// Top-level tool settings, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Durable state location.
    #[serde(default)]
    pub storage: StorageSettings,

    /// Network timeouts and limits.
    #[serde(default)]
    pub network: NetworkSettings,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the persisted application state.
    /// Empty means `~/.amzwp/data`.
    #[serde(default)]
    pub data_dir: String,
}

/// `[network]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Upper bound for the WordPress connection test.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound for each sitemap or post fetch.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,

    /// Maximum number of child sitemaps followed from a sitemap index.
    #[serde(default = "default_max_child_sitemaps")]
    pub max_child_sitemaps: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            scan_timeout_secs: default_scan_timeout(),
            max_child_sitemaps: default_max_child_sitemaps(),
        }
    }
}

impl NetworkSettings {
    /// Reject limits that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(AmzWpError::config("network.connect_timeout_secs must be at least 1"));
        }
        if self.scan_timeout_secs == 0 {
            return Err(AmzWpError::config("network.scan_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_scan_timeout() -> u64 {
    20
}
fn default_max_child_sitemaps() -> usize {
    10
}

impl Settings {
    /// Resolve the data directory, falling back to `~/.amzwp/data`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if self.storage.data_dir.is_empty() {
            return Ok(settings_dir()?.join(DATA_DIR_NAME));
        }
        Ok(expand_home(&self.storage.data_dir))
    }
}

/// Expand a leading `~/` against the home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Settings loading
// ---------------------------------------------------------------------------

/// Get the path to the settings directory (`~/.amzwp/`).
pub fn settings_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AmzWpError::config("could not determine home directory"))?;
    Ok(home.join(SETTINGS_DIR_NAME))
}

/// Get the path to the settings file (`~/.amzwp/amzwp.toml`).
pub fn settings_file_path() -> Result<PathBuf> {
    Ok(settings_dir()?.join(SETTINGS_FILE_NAME))
}

/// Load the tool settings from disk. Returns defaults if the file does not exist.
pub fn load_settings() -> Result<Settings> {
    let path = settings_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "settings file not found, using defaults");
        return Ok(Settings::default());
    }

    load_settings_from(&path)
}

/// Load the tool settings from a specific file path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| AmzWpError::io(path, e))?;

    let settings: Settings = toml::from_str(&content)
        .map_err(|e| AmzWpError::config(format!("failed to parse {}: {e}", path.display())))?;
    settings.network.validate()?;
    Ok(settings)
}

/// Create the settings directory and write a default settings file.
/// Returns the path to the created file.
pub fn init_settings() -> Result<PathBuf> {
    let dir = settings_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AmzWpError::io(&dir, e))?;

    let path = dir.join(SETTINGS_FILE_NAME);
    let settings = Settings::default();
    let content =
        toml::to_string_pretty(&settings).map_err(|e| AmzWpError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AmzWpError::io(&path, e))?;
    tracing::info!(?path, "created default settings file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).expect("serialize default settings");
        assert!(toml_str.contains("connect_timeout_secs"));
        assert!(toml_str.contains("data_dir"));
    }

    #[test]
    fn settings_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).expect("serialize");
        let parsed: Settings = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.network.connect_timeout_secs, 10);
        assert_eq!(parsed.network.scan_timeout_secs, 20);
        assert_eq!(parsed.network.max_child_sitemaps, 10);
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let toml_str = r#"
[network]
connect_timeout_secs = 3
"#;
        let parsed: Settings = toml::from_str(toml_str).expect("parse");
        assert_eq!(parsed.network.connect_timeout_secs, 3);
        assert_eq!(parsed.network.scan_timeout_secs, 20);
        assert!(parsed.storage.data_dir.is_empty());
    }

    #[test]
    fn explicit_data_dir_is_used() {
        let mut settings = Settings::default();
        settings.storage.data_dir = "/var/lib/amzwp".into();
        let dir = settings.data_dir().expect("data dir");
        assert_eq!(dir, PathBuf::from("/var/lib/amzwp"));
    }

    #[test]
    fn malformed_settings_file_is_config_error() {
        let dir = std::env::temp_dir().join(format!("amzwp-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("amzwp.toml");
        std::fs::write(&path, "[network\nbroken").expect("write");

        let err = load_settings_from(&path).unwrap_err();
        assert!(matches!(err, AmzWpError::Config { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let dir = std::env::temp_dir().join(format!("amzwp-settings-zero-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("amzwp.toml");

        std::fs::write(&path, "[network]\nconnect_timeout_secs = 0\n").expect("write");
        let err = load_settings_from(&path).unwrap_err();
        assert!(matches!(err, AmzWpError::Config { .. }));
        assert!(err.to_string().contains("connect_timeout_secs"));

        std::fs::write(&path, "[network]\nscan_timeout_secs = 0\n").expect("write");
        let err = load_settings_from(&path).unwrap_err();
        assert!(err.to_string().contains("scan_timeout_secs"));

        std::fs::write(&path, "[network]\nscan_timeout_secs = 1\n").expect("write");
        assert_eq!(load_settings_from(&path).expect("load").network.scan_timeout_secs, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
