//! Application state store.
//!
//! [`AppStore`] owns the entry flag, the committed configuration, the sitemap
//! cache, the navigation step and the selected post. It is a plain value passed
//! by reference; durable storage is injected as a [`KvStore`].
//!
//! Only `{hasEntered, config, sitemap}` is persisted, under [`STORE_KEY`], after
//! every mutation that changes one of them. Step and selection always start
//! from their defaults.

use amzwp_shared::{
    AppConfig, AppStep, BlogPost, ConfigPatch, PersistedState, Result, STORE_KEY, SitemapState,
};
use amzwp_storage::KvStore;
use tracing::{debug, info, warn};

/// Change events returned by the store's setters.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The entry flag went from false to true.
    Entered,

    /// The committed configuration changed.
    ConfigChanged,

    /// The sitemap cache was replaced with different content.
    SitemapChanged { post_count: usize },

    /// The navigation step changed.
    StepChanged(AppStep),

    /// The selected post changed (`None` when cleared).
    SelectionChanged(Option<u64>),

    /// Writing the persisted document failed; in-memory state is still updated.
    PersistFailed(String),

    /// State was reset to defaults and the persisted document removed.
    Reset,
}

/// Process-wide application state with persistence.
pub struct AppStore<S: KvStore> {
    storage: S,
    has_entered: bool,
    config: AppConfig,
    sitemap: SitemapState,
    current_step: AppStep,
    selected_post: Option<BlogPost>,
}

impl<S: KvStore> AppStore<S> {
    /// Create a store and rehydrate it from `storage`.
    ///
    /// A missing, unreadable or malformed document yields the defaults; this
    /// never fails.
    pub fn load(storage: S) -> Self {
        let persisted = match storage.get(STORE_KEY) {
            Ok(Some(text)) => match decode_persisted(&text) {
                Some(state) => {
                    debug!(
                        has_entered = state.has_entered,
                        posts = state.sitemap.posts.len(),
                        "rehydrated application state"
                    );
                    state
                }
                None => {
                    warn!(key = STORE_KEY, "stored state is malformed, using defaults");
                    PersistedState::default()
                }
            },
            Ok(None) => {
                debug!(key = STORE_KEY, "no stored state, using defaults");
                PersistedState::default()
            }
            Err(e) => {
                warn!(key = STORE_KEY, error = %e, "could not read stored state, using defaults");
                PersistedState::default()
            }
        };

        Self {
            storage,
            has_entered: persisted.has_entered,
            config: persisted.config,
            sitemap: persisted.sitemap,
            current_step: AppStep::default(),
            selected_post: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn has_entered(&self) -> bool {
        self.has_entered
    }

    /// The committed configuration (secret fields obfuscated).
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sitemap(&self) -> &SitemapState {
        &self.sitemap
    }

    pub fn current_step(&self) -> AppStep {
        self.current_step
    }

    pub fn selected_post(&self) -> Option<&BlogPost> {
        self.selected_post.as_ref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The durable subset of the current state.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            has_entered: self.has_entered,
            config: self.config.clone(),
            sitemap: self.sitemap.clone(),
        }
    }

    // -- Mutations ----------------------------------------------------------

    /// Mark the landing page as passed. Idempotent.
    pub fn enter(&mut self) -> Vec<StateChange> {
        if self.has_entered {
            return Vec::new();
        }
        self.has_entered = true;
        info!("entered workspace");
        self.persist_with(vec![StateChange::Entered])
    }

    /// Shallow-merge `patch` into the configuration.
    pub fn update_config(&mut self, patch: ConfigPatch) -> Vec<StateChange> {
        let mut next = self.config.clone();
        patch.apply(&mut next);
        if next == self.config {
            return Vec::new();
        }
        self.config = next;
        debug!("configuration updated");
        self.persist_with(vec![StateChange::ConfigChanged])
    }

    /// Replace the sitemap cache.
    pub fn set_sitemap(&mut self, sitemap: SitemapState) -> Vec<StateChange> {
        if sitemap == self.sitemap {
            return Vec::new();
        }
        let post_count = sitemap.posts.len();
        self.sitemap = sitemap;
        self.persist_with(vec![StateChange::SitemapChanged { post_count }])
    }

    /// Replace the navigation step. Any step is reachable from any step.
    pub fn set_step(&mut self, step: AppStep) -> Vec<StateChange> {
        if step == self.current_step {
            return Vec::new();
        }
        self.current_step = step;
        vec![StateChange::StepChanged(step)]
    }

    /// Replace or clear the selected post.
    pub fn set_selected_post(&mut self, post: Option<BlogPost>) -> Vec<StateChange> {
        if post == self.selected_post {
            return Vec::new();
        }
        let id = post.as_ref().map(|p| p.id);
        self.selected_post = post;
        vec![StateChange::SelectionChanged(id)]
    }

    /// Restore defaults and delete the persisted document.
    pub fn reset(&mut self) -> Result<Vec<StateChange>> {
        self.storage.remove(STORE_KEY)?;
        self.has_entered = false;
        self.config = AppConfig::default();
        self.sitemap = SitemapState::default();
        self.current_step = AppStep::default();
        self.selected_post = None;
        info!("application state reset");
        Ok(vec![StateChange::Reset])
    }

    /// Write the persisted document now.
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.persisted())
            .map_err(|e| amzwp_shared::AmzWpError::Storage(format!("serialize state: {e}")))?;
        self.storage.set(STORE_KEY, &json)
    }

    fn persist_with(&self, mut changes: Vec<StateChange>) -> Vec<StateChange> {
        if let Err(e) = self.persist() {
            warn!(error = %e, "failed to persist application state");
            changes.push(StateChange::PersistFailed(e.to_string()));
        }
        changes
    }
}

/// Decode a stored document. Also accepts the `{"state": {...}, "version": n}`
/// envelope written by browser builds.
fn decode_persisted(text: &str) -> Option<PersistedState> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    let inner = match object.get("state") {
        Some(state @ serde_json::Value::Object(_))
            if !object.contains_key("config") && !object.contains_key("hasEntered") =>
        {
            state.clone()
        }
        _ => value,
    };

    serde_json::from_value(inner).ok()
}
