//! Configuration panel state.
//!
//! The panel edits a private draft of the configuration. Nothing reaches the
//! store until [`ConfigPanel::save`]; closing discards the draft. The draft
//! holds secrets in plain text, they are obfuscated again on save.

use std::time::Duration;

use amzwp_shared::{AiProvider, AmzWpError, AppConfig, ConfigPatch, Result};
use amzwp_storage::KvStore;
use tracing::{debug, info};

use crate::connection::ConnectionStatus;
use crate::secure::{decrypt_secrets, encrypt_secrets};
use crate::store::{AppStore, StateChange};

/// How long a success toast stays visible.
pub const SUCCESS_TOAST: Duration = Duration::from_secs(2);

/// How long an error toast stays visible.
pub const ERROR_TOAST: Duration = Duration::from_secs(4);

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelTab {
    #[default]
    WordPress,
    Amazon,
    Ai,
    Sota,
}

impl PanelTab {
    pub const ALL: [PanelTab; 4] = [
        PanelTab::WordPress,
        PanelTab::Amazon,
        PanelTab::Ai,
        PanelTab::Sota,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::WordPress => "WordPress",
            Self::Amazon => "Amazon",
            Self::Ai => "AI Provider",
            Self::Sota => "Publishing",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// Test status and notifications
// ---------------------------------------------------------------------------

/// State of the WordPress connection test.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Idle,
    Testing,
    Success(Option<String>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub duration: Duration,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            duration: SUCCESS_TOAST,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            duration: ERROR_TOAST,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigPanel
// ---------------------------------------------------------------------------

/// Draft-based editor over the committed configuration.
#[derive(Debug, Default)]
pub struct ConfigPanel {
    draft: Option<AppConfig>,
    tab: PanelTab,
    test: TestStatus,
}

impl ConfigPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Open with a fresh draft seeded from `committed` (secrets decrypted).
    /// Reopening an open panel discards the previous draft.
    pub fn open(&mut self, committed: &AppConfig) {
        self.draft = Some(decrypt_secrets(committed));
        if self.test != TestStatus::Testing {
            self.test = TestStatus::Idle;
        }
        debug!("config panel opened");
    }

    /// Discard the draft.
    pub fn close(&mut self) {
        if self.draft.take().is_some() {
            debug!("config panel closed without saving");
        }
    }

    pub fn tab(&self) -> PanelTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: PanelTab) {
        self.tab = tab;
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
    }

    pub fn prev_tab(&mut self) {
        self.tab = self.tab.prev();
    }

    pub fn draft(&self) -> Option<&AppConfig> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut AppConfig> {
        self.draft.as_mut()
    }

    /// Set a draft field from its camelCase key and textual value.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| AmzWpError::validation("config panel is not open"))?;
        let patch = ConfigPatch::from_field(key, value)?;
        let provider_changed = patch.ai_provider.is_some_and(|p| p != draft.ai_provider);
        patch.apply(draft);
        if provider_changed {
            draft.ai_model = draft.ai_provider.default_model().to_string();
        }
        Ok(())
    }

    /// Switch the draft's provider. Changing provider resets the model to the
    /// new provider's default.
    pub fn select_provider(&mut self, provider: AiProvider) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        if draft.ai_provider == provider {
            return;
        }
        draft.ai_provider = provider;
        draft.ai_model = provider.default_model().to_string();
    }

    /// Required fields of the active tab missing from the draft, by label.
    /// Only the visible form is checked, so AI settings can be saved before
    /// WordPress is configured.
    pub fn validate(&self) -> Vec<&'static str> {
        let Some(draft) = &self.draft else {
            return Vec::new();
        };
        let required: Vec<(&'static str, &String)> = match self.tab {
            PanelTab::WordPress => vec![
                ("WordPress site URL", &draft.wp_url),
                ("WordPress username", &draft.wp_user),
                ("Application password", &draft.wp_app_password),
            ],
            PanelTab::Amazon => vec![("Amazon associate tag", &draft.amazon_tag)],
            PanelTab::Ai | PanelTab::Sota => Vec::new(),
        };
        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| label)
            .collect()
    }

    /// Commit the draft to `store` and close.
    ///
    /// Fails without touching the store when the panel is closed or a
    /// required field of the active tab is missing.
    pub fn save<S: KvStore>(&mut self, store: &mut AppStore<S>) -> Result<Vec<StateChange>> {
        if self.draft.is_none() {
            return Err(AmzWpError::validation("config panel is not open"));
        }
        let missing = self.validate();
        if !missing.is_empty() {
            return Err(AmzWpError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let Some(draft) = self.draft.take() else {
            return Err(AmzWpError::validation("config panel is not open"));
        };
        let changes = store.update_config(ConfigPatch::from(encrypt_secrets(&draft)));
        info!(changed = !changes.is_empty(), "configuration saved");
        Ok(changes)
    }

    pub fn test_status(&self) -> &TestStatus {
        &self.test
    }

    pub fn is_testing(&self) -> bool {
        self.test == TestStatus::Testing
    }

    /// Start a connection test. Returns the live draft to test against, or
    /// `None` when the panel is closed or a test is already in flight.
    pub fn begin_test(&mut self) -> Option<AppConfig> {
        if self.is_testing() {
            return None;
        }
        let draft = self.draft.clone()?;
        self.test = TestStatus::Testing;
        Some(draft)
    }

    /// Record a finished test and return the toast to show.
    pub fn finish_test(&mut self, status: ConnectionStatus) -> Notification {
        if status.success {
            self.test = TestStatus::Success(status.message);
            Notification::success("Connected to WordPress!")
        } else {
            let message = status
                .message
                .unwrap_or_else(|| "Connection failed".to_string());
            self.test = TestStatus::Error(message.clone());
            Notification::error(message)
        }
    }
}
