//! The publishing configuration edited in the settings panel.
//!
//! [`AppConfig`] is a flat record persisted in camelCase. The AI provider is
//! an enum rather than a free string, and [`AppConfig::ai_settings`] resolves
//! the active provider into an [`AiSettings`] variant that only carries that
//! provider's key and model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AmzWpError, Result};

// ---------------------------------------------------------------------------
// AiProvider
// ---------------------------------------------------------------------------

/// The LLM provider used for generation. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Gemini,
    OpenAi,
    Anthropic,
    Groq,
    OpenRouter,
}

impl AiProvider {
    /// All providers, in panel order.
    pub const ALL: [AiProvider; 5] = [
        AiProvider::Gemini,
        AiProvider::OpenAi,
        AiProvider::Anthropic,
        AiProvider::Groq,
        AiProvider::OpenRouter,
    ];

    /// Stable identifier used in the persisted document and on the CLI.
    pub fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gemini => "Google Gemini",
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic Claude",
            Self::Groq => "Groq",
            Self::OpenRouter => "OpenRouter",
        }
    }

    /// Selectable `(model id, label)` pairs. Empty for custom-model providers.
    pub fn models(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Gemini => &[
                ("gemini-2.0-flash", "Gemini 2.0 Flash (Recommended)"),
                ("gemini-1.5-flash", "Gemini 1.5 Flash"),
                ("gemini-1.5-pro", "Gemini 1.5 Pro"),
            ],
            Self::OpenAi => &[
                ("gpt-4o", "GPT-4o (Recommended)"),
                ("gpt-4o-mini", "GPT-4o Mini"),
                ("gpt-4-turbo", "GPT-4 Turbo"),
                ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
            ],
            Self::Anthropic => &[
                ("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet (Recommended)"),
                ("claude-3-5-haiku-20241022", "Claude 3.5 Haiku"),
                ("claude-3-opus-20240229", "Claude 3 Opus"),
            ],
            Self::Groq | Self::OpenRouter => &[],
        }
    }

    /// Config key holding this provider's API key.
    pub fn key_field(self) -> &'static str {
        match self {
            Self::Gemini => "geminiApiKey",
            Self::OpenAi => "openaiApiKey",
            Self::Anthropic => "anthropicApiKey",
            Self::Groq => "groqApiKey",
            Self::OpenRouter => "openrouterApiKey",
        }
    }

    /// Whether the model is typed in freely instead of picked from a list.
    pub fn uses_custom_model(self) -> bool {
        matches!(self, Self::Groq | Self::OpenRouter)
    }

    /// The model selected when switching to this provider.
    pub fn default_model(self) -> &'static str {
        self.models().first().map(|(id, _)| *id).unwrap_or("")
    }

    /// Example model names for custom-model providers.
    pub fn custom_model_placeholder(self) -> &'static str {
        match self {
            Self::Groq => "e.g. llama-3.3-70b-versatile",
            Self::OpenRouter => "e.g. anthropic/claude-3.5-sonnet",
            _ => "",
        }
    }

    /// One-line guidance shown under the provider form.
    pub fn hint(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini 2.0 Flash provides the best balance of speed and accuracy.",
            Self::OpenAi => "GPT-4o is recommended for highest quality product extraction.",
            Self::Anthropic => "Claude 3.5 Sonnet offers excellent reasoning and accuracy.",
            Self::Groq => "Groq provides ultra-fast inference for supported models.",
            Self::OpenRouter => "OpenRouter gives you access to 100+ models from one API.",
        }
    }

    /// Next provider in panel order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous provider in panel order, wrapping around.
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AiProvider {
    type Err = AmzWpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AmzWpError::validation(format!(
                    "unknown AI provider '{s}': expected one of gemini, openai, anthropic, groq, openrouter"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// AiSettings
// ---------------------------------------------------------------------------

/// The active provider with only the fields that provider uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiSettings {
    Gemini { api_key: Option<String>, model: String },
    OpenAi { api_key: Option<String>, model: String },
    Anthropic { api_key: Option<String>, model: String },
    Groq { api_key: Option<String>, model: Option<String> },
    OpenRouter { api_key: Option<String>, model: Option<String> },
}

impl AiSettings {
    pub fn provider(&self) -> AiProvider {
        match self {
            Self::Gemini { .. } => AiProvider::Gemini,
            Self::OpenAi { .. } => AiProvider::OpenAi,
            Self::Anthropic { .. } => AiProvider::Anthropic,
            Self::Groq { .. } => AiProvider::Groq,
            Self::OpenRouter { .. } => AiProvider::OpenRouter,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            Self::Gemini { api_key, .. }
            | Self::OpenAi { api_key, .. }
            | Self::Anthropic { api_key, .. }
            | Self::Groq { api_key, .. }
            | Self::OpenRouter { api_key, .. } => api_key.as_deref(),
        }
    }

    /// The model to request, if one is configured.
    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Gemini { model, .. }
            | Self::OpenAi { model, .. }
            | Self::Anthropic { model, .. } => Some(model.as_str()).filter(|m| !m.is_empty()),
            Self::Groq { model, .. } | Self::OpenRouter { model, .. } => {
                model.as_deref().filter(|m| !m.is_empty())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// BoxStyle
// ---------------------------------------------------------------------------

/// Visual style of the injected product box. Opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoxStyle {
    #[default]
    Premium,
    Minimal,
    Classic,
}

impl BoxStyle {
    pub const ALL: [BoxStyle; 3] = [BoxStyle::Premium, BoxStyle::Minimal, BoxStyle::Classic];

    /// Next style, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|b| *b == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for BoxStyle {
    type Err = AmzWpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PREMIUM" => Ok(Self::Premium),
            "MINIMAL" => Ok(Self::Minimal),
            "CLASSIC" => Ok(Self::Classic),
            _ => Err(AmzWpError::validation(format!(
                "unknown box style '{s}': expected PREMIUM, MINIMAL or CLASSIC"
            ))),
        }
    }
}

impl fmt::Display for BoxStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Premium => write!(f, "PREMIUM"),
            Self::Minimal => write!(f, "MINIMAL"),
            Self::Classic => write!(f, "CLASSIC"),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Publishing configuration. Missing fields in a stored document take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub wp_url: String,
    pub wp_user: String,
    pub wp_app_password: String,

    pub amazon_tag: String,
    pub amazon_access_key: String,
    pub amazon_secret_key: String,
    pub amazon_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serp_api_key: Option<String>,

    /// Minimum confidence (0-100) for publishing without review.
    pub auto_publish_threshold: u8,
    pub concurrency_limit: u32,
    pub enable_schema: bool,
    pub enable_sticky_bar: bool,
    pub box_style: BoxStyle,

    pub ai_provider: AiProvider,
    pub ai_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wp_url: String::new(),
            wp_user: String::new(),
            wp_app_password: String::new(),
            amazon_tag: String::new(),
            amazon_access_key: String::new(),
            amazon_secret_key: String::new(),
            amazon_region: "us-east-1".into(),
            serp_api_key: None,
            auto_publish_threshold: 85,
            concurrency_limit: 5,
            enable_schema: true,
            enable_sticky_bar: true,
            box_style: BoxStyle::Premium,
            ai_provider: AiProvider::Gemini,
            ai_model: "gemini-2.0-flash".into(),
            custom_model: None,
            gemini_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openrouter_api_key: None,
        }
    }
}

impl AppConfig {
    /// Every key accepted by [`ConfigPatch::from_field`].
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "wpUrl",
        "wpUser",
        "wpAppPassword",
        "amazonTag",
        "amazonAccessKey",
        "amazonSecretKey",
        "amazonRegion",
        "serpApiKey",
        "autoPublishThreshold",
        "concurrencyLimit",
        "enableSchema",
        "enableStickyBar",
        "boxStyle",
        "aiProvider",
        "aiModel",
        "customModel",
        "geminiApiKey",
        "openaiApiKey",
        "anthropicApiKey",
        "groqApiKey",
        "openrouterApiKey",
    ];

    /// Resolve the active provider and its fields.
    pub fn ai_settings(&self) -> AiSettings {
        match self.ai_provider {
            AiProvider::Gemini => AiSettings::Gemini {
                api_key: self.gemini_api_key.clone(),
                model: self.ai_model.clone(),
            },
            AiProvider::OpenAi => AiSettings::OpenAi {
                api_key: self.openai_api_key.clone(),
                model: self.ai_model.clone(),
            },
            AiProvider::Anthropic => AiSettings::Anthropic {
                api_key: self.anthropic_api_key.clone(),
                model: self.ai_model.clone(),
            },
            AiProvider::Groq => AiSettings::Groq {
                api_key: self.groq_api_key.clone(),
                model: self.custom_model.clone(),
            },
            AiProvider::OpenRouter => AiSettings::OpenRouter {
                api_key: self.openrouter_api_key.clone(),
                model: self.custom_model.clone(),
            },
        }
    }

    /// The API key slot for `provider`.
    pub fn provider_key(&self, provider: AiProvider) -> Option<&str> {
        match provider {
            AiProvider::Gemini => self.gemini_api_key.as_deref(),
            AiProvider::OpenAi => self.openai_api_key.as_deref(),
            AiProvider::Anthropic => self.anthropic_api_key.as_deref(),
            AiProvider::Groq => self.groq_api_key.as_deref(),
            AiProvider::OpenRouter => self.openrouter_api_key.as_deref(),
        }
    }

    /// Textual value of a field by camelCase key, the inverse of
    /// [`ConfigPatch::from_field`]. Absent optional fields read as `""`.
    pub fn field_value(&self, key: &str) -> Option<String> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let value = match key {
            "wpUrl" => self.wp_url.clone(),
            "wpUser" => self.wp_user.clone(),
            "wpAppPassword" => self.wp_app_password.clone(),
            "amazonTag" => self.amazon_tag.clone(),
            "amazonAccessKey" => self.amazon_access_key.clone(),
            "amazonSecretKey" => self.amazon_secret_key.clone(),
            "amazonRegion" => self.amazon_region.clone(),
            "serpApiKey" => opt(&self.serp_api_key),
            "autoPublishThreshold" => self.auto_publish_threshold.to_string(),
            "concurrencyLimit" => self.concurrency_limit.to_string(),
            "enableSchema" => self.enable_schema.to_string(),
            "enableStickyBar" => self.enable_sticky_bar.to_string(),
            "boxStyle" => self.box_style.to_string(),
            "aiProvider" => self.ai_provider.id().to_string(),
            "aiModel" => self.ai_model.clone(),
            "customModel" => opt(&self.custom_model),
            "geminiApiKey" => opt(&self.gemini_api_key),
            "openaiApiKey" => opt(&self.openai_api_key),
            "anthropicApiKey" => opt(&self.anthropic_api_key),
            "groqApiKey" => opt(&self.groq_api_key),
            "openrouterApiKey" => opt(&self.openrouter_api_key),
            _ => return None,
        };
        Some(value)
    }

    /// Mutable API key slot for `provider`.
    pub fn provider_key_mut(&mut self, provider: AiProvider) -> &mut Option<String> {
        match provider {
            AiProvider::Gemini => &mut self.gemini_api_key,
            AiProvider::OpenAi => &mut self.openai_api_key,
            AiProvider::Anthropic => &mut self.anthropic_api_key,
            AiProvider::Groq => &mut self.groq_api_key,
            AiProvider::OpenRouter => &mut self.openrouter_api_key,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigPatch
// ---------------------------------------------------------------------------

/// A partial [`AppConfig`]. `None` leaves a field untouched; for optional
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub wp_url: Option<String>,
    pub wp_user: Option<String>,
    pub wp_app_password: Option<String>,
    pub amazon_tag: Option<String>,
    pub amazon_access_key: Option<String>,
    pub amazon_secret_key: Option<String>,
    pub amazon_region: Option<String>,
    pub serp_api_key: Option<Option<String>>,
    pub auto_publish_threshold: Option<u8>,
    pub concurrency_limit: Option<u32>,
    pub enable_schema: Option<bool>,
    pub enable_sticky_bar: Option<bool>,
    pub box_style: Option<BoxStyle>,
    pub ai_provider: Option<AiProvider>,
    pub ai_model: Option<String>,
    pub custom_model: Option<Option<String>>,
    pub gemini_api_key: Option<Option<String>>,
    pub openai_api_key: Option<Option<String>>,
    pub anthropic_api_key: Option<Option<String>>,
    pub groq_api_key: Option<Option<String>>,
    pub openrouter_api_key: Option<Option<String>>,
}

impl ConfigPatch {
    /// Shallow-merge the set fields into `config`.
    pub fn apply(self, config: &mut AppConfig) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut config.wp_url, self.wp_url);
        set(&mut config.wp_user, self.wp_user);
        set(&mut config.wp_app_password, self.wp_app_password);
        set(&mut config.amazon_tag, self.amazon_tag);
        set(&mut config.amazon_access_key, self.amazon_access_key);
        set(&mut config.amazon_secret_key, self.amazon_secret_key);
        set(&mut config.amazon_region, self.amazon_region);
        set(&mut config.serp_api_key, self.serp_api_key);
        set(&mut config.auto_publish_threshold, self.auto_publish_threshold);
        set(&mut config.concurrency_limit, self.concurrency_limit);
        set(&mut config.enable_schema, self.enable_schema);
        set(&mut config.enable_sticky_bar, self.enable_sticky_bar);
        set(&mut config.box_style, self.box_style);
        set(&mut config.ai_provider, self.ai_provider);
        set(&mut config.ai_model, self.ai_model);
        set(&mut config.custom_model, self.custom_model);
        set(&mut config.gemini_api_key, self.gemini_api_key);
        set(&mut config.openai_api_key, self.openai_api_key);
        set(&mut config.anthropic_api_key, self.anthropic_api_key);
        set(&mut config.groq_api_key, self.groq_api_key);
        set(&mut config.openrouter_api_key, self.openrouter_api_key);
    }

    /// Whether the patch sets nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a single-field patch from a camelCase key and its textual value.
    ///
    /// An empty value clears optional fields.
    pub fn from_field(key: &str, value: &str) -> Result<Self> {
        let text = || value.to_string();
        let optional = || Some(value.to_string()).filter(|v| !v.is_empty());

        let mut patch = Self::default();
        match key {
            "wpUrl" => patch.wp_url = Some(text()),
            "wpUser" => patch.wp_user = Some(text()),
            "wpAppPassword" => patch.wp_app_password = Some(text()),
            "amazonTag" => patch.amazon_tag = Some(text()),
            "amazonAccessKey" => patch.amazon_access_key = Some(text()),
            "amazonSecretKey" => patch.amazon_secret_key = Some(text()),
            "amazonRegion" => patch.amazon_region = Some(text()),
            "serpApiKey" => patch.serp_api_key = Some(optional()),
            "autoPublishThreshold" => {
                let n: u8 = parse_number(key, value)?;
                if n > 100 {
                    return Err(AmzWpError::validation(format!(
                        "{key} must be between 0 and 100, got {n}"
                    )));
                }
                patch.auto_publish_threshold = Some(n);
            }
            "concurrencyLimit" => {
                let n: u32 = parse_number(key, value)?;
                if n == 0 {
                    return Err(AmzWpError::validation(format!("{key} must be at least 1")));
                }
                patch.concurrency_limit = Some(n);
            }
            "enableSchema" => patch.enable_schema = Some(parse_bool(key, value)?),
            "enableStickyBar" => patch.enable_sticky_bar = Some(parse_bool(key, value)?),
            "boxStyle" => patch.box_style = Some(value.parse()?),
            "aiProvider" => patch.ai_provider = Some(value.parse()?),
            "aiModel" => patch.ai_model = Some(text()),
            "customModel" => patch.custom_model = Some(optional()),
            "geminiApiKey" => patch.gemini_api_key = Some(optional()),
            "openaiApiKey" => patch.openai_api_key = Some(optional()),
            "anthropicApiKey" => patch.anthropic_api_key = Some(optional()),
            "groqApiKey" => patch.groq_api_key = Some(optional()),
            "openrouterApiKey" => patch.openrouter_api_key = Some(optional()),
            _ => {
                return Err(AmzWpError::validation(format!(
                    "unknown config key '{key}'. Known keys: {}",
                    AppConfig::FIELD_NAMES.join(", ")
                )));
            }
        }
        Ok(patch)
    }
}

impl From<AppConfig> for ConfigPatch {
    fn from(c: AppConfig) -> Self {
        Self {
            wp_url: Some(c.wp_url),
            wp_user: Some(c.wp_user),
            wp_app_password: Some(c.wp_app_password),
            amazon_tag: Some(c.amazon_tag),
            amazon_access_key: Some(c.amazon_access_key),
            amazon_secret_key: Some(c.amazon_secret_key),
            amazon_region: Some(c.amazon_region),
            serp_api_key: Some(c.serp_api_key),
            auto_publish_threshold: Some(c.auto_publish_threshold),
            concurrency_limit: Some(c.concurrency_limit),
            enable_schema: Some(c.enable_schema),
            enable_sticky_bar: Some(c.enable_sticky_bar),
            box_style: Some(c.box_style),
            ai_provider: Some(c.ai_provider),
            ai_model: Some(c.ai_model),
            custom_model: Some(c.custom_model),
            gemini_api_key: Some(c.gemini_api_key),
            openai_api_key: Some(c.openai_api_key),
            anthropic_api_key: Some(c.anthropic_api_key),
            groq_api_key: Some(c.groq_api_key),
            openrouter_api_key: Some(c.openrouter_api_key),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AmzWpError::validation(format!("{key} expects a number, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(AmzWpError::validation(format!(
            "{key} expects true or false, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_stored_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.amazon_region, "us-east-1");
        assert_eq!(config.auto_publish_threshold, 85);
        assert_eq!(config.concurrency_limit, 5);
        assert!(config.enable_schema);
        assert!(config.enable_sticky_bar);
        assert_eq!(config.box_style, BoxStyle::Premium);
        assert_eq!(config.ai_provider, AiProvider::Gemini);
        assert_eq!(config.ai_model, "gemini-2.0-flash");
    }

    #[test]
    fn field_value_reads_back_every_key() {
        let mut config = AppConfig::default();
        config.groq_api_key = Some("gsk".into());
        for key in AppConfig::FIELD_NAMES {
            let value = config.field_value(key).expect("known key");
            let mut copy = config.clone();
            ConfigPatch::from_field(key, &value).unwrap().apply(&mut copy);
            assert_eq!(copy, config, "{key}");
        }
        assert_eq!(config.field_value(AiProvider::Groq.key_field()).as_deref(), Some("gsk"));
        assert_eq!(config.field_value("boxStyle").as_deref(), Some("PREMIUM"));
        assert!(config.field_value("bogus").is_none());
    }

    #[test]
    fn box_style_cycles() {
        assert_eq!(BoxStyle::Classic.next(), BoxStyle::Premium);
    }

    #[test]
    fn config_serializes_camel_case() {
        let mut config = AppConfig::default();
        config.openrouter_api_key = Some("or-key".into());
        let json = serde_json::to_value(&config).expect("serialize");

        assert_eq!(json["wpAppPassword"], "");
        assert_eq!(json["aiProvider"], "gemini");
        assert_eq!(json["boxStyle"], "PREMIUM");
        assert_eq!(json["openrouterApiKey"], "or-key");
        // Unset optional keys are omitted entirely.
        assert!(json.get("geminiApiKey").is_none());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let json = r#"{"wpUrl": "https://blog.example.com", "aiProvider": "groq"}"#;
        let config: AppConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(config.wp_url, "https://blog.example.com");
        assert_eq!(config.ai_provider, AiProvider::Groq);
        assert_eq!(config.concurrency_limit, 5);
    }

    #[test]
    fn ai_settings_carry_only_active_provider_fields() {
        let mut config = AppConfig::default();
        config.gemini_api_key = Some("g-key".into());
        config.openai_api_key = Some("o-key".into());

        match config.ai_settings() {
            AiSettings::Gemini { api_key, model } => {
                assert_eq!(api_key.as_deref(), Some("g-key"));
                assert_eq!(model, "gemini-2.0-flash");
            }
            other => panic!("expected Gemini, got {other:?}"),
        }

        config.ai_provider = AiProvider::OpenRouter;
        config.custom_model = Some("anthropic/claude-3.5-sonnet".into());
        let settings = config.ai_settings();
        assert_eq!(settings.provider(), AiProvider::OpenRouter);
        assert_eq!(settings.api_key(), None);
        assert_eq!(settings.model(), Some("anthropic/claude-3.5-sonnet"));
    }

    #[test]
    fn provider_cycle_wraps() {
        assert_eq!(AiProvider::OpenRouter.next(), AiProvider::Gemini);
        assert_eq!(AiProvider::Gemini.prev(), AiProvider::OpenRouter);
        assert_eq!(AiProvider::Groq.default_model(), "");
        assert_eq!(AiProvider::OpenAi.default_model(), "gpt-4o");
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
        assert!("mistral".parse::<AiProvider>().is_err());
    }

    #[test]
    fn patch_replaces_only_set_fields() {
        let mut config = AppConfig::default();
        config.wp_user = "editor".into();
        let before = config.clone();

        let patch = ConfigPatch {
            wp_url: Some("https://blog.example.com".into()),
            ..Default::default()
        };
        patch.apply(&mut config);

        assert_eq!(config.wp_url, "https://blog.example.com");
        let mut expected = before;
        expected.wp_url = "https://blog.example.com".into();
        assert_eq!(config, expected);
    }

    #[test]
    fn patch_from_field_parses_typed_values() {
        let patch = ConfigPatch::from_field("concurrencyLimit", "8").expect("patch");
        assert_eq!(patch.concurrency_limit, Some(8));

        let patch = ConfigPatch::from_field("enableSchema", "off").expect("patch");
        assert_eq!(patch.enable_schema, Some(false));

        let patch = ConfigPatch::from_field("groqApiKey", "").expect("patch");
        assert_eq!(patch.groq_api_key, Some(None));
    }

    #[test]
    fn patch_from_field_rejects_bad_input() {
        assert!(ConfigPatch::from_field("wpHost", "x").is_err());
        assert!(ConfigPatch::from_field("autoPublishThreshold", "101").is_err());
        assert!(ConfigPatch::from_field("concurrencyLimit", "zero").is_err());
        assert!(ConfigPatch::from_field("boxStyle", "FANCY").is_err());
    }

    #[test]
    fn full_patch_reproduces_config() {
        let mut source = AppConfig::default();
        source.ai_provider = AiProvider::Anthropic;
        source.groq_api_key = Some("gq".into());

        let mut target = AppConfig::default();
        target.serp_api_key = Some("stale".into());
        ConfigPatch::from(source.clone()).apply(&mut target);
        assert_eq!(target, source);
    }
}
