//! Reversible obfuscation of credentials before they reach the state file.
//!
//! **This is not encryption.** The transform uses a fixed pad compiled into
//! the binary, so anyone with the binary (or this source) can reverse it. It
//! only keeps API keys from being readable at a glance when someone opens the
//! state file. Use an OS keychain if real protection is needed.
//!
//! Format: `enc:v1:` followed by the standard base64 encoding of the UTF-8
//! bytes XORed with the pad. The empty string maps to itself.

use amzwp_shared::AppConfig;
use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Marker identifying obfuscated values.
const PREFIX: &str = "enc:v1:";

/// Fixed XOR pad.
const PAD: &[u8] = b"amzwp::local-credential-obfuscation";

/// Config keys whose values are stored obfuscated.
pub const SECRET_FIELDS: &[&str] = &[
    "amazonAccessKey",
    "amazonSecretKey",
    "geminiApiKey",
    "openaiApiKey",
    "anthropicApiKey",
    "groqApiKey",
    "openrouterApiKey",
];

/// Namespace for the obfuscation transform.
pub struct SecureStorage;

impl SecureStorage {
    /// Obfuscate `plain`. Deterministic; `""` stays `""`.
    pub fn encrypt(plain: &str) -> String {
        if plain.is_empty() {
            return String::new();
        }
        format!("{PREFIX}{}", STANDARD.encode(xor_pad(plain.as_bytes())))
    }

    /// Reverse [`encrypt`](Self::encrypt). Never fails: values without the
    /// marker, or whose payload does not decode, come back unchanged.
    pub fn decrypt(value: &str) -> String {
        let Some(payload) = value.strip_prefix(PREFIX) else {
            return value.to_string();
        };

        let Ok(bytes) = STANDARD.decode(payload) else {
            tracing::debug!("obfuscated value has invalid base64 payload, keeping as-is");
            return value.to_string();
        };

        match String::from_utf8(xor_pad(&bytes)) {
            Ok(plain) => plain,
            Err(_) => {
                tracing::debug!("obfuscated value does not decode to UTF-8, keeping as-is");
                value.to_string()
            }
        }
    }

    /// Whether `value` carries the obfuscation marker.
    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(PREFIX)
    }
}

fn xor_pad(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(PAD.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

/// Whether `key` names a secret config field.
pub fn is_secret_field(key: &str) -> bool {
    SECRET_FIELDS.contains(&key)
}

/// Copy of `config` with every secret field obfuscated.
pub fn encrypt_secrets(config: &AppConfig) -> AppConfig {
    map_secrets(config, SecureStorage::encrypt)
}

/// Copy of `config` with every secret field in plain text.
pub fn decrypt_secrets(config: &AppConfig) -> AppConfig {
    map_secrets(config, SecureStorage::decrypt)
}

fn map_secrets(config: &AppConfig, f: fn(&str) -> String) -> AppConfig {
    let opt = |v: &Option<String>| v.as_deref().map(f);
    AppConfig {
        amazon_access_key: f(&config.amazon_access_key),
        amazon_secret_key: f(&config.amazon_secret_key),
        gemini_api_key: opt(&config.gemini_api_key),
        openai_api_key: opt(&config.openai_api_key),
        anthropic_api_key: opt(&config.anthropic_api_key),
        groq_api_key: opt(&config.groq_api_key),
        openrouter_api_key: opt(&config.openrouter_api_key),
        ..config.clone()
    }
}

/// Mask a plain-text secret for display, keeping the last four characters.
pub fn mask_secret(plain: &str) -> String {
    let count = plain.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 4 {
        return "•".repeat(count);
    }
    let tail: String = plain.chars().skip(count - 4).collect();
    format!("{}{tail}", "•".repeat(count - 4))
}
