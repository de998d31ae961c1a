use crate::llm::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API keys for the supported providers. Keys come from `.env` and the
/// process environment and are only ever held in memory.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LlmSettings {
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub meta_api_key: String,
    pub xai_api_key: String,
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("anthropic_api_key", &mask_key(&self.anthropic_api_key))
            .field("openai_api_key", &mask_key(&self.openai_api_key))
            .field("meta_api_key", &mask_key(&self.meta_api_key))
            .field("xai_api_key", &mask_key(&self.xai_api_key))
            .finish()
    }
}

/// Partial update; `Some("")` clears a key, `None` leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmSettingsUpdate {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub meta_api_key: Option<String>,
    pub xai_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub label: &'static str,
    pub configured: bool,
    pub key_hint: Option<String>,
}

/// Shows only the last four characters of a secret.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

impl LlmSettings {
    /// Loads `.env` from the working directory if present, then reads the
    /// process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        for provider in Provider::ALL {
            if let Some(value) = lookup(provider.env_var()) {
                settings.set_key(provider, value);
            }
        }
        settings
    }

    fn slot(&self, provider: Provider) -> &String {
        match provider {
            Provider::Anthropic => &self.anthropic_api_key,
            Provider::OpenAi => &self.openai_api_key,
            Provider::Meta => &self.meta_api_key,
            Provider::Xai => &self.xai_api_key,
        }
    }

    pub fn key(&self, provider: Provider) -> Option<&str> {
        let key = self.slot(provider).trim();
        (!key.is_empty()).then_some(key)
    }

    pub fn set_key(&mut self, provider: Provider, key: impl Into<String>) {
        let key = key.into().trim().to_string();
        match provider {
            Provider::Anthropic => self.anthropic_api_key = key,
            Provider::OpenAi => self.openai_api_key = key,
            Provider::Meta => self.meta_api_key = key,
            Provider::Xai => self.xai_api_key = key,
        }
    }

    /// Applies an update and returns the providers whose key changed.
    pub fn apply(&mut self, update: LlmSettingsUpdate) -> Vec<Provider> {
        let pairs = [
            (Provider::Anthropic, update.anthropic_api_key),
            (Provider::OpenAi, update.openai_api_key),
            (Provider::Meta, update.meta_api_key),
            (Provider::Xai, update.xai_api_key),
        ];
        let mut changed = Vec::new();
        for (provider, value) in pairs {
            if let Some(value) = value {
                if self.slot(provider).trim() != value.trim() {
                    self.set_key(provider, value);
                    changed.push(provider);
                }
            }
        }
        changed
    }

    pub fn configured(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.key(*p).is_some())
            .collect()
    }

    pub fn any_configured(&self) -> bool {
        !self.configured().is_empty()
    }

    pub fn active_services(&self) -> Vec<&'static str> {
        self.configured().into_iter().map(Provider::label).collect()
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        Provider::ALL
            .into_iter()
            .map(|provider| ProviderStatus {
                provider,
                label: provider.label(),
                configured: self.key(provider).is_some(),
                key_hint: self.key(provider).map(mask_key),
            })
            .collect()
    }
}
