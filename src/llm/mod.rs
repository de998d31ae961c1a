//! LLM provider integration: API key settings, HTTP clients per provider,
//! an ordered fallback router and the prompt/reply conventions.

pub mod client;
pub mod prompt;
pub mod router;
pub mod settings;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::HttpCompletionClient;
pub use router::{Completion, LlmRouter};
pub use settings::{LlmSettings, LlmSettingsUpdate, ProviderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Meta,
    Xai,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Anthropic,
        Provider::OpenAi,
        Provider::Meta,
        Provider::Xai,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Meta => "META_API_KEY",
            Provider::Xai => "XAI_API_KEY",
        }
    }

    /// Label shown to users when listing active services.
    pub fn label(self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic (Claude)",
            Provider::OpenAi => "OpenAI (GPT)",
            Provider::Meta => "Meta (Llama)",
            Provider::Xai => "XAI",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAi => "https://api.openai.com",
            // Llama API's OpenAI-compatible surface
            Provider::Meta => "https://api.llama.com/compat",
            Provider::Xai => "https://api.x.ai",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-3-5-sonnet-latest",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Meta => "Llama-4-Maverick-17B-128E-Instruct-FP8",
            Provider::Xai => "grok-2-latest",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::Meta => "meta",
            Provider::Xai => "xai",
        };
        f.write_str(name)
    }
}
