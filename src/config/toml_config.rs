use crate::llm::Provider;
use crate::utils::error::{ConsultError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_origin, validate_path, validate_positive_number,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "consult.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub persona: PersonaConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origin allowed to call the API. Cross-origin access is off when unset.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./consult-data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoint {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Providers are tried in this order; unconfigured ones are skipped.
    pub provider_order: Vec<Provider>,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
    /// Answer from built-in guidance when every provider fails.
    pub offline_fallback: bool,
    pub anthropic: ProviderEndpoint,
    pub openai: ProviderEndpoint,
    pub meta: ProviderEndpoint,
    pub xai: ProviderEndpoint,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_order: Provider::ALL.to_vec(),
            timeout_seconds: 60,
            max_tokens: 1024,
            offline_fallback: true,
            anthropic: ProviderEndpoint::default(),
            openai: ProviderEndpoint::default(),
            meta: ProviderEndpoint::default(),
            xai: ProviderEndpoint::default(),
        }
    }
}

impl LlmConfig {
    fn endpoint(&self, provider: Provider) -> &ProviderEndpoint {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::OpenAi => &self.openai,
            Provider::Meta => &self.meta,
            Provider::Xai => &self.xai,
        }
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        self.endpoint(provider)
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| provider.default_base_url())
    }

    pub fn model(&self, provider: Provider) -> &str {
        self.endpoint(provider)
            .model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| provider.default_model())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub credentials: Option<String>,
    pub practice_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub file: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "audit.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

fn env_pattern() -> &'static Regex {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"))
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| ConsultError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left
    /// as written.
    fn substitute_env_vars(content: &str) -> String {
        env_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// An explicit path must exist. Otherwise `consult.toml` in the working
    /// directory is used if present, else the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConsultError::MissingConfigError {
                        field: path.display().to_string(),
                    });
                }
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::debug!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number("server.port", u64::from(self.server.port), 1)?;
        if let Some(origin) = &self.server.cors_origin {
            validate_origin("server.cors_origin", origin)?;
        }
        validate_path("storage.data_dir", &self.storage.data_dir)?;
        validate_path("audit.file", &self.audit.file)?;
        validate_positive_number("llm.timeout_seconds", self.llm.timeout_seconds, 1)?;
        validate_positive_number("llm.max_tokens", u64::from(self.llm.max_tokens), 1)?;

        for provider in Provider::ALL {
            validate_url(
                &format!("llm.{}.base_url", provider),
                self.llm.base_url(provider),
            )?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
