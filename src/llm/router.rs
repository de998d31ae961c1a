use crate::config::LlmConfig;
use crate::domain::ports::{CompletionClient, CompletionRequest};
use crate::llm::{HttpCompletionClient, LlmSettings};
use crate::utils::error::{ConsultError, Result};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub provider: String,
}

/// Tries each configured provider in turn until one answers.
pub struct LlmRouter {
    clients: Vec<Box<dyn CompletionClient>>,
}

impl LlmRouter {
    pub fn new(clients: Vec<Box<dyn CompletionClient>>) -> Self {
        Self { clients }
    }

    /// Builds one client per provider in `provider_order` that has a key.
    pub fn from_settings(settings: &LlmSettings, config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let mut seen = Vec::new();
        let mut clients: Vec<Box<dyn CompletionClient>> = Vec::new();

        for provider in config.provider_order.iter().copied() {
            if seen.contains(&provider) {
                continue;
            }
            seen.push(provider);

            let Some(key) = settings.key(provider) else {
                continue;
            };
            clients.push(Box::new(HttpCompletionClient::new(
                provider,
                key,
                config.base_url(provider),
                config.model(provider),
                timeout,
            )?));
        }

        Ok(Self::new(clients))
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn providers(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.provider_label()).collect()
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let mut last_error = None;

        for client in &self.clients {
            match client.complete(request).await {
                Ok(text) => {
                    tracing::info!("Completion served by {}", client.provider_label());
                    return Ok(Completion {
                        text,
                        provider: client.provider_label().to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ {} failed ({:?}): {}",
                        client.provider_label(),
                        e.category(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ConsultError::NoProviderError))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderEndpoint;
    use crate::llm::Provider;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockClient {
        label: &'static str,
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompletionClient for MockClient {
        fn provider_label(&self) -> &str {
            self.label
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(ConsultError::ProviderError {
                    provider: self.label.to_string(),
                    status: 503,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            prompt: "prompt".to_string(),
            max_tokens: 64,
        }
    }

    #[tokio::test]
    async fn test_empty_router_reports_no_provider() {
        let router = LlmRouter::new(vec![]);
        assert!(router.is_empty());
        assert!(matches!(
            router.complete(&request()).await,
            Err(ConsultError::NoProviderError)
        ));
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = LlmRouter::new(vec![
            Box::new(MockClient {
                label: "first",
                reply: None,
                calls: calls.clone(),
            }),
            Box::new(MockClient {
                label: "second",
                reply: Some("answer"),
                calls: calls.clone(),
            }),
            Box::new(MockClient {
                label: "third",
                reply: Some("unused"),
                calls: calls.clone(),
            }),
        ]);

        let completion = router.complete(&request()).await.unwrap();
        assert_eq!(completion.text, "answer");
        assert_eq!(completion.provider, "second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_all_fail() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = LlmRouter::new(vec![Box::new(MockClient {
            label: "only",
            reply: None,
            calls,
        })]);

        match router.complete(&request()).await {
            Err(ConsultError::ProviderError { provider, status, .. }) => {
                assert_eq!(provider, "only");
                assert_eq!(status, 503);
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_settings_follows_order_and_skips_missing_keys() {
        let mut settings = LlmSettings::default();
        settings.set_key(Provider::Xai, "xai-key");
        settings.set_key(Provider::Anthropic, "sk-ant-key");

        let config = LlmConfig {
            provider_order: vec![Provider::Xai, Provider::OpenAi, Provider::Xai, Provider::Anthropic],
            ..LlmConfig::default()
        };

        let router = LlmRouter::from_settings(&settings, &config).unwrap();
        assert_eq!(router.providers(), vec!["XAI", "Anthropic (Claude)"]);
    }

    #[tokio::test]
    async fn test_http_fallback_after_server_error() {
        let failing = MockServer::start();
        failing.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(500).body("overloaded");
        });
        let healthy = MockServer::start();
        let ok = healthy.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"content": "Recovered."}}]
            }));
        });

        let mut settings = LlmSettings::default();
        settings.set_key(Provider::Anthropic, "sk-ant-key");
        settings.set_key(Provider::OpenAi, "sk-openai-key");
        let config = LlmConfig {
            timeout_seconds: 5,
            anthropic: ProviderEndpoint {
                base_url: Some(failing.base_url()),
                model: None,
            },
            openai: ProviderEndpoint {
                base_url: Some(healthy.base_url()),
                model: Some("test-model".to_string()),
            },
            ..LlmConfig::default()
        };

        let router = LlmRouter::from_settings(&settings, &config).unwrap();
        let completion = router.complete(&request()).await.unwrap();
        ok.assert();
        assert_eq!(completion.text, "Recovered.");
        assert_eq!(completion.provider, "OpenAI (GPT)");
    }
}
