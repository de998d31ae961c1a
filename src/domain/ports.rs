use crate::domain::model::{Assessment, ConsultationRecord, ConsultationRequest, ScreenedRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    fn location(&self, path: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// A chat-style LLM endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider_label(&self) -> &str;
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn screen(&self, request: ConsultationRequest) -> Result<ScreenedRequest>;
    async fn assess(&self, screened: ScreenedRequest) -> Result<Assessment>;
    async fn record(&self, assessment: Assessment) -> Result<ConsultationRecord>;
}
