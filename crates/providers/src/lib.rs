//! Provider abstractions for structured-output language models.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod gemini;
pub mod openai;
pub mod schema;

pub use schema::ResponseSchema;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::RequestFailed(e.to_string())
    }
}

/// A single prompt plus the JSON shape the reply must follow.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub prompt: String,
    pub schema: ResponseSchema,
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends one request and returns the model's raw reply text.
    async fn generate(&self, request: &StructuredRequest) -> Result<String, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    llms: HashMap<String, Arc<dyn LlmProvider>>,
    pub preferred_llm: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm(mut self, name: &str, provider: Arc<dyn LlmProvider>) -> Self {
        self.llms.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_llm(mut self, name: &str) -> Self {
        self.preferred_llm = Some(name.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.llms.is_empty()
    }

    pub fn llm(&self, name: Option<&str>) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_llm.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no llm provider configured".into()))?;
        self.llms
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}
