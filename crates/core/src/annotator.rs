//! AI annotation of shared files.
//!
//! [`AnnotationClient::analyze`] never fails: a missing credential or any
//! failure on the way to a well-formed reply is turned into a fixed fallback
//! [`AnnotationResult`].

use crate::config::AiConfig;
use crate::models::AnnotationResult;
use anyhow::bail;
use providers::gemini::{GeminiConfig, GeminiProvider};
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::{LlmProvider, ProviderRegistry, ResponseSchema, StructuredRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const MISSING_KEY_DESCRIPTION: &str = "API Key missing. Cannot generate analysis.";
pub const MISSING_KEY_TAG: &str = "Error";
pub const FAILED_DESCRIPTION: &str = "AI Analysis failed.";
pub const FAILED_TAG: &str = "Unknown";

impl AnnotationResult {
    pub fn missing_key() -> Self {
        Self {
            description: MISSING_KEY_DESCRIPTION.to_string(),
            tags: vec![MISSING_KEY_TAG.to_string()],
        }
    }

    pub fn failed() -> Self {
        Self {
            description: FAILED_DESCRIPTION.to_string(),
            tags: vec![FAILED_TAG.to_string()],
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::missing_key() || *self == Self::failed()
    }
}

pub fn annotation_schema() -> ResponseSchema {
    ResponseSchema::object(vec![
        ("description", ResponseSchema::String),
        ("tags", ResponseSchema::array_of(ResponseSchema::String)),
    ])
}

pub fn build_prompt(name: &str, mime: &str, size_label: &str) -> String {
    format!(
        "I have a file in a local network share.\n\
         Filename: \"{name}\"\n\
         Type: \"{mime}\"\n\
         Size: \"{size_label}\"\n\n\
         Please generate a short, helpful description (max 15 words) describing what this file likely contains based on its name and extension.\n\
         Also provide 3 short, relevant tags (max 1 word each) for categorization.\n\
         Return the result in JSON format.\n\
         Language: Simplified Chinese (zh-CN)."
    )
}

/// Parses a model reply, tolerating a surrounding Markdown code fence.
pub fn parse_reply(text: &str) -> Result<AnnotationResult, serde_json::Error> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim())
}

#[derive(Clone)]
pub struct AnnotationClient {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl AnnotationClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Client with no credential; every call returns the missing-key result.
    pub fn unconfigured() -> Self {
        Self { provider: None }
    }

    /// Builds the configured backend around an explicitly supplied credential.
    pub fn from_config(ai: &AiConfig, credential: Option<String>) -> anyhow::Result<Self> {
        let Some(api_key) = credential.filter(|k| !k.trim().is_empty()) else {
            return Ok(Self::unconfigured());
        };
        let registry = build_registry(ai, api_key)?;
        Ok(Self::new(registry.llm(None)?))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn analyze(&self, name: &str, mime: &str, size_label: &str) -> AnnotationResult {
        let Some(provider) = &self.provider else {
            return AnnotationResult::missing_key();
        };

        let request = StructuredRequest {
            prompt: build_prompt(name, mime, size_label),
            schema: annotation_schema(),
        };

        let text = match provider.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %name, error = %e, "annotation request failed");
                return AnnotationResult::failed();
            }
        };

        match parse_reply(&text) {
            Ok(result) => {
                debug!(file = %name, tags = ?result.tags, "annotation received");
                result
            }
            Err(e) => {
                warn!(file = %name, error = %e, "annotation reply was not valid JSON");
                AnnotationResult::failed()
            }
        }
    }
}

pub fn build_registry(ai: &AiConfig, api_key: String) -> anyhow::Result<ProviderRegistry> {
    let timeout = Duration::from_secs(ai.timeout_secs);
    let reg = match ai.provider.as_str() {
        "gemini" => {
            let provider = GeminiProvider::new(GeminiConfig {
                api_key,
                base_url: ai
                    .base_url
                    .clone()
                    .unwrap_or_else(|| providers::gemini::DEFAULT_BASE_URL.to_string()),
                model: ai.model.clone(),
                timeout,
            })?;
            ProviderRegistry::new().with_llm("gemini", Arc::new(provider))
        }
        "openai" => {
            let provider = OpenAiProvider::new(OpenAiConfig {
                api_key,
                base_url: ai
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com".to_string()),
                chat_model: ai.model.clone(),
                timeout,
            })?;
            ProviderRegistry::new().with_llm("openai", Arc::new(provider))
        }
        other => bail!("unsupported ai provider: {other}"),
    };
    Ok(reg.set_preferred_llm(&ai.provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LlmProvider for Scripted {
        async fn generate(&self, _request: &StructuredRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|_| ProviderError::RequestFailed("connection reset".into()))
        }
    }

    fn scripted(reply: Result<&'static str, ()>) -> Arc<Scripted> {
        Arc::new(Scripted {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn prompt_embeds_inputs_and_language() {
        let prompt = build_prompt("utils.js", "application/javascript", "1.17KB");
        assert!(prompt.contains("Filename: \"utils.js\""));
        assert!(prompt.contains("Type: \"application/javascript\""));
        assert!(prompt.contains("Size: \"1.17KB\""));
        assert!(prompt.contains("max 15 words"));
        assert!(prompt.contains("3 short"));
        assert!(prompt.contains("zh-CN"));
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let r = parse_reply("```json\n{\"description\":\"d\",\"tags\":[\"a\"]}\n```").unwrap();
        assert_eq!(r.description, "d");
        assert_eq!(r.tags, vec!["a"]);
    }

    #[test]
    fn reply_missing_tags_is_rejected() {
        assert!(parse_reply(r#"{"description":"d"}"#).is_err());
        assert!(parse_reply(r#"{"description":"d","tags":"a,b"}"#).is_err());
    }

    #[tokio::test]
    async fn valid_reply_is_returned_unmodified() {
        let p = scripted(Ok(r#"{"description":"一份说明","tags":["a","b","c","d"]}"#));
        let client = AnnotationClient::new(p.clone());
        let r = client.analyze("a.pdf", "application/pdf", "1.00KB").await;
        assert_eq!(r.description, "一份说明");
        assert_eq!(r.tags, vec!["a", "b", "c", "d"]);
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_error_becomes_failed_result() {
        let p = scripted(Err(()));
        let r = AnnotationClient::new(p.clone())
            .analyze("a.pdf", "application/pdf", "1.00KB")
            .await;
        assert_eq!(r, AnnotationResult::failed());
        assert!(r.is_fallback());
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unparsable_reply_becomes_failed_result() {
        let r = AnnotationClient::new(scripted(Ok("not json")))
            .analyze("a.pdf", "application/pdf", "1.00KB")
            .await;
        assert_eq!(r, AnnotationResult::failed());
    }

    #[tokio::test]
    async fn unconfigured_client_returns_missing_key() {
        let client = AnnotationClient::unconfigured();
        assert!(!client.is_configured());
        let r = client.analyze("a.pdf", "application/pdf", "1.00KB").await;
        assert_eq!(r, AnnotationResult::missing_key());
    }

    #[test]
    fn blank_credential_builds_unconfigured_client() {
        let ai = AiConfig::default();
        assert!(!AnnotationClient::from_config(&ai, None).unwrap().is_configured());
        assert!(!AnnotationClient::from_config(&ai, Some("  ".into()))
            .unwrap()
            .is_configured());
        assert!(AnnotationClient::from_config(&ai, Some("k".into()))
            .unwrap()
            .is_configured());
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let ai = AiConfig {
            provider: "bard".into(),
            ..AiConfig::default()
        };
        assert!(AnnotationClient::from_config(&ai, Some("k".into())).is_err());
    }
}
