//! Google Gemini text generation over the public REST API

use super::{LLMError, Result, TextGenerator};
use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiGenerator {
    /// Build a client, resolving the API key from the configured variables
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.api_key_vars, |var| std::env::var(var).ok())?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LLMError::config(format!("failed to build HTTP client: {e}")))?;

        info!(model = %config.model, "Gemini client configured");

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout: config.timeout(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// First non-empty variable among `vars`
pub fn resolve_api_key(
    vars: &[String],
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    vars.iter().find_map(|var| lookup(var).filter(|value| !value.trim().is_empty())).ok_or_else(|| {
        let vars = vars.join(", ");
        LLMError::auth(format!("none of {vars} is set; an API key is required for generation"))
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(LLMError::content_filtered(reason));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LLMError::parse("response contained no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, file_path: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![RequestPart { text: prompt }] }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        debug!(file = file_path, prompt_chars = prompt.len(), "sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { LLMError::timeout(self.timeout) } else { LLMError::from(e) }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(status.as_u16(), body));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body.into_text()?;
        debug!(file = file_path, chars = text.len(), "generation response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_key_resolution_order() {
        let vars = vec!["GOOGLE_API_KEY".to_string(), "GEMINI_API_KEY".to_string()];

        let key =
            resolve_api_key(&vars, |var| (var == "GEMINI_API_KEY").then(|| "g-key".to_string()));
        assert_eq!(key.unwrap(), "g-key");

        let key = resolve_api_key(&vars, |var| Some(format!("{var}-value")));
        assert_eq!(key.unwrap(), "GOOGLE_API_KEY-value");
    }

    #[test]
    fn test_missing_api_key_is_auth_error() {
        let vars = vec!["GOOGLE_API_KEY".to_string()];
        let err = resolve_api_key(&vars, |_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, LLMError::AuthenticationError { .. }));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "import os\n"}, {"text": "x = 1\n"}]}}]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "import os\nx = 1\n");
    }

    #[test]
    fn test_blocked_prompt() {
        let response: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(matches!(response.into_text(), Err(LLMError::ContentFiltered { .. })));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![RequestPart { text: "hi" }] }],
            generation_config: GenerationConfig { temperature: 0.5, max_output_tokens: 10 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 10);
    }

    #[test]
    fn test_endpoint() {
        let config =
            LlmConfig { base_url: "http://localhost:9999/".into(), ..LlmConfig::default() };
        let generator = GeminiGenerator::with_api_key(&config, "k".into()).unwrap();
        assert_eq!(
            generator.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
