//! OpenAI-compatible chat-completions provider.
//!
//! Sends the system and user prompts as two messages and asks for strict
//! `json_schema` structured output using the request's schema document.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::trait_def::CompletionProvider;
use super::types::{CompletionRequest, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Longest error body excerpt kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`OpenAiProvider`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Completion provider for OpenAI and API-compatible endpoints.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider with its own HTTP client honouring `config.timeout`.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Create a provider on a shared HTTP client. The client's own timeout
    /// applies instead of `config.timeout`.
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        // A schema that does not parse is sent without structured output;
        // the validator still rejects whatever comes back.
        let response_format = serde_json::from_str::<Value>(&request.schema)
            .ok()
            .map(|schema| {
                json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": request.format_name,
                        "description": request.description,
                        "schema": schema,
                        "strict": true,
                    }
                })
            });

        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            response_format,
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api key not set".to_string()));
        }
        if self.config.model.trim().is_empty() {
            return Err(ProviderError::Config("model not set".to_string()));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(model = %self.config.model, format = %request.format_name))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = self.build_request(request);
        debug!(
            system_bytes = request.system_prompt.len(),
            user_bytes = request.user_prompt.len(),
            structured = body.response_format.is_some(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: excerpt(&text, MAX_ERROR_BODY),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        extract_content(parsed)
    }
}

/// Pull assistant text out of the first choice.
fn extract_content(response: ChatResponse) -> Result<String, ProviderError> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(ProviderError::NoContent);
    };

    let text = match choice.message.content {
        Some(Value::String(s)) => s,
        // Content-part arrays: concatenate the text parts.
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part.get("text") {
                Some(Value::String(s)) => Some(s.as_str()),
                Some(Value::Object(inner)) => inner.get("value").and_then(Value::as_str),
                _ => None,
            })
            .collect::<String>(),
        _ => String::new(),
    };

    let text = text.trim();
    if !text.is_empty() {
        return Ok(text.to_string());
    }
    match choice.message.refusal {
        Some(refusal) if !refusal.trim().is_empty() => Err(ProviderError::Refused(refusal)),
        _ => Err(ProviderError::NoContent),
    }
}

fn excerpt(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;

    fn response(value: Value) -> ChatResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn validate_config_requires_api_key() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("")).unwrap();
        assert!(matches!(
            provider.validate_config(),
            Err(ProviderError::Config(_))
        ));
        assert!(OpenAiProvider::new(OpenAiConfig::new("sk-test")).unwrap().validate_config().is_ok());
    }

    #[test]
    fn new_keeps_configured_timeout() {
        let mut config = OpenAiConfig::new("sk-test");
        config.timeout = Duration::from_secs(7);
        let provider = OpenAiProvider::new(config).unwrap();
        assert_eq!(provider.config.timeout, Duration::from_secs(7));
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }

    #[test]
    fn request_uses_strict_json_schema() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("sk-test")).unwrap();
        let req = CompletionRequest::for_kind(SchemaKind::Workout, "sys", "user".to_string());
        let body = serde_json::to_value(provider.build_request(&req)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "generator_output");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["title"],
            "Workout"
        );
    }

    #[test]
    fn unparseable_schema_omits_response_format() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("sk-test")).unwrap();
        let mut req = CompletionRequest::for_kind(SchemaKind::Workout, "sys", "u".to_string());
        req.schema = "not json".to_string();
        let body = serde_json::to_value(provider.build_request(&req)).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn extracts_string_content() {
        let r = response(json!({"choices": [{"message": {"content": "  {\"a\":1}\n"}}]}));
        assert_eq!(extract_content(r).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn extracts_content_parts() {
        let r = response(json!({"choices": [{"message": {"content": [
            {"type": "output_text", "text": "{\"a\":"},
            {"type": "text", "text": {"value": "1}"}}
        ]}}]}));
        assert_eq!(extract_content(r).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn empty_content_is_no_content() {
        let r = response(json!({"choices": [{"message": {"content": "   "}}]}));
        assert!(matches!(extract_content(r), Err(ProviderError::NoContent)));
        let r = response(json!({"choices": []}));
        assert!(matches!(extract_content(r), Err(ProviderError::NoContent)));
    }

    #[test]
    fn refusal_is_reported() {
        let r = response(json!({"choices": [{"message": {"content": null, "refusal": "nope"}}]}));
        assert!(matches!(extract_content(r), Err(ProviderError::Refused(ref s)) if s == "nope"));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("ééé", 3), "é...");
    }
}
