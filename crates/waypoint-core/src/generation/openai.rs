//! OpenAI-compatible Chat Completions backend.
//!
//! One [`OpenAiGenerator`] is built per [`GenerationProfile`]. Structured
//! requests ask for `response_format: json_object`; whatever comes back is
//! handed to the adapter as parsed JSON when it parses, else as text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{GenerationError, GenerationOutput, GenerationRequest, Generator};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Model settings for one class of generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProfile {
    pub name: &'static str,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl GenerationProfile {
    /// Deterministic, short calls: trait extraction, purpose replies and
    /// recommendations.
    pub fn extraction(model: impl Into<String>) -> Self {
        Self {
            name: "extraction",
            model: model.into(),
            temperature: 0.0,
            timeout: Duration::from_secs(30),
            max_tokens: 2048,
        }
    }

    /// Longer, more creative calls: itinerary generation.
    pub fn planner(model: impl Into<String>) -> Self {
        Self {
            name: "planner",
            model: model.into(),
            temperature: 0.7,
            timeout: Duration::from_secs(120),
            max_tokens: 8192,
        }
    }
}

pub struct OpenAiGenerator {
    http: Client,
    base_url: String,
    api_key: String,
    profile: GenerationProfile,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        profile: GenerationProfile,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder().timeout(profile.timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            profile,
        })
    }

    fn build_request_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.profile.model,
            "temperature": self.profile.temperature,
            "max_tokens": self.profile.max_tokens,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        if request.schema.is_some() {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

/// Split the message content into parsed JSON or plain text.
fn classify_content(content: String) -> GenerationOutput {
    match serde_json::from_str::<Value>(content.trim()) {
        Ok(value) if value.is_object() => GenerationOutput::Structured(value),
        _ => GenerationOutput::Text(content),
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn profile(&self) -> &str {
        self.profile.name
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        debug!(
            profile = self.profile.name,
            model = %self.profile.model,
            schema = request.schema.as_ref().map(|s| s.name),
            "sending chat completion"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("response has no message content".into()))?;

        Ok(classify_content(content))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
