//! LLM adapter for the response gateway.
//!
//! Supports OpenAI and Anthropic APIs. Prompts carrying an `[IMAGE]` payload
//! are sent as multimodal requests.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{ChatResult, GatewayError};
use crate::gateway::ResponseGateway;
use crate::prompt::split_image_payload;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;
const MAX_ATTEMPTS: u32 = 3;

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    config: LlmConfig,
    client: reqwest::Client,
    max_attempts: u32,
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Create an LLM adapter from environment variables
    pub fn from_env() -> ChatResult<Self> {
        Ok(Self::new(LlmConfig::from_env()?))
    }

    /// Create an LLM adapter from workspace settings, falling back to env
    pub fn from_workspace(workspace_root: &std::path::Path) -> ChatResult<Self> {
        Ok(Self::new(LlmConfig::from_workspace(workspace_root)?))
    }

    /// Set how many times a transient failure is attempted in total.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_with_retry<B: Serialize + Sync>(
        &self,
        body: &B,
        parse: fn(serde_json::Value) -> Result<String, GatewayError>,
    ) -> Result<String, GatewayError> {
        let value = retry_transient(
            self.config.provider.display_name(),
            self.max_attempts,
            || self.send_once(body),
        )
        .await?;
        parse(value)
    }

    async fn send_once<B: Serialize + Sync>(&self, body: &B) -> Result<serde_json::Value, GatewayError> {
        let request = match self.config.provider {
            LlmProvider::OpenAI => self
                .client
                .post(OPENAI_URL)
                .header("Authorization", format!("Bearer {}", self.config.api_key)),
            LlmProvider::Anthropic => self
                .client
                .post(ANTHROPIC_URL)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        };

        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                provider: self.config.provider.display_name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ResponseGateway for LlmAdapter {
    fn label(&self) -> String {
        format!("{}/{}", self.config.provider.display_name().to_lowercase(), self.config.model)
    }

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let (text, image) = split_image_payload(prompt);
        debug!(
            model = %self.config.model,
            prompt_chars = text.len(),
            has_image = image.is_some(),
            "Sending prompt"
        );

        match self.config.provider {
            LlmProvider::OpenAI => {
                let request = OpenAIRequest::new(&self.config.model, text, image);
                self.send_with_retry(&request, parse_openai).await
            }
            LlmProvider::Anthropic => {
                let request = AnthropicRequest::new(&self.config.model, text, image);
                self.send_with_retry(&request, parse_anthropic).await
            }
        }
    }
}

/// Run `attempt` up to `max_attempts` times, retrying transient errors
/// (5xx, rate limits, network issues) with exponential backoff: 2s, 4s.
async fn retry_transient<T, F, Fut>(
    provider: &str,
    max_attempts: u32,
    mut attempt: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut last_error = None;

    for n in 0..max_attempts.max(1) {
        if n > 0 {
            tokio::time::sleep(Duration::from_secs(1 << n)).await;
        }

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                warn!(
                    "{} request failed (attempt {}/{}): {}",
                    provider,
                    n + 1,
                    max_attempts,
                    e
                );
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| GatewayError::Unavailable("max retries exceeded".to_string())))
}

/// Pull a media type out of a data URL, or sniff it from the base64 prefix.
fn image_media_type(data: &str) -> (&'static str, &str) {
    if let Some(rest) = data.strip_prefix("data:") {
        if let Some((meta, payload)) = rest.split_once(',') {
            let media = match meta.split(';').next().unwrap_or_default() {
                "image/png" => "image/png",
                "image/gif" => "image/gif",
                "image/webp" => "image/webp",
                _ => "image/jpeg",
            };
            return (media, payload);
        }
    }

    let media = if data.starts_with("iVBORw0KGgo") {
        "image/png"
    } else if data.starts_with("R0lGOD") {
        "image/gif"
    } else if data.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/jpeg"
    };
    (media, data)
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_completion_tokens: u32,
}

impl OpenAIRequest {
    fn new(model: &str, text: &str, image: Option<&str>) -> Self {
        let content = match image {
            None => OpenAIContent::Text(text.to_string()),
            Some(data) => {
                let (media, payload) = image_media_type(data);
                OpenAIContent::Parts(vec![
                    OpenAIPart::Text {
                        text: text.to_string(),
                    },
                    OpenAIPart::ImageUrl {
                        image_url: OpenAIImageUrl {
                            url: format!("data:{};base64,{}", media, payload),
                        },
                    },
                ])
            }
        };

        Self {
            model: model.to_string(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content,
            }],
            max_completion_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: OpenAIContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAIImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

fn parse_openai(value: serde_json::Value) -> Result<String, GatewayError> {
    let response: OpenAIResponse = serde_json::from_value(value)
        .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| GatewayError::InvalidResponse("No response from OpenAI".to_string()))
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

impl AnthropicRequest {
    fn new(model: &str, text: &str, image: Option<&str>) -> Self {
        let mut content = Vec::new();
        if let Some(data) = image {
            let (media, payload) = image_media_type(data);
            content.push(AnthropicPart::Image {
                source: AnthropicImageSource {
                    kind: "base64".to_string(),
                    media_type: media.to_string(),
                    data: payload.to_string(),
                },
            });
        }
        content.push(AnthropicPart::Text {
            text: text.to_string(),
        });

        Self {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicPart {
    Text { text: String },
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Serialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    kind: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

fn parse_anthropic(value: serde_json::Value) -> Result<String, GatewayError> {
    let response: AnthropicResponse = serde_json::from_value(value)
        .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    let text: Vec<String> = response.content.into_iter().filter_map(|c| c.text).collect();
    let text = text.join("");
    if text.trim().is_empty() {
        return Err(GatewayError::InvalidResponse(
            "No response from Anthropic".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_models() {
        let openai = LlmAdapter::new(LlmConfig::new(LlmProvider::OpenAI, "key", None));
        assert_eq!(openai.model(), "gpt-4o");
        assert_eq!(openai.label(), "openai/gpt-4o");

        let anthropic = LlmAdapter::new(LlmConfig::new(LlmProvider::Anthropic, "key", None));
        assert_eq!(anthropic.model(), "claude-sonnet-4-5");
    }

    #[test]
    fn test_custom_model() {
        let adapter = LlmAdapter::new(LlmConfig::new(
            LlmProvider::OpenAI,
            "key",
            Some("gpt-4o-mini".to_string()),
        ));
        assert_eq!(adapter.model(), "gpt-4o-mini");
        assert_eq!(adapter.provider(), LlmProvider::OpenAI);
    }

    #[test]
    fn test_openai_text_request() {
        let request = OpenAIRequest::new("gpt-4o", "Hi Rex", None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["content"], "Hi Rex");
        assert_eq!(value["max_completion_tokens"], 1024);
    }

    #[test]
    fn test_openai_image_request() {
        let request = OpenAIRequest::new("gpt-4o", "Look", Some("iVBORw0KGgoAAA"));
        let value = serde_json::to_value(&request).unwrap();
        let parts = &value["messages"][0]["content"];
        assert_eq!(parts[0], json!({"type": "text", "text": "Look"}));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgoAAA"
        );
    }

    #[test]
    fn test_anthropic_image_request() {
        let request = AnthropicRequest::new(
            "claude-sonnet-4-5",
            "Look",
            Some("data:image/webp;base64,UklGRabc"),
        );
        let value = serde_json::to_value(&request).unwrap();
        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/webp");
        assert_eq!(content[0]["source"]["data"], "UklGRabc");
        assert_eq!(content[1], json!({"type": "text", "text": "Look"}));
    }

    #[test]
    fn test_parse_responses() {
        let openai = json!({"choices": [{"message": {"content": "Woof!"}}]});
        assert_eq!(parse_openai(openai).unwrap(), "Woof!");
        assert!(parse_openai(json!({"choices": []})).is_err());

        let anthropic = json!({"content": [{"type": "text", "text": "Arf"}, {"type": "text", "text": "!"}]});
        assert_eq!(parse_anthropic(anthropic).unwrap(), "Arf!");
        assert!(parse_anthropic(json!({"content": []})).is_err());
    }

    #[test]
    fn test_media_type_sniffing() {
        assert_eq!(image_media_type("/9j/4AAQ").0, "image/jpeg");
        assert_eq!(image_media_type("R0lGODlh").0, "image/gif");
        assert_eq!(image_media_type("data:image/png;base64,xyz"), ("image/png", "xyz"));
    }

    fn http(status: u16) -> GatewayError {
        GatewayError::Http {
            provider: "OpenAI".to_string(),
            status,
            body: String::new(),
        }
    }

    async fn run_script(
        script: Vec<Result<&'static str, GatewayError>>,
    ) -> (Result<&'static str, GatewayError>, usize, Duration) {
        let mut script = std::collections::VecDeque::from(script);
        let mut calls = 0;
        let started = tokio::time::Instant::now();
        let result = retry_transient("OpenAI", MAX_ATTEMPTS, || {
            calls += 1;
            let next = script.pop_front().unwrap_or(Ok("unexpected"));
            async move { next }
        })
        .await;
        (result, calls, started.elapsed())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_server_errors() {
        let (result, calls, waited) = run_script(vec![Err(http(503)), Err(http(503)), Ok("Woof")]).await;
        assert_eq!(result.unwrap(), "Woof");
        assert_eq!(calls, 3);
        assert!(waited >= Duration::from_secs(6) && waited < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_on_client_error() {
        let (result, calls, waited) = run_script(vec![Err(http(401)), Ok("never")]).await;
        assert_eq!(result.unwrap_err(), http(401));
        assert_eq!(calls, 1);
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_last_network_error() {
        let (result, calls, _) = run_script(vec![
            Err(GatewayError::Network("reset 1".into())),
            Err(GatewayError::Network("reset 2".into())),
            Err(GatewayError::Network("reset 3".into())),
        ])
        .await;
        assert_eq!(result.unwrap_err(), GatewayError::Network("reset 3".into()));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried() {
        let (result, calls, waited) = run_script(vec![Err(http(429)), Ok("Arf")]).await;
        assert_eq!(result.unwrap(), "Arf");
        assert_eq!(calls, 2);
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
    }
}
