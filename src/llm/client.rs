use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::error::GenerativeError;

// OpenAI-compatible chat-completions wire types

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Assistant text plus the token counts the endpoint reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, GenerativeError>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, GenerativeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerativeError::Transport(e.to_string()))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Chat client configured: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerativeError> {
        Self::new(
            &config.openai_base_url,
            config.openai_api_key.clone(),
            Duration::from_secs(config.llm_request_timeout_seconds.max(1)),
        )
    }

    async fn send_once(&self, api_key: &str, request: &ChatRequest) -> Result<ChatCompletion, GenerativeError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(GenerativeError::status(status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GenerativeError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let (prompt_tokens, completion_tokens) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        debug!(
            "Chat completion received: {} chars, {} prompt / {} completion tokens",
            content.len(),
            prompt_tokens,
            completion_tokens
        );
        Ok(ChatCompletion {
            content,
            prompt_tokens,
            completion_tokens,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> GenerativeError {
        if error.is_timeout() {
            GenerativeError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            GenerativeError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, GenerativeError> {
        let api_key = self.api_key.as_deref().ok_or(GenerativeError::MissingCredential)?;

        match self.send_once(api_key, request).await {
            Err(e) if e.is_retryable() => {
                warn!("Chat completion failed ({}), retrying once", e);
                self.send_once(api_key, request).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_json_mode() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            max_tokens: 100,
            temperature: 0.1,
            response_format: ResponseFormat::json_object(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 100);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = OpenAiClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 10,
            temperature: 0.0,
            response_format: ResponseFormat::json_object(),
        };
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, GenerativeError::MissingCredential));
    }
}
