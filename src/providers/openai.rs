//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! with the OpenAI request/response shape.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::CompletionProvider;
use super::{DEFAULT_USER_AGENT, api_error, http_client, record_request};
use crate::types::{ChatMessage, CompletionRequest, ModelConfig};
use crate::{ForkcastError, Result};

const PROVIDER: &str = "openai";

/// Client for one model configuration.
#[derive(Clone)]
pub struct OpenAiClient {
    config_name: String,
    api_key: Option<String>,
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("config_name", &self.config_name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client for `config_name` with its own timeout.
    pub fn new(config_name: impl Into<String>, config: &ModelConfig) -> Result<Self> {
        let http = http_client(config.timeout(), DEFAULT_USER_AGENT)?;
        Ok(Self::with_client(
            http,
            config_name,
            &config.base_url,
            config.api_key.clone(),
        ))
    }

    /// Create a client around an existing HTTP client (tests, shared pools).
    pub fn with_client(
        http: Client,
        config_name: impl Into<String>,
        base_url: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            config_name: config_name.into(),
            api_key,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            response_format: request
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let mut builder = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        let response = self.handle_response_errors(response).await?;

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ForkcastError::EmptyResponse)?;

        debug!(
            config = %self.config_name,
            model = %request.model,
            chars = content.len(),
            "completion received"
        );
        Ok(content)
    }

    /// Check response status and map to the appropriate error.
    async fn handle_response_errors(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(ForkcastError::AuthenticationFailed),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                warn!(config = %self.config_name, ?retry_after, "rate limit exceeded");
                Err(ForkcastError::RateLimited {
                    config: self.config_name.clone(),
                    retry_after,
                })
            }
            _ => Err(api_error(PROVIDER, response).await),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let started = Instant::now();
        let result = self.send(request).await;
        record_request(PROVIDER, started, &result);
        result
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
