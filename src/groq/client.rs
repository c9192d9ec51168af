use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::types::{ChatRequest, ChatResponse};
use crate::config::{GroqConfig, RequestConfig};
use crate::error::{GroqError, GroqResult};

/// Client for the Groq OpenAI-compatible chat-completions API.
///
/// Each call is a single attempt bounded by the configured timeout. The
/// verdict layer owns graceful degradation, so no retry loop lives here.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
}

impl GroqClient {
    /// Create a new Groq client
    pub fn new(config: &GroqConfig, request_config: RequestConfig) -> GroqResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(GroqError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Run a chat completion and return the completion text.
    pub async fn chat(&self, request: ChatRequest) -> GroqResult<String> {
        if self.api_key.is_empty() {
            return Err(GroqError::MissingApiKey);
        }

        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let model = request.model.clone();

        debug!(model = %model, messages = request.messages.len(), "Calling Groq chat completion");

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GroqError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    GroqError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                model = %model,
                status = status.as_u16(),
                latency_ms = start.elapsed().as_millis(),
                "Groq chat completion failed"
            );
            return Err(GroqError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| GroqError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        let completion = chat_response
            .completion()
            .ok_or_else(|| GroqError::InvalidResponse {
                message: "Response contained no choices".to_string(),
            })?
            .trim()
            .to_string();

        let total_tokens = chat_response
            .usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        info!(
            model = %model,
            latency_ms = start.elapsed().as_millis(),
            total_tokens,
            "Groq chat completion succeeded"
        );

        Ok(completion)
    }
}
