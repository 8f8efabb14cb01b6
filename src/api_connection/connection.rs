use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Provider};
use crate::substitution::ReasoningService;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

impl Provider {
    fn resolve_api_key(&self) -> Result<String, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                ..
            } => {
                dotenv().ok();
                env::var(api_key_env_var_name)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))
            }
        }
    }

    /// Sends one chat-completion request. The key is checked before any network traffic.
    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let actual_api_key = self.resolve_api_key()?;

        match self {
            Provider::OpenRouter {
                site_url, app_name, ..
            } => {
                let client = Client::new();
                let url = self.chat_completions_url();
                debug!(%url, model = %request.model, "sending chat completion request");

                let response = client
                    .post(&url)
                    .bearer_auth(actual_api_key)
                    .header("Content-Type", "application/json")
                    .header("HTTP-Referer", site_url.as_str())
                    .header("X-Title", app_name.as_str())
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    warn!(%status, "reasoning service returned an error");
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

#[async_trait]
impl ReasoningService for Provider {
    async fn complete(&self, prompt: &str) -> Result<String, ApiConnectionError> {
        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![ChatMessage::user(prompt.to_string())],
        };
        let response = self.call_chat_completion(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "reasoning service usage"
            );
        }
        if response.is_truncated() {
            warn!("reasoning reply was cut off at the token limit");
        }
        // An empty reply decodes to "no substitutions, keep the recipe".
        Ok(response.first_content().unwrap_or("{}").to_string())
    }
}
