// src/llm/client/mod.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ChatModel, PromptMessage};
use crate::config::Config;

/// Errors from the chat completion endpoint
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Response contained no choices")]
    EmptyChoices,
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for an OpenAI-compatible chat completion API (Ollama's `/v1`)
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: ReqwestClient,
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

impl CompletionClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        info!(
            "Initializing completion client: url={}, model={}",
            config.llm_url, config.llm_model
        );
        Ok(Self::new(
            config.llm_url.clone(),
            config.llm_model.clone(),
            config.llm_api_key.clone(),
            config.request_timeout(),
        )?
        .with_temperature(config.temperature))
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Send one completion request and return the first choice's text
    pub async fn chat(&self, messages: &[PromptMessage]) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        debug!("POST chat/completions ({} messages)", messages.len());

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .header(header::AUTHORIZATION, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Malformed(e.to_string()))?;

        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyChoices)?;
        choice
            .message
            .content
            .ok_or_else(|| LlmError::Malformed("choice has no message content".into()))
    }

    /// List model ids served by the endpoint
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .header(header::AUTHORIZATION, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl ChatModel for CompletionClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LlmError> {
        self.chat(messages).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
