//! Groq chat-completions client.
//!
//! Groq exposes an OpenAI-compatible API, so the request is a plain
//! `POST {base_url}/chat/completions` with a bearer token and the response is
//! decoded from `choices[0].message.content`. The base URL is configurable so
//! tests can point the client at a local mock server.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::{ProviderError, TextGenerator};
use crate::config::ProviderSettings;

/// Sampling temperature for schedule generation. Kept low so replies stay
/// machine-parseable JSON.
const TEMPERATURE: f64 = 0.3;

/// Configuration for the Groq client.
#[derive(Clone)]
pub struct GroqConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL, up to and including the `/openai/v1` segment.
    pub base_url: String,
    /// The model to use.
    pub model: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl GroqConfig {
    /// Create a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.groq.com/openai/v1".into(),
            model: model.into(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from file settings plus the `GROQ_API_KEY` environment
    /// variable. The key never lives in the config file.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }
}

impl std::fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Groq text-generation client.
pub struct GroqClient {
    config: GroqConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl GroqClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GroqConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a client from file settings and the `GROQ_API_KEY` environment
    /// variable.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Self::new(GroqConfig::from_settings(settings)?)
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

/// Pull a human-readable message out of an error response body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl TextGenerator for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": TEMPERATURE,
        });

        debug!("Groq request: model={} url={}", self.config.model, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body_text),
            });
        }

        let decoded: ChatResponse = response.json().await?;
        let content = decoded
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        debug!("Groq reply: {} bytes", content.len());
        Ok(content)
    }
}
