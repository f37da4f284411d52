//! Text-generation capability.
//!
//! Leaves call [`LlmClient::generate`] through the execution context. The
//! client is shared by every branch of a parallel run, so implementations
//! must be safe to call concurrently.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One-operation text-generation contract.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Human-readable client name, used in logs.
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Deterministic client that echoes the prompt back.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient;

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("Mock response for: {}", prompt))
    }
}

pub const DEFAULT_LLM_ENDPOINT: &str = "http://localhost:3000/api/chat";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: String,
}

/// Client for a chat endpoint that accepts `{message}` and answers
/// `{content}`.
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    client: Client,
    endpoint: String,
    model: Option<String>,
    system: Option<String>,
    temperature: Option<f32>,
    timeout: Duration,
}

impl HttpLlmClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: None,
            system: None,
            temperature: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("LLM request to {}", self.endpoint);

        let request = ChatRequest {
            message: prompt,
            model: self.model.as_deref(),
            system: self.system.as_deref(),
            temperature: self.temperature,
        };

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error ({}): {}", status, error_text)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse response: {}", e)))?;

        info!("LLM response received ({}ms)", start.elapsed().as_millis());
        Ok(body.content)
    }
}
