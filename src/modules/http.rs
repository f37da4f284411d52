//! Stdlib HTTP leaf.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{debug, warn};

use super::types::Module;
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Value, ValueSet};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fetches `url` with `method` (default GET) and returns `status` and `body`.
///
/// Non-2xx responses are returned as values, not raised.
pub struct HttpModule {
    id: ModuleId,
    signature: ModuleSignature,
    client: Client,
}

impl HttpModule {
    pub fn new(id: ModuleId, signature: ModuleSignature) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_HTTP_CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout defaults: {}", e);
                Client::new()
            });
        Self {
            id,
            signature,
            client,
        }
    }
}

/// Only http and https URLs are fetched.
fn validate_url(url: &str) -> Result<reqwest::Url> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::Module(format!("Invalid URL '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::Module(format!(
            "Unsupported URL scheme '{}'. Only http and https are allowed.",
            scheme
        ))),
    }
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.trim().to_uppercase().as_bytes())
        .map_err(|_| Error::Module(format!("Invalid HTTP method '{}'", method)))
}

#[async_trait]
impl Module for HttpModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Tool
    }

    async fn execute(&self, input: Vec<Value>, _ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let input = ValueSet::from(input);

        let url = input
            .get("url")
            .and_then(|v| v.payload.as_str())
            .ok_or_else(|| Error::Module(format!("Module '{}' is missing 'url' input", self.id)))?;
        let method = input
            .get("method")
            .and_then(|v| v.payload.as_str())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("GET");

        let url = validate_url(url)?;
        let method = parse_method(method)?;

        debug!(module_id = %self.id, "HTTP {} {}", method, url);

        let response = self.client.request(method, url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let produced = ValueSet::from(vec![
            Value::integer("status", i64::from(status)),
            Value::string("body", body),
        ]);
        Ok(produced.project(&self.signature.output))
    }
}
