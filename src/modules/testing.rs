//! Test doubles for module tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::types::Module;
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Value};

/// Module returning fixed outputs, optionally after a delay or with a failure.
/// Records every input list it completes with.
pub struct StubModule {
    id: ModuleId,
    signature: ModuleSignature,
    outputs: Vec<Value>,
    delay: Option<Duration>,
    failure: Option<String>,
    seen: Arc<Mutex<Vec<Vec<Value>>>>,
}

impl StubModule {
    pub fn new(id: &str, signature: ModuleSignature) -> Self {
        Self {
            id: ModuleId::from(id),
            signature,
            outputs: Vec::new(),
            delay: None,
            failure: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning(mut self, outputs: Vec<Value>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<Vec<Value>>>> {
        self.seen.clone()
    }

    pub fn into_module(self) -> Arc<dyn Module> {
        Arc::new(self)
    }
}

#[async_trait]
impl Module for StubModule {
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
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.seen.lock().unwrap().push(input);
        match &self.failure {
            Some(message) => Err(Error::Module(message.clone())),
            None => Ok(self.outputs.clone()),
        }
    }
}
