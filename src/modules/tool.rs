//! Generic tool leaf.

use async_trait::async_trait;

use super::types::{single_output, Module};
use crate::capabilities::ToolArgs;
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Payload, Value, ValueSpec};

/// Calls a named tool with its inputs as arguments.
pub struct ToolModule {
    id: ModuleId,
    signature: ModuleSignature,
    tool: String,
    output: ValueSpec,
}

impl ToolModule {
    pub fn new(id: ModuleId, signature: ModuleSignature, tool: impl Into<String>) -> Result<Self> {
        let output = single_output(&id, &signature)?;
        Ok(Self {
            id,
            signature,
            tool: tool.into(),
            output,
        })
    }
}

/// Input list as tool arguments. Null payloads are passed as empty text.
fn to_args(input: Vec<Value>) -> ToolArgs {
    input
        .into_iter()
        .map(|v| {
            let payload = match v.payload {
                Payload::Null => Payload::String(String::new()),
                other => other,
            };
            (v.spec.name, payload)
        })
        .collect()
}

#[async_trait]
impl Module for ToolModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Tool
    }

    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let tool = ctx
            .tools
            .get(&self.tool)
            .ok_or_else(|| Error::ToolNotFound(self.tool.clone()))?;

        let result = tool.execute(&to_args(input)).await.map_err(|e| match e {
            Error::Tool { .. } => e,
            other => Error::Tool {
                tool: self.tool.clone(),
                message: other.to_string(),
            },
        })?;

        Ok(vec![Value::new(self.output.clone(), result)])
    }
}
