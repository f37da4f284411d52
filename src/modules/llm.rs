//! Text-generation leaf.

use async_trait::async_trait;
use tracing::debug;

use super::types::{single_output, Module};
use crate::engine::ExecutionContext;
use crate::error::Result;
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Payload, Value, ValueSpec};

/// Fills `${name}` placeholders from its inputs and asks the context's
/// LLM client for the single output.
pub struct LlmModule {
    id: ModuleId,
    signature: ModuleSignature,
    template: String,
    output: ValueSpec,
}

impl LlmModule {
    pub fn new(id: ModuleId, signature: ModuleSignature, template: impl Into<String>) -> Result<Self> {
        let output = single_output(&id, &signature)?;
        Ok(Self {
            id,
            signature,
            template: template.into(),
            output,
        })
    }

    /// Substitute each declared input into the template.
    ///
    /// Plain substring replacement in input order. Substituted text is not
    /// escaped, so a value containing `${other}` is itself substituted when
    /// `other` comes later.
    pub fn render(&self, input: &[Value]) -> String {
        let mut prompt = self.template.clone();
        for value in input {
            if !self.signature.input.iter().any(|s| s.name == value.name()) {
                continue;
            }
            let placeholder = format!("${{{}}}", value.name());
            prompt = prompt.replace(&placeholder, &value.payload.to_string());
        }
        prompt
    }
}

#[async_trait]
impl Module for LlmModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Llm
    }

    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let prompt = self.render(&input);
        debug!(
            module_id = %self.id,
            client = ctx.llm.name(),
            "Prompt: {}...",
            prompt.chars().take(100).collect::<String>()
        );

        let text = ctx.llm.generate(&prompt).await?;
        Ok(vec![Value::new(self.output.clone(), Payload::String(text))])
    }
}
