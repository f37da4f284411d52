//! Sequential composite - run steps in order over a growing value set.

use std::sync::Arc;

use async_trait::async_trait;

use super::resolve::{invoke, resolve_inputs};
use super::types::Module;
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{InputMapping, ModuleId, ModuleSignature, ModuleType, Value, ValueSet};

/// A compiled step: child module plus optional input renames.
#[derive(Clone)]
pub struct Step {
    pub module: Arc<dyn Module>,
    pub mapping: Option<InputMapping>,
}

impl Step {
    pub fn new(module: Arc<dyn Module>) -> Self {
        Self {
            module,
            mapping: None,
        }
    }

    pub fn with_mapping(mut self, mapping: InputMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }
}

pub struct SequentialModule {
    id: ModuleId,
    signature: ModuleSignature,
    steps: Vec<Step>,
}

impl SequentialModule {
    pub fn new(id: ModuleId, signature: ModuleSignature, steps: Vec<Step>) -> Self {
        Self {
            id,
            signature,
            steps,
        }
    }
}

#[async_trait]
impl Module for SequentialModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Sequential
    }

    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let mut current = ValueSet::from(input);

        for step in &self.steps {
            let child_input = resolve_inputs(
                step.module.id(),
                &step.module.signature().input,
                &current,
                step.mapping.as_ref(),
                ctx.input_policy,
            )?;

            let outputs = invoke(&step.module, child_input, ctx).await?;
            current.merge_all(outputs);
        }

        if ctx.input_policy.is_strict() {
            if let Some(missing) = current.missing(&self.signature.output).first() {
                return Err(Error::MissingOutput(format!("{}.{}", self.id, missing)));
            }
        }

        Ok(current.project(&self.signature.output))
    }
}
