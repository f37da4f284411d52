//! Switch composite - pick one branch by the value of a variable.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::resolve::{invoke, resolve_inputs};
use super::types::Module;
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Payload, Value, ValueSet};

pub struct SwitchModule {
    id: ModuleId,
    signature: ModuleSignature,
    condition: String,
    cases: Vec<(Payload, Arc<dyn Module>)>,
    default: Option<Arc<dyn Module>>,
}

impl SwitchModule {
    pub fn new(
        id: ModuleId,
        signature: ModuleSignature,
        condition: impl Into<String>,
        cases: Vec<(Payload, Arc<dyn Module>)>,
        default: Option<Arc<dyn Module>>,
    ) -> Self {
        Self {
            id,
            signature,
            condition: condition.into(),
            cases,
            default,
        }
    }

    /// Branch for a condition value: exact match first, then the default.
    pub fn select(&self, value: &Payload) -> Option<&Arc<dyn Module>> {
        self.cases
            .iter()
            .find(|(key, _)| key == value)
            .map(|(_, module)| module)
            .or(self.default.as_ref())
    }
}

#[async_trait]
impl Module for SwitchModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Switch
    }

    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let available = ValueSet::from(input);

        // An unbound condition compares as null.
        let value = available
            .get(&self.condition)
            .map(|v| v.payload.clone())
            .unwrap_or_default();

        let branch = self
            .select(&value)
            .ok_or_else(|| Error::UnmatchedCondition {
                variable: self.condition.clone(),
                value: value.to_string(),
            })?;

        debug!(
            module_id = %self.id,
            condition = %self.condition,
            value = %value,
            branch = %branch.id(),
            "Switch selected branch"
        );

        let branch_input = resolve_inputs(
            branch.id(),
            &branch.signature().input,
            &available,
            None,
            ctx.input_policy,
        )?;
        let outputs = invoke(branch, branch_input, ctx).await?;

        Ok(ValueSet::from(outputs).project(&self.signature.output))
    }
}
