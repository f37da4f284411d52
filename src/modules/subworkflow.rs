//! Sub-workflow reference - delegates to another compiled workflow.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::types::Module;
use crate::engine::ExecutionContext;
use crate::error::Result;
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Value};

/// Call site of another workflow.
///
/// The target is bound when the caller is compiled; at execution time the
/// input is forwarded unchanged and the target's output returned unchanged.
pub struct SubWorkflowModule {
    id: ModuleId,
    target_id: ModuleId,
    target: Arc<dyn Module>,
    signature: ModuleSignature,
}

impl SubWorkflowModule {
    pub fn new(id: ModuleId, target_id: ModuleId, target: Arc<dyn Module>) -> Self {
        let signature = target.signature().clone().with_dependency(target_id.clone());
        Self {
            id,
            target_id,
            target,
            signature,
        }
    }
}

#[async_trait]
impl Module for SubWorkflowModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::SubWorkflow
    }

    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>> {
        debug!(module_id = %self.id, target = %self.target_id, "Entering sub-workflow");
        self.target.execute(input, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::StubModule;
    use crate::workflow::{ValueSpec, ValueType};

    #[tokio::test]
    async fn test_forwards_input_and_output_unchanged() {
        let target = StubModule::new(
            "child",
            ModuleSignature::new(
                vec![ValueSpec::new("a", ValueType::String)],
                vec![ValueSpec::new("b", ValueType::String)],
            ),
        )
        .returning(vec![Value::string("b", "out")]);
        let seen = target.seen();

        let call = SubWorkflowModule::new("call_child".into(), "child".into(), target.into_module());
        assert_eq!(call.signature().input[0].name, "a");
        assert!(call
            .signature()
            .dependencies
            .contains(&ModuleId::from("child")));

        let input = vec![Value::string("a", "in"), Value::string("extra", "kept")];
        let out = call
            .execute(input.clone(), &ExecutionContext::new("t"))
            .await
            .unwrap();

        assert_eq!(out, vec![Value::string("b", "out")]);
        assert_eq!(seen.lock().unwrap()[0], input);
    }
}
