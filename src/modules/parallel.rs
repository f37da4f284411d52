//! Parallel composite - fan out to every branch, join all.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, error};

use super::resolve::{invoke, resolve_inputs};
use super::types::Module;
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Value, ValueSet};

/// Runs branches concurrently.
///
/// Outputs are concatenated in branch-declaration order without
/// deduplication; two branches emitting the same name both appear.
pub struct ParallelModule {
    id: ModuleId,
    signature: ModuleSignature,
    branches: Vec<Arc<dyn Module>>,
}

impl ParallelModule {
    pub fn new(id: ModuleId, signature: ModuleSignature, branches: Vec<Arc<dyn Module>>) -> Self {
        Self {
            id,
            signature,
            branches,
        }
    }
}

#[async_trait]
impl Module for ParallelModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Parallel
    }

    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let available = ValueSet::from(input);

        let mut branch_inputs = Vec::with_capacity(self.branches.len());
        for branch in &self.branches {
            branch_inputs.push(resolve_inputs(
                branch.id(),
                &branch.signature().input,
                &available,
                None,
                ctx.input_policy,
            )?);
        }

        let mut join_set: JoinSet<(usize, Result<Vec<Value>>)> = JoinSet::new();
        for (index, (branch, branch_input)) in
            self.branches.iter().zip(branch_inputs).enumerate()
        {
            let branch = branch.clone();
            let branch_ctx = ctx.clone();
            join_set.spawn(async move {
                let result = invoke(&branch, branch_input, &branch_ctx).await;
                (index, result)
            });
        }

        debug!(
            module_id = %self.id,
            branches = self.branches.len(),
            "Waiting for parallel branches"
        );

        let mut results: Vec<Option<Result<Vec<Value>>>> =
            (0..self.branches.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    error!(module_id = %self.id, "Branch task join failed: {}", e);
                    join_set.abort_all();
                    while join_set.join_next().await.is_some() {}
                    return Err(Error::Execution(format!(
                        "Parallel '{}' branch task failed: {}",
                        self.id, e
                    )));
                }
            }
        }

        let mut outputs = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Some(Ok(values)) => outputs.extend(values),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(Error::Internal(format!(
                        "Parallel '{}' branch {} produced no result",
                        self.id, index
                    )))
                }
            }
        }

        outputs.retain(|v| self.signature.declares_output(v.name()));
        Ok(outputs)
    }
}
