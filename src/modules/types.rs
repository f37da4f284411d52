//! Module trait.

use async_trait::async_trait;

use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Value, ValueSpec};

/// Compiled, executable counterpart of a [`ModuleSpec`](crate::workflow::ModuleSpec).
///
/// Modules hold no mutable state; one instance is reused across every
/// execution of a compiled table, including concurrent ones.
#[async_trait]
pub trait Module: Send + Sync {
    fn id(&self) -> &ModuleId;

    fn signature(&self) -> &ModuleSignature;

    fn module_type(&self) -> ModuleType;

    /// Run the module.
    ///
    /// # Arguments
    /// * `input` - Values available to the module, at least its declared inputs
    ///   unless an upstream composite omitted one
    /// * `ctx` - Capabilities and settings of the current run
    ///
    /// # Returns
    /// Output values in the order of `signature().output`
    async fn execute(&self, input: Vec<Value>, ctx: &ExecutionContext) -> Result<Vec<Value>>;
}

/// The one declared output of a single-output leaf.
pub fn single_output(id: &ModuleId, signature: &ModuleSignature) -> Result<ValueSpec> {
    match signature.output.as_slice() {
        [output] => Ok(output.clone()),
        outputs => Err(Error::Validation(format!(
            "Module '{}' must declare exactly one output, found {}",
            id,
            outputs.len()
        ))),
    }
}
