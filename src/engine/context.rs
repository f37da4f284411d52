//! Execution context passed to every running module.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::compiler::ModuleTable;
use crate::capabilities::{LlmClient, MockLlmClient, ToolRegistry};
use crate::modules::Module;
use crate::workflow::{ModuleId, Payload, ValueSet};

/// What composites do with a declared input that cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Omit the input and log a warning.
    #[default]
    Lenient,
    /// Fail with [`Error::UnresolvedInput`](crate::Error::UnresolvedInput).
    Strict,
}

impl InputPolicy {
    pub fn is_strict(&self) -> bool {
        matches!(self, InputPolicy::Strict)
    }
}

impl std::str::FromStr for InputPolicy {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(InputPolicy::Lenient),
            "strict" => Ok(InputPolicy::Strict),
            other => Err(crate::error::Error::Config(format!(
                "Unknown input policy '{}' (expected 'lenient' or 'strict')",
                other
            ))),
        }
    }
}

/// Runtime environment of one top-level execution.
///
/// Cloning is cheap; parallel branches each get their own clone.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Execution ID
    pub execution_id: String,

    /// Top-level input of the run
    pub variables: Arc<ValueSet>,

    /// Text-generation capability
    pub llm: Arc<dyn LlmClient>,

    /// Tool capability
    pub tools: Arc<ToolRegistry>,

    /// Compiled modules, for lookups by id
    pub modules: Arc<ModuleTable>,

    pub input_policy: InputPolicy,
}

impl ExecutionContext {
    /// Create a context with a mock LLM, no tools and no compiled modules.
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            variables: Arc::new(ValueSet::new()),
            llm: Arc::new(MockLlmClient::new()),
            tools: Arc::new(ToolRegistry::new()),
            modules: Arc::new(ModuleTable::new()),
            input_policy: InputPolicy::default(),
        }
    }

    pub fn with_variables(mut self, variables: ValueSet) -> Self {
        self.variables = Arc::new(variables);
        self
    }

    pub fn with_llm_client(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_modules(mut self, modules: Arc<ModuleTable>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }

    /// Get a top-level variable by name.
    pub fn variable(&self, name: &str) -> Option<&Payload> {
        self.variables.get(name).map(|v| &v.payload)
    }

    /// Look up a compiled module.
    pub fn module(&self, id: &ModuleId) -> Option<Arc<dyn Module>> {
        self.modules.get(id)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("execution_id", &self.execution_id)
            .field("variables", &self.variables)
            .field("llm", &self.llm.name())
            .field("tools", &self.tools)
            .field("modules", &self.modules.ids())
            .field("input_policy", &self.input_policy)
            .finish()
    }
}
