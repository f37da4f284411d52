//! Engine - top-level entry point for running compiled modules.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, Span};

use super::compiler::ModuleTable;
use super::context::{ExecutionContext, InputPolicy};
use crate::capabilities::{LlmClient, MockLlmClient, ToolRegistry};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics;
use crate::modules::Module;
use crate::workflow::{ModuleId, Value, ValueSet};

/// Runs modules from a compiled table against a fresh context per run.
#[derive(Clone)]
pub struct Engine {
    modules: Arc<ModuleTable>,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    input_policy: InputPolicy,
    timeout: Option<Duration>,
}

impl Engine {
    /// Create an engine with the mock LLM client and the built-in tools.
    pub fn new(modules: ModuleTable) -> Self {
        Self {
            modules: Arc::new(modules),
            llm: Arc::new(MockLlmClient::new()),
            tools: Arc::new(ToolRegistry::with_builtins()),
            input_policy: InputPolicy::default(),
            timeout: None,
        }
    }

    /// Create an engine using the LLM provider and engine settings of `config`.
    pub fn from_config(modules: ModuleTable, config: &Config) -> Self {
        let mut engine = Self::new(modules)
            .with_llm_client(config.llm.client())
            .with_input_policy(config.engine.input_policy);
        engine.timeout = config.engine.timeout();
        engine
    }

    pub fn with_llm_client(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }

    /// Abort executions that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    /// A fresh context with a new execution ID.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(uuid::Uuid::new_v4().to_string())
            .with_llm_client(self.llm.clone())
            .with_tools(self.tools.clone())
            .with_modules(self.modules.clone())
            .with_input_policy(self.input_policy)
    }

    /// Execute a module.
    #[instrument(
        name = "module.execute",
        skip(self, module, input),
        fields(
            module_id = %module.id(),
            execution_id = tracing::field::Empty,
        )
    )]
    pub async fn execute(&self, module: &Arc<dyn Module>, input: Vec<Value>) -> Result<Vec<Value>> {
        let ctx = self
            .context()
            .with_variables(ValueSet::from(input.clone()));
        Span::current().record("execution_id", ctx.execution_id.as_str());

        info!(
            "Starting execution {} of module '{}'",
            ctx.execution_id,
            module.id()
        );

        metrics::inc_active_executions();
        let start_time = Instant::now();

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, module.execute(input, &ctx))
                .await
                .unwrap_or_else(|_| Err(Error::Timeout(timeout))),
            None => module.execute(input, &ctx).await,
        };

        metrics::dec_active_executions();
        metrics::record_execution_duration(start_time.elapsed());
        metrics::record_execution(metrics::status_label(&result));

        match &result {
            Ok(outputs) => info!(
                "Execution {} completed with {} outputs ({}ms)",
                ctx.execution_id,
                outputs.len(),
                start_time.elapsed().as_millis()
            ),
            Err(e) => error!("Execution {} failed: {}", ctx.execution_id, e),
        }

        result
    }

    /// Execute a module of the compiled table by ID.
    pub async fn execute_by_id(&self, id: &ModuleId, input: Vec<Value>) -> Result<Vec<Value>> {
        let module = self
            .modules
            .get(id)
            .ok_or_else(|| Error::UnresolvedReference(id.clone()))?;
        self.execute(&module, input).await
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("modules", &self.modules)
            .field("llm", &self.llm.name())
            .field("input_policy", &self.input_policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}
