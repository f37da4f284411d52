//! Tool capability and registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::workflow::Payload;

/// Arguments passed to a tool, keyed by input name.
pub type ToolArgs = HashMap<String, Payload>;

/// A named, externally supplied operation.
///
/// Tools are shared by concurrent branches and must not rely on exclusive
/// access to their own state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used to look the tool up.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Payload>;
}

type ToolFn = dyn Fn(&ToolArgs) -> Result<Payload> + Send + Sync;

/// Tool backed by a plain closure.
pub struct FnTool {
    name: String,
    description: String,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&ToolArgs) -> Result<Payload> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            func: Box::new(func),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Payload> {
        (self.func)(args)
    }
}

/// Registry of tools available to tool leaves.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(
            FnTool::new("echo", builtin_echo)
                .with_description("Return the 'value' argument, or all arguments as an object"),
        ));
        registry.register(Arc::new(
            FnTool::new("uppercase", builtin_uppercase)
                .with_description("Uppercase the 'text' argument"),
        ));
        registry
    }

    /// Register a tool under its own name, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Register a closure as a tool.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&ToolArgs) -> Result<Payload> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnTool::new(name, func)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Look up and run a tool by name.
    pub async fn execute(&self, name: &str, args: &ToolArgs) -> Result<Payload> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;
        tool.execute(args).await
    }

    /// Registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .tools
            .iter()
            .map(|(name, tool)| (name.as_str(), tool.description()))
            .collect();
        out.sort_unstable();
        out
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}

fn builtin_echo(args: &ToolArgs) -> Result<Payload> {
    if let Some(value) = args.get("value") {
        return Ok(value.clone());
    }
    Ok(Payload::Object(
        args.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    ))
}

fn builtin_uppercase(args: &ToolArgs) -> Result<Payload> {
    let text = args.get("text").ok_or_else(|| Error::Tool {
        tool: "uppercase".into(),
        message: "missing 'text' argument".into(),
    })?;
    Ok(Payload::String(text.to_string().to_uppercase()))
}
