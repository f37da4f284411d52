//! Error types for modflow.
//!
//! Errors carry a stable code so that a driver can tell compile-time
//! failures (broken references, cycles, invalid specs) apart from
//! failures raised while a module runs.

use std::time::Duration;

use thiserror::Error;

use crate::workflow::ModuleId;

/// Result type alias for modflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// modflow error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unresolved module reference: '{0}'")]
    UnresolvedReference(ModuleId),

    #[error("Cyclic workflow reference: {0}")]
    CyclicWorkflow(String),

    #[error("Unmatched condition: '{variable}' = {value} and no default branch")]
    UnmatchedCondition { variable: String, value: String },

    #[error("Unresolved input '{input}' (looked up as '{source_name}')")]
    UnresolvedInput { input: String, source_name: String },

    #[error("Declared output '{0}' was never produced")]
    MissingOutput(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Module error: {0}")]
    Module(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnresolvedReference(_) => "UNRESOLVED_REFERENCE",
            Error::CyclicWorkflow(_) => "CYCLIC_WORKFLOW",
            Error::UnmatchedCondition { .. } => "UNMATCHED_CONDITION",
            Error::UnresolvedInput { .. } => "UNRESOLVED_INPUT",
            Error::MissingOutput(_) => "MISSING_OUTPUT",
            Error::ToolNotFound(_) => "TOOL_NOT_FOUND",
            Error::Tool { .. } => "TOOL_ERROR",
            Error::Llm(_) => "LLM_ERROR",
            Error::Module(_) => "MODULE_ERROR",
            Error::Execution(_) => "EXECUTION_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Parse(_) => "PARSE_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// True for errors raised while turning specs into modules.
    ///
    /// These are reported before any step of a workflow runs.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedReference(_) | Error::CyclicWorkflow(_) | Error::Validation(_)
        )
    }

    /// True for failures raised by an external capability (LLM client, tool, HTTP).
    pub fn is_capability(&self) -> bool {
        matches!(
            self,
            Error::ToolNotFound(_) | Error::Tool { .. } | Error::Llm(_) | Error::Http(_)
        )
    }

    /// Convert to a JSON error envelope.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
    }
}
