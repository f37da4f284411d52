//! Capabilities consumed by leaf modules.
//!
//! - [`LlmClient`]: text generation
//! - [`Tool`] / [`ToolRegistry`]: named tool invocation

mod llm;
mod tools;

pub use llm::{HttpLlmClient, LlmClient, MockLlmClient, DEFAULT_LLM_ENDPOINT};
pub use tools::{FnTool, Tool, ToolArgs, ToolRegistry};
