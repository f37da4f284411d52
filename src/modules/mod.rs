//! Compiled modules.
//!
//! Composites (sequential, parallel, switch, sub-workflow) combine child
//! modules; leaves (llm, tool, http, json_extract) do the actual work
//! through the capabilities in the execution context.

mod http;
mod json_extract;
mod llm;
mod parallel;
mod resolve;
mod sequential;
mod subworkflow;
mod switch;
#[cfg(test)]
pub(crate) mod testing;
mod tool;
mod types;

pub use http::HttpModule;
pub use json_extract::JsonExtractModule;
pub use llm::LlmModule;
pub use parallel::ParallelModule;
pub use resolve::{invoke, resolve_inputs};
pub use sequential::{SequentialModule, Step};
pub use subworkflow::SubWorkflowModule;
pub use switch::SwitchModule;
pub use tool::ToolModule;
pub use types::{single_output, Module};
