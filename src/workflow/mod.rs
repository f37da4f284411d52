//! Workflow definition, parsing, and validation.
//!
//! A loaded workflow set is a table of [`ModuleSpec`]s keyed by id:
//! - Values: typed, named data flowing between modules
//! - Specs: declarative descriptions of composites and leaves
//! - Registry: the table that compilation resolves references against

mod builder;
mod parser;
mod registry;
mod types;
mod validator;
mod value;

pub use builder::{ParallelBuilder, SequentialBuilder, SwitchBuilder};
pub use parser::{load_registry, parse_workflow_file, parse_workflows, WorkflowDocument};
pub use registry::{SpecRegistry, SpecResolver};
pub use types::*;
pub use validator::{validate_registry, validate_signature, validate_spec};
pub use value::{Payload, Value, ValueSet, ValueSpec, ValueType};
