//! modflow - typed, composable workflow modules
//!
//! Workflows are declared as [`ModuleSpec`](workflow::ModuleSpec) graphs:
//! leaves (LLM calls, tool calls, HTTP fetches, JSON extraction) composed
//! by sequential, parallel, switch and sub-workflow combinators. Specs are
//! compiled once, which resolves every sub-workflow reference up front, and
//! the compiled modules are then executed any number of times.
//!
//! ## Example
//!
//! ```no_run
//! use modflow::engine::{compile_main, Engine};
//! use modflow::workflow::{ModuleId, ModuleSpec, SequentialBuilder, SpecRegistry, Value, ValueSpec, ValueType};
//!
//! # async fn run() -> modflow::Result<()> {
//! let registry = SpecRegistry::from_specs(vec![SequentialBuilder::new("story")
//!     .input("topic", ValueType::String)
//!     .output("story", ValueType::String)
//!     .add_step(ModuleSpec::llm(
//!         "write",
//!         "Write a short story about ${topic}",
//!         vec![ValueSpec::new("topic", ValueType::String)],
//!         ValueSpec::new("story", ValueType::String),
//!     ))
//!     .build()])?;
//!
//! let id = ModuleId::from("story");
//! let engine = Engine::new(compile_main(&registry, &id)?);
//! let outputs = engine.execute_by_id(&id, vec![Value::string("topic", "cats")]).await?;
//! assert_eq!(outputs[0].name(), "story");
//! # Ok(())
//! # }
//! ```

pub mod capabilities;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod modules;
pub mod workflow;

pub use error::{Error, Result};
