//! Compilation and execution.
//!
//! Specs are compiled once into a [`ModuleTable`]; the [`Engine`] then runs
//! modules from that table any number of times.

mod compiler;
mod context;
mod executor;

pub use compiler::{compile_all, compile_main, CompilationContext, CompileReport, ModuleTable};
pub use context::{ExecutionContext, InputPolicy};
pub use executor::Engine;
