//! Builders for composite specs.
//!
//! Front-ends (parsers, tests, embedding programs) assemble spec graphs
//! through these instead of constructing [`SpecKind`] values by hand.
//!
//! ```
//! use modflow::workflow::{ModuleSpec, SequentialBuilder, ValueSpec, ValueType};
//!
//! let spec = SequentialBuilder::new("llm-workflow")
//!     .input("topic", ValueType::String)
//!     .output("summary", ValueType::String)
//!     .add_step(ModuleSpec::llm(
//!         "generate-content",
//!         "Write a short story about ${topic}",
//!         vec![ValueSpec::new("topic", ValueType::String)],
//!         ValueSpec::new("story", ValueType::String),
//!     ))
//!     .add_mapped_step(
//!         ModuleSpec::llm(
//!             "summarize-content",
//!             "Summarize this: ${text}",
//!             vec![ValueSpec::new("text", ValueType::String)],
//!             ValueSpec::new("summary", ValueType::String),
//!         ),
//!         [("text", "story")],
//!     )
//!     .build();
//!
//! assert_eq!(spec.children().len(), 2);
//! ```

use super::types::{
    CaseSpec, InputMapping, ModuleId, ModuleSignature, ModuleSpec, SpecKind, StepSpec,
};
use super::value::{Payload, ValueSpec, ValueType};

/// Builder for a sequential spec.
#[derive(Debug, Clone)]
pub struct SequentialBuilder {
    id: ModuleId,
    signature: ModuleSignature,
    steps: Vec<StepSpec>,
}

impl SequentialBuilder {
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            signature: ModuleSignature::default(),
            steps: Vec::new(),
        }
    }

    /// Declare an input of the sequence.
    pub fn input(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.signature.input.push(ValueSpec::new(name, value_type));
        self
    }

    /// Declare an output of the sequence.
    pub fn output(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.signature.output.push(ValueSpec::new(name, value_type));
        self
    }

    /// Append a step whose inputs resolve by name.
    pub fn add_step(self, module: ModuleSpec) -> Self {
        self.add_mapped_step(module, std::iter::empty::<(String, String)>())
    }

    /// Append a step with an explicit `public-name -> source-name` mapping.
    pub fn add_mapped_step<I, K, V>(mut self, module: ModuleSpec, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping: InputMapping = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.steps.push(StepSpec { module, mapping });
        self
    }

    pub fn build(self) -> ModuleSpec {
        finish(
            self.id,
            self.signature,
            SpecKind::Sequential { steps: self.steps },
        )
    }
}

/// Builder for a parallel spec.
///
/// When no signature is declared, the compiled module derives one from its
/// branches.
#[derive(Debug, Clone)]
pub struct ParallelBuilder {
    id: ModuleId,
    signature: ModuleSignature,
    branches: Vec<ModuleSpec>,
}

impl ParallelBuilder {
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            signature: ModuleSignature::default(),
            branches: Vec::new(),
        }
    }

    pub fn input(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.signature.input.push(ValueSpec::new(name, value_type));
        self
    }

    pub fn output(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.signature.output.push(ValueSpec::new(name, value_type));
        self
    }

    pub fn add_branch(mut self, module: ModuleSpec) -> Self {
        self.branches.push(module);
        self
    }

    pub fn build(self) -> ModuleSpec {
        finish(
            self.id,
            self.signature,
            SpecKind::Parallel {
                branches: self.branches,
            },
        )
    }
}

/// Builder for a switch spec.
#[derive(Debug, Clone)]
pub struct SwitchBuilder {
    id: ModuleId,
    signature: ModuleSignature,
    condition: String,
    cases: Vec<CaseSpec>,
    default: Option<ModuleSpec>,
}

impl SwitchBuilder {
    pub fn new(id: impl Into<ModuleId>, condition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            signature: ModuleSignature::default(),
            condition: condition.into(),
            cases: Vec::new(),
            default: None,
        }
    }

    pub fn input(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.signature.input.push(ValueSpec::new(name, value_type));
        self
    }

    pub fn output(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.signature.output.push(ValueSpec::new(name, value_type));
        self
    }

    /// Bind `module` to the case `value`. A second case with an equal key
    /// replaces the first.
    pub fn add_case(mut self, value: impl Into<Payload>, module: ModuleSpec) -> Self {
        let value = value.into();
        match self.cases.iter_mut().find(|c| c.value == value) {
            Some(existing) => existing.module = module,
            None => self.cases.push(CaseSpec { value, module }),
        }
        self
    }

    pub fn default_case(mut self, module: ModuleSpec) -> Self {
        self.default = Some(module);
        self
    }

    /// The condition variable is added to the inputs at compile time, so it
    /// need not be declared here.
    pub fn build(self) -> ModuleSpec {
        finish(
            self.id,
            self.signature,
            SpecKind::Switch {
                condition: self.condition,
                cases: self.cases,
                default: self.default.map(Box::new),
            },
        )
    }
}

/// Record every nested sub-workflow target as a signature dependency.
fn finish(id: ModuleId, mut signature: ModuleSignature, kind: SpecKind) -> ModuleSpec {
    let mut spec = ModuleSpec::new(id, ModuleSignature::default(), kind);
    signature.dependencies.extend(spec.references());
    spec.signature = signature;
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ModuleType;

    #[test]
    fn test_sequential_builder_keeps_mappings() {
        let spec = SequentialBuilder::new("wf")
            .input("topic", ValueType::String)
            .output("summary", ValueType::String)
            .add_step(ModuleSpec::tool(
                "a",
                "echo",
                vec![],
                ValueSpec::new("x", ValueType::Any),
            ))
            .add_mapped_step(
                ModuleSpec::tool("b", "echo", vec![], ValueSpec::new("y", ValueType::Any)),
                [("text", "story")],
            )
            .build();

        match &spec.kind {
            SpecKind::Sequential { steps } => {
                assert!(steps[0].mapping.is_empty());
                assert_eq!(steps[1].mapping.get("text").unwrap(), "story");
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(spec.signature.input.len(), 1);
        assert_eq!(spec.signature.output.len(), 1);
    }

    #[test]
    fn test_dependencies_collected_from_nested_calls() {
        let spec = SequentialBuilder::new("complex-workflow")
            .add_step(ModuleSpec::call("sub-workflow"))
            .add_step(
                ParallelBuilder::new("fan-out")
                    .add_branch(ModuleSpec::call("other"))
                    .build(),
            )
            .build();

        let deps: Vec<&str> = spec
            .signature
            .dependencies
            .iter()
            .map(|d| d.as_str())
            .collect();
        assert_eq!(deps, vec!["other", "sub-workflow"]);
    }

    #[test]
    fn test_switch_add_case_replaces_equal_key() {
        let spec = SwitchBuilder::new("sw", "val1")
            .add_case(10, SequentialBuilder::new("first").build())
            .add_case(10, SequentialBuilder::new("second").build())
            .add_case("10", SequentialBuilder::new("text-key").build())
            .build();

        match &spec.kind {
            SpecKind::Switch { cases, .. } => {
                assert_eq!(cases.len(), 2);
                assert_eq!(cases[0].module.id.as_str(), "second");
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(spec.module_type(), ModuleType::Switch);
    }
}
