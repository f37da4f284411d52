//! Module specification types.
//!
//! A [`ModuleSpec`] is the immutable, declarative description of a unit of
//! work. It is turned into an executable module by the compiler in
//! [`crate::engine`]. The same types double as the serde form of a workflow
//! document.
//!
//! # Example YAML
//!
//! ```yaml
//! modules:
//!   - id: llm-workflow
//!     type: sequential
//!     signature:
//!       input: [{ name: topic, type: string }]
//!       output: [{ name: summary, type: string }]
//!     steps:
//!       - module:
//!           id: generate-content
//!           type: llm
//!           template: "Write a short story about ${topic}"
//!           signature:
//!             input: [{ name: topic, type: string }]
//!             output: [{ name: story, type: string }]
//!       - module:
//!           id: summarize-content
//!           type: llm
//!           template: "Summarize this: ${text}"
//!           signature:
//!             input: [{ name: text, type: string }]
//!             output: [{ name: summary, type: string }]
//!         mapping: { text: story }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{Payload, ValueSpec, ValueType};

/// Identifier of a module, unique within one loaded set of workflows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Type tag of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Sequential,
    Parallel,
    Switch,
    SubWorkflow,
    Llm,
    Tool,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Sequential => "sequential",
            ModuleType::Parallel => "parallel",
            ModuleType::Switch => "switch",
            ModuleType::SubWorkflow => "sub_workflow",
            ModuleType::Llm => "llm",
            ModuleType::Tool => "tool",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input/output contract of a module.
///
/// A compiled module accepts any input list containing at least the
/// `input` names and produces the `output` names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSignature {
    #[serde(default)]
    pub input: Vec<ValueSpec>,
    #[serde(default)]
    pub output: Vec<ValueSpec>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<ModuleId>,
}

impl ModuleSignature {
    pub fn new(input: Vec<ValueSpec>, output: Vec<ValueSpec>) -> Self {
        Self {
            input,
            output,
            dependencies: BTreeSet::new(),
        }
    }

    pub fn with_dependency(mut self, id: impl Into<ModuleId>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    /// True when neither side declares anything.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.input.iter().map(|s| s.name.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.output.iter().map(|s| s.name.as_str())
    }

    pub fn declares_output(&self, name: &str) -> bool {
        self.output.iter().any(|s| s.name == name)
    }
}

/// Explicit rename mapping for one step: `public-name -> source-name`.
pub type InputMapping = BTreeMap<String, String>;

/// One step of a sequential spec.
///
/// Unknown keys are rejected, so a misspelled `mapping` is an error rather
/// than a step without renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub module: ModuleSpec,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mapping: InputMapping,
}

/// One case of a switch spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    pub value: Payload,
    pub module: ModuleSpec,
}

/// Variant-specific part of a [`ModuleSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecKind {
    /// Run steps in order, accumulating their outputs.
    Sequential {
        #[serde(default)]
        steps: Vec<StepSpec>,
    },
    /// Run branches concurrently and concatenate their outputs.
    Parallel {
        #[serde(default)]
        branches: Vec<ModuleSpec>,
    },
    /// Pick one branch by the value of `condition`.
    Switch {
        condition: String,
        #[serde(default)]
        cases: Vec<CaseSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<ModuleSpec>>,
    },
    /// Reference to another loaded workflow, resolved at compile time.
    SubWorkflow { target: ModuleId },
    /// Text-generation call with `${name}` placeholders.
    Llm { template: String },
    /// Call a named tool from the tool registry.
    Tool { tool: String },
    /// Stdlib HTTP fetch.
    Http,
    /// Stdlib JSON field extraction along a dotted path.
    JsonExtract { field: String },
}

/// Immutable description of a unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub id: ModuleId,
    #[serde(default)]
    pub signature: ModuleSignature,
    #[serde(flatten)]
    pub kind: SpecKind,
}

impl ModuleSpec {
    pub fn new(id: impl Into<ModuleId>, signature: ModuleSignature, kind: SpecKind) -> Self {
        Self {
            id: id.into(),
            signature,
            kind,
        }
    }

    /// Text-generation leaf.
    pub fn llm(
        id: impl Into<ModuleId>,
        template: impl Into<String>,
        input: Vec<ValueSpec>,
        output: ValueSpec,
    ) -> Self {
        Self::new(
            id,
            ModuleSignature::new(input, vec![output]),
            SpecKind::Llm {
                template: template.into(),
            },
        )
    }

    /// Generic tool leaf.
    pub fn tool(
        id: impl Into<ModuleId>,
        tool: impl Into<String>,
        input: Vec<ValueSpec>,
        output: ValueSpec,
    ) -> Self {
        Self::new(
            id,
            ModuleSignature::new(input, vec![output]),
            SpecKind::Tool { tool: tool.into() },
        )
    }

    /// Reference to another workflow. Its signature is taken from the
    /// target when compiled.
    pub fn call(target: impl Into<ModuleId>) -> Self {
        let target = target.into();
        Self::new(
            format!("call_{}", target),
            ModuleSignature::default().with_dependency(target.clone()),
            SpecKind::SubWorkflow { target },
        )
    }

    /// Stdlib HTTP leaf with its fixed signature.
    pub fn http(id: impl Into<ModuleId>) -> Self {
        Self::new(id, http_signature(), SpecKind::Http)
    }

    /// Stdlib JSON extraction leaf with its fixed signature.
    pub fn json_extract(id: impl Into<ModuleId>, field: impl Into<String>) -> Self {
        Self::new(
            id,
            json_extract_signature(),
            SpecKind::JsonExtract {
                field: field.into(),
            },
        )
    }

    pub fn module_type(&self) -> ModuleType {
        match &self.kind {
            SpecKind::Sequential { .. } => ModuleType::Sequential,
            SpecKind::Parallel { .. } => ModuleType::Parallel,
            SpecKind::Switch { .. } => ModuleType::Switch,
            SpecKind::SubWorkflow { .. } => ModuleType::SubWorkflow,
            SpecKind::Llm { .. } => ModuleType::Llm,
            SpecKind::Tool { .. } | SpecKind::Http | SpecKind::JsonExtract { .. } => {
                ModuleType::Tool
            }
        }
    }

    /// Direct children of a composite spec, in declaration order.
    pub fn children(&self) -> Vec<&ModuleSpec> {
        match &self.kind {
            SpecKind::Sequential { steps } => steps.iter().map(|s| &s.module).collect(),
            SpecKind::Parallel { branches } => branches.iter().collect(),
            SpecKind::Switch { cases, default, .. } => cases
                .iter()
                .map(|c| &c.module)
                .chain(default.as_deref())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every sub-workflow target referenced anywhere inside this spec.
    pub fn references(&self) -> BTreeSet<ModuleId> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut BTreeSet<ModuleId>) {
        if let SpecKind::SubWorkflow { target } = &self.kind {
            refs.insert(target.clone());
        }
        for child in self.children() {
            child.collect_references(refs);
        }
    }
}

/// Fixed signature of the stdlib HTTP leaf.
pub fn http_signature() -> ModuleSignature {
    ModuleSignature::new(
        vec![
            ValueSpec::new("url", ValueType::String),
            ValueSpec::new("method", ValueType::String).optional(),
        ],
        vec![
            ValueSpec::new("status", ValueType::Integer),
            ValueSpec::new("body", ValueType::String),
        ],
    )
}

/// Fixed signature of the stdlib JSON extraction leaf.
pub fn json_extract_signature() -> ModuleSignature {
    ModuleSignature::new(
        vec![ValueSpec::new("json", ValueType::String)],
        vec![ValueSpec::new("value", ValueType::String)],
    )
}
