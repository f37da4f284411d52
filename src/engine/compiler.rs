//! Compilation of specs into executable modules.
//!
//! Sub-workflow references are resolved here, so a broken reference or a
//! reference cycle fails before anything runs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::modules::{
    HttpModule, JsonExtractModule, LlmModule, Module, ParallelModule, SequentialModule, Step,
    SubWorkflowModule, SwitchModule, ToolModule,
};
use crate::workflow::{
    http_signature, json_extract_signature, validate_signature, ModuleId, ModuleSignature,
    ModuleSpec, Payload, SpecKind, SpecRegistry, SpecResolver, ValueSpec, ValueType,
};

/// Compiled modules keyed by id. Read-only once built.
#[derive(Clone, Default)]
pub struct ModuleTable {
    modules: HashMap<ModuleId, Arc<dyn Module>>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: Arc<dyn Module>) {
        self.modules.insert(module.id().clone(), module);
    }

    pub fn get(&self, id: &ModuleId) -> Option<Arc<dyn Module>> {
        self.modules.get(id).cloned()
    }

    pub fn has(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    /// Compiled ids, sorted.
    pub fn ids(&self) -> Vec<&ModuleId> {
        let mut ids: Vec<&ModuleId> = self.modules.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTable")
            .field("modules", &self.ids())
            .finish()
    }
}

/// State of one compilation pass.
///
/// Tracks the chain of top-level ids currently being compiled (to detect
/// cycles) and caches every top-level module compiled so far.
pub struct CompilationContext<'a> {
    resolver: &'a dyn SpecResolver,
    compiling: Vec<ModuleId>,
    compiled: HashMap<ModuleId, Arc<dyn Module>>,
}

impl<'a> CompilationContext<'a> {
    pub fn new(resolver: &'a dyn SpecResolver) -> Self {
        Self {
            resolver,
            compiling: Vec::new(),
            compiled: HashMap::new(),
        }
    }

    /// Look up a spec by id.
    pub fn resolve_module(&self, id: &ModuleId) -> Option<&'a ModuleSpec> {
        self.resolver.resolve_module(id)
    }

    /// Compile the top-level spec registered under `id`, or return the
    /// module already compiled for it in this pass.
    pub fn compile_reference(&mut self, id: &ModuleId) -> Result<Arc<dyn Module>> {
        if let Some(module) = self.compiled.get(id) {
            return Ok(module.clone());
        }
        if let Some(pos) = self.compiling.iter().position(|c| c == id) {
            let mut chain: Vec<&str> = self.compiling[pos..].iter().map(|c| c.as_str()).collect();
            chain.push(id.as_str());
            return Err(Error::CyclicWorkflow(chain.join(" -> ")));
        }

        let spec = self
            .resolve_module(id)
            .ok_or_else(|| Error::UnresolvedReference(id.clone()))?;

        let module = self.compile_spec(spec)?;
        self.compiled.insert(id.clone(), module.clone());
        Ok(module)
    }

    /// Compile a spec that need not be registered with the resolver.
    pub fn compile_spec(&mut self, spec: &ModuleSpec) -> Result<Arc<dyn Module>> {
        self.compiling.push(spec.id.clone());
        let result = spec.compile(self);
        self.compiling.pop();
        result
    }

    /// Every top-level module compiled in this pass.
    pub fn into_table(self) -> ModuleTable {
        let mut table = ModuleTable::new();
        for module in self.compiled.into_values() {
            table.insert(module);
        }
        table
    }
}

impl ModuleSpec {
    /// Compile this spec and, eagerly, all of its children.
    pub fn compile(&self, ctx: &mut CompilationContext<'_>) -> Result<Arc<dyn Module>> {
        validate_signature(&self.id, &self.signature)?;
        debug!(module_id = %self.id, module_type = %self.module_type(), "Compiling module");

        let id = self.id.clone();
        let module: Arc<dyn Module> = match &self.kind {
            SpecKind::Sequential { steps } => {
                let mut compiled = Vec::with_capacity(steps.len());
                for step in steps {
                    let module = step.module.compile(ctx)?;
                    compiled.push(if step.mapping.is_empty() {
                        Step::new(module)
                    } else {
                        Step::new(module).with_mapping(step.mapping.clone())
                    });
                }
                Arc::new(SequentialModule::new(id, self.signature.clone(), compiled))
            }
            SpecKind::Parallel { branches } => {
                let compiled = branches
                    .iter()
                    .map(|branch| branch.compile(ctx))
                    .collect::<Result<Vec<_>>>()?;
                let signature = composite_signature(&self.signature, None, &compiled);
                Arc::new(ParallelModule::new(id, signature, compiled))
            }
            SpecKind::Switch {
                condition,
                cases,
                default,
            } => {
                let mut compiled_cases: Vec<(Payload, Arc<dyn Module>)> =
                    Vec::with_capacity(cases.len());
                for case in cases {
                    if compiled_cases.iter().any(|(key, _)| key == &case.value) {
                        return Err(Error::Validation(format!(
                            "Switch '{}' has duplicate case {}",
                            self.id, case.value
                        )));
                    }
                    compiled_cases.push((case.value.clone(), case.module.compile(ctx)?));
                }
                let compiled_default = match default {
                    Some(spec) => Some(spec.compile(ctx)?),
                    None => None,
                };

                let children: Vec<Arc<dyn Module>> = compiled_cases
                    .iter()
                    .map(|(_, m)| m.clone())
                    .chain(compiled_default.clone())
                    .collect();
                let signature =
                    composite_signature(&self.signature, Some(condition.as_str()), &children);
                Arc::new(SwitchModule::new(
                    id,
                    signature,
                    condition.clone(),
                    compiled_cases,
                    compiled_default,
                ))
            }
            SpecKind::SubWorkflow { target } => {
                let module = ctx.compile_reference(target)?;
                Arc::new(SubWorkflowModule::new(id, target.clone(), module))
            }
            SpecKind::Llm { template } => Arc::new(LlmModule::new(
                id,
                self.signature.clone(),
                template.clone(),
            )?),
            SpecKind::Tool { tool } => {
                if tool.is_empty() {
                    return Err(Error::Validation(format!(
                        "Module '{}' has empty tool name",
                        self.id
                    )));
                }
                Arc::new(ToolModule::new(id, self.signature.clone(), tool.clone())?)
            }
            SpecKind::Http => {
                let signature = if self.signature.is_empty() {
                    http_signature()
                } else {
                    self.signature.clone()
                };
                Arc::new(HttpModule::new(id, signature))
            }
            SpecKind::JsonExtract { field } => {
                let signature = if self.signature.is_empty() {
                    json_extract_signature()
                } else {
                    self.signature.clone()
                };
                Arc::new(JsonExtractModule::new(id, signature, field.clone())?)
            }
        };

        Ok(module)
    }
}

/// Signature of a parallel or switch composite.
///
/// Each side left empty by the author is derived from the children (union
/// of their inputs or outputs, first declaration of a name wins). A switch
/// always takes its condition variable as an input.
fn composite_signature(
    declared: &ModuleSignature,
    condition: Option<&str>,
    children: &[Arc<dyn Module>],
) -> ModuleSignature {
    let mut signature = declared.clone();

    if declared.input.is_empty() {
        for child in children {
            push_unique(&mut signature.input, &child.signature().input);
        }
    }
    if declared.output.is_empty() {
        for child in children {
            push_unique(&mut signature.output, &child.signature().output);
        }
    }
    if let Some(condition) = condition {
        if !signature.input.iter().any(|s| s.name == condition) {
            signature
                .input
                .insert(0, ValueSpec::new(condition, ValueType::Any));
        }
    }
    for child in children {
        signature
            .dependencies
            .extend(child.signature().dependencies.iter().cloned());
    }

    signature
}

fn push_unique(side: &mut Vec<ValueSpec>, specs: &[ValueSpec]) {
    for spec in specs {
        if !side.iter().any(|s| s.name == spec.name) {
            side.push(spec.clone());
        }
    }
}

/// Compile `main` and everything it references.
///
/// The table holds the main module plus every referenced top-level module.
pub fn compile_main(resolver: &dyn SpecResolver, main: &ModuleId) -> Result<ModuleTable> {
    let mut ctx = CompilationContext::new(resolver);
    ctx.compile_reference(main)?;
    Ok(ctx.into_table())
}

/// Outcome of compiling a whole registry.
#[derive(Debug, Default)]
pub struct CompileReport {
    pub table: ModuleTable,
    pub failures: Vec<(ModuleId, Error)>,
}

impl CompileReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compile every registered spec. A spec that fails is reported and
/// skipped; modules compiled before it are unaffected.
pub fn compile_all(registry: &SpecRegistry) -> CompileReport {
    let mut ctx = CompilationContext::new(registry);
    let mut failures = Vec::new();

    for id in registry.ids() {
        if let Err(e) = ctx.compile_reference(id) {
            warn!(module_id = %id, "Failed to compile module: {}", e);
            failures.push((id.clone(), e));
        }
    }

    CompileReport {
        table: ctx.into_table(),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{CaseSpec, ModuleType, ParallelBuilder, SequentialBuilder, SwitchBuilder};

    fn leaf(id: &str, input: &str, output: &str) -> ModuleSpec {
        ModuleSpec::llm(
            id,
            format!("${{{}}}", input),
            vec![ValueSpec::new(input, ValueType::String)],
            ValueSpec::new(output, ValueType::String),
        )
    }

    #[test]
    fn test_compile_main_includes_references() {
        let registry = SpecRegistry::from_specs(vec![
            SequentialBuilder::new("main")
                .add_step(ModuleSpec::call("child"))
                .build(),
            SequentialBuilder::new("child").build(),
            SequentialBuilder::new("unrelated").build(),
        ])
        .unwrap();

        let table = compile_main(&registry, &ModuleId::from("main")).unwrap();
        let ids: Vec<&str> = table.ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["child", "main"]);
    }

    #[test]
    fn test_unresolved_reference_fails_at_compile_time() {
        let registry = SpecRegistry::from_specs(vec![SequentialBuilder::new("main")
            .add_step(ModuleSpec::call("missing"))
            .build()])
        .unwrap();

        let err = compile_main(&registry, &ModuleId::from("main")).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(ref id) if id.as_str() == "missing"));
        assert!(err.is_compile_time());
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let registry = SpecRegistry::from_specs(vec![SequentialBuilder::new("loop")
            .add_step(ModuleSpec::call("loop"))
            .build()])
        .unwrap();

        let err = compile_main(&registry, &ModuleId::from("loop")).unwrap_err();
        match err {
            Error::CyclicWorkflow(chain) => assert_eq!(chain, "loop -> loop"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_transitive_cycle() {
        let registry = SpecRegistry::from_specs(vec![
            SequentialBuilder::new("a")
                .add_step(ModuleSpec::call("b"))
                .build(),
            SequentialBuilder::new("b")
                .add_step(
                    ParallelBuilder::new("fan")
                        .add_branch(ModuleSpec::call("a"))
                        .build(),
                )
                .build(),
        ])
        .unwrap();

        let err = compile_main(&registry, &ModuleId::from("a")).unwrap_err();
        match err {
            Error::CyclicWorkflow(chain) => assert_eq!(chain, "a -> b -> a"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_shared_reference_is_not_a_cycle() {
        let registry = SpecRegistry::from_specs(vec![
            SequentialBuilder::new("main")
                .add_step(ModuleSpec::call("shared"))
                .add_step(ModuleSpec::call("shared"))
                .build(),
            SequentialBuilder::new("shared").build(),
        ])
        .unwrap();

        let table = compile_main(&registry, &ModuleId::from("main")).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_compile_all_skips_failures() {
        let registry = SpecRegistry::from_specs(vec![
            SequentialBuilder::new("good").build(),
            SequentialBuilder::new("broken")
                .add_step(ModuleSpec::call("missing"))
                .build(),
            SequentialBuilder::new("uses-broken")
                .add_step(ModuleSpec::call("broken"))
                .build(),
        ])
        .unwrap();

        let report = compile_all(&registry);
        assert!(!report.is_ok());
        assert!(report.table.has(&ModuleId::from("good")));
        assert!(!report.table.has(&ModuleId::from("broken")));
        let failed: Vec<&str> = report.failures.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, vec!["broken", "uses-broken"]);
    }

    #[test]
    fn test_parallel_signature_derived_from_branches() {
        let spec = ParallelBuilder::new("fan")
            .add_branch(leaf("one", "a", "x"))
            .add_branch(leaf("two", "b", "x"))
            .build();
        let registry = SpecRegistry::new();
        let module = CompilationContext::new(&registry).compile_spec(&spec).unwrap();

        let sig = module.signature();
        assert_eq!(sig.input_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(sig.output_names().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(module.module_type(), ModuleType::Parallel);
    }

    #[test]
    fn test_switch_signature_includes_condition() {
        let spec = SwitchBuilder::new("route", "kind")
            .add_case(1, leaf("one", "a", "out"))
            .default_case(leaf("other", "b", "out"))
            .build();
        let registry = SpecRegistry::new();
        let module = CompilationContext::new(&registry).compile_spec(&spec).unwrap();

        let sig = module.signature();
        assert_eq!(sig.input_names().collect::<Vec<_>>(), vec!["kind", "a", "b"]);
        assert_eq!(sig.output_names().collect::<Vec<_>>(), vec!["out"]);
    }

    #[test]
    fn test_partial_signature_derives_missing_side() {
        let registry = SpecRegistry::new();

        let parallel = ParallelBuilder::new("fan")
            .output("x", ValueType::String)
            .add_branch(leaf("one", "a", "x"))
            .add_branch(leaf("two", "b", "y"))
            .build();
        let module = CompilationContext::new(&registry)
            .compile_spec(&parallel)
            .unwrap();
        let sig = module.signature();
        assert_eq!(sig.input_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(sig.output_names().collect::<Vec<_>>(), vec!["x"]);

        let switch = SwitchBuilder::new("route", "kind")
            .input("a", ValueType::String)
            .add_case(1, leaf("one", "a", "out"))
            .build();
        let module = CompilationContext::new(&registry)
            .compile_spec(&switch)
            .unwrap();
        let sig = module.signature();
        assert_eq!(sig.input_names().collect::<Vec<_>>(), vec!["kind", "a"]);
        assert_eq!(sig.output_names().collect::<Vec<_>>(), vec!["out"]);
    }

    #[test]
    fn test_subworkflow_takes_target_signature() {
        let registry = SpecRegistry::from_specs(vec![SequentialBuilder::new("child")
            .input("q", ValueType::String)
            .output("r", ValueType::String)
            .build()])
        .unwrap();

        let module = CompilationContext::new(&registry)
            .compile_spec(&ModuleSpec::call("child"))
            .unwrap();
        assert_eq!(module.signature().input_names().collect::<Vec<_>>(), vec!["q"]);
        assert_eq!(module.module_type(), ModuleType::SubWorkflow);
    }

    #[test]
    fn test_stdlib_leaves_get_fixed_signatures() {
        let registry = SpecRegistry::new();
        let mut ctx = CompilationContext::new(&registry);

        let http = ModuleSpec::new("fetch", ModuleSignature::default(), SpecKind::Http);
        let module = ctx.compile_spec(&http).unwrap();
        assert_eq!(module.signature(), &http_signature());

        let extract = ModuleSpec::new(
            "pick",
            ModuleSignature::default(),
            SpecKind::JsonExtract { field: "a".into() },
        );
        let module = ctx.compile_spec(&extract).unwrap();
        assert_eq!(module.signature(), &json_extract_signature());
    }

    #[test]
    fn test_invalid_signatures_rejected() {
        let registry = SpecRegistry::new();
        let mut ctx = CompilationContext::new(&registry);

        let mut multi = leaf("gen", "a", "x");
        multi.signature.output.push(ValueSpec::new("y", ValueType::String));
        assert!(matches!(ctx.compile_spec(&multi), Err(Error::Validation(_))));

        let dup = SequentialBuilder::new("dup")
            .output("x", ValueType::String)
            .output("x", ValueType::String)
            .build();
        assert!(matches!(ctx.compile_spec(&dup), Err(Error::Validation(_))));

        let dup_case = ModuleSpec::new(
            "sw",
            ModuleSignature::default(),
            SpecKind::Switch {
                condition: "v".into(),
                cases: vec![
                    CaseSpec {
                        value: Payload::Integer(1),
                        module: SequentialBuilder::new("a").build(),
                    },
                    CaseSpec {
                        value: Payload::Integer(1),
                        module: SequentialBuilder::new("b").build(),
                    },
                ],
                default: None,
            },
        );
        assert!(matches!(ctx.compile_spec(&dup_case), Err(Error::Validation(_))));
    }

    #[test]
    fn test_each_pass_recompiles() {
        let registry = SpecRegistry::from_specs(vec![SequentialBuilder::new("main").build()])
            .unwrap();
        let first = compile_main(&registry, &ModuleId::from("main")).unwrap();
        let second = compile_main(&registry, &ModuleId::from("main")).unwrap();

        let a = first.get(&ModuleId::from("main")).unwrap();
        let b = second.get(&ModuleId::from("main")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
