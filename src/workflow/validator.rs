//! Spec validation.

use std::collections::{HashMap, HashSet};

use super::registry::SpecRegistry;
use super::types::{ModuleId, ModuleSignature, ModuleSpec, SpecKind};
use super::value::ValueSpec;
use crate::error::{Error, Result};

/// Validate a spec and everything nested inside it.
///
/// Checks for:
/// - Non-empty ids
/// - Unique, non-empty value names on each signature side
/// - Exactly one declared output on llm and tool leaves
/// - Non-empty tool names, switch conditions and extraction paths
/// - Unique switch case keys
pub fn validate_spec(spec: &ModuleSpec) -> Result<()> {
    if spec.id.as_str().is_empty() {
        return Err(Error::Validation("Module ID cannot be empty".into()));
    }

    validate_signature(&spec.id, &spec.signature)?;

    match &spec.kind {
        SpecKind::Llm { .. } | SpecKind::Tool { .. } => {
            if spec.signature.output.len() != 1 {
                return Err(Error::Validation(format!(
                    "Module '{}' must declare exactly one output, found {}",
                    spec.id,
                    spec.signature.output.len()
                )));
            }
        }
        _ => {}
    }

    match &spec.kind {
        SpecKind::Tool { tool } if tool.is_empty() => {
            return Err(Error::Validation(format!(
                "Module '{}' has empty tool name",
                spec.id
            )));
        }
        SpecKind::JsonExtract { field } if field.is_empty() => {
            return Err(Error::Validation(format!(
                "Module '{}' has empty extraction path",
                spec.id
            )));
        }
        SpecKind::SubWorkflow { target } if target.as_str().is_empty() => {
            return Err(Error::Validation(format!(
                "Module '{}' references an empty workflow id",
                spec.id
            )));
        }
        SpecKind::Switch {
            condition, cases, ..
        } => {
            if condition.is_empty() {
                return Err(Error::Validation(format!(
                    "Switch '{}' has empty condition variable",
                    spec.id
                )));
            }
            for (i, case) in cases.iter().enumerate() {
                if cases[..i].iter().any(|earlier| earlier.value == case.value) {
                    return Err(Error::Validation(format!(
                        "Switch '{}' has duplicate case {}",
                        spec.id, case.value
                    )));
                }
            }
        }
        _ => {}
    }

    for child in spec.children() {
        validate_spec(child)?;
    }

    Ok(())
}

/// Check that names on each side of a signature are non-empty and unique.
pub fn validate_signature(id: &ModuleId, signature: &ModuleSignature) -> Result<()> {
    check_side(id, "input", &signature.input)?;
    check_side(id, "output", &signature.output)
}

fn check_side(id: &ModuleId, side: &str, specs: &[ValueSpec]) -> Result<()> {
    let mut names = HashSet::new();
    for spec in specs {
        if spec.name.is_empty() {
            return Err(Error::Validation(format!(
                "Module '{}' has an empty {} name",
                id, side
            )));
        }
        if !names.insert(spec.name.as_str()) {
            return Err(Error::Validation(format!(
                "Module '{}' declares {} '{}' more than once",
                id, side, spec.name
            )));
        }
    }
    Ok(())
}

/// Validate a whole loaded set.
///
/// Runs [`validate_spec`] on every spec, then checks that every sub-workflow
/// reference resolves and that references form no cycle.
pub fn validate_registry(registry: &SpecRegistry) -> Result<()> {
    for spec in registry.specs() {
        validate_spec(spec)?;
    }

    let graph: HashMap<&ModuleId, Vec<ModuleId>> = registry
        .specs()
        .into_iter()
        .map(|spec| (&spec.id, spec.references().into_iter().collect()))
        .collect();

    for (id, refs) in &graph {
        for target in refs {
            if !registry.has(target) {
                return Err(Error::UnresolvedReference(target.clone()));
            }
            if target == *id {
                return Err(Error::CyclicWorkflow(format!("{} -> {}", id, target)));
            }
        }
    }

    let mut visited = HashSet::new();
    for id in registry.ids() {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle(id, &graph, &mut visited, &mut path) {
            return Err(Error::CyclicWorkflow(cycle));
        }
    }

    Ok(())
}

fn find_cycle<'a>(
    id: &'a ModuleId,
    graph: &'a HashMap<&'a ModuleId, Vec<ModuleId>>,
    visited: &mut HashSet<&'a ModuleId>,
    path: &mut Vec<&'a ModuleId>,
) -> Option<String> {
    if let Some(pos) = path.iter().position(|p| *p == id) {
        let mut cycle: Vec<&str> = path[pos..].iter().map(|p| p.as_str()).collect();
        cycle.push(id.as_str());
        return Some(cycle.join(" -> "));
    }
    if !visited.insert(id) {
        return None;
    }

    path.push(id);
    if let Some(neighbors) = graph.get(id) {
        for neighbor in neighbors {
            if let Some(cycle) = find_cycle(neighbor, graph, visited, path) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    None
}
