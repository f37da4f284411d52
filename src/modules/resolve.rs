//! Value resolution and child invocation shared by composites.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use super::types::Module;
use crate::engine::{ExecutionContext, InputPolicy};
use crate::error::{Error, Result};
use crate::metrics;
use crate::workflow::{InputMapping, ModuleId, Value, ValueSet, ValueSpec};

/// Build the input list for a child.
///
/// Each declared input is looked up under its mapped source name when the
/// mapping names it, else under its own name, and is re-bound to the
/// declared spec. Unresolved inputs are omitted (lenient) or fail (strict);
/// inputs declared optional are always omitted.
pub fn resolve_inputs(
    child: &ModuleId,
    specs: &[ValueSpec],
    current: &ValueSet,
    mapping: Option<&InputMapping>,
    policy: InputPolicy,
) -> Result<Vec<Value>> {
    let mut resolved = Vec::with_capacity(specs.len());

    for spec in specs {
        let source = mapping
            .and_then(|m| m.get(&spec.name))
            .map(String::as_str)
            .unwrap_or(spec.name.as_str());

        match current.get(source) {
            Some(value) => resolved.push(value.rebind(spec)),
            None if spec.optional => {
                debug!(module_id = %child, input = %spec.name, "Optional input not bound");
            }
            None if policy.is_strict() => {
                return Err(Error::UnresolvedInput {
                    input: format!("{}.{}", child, spec.name),
                    source_name: source.to_string(),
                });
            }
            None => {
                warn!(
                    module_id = %child,
                    input = %spec.name,
                    source = %source,
                    "Input not resolved, omitting"
                );
            }
        }
    }

    Ok(resolved)
}

/// Execute a child module, recording its duration and outcome.
pub async fn invoke(
    child: &Arc<dyn Module>,
    input: Vec<Value>,
    ctx: &ExecutionContext,
) -> Result<Vec<Value>> {
    let module_type = child.module_type();
    debug!(
        module_id = %child.id(),
        module_type = %module_type,
        inputs = input.len(),
        "Invoking module"
    );

    let start = Instant::now();
    let result = child.execute(input, ctx).await;

    metrics::record_module_invocation(module_type.as_str(), metrics::status_label(&result));
    metrics::record_module_duration(start.elapsed(), module_type.as_str());

    match &result {
        Ok(outputs) => debug!(
            module_id = %child.id(),
            outputs = outputs.len(),
            "Module completed ({}ms)",
            start.elapsed().as_millis()
        ),
        Err(e) => warn!(module_id = %child.id(), "Module failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ValueType;

    fn specs(names: &[&str]) -> Vec<ValueSpec> {
        names
            .iter()
            .map(|n| ValueSpec::new(*n, ValueType::String))
            .collect()
    }

    #[test]
    fn test_same_name_lookup_rebinds() {
        let current = ValueSet::from(vec![Value::integer("topic", 3)]);
        let resolved = resolve_inputs(
            &ModuleId::from("child"),
            &specs(&["topic"]),
            &current,
            None,
            InputPolicy::Lenient,
        )
        .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].spec.value_type, ValueType::String);
    }

    #[test]
    fn test_mapping_renames_source() {
        let current = ValueSet::from(vec![Value::string("story", "once upon a time")]);
        let mapping: InputMapping = [("text".to_string(), "story".to_string())].into();

        let resolved = resolve_inputs(
            &ModuleId::from("child"),
            &specs(&["text"]),
            &current,
            Some(&mapping),
            InputPolicy::Lenient,
        )
        .unwrap();

        assert_eq!(resolved[0].name(), "text");
        assert_eq!(resolved[0].payload.to_string(), "once upon a time");
    }

    #[test]
    fn test_mapped_name_does_not_fall_back_to_same_name() {
        let current = ValueSet::from(vec![Value::string("text", "direct")]);
        let mapping: InputMapping = [("text".to_string(), "story".to_string())].into();

        let resolved = resolve_inputs(
            &ModuleId::from("child"),
            &specs(&["text"]),
            &current,
            Some(&mapping),
            InputPolicy::Lenient,
        )
        .unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_unresolved_input_lenient_and_strict() {
        let current = ValueSet::from(vec![Value::string("a", "1")]);
        let wanted = specs(&["a", "b"]);

        let lenient = resolve_inputs(
            &ModuleId::from("child"),
            &wanted,
            &current,
            None,
            InputPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(lenient.len(), 1);

        let err = resolve_inputs(
            &ModuleId::from("child"),
            &wanted,
            &current,
            None,
            InputPolicy::Strict,
        )
        .unwrap_err();
        match err {
            Error::UnresolvedInput { input, source_name } => {
                assert_eq!(input, "child.b");
                assert_eq!(source_name, "b");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_optional_input_omitted_even_when_strict() {
        let current = ValueSet::from(vec![Value::string("url", "https://example.com")]);
        let wanted = vec![
            ValueSpec::new("url", ValueType::String),
            ValueSpec::new("method", ValueType::String).optional(),
        ];

        let resolved = resolve_inputs(
            &ModuleId::from("fetch"),
            &wanted,
            &current,
            None,
            InputPolicy::Strict,
        )
        .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "url");
    }
}
