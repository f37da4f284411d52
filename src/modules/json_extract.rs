//! Stdlib JSON extraction leaf.

use async_trait::async_trait;

use super::types::{single_output, Module};
use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::workflow::{ModuleId, ModuleSignature, ModuleType, Payload, Value, ValueSet, ValueSpec};

/// Extracts the value at a dotted path (`a.b.0`) from its `json` input.
///
/// A missing path yields an empty string.
pub struct JsonExtractModule {
    id: ModuleId,
    signature: ModuleSignature,
    path: String,
    output: ValueSpec,
}

impl JsonExtractModule {
    pub fn new(id: ModuleId, signature: ModuleSignature, path: impl Into<String>) -> Result<Self> {
        let output = single_output(&id, &signature)?;
        Ok(Self {
            id,
            signature,
            path: path.into(),
            output,
        })
    }
}

/// Follow a dotted path through objects and arrays.
fn lookup<'a>(root: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| match current {
            serde_json::Value::Object(map) => map.get(segment),
            serde_json::Value::Array(items) => {
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        })
}

#[async_trait]
impl Module for JsonExtractModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn signature(&self) -> &ModuleSignature {
        &self.signature
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::Tool
    }

    async fn execute(&self, input: Vec<Value>, _ctx: &ExecutionContext) -> Result<Vec<Value>> {
        let input = ValueSet::from(input);
        let document: serde_json::Value = match input.get("json").map(|v| &v.payload) {
            Some(Payload::String(text)) => serde_json::from_str(text)?,
            Some(payload @ (Payload::Object(_) | Payload::List(_))) => payload.clone().into(),
            _ => {
                return Err(Error::Module(format!(
                    "Module '{}' is missing 'json' input",
                    self.id
                )))
            }
        };

        let extracted = match lookup(&document, &self.path) {
            Some(found) => Payload::from(found.clone()).coerce(self.output.value_type),
            None => Payload::String(String::new()),
        };

        Ok(vec![Value::new(self.output.clone(), extracted)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{json_extract_signature, ValueType};
    use serde_json::json;

    const WEATHER: &str = r#"{
        "current_condition": [{ "temp_C": "11", "weatherDesc": [{ "value": "Partly cloudy" }] }],
        "nearest_area": [{ "areaName": [{ "value": "London" }] }]
    }"#;

    async fn extract(path: &str, json: Value) -> Result<Payload> {
        let module = JsonExtractModule::new("extract".into(), json_extract_signature(), path)?;
        let mut out = module
            .execute(vec![json], &ExecutionContext::new("t"))
            .await?;
        Ok(out.remove(0).payload)
    }

    #[test]
    fn test_lookup_paths() {
        let doc = json!({"a": {"b": [10, {"c": true}]}});
        assert_eq!(lookup(&doc, "a.b.0"), Some(&json!(10)));
        assert_eq!(lookup(&doc, "a.b.1.c"), Some(&json!(true)));
        assert_eq!(lookup(&doc, "a.x"), None);
        assert_eq!(lookup(&doc, "a.b.9"), None);
    }

    #[tokio::test]
    async fn test_extracts_nested_text() {
        let value = extract(
            "current_condition.0.weatherDesc.0.value",
            Value::string("json", WEATHER),
        )
        .await
        .unwrap();
        assert_eq!(value, Payload::from("Partly cloudy"));
    }

    #[tokio::test]
    async fn test_missing_path_is_empty_string() {
        let value = extract("nothing.here", Value::string("json", WEATHER))
            .await
            .unwrap();
        assert_eq!(value, Payload::from(""));
    }

    #[tokio::test]
    async fn test_non_text_found_value_is_coerced_to_declared_type() {
        let value = extract("a", Value::string("json", r#"{"a": {"b": 1}}"#))
            .await
            .unwrap();
        assert_eq!(value, Payload::from(r#"{"b":1}"#));

        let module = JsonExtractModule::new(
            "extract".into(),
            ModuleSignature::new(
                vec![ValueSpec::new("json", ValueType::Any)],
                vec![ValueSpec::new("value", ValueType::Integer)],
            ),
            "n",
        )
        .unwrap();
        let out = module
            .execute(
                vec![Value::string("json", r#"{"n": "42"}"#)],
                &ExecutionContext::new("t"),
            )
            .await
            .unwrap();
        assert_eq!(out[0].payload, Payload::Integer(42));
    }

    #[tokio::test]
    async fn test_accepts_structured_payload() {
        let json = Value::new(
            ValueSpec::new("json", ValueType::Object),
            Payload::from(json!({"city": "Oslo"})),
        );
        assert_eq!(extract("city", json).await.unwrap(), Payload::from("Oslo"));
    }

    #[tokio::test]
    async fn test_invalid_json_and_missing_input() {
        let err = extract("a", Value::string("json", "{not json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        let err = extract("a", Value::string("other", "{}")).await.unwrap_err();
        assert!(matches!(err, Error::Module(_)));
    }
}
