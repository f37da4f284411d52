//! Workflow YAML parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::registry::SpecRegistry;
use super::types::ModuleSpec;
use crate::error::{Error, Result};

/// Top-level shape of a workflow document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// Parse the specs of a workflow document from a YAML string.
pub fn parse_workflows(yaml: &str) -> Result<Vec<ModuleSpec>> {
    if yaml.trim().is_empty() {
        return Err(Error::Parse("Empty workflow definition".to_string()));
    }

    let document: WorkflowDocument = serde_yaml::from_str(yaml).map_err(|e| {
        let msg = e.to_string();
        if let Some(field) = extract_missing_field(&msg) {
            Error::Parse(format!("Missing required field: {}", field))
        } else {
            Error::Parse(format!("Invalid YAML: {}", msg))
        }
    })?;

    if document.modules.is_empty() {
        return Err(Error::Parse("Workflow document declares no modules".to_string()));
    }
    Ok(document.modules)
}

/// Parse a workflow document from a file path.
pub fn parse_workflow_file(path: &Path) -> Result<Vec<ModuleSpec>> {
    let content = std::fs::read_to_string(path)?;
    parse_workflows(&content)
}

/// Parse a document and register every top-level spec it declares.
pub fn load_registry(path: &Path) -> Result<SpecRegistry> {
    SpecRegistry::from_specs(parse_workflow_file(path)?)
}

fn extract_missing_field(error_message: &str) -> Option<&str> {
    let marker = "missing field `";
    let start = error_message.find(marker)? + marker.len();
    let rest = &error_message[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}
