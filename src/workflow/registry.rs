//! Spec registry - the loaded set of workflows.

use std::collections::HashMap;

use super::types::{ModuleId, ModuleSpec};
use crate::error::{Error, Result};

/// Lookup from module identifier to specification during compilation.
pub trait SpecResolver: Send + Sync {
    fn resolve_module(&self, id: &ModuleId) -> Option<&ModuleSpec>;
}

impl SpecResolver for HashMap<ModuleId, ModuleSpec> {
    fn resolve_module(&self, id: &ModuleId) -> Option<&ModuleSpec> {
        self.get(id)
    }
}

/// Registry of loaded top-level specs, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SpecRegistry {
    specs: HashMap<ModuleId, ModuleSpec>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate ids.
    pub fn from_specs(specs: impl IntoIterator<Item = ModuleSpec>) -> Result<Self> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Register a spec. Ids are unique within one registry.
    pub fn register(&mut self, spec: ModuleSpec) -> Result<()> {
        if self.specs.contains_key(&spec.id) {
            return Err(Error::Validation(format!(
                "Duplicate module id: {}",
                spec.id
            )));
        }
        self.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ModuleSpec> {
        self.specs.get(id)
    }

    pub fn has(&self, id: &ModuleId) -> bool {
        self.specs.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&ModuleId> {
        let mut ids: Vec<&ModuleId> = self.specs.keys().collect();
        ids.sort();
        ids
    }

    /// Registered specs, sorted by id.
    pub fn specs(&self) -> Vec<&ModuleSpec> {
        let mut specs: Vec<&ModuleSpec> = self.specs.values().collect();
        specs.sort_by(|a, b| a.id.cmp(&b.id));
        specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl SpecResolver for SpecRegistry {
    fn resolve_module(&self, id: &ModuleId) -> Option<&ModuleSpec> {
        self.specs.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::SequentialBuilder;

    #[test]
    fn test_register_and_resolve() {
        let registry = SpecRegistry::from_specs(vec![
            SequentialBuilder::new("b").build(),
            SequentialBuilder::new("a").build(),
        ])
        .unwrap();

        assert!(registry.has(&ModuleId::from("a")));
        assert!(registry.resolve_module(&ModuleId::from("b")).is_some());
        assert!(registry.resolve_module(&ModuleId::from("c")).is_none());
        let ids: Vec<&str> = registry.ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = SpecRegistry::from_specs(vec![
            SequentialBuilder::new("a").build(),
            SequentialBuilder::new("a").build(),
        ]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
