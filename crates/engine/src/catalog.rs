//! Named block registries a run can be pointed at.

use std::collections::BTreeMap;
use std::sync::Arc;

use blocks::builtin::{self, BUILTIN_MODULE};
use blocks::BlockRegistry;

use crate::EngineError;

/// Registries keyed by module name; `builtin` is always present.
#[derive(Debug, Clone)]
pub struct RegistryCatalog {
    registries: BTreeMap<String, Arc<BlockRegistry>>,
}

impl Default for RegistryCatalog {
    fn default() -> Self {
        let mut catalog = Self {
            registries: BTreeMap::new(),
        };
        catalog.insert(builtin::registry());
        catalog
    }
}

impl RegistryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a registry under its own name.
    pub fn insert(&mut self, registry: BlockRegistry) -> Arc<BlockRegistry> {
        let registry = Arc::new(registry);
        self.registries
            .insert(registry.name().to_owned(), Arc::clone(&registry));
        registry
    }

    pub fn get(&self, name: &str) -> Option<Arc<BlockRegistry>> {
        self.registries.get(name).cloned()
    }

    /// Like [`get`](Self::get) but failing with [`EngineError::UnknownRegistry`].
    pub fn resolve(&self, name: &str) -> Result<Arc<BlockRegistry>, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownRegistry(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registries.keys().map(String::as_str)
    }

    pub fn builtin(&self) -> Arc<BlockRegistry> {
        self.get(BUILTIN_MODULE)
            .unwrap_or_else(|| Arc::new(builtin::registry()))
    }
}
