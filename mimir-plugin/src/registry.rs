// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Plugin Registry
//!
//! Indexes plugin instances by `(type_tag, name)`. The registry is
//! read-mostly after worker startup: every plugin is registered once during
//! `starting -> ready`, then looked up on every step of every task for the
//! rest of the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use mimir_domain::MimirError;
use parking_lot::RwLock;

use crate::plugin::{plugin_key, Plugin, PluginKey};

#[derive(Default)]
pub struct Registry {
    plugins: RwLock<HashMap<PluginKey, Arc<dyn Plugin>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin. Fails with `MimirError::ConstraintViolation` if
    /// `(type_tag, name)` is already registered — the registry enforces the
    /// same uniqueness a persistence layer would for a unique key.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), MimirError> {
        let key = plugin_key(plugin.type_tag(), plugin.name());
        let mut guard = self.plugins.write();
        if guard.contains_key(&key) {
            return Err(MimirError::constraint_violation(format!(
                "duplicate plugin registration: {}.{}",
                key.0, key.1
            )));
        }
        guard.insert(key, plugin);
        Ok(())
    }

    pub fn lookup(&self, type_tag: &str, name: &str) -> Result<Arc<dyn Plugin>, MimirError> {
        self.plugins
            .read()
            .get(&plugin_key(type_tag, name))
            .cloned()
            .ok_or_else(|| MimirError::plugin_not_found(format!("{type_tag}.{name}")))
    }

    pub fn list_by_type(&self, type_tag: &str) -> Vec<String> {
        self.plugins.read().keys().filter(|(t, _)| t == type_tag).map(|(_, n)| n.clone()).collect()
    }

    pub fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.plugins.read().keys().map(|(t, _)| t.clone()).collect();
        types.sort();
        types.dedup();
        types
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use mimir_bootstrap::CancellationScope;
    use mimir_domain::{Context, MimirResult, StepConfig};
    use serde_json::Value as Json;

    use super::*;
    use crate::plugin::{plugin_type, StepOutcome};

    struct NoopPlugin;

    #[async_trait]
    impl Plugin for NoopPlugin {
        fn type_tag(&self) -> &str {
            plugin_type::DATA_PROCESSING
        }

        fn name(&self) -> &str {
            "noop"
        }

        fn validate_config(&self, _cfg: &HashMap<String, Json>) -> MimirResult<()> {
            Ok(())
        }

        async fn execute_step(&self, _scope: &CancellationScope, _step: &StepConfig, inbound: &Context) -> MimirResult<StepOutcome> {
            Ok(StepOutcome::new(inbound.clone_deep()))
        }
    }

    #[test]
    fn register_then_lookup() {
        let registry = Registry::new();
        registry.register(Arc::new(NoopPlugin)).unwrap();
        let found = registry.lookup(plugin_type::DATA_PROCESSING, "noop").unwrap();
        assert_eq!(found.name(), "noop");
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = Registry::new();
        registry.register(Arc::new(NoopPlugin)).unwrap();
        let err = registry.register(Arc::new(NoopPlugin)).unwrap_err();
        assert!(matches!(err, MimirError::ConstraintViolation(_)));
    }

    #[test]
    fn lookup_missing_plugin_fails() {
        let registry = Registry::new();
        let err = registry.lookup(plugin_type::INPUT, "csv").unwrap_err();
        assert!(matches!(err, MimirError::PluginNotFound(_)));
    }

    #[test]
    fn list_by_type_and_list_types() {
        let registry = Registry::new();
        registry.register(Arc::new(NoopPlugin)).unwrap();
        assert_eq!(registry.list_by_type(plugin_type::DATA_PROCESSING), vec!["noop".to_string()]);
        assert_eq!(registry.list_types(), vec![plugin_type::DATA_PROCESSING.to_string()]);
    }
}
