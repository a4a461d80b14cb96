// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Plugin Capability Set
//!
//! A plugin is any object satisfying this trait. There is deliberately one
//! unified interface for every plugin type (`Input`, `Data_Processing`,
//! `AIModels`, `Output`) rather than a separate trait per type: a single
//! interface keeps the registry and the executor dispatch logic identical
//! regardless of what a given step actually does, and lets the platform add
//! new plugin types without touching the dispatcher.

use std::collections::HashMap;

use async_trait::async_trait;
use mimir_bootstrap::CancellationScope;
use mimir_domain::{Context, MimirResult, StepConfig};
use serde_json::Value as Json;

/// The four named plugin types. Stored as plain strings so the registry
/// can accept future tags without a breaking change.
pub mod plugin_type {
    pub const INPUT: &str = "Input";
    pub const DATA_PROCESSING: &str = "Data_Processing";
    pub const AI_MODELS: &str = "AIModels";
    pub const OUTPUT: &str = "Output";
}

/// The outcome of one step execution.
pub struct StepOutcome {
    pub context: Context,
}

impl StepOutcome {
    pub fn new(context: Context) -> Self {
        Self { context }
    }
}

/// The capability every plugin implements.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// One of `plugin_type::{INPUT, DATA_PROCESSING, AI_MODELS, OUTPUT}`, or
    /// a custom tag for future plugin types.
    fn type_tag(&self) -> &str;

    fn name(&self) -> &str;

    /// Rejects configuration the plugin cannot run with. Called both by the
    /// registry ahead of first use and by the executor before each step.
    fn validate_config(&self, cfg: &HashMap<String, Json>) -> MimirResult<()>;

    /// Executes one step. Implementations must honor `scope` at every
    /// suspension point: a cancelled scope should make the plugin return
    /// `Err(MimirError::Cancelled(..))` promptly rather than run to
    /// completion.
    async fn execute_step(&self, scope: &CancellationScope, step: &StepConfig, inbound: &Context) -> MimirResult<StepOutcome>;

    /// Advisory JSON-Schema-shaped description of the plugin's expected
    /// configuration, used by tooling rather than enforced by the core.
    fn input_schema(&self) -> Json {
        Json::Object(serde_json::Map::new())
    }
}

/// `(type_tag, name)` — the registry's lookup key.
pub type PluginKey = (String, String);

pub fn plugin_key(type_tag: &str, name: &str) -> PluginKey {
    (type_tag.to_string(), name.to_string())
}
