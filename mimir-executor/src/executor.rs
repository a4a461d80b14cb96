// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Executor
//!
//! Runs a [`PipelineDocument`]'s steps sequentially against a shared
//! [`Context`]. After each step, the step's outbound context is merged back
//! into the shared one (later keys win on collision). The first step to
//! return an error halts the run; the executor never attempts to roll back
//! context mutations from steps that already succeeded.

use std::time::{Duration, Instant};

use mimir_bootstrap::CancellationScope;
use mimir_domain::{Context, MimirError, MimirResult, StepConfig};
use mimir_plugin::Registry;

use crate::pipeline::PipelineDocument;

/// Per-step timing and identity, recorded regardless of outcome.
#[derive(Debug, Clone)]
pub struct StepTiming {
    pub step_name: String,
    pub plugin_ref: String,
    pub elapsed: Duration,
}

/// The final outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub pipeline_name: String,
    pub success: bool,
    pub failed_step: Option<String>,
    pub error_message: Option<String>,
    pub context: Context,
    pub step_timings: Vec<StepTiming>,
}

pub struct Executor<'a> {
    registry: &'a Registry,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Runs every step of `document` in declaration order, starting from
    /// `initial_context` (an empty [`Context`] if the caller has no seed
    /// data). Cancellation is checked before each step begins; a scope
    /// cancelled mid-step is the plugin's own responsibility to honor.
    pub async fn run(&self, document: &PipelineDocument, initial_context: Context, scope: &CancellationScope) -> PipelineResult {
        let shared = initial_context;
        let mut timings = Vec::with_capacity(document.steps.len());

        for raw_step in &document.steps {
            let step: StepConfig = raw_step.clone().into();

            if scope.is_cancelled() {
                return PipelineResult {
                    pipeline_name: document.name.clone(),
                    success: false,
                    failed_step: Some(step.name.clone()),
                    error_message: Some("cancelled before step started".to_string()),
                    context: shared,
                    step_timings: timings,
                };
            }

            let start = Instant::now();
            let outcome = self.run_step(&step, &shared, scope).await;
            let elapsed = start.elapsed();
            timings.push(StepTiming { step_name: step.name.clone(), plugin_ref: step.plugin_ref.clone(), elapsed });

            match outcome {
                Ok(step_outcome) => {
                    shared.merge_from(&step_outcome.context);
                    tracing::info!(step = %step.name, plugin = %step.plugin_ref, elapsed_ms = elapsed.as_millis(), "step completed");
                }
                Err(err) => {
                    tracing::warn!(step = %step.name, plugin = %step.plugin_ref, error = %err, "step failed, halting pipeline");
                    return PipelineResult {
                        pipeline_name: document.name.clone(),
                        success: false,
                        failed_step: Some(step.name.clone()),
                        error_message: Some(err.to_string()),
                        context: shared,
                        step_timings: timings,
                    };
                }
            }
        }

        PipelineResult {
            pipeline_name: document.name.clone(),
            success: true,
            failed_step: None,
            error_message: None,
            context: shared,
            step_timings: timings,
        }
    }

    async fn run_step(&self, step: &StepConfig, inbound: &Context, scope: &CancellationScope) -> MimirResult<mimir_plugin::StepOutcome> {
        let (type_tag, name) = step
            .plugin_type_and_name()
            .ok_or_else(|| MimirError::config_invalid(format!("plugin reference '{}' is not of the form <type>.<name>", step.plugin_ref)))?;
        let plugin = self.registry.lookup(type_tag, name)?;
        plugin.validate_config(&step.config)?;
        plugin.execute_step(scope, step, inbound).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use mimir_domain::MimirResult as Res;
    use mimir_plugin::{plugin_type, Plugin, StepOutcome};
    use serde_json::{json, Value as Json};

    use super::*;

    struct EchoPlugin {
        tag: &'static str,
        name: &'static str,
    }

    #[async_trait]
    impl Plugin for EchoPlugin {
        fn type_tag(&self) -> &str {
            self.tag
        }

        fn name(&self) -> &str {
            self.name
        }

        fn validate_config(&self, _cfg: &HashMap<String, Json>) -> Res<()> {
            Ok(())
        }

        async fn execute_step(&self, _scope: &CancellationScope, step: &StepConfig, inbound: &Context) -> Res<StepOutcome> {
            let out = inbound.clone_deep();
            out.set(step.resolved_output_key(), json!({"ran": step.name}));
            Ok(StepOutcome::new(out))
        }
    }

    struct FailingPlugin;

    #[async_trait]
    impl Plugin for FailingPlugin {
        fn type_tag(&self) -> &str {
            plugin_type::OUTPUT
        }

        fn name(&self) -> &str {
            "always_fail"
        }

        fn validate_config(&self, _cfg: &HashMap<String, Json>) -> Res<()> {
            Ok(())
        }

        async fn execute_step(&self, _scope: &CancellationScope, _step: &StepConfig, _inbound: &Context) -> Res<StepOutcome> {
            Err(MimirError::input_missing("rows"))
        }
    }

    fn registry_with_echo_chain() -> Registry {
        let registry = Registry::new();
        registry.register(Arc::new(EchoPlugin { tag: plugin_type::INPUT, name: "csv" })).unwrap();
        registry.register(Arc::new(EchoPlugin { tag: plugin_type::DATA_PROCESSING, name: "transform" })).unwrap();
        registry.register(Arc::new(EchoPlugin { tag: plugin_type::OUTPUT, name: "json" })).unwrap();
        registry
    }

    #[tokio::test]
    async fn pipeline_success_runs_every_step_and_merges_context() {
        let registry = registry_with_echo_chain();
        let yaml = r#"
name: demo
steps:
  - name: read
    plugin: Input.csv
  - name: shape
    plugin: Data_Processing.transform
  - name: save
    plugin: Output.json
"#;
        let doc = PipelineDocument::parse_yaml(yaml).unwrap();
        let executor = Executor::new(&registry);
        let scope = CancellationScope::new();

        let result = executor.run(&doc, Context::new(), &scope).await;

        assert!(result.success);
        assert_eq!(result.step_timings.len(), 3);
        assert!(result.context.get("read_output").is_some());
        assert!(result.context.get("shape_output").is_some());
        assert!(result.context.get("save_output").is_some());
    }

    #[tokio::test]
    async fn pipeline_halts_on_first_failure() {
        let registry = registry_with_echo_chain();
        registry.register(Arc::new(FailingPlugin)).unwrap();
        let yaml = r#"
name: demo
steps:
  - name: read
    plugin: Input.csv
  - name: save
    plugin: Output.always_fail
  - name: never_runs
    plugin: Output.json
"#;
        let doc = PipelineDocument::parse_yaml(yaml).unwrap();
        let executor = Executor::new(&registry);
        let scope = CancellationScope::new();

        let result = executor.run(&doc, Context::new(), &scope).await;

        assert!(!result.success);
        assert_eq!(result.failed_step.as_deref(), Some("save"));
        assert!(result.error_message.is_some());
        assert_eq!(result.step_timings.len(), 2);
        assert!(result.context.get("never_runs_output").is_none());
    }

    #[tokio::test]
    async fn pipeline_fails_fast_when_already_cancelled() {
        let registry = registry_with_echo_chain();
        let yaml = r#"
name: demo
steps:
  - name: read
    plugin: Input.csv
"#;
        let doc = PipelineDocument::parse_yaml(yaml).unwrap();
        let executor = Executor::new(&registry);
        let scope = CancellationScope::new();
        scope.cancel();

        let result = executor.run(&doc, Context::new(), &scope).await;

        assert!(!result.success);
        assert_eq!(result.step_timings.len(), 0);
    }

    #[tokio::test]
    async fn unknown_plugin_reference_is_reported_as_the_failed_step() {
        let registry = registry_with_echo_chain();
        let yaml = r#"
name: demo
steps:
  - name: mystery
    plugin: Input.does_not_exist
"#;
        let doc = PipelineDocument::parse_yaml(yaml).unwrap();
        let executor = Executor::new(&registry);
        let scope = CancellationScope::new();

        let result = executor.run(&doc, Context::new(), &scope).await;

        assert!(!result.success);
        assert_eq!(result.failed_step.as_deref(), Some("mystery"));
    }
}
