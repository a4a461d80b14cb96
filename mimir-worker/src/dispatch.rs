// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Dispatch
//!
//! Turns one [`Task`] into a [`TaskResult`]: `kind=pipeline` parses and
//! runs a pipeline document through `mimir_executor`; `kind=digital_twin`
//! is a stub specialization that always reports the same success
//! message, reserved for future expansion.

use std::collections::HashMap;

use mimir_bootstrap::CancellationScope;
use mimir_domain::{Context, MimirError, Task, TaskKind, TaskResult};
use mimir_executor::{Executor, PipelineDocument};
use mimir_plugin::Registry;
use serde_json::Value as Json;

pub async fn dispatch(task: &Task, registry: &Registry, scope: &CancellationScope, worker_id: &str) -> TaskResult {
    match task.kind {
        TaskKind::Pipeline => run_pipeline(task, registry, scope, worker_id).await,
        TaskKind::DigitalTwin => run_digital_twin(task, worker_id),
    }
}

async fn run_pipeline(task: &Task, registry: &Registry, scope: &CancellationScope, worker_id: &str) -> TaskResult {
    let yaml = match pipeline_yaml_for(task) {
        Ok(yaml) => yaml,
        Err(err) => return TaskResult::failure(task.id, worker_id, None, err.to_string()),
    };

    let document = match PipelineDocument::parse_yaml(&yaml) {
        Ok(doc) => doc,
        Err(err) => return TaskResult::failure(task.id, worker_id, None, err.to_string()),
    };

    let context = Context::new();
    if let Some(seed) = &task.seed_context {
        for (key, value) in seed {
            context.set(key.clone(), value.clone());
        }
    }

    let executor = Executor::new(registry);
    let result = executor.run(&document, context, scope).await;

    if result.success {
        let final_context: HashMap<String, Json> = result
            .context
            .entries()
            .into_iter()
            .filter_map(|(k, v)| v.serialize().ok().and_then(|bytes| serde_json::from_slice(&bytes).ok()).map(|j| (k, j)))
            .collect();
        TaskResult::success(task.id, worker_id, final_context)
    } else {
        TaskResult::failure(task.id, worker_id, result.failed_step, result.error_message.unwrap_or_else(|| "pipeline failed".to_string()))
    }
}

fn run_digital_twin(task: &Task, worker_id: &str) -> TaskResult {
    let mut final_context = HashMap::new();
    final_context.insert("message".to_string(), Json::String("Digital twin task executed successfully".to_string()));
    TaskResult::success(task.id, worker_id, final_context)
}

fn pipeline_yaml_for(task: &Task) -> Result<String, MimirError> {
    if let Some(yaml) = &task.pipeline_yaml {
        return Ok(yaml.clone());
    }
    if let Some(path) = &task.pipeline_file {
        return std::fs::read_to_string(path).map_err(|e| MimirError::config_invalid(format!("could not read pipeline file '{path}': {e}")));
    }
    Err(MimirError::config_invalid("task carries neither pipeline_yaml nor pipeline_file"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as Map;
    use std::sync::Arc;

    use async_trait::async_trait;
    use mimir_bootstrap::CancellationScope;
    use mimir_domain::{Context, MimirError, MimirResult as Res, TaskKind};
    use mimir_plugin::{plugin_type, Plugin, StepOutcome};
    use serde_json::json;

    use super::*;

    struct EchoPlugin;

    #[async_trait]
    impl Plugin for EchoPlugin {
        fn type_tag(&self) -> &str {
            plugin_type::INPUT
        }

        fn name(&self) -> &str {
            "csv"
        }

        fn validate_config(&self, _cfg: &Map<String, Json>) -> Res<()> {
            Ok(())
        }

        async fn execute_step(&self, _scope: &CancellationScope, step: &mimir_domain::StepConfig, inbound: &Context) -> Res<StepOutcome> {
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

        fn validate_config(&self, _cfg: &Map<String, Json>) -> Res<()> {
            Ok(())
        }

        async fn execute_step(&self, _scope: &CancellationScope, _step: &mimir_domain::StepConfig, _inbound: &Context) -> Res<StepOutcome> {
            Err(MimirError::input_missing("rows"))
        }
    }

    fn registry_with_echo() -> Registry {
        let registry = Registry::new();
        registry.register(Arc::new(EchoPlugin)).unwrap();
        registry
    }

    fn task_with_yaml(yaml: &str) -> Task {
        Task::new_pipeline_yaml(yaml)
    }

    #[tokio::test]
    async fn pipeline_task_dispatches_through_the_executor_and_reports_success() {
        let task = task_with_yaml(
            r#"
name: demo
steps:
  - name: load
    plugin: Input.csv
"#,
        );
        let registry = registry_with_echo();
        let scope = CancellationScope::new();

        let result = dispatch(&task, &registry, &scope, "worker-1").await;

        assert!(result.success);
        assert_eq!(result.id, task.id);
        assert!(result.final_context.unwrap().contains_key("load_output"));
    }

    #[tokio::test]
    async fn pipeline_task_reports_failure_and_failed_step() {
        let task = task_with_yaml(
            r#"
name: demo
steps:
  - name: emit
    plugin: Output.always_fail
"#,
        );
        let registry = Registry::new();
        registry.register(Arc::new(FailingPlugin)).unwrap();
        let scope = CancellationScope::new();

        let result = dispatch(&task, &registry, &scope, "worker-1").await;

        assert!(!result.success);
        assert_eq!(result.failed_step.as_deref(), Some("emit"));
    }

    #[tokio::test]
    async fn task_missing_both_pipeline_sources_fails_without_panicking() {
        let mut task = task_with_yaml("name: demo\nsteps: []\n");
        task.pipeline_yaml = None;
        let registry = Registry::new();
        let scope = CancellationScope::new();

        let result = dispatch(&task, &registry, &scope, "worker-1").await;

        assert!(!result.success);
    }

    #[tokio::test]
    async fn digital_twin_task_always_succeeds_with_its_stock_message() {
        let mut task = task_with_yaml("unused");
        task.kind = TaskKind::DigitalTwin;
        let registry = Registry::new();
        let scope = CancellationScope::new();

        let result = dispatch(&task, &registry, &scope, "worker-1").await;

        assert!(result.success);
        let ctx = result.final_context.unwrap();
        assert_eq!(ctx.get("message").unwrap(), "Digital twin task executed successfully");
    }
}
