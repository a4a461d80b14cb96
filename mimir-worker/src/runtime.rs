// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Runtime
//!
//! Owns the main loop: acquire a concurrency permit, blocking-pop a task,
//! dispatch it on its own task, store and publish the result, release the
//! permit. A `ShutdownCoordinator` stops new pops on `ready -> draining`;
//! the loop then waits for every in-flight task to release its permit, up
//! to the grace period, before reporting itself stopped.
//!
//! Each in-flight task gets its own `CancellationScope`, fed by two
//! sources: the worker-wide shutdown scope, and a dedicated
//! `mimir:cancel:<task_id>` subscription so an orchestrator can cancel a
//! single task without affecting its neighbors.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use mimir_bootstrap::{CancellationScope, ShutdownCoordinator, WorkerMetrics, WorkerSettings};
use mimir_domain::{MimirResult, Task, TaskResult};
use mimir_plugin::Registry;
use mimir_queue::Broker;
use mimir_storage::Store;
use tokio::sync::Semaphore;

use crate::dispatch::dispatch;
use crate::state::{worker_id, WorkerState};

/// How often the worker logs a metrics snapshot while idle or busy.
const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(30);

pub struct Worker {
    worker_id: String,
    broker: Broker,
    registry: Arc<Registry>,
    store: Arc<Store>,
    concurrency: Arc<Semaphore>,
    capacity: u32,
    grace_period: Duration,
    shutdown: ShutdownCoordinator,
    dequeue_timeout: Duration,
    metrics: Arc<WorkerMetrics>,
}

impl Worker {
    /// `starting -> connecting -> ready`: opens the broker connection and
    /// the database, assigns the worker id. Plugin registration is the
    /// caller's responsibility (it owns which plugins exist), passed in
    /// already populated.
    pub async fn bootstrap(settings: &WorkerSettings, registry: Registry, shutdown: ShutdownCoordinator) -> MimirResult<Self> {
        tracing::info!(state = WorkerState::Connecting.as_str(), "connecting to broker");
        let broker = Broker::connect(&settings.redis_url).await?;

        let store = Store::open(&settings.db_path).await?;

        let metrics = WorkerMetrics::new().map_err(|e| mimir_domain::MimirError::internal(e.to_string()))?;

        let id = worker_id();
        tracing::info!(state = WorkerState::Ready.as_str(), worker_id = %id, concurrency = settings.worker_concurrency, "worker ready");

        Ok(Self {
            worker_id: id,
            broker,
            registry: Arc::new(registry),
            store: Arc::new(store),
            concurrency: Arc::new(Semaphore::new(settings.worker_concurrency)),
            capacity: settings.worker_concurrency as u32,
            grace_period: Duration::from_secs(settings.shutdown_grace_secs),
            shutdown,
            dequeue_timeout: Duration::from_secs(mimir_queue::DEFAULT_DEQUEUE_TIMEOUT_SECS),
            metrics: Arc::new(metrics),
        })
    }

    /// Runs until `shutdown.initiate_shutdown()` is called (by the signal
    /// handler in `main`) and every in-flight task has finished.
    pub async fn run(self) {
        let Worker { worker_id, broker, registry, store, concurrency, capacity, grace_period, shutdown, dequeue_timeout, metrics } = self;

        let metrics_ticker = {
            let metrics = metrics.clone();
            let scope = shutdown.scope();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(METRICS_LOG_INTERVAL);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let snapshot = metrics.snapshot();
                            tracing::info!(
                                tasks_processed_total = snapshot.tasks_processed_total,
                                inflight_tasks = snapshot.inflight_tasks,
                                "metrics snapshot"
                            );
                        }
                        _ = scope.cancelled() => break,
                    }
                }
            })
        };

        loop {
            if shutdown.is_shutting_down() {
                tracing::info!(state = WorkerState::Draining.as_str(), "no longer accepting new tasks");
                break;
            }

            let permit = match concurrency.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let task = tokio::select! {
                result = broker.dequeue(dequeue_timeout) => result,
                _ = shutdown.scope().cancelled() => {
                    drop(permit);
                    continue;
                }
            };

            let task = match task {
                Ok(Some(task)) => task,
                Ok(None) => {
                    drop(permit);
                    continue;
                }
                Err(err) => {
                    tracing::error!(error = %err, "dequeue failed");
                    drop(permit);
                    continue;
                }
            };

            let broker = broker.clone();
            let registry = registry.clone();
            let worker_id = worker_id.clone();
            let worker_scope = shutdown.scope();
            let task_metrics = metrics.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let result = run_task_catching_panics(&task, &registry, &broker, &worker_scope, &worker_id, &task_metrics).await;
                if let Err(err) = broker.publish_result(&result).await {
                    tracing::error!(task_id = %task.id, error = %err, "failed to publish task result");
                }
            });
        }

        match tokio::time::timeout(grace_period, concurrency.acquire_many(capacity)).await {
            Ok(Ok(_permits)) => tracing::info!("all in-flight tasks drained before shutdown"),
            _ => tracing::warn!(grace_period_secs = grace_period.as_secs(), "grace period expired with tasks still in flight"),
        }

        metrics_ticker.abort();
        let _ = store.health().await;
        shutdown.mark_complete();
        tracing::info!(state = WorkerState::Stopped.as_str(), "worker stopped");
    }
}

/// Builds a scope private to this task that is cancelled either by the
/// worker-wide shutdown scope or by an orchestrator publishing on
/// `mimir:cancel:<task_id>`, runs the task, then tears both listeners down.
async fn run_task_catching_panics(
    task: &Task,
    registry: &Registry,
    broker: &Broker,
    worker_scope: &CancellationScope,
    worker_id: &str,
    metrics: &WorkerMetrics,
) -> TaskResult {
    let start = Instant::now();
    metrics.task_started();
    let task_scope = CancellationScope::new();

    let subscription = {
        let cancel_scope = task_scope.clone();
        broker.subscribe_cancel(&task.id.to_string(), move || cancel_scope.cancel()).await
    };
    if let Err(err) = &subscription {
        tracing::warn!(task_id = %task.id, error = %err, "could not subscribe to per-task cancellation, relying on worker shutdown only");
    }

    let shutdown_watcher = {
        let watched = worker_scope.clone();
        let cancel_scope = task_scope.clone();
        tokio::spawn(async move {
            watched.cancelled().await;
            cancel_scope.cancel();
        })
    };

    let outcome = AssertUnwindSafe(dispatch(task, registry, &task_scope, worker_id)).catch_unwind().await;
    let elapsed = start.elapsed();
    metrics.task_finished(elapsed);

    shutdown_watcher.abort();
    drop(subscription);

    let result = match outcome {
        Ok(result) => result,
        Err(_) => TaskResult::failure(task.id, worker_id, None, "task execution panicked"),
    };

    tracing::info!(task_id = %task.id, success = result.success, elapsed_ms = elapsed.as_millis(), "task finished");
    result
}
