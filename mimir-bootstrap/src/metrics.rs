// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Metrics
//!
//! A small `prometheus` registry tracking task throughput, duration, and
//! in-flight count. There is no HTTP `/metrics` surface here — that's an
//! outer-surface concern out of scope for this crate — so readings are
//! logged periodically through `tracing` instead of scraped.

use std::sync::Arc;
use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(String),
}

/// Task throughput, duration, and concurrency gauges for one worker process.
#[derive(Clone)]
pub struct WorkerMetrics {
    registry: Arc<Registry>,
    tasks_processed_total: IntCounter,
    task_duration_seconds: Histogram,
    worker_inflight_tasks: IntGauge,
}

impl WorkerMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let tasks_processed_total = IntCounter::with_opts(
            Opts::new("mimir_tasks_processed_total", "Total number of tasks the worker has finished, success or failure").namespace("mimir"),
        )
        .map_err(|e| MetricsError::Registration(e.to_string()))?;

        let task_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("mimir_task_duration_seconds", "Wall-clock time spent executing one task")
                .namespace("mimir")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        )
        .map_err(|e| MetricsError::Registration(e.to_string()))?;

        let worker_inflight_tasks =
            IntGauge::with_opts(Opts::new("mimir_worker_inflight_tasks", "Number of tasks currently executing").namespace("mimir"))
                .map_err(|e| MetricsError::Registration(e.to_string()))?;

        registry.register(Box::new(tasks_processed_total.clone())).map_err(|e| MetricsError::Registration(e.to_string()))?;
        registry.register(Box::new(task_duration_seconds.clone())).map_err(|e| MetricsError::Registration(e.to_string()))?;
        registry.register(Box::new(worker_inflight_tasks.clone())).map_err(|e| MetricsError::Registration(e.to_string()))?;

        Ok(Self { registry: Arc::new(registry), tasks_processed_total, task_duration_seconds, worker_inflight_tasks })
    }

    pub fn task_started(&self) {
        self.worker_inflight_tasks.inc();
    }

    pub fn task_finished(&self, elapsed: Duration) {
        self.worker_inflight_tasks.dec();
        self.tasks_processed_total.inc();
        self.task_duration_seconds.observe(elapsed.as_secs_f64());
    }

    /// Renders the registry in the Prometheus text exposition format. Kept
    /// for callers that want the raw format (e.g. writing it to a file for
    /// an external scraper); periodic log lines use [`Self::snapshot`] instead.
    pub fn render(&self) -> Result<String, MetricsError> {
        let families = self.registry.gather();
        TextEncoder::new().encode_to_string(&families).map_err(|e| MetricsError::Registration(e.to_string()))
    }

    /// Current gauge/counter values, cheap to read and suited to a single
    /// structured `tracing` log line.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot { tasks_processed_total: self.tasks_processed_total.get(), inflight_tasks: self.worker_inflight_tasks.get() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub tasks_processed_total: u64,
    pub inflight_tasks: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_move_with_task_lifecycle() {
        let metrics = WorkerMetrics::new().unwrap();
        metrics.task_started();
        metrics.task_finished(Duration::from_millis(50));

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("mimir_tasks_processed_total 1"));
        assert!(rendered.contains("mimir_worker_inflight_tasks 0"));
    }
}
