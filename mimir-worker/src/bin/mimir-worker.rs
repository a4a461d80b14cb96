// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Worker binary entry point: parse CLI/config, install logging, register
//! plugins, run until a signal is received or the grace period expires,
//! and map a fatal startup error to the matching exit code.

use std::time::Duration;

use mimir_bootstrap::{Cli, ExitCode, ShutdownCoordinator, WorkerSettings};
use mimir_plugin::Registry;
use mimir_worker::Worker;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse_args();

    let settings = match WorkerSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::ConfigError.into();
        }
    };

    mimir_bootstrap::init_tracing(settings.log_format());

    let registry = Registry::new();
    // Concrete plugins (CSV input, JSON output, AI model adapters, ...)
    // register themselves here before the worker starts popping tasks.

    let shutdown = ShutdownCoordinator::new(Duration::from_secs(settings.shutdown_grace_secs));

    let worker = match Worker::bootstrap(&settings, registry, shutdown.clone()).await {
        Ok(worker) => worker,
        Err(err) => {
            tracing::error!(error = %err, "worker failed to start");
            return ExitCode::BrokerUnavailable.into();
        }
    };

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_termination_signal().await;
        signal_shutdown.initiate_shutdown();
    });

    worker.run().await;

    ExitCode::Success.into()
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
