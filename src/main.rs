//! EventMesh publisher sidecar.
//!
//! Accepts events from in-cluster workloads and forwards them to EventMesh.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────────┐
//!                    │                    PUBLISHER                           │
//!                    │                                                        │
//!   Workload         │  ┌──────────┐   ┌─────────┐   ┌──────────────────┐     │
//!   ─────────────────┼─▶│ receiver │──▶│ handler │──▶│ cloudevents /    │     │
//!                    │  │ (port)   │   │ (axum)  │   │ legacy pipeline  │     │
//!                    │  └──────────┘   └────┬────┘   └────────┬─────────┘     │
//!                    │                      │                 │               │
//!                    │                      ▼                 ▼               │
//!                    │              ┌──────────────┐   ┌──────────┐   ┌──────┐ │
//!                    │              │ subscribed   │   │  sender  │──▶│oauth │─┼──▶ EventMesh
//!                    │              │ (sub cache)  │   └──────────┘   └──────┘ │
//!                    │              └──────┬───────┘                          │
//!                    │                     │                                  │
//!   Kubernetes API ◀─┼─────────────────────┘  cluster (Application, Subscription)
//!                    │                                                        │
//!                    │  lifecycle::Commander wires everything and serves       │
//!                    │  until SIGTERM/SIGINT                                  │
//!                    └───────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use eventmesh_publisher::cluster::kubernetes::KubeConnector;
use eventmesh_publisher::config::{load_options, EnvSource};
use eventmesh_publisher::lifecycle::{signals, Commander, LifecycleContext};
use eventmesh_publisher::observability::metrics as exporter;
use eventmesh_publisher::observability::{init_logging, Collector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(&EnvSource::Process)?;
    init_logging(&options)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "eventmesh-publisher starting");

    let shutdown = signals::shutdown_context();
    start_metrics(&options.metrics_address, shutdown.clone());

    let mut commander = Commander::new(options, Collector::new(), Arc::new(KubeConnector));

    if let Err(e) = commander.init(&EnvSource::Process) {
        tracing::error!(error = %e, "Failed to initialize publisher");
        std::process::exit(1);
    }

    if let Err(e) = commander.start(shutdown.clone()).await {
        tracing::error!(error = %e, "Failed to start publisher");
        shutdown.cancel();
        std::process::exit(1);
    }

    shutdown.cancel();
    Ok(())
}

fn start_metrics(address: &str, ctx: LifecycleContext) {
    let addr: SocketAddr = match address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address");
            return;
        }
    };

    let handle = match exporter::install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics recorder");
            return;
        }
    };

    tokio::spawn(async move {
        if let Err(e) = exporter::serve_metrics(handle, addr, ctx).await {
            tracing::error!(error = %e, "Metrics server failed");
        }
    });
}
