//! OS signal handling.
//!
//! The first SIGTERM/SIGINT cancels the returned context so the publisher
//! drains and exits. A second one exits the process immediately.

use crate::lifecycle::LifecycleContext;

/// Create a context that is cancelled when the process receives a shutdown
/// signal. Must be called from within a Tokio runtime.
pub fn shutdown_context() -> LifecycleContext {
    let ctx = LifecycleContext::new();
    let trigger = ctx.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        trigger.cancel();

        wait_for_signal().await;
        tracing::warn!("Second shutdown signal received, exiting immediately");
        std::process::exit(1);
    });

    ctx
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler, falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
