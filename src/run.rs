//! Application execution logic.
//!
//! This module contains the main async execution loop that watches a
//! reachability target and logs every status transition.

use thiserror::Error;
use tokio::signal;
use tokio::sync::broadcast;

use reachability::config::ValidatedConfig;
use reachability::probe::Target;
use reachability::{Reachability, ReachabilityError, StatusChange};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create the reachability handle.
    #[error("Failed to create reachability handle: {0}")]
    Handle(#[source] ReachabilityError),

    /// Failed to start the notifier.
    #[error("Failed to start notifier: {0}")]
    Notifier(#[source] ReachabilityError),

    /// The event channel closed unexpectedly.
    #[error("Notifier event channel closed unexpectedly")]
    ChannelClosed,
}

/// Executes the main watch loop.
///
/// This function:
/// 1. Creates the reachability handle for the configured target
/// 2. Subscribes to status change events
/// 3. Starts the notifier (hybrid or polling-only based on config)
/// 4. Logs every transition until a shutdown signal (Ctrl+C) arrives
///
/// # Errors
///
/// Returns an error if:
/// - The handle cannot be created for the configured target
/// - The platform listener fails to register (in hybrid mode)
/// - The event channel closes unexpectedly
///
/// # Coverage Note
///
/// Excluded from coverage: requires platform reachability APIs and a
/// real async runtime with signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let mut reachability = build_handle(&config).map_err(RunError::Handle)?;

    if config.poll_only {
        tracing::info!(
            "Polling-only mode enabled (interval: {}s)",
            config.poll_interval.as_secs()
        );
    } else {
        tracing::info!(
            "Hybrid mode enabled (platform events + polling every {}s)",
            config.poll_interval.as_secs()
        );
    }

    let mut events = reachability.subscribe();
    reachability.start_notifier().map_err(RunError::Notifier)?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                reachability.stop_notifier();
                return Ok(());
            }

            event = events.recv() => {
                match event {
                    Ok(change) => log_change(reachability.target(), &change),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!("Missed {missed} status change event(s)");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(RunError::ChannelClosed);
                    }
                }
            }
        }
    }
}

/// Builds the configured reachability handle.
fn build_handle(config: &ValidatedConfig) -> Result<Reachability, ReachabilityError> {
    let handle = match &config.target {
        Target::Host(host) => Reachability::host(host.clone()),
        Target::Address(address) => Reachability::with_address(*address),
        Target::DefaultRoute => Reachability::internet(),
    }?;

    Ok(handle
        .with_poll_interval(config.poll_interval)
        .with_poll_only(config.poll_only)
        .with_allow_cellular(config.allow_cellular))
}

/// Logs a single status transition.
fn log_change(target: &Target, change: &StatusChange) {
    tracing::info!(
        "{target}: {status} [{flags}]",
        status = change.status,
        flags = change.flags,
    );
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
