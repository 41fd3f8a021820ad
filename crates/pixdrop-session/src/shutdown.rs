// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the session loop and the HTTP server monitor.
//! In-flight ingests are drained before the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Returns a token cancelled on the first SIGINT or SIGTERM.
///
/// Cancelling the token yourself stops the listener task.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let listener = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            signal = shutdown_signal() => {
                info!(signal, "shutdown requested");
                listener.cancel();
            }
            _ = listener.cancelled() => debug!("signal listener stopped"),
        }
    });

    token
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                return tokio::select! {
                    _ = tokio::signal::ctrl_c() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                };
            }
            Err(e) => error!(error = %e, "SIGTERM handler unavailable, watching Ctrl+C only"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Waits up to `timeout` for every task spawned on `tasks` to finish.
///
/// Closes the tracker so the wait can complete once it is empty. Returns
/// `true` if all tasks completed in time.
pub async fn drain_tasks(tasks: &TaskTracker, timeout: Duration) -> bool {
    tasks.close();
    if tasks.is_empty() {
        return true;
    }

    info!(in_flight = tasks.len(), "draining ingests");
    let drained = tokio::time::timeout(timeout, tasks.wait()).await.is_ok();
    if !drained {
        warn!(abandoned = tasks.len(), ?timeout, "ingest drain timed out");
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_token_starts_live() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn drain_empty_tracker() {
        let tasks = TaskTracker::new();
        assert!(drain_tasks(&tasks, Duration::from_millis(10)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_running_tasks() {
        let tasks = TaskTracker::new();
        tasks.spawn(tokio::time::sleep(Duration::from_secs(1)));
        assert!(drain_tasks(&tasks, Duration::from_secs(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_after_timeout() {
        let tasks = TaskTracker::new();
        tasks.spawn(tokio::time::sleep(Duration::from_secs(60)));
        assert!(!drain_tasks(&tasks, Duration::from_secs(1)).await);
    }
}
