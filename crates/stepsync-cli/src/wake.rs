//! Wake-source plumbing: the pieces of the platform contract that decide
//! *when* the orchestrator runs. Each wake hands the orchestrator a fresh
//! completion token and logs the outcome the native scheduler would see.

use std::sync::Arc;
use std::time::Duration;
use stepsync_core::{CompletionToken, Orchestrator, Trigger, TriggerSource};
use tokio::task::JoinHandle;

/// Periodic scheduled wakes, mirroring the platform's background fetch
/// grant.
pub fn spawn_scheduled(orchestrator: Arc<Orchestrator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (token, rx) = CompletionToken::channel();
            orchestrator.submit(Trigger::new(TriggerSource::Scheduled, token));
            match rx.await {
                Ok(outcome) => tracing::info!(%outcome, "scheduled wake completed"),
                Err(_) => tracing::warn!("scheduled wake lost its completion token"),
            }
        }
    })
}

/// Observer wakes on SIGUSR1, standing in for the counter store's
/// change-notification callback.
#[cfg(unix)]
pub fn spawn_observer(orchestrator: Arc<Orchestrator>) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut wakes = signal(SignalKind::user_defined1())?;
    Ok(tokio::spawn(async move {
        while wakes.recv().await.is_some() {
            let (token, rx) = CompletionToken::channel();
            orchestrator.submit(Trigger::new(TriggerSource::Observer, token));
            match rx.await {
                Ok(outcome) => tracing::info!(%outcome, "observer wake completed"),
                Err(_) => tracing::warn!("observer wake lost its completion token"),
            }
        }
    }))
}

/// Accept silent-push payloads as JSON lines on a unix socket. Every line
/// goes through the normalizer; only silent wakes start a cycle.
#[cfg(unix)]
pub fn spawn_push_listener(
    orchestrator: Arc<Orchestrator>,
    path: &std::path::Path,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::UnixListener;

    // Stale socket from a previous run.
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)?;
    tracing::info!(socket = %path.display(), "listening for push payloads");

    Ok(tokio::spawn(async move {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "push socket accept failed");
                    continue;
                }
            };
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stream).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let payload: serde_json::Value = match serde_json::from_str(&line) {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::warn!(error = %e, "undecodable push payload");
                            continue;
                        }
                    };
                    let (token, rx) = CompletionToken::channel();
                    if let Some(trigger) = stepsync_core::normalize_push(&payload, token) {
                        orchestrator.submit(trigger);
                        match rx.await {
                            Ok(outcome) => tracing::info!(%outcome, "silent push completed"),
                            Err(_) => tracing::warn!("silent push lost its completion token"),
                        }
                    }
                }
            });
        }
    }))
}
