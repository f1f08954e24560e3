use crate::wake;
use anyhow::Context;
use std::path::Path;
use stepsync_core::SyncConfig;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

pub fn run(
    counter_file: &Path,
    push_socket: Option<&Path>,
    interval_override: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = SyncConfig::from_env().context("loading sync configuration")?;
    if let Some(secs) = interval_override {
        config.interval_secs = secs;
        config.validate().context("invalid interval override")?;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (orchestrator, publisher) = super::build_orchestrator(&config, counter_file)?;

        // The push token a real device would register with the collector.
        // Cached in memory only, for display.
        let device_token = uuid::Uuid::new_v4();
        tracing::info!(
            %device_token,
            interval_secs = config.interval_secs,
            counter_file = %counter_file.display(),
            "stepsync daemon starting"
        );

        let mut events = BroadcastStream::new(publisher.subscribe());
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    Ok(state) => tracing::info!(
                        status = %state.status,
                        steps = ?state.last_step_count,
                        error = ?state.last_error,
                        "sync state updated"
                    ),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "state subscriber lagged");
                    }
                }
            }
        });

        wake::spawn_scheduled(orchestrator.clone(), config.interval());
        #[cfg(unix)]
        {
            wake::spawn_observer(orchestrator.clone())
                .context("installing observer wake handler")?;
            if let Some(path) = push_socket {
                wake::spawn_push_listener(orchestrator.clone(), path)
                    .context("binding push socket")?;
            }
        }
        #[cfg(not(unix))]
        let _ = push_socket;

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        anyhow::Ok(())
    })
}
