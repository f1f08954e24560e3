use anyhow::Context;
use std::path::Path;
use stepsync_core::{CompletionToken, SyncConfig, SyncStatus, Trigger, TriggerSource};

pub fn run(counter_file: &Path, json: bool) -> anyhow::Result<()> {
    let config = SyncConfig::from_env().context("loading sync configuration")?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (orchestrator, publisher) = super::build_orchestrator(&config, counter_file)?;

        let (token, rx) = CompletionToken::channel();
        orchestrator.submit(Trigger::new(TriggerSource::Manual, token));
        let outcome = rx
            .await
            .context("sync cycle dropped its completion token")?;
        let state = publisher.snapshot();

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "outcome": outcome,
                    "status": state.status,
                    "steps": state.last_step_count,
                    "error": state.last_error,
                }))?
            );
        } else {
            match state.status {
                SyncStatus::Succeeded => {
                    println!("Synced {} steps", state.last_step_count.unwrap_or(0));
                }
                _ => println!(
                    "Sync failed: {}",
                    state
                        .last_error
                        .map(|kind| kind.to_string())
                        .unwrap_or_else(|| "unknown".into())
                ),
            }
        }

        if state.status == SyncStatus::Succeeded {
            Ok(())
        } else {
            anyhow::bail!("sync did not complete successfully")
        }
    })
}
