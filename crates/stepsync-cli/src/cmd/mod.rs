pub mod run;
pub mod sync;

use crate::counter::FileStepProvider;
use crate::http::HttpUploadSink;
use std::path::Path;
use std::sync::Arc;
use stepsync_core::{ExecutionGuard, Orchestrator, StatePublisher, SyncConfig};

/// Wire the orchestrator to the real collaborators.
pub(crate) fn build_orchestrator(
    config: &SyncConfig,
    counter_file: &Path,
) -> stepsync_core::Result<(Arc<Orchestrator>, Arc<StatePublisher>)> {
    let provider = Arc::new(FileStepProvider::new(counter_file.to_path_buf()));
    let sink = Arc::new(HttpUploadSink::from_config(config)?);
    let publisher = Arc::new(StatePublisher::new());
    let orchestrator = Arc::new(Orchestrator::new(
        provider,
        sink,
        publisher.clone(),
        ExecutionGuard::new(config.background_window()),
    ));
    Ok((orchestrator, publisher))
}
