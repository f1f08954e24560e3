//! `stepsync-core` — multi-source background synchronization orchestrator.
//!
//! Normalizes heterogeneous wake events (timer, silent push, data observer,
//! manual action) into one coordination protocol, enforces single-flight
//! execution of the fetch→upload pipeline, manages a bounded execution
//! lease per cycle, and publishes the latest outcome to subscribers.

pub mod config;
pub mod error;
pub mod lease;
pub mod orchestrator;
pub mod provider;
pub mod publisher;
pub mod trigger;

pub use config::SyncConfig;
pub use error::{ErrorKind, Result, SyncError};
pub use lease::{ExecutionGuard, ExecutionLease, DEFAULT_BACKGROUND_WINDOW};
pub use orchestrator::Orchestrator;
pub use provider::{StepCounterProvider, StepsPayload, UploadSink};
pub use publisher::{StatePublisher, SyncState, SyncStatus};
pub use trigger::{
    is_silent_wake, normalize_push, CompletionToken, Trigger, TriggerSource, WakeOutcome,
};
