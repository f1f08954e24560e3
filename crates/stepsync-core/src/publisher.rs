//! Sync state snapshots and fan-out.
//!
//! One logical [`SyncState`] instance, mutated only by the orchestrator.
//! Subscribers get a notification once per completed cycle, in completion
//! order; mid-cycle transitions are visible in snapshots but never
//! broadcast.

use crate::error::ErrorKind;
use crate::trigger::TriggerSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// SyncStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of the orchestrator.
///
/// Transitions: `Idle → InFlight → (Succeeded | Failed)`, with an
/// `InFlight → InFlight` self-loop for coalesced reruns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::InFlight => "in_flight",
            SyncStatus::Succeeded => "succeeded",
            SyncStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SyncState
// ---------------------------------------------------------------------------

/// Latest outcome of the sync pipeline. Lives for the process lifetime;
/// reset to `Idle` only at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncState {
    pub status: SyncStatus,
    pub last_step_count: Option<u64>,
    pub last_error: Option<ErrorKind>,
    pub last_success_by_source: HashMap<TriggerSource, DateTime<Utc>>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            last_step_count: None,
            last_error: None,
            last_success_by_source: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// StatePublisher
// ---------------------------------------------------------------------------

/// Holds the state and broadcasts completed-cycle snapshots.
pub struct StatePublisher {
    state: Mutex<SyncState>,
    tx: broadcast::Sender<SyncState>,
}

impl StatePublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(SyncState::default()),
            tx,
        }
    }

    /// Copy-on-read snapshot; callers never observe a partial update.
    pub fn snapshot(&self) -> SyncState {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to completed-cycle snapshots. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncState> {
        self.tx.subscribe()
    }

    /// Mutate without notifying. Mid-cycle transitions stay private.
    pub(crate) fn set(&self, f: impl FnOnce(&mut SyncState)) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state);
    }

    /// Mutate and broadcast the resulting snapshot to all subscribers.
    pub(crate) fn publish(&self, f: impl FnOnce(&mut SyncState)) {
        let snapshot = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            f(&mut state);
            state.clone()
        };
        // Send fails only when nobody is subscribed.
        let _ = self.tx.send(snapshot);
    }
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
