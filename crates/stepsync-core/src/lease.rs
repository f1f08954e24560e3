//! Background execution guard.
//!
//! Every orchestration cycle runs under an [`ExecutionLease`]: a bounded
//! window within which the cycle must finish and resolve its completion
//! token. Missing the native completion call makes the platform penalize
//! future scheduling for the process, so release is guaranteed on every
//! path — success, failure, expiry, even an accidental drop.

use crate::trigger::{CompletionToken, Trigger, TriggerSource, WakeOutcome};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Window granted to background wakes when none is configured explicitly.
/// Matches the ~30s the OS grants, minus headroom for the release itself.
pub const DEFAULT_BACKGROUND_WINDOW: Duration = Duration::from_secs(25);

// ---------------------------------------------------------------------------
// ExecutionGuard
// ---------------------------------------------------------------------------

/// Grants leases with a deadline derived from the trigger source.
#[derive(Debug, Clone)]
pub struct ExecutionGuard {
    background_window: Duration,
}

impl ExecutionGuard {
    pub fn new(background_window: Duration) -> Self {
        Self { background_window }
    }

    /// Consume a trigger and open a lease for its cycle. Background sources
    /// get the configured window; manual triggers get none.
    pub fn acquire(&self, trigger: Trigger) -> ExecutionLease {
        let window = trigger
            .source
            .is_background()
            .then_some(self.background_window);
        let (source, token) = trigger.into_parts();
        let lease = ExecutionLease {
            id: Uuid::new_v4(),
            source,
            acquired_at: Utc::now(),
            window,
            token,
            released: false,
        };
        tracing::debug!(lease = %lease.id, source = %source, window = ?window, "lease acquired");
        lease
    }
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// ExecutionLease
// ---------------------------------------------------------------------------

/// A single cycle's execution budget, created per cycle and destroyed on
/// release. `released` transitions false→true exactly once.
#[derive(Debug)]
pub struct ExecutionLease {
    pub id: Uuid,
    pub source: TriggerSource,
    pub acquired_at: DateTime<Utc>,
    window: Option<Duration>,
    token: CompletionToken,
    released: bool,
}

impl ExecutionLease {
    /// Time budget for the cycle; `None` means no hard deadline.
    pub fn window(&self) -> Option<Duration> {
        self.window
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Resolve the native completion and close the lease. Safe to call
    /// twice; only the first call reaches the native handler.
    pub fn release(&mut self, outcome: WakeOutcome) -> bool {
        if self.released {
            tracing::debug!(lease = %self.id, "release on an already-released lease");
            return false;
        }
        self.released = true;
        self.token.resolve(outcome);
        tracing::debug!(lease = %self.id, source = %self.source, outcome = %outcome, "lease released");
        true
    }
}

impl Drop for ExecutionLease {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(lease = %self.id, source = %self.source, "lease dropped without release; completing as failed");
            self.released = true;
            self.token.resolve(WakeOutcome::Failed);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
