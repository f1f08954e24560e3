//! Wake-event normalization.
//!
//! Four native callback shapes (periodic timer, silent push, data observer,
//! manual action) are collapsed into one [`Trigger`] value before they reach
//! the orchestrator. Each trigger carries a [`CompletionToken`] standing in
//! for the platform's completion handler; the execution guard resolves it
//! exactly once per trigger.

use crate::error::{ErrorKind, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

// ---------------------------------------------------------------------------
// TriggerSource
// ---------------------------------------------------------------------------

/// Which wake-up path produced a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// User pressed the sync button; runs in the foreground.
    Manual,
    /// Periodic background fetch granted by the OS.
    Scheduled,
    /// Server-sent silent wake signal.
    SilentPush,
    /// Data-observer callback from the counter store.
    Observer,
}

impl TriggerSource {
    pub fn all() -> &'static [TriggerSource] {
        &[
            TriggerSource::Manual,
            TriggerSource::Scheduled,
            TriggerSource::SilentPush,
            TriggerSource::Observer,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Manual => "manual",
            TriggerSource::Scheduled => "scheduled",
            TriggerSource::SilentPush => "silent_push",
            TriggerSource::Observer => "observer",
        }
    }

    /// Background sources run under a bounded OS execution window. Manual
    /// triggers run under the foreground UI and have no hard deadline, but
    /// still release their lease promptly to keep bookkeeping consistent.
    pub fn is_background(self) -> bool {
        !matches!(self, TriggerSource::Manual)
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerSource {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(TriggerSource::Manual),
            "scheduled" => Ok(TriggerSource::Scheduled),
            "silent_push" => Ok(TriggerSource::SilentPush),
            "observer" => Ok(TriggerSource::Observer),
            _ => Err(SyncError::MalformedTrigger(format!(
                "unknown trigger source '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// WakeOutcome
// ---------------------------------------------------------------------------

/// What a completed cycle reports back to the native scheduler.
///
/// The three values cover every per-source completion contract:
///
/// | outcome   | scheduled fetch | silent push     | observer    | manual        |
/// |-----------|-----------------|-----------------|-------------|---------------|
/// | `NewData` | result: new data| result: new data| completed   | success alert |
/// | `NoData`  | result: no data | result: no data | completed   | retry prompt  |
/// | `Failed`  | result: failed  | result: failed  | completed   | error alert   |
///
/// Reporting `Failed` makes the platform reduce future wake frequency, so
/// transient counter errors report `NoData` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeOutcome {
    NewData,
    NoData,
    Failed,
}

impl WakeOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            WakeOutcome::NewData => "new_data",
            WakeOutcome::NoData => "no_data",
            WakeOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for WakeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompletionToken
// ---------------------------------------------------------------------------

/// Opaque stand-in for a native completion handler.
///
/// Resolution is structurally at-most-once: the underlying sender is consumed
/// on the first call and later calls are no-ops.
#[derive(Debug)]
pub struct CompletionToken {
    tx: Option<oneshot::Sender<WakeOutcome>>,
}

impl CompletionToken {
    /// A token paired with a receiver for the eventual outcome.
    pub fn channel() -> (Self, oneshot::Receiver<WakeOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A token with nobody listening. Useful when the wake source does not
    /// care about the outcome.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// Deliver the outcome to the native handler. Returns `true` only for
    /// the call that actually delivered.
    pub(crate) fn resolve(&mut self, outcome: WakeOutcome) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// A normalized wake event. One instance per native callback invocation;
/// immutable once created and consumed by exactly one orchestration cycle.
#[derive(Debug)]
pub struct Trigger {
    pub source: TriggerSource,
    pub received_at: DateTime<Utc>,
    token: CompletionToken,
}

impl Trigger {
    pub fn new(source: TriggerSource, token: CompletionToken) -> Self {
        Self {
            source,
            received_at: Utc::now(),
            token,
        }
    }

    /// Resolve the native completion without running a cycle. Used when a
    /// pending trigger is displaced by a later one.
    pub(crate) fn resolve(&mut self, outcome: WakeOutcome) {
        self.token.resolve(outcome);
    }

    pub(crate) fn into_parts(self) -> (TriggerSource, CompletionToken) {
        (self.source, self.token)
    }
}

// ---------------------------------------------------------------------------
// Silent-wake detection
// ---------------------------------------------------------------------------

/// Classify an inbound push payload as a silent wake.
///
/// Truth table:
///
/// | payload                        | silent |
/// |--------------------------------|--------|
/// | `{"content-available": 1}`     | yes    |
/// | `{"content-available": 0}`     | no     |
/// | `{"content-available": "1"}`   | no     |
/// | key missing                    | no     |
/// | non-object payload             | no     |
///
/// Ambiguous payloads default to "not silent" rather than waking the
/// pipeline speculatively.
pub fn is_silent_wake(payload: &serde_json::Value) -> bool {
    payload
        .get("content-available")
        .and_then(serde_json::Value::as_i64)
        == Some(1)
}

/// Normalize an inbound push payload into a trigger.
///
/// Never fails. Non-object payloads are logged as malformed and ignored;
/// valid payloads without the silent marker are left to normal notification
/// handling. In both cases the token is resolved `NoData` so the native
/// contract is still honored.
pub fn normalize_push(payload: &serde_json::Value, token: CompletionToken) -> Option<Trigger> {
    let mut token = token;
    if !payload.is_object() {
        tracing::warn!(kind = %ErrorKind::MalformedTrigger, "ignoring non-object push payload");
        token.resolve(WakeOutcome::NoData);
        return None;
    }
    if !is_silent_wake(payload) {
        tracing::debug!("push payload is not a silent wake; ignoring");
        token.resolve(WakeOutcome::NoData);
        return None;
    }
    Some(Trigger::new(TriggerSource::SilentPush, token))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
