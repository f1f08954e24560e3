//! Single-flight fetch→upload state machine.
//!
//! All wake sources converge on [`Orchestrator::submit`]. At most one
//! pipeline runs at a time; triggers arriving mid-cycle collapse into a
//! single pending rerun that starts after the current cycle completes
//! (trailing-edge coalescing). Every cycle runs under an execution lease
//! and resolves its trigger's completion token exactly once.

use crate::error::{ErrorKind, SyncError};
use crate::lease::ExecutionGuard;
use crate::provider::{StepCounterProvider, StepsPayload, UploadSink};
use crate::publisher::{StatePublisher, SyncStatus};
use crate::trigger::{Trigger, TriggerSource, WakeOutcome};
use chrono::{DateTime, Local, NaiveTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::timeout;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn StepCounterProvider>,
    sink: Arc<dyn UploadSink>,
    publisher: Arc<StatePublisher>,
    guard: ExecutionGuard,
    flight: Mutex<Flight>,
}

/// Single-flight bookkeeping. Both fields are read and written only inside
/// one lock window with no await points, so submissions racing from
/// different tasks resolve atomically.
#[derive(Default)]
struct Flight {
    in_flight: bool,
    pending: Option<Trigger>,
}

/// How a pipeline run ended. Lease expiry is handled outside the pipeline,
/// by racing it against the window.
enum CycleEnd {
    Uploaded { steps: u64 },
    CounterFailed(SyncError),
    UploadFailed { steps: u64, err: SyncError },
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn StepCounterProvider>,
        sink: Arc<dyn UploadSink>,
        publisher: Arc<StatePublisher>,
        guard: ExecutionGuard,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                sink,
                publisher,
                guard,
                flight: Mutex::new(Flight::default()),
            }),
        }
    }

    /// Route a normalized trigger into the single-flight protocol.
    ///
    /// If no cycle is in flight, one starts immediately on the runtime.
    /// Otherwise the trigger becomes the pending rerun, displacing (and
    /// resolving `NoData`) any trigger already waiting there.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, trigger: Trigger) {
        let source = trigger.source;
        {
            let mut flight = self
                .inner
                .flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if flight.in_flight {
                if let Some(mut displaced) = flight.pending.replace(trigger) {
                    tracing::debug!(displaced = %displaced.source, by = %source, "pending rerun displaced");
                    displaced.resolve(WakeOutcome::NoData);
                } else {
                    tracing::debug!(source = %source, "cycle in flight; trigger coalesced");
                }
                return;
            }
            flight.in_flight = true;
        }
        tracing::debug!(source = %source, "starting sync cycle");
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.run(trigger).await });
    }

    pub fn publisher(&self) -> &Arc<StatePublisher> {
        &self.inner.publisher
    }
}

impl Inner {
    /// Run cycles until no rerun is pending, then leave the flight.
    async fn run(self: Arc<Self>, mut trigger: Trigger) {
        loop {
            self.run_cycle(trigger).await;
            let next = {
                let mut flight = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
                match flight.pending.take() {
                    Some(t) => Some(t),
                    None => {
                        flight.in_flight = false;
                        None
                    }
                }
            };
            match next {
                Some(t) => {
                    tracing::debug!(source = %t.source, "starting coalesced rerun");
                    trigger = t;
                }
                None => break,
            }
        }
    }

    async fn run_cycle(&self, trigger: Trigger) {
        let source = trigger.source;
        let mut lease = self.guard.acquire(trigger);
        self.publisher.set(|s| s.status = SyncStatus::InFlight);

        let end = match lease.window() {
            Some(window) => match timeout(window, self.pipeline(source)).await {
                Ok(end) => end,
                Err(_) => {
                    tracing::warn!(source = %source, ?window, "execution window exhausted; forcing completion");
                    self.publisher.publish(|s| {
                        s.status = SyncStatus::Failed;
                        s.last_error = Some(ErrorKind::LeaseExpired);
                    });
                    lease.release(WakeOutcome::Failed);
                    return;
                }
            },
            None => self.pipeline(source).await,
        };

        match end {
            CycleEnd::Uploaded { steps } => {
                self.publisher.publish(|s| {
                    s.status = SyncStatus::Succeeded;
                    s.last_step_count = Some(steps);
                    s.last_error = None;
                    s.last_success_by_source.insert(source, Utc::now());
                });
                lease.release(WakeOutcome::NewData);
                tracing::info!(source = %source, steps, "sync cycle completed");
            }
            CycleEnd::CounterFailed(err) => {
                // Transient read errors report "no data" so the platform
                // does not throttle future wakes.
                tracing::warn!(source = %source, error = %err, "step counter read failed");
                self.publisher.publish(|s| {
                    s.status = SyncStatus::Failed;
                    s.last_error = Some(ErrorKind::CounterUnavailable);
                });
                lease.release(WakeOutcome::NoData);
            }
            CycleEnd::UploadFailed { steps, err } => {
                let kind = err.kind().unwrap_or(ErrorKind::NetworkError);
                tracing::warn!(source = %source, steps, error = %err, "upload failed");
                self.publisher.publish(|s| {
                    s.status = SyncStatus::Failed;
                    // The read succeeded; keep the count for display.
                    s.last_step_count = Some(steps);
                    s.last_error = Some(kind);
                });
                lease.release(WakeOutcome::Failed);
            }
        }
    }

    /// Fetch since local midnight, then upload. No retries here; the next
    /// trigger of any source performs a fresh attempt.
    async fn pipeline(&self, source: TriggerSource) -> CycleEnd {
        let now_local = Local::now();
        let start = start_of_local_day(now_local).with_timezone(&Utc);
        let now = now_local.with_timezone(&Utc);

        let count = match self.provider.fetch(start, now).await {
            Ok(count) => count,
            Err(err) => return CycleEnd::CounterFailed(err),
        };

        let payload = StepsPayload::new(count);
        let steps = payload.steps;
        tracing::debug!(source = %source, steps, "uploading step count");
        match self.sink.send(payload).await {
            Ok(()) => CycleEnd::Uploaded { steps },
            Err(err) => CycleEnd::UploadFailed { steps, err },
        }
    }
}

fn start_of_local_day(now: DateTime<Local>) -> DateTime<Local> {
    // `single()` is None only across a DST fold at midnight; falling back
    // to `now` degrades to an empty window rather than failing the cycle.
    now.with_time(NaiveTime::MIN).single().unwrap_or(now)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn start_of_local_day_is_midnight() {
        let now = Local::now();
        let start = start_of_local_day(now);
        assert!(start <= now);
        assert_eq!(start.hour(), 0);
        assert_eq!(start.minute(), 0);
        assert_eq!(start.second(), 0);
        assert_eq!(start.date_naive(), now.date_naive());
    }
}
