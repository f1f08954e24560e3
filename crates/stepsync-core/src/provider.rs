//! Collaborator seams: the step counter and the upload sink.
//!
//! Both are object-safe traits returning boxed futures so the orchestrator
//! can hold `Arc<dyn ...>` adapters. Retry and backoff belong to the
//! adapters, not the orchestrator.

use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;

// ---------------------------------------------------------------------------
// StepsPayload
// ---------------------------------------------------------------------------

/// Payload accepted by the remote collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepsPayload {
    /// Upload timestamp, RFC 3339.
    pub created_at: String,
    pub steps: u64,
}

impl StepsPayload {
    /// Build a payload for the current instant. Counts are rounded to the
    /// nearest integer and clamped at zero; fractional sensor values are
    /// never transmitted.
    pub fn new(count: f64) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339(),
            steps: count.max(0.0).round() as u64,
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Yields the cumulative activity count for a time window.
pub trait StepCounterProvider: Send + Sync {
    /// Cumulative count between `start` (local midnight) and `now`.
    /// Errors should carry the `CounterUnavailable` kind.
    fn fetch(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> BoxFuture<'_, Result<f64>>;
}

/// Accepts a step-count payload over a network call. Implementations carry
/// their own timeout, strictly shorter than the lease window, so guard
/// expiry stays a safety net.
pub trait UploadSink: Send + Sync {
    fn send(&self, payload: StepsPayload) -> BoxFuture<'_, Result<()>>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
