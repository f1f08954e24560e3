use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Classification of a failed cycle, surfaced in [`crate::SyncState`].
///
/// Transient kinds (`CounterUnavailable`, `NetworkError`) resolve themselves
/// on the next trigger; the core never schedules retries of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The step counter could not be read (sensor or permission problem).
    CounterUnavailable,
    /// The upload could not reach the collector.
    NetworkError,
    /// The collector answered with a non-2xx status.
    UploadRejected,
    /// The cycle ran past its execution window and was forcibly completed.
    LeaseExpired,
    /// An inbound wake payload could not be classified; no cycle was started.
    MalformedTrigger,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::CounterUnavailable => "counter_unavailable",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::UploadRejected => "upload_rejected",
            ErrorKind::LeaseExpired => "lease_expired",
            ErrorKind::MalformedTrigger => "malformed_trigger",
        }
    }

    /// Transient kinds clear on the next successful cycle and are never
    /// surfaced to the user as hard failures.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::CounterUnavailable | ErrorKind::NetworkError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SyncError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("step counter unavailable: {0}")]
    CounterUnavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("upload rejected with status {status}: {body}")]
    UploadRejected { status: u16, body: String },

    #[error("malformed trigger: {0}")]
    MalformedTrigger(String),

    #[error("missing configuration: set {0}")]
    MissingConfig(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Map to the cycle-level taxonomy. Configuration errors have no kind;
    /// they never reach the orchestrator.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SyncError::CounterUnavailable(_) => Some(ErrorKind::CounterUnavailable),
            SyncError::Network(_) => Some(ErrorKind::NetworkError),
            SyncError::UploadRejected { .. } => Some(ErrorKind::UploadRejected),
            SyncError::MalformedTrigger(_) => Some(ErrorKind::MalformedTrigger),
            SyncError::MissingConfig(_) | SyncError::InvalidConfig(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mapping() {
        assert_eq!(
            SyncError::CounterUnavailable("no sensor".into()).kind(),
            Some(ErrorKind::CounterUnavailable)
        );
        assert_eq!(
            SyncError::UploadRejected {
                status: 403,
                body: "forbidden".into()
            }
            .kind(),
            Some(ErrorKind::UploadRejected)
        );
        assert_eq!(SyncError::MissingConfig("STEPSYNC_API_URL").kind(), None);
    }

    #[test]
    fn transient_kinds() {
        assert!(ErrorKind::CounterUnavailable.is_transient());
        assert!(ErrorKind::NetworkError.is_transient());
        assert!(!ErrorKind::UploadRejected.is_transient());
        assert!(!ErrorKind::LeaseExpired.is_transient());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::LeaseExpired).unwrap();
        assert_eq!(json, "\"lease_expired\"");
    }
}
