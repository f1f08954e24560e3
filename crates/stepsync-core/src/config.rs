use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for the sync pipeline. Loaded from the environment
/// or deserialized directly; the transport credential is static and supplied
/// out of band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Collector endpoint for step-count uploads.
    pub api_url: String,
    /// Static credential sent in the `api-secret` header.
    pub api_secret: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_window_secs")]
    pub background_window_secs: u64,
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    900
}

fn default_window_secs() -> u64 {
    25
}

fn default_upload_timeout_secs() -> u64 {
    10
}

impl SyncConfig {
    /// Load from `STEPSYNC_*` environment variables and validate.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("STEPSYNC_API_URL")
            .map_err(|_| SyncError::MissingConfig("STEPSYNC_API_URL"))?;
        let api_secret = std::env::var("STEPSYNC_API_SECRET")
            .map_err(|_| SyncError::MissingConfig("STEPSYNC_API_SECRET"))?;
        let config = Self {
            api_url,
            api_secret,
            interval_secs: env_secs("STEPSYNC_INTERVAL_SECS", default_interval_secs())?,
            background_window_secs: env_secs("STEPSYNC_WINDOW_SECS", default_window_secs())?,
            upload_timeout_secs: env_secs(
                "STEPSYNC_UPLOAD_TIMEOUT_SECS",
                default_upload_timeout_secs(),
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(SyncError::MissingConfig("STEPSYNC_API_URL"));
        }
        if self.api_secret.is_empty() {
            return Err(SyncError::MissingConfig("STEPSYNC_API_SECRET"));
        }
        if self.interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "interval_secs must be positive".into(),
            ));
        }
        // Guard expiry must stay a safety net, never the normal failure path.
        if self.upload_timeout_secs >= self.background_window_secs {
            return Err(SyncError::InvalidConfig(format!(
                "upload_timeout_secs ({}) must be strictly shorter than background_window_secs ({})",
                self.upload_timeout_secs, self.background_window_secs
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn background_window(&self) -> Duration {
        Duration::from_secs(self.background_window_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

fn env_secs(key: &'static str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| SyncError::InvalidConfig(format!("{key} must be an integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
