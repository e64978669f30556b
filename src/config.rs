use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::engine::snapshot::SessionKind;

/// Default origin of the BCI bridge server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Calibration progress poll period (500 ms).
pub const CALIBRATION_POLL_INTERVAL_MS: u64 = 500;

/// Training progress poll period (1 s).
pub const TRAINING_POLL_INTERVAL_MS: u64 = 1000;

/// Detection poll period (200 ms).
pub const DETECTION_POLL_INTERVAL_MS: u64 = 200;

/// Log filter used when `RUST_LOG` is unset: verbose for this crate, quiet HTTP stack.
pub const DEFAULT_LOG_FILTER: &str = "info,bci_bridge_engine=debug,hyper=warn,reqwest=warn";

/// Status string the server reports while a calibration is still running.
pub const CALIBRATING_STATUS: &str = "calibrating";

/// What a poll loop does when a tick fails (transport error or malformed body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollErrorPolicy {
    /// Stop the loop on the first failed tick.
    Cancel,
    /// Log the failure and keep ticking.
    Continue,
}

/// Top-level configuration for the session coordinator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// HTTP origin of the BCI bridge server, e.g. `http://192.168.1.20:5000`.
    pub base_url: String,
    pub calibration_interval_ms: u64,
    pub training_interval_ms: u64,
    pub detection_interval_ms: u64,
    pub calibration_error_policy: PollErrorPolicy,
    pub training_error_policy: PollErrorPolicy,
    pub detection_error_policy: PollErrorPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            calibration_interval_ms: CALIBRATION_POLL_INTERVAL_MS,
            training_interval_ms: TRAINING_POLL_INTERVAL_MS,
            detection_interval_ms: DETECTION_POLL_INTERVAL_MS,
            calibration_error_policy: PollErrorPolicy::Cancel,
            training_error_policy: PollErrorPolicy::Continue,
            detection_error_policy: PollErrorPolicy::Continue,
        }
    }
}

impl ClientConfig {
    /// Build a default config pointing at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| anyhow!("invalid client config: {}", e))?;
        if config.base_url.trim().is_empty() {
            return Err(anyhow!("client config has an empty base_url"));
        }
        Ok(config)
    }

    /// Poll period for the given session kind.
    pub fn poll_interval(&self, kind: SessionKind) -> Duration {
        let ms = match kind {
            SessionKind::Calibration => self.calibration_interval_ms,
            SessionKind::Training => self.training_interval_ms,
            SessionKind::Detection => self.detection_interval_ms,
        };
        Duration::from_millis(ms.max(1))
    }

    /// Tick failure handling for the given session kind.
    pub fn error_policy(&self, kind: SessionKind) -> PollErrorPolicy {
        match kind {
            SessionKind::Calibration => self.calibration_error_policy,
            SessionKind::Training => self.training_error_policy,
            SessionKind::Detection => self.detection_error_policy,
        }
    }
}
