// Wire types: session kinds, their endpoints, and the JSON payloads the server returns.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::config::CALIBRATING_STATUS;

pub const SYSTEM_INITIALIZE_PATH: &str = "/system/initialize";
pub const SYSTEM_SHUTDOWN_PATH: &str = "/system/shutdown";
pub const CALIBRATION_STATUS_PATH: &str = "/calibration/status";
pub const TRAINING_TRIAL_START_PATH: &str = "/training/trial_start";
pub const DETECTION_STOP_PATH: &str = "/detection/stop";
pub const STATUS_PATH: &str = "/status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Calibration,
    Training,
    Detection,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calibration => "calibration",
            Self::Training => "training",
            Self::Detection => "detection",
        }
    }

    /// POST endpoint that starts a session of this kind.
    pub fn start_path(&self) -> &'static str {
        match self {
            Self::Calibration => "/calibration/start",
            Self::Training => "/training/start",
            Self::Detection => "/detection/start",
        }
    }

    /// GET endpoint polled while a session of this kind is active.
    pub fn poll_path(&self) -> &'static str {
        match self {
            Self::Calibration => "/calibration/progress",
            Self::Training => "/training/progress",
            Self::Detection => "/detection/poll",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /calibration/progress`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalibrationProgress {
    pub progress: u32,
    pub status: String,
}

impl CalibrationProgress {
    /// Calibration is over once the server stops reporting the calibrating marker.
    pub fn is_finished(&self) -> bool {
        self.status != CALIBRATING_STATUS
    }
}

/// Body of `GET /training/progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrainingProgress {
    pub current_trial: u32,
    pub total_trials: u32,
}

impl TrainingProgress {
    pub fn is_finished(&self) -> bool {
        self.current_trial >= self.total_trials
    }
}

/// Body of `POST /training/start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrainingStarted {
    pub total_trials: u32,
}

/// Body of `GET /detection/poll`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionPoll {
    pub trigger: bool,
    pub confidence: f64,
    #[serde(default)]
    pub erd_values: HashMap<String, f64>,
    /// Server time (seconds since epoch) of the last trigger, if any.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Decoded result of one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollSnapshot {
    Calibration(CalibrationProgress),
    Training(TrainingProgress),
    Detection(DetectionPoll),
}

impl PollSnapshot {
    pub fn decode(kind: SessionKind, body: &str) -> Result<Self> {
        Ok(match kind {
            SessionKind::Calibration => Self::Calibration(serde_json::from_str(body)?),
            SessionKind::Training => Self::Training(serde_json::from_str(body)?),
            SessionKind::Detection => Self::Detection(serde_json::from_str(body)?),
        })
    }

    /// Whether this snapshot ends its poll loop. Detection never ends on its own.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Calibration(p) => p.is_finished(),
            Self::Training(p) => p.is_finished(),
            Self::Detection(_) => false,
        }
    }
}

/// Known shape of `GET /status`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BciStatus {
    pub status: String,
    pub baseline_progress: u32,
    pub training_progress: u32,
    pub current_trial: u32,
    pub total_trials: u32,
    pub trigger_detected: bool,
    pub last_trigger_time: Option<f64>,
    pub confidence: f64,
    pub erd_values: HashMap<String, f64>,
}

impl BciStatus {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}
