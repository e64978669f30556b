use std::collections::VecDeque;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::engine::poller::PollState;
use crate::engine::session::SessionCoordinator;

/// Events buffered between two `drain_events` calls before the oldest are dropped.
const MAX_BUFFERED_EVENTS: usize = 256;

/// Observer callback output, queued for the Dart side.
#[derive(Debug, Clone, PartialEq)]
pub enum BciEvent {
    Trigger { confidence: f64 },
    CalibrationProgress { progress: u32, status: String },
    TrainingProgress { current_trial: u32, total_trials: u32 },
}

/// Poll loop counters.
#[derive(Debug, Clone)]
pub struct BciPollStats {
    pub loops_started: u64,
    pub ticks_sent: u64,
    pub snapshots_applied: u64,
    pub ticks_skipped: u64,
    pub tick_errors: u64,
    pub stale_discarded: u64,
}

struct EventBuffer {
    events: Mutex<VecDeque<BciEvent>>,
    capacity: usize,
}

impl EventBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    fn push(&self, event: BciEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    fn drain(&self) -> Vec<BciEvent> {
        self.events.lock().drain(..).collect()
    }
}

static COORDINATOR: OnceLock<SessionCoordinator> = OnceLock::new();
static EVENTS: OnceLock<EventBuffer> = OnceLock::new();

fn events() -> &'static EventBuffer {
    EVENTS.get_or_init(|| EventBuffer::new(MAX_BUFFERED_EVENTS))
}

fn coordinator() -> Option<&'static SessionCoordinator> {
    let coordinator = COORDINATOR.get();
    if coordinator.is_none() {
        warn!("bci coordinator used before init_coordinator");
    }
    coordinator
}

/// Create the process-wide coordinator. `config_json` may be empty for defaults.
pub fn init_coordinator(config_json: String) -> Result<()> {
    let config = if config_json.trim().is_empty() {
        ClientConfig::default()
    } else {
        ClientConfig::from_json(&config_json)?
    };
    let base_url = config.base_url.clone();
    let coordinator = SessionCoordinator::with_http(config)?;

    coordinator.on_trigger(|_, confidence| events().push(BciEvent::Trigger { confidence }));
    coordinator.on_calibration_progress(|progress, status| {
        events().push(BciEvent::CalibrationProgress {
            progress,
            status: status.to_string(),
        })
    });
    coordinator.on_training_progress(|current_trial, total_trials| {
        events().push(BciEvent::TrainingProgress {
            current_trial,
            total_trials,
        })
    });

    COORDINATOR
        .set(coordinator)
        .map_err(|_| anyhow!("bci coordinator already initialized"))?;
    info!("bci coordinator initialized base_url={}", base_url);
    Ok(())
}

/// Retarget the coordinator at another server, e.g. after the user edits the address.
/// Cancels any live poll loop; an invalid address is rejected and nothing changes.
pub async fn set_server_url(url: String) -> Result<()> {
    let c = coordinator().ok_or_else(|| anyhow!("bci coordinator not initialized"))?;
    c.set_server_url(&url)
}

pub async fn initialize_system() -> bool {
    match coordinator() {
        Some(c) => c.initialize().await,
        None => false,
    }
}

pub async fn shutdown_system() {
    if let Some(c) = coordinator() {
        c.shutdown().await;
    }
}

pub async fn start_calibration() -> bool {
    match coordinator() {
        Some(c) => c.start_calibration().await,
        None => false,
    }
}

pub async fn start_training() -> bool {
    match coordinator() {
        Some(c) => c.start_training().await,
        None => false,
    }
}

pub async fn notify_trial_start() -> bool {
    match coordinator() {
        Some(c) => c.notify_trial_start().await,
        None => false,
    }
}

pub async fn start_detection() -> bool {
    match coordinator() {
        Some(c) => c.start_detection().await,
        None => false,
    }
}

pub async fn stop_detection() -> bool {
    match coordinator() {
        Some(c) => c.stop_detection().await,
        None => false,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn stop_detection_polling() {
    if let Some(c) = coordinator() {
        c.stop_detection_polling();
    }
}

/// `/status` as a JSON string, or `None` when the server could not be reached.
pub async fn get_status() -> Option<String> {
    coordinator()?.get_status().await.map(|v| v.to_string())
}

/// `/calibration/status` as a JSON string. Fails on any transport or HTTP error.
pub async fn get_calibration_status() -> Result<String> {
    let c = coordinator().ok_or_else(|| anyhow!("bci coordinator not initialized"))?;
    let value = c.get_calibration_status().await?;
    Ok(value.to_string())
}

/// Kind of the live poll loop ("calibration", "training", "detection"), if any.
#[flutter_rust_bridge::frb(sync)]
pub fn active_session() -> Option<String> {
    match coordinator()?.poll_state() {
        PollState::Polling(kind) => Some(kind.as_str().to_string()),
        PollState::Idle => None,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn poll_stats() -> Option<BciPollStats> {
    let s = coordinator()?.poll_stats();
    Some(BciPollStats {
        loops_started: s.loops_started,
        ticks_sent: s.ticks_sent,
        snapshots_applied: s.snapshots_applied,
        ticks_skipped: s.ticks_skipped,
        tick_errors: s.tick_errors,
        stale_discarded: s.stale_discarded,
    })
}

/// Take every event produced since the last call, oldest first.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_events() -> Vec<BciEvent> {
    events().drain()
}
