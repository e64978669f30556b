// Session coordinator: starts calibration/training/detection on the BCI server and
// drives the single poll loop that turns server state into observer callbacks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::observers::Observers;
use super::poller::{PollSlot, PollState};
use super::snapshot::{
    PollSnapshot, SessionKind, TrainingStarted, CALIBRATION_STATUS_PATH, DETECTION_STOP_PATH,
    STATUS_PATH, SYSTEM_INITIALIZE_PATH, SYSTEM_SHUTDOWN_PATH, TRAINING_TRIAL_START_PATH,
};
use super::stats::{PollStats, PollStatsSnapshot};
use crate::config::{ClientConfig, PollErrorPolicy};
use crate::error::StatusError;
use crate::source::http_source::HttpTransport;
use crate::source::traits::BciTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Continue,
    Stop,
}

struct Inner {
    transport: Arc<dyn BciTransport>,
    config: ClientConfig,
    observers: Observers,
    slot: PollSlot,
    stats: PollStats,
}

/// Owns the relationship with one BCI server. At most one poll loop is live at any time;
/// starting a session of any kind replaces the previous loop.
///
/// Remote failures never escape as panics or errors except from
/// [`SessionCoordinator::get_calibration_status`]; everything else degrades to
/// `false` / `None` plus a log line.
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl SessionCoordinator {
    pub fn new(transport: Arc<dyn BciTransport>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                observers: Observers::new(),
                slot: PollSlot::new(),
                stats: PollStats::new(),
            }),
        }
    }

    /// Build a coordinator talking HTTP to `config.base_url`.
    pub fn with_http(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.base_url)?);
        Ok(Self::new(transport, config))
    }

    /// Switch to another BCI server. Any live poll loop belongs to the old server and is
    /// cancelled; an invalid address leaves the current server in place.
    pub fn set_server_url(&self, url: &str) -> Result<()> {
        self.inner.transport.set_base_url(url)?;
        if let Some(kind) = self.inner.slot.cancel() {
            info!("poll loop {} cancelled by server change", kind);
        }
        Ok(())
    }

    /// Ask the server to bring the EEG hardware online. No retry on failure.
    pub async fn initialize(&self) -> bool {
        self.inner.post_ok(SYSTEM_INITIALIZE_PATH).await
    }

    /// Cancel any poll loop, then best-effort power down of the hardware.
    pub async fn shutdown(&self) {
        self.inner.slot.cancel();
        if !self.inner.post_ok(SYSTEM_SHUTDOWN_PATH).await {
            warn!("bci shutdown request failed, ignoring");
        }
    }

    pub async fn start_calibration(&self) -> bool {
        self.start_session(SessionKind::Calibration).await
    }

    pub async fn start_training(&self) -> bool {
        self.start_session(SessionKind::Training).await
    }

    pub async fn start_detection(&self) -> bool {
        self.start_session(SessionKind::Detection).await
    }

    /// Tell the server a training trial animation has begun.
    pub async fn notify_trial_start(&self) -> bool {
        self.inner.post_ok(TRAINING_TRIAL_START_PATH).await
    }

    /// Stop polling locally and tell the server to stop detecting.
    pub async fn stop_detection(&self) -> bool {
        self.stop_detection_polling();
        self.inner.post_ok(DETECTION_STOP_PATH).await
    }

    /// Cancel the local poll loop without notifying the server. Safe to call repeatedly.
    pub fn stop_detection_polling(&self) {
        if let Some(kind) = self.inner.slot.cancel() {
            info!("poll loop {} stopped by caller", kind);
        }
    }

    async fn start_session(&self, kind: SessionKind) -> bool {
        let resp = match self.inner.transport.post(kind.start_path()).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("start {} failed: {}", kind, e);
                return false;
            }
        };
        if !resp.is_success() {
            warn!("start {} rejected status={}", kind, resp.status);
            return false;
        }

        if kind == SessionKind::Training {
            match resp.json::<TrainingStarted>() {
                Ok(started) => info!("training started total_trials={}", started.total_trials),
                Err(e) => debug!("training start body not decoded: {}", e),
            }
        }

        self.start_polling(kind);
        true
    }

    fn start_polling(&self, kind: SessionKind) {
        let ticket = self.inner.slot.replace(kind);
        self.inner.stats.record_loop_started();

        let period = self.inner.config.poll_interval(kind);
        info!(
            "poll loop {} gen={} started period_ms={}",
            kind,
            ticket.generation,
            period.as_millis()
        );

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner
                .run_poll_loop(kind, ticket.generation, ticket.token, period)
                .await;
        });
    }

    /// General server status. `None` on any failure.
    pub async fn get_status(&self) -> Option<Value> {
        let resp = match self.inner.transport.get(STATUS_PATH).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("status query failed: {}", e);
                return None;
            }
        };
        if !resp.is_success() {
            warn!("status query rejected status={}", resp.status);
            return None;
        }
        match resp.json::<Value>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("status query: {}", e);
                None
            }
        }
    }

    /// Calibration status. Unlike [`Self::get_status`], failures are reported as errors.
    pub async fn get_calibration_status(&self) -> std::result::Result<Value, StatusError> {
        let resp = self
            .inner
            .transport
            .get(CALIBRATION_STATUS_PATH)
            .await
            .map_err(|e| StatusError::Transport(e.to_string()))?;
        if !resp.is_success() {
            return Err(StatusError::Http(resp.status));
        }
        resp.json::<Value>()
            .map_err(|e| StatusError::Decode(e.to_string()))
    }

    pub fn poll_state(&self) -> PollState {
        self.inner.slot.state()
    }

    pub fn poll_stats(&self) -> PollStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Called with `(true, confidence)` for every detection tick that reports a trigger.
    pub fn on_trigger<F>(&self, f: F)
    where
        F: Fn(bool, f64) + Send + Sync + 'static,
    {
        self.inner.observers.set_trigger(Arc::new(f));
    }

    /// Called with `(progress, status)` for every calibration tick.
    pub fn on_calibration_progress<F>(&self, f: F)
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        self.inner.observers.set_calibration(Arc::new(f));
    }

    /// Called with `(current_trial, total_trials)` for every training tick.
    pub fn on_training_progress<F>(&self, f: F)
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.inner.observers.set_training(Arc::new(f));
    }

    pub fn clear_observers(&self) {
        self.inner.observers.clear();
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        debug!("SessionCoordinator dropped, cancelling poll loop");
        self.inner.slot.cancel();
    }
}

impl Inner {
    async fn post_ok(&self, path: &str) -> bool {
        match self.transport.post(path).await {
            Ok(resp) if resp.is_success() => true,
            Ok(resp) => {
                warn!("POST {} rejected status={}", path, resp.status);
                false
            }
            Err(e) => {
                warn!("POST {} failed: {}", path, e);
                false
            }
        }
    }

    async fn run_poll_loop(
        &self,
        kind: SessionKind,
        generation: u64,
        token: CancellationToken,
        period: Duration,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if self.poll_once(kind, generation).await == TickOutcome::Stop {
                break;
            }
        }
        debug!("poll loop {} gen={} exited", kind, generation);
    }

    async fn poll_once(&self, kind: SessionKind, generation: u64) -> TickOutcome {
        self.stats.record_tick_sent();
        let result = self.transport.get(kind.poll_path()).await;

        // The request is not aborted on cancel; drop whatever arrives for a dead loop.
        if !self.slot.is_current(generation) {
            return self.discard_stale(kind, generation);
        }

        let resp = match result {
            Ok(resp) if resp.is_success() => resp,
            Ok(resp) => {
                self.stats.record_skipped();
                debug!("poll {} skipped status={}", kind, resp.status);
                return TickOutcome::Continue;
            }
            Err(e) => return self.tick_failed(kind, generation, e),
        };

        let snapshot = match PollSnapshot::decode(kind, &resp.body) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.tick_failed(kind, generation, e),
        };
        self.apply(kind, generation, &snapshot)
    }

    /// Re-check the generation and run the observer under the dispatch gate, so a cancel
    /// that returned before this point can never be followed by a callback.
    fn apply(&self, kind: SessionKind, generation: u64, snapshot: &PollSnapshot) -> TickOutcome {
        let _gate = self.slot.dispatch_gate();
        if !self.slot.is_current(generation) {
            return self.discard_stale(kind, generation);
        }

        self.stats.record_applied();
        self.dispatch(snapshot);

        if snapshot.is_terminal() {
            self.slot.cancel_if_current(generation);
            info!("poll loop {} gen={} finished", kind, generation);
            return TickOutcome::Stop;
        }
        TickOutcome::Continue
    }

    fn discard_stale(&self, kind: SessionKind, generation: u64) -> TickOutcome {
        self.stats.record_stale();
        debug!("poll {} gen={} response discarded (stale)", kind, generation);
        TickOutcome::Stop
    }

    fn tick_failed(&self, kind: SessionKind, generation: u64, err: anyhow::Error) -> TickOutcome {
        self.stats.record_error();
        match self.config.error_policy(kind) {
            PollErrorPolicy::Cancel => {
                warn!("poll {} gen={} failed, stopping: {}", kind, generation, err);
                self.slot.cancel_if_current(generation);
                TickOutcome::Stop
            }
            PollErrorPolicy::Continue => {
                if kind == SessionKind::Detection {
                    debug!("poll {} gen={} failed: {}", kind, generation, err);
                } else {
                    warn!("poll {} gen={} failed: {}", kind, generation, err);
                }
                TickOutcome::Continue
            }
        }
    }

    fn dispatch(&self, snapshot: &PollSnapshot) {
        match snapshot {
            PollSnapshot::Calibration(p) => self.observers.emit_calibration(p.progress, &p.status),
            PollSnapshot::Training(p) => {
                self.observers.emit_training(p.current_trial, p.total_trials)
            }
            PollSnapshot::Detection(p) => {
                if p.trigger {
                    self.observers.emit_trigger(true, p.confidence);
                }
            }
        }
    }
}
