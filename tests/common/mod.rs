// Fake BCI bridge server used by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct FakeBci {
    pub calls: Mutex<Vec<String>>,
    pub calibration_steps: Mutex<VecDeque<(u32, &'static str)>>,
    pub current_trial: Mutex<u32>,
    pub total_trials: u32,
    pub detection_polls: Mutex<u32>,
    /// When set, every session start endpoint answers with this status.
    pub reject_starts: Option<u16>,
}

pub type Shared = Arc<FakeBci>;

impl FakeBci {
    pub fn new(total_trials: u32) -> Self {
        Self {
            total_trials,
            ..Self::default()
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    fn start_reply(&self, body: Value) -> Response {
        match self.reject_starts {
            Some(code) => (
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST),
                Json(json!({"error": "System busy"})),
            )
                .into_response(),
            None => Json(body).into_response(),
        }
    }
}

async fn initialize(State(s): State<Shared>) -> Json<Value> {
    s.record("POST /system/initialize");
    Json(json!({"message": "System initialized successfully"}))
}

async fn shutdown(State(s): State<Shared>) -> Json<Value> {
    s.record("POST /system/shutdown");
    Json(json!({"message": "System shutdown"}))
}

async fn status(State(s): State<Shared>) -> Json<Value> {
    s.record("GET /status");
    Json(json!({
        "status": "idle",
        "baseline_progress": 0,
        "training_progress": 0,
        "current_trial": *s.current_trial.lock(),
        "total_trials": s.total_trials,
        "trigger_detected": false,
        "last_trigger_time": null,
        "confidence": 0.0,
        "erd_values": {}
    }))
}

async fn calibration_start(State(s): State<Shared>) -> Response {
    s.record("POST /calibration/start");
    s.start_reply(json!({"message": "Calibration started", "duration": 60}))
}

async fn calibration_progress(State(s): State<Shared>) -> Json<Value> {
    s.record("GET /calibration/progress");
    let (progress, status) = s
        .calibration_steps
        .lock()
        .pop_front()
        .unwrap_or((100, "idle"));
    Json(json!({"progress": progress, "status": status}))
}

async fn calibration_status(State(s): State<Shared>) -> Response {
    s.record("GET /calibration/status");
    (StatusCode::SERVICE_UNAVAILABLE, "calibration unavailable").into_response()
}

async fn training_start(State(s): State<Shared>) -> Response {
    s.record("POST /training/start");
    *s.current_trial.lock() = 0;
    s.start_reply(json!({"message": "Training started", "total_trials": s.total_trials}))
}

async fn training_progress(State(s): State<Shared>) -> Json<Value> {
    s.record("GET /training/progress");
    let mut current = s.current_trial.lock();
    *current = (*current + 1).min(s.total_trials);
    Json(json!({
        "current_trial": *current,
        "total_trials": s.total_trials,
        "status": "training"
    }))
}

async fn trial_start(State(s): State<Shared>) -> Json<Value> {
    s.record("POST /training/trial_start");
    Json(json!({"message": "Trigger received"}))
}

async fn detection_start(State(s): State<Shared>) -> Response {
    s.record("POST /detection/start");
    s.start_reply(json!({"message": "Detection started"}))
}

async fn detection_stop(State(s): State<Shared>) -> Json<Value> {
    s.record("POST /detection/stop");
    Json(json!({"message": "Detection stopped"}))
}

/// Every third poll reports a trigger.
async fn detection_poll(State(s): State<Shared>) -> Json<Value> {
    s.record("GET /detection/poll");
    let mut polls = s.detection_polls.lock();
    *polls += 1;
    let trigger = *polls % 3 == 0;
    let confidence = if trigger { 0.87 } else { 0.3 };
    let timestamp = if trigger { json!(1712345678.5) } else { Value::Null };
    Json(json!({
        "trigger": trigger,
        "confidence": confidence,
        "erd_values": {"c3": -0.42, "c4": -0.1},
        "timestamp": timestamp
    }))
}

pub async fn start_fake_bci(state: FakeBci) -> (SocketAddr, Shared) {
    let shared: Shared = Arc::new(state);
    let app = Router::new()
        .route("/system/initialize", post(initialize))
        .route("/system/shutdown", post(shutdown))
        .route("/status", get(status))
        .route("/calibration/start", post(calibration_start))
        .route("/calibration/progress", get(calibration_progress))
        .route("/calibration/status", get(calibration_status))
        .route("/training/start", post(training_start))
        .route("/training/progress", get(training_progress))
        .route("/training/trial_start", post(trial_start))
        .route("/detection/start", post(detection_start))
        .route("/detection/stop", post(detection_stop))
        .route("/detection/poll", get(detection_poll))
        .with_state(shared.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (addr, shared)
}

/// Wait until `cond` holds, giving up after `timeout`.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
