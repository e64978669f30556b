use std::sync::Once;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{
    CALIBRATION_POLL_INTERVAL_MS, DEFAULT_BASE_URL, DEFAULT_LOG_FILTER,
    DETECTION_POLL_INTERVAL_MS, TRAINING_POLL_INTERVAL_MS,
};

static INIT_TRACING: Once = Once::new();

/// Build the log filter: `RUST_LOG` wins, otherwise [`DEFAULT_LOG_FILTER`].
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[flutter_rust_bridge::frb(init)]
pub fn init_app() {
    flutter_rust_bridge::setup_default_user_utils();

    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(log_filter())
            .with_target(true)
            .try_init();

        info!(
            "bci bridge engine {} ready default_server={} poll_ms calibration={} training={} detection={}",
            env!("CARGO_PKG_VERSION"),
            DEFAULT_BASE_URL,
            CALIBRATION_POLL_INTERVAL_MS,
            TRAINING_POLL_INTERVAL_MS,
            DETECTION_POLL_INTERVAL_MS
        );
    });
}
