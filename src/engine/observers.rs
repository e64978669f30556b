// Observer slots: one callback per event type, last registration wins.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

pub type TriggerCallback = Arc<dyn Fn(bool, f64) + Send + Sync>;
pub type CalibrationCallback = Arc<dyn Fn(u32, &str) + Send + Sync>;
pub type TrainingCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

#[derive(Default)]
pub struct Observers {
    trigger: RwLock<Option<TriggerCallback>>,
    calibration: RwLock<Option<CalibrationCallback>>,
    training: RwLock<Option<TrainingCallback>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_trigger(&self, cb: TriggerCallback) {
        if self.trigger.write().replace(cb).is_some() {
            debug!("trigger observer replaced");
        }
    }

    pub fn set_calibration(&self, cb: CalibrationCallback) {
        if self.calibration.write().replace(cb).is_some() {
            debug!("calibration observer replaced");
        }
    }

    pub fn set_training(&self, cb: TrainingCallback) {
        if self.training.write().replace(cb).is_some() {
            debug!("training observer replaced");
        }
    }

    pub fn clear(&self) {
        *self.trigger.write() = None;
        *self.calibration.write() = None;
        *self.training.write() = None;
    }

    // The callback is cloned out so the lock is not held while user code runs.

    pub fn emit_trigger(&self, trigger: bool, confidence: f64) {
        let cb = self.trigger.read().clone();
        if let Some(cb) = cb {
            cb(trigger, confidence);
        }
    }

    pub fn emit_calibration(&self, progress: u32, status: &str) {
        let cb = self.calibration.read().clone();
        if let Some(cb) = cb {
            cb(progress, status);
        }
    }

    pub fn emit_training(&self, current: u32, total: u32) {
        let cb = self.training.read().clone();
        if let Some(cb) = cb {
            cb(current, total);
        }
    }
}
