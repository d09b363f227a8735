//! Shared timer cell watched by an external watchdog.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Timer value while the worker waits for work.
pub const TIMER_IDLE: f64 = -1.0;

/// Timer value after the worker decided to recycle itself.
pub const TIMER_RECYCLED: f64 = -2.0;

/// A numeric cell shared between a worker and its supervisor.
///
/// `-1` idle, `-2` recycled, `>= 0` the busy task's timeout budget in
/// seconds. The worker only maintains the value; enforcing the budget
/// (killing a hung worker) is the watchdog's job. Compound updates that
/// must be atomic to watchers go through [`SharedTimer::lock`].
#[derive(Clone, Debug, Default)]
pub struct SharedTimer {
    value: Arc<Mutex<f64>>,
}

impl SharedTimer {
    /// Create a timer in the idle state.
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(TIMER_IDLE)),
        }
    }

    /// Read the current value.
    pub fn value(&self) -> f64 {
        *self.lock()
    }

    /// Mark the worker idle.
    pub fn set_idle(&self) {
        *self.lock() = TIMER_IDLE;
    }

    /// Mark the worker busy with the given timeout budget. A missing budget
    /// writes the idle value, so the watchdog never fires for it.
    pub fn set_busy(&self, budget: Option<Duration>) {
        *self.lock() = budget.map(|d| d.as_secs_f64()).unwrap_or(TIMER_IDLE);
    }

    /// Mark the worker recycled.
    pub fn set_recycled(&self) {
        *self.lock() = TIMER_RECYCLED;
    }

    /// Lock the cell for a compound update.
    ///
    /// The value is a plain number, so a poisoned lock cannot hold a
    /// torn write; poisoning is absorbed.
    pub fn lock(&self) -> MutexGuard<'_, f64> {
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}
