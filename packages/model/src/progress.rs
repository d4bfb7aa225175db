//! # Progress Handler
//!
//! Cooperative progress and cancellation reporting for background work.
//! Workers call [`ProgressHandler::tick`] from any thread and stop when it
//! returns `true`. Failures of the background side are reported here rather
//! than through [`ModelError`](arbor_common::ModelError).

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Receives the percentage done; returns whether the work should stop
pub type ProgressCallback = Box<dyn Fn(usize) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct ProgressState {
    max_ticks: usize,
    completed: usize,
    interrupted: bool,
    failure: Option<String>,
}

pub struct ProgressHandler {
    state: Mutex<ProgressState>,
    callback: Option<ProgressCallback>,
}

impl Default for ProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler {
    /// Handler without a callback; never interrupts on its own
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            callback: None,
        }
    }

    pub fn with_callback(callback: impl Fn(usize) -> bool + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            callback: Some(Box::new(callback)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of ticks the work will report
    pub fn set_max_ticks_count(&self, max_ticks: usize) {
        let mut state = self.lock();
        state.max_ticks = max_ticks;
        state.completed = 0;
    }

    /// Record `ticks` finished units; returns true when the work should stop
    pub fn tick(&self, ticks: usize) -> bool {
        let mut state = self.lock();
        state.completed = state.completed.saturating_add(ticks);
        let percentage = percentage_of(&state);
        if let Some(callback) = &self.callback {
            if callback(percentage) && !state.interrupted {
                debug!(percentage, "interrupt requested");
                state.interrupted = true;
            }
        }
        state.interrupted
    }

    /// Completed share of the work, 0 to 100
    pub fn percentage(&self) -> usize {
        percentage_of(&self.lock())
    }

    pub fn is_interrupted(&self) -> bool {
        self.lock().interrupted
    }

    /// Ask the worker to stop at its next tick
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
    }

    /// Report a failure of the background work
    pub fn report_failure(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(message = %message, "background work failed");
        let mut state = self.lock();
        state.failure = Some(message);
        state.interrupted = true;
    }

    pub fn failure(&self) -> Option<String> {
        self.lock().failure.clone()
    }

    /// Back to zero progress, no interrupt, no failure; keeps the maximum
    pub fn reset(&self) {
        let mut state = self.lock();
        let max_ticks = state.max_ticks;
        *state = ProgressState {
            max_ticks,
            ..ProgressState::default()
        };
    }
}

fn percentage_of(state: &ProgressState) -> usize {
    if state.max_ticks == 0 {
        return 0;
    }
    (state.completed.min(state.max_ticks) * 100) / state.max_ticks
}

impl fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressHandler")
            .field("state", &*self.lock())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
