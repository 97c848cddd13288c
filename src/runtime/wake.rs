//! Hand-off queue between terminal threads and the compositor's owner thread.
//!
//! Terminal callbacks run on reader/signal threads; they only enqueue here. All
//! buffer mutation happens on the thread that drains the queue.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct WakeState {
    pending_inputs: Vec<String>,
    pending_resize: bool,
    stop_requested: bool,
}

impl WakeState {
    fn has_work(&self) -> bool {
        self.stop_requested || self.pending_resize || !self.pending_inputs.is_empty()
    }
}

#[derive(Default)]
pub(crate) struct RuntimeWake {
    state: Mutex<WakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn lock(&self) -> MutexGuard<'_, WakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Block until work arrives. Returns `false` once a stop was requested.
    pub(crate) fn wait_for_event(&self) -> bool {
        let mut state = self.lock();
        while !state.has_work() {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        !state.stop_requested
    }

    /// Like `wait_for_event`, bounded by `timeout`.
    pub(crate) fn wait_for_event_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .cvar
            .wait_timeout_while(state, timeout, |state| !state.has_work())
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        !state.stop_requested
    }

    pub(crate) fn enqueue_input(&self, data: String) {
        let mut state = self.lock();
        state.pending_inputs.push(data);
        self.cvar.notify_one();
    }

    pub(crate) fn signal_resize(&self) {
        let mut state = self.lock();
        state.pending_resize = true;
        self.cvar.notify_one();
    }

    pub(crate) fn request_stop(&self) {
        let mut state = self.lock();
        state.stop_requested = true;
        self.cvar.notify_all();
    }

    pub(crate) fn reset_for_start(&self) {
        let mut state = self.lock();
        *state = WakeState::default();
    }

    pub(crate) fn drain_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().pending_inputs)
    }

    pub(crate) fn take_pending_resize(&self) -> bool {
        std::mem::take(&mut self.lock().pending_resize)
    }
}
