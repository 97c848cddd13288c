//! Terminal device trait.

use std::sync::Arc;

use crate::error::Result;

/// Cleanup callable from a signal or panic hook.
pub type EmergencyRestore = Arc<dyn Fn() + Send + Sync + 'static>;

/// Minimal terminal device interface used by the compositor.
pub trait Terminal {
    /// Start delivering input chunks and resize notifications.
    ///
    /// Handlers run on the terminal's own threads; they must only hand work off.
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> Result<()>;

    /// Stop input delivery and restore device state.
    fn stop(&mut self) -> Result<()>;

    /// Enter or leave raw input mode.
    ///
    /// Returns `Ok(false)` when the device does not support the mode (for example a
    /// redirected stdin); callers treat that as a no-op.
    fn set_raw_mode(&mut self, enabled: bool) -> Result<bool>;

    /// Drain pending input before exiting so late bytes don't leak to the shell.
    fn drain_input(&mut self, max_ms: u64, idle_ms: u64);

    /// Write output to the terminal.
    fn write(&mut self, data: &str);

    /// Terminal dimensions.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// Device-level restore that is safe to run from a crash hook.
    fn emergency_restore(&self) -> Option<EmergencyRestore> {
        None
    }
}
