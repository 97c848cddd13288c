//! Platform-specific terminal integrations.

pub mod input_scanner;
pub mod process_terminal;

pub use input_scanner::InputScanner;
#[cfg(unix)]
pub use process_terminal::{install_signal_handlers, SignalHookGuard};
pub use process_terminal::{install_panic_hook, PanicHookGuard, ProcessTerminal};
