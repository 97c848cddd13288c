//! Environment configuration.

use std::env;

const DEFAULT_INPUT_TIMEOUT_MS: u64 = 10;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// File receiving `tracing` output.
    pub log_file: Option<String>,
    /// File receiving a copy of every byte written to the terminal.
    pub write_log: Option<String>,
    pub debug_redraw: bool,
    pub mouse: bool,
    pub alternate_screen: bool,
    /// How long the input scanner holds an incomplete escape tail.
    pub input_timeout_ms: u64,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            log_file: env_string_opt("CELLFRAME_LOG"),
            write_log: env_string_opt("CELLFRAME_WRITE_LOG"),
            debug_redraw: env_flag("CELLFRAME_DEBUG_REDRAW"),
            mouse: env_flag("CELLFRAME_MOUSE"),
            alternate_screen: env_flag("CELLFRAME_ALT_SCREEN"),
            input_timeout_ms: env_u64("CELLFRAME_INPUT_TIMEOUT_MS")
                .unwrap_or(DEFAULT_INPUT_TIMEOUT_MS),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            write_log: None,
            debug_redraw: false,
            mouse: false,
            alternate_screen: false,
            input_timeout_ms: DEFAULT_INPUT_TIMEOUT_MS,
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
