//! Error types for the terminal device boundary.
//!
//! Nothing inside the compositor or the layout solver fails; these errors only
//! surface from starting/stopping the terminal and from logging setup.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O error talking to the terminal device.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested mode needs an interactive terminal.
    #[error("not a terminal: {0}")]
    NotATerminal(&'static str),

    /// Installing a signal handler failed.
    #[error("failed to register signal handlers: {0}")]
    SignalRegistration(io::Error),

    /// A tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
