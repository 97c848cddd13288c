//! Core interfaces and types.

pub mod geometry;
pub mod input;
pub mod output;
pub mod terminal;
pub mod width;
