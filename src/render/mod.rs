//! Rendering pipeline: cell grid and diffing.

pub mod buffer;
pub mod renderer;

pub use buffer::{Cell, GridBuffer};
pub use renderer::{CursorState, DiffRenderer, FrameStats};
