//! Cell-grid terminal compositor and box-model layout engine.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal, and each flush is one write.
//!
//! # Public API Overview
//! - Compose frames and route input through a [`Compositor`] over any [`Terminal`].
//! - Resolve widget trees into rectangles with [`compute_layout`].
//! - Decode SGR mouse reports and keypresses with [`parse_sgr_mouse`] / [`parse_keypress`].
//! - Configure from the environment with [`EnvConfig`] and send `tracing` output to a file
//!   with [`logging::init_from_env`].

#![allow(clippy::type_complexity)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod layout;
pub mod platform;
pub mod render;
pub mod runtime;

pub use crate::config::EnvConfig;
pub use crate::error::{Error, Result};

/// Geometry shared by layout and compositing.
pub use crate::core::geometry::Rect;
/// Input decoding.
pub use crate::core::input::{
    parse_keypress, parse_sgr_mouse, KeyEvent, MouseButton, MouseEvent, MouseKind,
};
pub use crate::core::width::{grapheme_width, line_width};
/// Escape-sequence commands and the output gate.
pub use crate::core::output::{OutputGate, TerminalCmd};
/// Terminal device interface and process-backed implementation.
pub use crate::core::terminal::Terminal;
pub use crate::platform::process_terminal::ProcessTerminal;
pub use crate::platform::InputScanner;

/// Layout engine.
pub use crate::layout::{
    compute_layout, Align, Arrangement, Axis, ComputedBox, DockEdge, Edges, FlexProps, GridProps,
    Justify, LayoutNode, LayoutProps, NodeKind, Spacing, StackProps,
};

/// Frame buffer and diff renderer.
pub use crate::render::{Cell, CursorState, DiffRenderer, FrameStats, GridBuffer};

/// Compositor runtime.
pub use crate::runtime::{
    ComponentHandle, ComponentId, ComponentRegistry, Compositor, CompositorOptions, Interactive,
    ResizeEvent, SubscriptionId, TerminalModes, VirtualCursor,
};
