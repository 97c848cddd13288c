//! Box-model layout engine.
//!
//! [`compute_layout`] resolves a [`LayoutNode`] tree into nested boxes
//! (margin → border → padding → content) using flex, grid, stack, dock or
//! absolute arrangement.

pub mod auto_size;
pub mod flex;
pub mod geometry;
pub mod node;
pub mod solver;
pub mod spacing;

pub use geometry::ComputedBox;
pub use node::{
    Align, Arrangement, Axis, DockEdge, FlexProps, GridProps, Justify, LayoutNode, LayoutProps,
    NodeKind, StackProps,
};
pub use solver::compute_layout;
pub use spacing::{Edges, Spacing};
