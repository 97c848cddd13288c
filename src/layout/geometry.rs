//! Nested box derivation: margin → border → padding → content.

use crate::core::geometry::Rect;
use crate::layout::spacing::Edges;

/// Resolved boxes of one layout node.
///
/// `margin_box ⊇ border_box ⊇ padding_box ⊇ content_box`; sizes never go
/// negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputedBox {
    pub margin_box: Rect,
    pub border_box: Rect,
    pub padding_box: Rect,
    pub content_box: Rect,
}

impl ComputedBox {
    /// Derive from the slot a parent arrangement handed to the node.
    pub fn from_margin_box(margin_box: Rect, margin: Edges, border: i32, padding: Edges) -> Self {
        let border_box = shrink(margin_box, margin);
        let padding_box = shrink(border_box, Edges::uniform(border.max(0)));
        let content_box = shrink(padding_box, padding);
        Self {
            margin_box,
            border_box,
            padding_box,
            content_box,
        }
    }

    /// Derive from a known border box; the margin box grows outwards.
    pub fn from_border_box(border_box: Rect, margin: Edges, border: i32, padding: Edges) -> Self {
        let margin_box = expand(border_box, margin);
        let padding_box = shrink(border_box, Edges::uniform(border.max(0)));
        let content_box = shrink(padding_box, padding);
        Self {
            margin_box,
            border_box,
            padding_box,
            content_box,
        }
    }

    /// The node's own rectangle (its border box).
    pub fn rect(&self) -> Rect {
        self.border_box
    }
}

/// Inset `rect` by `edges`. An over-sized inset collapses to an empty rect that
/// stays inside the original bounds.
pub fn shrink(rect: Rect, edges: Edges) -> Rect {
    let x = rect.x.saturating_add(edges.left).min(rect.right());
    let y = rect.y.saturating_add(edges.top).min(rect.bottom());
    Rect::new(
        x,
        y,
        rect.width - edges.horizontal(),
        rect.height - edges.vertical(),
    )
}

pub fn expand(rect: Rect, edges: Edges) -> Rect {
    Rect::new(
        rect.x.saturating_sub(edges.left),
        rect.y.saturating_sub(edges.top),
        rect.width.saturating_add(edges.horizontal()),
        rect.height.saturating_add(edges.vertical()),
    )
}

/// Whether `inner` lies within `outer` (empty rects included).
pub fn encloses(outer: Rect, inner: Rect) -> bool {
    inner.x >= outer.x
        && inner.y >= outer.y
        && inner.right() <= outer.right()
        && inner.bottom() <= outer.bottom()
}
