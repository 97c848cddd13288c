//! Recursive box-model solver.

use tracing::trace;

use crate::core::geometry::Rect;
use crate::layout::auto_size::{margin_on, outer_size};
use crate::layout::flex;
use crate::layout::geometry::ComputedBox;
use crate::layout::node::{Arrangement, Axis, DockEdge, GridProps, LayoutNode, StackProps};

/// Lay out `node` and its subtree inside `parent_box`, the node's margin box.
///
/// Writes `computed` on every node of the subtree and returns the root's box.
pub fn compute_layout(node: &mut LayoutNode, parent_box: Rect) -> ComputedBox {
    let computed = ComputedBox::from_margin_box(
        parent_box,
        node.props.margin_edges(),
        node.props.border_thickness(),
        node.props.padding_edges(),
    );

    let content = computed.content_box;
    let slots = match &node.props.arrangement {
        Arrangement::Flex(props) => flex::arrange(props, &node.children, content),
        Arrangement::Grid(props) => grid_slots(props, node.children.len(), content),
        Arrangement::Stack(props) => stack_slots(props, &node.children, content),
        Arrangement::Dock => dock_slots(&node.children, content),
        Arrangement::Absolute => absolute_slots(&node.children, content),
    };
    trace!(kind = ?node.kind, ?content, children = slots.len(), "layout");

    for (child, slot) in node.children.iter_mut().zip(slots) {
        compute_layout(child, slot);
    }

    node.computed = Some(computed);
    computed
}

/// Track offsets and lengths for `count` tracks over `size` cells.
fn tracks(size: i32, count: usize, gap: i32) -> Vec<(i32, i32)> {
    let n = i32::try_from(count).unwrap_or(i32::MAX);
    let gap = gap.max(0);
    let available = (size - gap.saturating_mul(n - 1)).max(0);
    let base = available / n;
    let remainder = available % n;

    let mut offset: i32 = 0;
    (0..n)
        .map(|index| {
            let length = base + i32::from(index < remainder);
            let track = (offset, length);
            offset = offset.saturating_add(length).saturating_add(gap);
            track
        })
        .collect()
}

fn grid_slots(props: &GridProps, count: usize, content: Rect) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let columns = props.columns.unwrap_or(1).max(1);
    let rows = props.rows.unwrap_or_else(|| count.div_ceil(columns)).max(1);
    let column_tracks = tracks(content.width, columns, props.column_gap);
    let row_tracks = tracks(content.height, rows, props.row_gap);

    (0..count)
        .map(|index| {
            let (row, column) = (index / columns, index % columns);
            match (row_tracks.get(row), column_tracks.get(column)) {
                (Some(&(y, height)), Some(&(x, width))) => {
                    Rect::new(
                        content.x.saturating_add(x),
                        content.y.saturating_add(y),
                        width,
                        height,
                    )
                }
                _ => Rect::new(content.x, content.y, 0, 0),
            }
        })
        .collect()
}

fn stack_slots(props: &StackProps, children: &[LayoutNode], content: Rect) -> Vec<Rect> {
    let axis = props.direction;
    let cross = axis.cross();
    let gap = props.gap.max(0);
    let mut cursor = 0;

    children
        .iter()
        .map(|child| {
            let main = outer_size(child, axis);
            let cross_outer = match child.props.size(cross) {
                Some(size) => size.max(0).saturating_add(margin_on(child, cross)),
                None => match cross {
                    Axis::Horizontal => content.width,
                    Axis::Vertical => content.height,
                },
            };
            let slot = match axis {
                Axis::Vertical => {
                    Rect::new(content.x, content.y.saturating_add(cursor), cross_outer, main)
                }
                Axis::Horizontal => {
                    Rect::new(content.x.saturating_add(cursor), content.y, main, cross_outer)
                }
            };
            cursor = cursor.saturating_add(main).saturating_add(gap);
            slot
        })
        .collect()
}

fn dock_slots(children: &[LayoutNode], content: Rect) -> Vec<Rect> {
    let mut remaining = content;
    let mut filled = false;
    let last = children.len().saturating_sub(1);

    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            if filled {
                return Rect::new(remaining.x, remaining.y, 0, 0);
            }
            let edge = child.props.dock;
            if edge == DockEdge::Fill || index == last {
                filled = true;
                return remaining;
            }

            let axis = match edge {
                DockEdge::Top | DockEdge::Bottom => Axis::Vertical,
                _ => Axis::Horizontal,
            };
            let available = match axis {
                Axis::Vertical => remaining.height,
                Axis::Horizontal => remaining.width,
            };
            let thickness = outer_size(child, axis).clamp(0, available);
            match edge {
                DockEdge::Top => {
                    let slot = Rect::new(remaining.x, remaining.y, remaining.width, thickness);
                    remaining = Rect::new(
                        remaining.x,
                        remaining.y.saturating_add(thickness),
                        remaining.width,
                        remaining.height - thickness,
                    );
                    slot
                }
                DockEdge::Bottom => {
                    remaining.height -= thickness;
                    Rect::new(remaining.x, remaining.bottom(), remaining.width, thickness)
                }
                DockEdge::Left => {
                    let slot = Rect::new(remaining.x, remaining.y, thickness, remaining.height);
                    remaining = Rect::new(
                        remaining.x.saturating_add(thickness),
                        remaining.y,
                        remaining.width - thickness,
                        remaining.height,
                    );
                    slot
                }
                DockEdge::Right => {
                    remaining.width -= thickness;
                    Rect::new(remaining.right(), remaining.y, thickness, remaining.height)
                }
                DockEdge::Fill => remaining,
            }
        })
        .collect()
}

fn absolute_slots(children: &[LayoutNode], content: Rect) -> Vec<Rect> {
    children
        .iter()
        .map(|child| {
            let (dx, dy) = child.props.offset;
            let width = child
                .props
                .width
                .map_or(content.width, |w| {
                    w.max(0).saturating_add(margin_on(child, Axis::Horizontal))
                });
            let height = child
                .props
                .height
                .map_or(content.height, |h| {
                    h.max(0).saturating_add(margin_on(child, Axis::Vertical))
                });
            Rect::new(
                content.x.saturating_add(dx),
                content.y.saturating_add(dy),
                width,
                height,
            )
        })
        .collect()
}
