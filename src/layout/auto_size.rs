//! Size estimates for nodes without an explicit size or flex weight.

use crate::core::width::line_width;
use crate::layout::node::{Axis, LayoutNode, NodeKind};

const SINGLE_LINE: i32 = 1;
const LIST_LIKE: i32 = 10;
const DEFAULT_BLOCK: i32 = 3;

/// Border-box size of `node` along `axis` when nothing was declared.
///
/// Block axis: 1 for single-line inputs, `lines + 1` for text, 10 for lists
/// and tables, 3 otherwise. Inline axis: the widest content line, falling back
/// to the block default. Padding and border are always added.
pub fn auto_size(node: &LayoutNode, axis: Axis) -> i32 {
    let base = match axis {
        Axis::Vertical => block_default(node),
        Axis::Horizontal => match node.content.as_deref() {
            Some(content) if !content.is_empty() => widest_line(content),
            _ => block_default(node),
        },
    };
    let padding = node.props.padding_edges();
    let padding = match axis {
        Axis::Horizontal => padding.horizontal(),
        Axis::Vertical => padding.vertical(),
    };
    base.saturating_add(padding)
        .saturating_add(node.props.border_thickness().saturating_mul(2))
}

/// Explicit size if declared, otherwise the auto size. Never negative.
pub fn resolved_size(node: &LayoutNode, axis: Axis) -> i32 {
    node.props
        .size(axis)
        .unwrap_or_else(|| auto_size(node, axis))
        .max(0)
}

/// Resolved size plus the node's margins on `axis`.
pub fn outer_size(node: &LayoutNode, axis: Axis) -> i32 {
    resolved_size(node, axis).saturating_add(margin_on(node, axis))
}

pub(crate) fn margin_on(node: &LayoutNode, axis: Axis) -> i32 {
    let margin = node.props.margin_edges();
    match axis {
        Axis::Horizontal => margin.horizontal(),
        Axis::Vertical => margin.vertical(),
    }
}

fn block_default(node: &LayoutNode) -> i32 {
    match node.kind {
        NodeKind::Input | NodeKind::Checkbox | NodeKind::Button => SINGLE_LINE,
        NodeKind::Text => line_count(node.content.as_deref()).saturating_add(1),
        NodeKind::List | NodeKind::Table => LIST_LIKE,
        NodeKind::Container | NodeKind::Custom(_) => DEFAULT_BLOCK,
    }
}

fn line_count(content: Option<&str>) -> i32 {
    match content {
        None | Some("") => 0,
        Some(content) => i32::try_from(content.split('\n').count()).unwrap_or(i32::MAX),
    }
}

fn widest_line(content: &str) -> i32 {
    content
        .split('\n')
        .map(|line| i32::try_from(line_width(line)).unwrap_or(i32::MAX))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{auto_size, outer_size, resolved_size};
    use crate::layout::node::{Axis, LayoutNode, NodeKind};

    #[test]
    fn block_axis_defaults_by_kind() {
        assert_eq!(auto_size(&LayoutNode::new(NodeKind::Input), Axis::Vertical), 1);
        assert_eq!(auto_size(&LayoutNode::new(NodeKind::Checkbox), Axis::Vertical), 1);
        assert_eq!(auto_size(&LayoutNode::new(NodeKind::Table), Axis::Vertical), 10);
        assert_eq!(auto_size(&LayoutNode::new(NodeKind::Container), Axis::Vertical), 3);
        assert_eq!(
            auto_size(&LayoutNode::new(NodeKind::Custom("gauge".into())), Axis::Vertical),
            3
        );
        assert_eq!(auto_size(&LayoutNode::text("a\nb\nc"), Axis::Vertical), 4);
        assert_eq!(auto_size(&LayoutNode::new(NodeKind::Text), Axis::Vertical), 1);
    }

    #[test]
    fn padding_and_border_are_added() {
        let node = LayoutNode::new(NodeKind::Button).padding(vec![1, 2]).border(true);
        assert_eq!(auto_size(&node, Axis::Vertical), 1 + 2 + 2);
        assert_eq!(auto_size(&node, Axis::Horizontal), 1 + 4 + 2);
    }

    #[test]
    fn inline_axis_measures_widest_line_in_columns() {
        let node = LayoutNode::text("ab\n日本語\nx");
        assert_eq!(auto_size(&node, Axis::Horizontal), 6);
    }

    #[test]
    fn explicit_size_wins_and_margins_add_outside() {
        let node = LayoutNode::new(NodeKind::List).height(4).margin(1);
        assert_eq!(resolved_size(&node, Axis::Vertical), 4);
        assert_eq!(outer_size(&node, Axis::Vertical), 6);
        assert_eq!(resolved_size(&LayoutNode::new(NodeKind::List).height(-2), Axis::Vertical), 0);
    }

    #[test]
    fn huge_sizes_saturate_instead_of_overflowing() {
        let node = LayoutNode::new(NodeKind::Container).height(i32::MAX).margin(1);
        assert_eq!(outer_size(&node, Axis::Vertical), i32::MAX);

        let padded = LayoutNode::new(NodeKind::Button).padding(i32::MAX).border(true);
        assert_eq!(auto_size(&padded, Axis::Horizontal), i32::MAX);
    }

    #[test]
    fn control_characters_do_not_widen_text() {
        let node = LayoutNode::text("a\tb\x1b\r");
        assert_eq!(auto_size(&node, Axis::Horizontal), 2);
    }
}
