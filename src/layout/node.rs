//! Layout tree nodes and their props.

use crate::layout::geometry::ComputedBox;
use crate::layout::spacing::{Edges, Spacing};

/// Content classification used by auto-sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Text,
    Input,
    Checkbox,
    Button,
    List,
    Table,
    Custom(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Axis {
    /// Left to right (flex "row").
    Horizontal,
    /// Top to bottom (flex "column").
    #[default]
    Vertical,
}

impl Axis {
    pub fn cross(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Main-axis distribution of free space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Cross-axis placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DockEdge {
    Top,
    Bottom,
    Left,
    Right,
    #[default]
    Fill,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlexProps {
    pub direction: Axis,
    pub justify: Justify,
    pub align: Align,
    pub gap: i32,
}

impl FlexProps {
    pub fn row() -> Self {
        Self {
            direction: Axis::Horizontal,
            ..Self::default()
        }
    }

    pub fn column() -> Self {
        Self::default()
    }

    pub fn justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn gap(mut self, gap: i32) -> Self {
        self.gap = gap;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridProps {
    /// Defaults to one column.
    pub columns: Option<usize>,
    /// Defaults to `ceil(children / columns)`.
    pub rows: Option<usize>,
    pub column_gap: i32,
    pub row_gap: i32,
}

impl GridProps {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: Some(columns),
            ..Self::default()
        }
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn gap(mut self, column_gap: i32, row_gap: i32) -> Self {
        self.column_gap = column_gap;
        self.row_gap = row_gap;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackProps {
    pub direction: Axis,
    pub gap: i32,
}

/// How a node places its children inside its content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    Flex(FlexProps),
    Grid(GridProps),
    Stack(StackProps),
    Dock,
    Absolute,
}

impl Default for Arrangement {
    fn default() -> Self {
        Arrangement::Stack(StackProps::default())
    }
}

/// Sizing, spacing and placement props of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutProps {
    pub arrangement: Arrangement,
    /// Explicit border-box width.
    pub width: Option<i32>,
    /// Explicit border-box height.
    pub height: Option<i32>,
    /// Flex weight; zero or `None` means not flexible.
    pub flex: Option<u32>,
    pub align_self: Option<Align>,
    /// Edge used when the parent docks its children.
    pub dock: DockEdge,
    /// Offset from the parent's content origin under absolute arrangement.
    pub offset: (i32, i32),
    pub margin: Spacing,
    pub padding: Spacing,
    /// One-cell border on every side.
    pub border: bool,
}

impl LayoutProps {
    pub fn size(&self, axis: Axis) -> Option<i32> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    pub fn border_thickness(&self) -> i32 {
        i32::from(self.border)
    }

    pub fn margin_edges(&self) -> Edges {
        self.margin.normalize()
    }

    pub fn padding_edges(&self) -> Edges {
        self.padding.normalize()
    }

    pub fn flex_weight(&self) -> u32 {
        self.flex.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutNode {
    pub kind: NodeKind,
    /// Lookup key for [`LayoutNode::find`].
    pub id: Option<String>,
    /// Text measured by auto-sizing.
    pub content: Option<String>,
    pub props: LayoutProps,
    pub children: Vec<LayoutNode>,
    /// Written by `compute_layout`; valid for the latest pass only.
    pub computed: Option<ComputedBox>,
}

impl LayoutNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            content: None,
            props: LayoutProps::default(),
            children: Vec::new(),
            computed: None,
        }
    }

    pub fn container(arrangement: Arrangement) -> Self {
        Self::new(NodeKind::Container).arrangement(arrangement)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).content(content)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn arrangement(mut self, arrangement: Arrangement) -> Self {
        self.props.arrangement = arrangement;
        self
    }

    pub fn width(mut self, width: i32) -> Self {
        self.props.width = Some(width);
        self
    }

    pub fn height(mut self, height: i32) -> Self {
        self.props.height = Some(height);
        self
    }

    pub fn flex(mut self, weight: u32) -> Self {
        self.props.flex = Some(weight);
        self
    }

    pub fn align_self(mut self, align: Align) -> Self {
        self.props.align_self = Some(align);
        self
    }

    pub fn dock(mut self, edge: DockEdge) -> Self {
        self.props.dock = edge;
        self
    }

    pub fn offset(mut self, x: i32, y: i32) -> Self {
        self.props.offset = (x, y);
        self
    }

    pub fn margin(mut self, margin: impl Into<Spacing>) -> Self {
        self.props.margin = margin.into();
        self
    }

    pub fn padding(mut self, padding: impl Into<Spacing>) -> Self {
        self.props.padding = padding.into();
        self
    }

    pub fn border(mut self, border: bool) -> Self {
        self.props.border = border;
        self
    }

    pub fn child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = LayoutNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn computed(&self) -> Option<&ComputedBox> {
        self.computed.as_ref()
    }

    /// Depth-first search by id, this node included.
    pub fn find(&self, id: &str) -> Option<&LayoutNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut LayoutNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{Arrangement, LayoutNode, NodeKind};

    #[test]
    fn find_walks_depth_first() {
        let tree = LayoutNode::container(Arrangement::Dock)
            .id("root")
            .child(
                LayoutNode::container(Arrangement::default())
                    .child(LayoutNode::new(NodeKind::Button).id("ok")),
            )
            .child(LayoutNode::text("hi").id("label"));

        assert_eq!(tree.find("root").map(|n| &n.kind), Some(&NodeKind::Container));
        assert_eq!(tree.find("ok").map(|n| &n.kind), Some(&NodeKind::Button));
        assert_eq!(
            tree.find("label").and_then(|n| n.content.as_deref()),
            Some("hi")
        );
        assert!(tree.find("missing").is_none());
    }
}
