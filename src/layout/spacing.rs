//! Margin/padding specifications.

/// Resolved four-sided thickness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Edges {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Edges {
    pub const ZERO: Edges = Edges {
        top: 0,
        right: 0,
        bottom: 0,
        left: 0,
    };

    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    /// `left + right`.
    pub fn horizontal(&self) -> i32 {
        self.left.saturating_add(self.right)
    }

    /// `top + bottom`.
    pub fn vertical(&self) -> i32 {
        self.top.saturating_add(self.bottom)
    }

    fn clamped(self) -> Self {
        Self::new(
            self.top.max(0),
            self.right.max(0),
            self.bottom.max(0),
            self.left.max(0),
        )
    }
}

/// A spacing value as authored: one number, CSS shorthand, or explicit edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spacing {
    Uniform(i32),
    /// 1 value: all sides. 2: vertical, horizontal. 3: top, horizontal, bottom.
    /// 4: top, right, bottom, left. Any other length resolves to zero.
    Shorthand(Vec<i32>),
    Edges(Edges),
}

impl Default for Spacing {
    fn default() -> Self {
        Spacing::Uniform(0)
    }
}

impl Spacing {
    /// Resolve to four non-negative sides.
    pub fn normalize(&self) -> Edges {
        let edges = match self {
            Spacing::Uniform(value) => Edges::uniform(*value),
            Spacing::Shorthand(values) => match values.as_slice() {
                [all] => Edges::uniform(*all),
                [vertical, horizontal] => {
                    Edges::new(*vertical, *horizontal, *vertical, *horizontal)
                }
                [top, horizontal, bottom] => Edges::new(*top, *horizontal, *bottom, *horizontal),
                [top, right, bottom, left] => Edges::new(*top, *right, *bottom, *left),
                _ => Edges::ZERO,
            },
            Spacing::Edges(edges) => *edges,
        };
        edges.clamped()
    }
}

impl From<i32> for Spacing {
    fn from(value: i32) -> Self {
        Spacing::Uniform(value)
    }
}

impl From<Vec<i32>> for Spacing {
    fn from(values: Vec<i32>) -> Self {
        Spacing::Shorthand(values)
    }
}

impl From<&[i32]> for Spacing {
    fn from(values: &[i32]) -> Self {
        Spacing::Shorthand(values.to_vec())
    }
}

impl From<Edges> for Spacing {
    fn from(edges: Edges) -> Self {
        Spacing::Edges(edges)
    }
}
