//! Cell grid backing one screen of content.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::geometry::Rect;
use crate::core::width::grapheme_width;

/// One character cell.
///
/// An empty `ch` marks the trailing half of a double-width grapheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: String,
    pub style: Option<String>,
}

impl Cell {
    pub fn new(ch: impl Into<String>, style: Option<String>) -> Self {
        Self {
            ch: ch.into(),
            style,
        }
    }

    fn continuation(style: Option<String>) -> Self {
        Self {
            ch: String::new(),
            style,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.ch.is_empty()
    }

    /// Display columns occupied by this cell's grapheme.
    pub fn width(&self) -> usize {
        if self.ch.is_empty() {
            0
        } else {
            grapheme_width(&self.ch).clamp(1, 2)
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: " ".to_string(),
            style: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridBuffer {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
}

impl GridBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![Cell::default(); width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    pub fn row(&self, y: usize) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Row contents as plain text (continuation cells contribute nothing).
    pub fn row_text(&self, y: usize) -> String {
        self.row(y).iter().map(|cell| cell.ch.as_str()).collect()
    }

    /// Write `text` into row `y` from column `x`, clipping at the buffer edges.
    pub fn write(&mut self, text: &str, x: i32, y: i32, style: Option<&str>) {
        let Some(row) = self.row_index(y) else {
            return;
        };
        let style = style.map(str::to_string);
        let mut col = i64::from(x);
        for grapheme in text.graphemes(true) {
            let width = grapheme_width(grapheme);
            if width == 0 {
                continue;
            }
            let width = width.min(2) as i64;
            if col >= self.width as i64 {
                break;
            }
            if col >= 0 {
                let start = col as usize;
                if width == 2 && start + 1 >= self.width {
                    // No room for the second half.
                    self.put(start, row, Cell::new(" ", style.clone()));
                } else {
                    self.put(start, row, Cell::new(grapheme, style.clone()));
                    if width == 2 {
                        self.put(start + 1, row, Cell::continuation(style.clone()));
                    }
                }
            } else if col + width > 0 {
                // A wide grapheme straddling the left edge: keep the visible half blank.
                self.put(0, row, Cell::new(" ", style.clone()));
            }
            col += width;
        }
    }

    /// Fill every cell of `rect` (clipped) with `ch`.
    pub fn fill_region(&mut self, rect: Rect, ch: char, style: Option<&str>) {
        let bounds = Rect::new(0, 0, self.width as i32, self.height as i32);
        let clipped = rect.intersection(&bounds);
        if clipped.is_empty() {
            return;
        }
        let fill = ch.to_string();
        let fill = if grapheme_width(&fill) == 1 {
            fill
        } else {
            " ".to_string()
        };
        let style = style.map(str::to_string);
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.put(x as usize, y as usize, Cell::new(fill.clone(), style.clone()));
            }
        }
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = Cell::default();
        }
    }

    /// A buffer of the new size holding the overlapping rectangle of this one.
    pub fn resized(&self, width: usize, height: usize) -> GridBuffer {
        let mut next = GridBuffer::new(width, height);
        let copy_w = self.width.min(width);
        let copy_h = self.height.min(height);
        for y in 0..copy_h {
            for x in 0..copy_w {
                next.cells[y * width + x] = self.cells[y * self.width + x].clone();
            }
            // A wide grapheme cut in half by the new right edge.
            if copy_w > 0 && copy_w < self.width {
                let last = &next.cells[y * width + copy_w - 1];
                if last.width() == 2 {
                    next.cells[y * width + copy_w - 1] = Cell::default();
                }
            }
        }
        next
    }

    fn row_index(&self, y: i32) -> Option<usize> {
        if y < 0 {
            return None;
        }
        let row = y as usize;
        (row < self.height).then_some(row)
    }

    /// Store a cell, blanking any wide grapheme half it overwrites.
    fn put(&mut self, x: usize, y: usize, cell: Cell) {
        let idx = y * self.width + x;
        let was_continuation = self.cells[idx].is_continuation();
        let was_wide = self.cells[idx].width() == 2;
        if was_continuation && x > 0 {
            self.cells[idx - 1] = Cell::new(" ", self.cells[idx - 1].style.clone());
        }
        if was_wide && x + 1 < self.width {
            let next = idx + 1;
            if self.cells[next].is_continuation() {
                self.cells[next] = Cell::new(" ", self.cells[next].style.clone());
            }
        }
        self.cells[idx] = cell;
    }
}
