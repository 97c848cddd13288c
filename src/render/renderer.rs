//! Cell diff renderer.
//!
//! Compares the frame buffer against the snapshot of the last flushed frame and
//! produces the commands that bring the terminal up to date.

use tracing::debug;

use crate::core::output::TerminalCmd;
use crate::render::buffer::{Cell, GridBuffer};

/// Tracked hardware cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub x: usize,
    pub y: usize,
    pub visible: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            visible: true,
        }
    }
}

/// Counters describing the last `render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub full_repaint: bool,
    pub changed_cells: usize,
    pub cursor_moves: usize,
    pub style_changes: usize,
}

#[derive(Debug, Default)]
pub struct DiffRenderer {
    previous: Option<GridBuffer>,
    last_cursor: Option<CursorState>,
    last_stats: FrameStats,
    debug_redraw: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_debug_redraw(&mut self, enabled: bool) {
        self.debug_redraw = enabled;
    }

    pub fn has_snapshot(&self) -> bool {
        self.previous.is_some()
    }

    pub fn snapshot(&self) -> Option<&GridBuffer> {
        self.previous.as_ref()
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Drop the snapshot so the next render repaints every cell.
    ///
    /// The cursor is treated as unknown as well: a repaint moves it.
    pub fn invalidate(&mut self) {
        self.previous = None;
        self.last_cursor = None;
    }

    pub fn render(&mut self, buffer: &GridBuffer, cursor: CursorState) -> Vec<TerminalCmd> {
        let previous = self.previous.take().filter(|prev| {
            prev.width() == buffer.width() && prev.height() == buffer.height()
        });
        let mut stats = FrameStats {
            full_repaint: previous.is_none(),
            ..FrameStats::default()
        };
        let mut cmds = Vec::new();
        let mut active_style: Option<&str> = None;

        for y in 0..buffer.height() {
            let row = buffer.row(y);
            let previous_row = previous.as_ref().map(|prev| prev.row(y));
            // Column the terminal cursor sits at after the last emitted cell in this row.
            let mut next_col: Option<usize> = None;

            for x in 0..row.len() {
                let cell = &row[x];
                if cell.is_continuation() {
                    continue;
                }
                if let Some(previous_row) = previous_row {
                    if cell_unchanged(row, previous_row, x) {
                        continue;
                    }
                }

                match next_col {
                    None => {
                        cmds.push(TerminalCmd::MoveTo {
                            row: clamp_u16(y),
                            col: clamp_u16(x),
                        });
                        stats.cursor_moves += 1;
                    }
                    Some(col) if col != x => {
                        cmds.push(TerminalCmd::ColumnAbs(clamp_u16(x)));
                        stats.cursor_moves += 1;
                    }
                    Some(_) => {}
                }

                let style = cell.style.as_deref();
                if style != active_style {
                    match style {
                        Some(tag) => cmds.push(TerminalCmd::SetStyle(tag.to_string())),
                        None => cmds.push(TerminalCmd::ResetStyle),
                    }
                    active_style = style;
                    stats.style_changes += 1;
                }

                push_text(&mut cmds, &cell.ch);
                next_col = Some(x + cell.width());
                stats.changed_cells += 1;
            }
        }

        if active_style.is_some() {
            cmds.push(TerminalCmd::ResetStyle);
        }

        let last_position = self.last_cursor.map(|last| (last.x, last.y));
        if stats.changed_cells > 0 || last_position != Some((cursor.x, cursor.y)) {
            cmds.push(TerminalCmd::MoveTo {
                row: clamp_u16(cursor.y),
                col: clamp_u16(cursor.x),
            });
        }
        if self.last_cursor.map(|last| last.visible) != Some(cursor.visible) {
            cmds.push(if cursor.visible {
                TerminalCmd::ShowCursor
            } else {
                TerminalCmd::HideCursor
            });
        }

        if self.debug_redraw {
            debug!(
                full_repaint = stats.full_repaint,
                changed_cells = stats.changed_cells,
                cursor_moves = stats.cursor_moves,
                style_changes = stats.style_changes,
                "frame diff"
            );
        }

        self.previous = Some(buffer.clone());
        self.last_cursor = Some(cursor);
        self.last_stats = stats;
        cmds
    }
}

fn cell_unchanged(row: &[Cell], previous_row: &[Cell], x: usize) -> bool {
    if row[x] != previous_row[x] {
        return false;
    }
    // A wide grapheme is only intact if its trailing half is too.
    if row[x].width() == 2 && x + 1 < row.len() {
        return row[x + 1] == previous_row[x + 1];
    }
    true
}

fn push_text(cmds: &mut Vec<TerminalCmd>, text: &str) {
    if let Some(TerminalCmd::Text(last)) = cmds.last_mut() {
        last.push_str(text);
        return;
    }
    cmds.push(TerminalCmd::text(text));
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::{CursorState, DiffRenderer};
    use crate::core::output::encode;
    use crate::render::buffer::GridBuffer;

    fn hidden_cursor() -> CursorState {
        CursorState {
            x: 0,
            y: 0,
            visible: false,
        }
    }

    fn render(renderer: &mut DiffRenderer, buffer: &GridBuffer, cursor: CursorState) -> String {
        encode(&renderer.render(buffer, cursor))
    }

    #[test]
    fn first_render_paints_every_row() {
        let mut renderer = DiffRenderer::new();
        let mut buffer = GridBuffer::new(3, 2);
        buffer.write("ab", 0, 0, None);
        let out = render(&mut renderer, &buffer, hidden_cursor());
        assert_eq!(out, "\x1b[1;1Hab \x1b[2;1H   \x1b[1;1H\x1b[?25l");
        assert!(renderer.last_stats().full_repaint);
    }

    #[test]
    fn second_render_without_changes_is_empty() {
        let mut renderer = DiffRenderer::new();
        let mut buffer = GridBuffer::new(5, 2);
        buffer.write("hello", 0, 0, Some("1"));
        render(&mut renderer, &buffer, hidden_cursor());
        assert_eq!(render(&mut renderer, &buffer, hidden_cursor()), "");
        assert_eq!(renderer.last_stats().changed_cells, 0);
    }

    #[test]
    fn adjacent_changes_share_one_move_and_gaps_use_column_jumps() {
        let mut renderer = DiffRenderer::new();
        let mut buffer = GridBuffer::new(10, 2);
        render(&mut renderer, &buffer, hidden_cursor());

        buffer.write("xy", 2, 1, None);
        buffer.write("z", 7, 1, None);
        let out = render(&mut renderer, &buffer, hidden_cursor());
        assert_eq!(out, "\x1b[2;3Hxy\x1b[8Gz\x1b[1;1H");
    }

    #[test]
    fn style_state_spans_rows_and_resets_once() {
        let mut renderer = DiffRenderer::new();
        let mut buffer = GridBuffer::new(4, 2);
        render(&mut renderer, &buffer, hidden_cursor());

        buffer.write("a", 0, 0, Some("31"));
        buffer.write("b", 0, 1, Some("31"));
        buffer.write("c", 1, 1, None);
        let out = render(&mut renderer, &buffer, hidden_cursor());
        assert_eq!(out, "\x1b[1;1H\x1b[0;31ma\x1b[2;1Hb\x1b[0mc\x1b[1;1H");
    }

    #[test]
    fn trailing_style_is_reset_before_cursor_placement() {
        let mut renderer = DiffRenderer::new();
        let mut buffer = GridBuffer::new(3, 1);
        render(&mut renderer, &buffer, hidden_cursor());

        buffer.write("!", 2, 0, Some("7"));
        let cursor = CursorState {
            x: 1,
            y: 0,
            visible: false,
        };
        let out = render(&mut renderer, &buffer, cursor);
        assert_eq!(out, "\x1b[1;3H\x1b[0;7m!\x1b[0m\x1b[1;2H");
    }

    #[test]
    fn cursor_only_changes_emit_cursor_bytes_only() {
        let mut renderer = DiffRenderer::new();
        let buffer = GridBuffer::new(3, 3);
        render(&mut renderer, &buffer, hidden_cursor());

        let moved = CursorState {
            x: 2,
            y: 1,
            visible: true,
        };
        assert_eq!(render(&mut renderer, &buffer, moved), "\x1b[2;3H\x1b[?25h");
        assert_eq!(render(&mut renderer, &buffer, moved), "");
    }

    #[test]
    fn wide_graphemes_advance_two_columns() {
        let mut renderer = DiffRenderer::new();
        let mut buffer = GridBuffer::new(6, 1);
        render(&mut renderer, &buffer, hidden_cursor());

        buffer.write("界x", 0, 0, None);
        let out = render(&mut renderer, &buffer, hidden_cursor());
        assert_eq!(out, "\x1b[1;1H界x\x1b[1;1H");
    }

    #[test]
    fn invalidate_forces_full_repaint() {
        let mut renderer = DiffRenderer::new();
        let buffer = GridBuffer::new(2, 1);
        render(&mut renderer, &buffer, hidden_cursor());
        renderer.invalidate();
        assert!(!renderer.has_snapshot());
        let out = render(&mut renderer, &buffer, hidden_cursor());
        assert_eq!(out, "\x1b[1;1H  \x1b[1;1H\x1b[?25l");
    }
}
