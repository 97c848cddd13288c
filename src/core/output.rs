//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`, and one
//! flush is one `Terminal::write(..)` call.

use std::fmt::Write as _;

use crate::core::terminal::Terminal;

pub const RESET_STYLE: &str = "\x1b[0m";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const ALT_SCREEN_ENTER: &str = "\x1b[?1049h";
pub const ALT_SCREEN_EXIT: &str = "\x1b[?1049l";
pub const MOUSE_ENABLE: &str = "\x1b[?1000h\x1b[?1006h";
pub const MOUSE_DISABLE: &str = "\x1b[?1000l\x1b[?1006l";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Literal cell text.
    Text(String),
    /// Static raw bytes/control sequences.
    BytesStatic(&'static str),

    /// Absolute cursor move, 0-based row/column (`CSI row;col H` on the wire).
    MoveTo { row: u16, col: u16 },
    /// Column jump within the current row, 0-based (`CSI col G` on the wire).
    ColumnAbs(u16),

    /// Replace the active style with an SGR parameter list.
    SetStyle(String),
    ResetStyle,

    /// Cursor visibility.
    HideCursor,
    ShowCursor,

    /// Screen and protocol toggles.
    AltScreenEnter,
    AltScreenExit,
    MouseEnable,
    MouseDisable,
}

impl TerminalCmd {
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    /// Append the wire encoding of this command to `out`.
    pub fn encode_into(&self, out: &mut String) {
        match self {
            TerminalCmd::Text(data) => out.push_str(data),
            TerminalCmd::BytesStatic(data) => out.push_str(data),
            TerminalCmd::MoveTo { row, col } => {
                let _ = write!(out, "\x1b[{};{}H", u32::from(*row) + 1, u32::from(*col) + 1);
            }
            TerminalCmd::ColumnAbs(col) => {
                let _ = write!(out, "\x1b[{}G", u32::from(*col) + 1);
            }
            TerminalCmd::SetStyle(tag) => {
                if tag.is_empty() {
                    out.push_str(RESET_STYLE);
                } else {
                    let _ = write!(out, "\x1b[0;{tag}m");
                }
            }
            TerminalCmd::ResetStyle => out.push_str(RESET_STYLE),
            TerminalCmd::HideCursor => out.push_str(HIDE_CURSOR),
            TerminalCmd::ShowCursor => out.push_str(SHOW_CURSOR),
            TerminalCmd::AltScreenEnter => out.push_str(ALT_SCREEN_ENTER),
            TerminalCmd::AltScreenExit => out.push_str(ALT_SCREEN_EXIT),
            TerminalCmd::MouseEnable => out.push_str(MOUSE_ENABLE),
            TerminalCmd::MouseDisable => out.push_str(MOUSE_DISABLE),
        }
    }
}

/// Encode a command list into its byte stream.
pub fn encode(cmds: &[TerminalCmd]) -> String {
    let mut out = String::new();
    for cmd in cmds {
        cmd.encode_into(&mut out);
    }
    out
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Flush buffered commands to the terminal as a single write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else. Returns the number of bytes written.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) -> usize {
        if self.cmds.is_empty() {
            return 0;
        }
        let mut out = String::new();
        for cmd in self.cmds.drain(..) {
            cmd.encode_into(&mut out);
        }
        if !out.is_empty() {
            term.write(&out);
        }
        out.len()
    }
}
