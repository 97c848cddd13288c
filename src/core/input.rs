//! Input protocol decoding: SGR mouse reports and raw keypresses.
//!
//! Key-name decoding is left to consumers; a [`KeyEvent`] carries the raw
//! sequence plus the two modifier hints that are cheap to detect here.

const ESC: char = '\x1b';

/// SGR mouse report lead-in (`ESC [ <`).
pub const SGR_MOUSE_PREFIX: &str = "\x1b[<";

const BUTTON_MASK: u32 = 0x03;
const SHIFT_BIT: u32 = 0x04;
const META_BIT: u32 = 0x08;
const CTRL_BIT: u32 = 0x10;
const MOTION_BIT: u32 = 0x20;
const WHEEL_BIT: u32 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Press,
    Release,
    Move,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    None,
}

/// Decoded mouse report. Coordinates are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub button: MouseButton,
    pub x: i32,
    pub y: i32,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl MouseEvent {
    /// The same event with coordinates shifted into a region's local space.
    pub fn translated(&self, origin_x: i32, origin_y: i32) -> Self {
        Self {
            x: self.x - origin_x,
            y: self.y - origin_y,
            ..*self
        }
    }
}

/// A keypress chunk, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub raw: String,
    pub ctrl: bool,
    pub meta: bool,
}

pub fn is_sgr_mouse_prefix(data: &str) -> bool {
    data.starts_with(SGR_MOUSE_PREFIX)
}

/// Decode `ESC [ < code ; col ; row (M|m)`.
///
/// The whole chunk must be exactly one report; anything else returns `None`.
pub fn parse_sgr_mouse(data: &str) -> Option<MouseEvent> {
    let payload = data.strip_prefix(SGR_MOUSE_PREFIX)?;
    let final_char = payload.chars().last()?;
    if final_char != 'M' && final_char != 'm' {
        return None;
    }
    let body = &payload[..payload.len() - 1];

    let mut parts = body.split(';');
    let code = parse_decimal(parts.next()?)?;
    let col = parse_decimal(parts.next()?)?;
    let row = parse_decimal(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    let button_bits = code & BUTTON_MASK;
    let (kind, button) = if code & WHEEL_BIT != 0 {
        let kind = if button_bits == 0 {
            MouseKind::ScrollUp
        } else {
            MouseKind::ScrollDown
        };
        (kind, MouseButton::None)
    } else {
        let kind = if code & MOTION_BIT != 0 {
            MouseKind::Move
        } else if final_char == 'm' {
            MouseKind::Release
        } else {
            MouseKind::Press
        };
        (kind, button_from_bits(button_bits))
    };

    Some(MouseEvent {
        kind,
        button,
        x: wire_to_zero_based(col),
        y: wire_to_zero_based(row),
        ctrl: code & CTRL_BIT != 0,
        shift: code & SHIFT_BIT != 0,
        meta: code & META_BIT != 0,
    })
}

/// Classify a chunk as a keypress.
pub fn parse_keypress(data: &str) -> KeyEvent {
    let mut chars = data.chars();
    let first = chars.next();
    let ctrl = matches!(first, Some(ch) if ch.is_ascii_control() && ch != ESC && ch != '\x7f');
    let meta = first == Some(ESC) && chars.next().is_some();
    KeyEvent {
        raw: data.to_string(),
        ctrl,
        meta,
    }
}

fn button_from_bits(bits: u32) -> MouseButton {
    match bits {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::None,
    }
}

fn parse_decimal(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn wire_to_zero_based(value: u32) -> i32 {
    i32::try_from(value.saturating_sub(1)).unwrap_or(i32::MAX)
}
