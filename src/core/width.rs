//! Display-column measurement for graphemes and lines.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// Columns occupied by one grapheme cluster, capped at 2.
///
/// Control characters (including tab, newline and ESC) measure 0, so callers
/// that skip zero-width graphemes never place them in the grid.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }

    let mut width = 0;
    for ch in grapheme.chars() {
        if ch.is_control() {
            return 0;
        }
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width.min(2)
}

/// Sum of grapheme widths across `line`.
pub fn line_width(line: &str) -> usize {
    line.graphemes(true).map(grapheme_width).sum()
}

#[cfg(test)]
mod tests {
    use super::{grapheme_width, line_width};

    #[test]
    fn controls_are_zero_width() {
        for control in ["\x1b", "\t", "\n", "\r", "\r\n", "\x07", "\x00", "\u{9b}"] {
            assert_eq!(grapheme_width(control), 0, "{control:?}");
        }
    }

    #[test]
    fn wide_and_combining_graphemes() {
        assert_eq!(grapheme_width("a"), 1);
        assert_eq!(grapheme_width("日"), 2);
        assert_eq!(grapheme_width("e\u{301}"), 1);
        assert_eq!(grapheme_width("\u{301}"), 0);
    }

    #[test]
    fn line_width_ignores_embedded_controls() {
        assert_eq!(line_width("a\tb\x1bc"), 3);
        assert_eq!(line_width("日本"), 4);
    }
}
