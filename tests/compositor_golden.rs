
use std::cell::RefCell;
use std::rc::Rc;

use cellframe::{Compositor, CompositorOptions, Rect};
use fixture::RecordingTerminal;

fn compositor(columns: u16, rows: u16) -> Compositor<RecordingTerminal> {
    Compositor::new(
        RecordingTerminal::new(columns, rows),
        CompositorOptions::default(),
    )
}

#[test]
fn golden_first_flush() {
    let expected = fixture::read_unescaped("compositor_first_flush.txt");
    let mut compositor = compositor(4, 2);
    compositor.write("hi", 1, 0, Some("1"));

    compositor.flush();

    let terminal = compositor.terminal_mut();
    assert_eq!(terminal.take_output(), expected);
    assert_eq!(terminal.writes.len(), 1, "a flush is a single write");
}

#[test]
fn identical_second_flush_writes_nothing() {
    let mut compositor = compositor(4, 2);
    compositor.write("hi", 1, 0, Some("1"));
    compositor.flush();
    compositor.terminal_mut().take_output();

    assert_eq!(compositor.flush(), 0);
    assert_eq!(compositor.terminal().writes.len(), 1);
}

#[test]
fn golden_diff_one_cell() {
    let expected = fixture::read_unescaped("compositor_diff_one_cell.txt");
    let mut compositor = compositor(4, 2);
    compositor.write("hi", 1, 0, Some("1"));
    compositor.flush();
    compositor.terminal_mut().take_output();

    compositor.write("o", 2, 1, None);
    compositor.flush();
    assert_eq!(compositor.terminal_mut().take_output(), expected);
}

#[test]
fn writes_are_clipped_not_wrapped() {
    let mut compositor = compositor(5, 2);
    compositor.write("abcd", -2, 0, None);
    compositor.write("overflowing", 3, 1, None);
    compositor.write("gone", 0, 2, None);
    compositor.write("gone", 0, -1, None);

    assert_eq!(compositor.buffer().row_text(0), "cd   ");
    assert_eq!(compositor.buffer().row_text(1), "   ov");
}

#[test]
fn embedded_escape_sequences_are_not_forwarded() {
    let mut compositor = compositor(6, 2);
    compositor.write("a\x1b[2Jb\r\nc", 0, 0, None);
    compositor.flush();

    assert_eq!(compositor.buffer().row_text(0), "a[2Jbc");
    assert_eq!(
        compositor.terminal_mut().take_output(),
        "\x1b[1;1Ha[2Jbc\x1b[2;1H      \x1b[1;1H\x1b[?25h"
    );
}

#[test]
fn fill_region_and_clear() {
    let mut compositor = compositor(4, 3);
    compositor.fill_region(Rect::new(-1, 1, 3, 5), '#', Some("44"));
    assert_eq!(compositor.buffer().row_text(0), "    ");
    assert_eq!(compositor.buffer().row_text(1), "##  ");
    assert_eq!(compositor.buffer().row_text(2), "##  ");
    compositor.flush();
    compositor.terminal_mut().take_output();

    compositor.clear();
    assert_eq!(compositor.buffer().row_text(1), "    ");
    compositor.flush();
    let repaint = compositor.terminal_mut().take_output();
    assert!(repaint.starts_with("\x1b[1;1H    \x1b[2;1H    \x1b[3;1H    "));
}

#[test]
fn golden_resize_keeps_overlap_and_repaints() {
    let expected = fixture::read_unescaped("compositor_resize_repaint.txt");
    let mut compositor = compositor(4, 2);
    let sizes = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&sizes);
    compositor.on_resize(move |event| seen.borrow_mut().push((event.columns, event.rows)));

    compositor.write("hi", 1, 0, Some("1"));
    compositor.write("zz", 0, 1, None);
    compositor.flush();
    compositor.terminal_mut().take_output();

    compositor.resize(3, 1);
    compositor.resize(3, 1);
    assert_eq!(*sizes.borrow(), vec![(3, 1)]);
    assert_eq!(compositor.buffer().row_text(0), " hi");

    compositor.flush();
    assert_eq!(compositor.terminal_mut().take_output(), expected);
}

#[test]
fn growing_exposes_blank_cells() {
    let mut compositor = compositor(2, 1);
    compositor.write("ab", 0, 0, None);
    compositor.resize(4, 2);
    assert_eq!(compositor.buffer().row_text(0), "ab  ");
    assert_eq!(compositor.buffer().row_text(1), "    ");
}

#[test]
fn cursor_visibility_is_emitted_only_on_change() {
    let mut compositor = compositor(3, 1);
    compositor.flush();
    compositor.terminal_mut().take_output();

    compositor.set_cursor_visible(false);
    compositor.flush();
    assert_eq!(compositor.terminal_mut().take_output(), "\x1b[?25l");

    compositor.set_cursor_position(2, 0);
    compositor.flush();
    assert_eq!(compositor.terminal_mut().take_output(), "\x1b[1;3H");
}

#[test]
fn golden_start_and_teardown() {
    let options = CompositorOptions {
        alternate_screen: true,
        mouse: true,
        debug_redraw: false,
    };
    let mut compositor = Compositor::new(RecordingTerminal::new(6, 2), options);

    compositor.start().expect("start");
    assert!(compositor.terminal().raw);
    assert_eq!(
        compositor.terminal_mut().take_output(),
        fixture::read_unescaped("compositor_start_modes.txt")
    );

    compositor.write("bye", 0, 0, Some("32"));
    compositor.flush();
    compositor.terminal_mut().take_output();

    compositor.stop().expect("stop");
    assert!(!compositor.terminal().raw);
    assert_eq!(
        compositor.terminal_mut().take_output(),
        fixture::read_unescaped("compositor_teardown.txt")
    );

    // Stopping twice is a no-op.
    compositor.stop().expect("stop");
    assert!(compositor.terminal_mut().take_output().is_empty());
}

#[test]
fn screen_switch_forces_full_repaint() {
    let mut compositor = compositor(2, 1);
    compositor.flush();
    compositor.terminal_mut().take_output();

    compositor.enter_alternate_screen();
    compositor.flush();
    assert_eq!(
        compositor.terminal_mut().take_output(),
        "\x1b[?1049h\x1b[1;1H  \x1b[1;1H\x1b[?25h"
    );
}
