#![allow(unused_imports)]

use cellframe::{
    compute_layout, grapheme_width, line_width, parse_keypress, parse_sgr_mouse, Align,
    Arrangement, Axis, Cell, ComponentHandle, ComponentId, ComponentRegistry, Compositor,
    CompositorOptions, ComputedBox, CursorState, DiffRenderer, DockEdge, Edges, EnvConfig, Error,
    FlexProps, FrameStats, GridBuffer, GridProps, InputScanner, Interactive, Justify, KeyEvent,
    LayoutNode, LayoutProps, MouseButton, MouseEvent, MouseKind, NodeKind, OutputGate,
    ProcessTerminal, Rect, ResizeEvent, Result, Spacing, StackProps, SubscriptionId, Terminal,
    TerminalCmd, TerminalModes, VirtualCursor,
};

#[test]
fn public_api_exports_compile() {}

#[test]
fn error_messages_name_the_failure() {
    let err = Error::NotATerminal("stdin");
    assert_eq!(err.to_string(), "not a terminal: stdin");

    let err: Error = std::io::Error::other("device gone").into();
    assert!(err.to_string().contains("device gone"));
}

#[test]
fn options_follow_env_config() {
    let config = EnvConfig {
        mouse: true,
        alternate_screen: true,
        ..EnvConfig::default()
    };
    let options = CompositorOptions::from_config(&config);
    assert!(options.mouse && options.alternate_screen && !options.debug_redraw);
}
