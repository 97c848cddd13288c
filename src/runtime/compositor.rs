//! Screen compositor: frame buffer, diff flush, terminal modes and input routing.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::EnvConfig;
use crate::core::geometry::Rect;
use crate::core::input::{
    is_sgr_mouse_prefix, parse_keypress, parse_sgr_mouse, KeyEvent, MouseEvent,
};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::{EmergencyRestore, Terminal};
use crate::error::Result;
use crate::render::buffer::GridBuffer;
use crate::render::renderer::{CursorState, DiffRenderer};
use crate::runtime::component_registry::{ComponentHandle, ComponentId, ComponentRegistry};
use crate::runtime::events::{Listeners, ResizeEvent, SubscriptionId, SubscriptionIds};
use crate::runtime::wake::RuntimeWake;

const STOP_DRAIN_MAX_MS: u64 = 1000;
const STOP_DRAIN_IDLE_MS: u64 = 50;

/// Compositor start-up behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositorOptions {
    /// Switch to the alternate screen on `start`.
    pub alternate_screen: bool,
    /// Enable SGR mouse tracking on `start`.
    pub mouse: bool,
    /// Log per-flush diff statistics at `debug` level.
    pub debug_redraw: bool,
}

impl CompositorOptions {
    pub fn from_env() -> Self {
        Self::from_config(&EnvConfig::from_env())
    }

    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            alternate_screen: config.alternate_screen,
            mouse: config.mouse,
            debug_redraw: config.debug_redraw,
        }
    }
}

/// Terminal-global modes owned by the compositor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalModes {
    pub alternate_screen: bool,
    pub mouse_tracking: bool,
    pub raw_input: bool,
}

/// Exclusive input routing target (for example a cursor-navigation overlay).
pub trait VirtualCursor {
    /// Receives every non-mouse input chunk while installed.
    fn handle_input(&mut self, raw: &str);

    /// Gets first refusal on mouse events; return `true` to consume the event.
    fn handle_mouse(&mut self, _event: &MouseEvent) -> bool {
        false
    }
}

#[derive(Default)]
struct CrashCleanup {
    ran: AtomicBool,
    device_restore: Option<EmergencyRestore>,
}

impl CrashCleanup {
    fn new(device_restore: Option<EmergencyRestore>) -> Self {
        Self {
            ran: AtomicBool::new(false),
            device_restore,
        }
    }

    fn run<T: Terminal + ?Sized>(&self, terminal: &mut T) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }

        // We may not know which toggles succeeded before the failure; every
        // sequence here is safe to send unconditionally.
        let mut output = OutputGate::new();
        output.push(TerminalCmd::ResetStyle);
        output.push(TerminalCmd::MouseDisable);
        output.push(TerminalCmd::AltScreenExit);
        output.push(TerminalCmd::ShowCursor);
        output.flush(terminal);

        if let Some(restore) = self.device_restore.as_ref() {
            restore();
        }
    }

    #[cfg(all(unix, not(test)))]
    fn run_best_effort(&self) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let mut terminal = crate::platform::process_terminal::HookTerminal::new();
            self.run(&mut terminal);
        }));
    }
}

pub struct Compositor<T: Terminal> {
    terminal: T,
    output: OutputGate,
    buffer: GridBuffer,
    renderer: DiffRenderer,
    cursor: CursorState,
    modes: TerminalModes,
    registry: ComponentRegistry,
    virtual_cursor: Option<Box<dyn VirtualCursor>>,
    subscription_ids: SubscriptionIds,
    resize_listeners: Listeners<ResizeEvent>,
    mouse_listeners: Listeners<MouseEvent>,
    key_listeners: Listeners<KeyEvent>,
    options: CompositorOptions,
    started: bool,
    wake: Arc<RuntimeWake>,
    #[cfg(all(unix, not(test)))]
    signal_hook_guard: Option<crate::platform::SignalHookGuard>,
    #[cfg(all(unix, not(test)))]
    panic_hook_guard: Option<crate::platform::PanicHookGuard>,
}

impl<T: Terminal> Compositor<T> {
    pub fn new(terminal: T, options: CompositorOptions) -> Self {
        let width = usize::from(terminal.columns());
        let height = usize::from(terminal.rows());
        let mut renderer = DiffRenderer::new();
        renderer.set_debug_redraw(options.debug_redraw);
        Self {
            terminal,
            output: OutputGate::new(),
            buffer: GridBuffer::new(width, height),
            renderer,
            cursor: CursorState::default(),
            modes: TerminalModes::default(),
            registry: ComponentRegistry::new(),
            virtual_cursor: None,
            subscription_ids: SubscriptionIds::default(),
            resize_listeners: Listeners::default(),
            mouse_listeners: Listeners::default(),
            key_listeners: Listeners::default(),
            options,
            started: false,
            wake: Arc::new(RuntimeWake::default()),
            #[cfg(all(unix, not(test)))]
            signal_hook_guard: None,
            #[cfg(all(unix, not(test)))]
            panic_hook_guard: None,
        }
    }

    pub fn width(&self) -> usize {
        self.buffer.width()
    }

    pub fn height(&self) -> usize {
        self.buffer.height()
    }

    /// The frame being composed.
    pub fn buffer(&self) -> &GridBuffer {
        &self.buffer
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn modes(&self) -> TerminalModes {
        self.modes
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    // -- frame composition ---------------------------------------------------

    pub fn write(&mut self, text: &str, x: i32, y: i32, style: Option<&str>) {
        self.buffer.write(text, x, y, style);
    }

    pub fn fill_region(&mut self, region: Rect, ch: char, style: Option<&str>) {
        self.buffer.fill_region(region, ch, style);
    }

    /// Blank the frame and force the next flush to repaint everything.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.renderer.invalidate();
    }

    pub fn set_cursor_position(&mut self, x: i32, y: i32) {
        self.cursor.x = clamp_to_extent(x, self.buffer.width());
        self.cursor.y = clamp_to_extent(y, self.buffer.height());
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor.visible = visible;
    }

    /// Emit the difference between the frame and what is on screen.
    ///
    /// Returns the number of bytes written (in a single terminal write).
    pub fn flush(&mut self) -> usize {
        let cmds = self.renderer.render(&self.buffer, self.cursor);
        self.output.extend(cmds);
        self.output.flush(&mut self.terminal)
    }

    // -- terminal modes ------------------------------------------------------

    pub fn enter_alternate_screen(&mut self) {
        if self.modes.alternate_screen {
            return;
        }
        self.modes.alternate_screen = true;
        self.emit_now(TerminalCmd::AltScreenEnter);
        self.renderer.invalidate();
    }

    pub fn exit_alternate_screen(&mut self) {
        if !self.modes.alternate_screen {
            return;
        }
        self.modes.alternate_screen = false;
        self.emit_now(TerminalCmd::AltScreenExit);
        self.renderer.invalidate();
    }

    pub fn enable_mouse(&mut self) {
        if self.modes.mouse_tracking {
            return;
        }
        self.modes.mouse_tracking = true;
        self.emit_now(TerminalCmd::MouseEnable);
    }

    pub fn disable_mouse(&mut self) {
        if !self.modes.mouse_tracking {
            return;
        }
        self.modes.mouse_tracking = false;
        self.emit_now(TerminalCmd::MouseDisable);
    }

    /// Enter raw input mode. Returns whether raw mode is active afterwards.
    pub fn enable_raw_mode(&mut self) -> Result<bool> {
        if self.modes.raw_input {
            return Ok(true);
        }
        if self.terminal.set_raw_mode(true)? {
            self.modes.raw_input = true;
        } else {
            warn!("raw input mode unsupported by the terminal; continuing in cooked mode");
        }
        Ok(self.modes.raw_input)
    }

    pub fn disable_raw_mode(&mut self) -> Result<()> {
        if !self.modes.raw_input {
            return Ok(());
        }
        self.modes.raw_input = false;
        self.terminal.set_raw_mode(false)?;
        Ok(())
    }

    fn emit_now(&mut self, cmd: TerminalCmd) {
        self.output.push(cmd);
        self.output.flush(&mut self.terminal);
    }

    // -- component regions ---------------------------------------------------

    pub fn register_component(&mut self, handle: ComponentHandle, region: Rect) -> ComponentId {
        self.registry.register(handle, region)
    }

    /// Re-register at an existing identity, replacing handle and region.
    pub fn replace_component(
        &mut self,
        id: ComponentId,
        handle: ComponentHandle,
        region: Rect,
    ) -> bool {
        self.registry.replace(id, handle, region)
    }

    pub fn update_component_region(&mut self, id: ComponentId, region: Rect) -> bool {
        self.registry.update_region(id, region)
    }

    pub fn unregister_component(&mut self, id: ComponentId) -> bool {
        self.registry.unregister(id)
    }

    pub fn component_region(&self, id: ComponentId) -> Option<Rect> {
        self.registry.region(id)
    }

    // -- subscriptions -------------------------------------------------------

    pub fn on_resize(&mut self, listener: impl FnMut(&ResizeEvent) + 'static) -> SubscriptionId {
        let id = self.subscription_ids.next();
        self.resize_listeners.add(id, Box::new(listener));
        id
    }

    pub fn on_mouse(&mut self, listener: impl FnMut(&MouseEvent) + 'static) -> SubscriptionId {
        let id = self.subscription_ids.next();
        self.mouse_listeners.add(id, Box::new(listener));
        id
    }

    pub fn on_key(&mut self, listener: impl FnMut(&KeyEvent) + 'static) -> SubscriptionId {
        let id = self.subscription_ids.next();
        self.key_listeners.add(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.resize_listeners.remove(id)
            || self.mouse_listeners.remove(id)
            || self.key_listeners.remove(id)
    }

    /// Install (or with `None`, remove) the exclusive input routing target.
    pub fn set_virtual_cursor(
        &mut self,
        target: Option<Box<dyn VirtualCursor>>,
    ) -> Option<Box<dyn VirtualCursor>> {
        std::mem::replace(&mut self.virtual_cursor, target)
    }

    pub fn has_virtual_cursor(&self) -> bool {
        self.virtual_cursor.is_some()
    }

    // -- input ---------------------------------------------------------------

    /// Route one complete input chunk.
    pub fn handle_input(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }

        if self.modes.mouse_tracking && is_sgr_mouse_prefix(data) {
            if let Some(event) = parse_sgr_mouse(data) {
                self.dispatch_mouse(event);
                return;
            }
            debug!(len = data.len(), "malformed SGR mouse report; treating as keypress");
        }

        if let Some(target) = self.virtual_cursor.as_mut() {
            target.handle_input(data);
            return;
        }

        let key = parse_keypress(data);
        self.key_listeners.emit(&key);
    }

    fn dispatch_mouse(&mut self, event: MouseEvent) {
        let consumed = self
            .virtual_cursor
            .as_mut()
            .is_some_and(|target| target.handle_mouse(&event));

        if !consumed {
            if let Some((_, region, handle)) = self.registry.hit_test(event.x, event.y) {
                let local = event.translated(region.x, region.y);
                match handle.try_borrow_mut() {
                    Ok(mut target) => target.handle_mouse(&local),
                    Err(_) => debug!("mouse target busy; event dropped"),
                };
            }
        }

        self.mouse_listeners.emit(&event);
    }

    // -- resize --------------------------------------------------------------

    /// Adopt new terminal dimensions.
    ///
    /// Content in the overlapping rectangle survives; the next flush repaints
    /// everything.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        let width = usize::from(columns);
        let height = usize::from(rows);
        if width == self.buffer.width() && height == self.buffer.height() {
            return;
        }
        debug!(
            from_columns = self.buffer.width(),
            from_rows = self.buffer.height(),
            columns,
            rows,
            "terminal resized"
        );
        self.buffer = self.buffer.resized(width, height);
        self.renderer.invalidate();
        self.cursor.x = clamp_to_extent(self.cursor.x as i32, width);
        self.cursor.y = clamp_to_extent(self.cursor.y as i32, height);
        self.resize_listeners.emit(&ResizeEvent { columns, rows });
    }

    /// Re-read the device size and resize if it changed.
    pub fn sync_terminal_size(&mut self) {
        let columns = self.terminal.columns();
        let rows = self.terminal.rows();
        self.resize(columns, rows);
    }

    // -- lifecycle -----------------------------------------------------------

    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.output.clear();
        self.wake.reset_for_start();

        // Mark running early so Drop attempts cleanup if `Terminal::start()` panics.
        self.started = true;

        #[cfg(all(unix, not(test)))]
        self.install_cleanup_hooks();

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        if let Err(err) = self.terminal.start(
            Box::new(move |data| {
                wake_input.enqueue_input(data);
            }),
            Box::new(move || {
                wake_resize.signal_resize();
            }),
        ) {
            self.started = false;
            #[cfg(all(unix, not(test)))]
            self.uninstall_cleanup_hooks();
            return Err(err);
        }

        self.enable_raw_mode()?;
        if self.options.alternate_screen {
            self.enter_alternate_screen();
        }
        if self.options.mouse {
            self.enable_mouse();
        }
        self.sync_terminal_size();
        self.renderer.invalidate();
        Ok(())
    }

    /// Restore the terminal to its default state and stop input delivery.
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.wake.request_stop();
        self.restore_terminal_modes();
        self.terminal.drain_input(STOP_DRAIN_MAX_MS, STOP_DRAIN_IDLE_MS);
        // Device stop flushes pending input while still raw; cooked mode comes after.
        let stop_result = self.terminal.stop();
        let raw_result = self.disable_raw_mode();
        self.started = false;
        #[cfg(all(unix, not(test)))]
        self.uninstall_cleanup_hooks();
        stop_result.and(raw_result)
    }

    fn restore_terminal_modes(&mut self) {
        self.output.push(TerminalCmd::ResetStyle);
        if self.modes.mouse_tracking {
            self.output.push(TerminalCmd::MouseDisable);
            self.modes.mouse_tracking = false;
        }
        if self.modes.alternate_screen {
            self.output.push(TerminalCmd::AltScreenExit);
            self.modes.alternate_screen = false;
        } else if self.buffer.height() > 0 {
            // Leave the shell prompt below the last frame.
            self.output.push(TerminalCmd::MoveTo {
                row: u16::try_from(self.buffer.height() - 1).unwrap_or(u16::MAX),
                col: 0,
            });
            self.output.push(TerminalCmd::BytesStatic("\r\n"));
        }
        self.output.push(TerminalCmd::ShowCursor);
        self.output.flush(&mut self.terminal);
        self.renderer.invalidate();
    }

    #[cfg(all(unix, not(test)))]
    fn install_cleanup_hooks(&mut self) {
        let cleanup = Arc::new(CrashCleanup::new(self.terminal.emergency_restore()));
        let signal_cleanup = Arc::clone(&cleanup);
        let panic_cleanup = Arc::clone(&cleanup);
        match crate::platform::install_signal_handlers(move || signal_cleanup.run_best_effort()) {
            Ok(guard) => self.signal_hook_guard = Some(guard),
            Err(err) => warn!(%err, "signal cleanup hooks unavailable"),
        }
        self.panic_hook_guard = Some(crate::platform::install_panic_hook(move || {
            panic_cleanup.run_best_effort()
        }));
    }

    #[cfg(all(unix, not(test)))]
    fn uninstall_cleanup_hooks(&mut self) {
        self.signal_hook_guard = None;
        self.panic_hook_guard = None;
    }

    // -- event loop ----------------------------------------------------------

    /// Apply queued resize notifications and input chunks on this thread.
    ///
    /// Returns whether anything was processed.
    pub fn dispatch_pending(&mut self) -> bool {
        let mut processed = false;
        if self.wake.take_pending_resize() {
            self.sync_terminal_size();
            processed = true;
        }
        for chunk in self.wake.drain_inputs() {
            self.handle_input(&chunk);
            processed = true;
        }
        processed
    }

    /// Block until input or a resize arrives, then dispatch it.
    ///
    /// Returns `false` when stopped.
    pub fn run_blocking_once(&mut self) -> bool {
        if !self.started || !self.wake.wait_for_event() {
            return false;
        }
        self.dispatch_pending();
        true
    }

    /// Like [`Compositor::run_blocking_once`], waiting at most `timeout`.
    pub fn run_once_timeout(&mut self, timeout: Duration) -> bool {
        if !self.started || !self.wake.wait_for_event_timeout(timeout) {
            return false;
        }
        self.dispatch_pending();
        true
    }
}

impl<T: Terminal> Drop for Compositor<T> {
    fn drop(&mut self) {
        if !self.started {
            return;
        }

        // Best-effort cleanup: never panic in Drop (especially during unwind).
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}

fn clamp_to_extent(value: i32, extent: usize) -> usize {
    if extent == 0 || value <= 0 {
        return 0;
    }
    (value as usize).min(extent - 1)
}
