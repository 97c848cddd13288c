//! Terminal device backed by the process's stdin/stdout.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, warn};

use crate::config::EnvConfig;
use crate::core::terminal::{EmergencyRestore, Terminal};
use crate::error::{Error, Result};

#[cfg(unix)]
use crate::platform::input_scanner::InputScanner;
#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

const FALLBACK_COLUMNS: u16 = 80;
const FALLBACK_ROWS: u16 = 24;
const INPUT_POLL_MS: i32 = 50;

type InputHandler = Arc<Mutex<Option<Box<dyn FnMut(String) + Send>>>>;
type ResizeHandler = Arc<Mutex<Option<Box<dyn FnMut() + Send>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

#[cfg(unix)]
fn wait_writable(fd: c_int) -> std::io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        return Err(std::io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

/// Write every byte, retrying on EINTR and waiting out EAGAIN.
#[cfg(unix)]
fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> std::io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> std::io::Result<usize>,
    FWait: FnMut(c_int) -> std::io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write returned 0",
                ));
            }
            Ok(count) => written += count.min(bytes.len() - written),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) -> std::io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    write_all_fd_with(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if result < 0 {
                Err(std::io::Error::last_os_error())
            } else {
                Ok(result as usize)
            }
        },
        wait_writable,
    )
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    (result == 0 && size.ws_col > 0 && size.ws_row > 0).then_some((size.ws_col, size.ws_row))
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & libc::POLLIN) != 0
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> std::io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> std::io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn is_tty(fd: c_int) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

/// Appends a copy of every frame written to the device.
struct WriteLog {
    path: Option<PathBuf>,
    failed: bool,
}

impl WriteLog {
    fn new(path: Option<&str>) -> Self {
        Self {
            path: path.map(PathBuf::from),
            failed: false,
        }
    }

    fn append(&mut self, data: &str) {
        if self.failed {
            return;
        }
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(data.as_bytes()));
        if let Err(err) = result {
            warn!(path = %path.display(), %err, "write log disabled");
            self.failed = true;
        }
    }
}

#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    raw_active: bool,
    input_timeout_ms: u64,
    input_handler: InputHandler,
    resize_handler: ResizeHandler,
    input_thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    drain_mode: Arc<AtomicBool>,
    last_input_time: Arc<AtomicU64>,
    write_log: WriteLog,
    write_failed: bool,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self::with_config(&EnvConfig::from_env())
    }

    pub fn with_config(config: &EnvConfig) -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            raw_active: false,
            input_timeout_ms: config.input_timeout_ms,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            input_thread: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            drain_mode: Arc::new(AtomicBool::new(false)),
            last_input_time: Arc::new(AtomicU64::new(now_ms())),
            write_log: WriteLog::new(config.write_log.as_deref()),
            write_failed: false,
            resize_signal_handle: None,
            resize_thread: None,
        }
    }

    fn enter_raw_mode(&mut self) -> std::io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)?;
        self.raw_active = true;
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> std::io::Result<()> {
        if !self.raw_active {
            return Ok(());
        }
        self.raw_active = false;
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn start_input_thread(&mut self) {
        let stdin_fd = self.stdin_fd;
        let timeout_ms = self.input_timeout_ms;
        let input_handler = Arc::clone(&self.input_handler);
        let stop_flag = Arc::clone(&self.stop_flag);
        let drain_mode = Arc::clone(&self.drain_mode);
        let last_input_time = Arc::clone(&self.last_input_time);

        self.input_thread = Some(thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            let mut scanner = InputScanner::new(timeout_ms);

            while !stop_flag.load(Ordering::SeqCst) {
                let now = Instant::now();
                let poll_ms = scanner.next_timeout_ms(now, INPUT_POLL_MS);
                let sequences = if poll_readable(stdin_fd, poll_ms) {
                    let read_len = unsafe {
                        libc::read(stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len())
                    };
                    if read_len <= 0 {
                        Vec::new()
                    } else {
                        last_input_time.store(now_ms(), Ordering::SeqCst);
                        scanner.process(&buffer[..read_len as usize])
                    }
                } else {
                    scanner.flush_due(now)
                };

                if sequences.is_empty() || drain_mode.load(Ordering::SeqCst) {
                    continue;
                }

                let mut handler = lock(&input_handler);
                if let Some(handler) = handler.as_mut() {
                    for sequence in sequences {
                        handler(sequence);
                    }
                }
            }
        }));
    }

    fn stop_input_thread(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
    }

    fn start_resize_thread(&mut self) -> Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH]).map_err(Error::SignalRegistration)?;
        let handle = signals.handle();
        let resize_handler = Arc::clone(&self.resize_handler);

        let thread = thread::spawn(move || {
            for _ in signals.forever() {
                if let Some(handler) = lock(&resize_handler).as_mut() {
                    handler();
                }
            }
        });

        self.resize_signal_handle = Some(handle);
        self.resize_thread = Some(thread);
        Ok(())
    }

    fn stop_resize_thread(&mut self) {
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn clear_handlers(&self) {
        *lock(&self.input_handler) = None;
        *lock(&self.resize_handler) = None;
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> Result<()> {
        *lock(&self.input_handler) = Some(on_input);
        *lock(&self.resize_handler) = Some(on_resize);

        self.stop_flag.store(false, Ordering::SeqCst);
        self.drain_mode.store(false, Ordering::SeqCst);
        self.last_input_time.store(now_ms(), Ordering::SeqCst);

        if let Err(err) = self.start_resize_thread() {
            self.clear_handlers();
            return Err(err);
        }
        self.start_input_thread();
        debug!(stdin_fd = self.stdin_fd, "process terminal started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stop_input_thread();
        self.stop_resize_thread();
        self.clear_handlers();

        // Flush input before leaving raw mode so buffered bytes don't leak to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.leave_raw_mode()?;
        debug!("process terminal stopped");
        Ok(())
    }

    fn set_raw_mode(&mut self, enabled: bool) -> Result<bool> {
        if !enabled {
            self.leave_raw_mode()?;
            return Ok(true);
        }
        if !is_tty(self.stdin_fd) {
            warn!(fd = self.stdin_fd, "stdin is not a terminal; raw mode skipped");
            return Ok(false);
        }
        self.enter_raw_mode()?;
        Ok(true)
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.drain_mode.store(true, Ordering::SeqCst);
        self.last_input_time.store(now_ms(), Ordering::SeqCst);

        let end_time = now_ms().saturating_add(max_ms);
        loop {
            let now = now_ms();
            if now >= end_time {
                break;
            }
            let last_input = self.last_input_time.load(Ordering::SeqCst);
            if now.saturating_sub(last_input) >= idle_ms {
                break;
            }
            let sleep_for = idle_ms.min(end_time.saturating_sub(now)).max(1);
            thread::sleep(Duration::from_millis(sleep_for));
        }

        self.drain_mode.store(false, Ordering::SeqCst);
    }

    fn write(&mut self, data: &str) {
        if let Err(err) = write_fd(self.stdout_fd, data) {
            if !self.write_failed {
                error!(%err, "terminal write failed");
            }
            self.write_failed = true;
        }
        self.write_log.append(data);
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(FALLBACK_COLUMNS)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(FALLBACK_ROWS)
    }

    fn emergency_restore(&self) -> Option<EmergencyRestore> {
        let fd = self.stdin_fd;
        let original = match self.original_termios {
            Some(original) => original,
            None => get_termios(fd).ok()?,
        };
        Some(Arc::new(move || {
            let _ = set_termios(fd, &original);
        }))
    }
}

/// Keeps the SIGINT/SIGTERM cleanup thread alive.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Run `cleanup` on SIGINT/SIGTERM, then terminate with the signal's default action.
#[cfg(unix)]
pub fn install_signal_handlers<F>(cleanup: F) -> Result<SignalHookGuard>
where
    F: Fn() + Send + Sync + 'static,
{
    let mut signals =
        Signals::new([libc::SIGINT, libc::SIGTERM]).map_err(Error::SignalRegistration)?;
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            cleanup();
            unsafe {
                libc::signal(signal, libc::SIG_DFL);
                libc::raise(signal);
            }
        }
    });

    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

type PanicCleanup = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Default)]
struct PanicCleanups {
    next_id: u64,
    entries: Vec<(u64, PanicCleanup)>,
}

static PANIC_CLEANUPS: Mutex<PanicCleanups> = Mutex::new(PanicCleanups {
    next_id: 0,
    entries: Vec::new(),
});
static PANIC_HOOK_WRAPPER: std::sync::Once = std::sync::Once::new();

fn run_panic_cleanups() {
    // A panic while the registry is held would deadlock on `lock()`.
    let entries: Vec<PanicCleanup> = match PANIC_CLEANUPS.try_lock() {
        Ok(cleanups) => cleanups.entries.iter().map(|(_, f)| Arc::clone(f)).collect(),
        Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned
            .into_inner()
            .entries
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect(),
        Err(std::sync::TryLockError::WouldBlock) => return,
    };
    for cleanup in entries {
        cleanup();
    }
}

/// Unregisters a panic cleanup on drop.
pub struct PanicHookGuard {
    id: u64,
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        lock(&PANIC_CLEANUPS)
            .entries
            .retain(|(id, _)| *id != self.id);
    }
}

/// Run `cleanup` when any thread panics, before the previously installed hook.
///
/// The wrapper hook is installed once per process; it is inert while no guard
/// is alive.
pub fn install_panic_hook<F>(cleanup: F) -> PanicHookGuard
where
    F: Fn() + Send + Sync + 'static,
{
    PANIC_HOOK_WRAPPER.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            run_panic_cleanups();
            previous(info);
        }));
    });

    let mut cleanups = lock(&PANIC_CLEANUPS);
    let id = cleanups.next_id;
    cleanups.next_id += 1;
    cleanups.entries.push((id, Arc::new(cleanup)));
    PanicHookGuard { id }
}

/// Write-only terminal for panic/signal cleanup.
///
/// Never panics, never blocks, never touches termios.
#[cfg(unix)]
pub(crate) struct HookTerminal {
    fd: c_int,
    owns_fd: bool,
}

#[cfg(unix)]
impl HookTerminal {
    pub(crate) fn new() -> Self {
        // The controlling TTY works even when stdout is redirected.
        let flags = libc::O_WRONLY | libc::O_NONBLOCK | libc::O_NOCTTY | libc::O_CLOEXEC;
        let fd = unsafe { libc::open(c"/dev/tty".as_ptr(), flags) };
        Self {
            fd,
            owns_fd: fd >= 0,
        }
    }

    fn write_best_effort(&self, data: &str) {
        if self.fd < 0 || data.is_empty() {
            return;
        }
        let bytes = data.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            let remaining = &bytes[written..];
            let result = unsafe {
                libc::write(
                    self.fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                )
            };
            if result > 0 {
                written = written.saturating_add(result as usize);
                continue;
            }
            if result < 0
                && std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted
            {
                continue;
            }
            // EAGAIN or any other error: drop the rest.
            break;
        }
    }
}

#[cfg(unix)]
impl Drop for HookTerminal {
    fn drop(&mut self) {
        if self.owns_fd {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

#[cfg(unix)]
impl Terminal for HookTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_raw_mode(&mut self, _enabled: bool) -> Result<bool> {
        Ok(false)
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, data: &str) {
        self.write_best_effort(data);
    }

    fn columns(&self) -> u16 {
        FALLBACK_COLUMNS
    }

    fn rows(&self) -> u16 {
        FALLBACK_ROWS
    }
}

#[cfg(not(unix))]
pub struct ProcessTerminal {
    write_log: WriteLog,
}

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self::with_config(&EnvConfig::from_env())
    }

    pub fn with_config(config: &EnvConfig) -> Self {
        Self {
            write_log: WriteLog::new(config.write_log.as_deref()),
        }
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> Result<()> {
        Err(Error::NotATerminal("process terminal requires a Unix platform"))
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_raw_mode(&mut self, _enabled: bool) -> Result<bool> {
        Ok(false)
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, data: &str) {
        let mut stdout = std::io::stdout();
        if let Err(err) = stdout.write_all(data.as_bytes()).and_then(|_| stdout.flush()) {
            error!(%err, "terminal write failed");
        }
        self.write_log.append(data);
    }

    fn columns(&self) -> u16 {
        FALLBACK_COLUMNS
    }

    fn rows(&self) -> u16 {
        FALLBACK_ROWS
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Mutex, OnceLock,
    };
    use std::time::{Duration, Instant};

    use super::{
        get_termios, install_panic_hook, poll_readable, write_all_fd_with, HookTerminal,
        ProcessTerminal,
    };
    use crate::config::EnvConfig;
    use crate::core::terminal::Terminal;

    use libc::{self, c_int};

    struct Pty {
        master: c_int,
        slave: c_int,
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.master);
                libc::close(self.slave);
            }
        }
    }

    fn open_pty() -> Pty {
        let mut master: c_int = 0;
        let mut slave: c_int = 0;
        let result = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, 0, "openpty failed");
        Pty { master, slave }
    }

    fn pty_terminal(pty: &Pty) -> ProcessTerminal {
        let mut terminal = ProcessTerminal::with_config(&EnvConfig::default());
        terminal.stdin_fd = pty.slave;
        terminal.stdout_fd = pty.slave;
        terminal
    }

    fn write_master(pty: &Pty, bytes: &[u8]) {
        let _ = unsafe {
            libc::write(
                pty.master,
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
            )
        };
    }

    fn read_available(fd: c_int, timeout: Duration) -> Vec<u8> {
        let end = Instant::now() + timeout;
        let mut out = Vec::new();
        while Instant::now() < end {
            let remaining = end.saturating_duration_since(Instant::now());
            let timeout_ms = remaining.as_millis().min(i32::MAX as u128) as i32;
            if timeout_ms == 0 || !poll_readable(fd, timeout_ms) {
                break;
            }
            let mut buf = [0u8; 1024];
            let read_len = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut _, buf.len()) };
            if read_len <= 0 {
                break;
            }
            out.extend_from_slice(&buf[..read_len as usize]);
        }
        out
    }

    fn panic_hook_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn panic_cleanup_runs_only_while_guard_is_alive() {
        let _lock = panic_hook_test_lock()
            .lock()
            .expect("panic hook test lock poisoned");

        let calls = Arc::new(AtomicUsize::new(0));
        let guard = install_panic_hook({
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let _ = std::panic::catch_unwind(|| panic!("first"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(guard);
        let _ = std::panic::catch_unwind(|| panic!("second"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hook_terminal_write_best_effort_returns_on_would_block() {
        let mut fds = [0 as c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0, "pipe failed");
        let (read_fd, write_fd) = (fds[0], fds[1]);

        let flags = unsafe { libc::fcntl(write_fd, libc::F_GETFL) };
        unsafe { libc::fcntl(write_fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        let buf = [b'x'; 4096];
        let fill = |fd: c_int| unsafe {
            libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len())
        };
        while fill(write_fd) > 0 {}

        let terminal = HookTerminal {
            fd: write_fd,
            owns_fd: false,
        };
        terminal.write_best_effort("\x1b[?25h");

        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
    }

    #[test]
    fn pty_start_stop_do_not_write_output() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);

        terminal
            .start(Box::new(|_| {}), Box::new(|| {}))
            .expect("terminal start");
        let output = read_available(pty.master, Duration::from_millis(200));
        assert!(output.is_empty(), "start() wrote {:?}", String::from_utf8_lossy(&output));

        terminal.stop().expect("terminal stop");
        let output = read_available(pty.master, Duration::from_millis(200));
        assert!(output.is_empty(), "stop() wrote {:?}", String::from_utf8_lossy(&output));
    }

    #[test]
    fn raw_mode_round_trips_termios_on_a_pty() {
        let pty = open_pty();
        let original = get_termios(pty.slave).expect("get termios");
        let mut terminal = pty_terminal(&pty);

        assert!(terminal.set_raw_mode(true).expect("raw on"));
        let raw = get_termios(pty.slave).expect("get termios");
        assert_eq!(raw.c_lflag & libc::ICANON, 0);

        assert!(terminal.set_raw_mode(false).expect("raw off"));
        let restored = get_termios(pty.slave).expect("get termios");
        assert_eq!(restored.c_lflag & libc::ICANON, original.c_lflag & libc::ICANON);
    }

    #[test]
    fn stop_restores_cooked_mode() {
        let pty = open_pty();
        let original = get_termios(pty.slave).expect("get termios");
        let mut terminal = pty_terminal(&pty);

        terminal
            .start(Box::new(|_| {}), Box::new(|| {}))
            .expect("terminal start");
        terminal.set_raw_mode(true).expect("raw on");
        terminal.stop().expect("terminal stop");

        let restored = get_termios(pty.slave).expect("get termios");
        assert_eq!(restored.c_lflag & libc::ICANON, original.c_lflag & libc::ICANON);
    }

    #[test]
    fn emergency_restore_reapplies_saved_termios() {
        let pty = open_pty();
        let original = get_termios(pty.slave).expect("get termios");
        let mut terminal = pty_terminal(&pty);

        let restore = terminal.emergency_restore().expect("restore available");
        terminal.set_raw_mode(true).expect("raw on");
        restore();

        let restored = get_termios(pty.slave).expect("get termios");
        assert_eq!(restored.c_lflag & libc::ICANON, original.c_lflag & libc::ICANON);
    }

    #[test]
    fn raw_mode_is_skipped_on_a_pipe() {
        let mut fds = [0 as c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0, "pipe failed");

        let mut terminal = ProcessTerminal::with_config(&EnvConfig::default());
        terminal.stdin_fd = fds[0];
        assert!(!terminal.set_raw_mode(true).expect("raw toggle"));

        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn drain_input_returns_within_limits() {
        let pty = open_pty();
        let mut terminal = pty_terminal(&pty);
        terminal
            .start(Box::new(|_| {}), Box::new(|| {}))
            .expect("terminal start");

        let start = Instant::now();
        terminal.drain_input(200, 50);
        assert!(start.elapsed() <= Duration::from_millis(300));

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn mouse_report_reaches_handler_as_one_chunk() {
        let pty = open_pty();
        let (tx, rx) = mpsc::channel();
        let mut terminal = pty_terminal(&pty);
        terminal.set_raw_mode(true).expect("raw on");
        terminal
            .start(
                Box::new(move |data| {
                    let _ = tx.send(data);
                }),
                Box::new(|| {}),
            )
            .expect("terminal start");

        write_master(&pty, b"\x1b[<0;3;4Mq");

        let first = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("missing mouse report");
        let second = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("missing key");
        assert_eq!(first, "\x1b[<0;3;4M");
        assert_eq!(second, "q");

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn write_all_fd_with_retries_on_eintr_and_writes_all_bytes() {
        let data = b"hello";
        let mut out = Vec::new();
        let mut calls = 0;
        write_all_fd_with(
            1,
            data,
            |_, buf| {
                calls += 1;
                match calls {
                    1 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    2 => {
                        out.extend_from_slice(&buf[..2]);
                        Ok(2)
                    }
                    _ => {
                        out.extend_from_slice(buf);
                        Ok(buf.len())
                    }
                }
            },
            |_| unreachable!("EINTR must not wait"),
        )
        .expect("write_all_fd_with failed");
        assert_eq!(out, data);
    }

    #[test]
    fn write_all_fd_with_waits_for_writable_on_would_block() {
        let data = b"xyz";
        let mut out = Vec::new();
        let events = std::cell::RefCell::new(Vec::new());
        let mut calls = 0;
        write_all_fd_with(
            1,
            data,
            |_, buf| {
                events.borrow_mut().push("write");
                calls += 1;
                if calls == 1 {
                    return Err(io::Error::from(io::ErrorKind::WouldBlock));
                }
                out.extend_from_slice(buf);
                Ok(buf.len())
            },
            |_| {
                events.borrow_mut().push("wait");
                Ok(())
            },
        )
        .expect("write_all_fd_with failed");

        assert_eq!(out, data);
        assert_eq!(events.into_inner(), vec!["write", "wait", "write"]);
    }
}
