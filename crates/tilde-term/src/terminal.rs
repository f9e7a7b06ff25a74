// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, size query, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd writes, the POSIX interfaces
// for terminal control. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's line-discipline state. `Terminal::enter`
// captures the current configuration once and installs raw mode;
// `Terminal::leave` puts the captured configuration back. The snapshot is
// restored exactly once however the process ends:
//
//   - normal quit and `?`-propagated errors go through `leave()` (or Drop),
//   - a panic goes through the panic hook, which restores from a
//     process-wide backup slot.
//
// Both paths disarm the backup slot with `Option::take`, so whichever runs
// first wins and the other becomes a no-op.

use std::io::Write;
#[cfg(unix)]
use std::sync::{Mutex, Once};

use bitflags::bitflags;
use tracing::{debug, info};

use crate::ansi;
use crate::error::TerminalError;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Create a size.
    #[inline]
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// terminal reports zero columns.
#[cfg(unix)]
#[must_use]
pub fn os_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn os_size() -> Option<Size> {
    None
}

// ─── Raw Mode Configuration ─────────────────────────────────────────────────

bitflags! {
    /// Line-discipline features that raw mode switches off.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RawFlags: u16 {
        /// Line buffering (ICANON).
        const CANONICAL         = 1 << 0;
        /// Echo of typed input (ECHO).
        const ECHO              = 1 << 1;
        /// Ctrl-C / Ctrl-Z signal generation (ISIG).
        const SIGNALS           = 1 << 2;
        /// Ctrl-V literal-next and friends (IEXTEN).
        const EXTENDED_INPUT    = 1 << 3;
        /// Break condition sends SIGINT (BRKINT).
        const BREAK_INTERRUPT   = 1 << 4;
        /// Carriage return translated to newline on input (ICRNL).
        const CR_TO_NL          = 1 << 5;
        /// Input parity checking (INPCK).
        const PARITY_CHECK      = 1 << 6;
        /// Stripping of the 8th bit (ISTRIP).
        const STRIP_HIGH_BIT    = 1 << 7;
        /// Ctrl-S / Ctrl-Q software flow control (IXON).
        const FLOW_CONTROL      = 1 << 8;
        /// Output post-processing such as `\n` → `\r\n` (OPOST).
        const OUTPUT_PROCESSING = 1 << 9;
    }
}

/// How raw mode is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawModeConfig {
    /// Features to switch off.
    pub disable: RawFlags,
    /// VMIN: bytes a read waits for before returning.
    pub min_bytes: u8,
    /// VTIME: read timeout in tenths of a second.
    pub timeout_tenths: u8,
}

impl Default for RawModeConfig {
    /// Everything off; reads return after at most 100ms with zero or more bytes.
    fn default() -> Self {
        Self {
            disable: RawFlags::all(),
            min_bytes: 0,
            timeout_tenths: 1,
        }
    }
}

/// Derive the raw configuration from `original`.
///
/// Pure: touches no device. Character size is always forced to 8 bits.
#[cfg(unix)]
#[must_use]
pub fn make_raw(original: &libc::termios, config: &RawModeConfig) -> libc::termios {
    let mut raw = *original;
    let off = config.disable;

    let mut iflag: libc::tcflag_t = 0;
    if off.contains(RawFlags::BREAK_INTERRUPT) {
        iflag |= libc::BRKINT;
    }
    if off.contains(RawFlags::CR_TO_NL) {
        iflag |= libc::ICRNL;
    }
    if off.contains(RawFlags::PARITY_CHECK) {
        iflag |= libc::INPCK;
    }
    if off.contains(RawFlags::STRIP_HIGH_BIT) {
        iflag |= libc::ISTRIP;
    }
    if off.contains(RawFlags::FLOW_CONTROL) {
        iflag |= libc::IXON;
    }

    let mut lflag: libc::tcflag_t = 0;
    if off.contains(RawFlags::CANONICAL) {
        lflag |= libc::ICANON;
    }
    if off.contains(RawFlags::ECHO) {
        lflag |= libc::ECHO;
    }
    if off.contains(RawFlags::SIGNALS) {
        lflag |= libc::ISIG;
    }
    if off.contains(RawFlags::EXTENDED_INPUT) {
        lflag |= libc::IEXTEN;
    }

    raw.c_iflag &= !iflag;
    raw.c_lflag &= !lflag;
    if off.contains(RawFlags::OUTPUT_PROCESSING) {
        raw.c_oflag &= !libc::OPOST;
    }
    raw.c_cflag |= libc::CS8;

    raw.c_cc[libc::VMIN] = config.min_bytes;
    raw.c_cc[libc::VTIME] = config.timeout_tenths;
    raw
}

// ─── Device ─────────────────────────────────────────────────────────────────

/// Access to a terminal's line-discipline configuration.
pub trait Device {
    /// An opaque snapshot of the configuration.
    type Mode: Clone;

    /// Read the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Attributes`] if the device refuses.
    fn capture(&mut self) -> Result<Self::Mode, TerminalError>;

    /// Apply a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Attributes`] if the device refuses.
    fn apply(&mut self, mode: &Self::Mode) -> Result<(), TerminalError>;

    /// Derive the raw configuration from `original`.
    fn make_raw(&self, original: &Self::Mode, config: &RawModeConfig) -> Self::Mode;

    /// Register `original` for restoration by the panic hook.
    fn arm_emergency_restore(&self, _original: &Self::Mode) {}

    /// Withdraw the panic-hook registration.
    ///
    /// Returns `false` if the hook already restored the terminal.
    fn disarm_emergency_restore(&self) -> bool {
        true
    }
}

/// The controlling terminal, addressed through stdin.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Tty;

#[cfg(unix)]
impl Device for Tty {
    type Mode = libc::termios;

    fn capture(&mut self) -> Result<libc::termios, TerminalError> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(TerminalError::attributes("tcgetattr"));
            }
            Ok(termios)
        }
    }

    fn apply(&mut self, mode: &libc::termios) -> Result<(), TerminalError> {
        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, mode) != 0 {
                return Err(TerminalError::attributes("tcsetattr"));
            }
        }
        Ok(())
    }

    fn make_raw(&self, original: &libc::termios, config: &RawModeConfig) -> libc::termios {
        make_raw(original, config)
    }

    fn arm_emergency_restore(&self, original: &libc::termios) {
        install_panic_hook();
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(*original);
        }
    }

    fn disarm_emergency_restore(&self) -> bool {
        TERMIOS_BACKUP
            .lock()
            .map_or(true, |mut guard| guard.take().is_some())
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the original termios for panic recovery.
///
/// The [`Terminal`] owns the snapshot, but the panic hook can't reach it.
/// `Some` means "armed": the next restore path to `take()` it does the work.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Clear screen, home cursor, show cursor. Written before the termios restore.
#[cfg(unix)]
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard — ensures the hook is installed at most once per process.
#[cfg(unix)]
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios if still armed, then delegates
/// to the original handler so the message lands on a working terminal.
#[cfg(unix)]
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_from_backup();

            original(info);
        }));
    });
}

#[cfg(unix)]
fn restore_from_backup() {
    let armed = TERMIOS_BACKUP.lock().ok().and_then(|mut guard| guard.take());
    if let Some(ref original) = armed {
        unsafe {
            let _ = libc::write(
                libc::STDOUT_FILENO,
                EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                EMERGENCY_RESTORE.len(),
            );
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
        }
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Raw-mode controller with RAII cleanup.
///
/// # Example
///
/// ```no_run
/// use tilde_term::terminal::{RawModeConfig, Terminal, Tty};
///
/// let mut term = Terminal::new(Tty, RawModeConfig::default());
/// term.enter()?;
/// // ... render frames, read keys ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), tilde_term::TerminalError>(())
/// ```
pub struct Terminal<D: Device> {
    device: D,
    config: RawModeConfig,
    /// Configuration captured by the first successful `enter()`. Kept for
    /// the life of the controller; later `enter()` calls reuse it.
    saved: Option<D::Mode>,
    /// Raw mode is installed and `saved` still has to be reapplied.
    active: bool,
}

impl<D: Device> Terminal<D> {
    /// Wrap a device. Does **not** enter raw mode.
    pub const fn new(device: D, config: RawModeConfig) -> Self {
        Self {
            device,
            config,
            saved: None,
            active: false,
        }
    }

    /// Whether raw mode is installed.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The configuration captured by the first `enter()`, if any.
    #[must_use]
    pub const fn saved_mode(&self) -> Option<&D::Mode> {
        self.saved.as_ref()
    }

    /// The wrapped device.
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Capture the current configuration and install raw mode.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op. Only
    /// the first successful call captures; entering again after `leave()`
    /// reuses that snapshot, so it is always the pre-raw configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Attributes`] if the attributes cannot be read
    /// or applied. Nothing is left armed on failure.
    pub fn enter(&mut self) -> Result<(), TerminalError> {
        if self.active {
            return Ok(());
        }

        let original = match self.saved.clone() {
            Some(mode) => mode,
            None => self.device.capture()?,
        };
        let raw = self.device.make_raw(&original, &self.config);

        self.device.arm_emergency_restore(&original);
        if let Err(err) = self.device.apply(&raw) {
            self.device.disarm_emergency_restore();
            return Err(err);
        }

        self.saved = Some(original);
        self.active = true;
        info!(target: "term.mode", "raw mode entered");
        Ok(())
    }

    /// Reapply the captured configuration.
    ///
    /// Idempotent: a second `leave()` (or a `leave()` after the panic hook
    /// already restored) does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Attributes`] if the restore fails.
    pub fn leave(&mut self) -> Result<(), TerminalError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let Some(original) = self.saved.as_ref() else {
            return Ok(());
        };
        if !self.device.disarm_emergency_restore() {
            debug!(target: "term.mode", "already restored by panic hook");
            return Ok(());
        }
        self.device.apply(original)?;
        info!(target: "term.mode", "raw mode left");
        Ok(())
    }

    /// Clear the screen, home the cursor, then [`leave`](Self::leave).
    ///
    /// The quit and fatal-error paths both use this so the user's shell
    /// comes back on a clean screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore fails. Screen-clear write errors are
    /// ignored so they cannot prevent the mode restore.
    pub fn leave_and_clear(&mut self, out: &mut impl Write) -> Result<(), TerminalError> {
        if self.active {
            let _ = ansi::clear_and_home(out).and_then(|()| out.flush());
        }
        self.leave()
    }
}

impl<D: Device> Drop for Terminal<D> {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
