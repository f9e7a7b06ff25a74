// SPDX-License-Identifier: MIT
//
// tilde — a minimal terminal screen editor.
//
// This is the main binary that wires the two crates together:
//
//   tilde-term   → raw mode, key decoding, geometry, frame output, event loop
//   tilde-editor → editor state, cursor movement, frame composition
//
// The Editor struct implements tilde-term's App trait. Each keypress flows
// through:
//
//   stdin → KeyDecoder → on_key → EditorState::dispatch → cursor mutation
//   render → view::render → FrameBuffer → one write() → terminal
//
// Startup and shutdown:
//
//   enter raw mode → resolve geometry → event loop
//        ↓ quit or fatal error
//   clear + home → restore mode → diagnostic (on error) → exit status
//
// The terminal is restored before the process exits on every path. A
// panic restores it through the hook installed by `Terminal::enter`.

use std::io::Write;
use std::path::Path;
use std::process;

use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use tilde_editor::document::Document;
use tilde_editor::options::Options;
use tilde_editor::state::EditorState;
use tilde_editor::view;

use tilde_term::event_loop::{Action, App, EventLoop};
use tilde_term::geometry;
use tilde_term::output::FrameBuffer;
use tilde_term::reader::ByteSource;
use tilde_term::terminal::{Device, Terminal};
use tilde_term::{Key, Size, TerminalError};

// ─── Editor ─────────────────────────────────────────────────────────────────

/// The application: session state plus the options it was started with.
struct Editor {
    state: EditorState,
    options: Options,
}

impl Editor {
    fn new(screen: Size, document: Document, options: Options) -> Self {
        let state = EditorState::new(screen, document).with_clamp(options.clamp);
        Self { state, options }
    }
}

impl App for Editor {
    fn render(&self) -> FrameBuffer {
        view::render(&self.state, &self.options)
    }

    fn on_key(&mut self, key: Key) -> Action {
        self.state.dispatch(key, self.options.quit_key)
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Route `tracing` output to the configured log file.
///
/// Stdout is the drawing surface, so logs never go there. Returns the
/// writer guard, which must outlive every log call; `None` when logging is
/// disabled or the file cannot be opened.
fn init_logging(options: &Options) -> Option<WorkerGuard> {
    let path = options.log_file.as_deref()?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?.to_str()?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&options.log_filter))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Run one editing session on `term`.
///
/// Raw mode is entered first and left on every return path, with the screen
/// cleared through `out`, before the result is handed back. `os` is the
/// size the OS reported, if any.
fn run<D: Device>(
    term: &mut Terminal<D>,
    os: Option<Size>,
    input: &mut impl ByteSource,
    out: &mut impl Write,
    options: &Options,
) -> Result<(), TerminalError> {
    term.enter()?;
    let result = session(os, input, out, options);
    let restored = term.leave_and_clear(out);
    result.and(restored)
}

/// Resolve the screen size and drive the event loop until quit.
fn session(
    os: Option<Size>,
    input: &mut impl ByteSource,
    out: &mut impl Write,
    options: &Options,
) -> Result<(), TerminalError> {
    let screen = geometry::resolve(os, out, input)?;
    tracing::info!(target: "runtime", cols = screen.cols, rows = screen.rows, "session start");

    let mut editor = Editor::new(screen, Document::empty(), options.clone());
    EventLoop::new(input, out).run(&mut editor)
}

/// [`run`] on the controlling terminal.
#[cfg(unix)]
fn run_tty(options: &Options) -> Result<(), TerminalError> {
    use tilde_term::output::RawStdout;
    use tilde_term::reader::Stdin;
    use tilde_term::terminal::{self, Tty};

    let mut term = Terminal::new(Tty, options.raw_mode);
    run(&mut term, terminal::os_size(), &mut Stdin, &mut RawStdout, options)
}

// ─── Entry point ────────────────────────────────────────────────────────────

#[cfg(unix)]
fn main() {
    let options = Options::default();
    let log_guard = init_logging(&options);

    let code = match run_tty(&options) {
        Ok(()) => 0,
        Err(err) => {
            error!(target: "runtime", %err, "fatal");
            eprintln!("tilde: {err}");
            1
        }
    };

    // process::exit skips destructors; flush the log writer first.
    drop(log_guard);
    process::exit(code);
}

#[cfg(not(unix))]
fn main() {
    let options = Options::default();
    let _log_guard = init_logging(&options);
    error!(target: "runtime", "unsupported platform");
    eprintln!("tilde: raw terminal mode requires a Unix terminal");
    process::exit(1);
}

// ─── Tests ──────────────────────────────────────────────────────────────────
