// SPDX-License-Identifier: MIT
//
// Event loop — the heartbeat of the editor.
//
// Render, read, dispatch, repeat. Each cycle the application composes a
// fresh frame, the loop flushes it to the terminal in one write, then
// blocks on the key decoder until a key arrives and hands it back to the
// application. There is no tick and no background work: nothing changes
// on screen unless the user pressed something.
//
// The loop owns neither the terminal mode nor the process. It returns on
// `Action::Quit` or on the first fatal error; restoring the terminal and
// choosing the exit status is the caller's job.

use std::io::Write;

use tracing::info;

use crate::error::TerminalError;
use crate::input::{Key, KeyDecoder};
use crate::output::FrameBuffer;
use crate::reader::ByteSource;

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
pub trait App {
    /// Compose the current state into a frame.
    fn render(&self) -> FrameBuffer;

    /// Handle one decoded key.
    ///
    /// Return [`Action::Quit`] to exit the event loop.
    fn on_key(&mut self, key: Key) -> Action;
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The render → read → dispatch loop.
///
/// # Example
///
/// ```no_run
/// use std::collections::VecDeque;
/// use tilde_term::event_loop::{Action, App, EventLoop};
/// use tilde_term::output::FrameBuffer;
/// use tilde_term::Key;
///
/// struct QuitOnQ;
///
/// impl App for QuitOnQ {
///     fn render(&self) -> FrameBuffer {
///         FrameBuffer::new()
///     }
///
///     fn on_key(&mut self, key: Key) -> Action {
///         if key == Key::Char(b'q') { Action::Quit } else { Action::Continue }
///     }
/// }
///
/// let input: VecDeque<u8> = VecDeque::from(vec![b'q']);
/// let mut event_loop = EventLoop::new(input, Vec::new());
/// event_loop.run(&mut QuitOnQ)?;
/// # Ok::<(), tilde_term::TerminalError>(())
/// ```
pub struct EventLoop<S, W> {
    decoder: KeyDecoder<S>,
    out: W,
}

impl<S: ByteSource, W: Write> EventLoop<S, W> {
    /// Create a loop reading keys from `input` and writing frames to `out`.
    pub const fn new(input: S, out: W) -> Self {
        Self {
            decoder: KeyDecoder::new(input),
            out,
        }
    }

    /// Consume the loop, returning the output device.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run one cycle: render, flush, read one key, dispatch it.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Write`] if the frame cannot be written or
    /// [`TerminalError::Read`] if the key cannot be read.
    pub fn step(&mut self, app: &mut impl App) -> Result<Action, TerminalError> {
        app.render()
            .flush_to(&mut self.out)
            .map_err(TerminalError::Write)?;
        let key = self.decoder.next_key()?;
        Ok(app.on_key(key))
    }

    /// Run until the application returns [`Action::Quit`].
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`TerminalError`].
    pub fn run(&mut self, app: &mut impl App) -> Result<(), TerminalError> {
        loop {
            if self.step(app)? == Action::Quit {
                info!(target: "runtime", "quit requested");
                return Ok(());
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::io;

    /// Records keys and renders a frame numbered by the render count.
    struct Recorder {
        keys: Vec<Key>,
        renders: std::cell::Cell<usize>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                keys: Vec::new(),
                renders: std::cell::Cell::new(0),
            }
        }
    }

    impl App for Recorder {
        fn render(&self) -> FrameBuffer {
            let n = self.renders.get() + 1;
            self.renders.set(n);
            let mut frame = FrameBuffer::new();
            frame.append(format!("[{n}]").as_bytes());
            frame
        }

        fn on_key(&mut self, key: Key) -> Action {
            self.keys.push(key);
            if key == Key::Char(b'q') {
                Action::Quit
            } else {
                Action::Continue
            }
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn queue(bytes: &[u8]) -> VecDeque<u8> {
        bytes.iter().copied().collect()
    }

    #[test]
    fn action_equality() {
        assert_eq!(Action::Continue, Action::Continue);
        assert_ne!(Action::Continue, Action::Quit);
    }

    #[test]
    fn renders_before_every_read() {
        let mut app = Recorder::new();
        let mut event_loop = EventLoop::new(queue(b"ab\x1b[Aq"), Vec::new());
        event_loop.run(&mut app).unwrap();

        assert_eq!(
            app.keys,
            vec![Key::Char(b'a'), Key::Char(b'b'), Key::ArrowUp, Key::Char(b'q')]
        );
        assert_eq!(app.renders.get(), 4);
        assert_eq!(event_loop.into_output(), b"[1][2][3][4]");
    }

    #[test]
    fn step_returns_app_action() {
        let mut app = Recorder::new();
        let mut event_loop = EventLoop::new(queue(b"xq"), Vec::new());
        assert_eq!(event_loop.step(&mut app).unwrap(), Action::Continue);
        assert_eq!(event_loop.step(&mut app).unwrap(), Action::Quit);
    }

    #[test]
    fn write_failure_is_fatal() {
        let mut app = Recorder::new();
        let mut event_loop = EventLoop::new(queue(b"q"), FailingWriter);
        let err = event_loop.run(&mut app).unwrap_err();
        assert!(matches!(err, TerminalError::Write(_)));
        assert!(app.keys.is_empty());
    }
}
