// SPDX-License-Identifier: MIT
//
// tilde-term — Terminal I/O core for the tilde editor.
//
// Turns a line-buffered, echoing console into a raw byte stream, decodes
// that stream into logical keys (including the multi-byte escape sequences
// for arrows, paging, and navigation), discovers the terminal's geometry
// with a cursor-probe fallback, and writes each frame in a single call.
//
// Direct termios and ANSI escape sequences, no TUI framework in between.
// Every device interaction sits behind a small trait (`Device`,
// `ByteSource`, `io::Write`) so the protocol logic runs in tests without
// a TTY.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;

pub use error::{GeometryError, ProtocolError, TerminalError};
pub use input::Key;
pub use terminal::Size;
