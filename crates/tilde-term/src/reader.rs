// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources — where raw terminal input comes from.
//
// In raw mode with VMIN=0 / VTIME=1, read() on the terminal returns after
// at most 100ms, possibly with zero bytes. That timeout is the only way the
// key decoder can tell a lone Escape keypress from the start of an escape
// sequence, so it is surfaced as `Ok(None)` rather than an error. Callers
// decide whether a timeout means "retry" (waiting for the next key) or
// "give up" (inside a sequence).
//
// `VecDeque<u8>` is a source too: an exhausted queue behaves like a
// terminal that stopped sending, which is how tests script input.

use std::collections::VecDeque;
#[cfg(unix)]
use std::io;

use crate::error::TerminalError;

/// A blocking, timeout-bounded source of single bytes.
pub trait ByteSource {
    /// Read one byte.
    ///
    /// Returns `Ok(None)` when the read timeout elapsed with no input.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Read`] for any failure other than a
    /// timeout, would-block, or interrupted call.
    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError>;
}

impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        Ok(self.pop_front())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        (**self).read_byte()
    }
}

/// The process's standard input, read one byte at a time.
///
/// Bypasses `io::stdin()`'s internal buffer: a buffered reader would pull
/// a whole escape sequence into memory and hide the byte-level timeouts
/// the decoder relies on.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdin;

#[cfg(unix)]
impl ByteSource for Stdin {
    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(TerminalError::Read(err)),
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
