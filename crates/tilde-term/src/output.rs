// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Frame assembly.
//
// A `FrameBuffer` accumulates every byte of one screen refresh in memory so
// the whole frame reaches the terminal in a single write() call. Many small
// writes let the terminal paint half-updated rows between them; one write
// does not. A buffer lives for exactly one render cycle: created fresh,
// appended to, flushed once, dropped.
//
// `io::stdout()` is line-buffered and would split a frame at its last
// newline, so the real device is written through `RawStdout`, one write()
// per call.

use std::io::{self, Write};

/// Starting capacity. A full 80×24 frame of markers and escapes is well
/// under this, so typical frames never reallocate.
const DEFAULT_CAPACITY: usize = 4096;

/// An append-only byte buffer for one output frame.
///
/// Growth is best-effort: if the allocator refuses, the append is dropped
/// and the frame renders incomplete rather than aborting the process.
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    /// Create an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Append `bytes` to the frame.
    ///
    /// Silently drops the bytes if the buffer cannot grow.
    pub fn append(&mut self, bytes: &[u8]) {
        if self.buf.try_reserve(bytes.len()).is_err() {
            tracing::warn!(target: "term.output", dropped = bytes.len(), "frame append dropped");
            return;
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Write the whole frame to `w` in one call, then discard it.
    ///
    /// Returns how many bytes the device accepted. A short write is not
    /// retried: the next frame repaints everything anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or flush fails.
    pub fn flush_to(self, w: &mut impl Write) -> io::Result<usize> {
        if self.buf.is_empty() {
            return Ok(0);
        }
        let written = w.write(&self.buf)?;
        if written < self.buf.len() {
            tracing::debug!(
                target: "term.output",
                written,
                frame = self.buf.len(),
                "short frame write"
            );
        }
        w.flush()?;
        Ok(written)
    }
}

impl Write for FrameBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RawStdout ───────────────────────────────────────────────────────────────

/// Unbuffered stdout: every `write` is exactly one `write(2)` on fd 1.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdout;

#[cfg(unix)]
impl Write for RawStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                buf.as_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
