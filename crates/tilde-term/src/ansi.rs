// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit. This module only knows the byte-level
// encoding of the VT100 subset the editor speaks.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to a `FrameBuffer`.
use std::io::{self, Write};

/// Cursor-position query (DSR 6). The terminal answers `ESC [ row ; col R`.
pub const QUERY_CURSOR_POSITION: &[u8] = b"\x1b[6n";

/// Push the cursor as far right and down as the terminal allows.
///
/// CUP would be clamped differently across terminals; CUF/CUD are
/// documented to stop at the edge, which is what the geometry probe needs.
pub const CURSOR_TO_FAR_CORNER: &[u8] = b"\x1b[999C\x1b[999B";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: usize, y: usize) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Move the cursor to the top-left corner (CUP with no parameters).
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Ask the terminal where the cursor is (DSR 6).
#[inline]
pub fn query_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(QUERY_CURSOR_POSITION)
}

/// Move the cursor to the bottom-right-most reachable cell.
#[inline]
pub fn cursor_to_far_corner(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_TO_FAR_CORNER)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Erase from the cursor to the end of the line (EL 0).
#[inline]
pub fn erase_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Clear the screen and home the cursor. Used on every exit path.
#[inline]
pub fn clear_and_home(w: &mut impl Write) -> io::Result<()> {
    clear_screen(w)?;
    cursor_home(w)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: run an ANSI function and return its output as a string.
    fn emit<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    #[test]
    fn cursor_to_origin() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
    }

    #[test]
    fn cursor_to_is_row_then_column() {
        assert_eq!(emit(|w| cursor_to(w, 10, 20)), "\x1b[21;11H");
    }

    #[test]
    fn cursor_to_large() {
        assert_eq!(emit(|w| cursor_to(w, 999, 499)), "\x1b[500;1000H");
    }

    #[test]
    fn cursor_home_sequence() {
        assert_eq!(emit(|w| cursor_home(w)), "\x1b[H");
    }

    #[test]
    fn cursor_hide_sequence() {
        assert_eq!(emit(|w| cursor_hide(w)), "\x1b[?25l");
    }

    #[test]
    fn cursor_show_sequence() {
        assert_eq!(emit(|w| cursor_show(w)), "\x1b[?25h");
    }

    #[test]
    fn query_sequence() {
        assert_eq!(emit(|w| query_cursor_position(w)), "\x1b[6n");
    }

    #[test]
    fn far_corner_moves_right_then_down() {
        assert_eq!(emit(|w| cursor_to_far_corner(w)), "\x1b[999C\x1b[999B");
    }

    // ── Screen ──────────────────────────────────────────────────────────

    #[test]
    fn clear_screen_sequence() {
        assert_eq!(emit(|w| clear_screen(w)), "\x1b[2J");
    }

    #[test]
    fn erase_line_sequence() {
        assert_eq!(emit(|w| erase_line(w)), "\x1b[K");
    }

    #[test]
    fn clear_and_home_order() {
        assert_eq!(emit(|w| clear_and_home(w)), "\x1b[2J\x1b[H");
    }
}
