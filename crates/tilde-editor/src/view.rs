//! View — the bridge from editor state to a terminal frame.
//!
//! [`render`] composes one complete screen into a fresh
//! [`FrameBuffer`](tilde_term::output::FrameBuffer):
//!
//! ```text
//! ESC[?25l ESC[H                     hide cursor, home
//! ~ ESC[K \r\n                       rows past the document
//! ~        Tilde editor -- ... ESC[K \r\n   banner at rows / 3 (empty doc)
//! ~ ESC[K                            last row: no line break
//! ESC[y;xH ESC[?25h                  place and show the cursor
//! ```
//!
//! The cursor stays hidden while rows are drawn so it never flickers across
//! the screen, and the frame goes out in one write.

use std::io::{self, Write};

use tilde_term::ansi;
use tilde_term::output::FrameBuffer;

use crate::options::Options;
use crate::state::EditorState;

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// Compose the centered welcome line for a screen `cols` wide.
///
/// The text is truncated to `cols`; the left padding starts with `marker`
/// (so the row still reads as past-the-document) and continues with spaces.
/// The result is never longer than `cols`.
#[must_use]
pub fn welcome_line(welcome: &str, marker: u8, cols: usize) -> Vec<u8> {
    let text = &welcome.as_bytes()[..welcome.len().min(cols)];
    let mut padding = (cols - text.len()) / 2;

    let mut line = Vec::with_capacity(padding + text.len());
    if padding > 0 {
        line.push(marker);
        padding -= 1;
    }
    line.resize(line.len() + padding, b' ');
    line.extend_from_slice(text);
    line
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Render the whole screen for `state` into a new frame.
#[must_use]
pub fn render(state: &EditorState, options: &Options) -> FrameBuffer {
    let mut frame = FrameBuffer::new();
    if let Err(err) = compose(state, options, &mut frame) {
        // FrameBuffer::write never fails; a partial frame is still drawn.
        tracing::warn!(target: "editor.view", %err, "frame composition failed");
    }
    frame
}

/// Write the frame for `state` to `w`.
///
/// # Errors
///
/// Propagates write errors from `w`.
pub fn compose(state: &EditorState, options: &Options, w: &mut impl Write) -> io::Result<()> {
    ansi::cursor_hide(w)?;
    ansi::cursor_home(w)?;
    draw_rows(state, options, w)?;
    ansi::cursor_to(w, state.cursor.x, state.cursor.y)?;
    ansi::cursor_show(w)
}

fn draw_rows(state: &EditorState, options: &Options, w: &mut impl Write) -> io::Result<()> {
    let rows = usize::from(state.screen.rows);
    let cols = usize::from(state.screen.cols);
    let banner_row = rows / 3;

    for y in 0..rows {
        if let Some(text) = state.document.row(y) {
            let bytes = text.as_bytes();
            w.write_all(&bytes[..bytes.len().min(cols)])?;
        } else if y == banner_row && state.document.is_empty() {
            w.write_all(&welcome_line(&options.welcome, options.empty_row_marker, cols))?;
        } else {
            w.write_all(&[options.empty_row_marker])?;
        }

        ansi::erase_line(w)?;
        if y + 1 < rows {
            w.write_all(b"\r\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::position::Position;
    use pretty_assertions::assert_eq;
    use tilde_term::Size;

    fn frame_text(state: &EditorState) -> String {
        let frame = render(state, &Options::default());
        String::from_utf8(frame.as_bytes().to_vec()).unwrap()
    }

    /// The drawn rows, with the leading/trailing control sequences stripped.
    fn rows_of(text: &str) -> Vec<&str> {
        let body = text.strip_prefix("\x1b[?25l\x1b[H").unwrap();
        let end = body.rfind("\x1b[K").unwrap();
        body[..end]
            .split("\r\n")
            .map(|row| row.strip_suffix("\x1b[K").unwrap_or(row))
            .collect()
    }

    /// Accepts `budget` bytes, then fails every write.
    struct Cramped {
        budget: usize,
    }

    impl Write for Cramped {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::from(io::ErrorKind::WriteZero));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // -- Banner ---------------------------------------------------------------

    #[test]
    fn banner_is_centered_with_marker() {
        let line = welcome_line("hello", b'~', 11);
        assert_eq!(line, b"~  hello");
    }

    #[test]
    fn banner_truncated_to_narrow_screen() {
        assert_eq!(welcome_line("hello world", b'~', 5), b"hello");
    }

    #[test]
    fn banner_exact_width_has_no_padding() {
        assert_eq!(welcome_line("abc", b'~', 3), b"abc");
    }

    #[test]
    fn banner_never_exceeds_cols() {
        let welcome = Options::default().welcome;
        for cols in 1..=200 {
            let line = welcome_line(&welcome, b'~', cols);
            assert!(line.len() <= cols, "cols={cols} len={}", line.len());
        }
    }

    // -- Frame ----------------------------------------------------------------

    #[test]
    fn frame_wraps_rows_in_cursor_control() {
        let state = EditorState::new(Size::new(10, 2), Document::empty());
        let text = frame_text(&state);
        assert!(text.starts_with("\x1b[?25l\x1b[H"));
        assert!(text.ends_with("\x1b[1;1H\x1b[?25h"));
    }

    #[test]
    fn no_line_break_after_last_row() {
        let state = EditorState::new(Size::new(10, 3), Document::empty());
        let text = frame_text(&state);
        assert_eq!(text.matches("\r\n").count(), 2);
        assert_eq!(text.matches("\x1b[K").count(), 3);
    }

    #[test]
    fn cursor_placed_one_indexed() {
        let mut state = EditorState::new(Size::new(80, 24), Document::empty());
        state.cursor = Position::new(4, 9);
        assert!(frame_text(&state).ends_with("\x1b[10;5H\x1b[?25h"));
    }

    #[test]
    fn empty_document_24x80() {
        let state = EditorState::new(Size::new(80, 24), Document::empty());
        let text = frame_text(&state);
        let rows = rows_of(&text);
        assert_eq!(rows.len(), 24);

        let welcome = Options::default().welcome;
        for (y, row) in rows.iter().enumerate() {
            if y == 8 {
                assert!(row.len() <= 80);
                assert!(row.starts_with('~'));
                assert!(row.ends_with(&welcome));
                assert_eq!(row.len(), (80 - welcome.len()) / 2 + welcome.len());
            } else {
                assert_eq!(*row, "~");
            }
        }
    }

    #[test]
    fn document_row_replaces_marker_and_banner() {
        let state = EditorState::new(Size::new(80, 3), Document::from_line("Hello World"));
        let text = frame_text(&state);
        let rows = rows_of(&text);
        assert_eq!(rows, vec!["Hello World", "~", "~"]);
    }

    #[test]
    fn document_row_truncated_to_cols() {
        let state = EditorState::new(Size::new(5, 1), Document::from_line("Hello World"));
        let rows_text = frame_text(&state);
        assert_eq!(rows_of(&rows_text), vec!["Hello"]);
    }

    #[test]
    fn compose_propagates_write_errors() {
        let state = EditorState::new(Size::new(80, 24), Document::empty());
        let mut out = Cramped { budget: 16 };
        let err = compose(&state, &Options::default(), &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn render_matches_compose() {
        let mut state = EditorState::new(Size::new(40, 5), Document::empty());
        state.cursor = Position::new(3, 2);
        let mut direct = Vec::new();
        compose(&state, &Options::default(), &mut direct).unwrap();
        assert_eq!(render(&state, &Options::default()).as_bytes(), &direct[..]);
    }

    #[test]
    fn banner_on_first_row_of_tiny_screen() {
        let state = EditorState::new(Size::new(80, 1), Document::empty());
        let text = frame_text(&state);
        let rows = rows_of(&text);
        assert!(rows[0].ends_with(&Options::default().welcome));
    }
}
