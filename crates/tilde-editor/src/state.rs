//! Editor session state and key dispatch.
//!
//! [`EditorState`] is the one context object for a session: cursor,
//! geometry, and the document. It is passed explicitly to the renderer and
//! mutated only by [`EditorState::dispatch`]. The terminal-mode snapshot is
//! not here; it belongs to `tilde_term::terminal::Terminal` alone.
//!
//! # Dispatch table
//!
//! | Key                  | Effect                                  |
//! |----------------------|-----------------------------------------|
//! | quit key             | [`Action::Quit`]                        |
//! | Home                 | `x = 0`                                 |
//! | End                  | `x = cols - 1`                          |
//! | PageUp / PageDown    | `rows` single steps up / down           |
//! | Arrows               | one clamped step                        |
//! | anything else        | ignored                                 |

use tilde_term::event_loop::Action;
use tilde_term::{Key, Size};

use crate::cursor::{self, ClampPolicy, Direction};
use crate::document::Document;
use crate::position::Position;

/// Process-wide editor state, owned by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    /// Cursor position, 0-indexed.
    pub cursor: Position,
    /// Resolved terminal geometry (never zero).
    pub screen: Size,
    /// The document being shown.
    pub document: Document,
    /// How far the cursor may travel.
    pub clamp: ClampPolicy,
}

impl EditorState {
    /// Fresh state: cursor at the origin, inclusive clamping.
    #[must_use]
    pub const fn new(screen: Size, document: Document) -> Self {
        Self {
            cursor: Position::ZERO,
            screen,
            document,
            clamp: ClampPolicy::Inclusive,
        }
    }

    /// Replace the clamp policy.
    #[must_use]
    pub fn with_clamp(mut self, clamp: ClampPolicy) -> Self {
        self.clamp = clamp;
        self
    }

    /// Move the cursor one cell.
    pub const fn move_cursor(&mut self, dir: Direction) {
        self.cursor = cursor::step(self.cursor, dir, self.screen, self.clamp);
    }

    /// Apply one key. Returns [`Action::Quit`] for `quit_key`.
    pub fn dispatch(&mut self, key: Key, quit_key: u8) -> Action {
        match key {
            Key::Char(b) if b == quit_key => return Action::Quit,
            Key::Home => self.cursor.x = 0,
            Key::End => self.cursor.x = usize::from(self.screen.cols).saturating_sub(1),
            Key::PageUp | Key::PageDown => {
                let dir = if key == Key::PageUp {
                    Direction::Up
                } else {
                    Direction::Down
                };
                for _ in 0..self.screen.rows {
                    self.move_cursor(dir);
                }
            }
            Key::ArrowUp => self.move_cursor(Direction::Up),
            Key::ArrowDown => self.move_cursor(Direction::Down),
            Key::ArrowLeft => self.move_cursor(Direction::Left),
            Key::ArrowRight => self.move_cursor(Direction::Right),
            Key::Char(_) | Key::Delete | Key::Escape => {}
        }
        Action::Continue
    }
}
