//! Screen position type.
//!
//! All coordinates are **0-indexed** and screen-relative: `x` is the column,
//! `y` the row. The ANSI layer converts to the terminal's 1-indexed form;
//! that conversion never belongs here.

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cursor position on screen: (x, y), both 0-indexed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    /// The origin — top-left cell.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({},{})", self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed row:col for human display.
        write!(f, "{}:{}", self.y + 1, self.x + 1)
    }
}
