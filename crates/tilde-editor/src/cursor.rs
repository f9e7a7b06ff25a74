//! Cursor movement with boundary clamping.
//!
//! Movement is one cell at a time in a [`Direction`], bounded by the screen
//! geometry. How far the cursor may go is a [`ClampPolicy`]:
//!
//! - **`Inclusive`** (default): a coordinate may reach the dimension itself,
//!   one cell past the last visible row/column.
//! - **`Strict`**: a coordinate stops on the last visible cell.
//!
//! Moving toward zero always saturates at zero.

use tilde_term::Size;

use crate::position::Position;

/// One-cell movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Upper bound for cursor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClampPolicy {
    /// `x <= cols`, `y <= rows`.
    #[default]
    Inclusive,
    /// `x < cols`, `y < rows`.
    Strict,
}

impl ClampPolicy {
    /// Largest allowed coordinate for a dimension of size `dim`.
    #[inline]
    #[must_use]
    pub const fn max(self, dim: u16) -> usize {
        match self {
            Self::Inclusive => dim as usize,
            Self::Strict => (dim as usize).saturating_sub(1),
        }
    }
}

/// Move `pos` one cell in `dir`, clamped to `screen` under `policy`.
///
/// Idempotent at the boundary: moving into an edge leaves the position
/// unchanged.
#[must_use]
pub const fn step(pos: Position, dir: Direction, screen: Size, policy: ClampPolicy) -> Position {
    let max_x = policy.max(screen.cols);
    let max_y = policy.max(screen.rows);
    match dir {
        Direction::Left => Position::new(pos.x.saturating_sub(1), pos.y),
        Direction::Up => Position::new(pos.x, pos.y.saturating_sub(1)),
        Direction::Right if pos.x < max_x => Position::new(pos.x + 1, pos.y),
        Direction::Down if pos.y < max_y => Position::new(pos.x, pos.y + 1),
        Direction::Right | Direction::Down => pos,
    }
}
