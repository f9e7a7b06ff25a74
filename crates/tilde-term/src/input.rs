// SPDX-License-Identifier: MIT
//
// Key decoding.
//
// Turns raw terminal bytes into logical keys. Plain bytes pass through as
// `Key::Char`. The escape byte starts a small finite-state machine that
// recognizes the legacy VT100/xterm navigation sequences:
//
//   ESC [ A..F        arrows, Home (E), End (F)
//   ESC [ 1..8 ~      Home, Delete, End, PageUp, PageDown (two encodings)
//   ESC O H / ESC O F Home, End (SS3 form)
//
// # Escape vs escape-sequence ambiguity
//
// A lone ESC byte could be the Escape key or the first byte of a sequence.
// The terminal is in VMIN=0 / VTIME=1 mode, so a read inside a sequence
// returns empty after 100ms. A timeout anywhere past the first byte means
// "no sequence follows" and resolves to `Key::Escape`. Sequences are never
// assumed complete.
//
// # Design
//
// The machine is an explicit table: `step(stage, byte)` is a pure, total
// function returning either the next stage or the decoded key. The
// mapping tables below are the only place key identities live, so adding
// a sequence means adding a row, not a branch.

use tracing::trace;

use crate::error::TerminalError;
use crate::reader::ByteSource;

/// The escape byte.
pub const ESC: u8 = 0x1B;

/// The control code for `key` (what the terminal sends for Ctrl+key).
#[inline]
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1F
}

// ─── Key ────────────────────────────────────────────────────────────────────

/// A decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A literal byte, including control codes.
    Char(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    /// The lone Escape key, and the fallback for any unrecognized sequence.
    Escape,
}

// ─── Tables ─────────────────────────────────────────────────────────────────

/// `ESC [ <letter>` finals.
const CSI_LETTERS: &[(u8, Key)] = &[
    (b'A', Key::ArrowUp),
    (b'B', Key::ArrowDown),
    (b'C', Key::ArrowRight),
    (b'D', Key::ArrowLeft),
    (b'E', Key::Home),
    (b'F', Key::End),
];

/// `ESC [ <digit> ~` parameters.
const CSI_TILDE_DIGITS: &[(u8, Key)] = &[
    (b'1', Key::Home),
    (b'3', Key::Delete),
    (b'4', Key::End),
    (b'5', Key::PageUp),
    (b'6', Key::PageDown),
    (b'7', Key::Home),
    (b'8', Key::End),
];

/// `ESC O <letter>` finals.
const SS3_FINALS: &[(u8, Key)] = &[(b'H', Key::Home), (b'F', Key::End)];

fn lookup(table: &[(u8, Key)], byte: u8) -> Key {
    table
        .iter()
        .find(|(b, _)| *b == byte)
        .map_or(Key::Escape, |&(_, key)| key)
}

// ─── State Machine ──────────────────────────────────────────────────────────

/// Where the decoder is inside a (possible) escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for the first byte of a key.
    Start,
    /// Saw `ESC`.
    Escape,
    /// Saw `ESC` and an unrecognized introducer; one more byte completes
    /// the three-byte frame and the result is `Escape` regardless.
    Unknown,
    /// Saw `ESC [`.
    Csi,
    /// Saw `ESC [ <digit>`, waiting for `~`.
    CsiDigit(u8),
    /// Saw `ESC O`.
    Ss3,
}

/// Outcome of feeding one byte to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Need another byte.
    Next(Stage),
    /// Decoding finished.
    Emit(Key),
}

/// One transition. Total over every `(stage, byte)` pair.
#[must_use]
pub fn step(stage: Stage, byte: u8) -> Step {
    match (stage, byte) {
        (Stage::Start, ESC) => Step::Next(Stage::Escape),
        (Stage::Start, b) => Step::Emit(Key::Char(b)),

        (Stage::Escape, b'[') => Step::Next(Stage::Csi),
        (Stage::Escape, b'O') => Step::Next(Stage::Ss3),
        (Stage::Escape, _) => Step::Next(Stage::Unknown),

        (Stage::Unknown, _) => Step::Emit(Key::Escape),

        (Stage::Csi, d) if d.is_ascii_digit() => Step::Next(Stage::CsiDigit(d)),
        (Stage::Csi, b) => Step::Emit(lookup(CSI_LETTERS, b)),

        (Stage::CsiDigit(d), b'~') => Step::Emit(lookup(CSI_TILDE_DIGITS, d)),
        (Stage::CsiDigit(_), _) => Step::Emit(Key::Escape),

        (Stage::Ss3, b) => Step::Emit(lookup(SS3_FINALS, b)),
    }
}

/// Decode a complete byte slice. The end of the slice acts as a timeout.
///
/// Returns `None` only for an empty slice. Trailing bytes past the first
/// decoded key are ignored.
#[must_use]
pub fn decode(bytes: &[u8]) -> Option<Key> {
    let (&first, rest) = bytes.split_first()?;
    let mut stage = match step(Stage::Start, first) {
        Step::Emit(key) => return Some(key),
        Step::Next(stage) => stage,
    };
    for &b in rest {
        match step(stage, b) {
            Step::Emit(key) => return Some(key),
            Step::Next(next) => stage = next,
        }
    }
    Some(Key::Escape)
}

// ─── KeyDecoder ─────────────────────────────────────────────────────────────

/// Blocking key reader over a [`ByteSource`].
pub struct KeyDecoder<S> {
    source: S,
}

impl<S: ByteSource> KeyDecoder<S> {
    /// Wrap a byte source.
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Block until one key is decoded.
    ///
    /// Timeouts before the first byte are retried silently. A timeout
    /// after the first byte ends the sequence as `Key::Escape`.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::Read`] if the device read fails.
    pub fn next_key(&mut self) -> Result<Key, TerminalError> {
        let mut stage = Stage::Start;
        loop {
            let Some(byte) = self.source.read_byte()? else {
                if stage == Stage::Start {
                    continue;
                }
                trace!(target: "term.input", ?stage, "sequence timed out, lone escape");
                return Ok(Key::Escape);
            };
            match step(stage, byte) {
                Step::Next(next) => stage = next,
                Step::Emit(key) => {
                    if key == Key::Escape && stage != Stage::Escape {
                        trace!(target: "term.input", ?stage, byte, "unrecognized sequence");
                    }
                    return Ok(key);
                }
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
