// SPDX-License-Identifier: MIT
//
// Error taxonomy.
//
// Two tiers. `TerminalError` is fatal: the device itself misbehaved (attribute
// calls, reads other than would-block, writes), and the only sane response is
// to restore the terminal and exit. `ProtocolError` and `GeometryError` cover
// replies the terminal sent that we could not make sense of. Those degrade:
// the key decoder falls back to a lone Escape, the geometry resolver falls
// back to the cursor probe, and only when every method is exhausted does a
// geometry failure become a `TerminalError`.

use std::io;

use thiserror::Error;

/// A fatal terminal failure. Restore and exit.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// `tcgetattr` / `tcsetattr` failed.
    #[error("{op}: {source}")]
    Attributes {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Reading the device failed for a reason other than would-block.
    #[error("read: {0}")]
    Read(#[source] io::Error),

    /// Writing to the device failed.
    #[error("write: {0}")]
    Write(#[source] io::Error),

    /// No geometry method succeeded.
    #[error("getWindowSize: {0}")]
    Geometry(#[from] GeometryError),
}

/// Geometry discovery failed.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The OS facility reported nothing usable and the terminal never
    /// answered the cursor probe.
    #[error("terminal size unavailable")]
    Unavailable,

    /// The cursor-position reply could not be parsed.
    #[error("cursor probe failed: {0}")]
    Probe(#[from] ProtocolError),

    /// Emitting the probe or reading its reply failed.
    #[error("cursor probe i/o: {0}")]
    Io(#[source] io::Error),

    /// A method reported zero rows or zero columns.
    #[error("terminal reported a zero dimension")]
    ZeroSize,
}

/// A malformed reply from the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The reply did not begin with `ESC [`.
    #[error("reply does not start with ESC [")]
    MissingIntroducer,

    /// The reply had no field separator between rows and columns.
    #[error("reply has no field separator")]
    MissingSeparator,

    /// A numeric field was empty, non-decimal, or too large.
    #[error("invalid {field} field")]
    InvalidField { field: &'static str },

    /// The buffer filled (or input stopped) before the terminating `R`.
    #[error("reply truncated before terminator")]
    Truncated,
}

impl TerminalError {
    /// Wrap the last OS error for a failed attribute call.
    #[must_use]
    pub fn attributes(op: &'static str) -> Self {
        Self::Attributes {
            op,
            source: io::Error::last_os_error(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
