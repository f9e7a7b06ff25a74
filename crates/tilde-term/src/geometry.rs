// SPDX-License-Identifier: MIT
//
// Geometry discovery.
//
// The OS usually knows the window size (`TIOCGWINSZ`), but some terminals
// and multiplexers report nothing or zero columns. The fallback asks the
// terminal itself: push the cursor into the bottom-right corner with
// relative moves (which stop at the edge), then request a cursor-position
// report and read `ESC [ rows ; cols R` back from the input stream.

use std::io::Write;

use tracing::{debug, warn};

use crate::ansi;
use crate::error::{GeometryError, ProtocolError};
use crate::reader::ByteSource;
use crate::terminal::Size;

/// Upper bound on a cursor-position reply. `ESC[65535;65535R` is 15 bytes.
const REPLY_CAPACITY: usize = 32;

/// Read timeouts (100ms each) tolerated while waiting for a reply. Slow
/// links and multiplexers answer late; a terminal that never answers still
/// gives up after about a second.
const REPLY_TIMEOUTS: usize = 10;

/// Field separator in a cursor-position reply.
const SEPARATOR: u8 = b';';

/// Resolve the terminal geometry.
///
/// Uses `os` when it reports a non-zero size; otherwise runs the cursor
/// probe over `out` / `input`.
///
/// # Errors
///
/// Returns a [`GeometryError`] when neither method produces a non-zero size.
pub fn resolve(
    os: Option<Size>,
    out: &mut impl Write,
    input: &mut impl ByteSource,
) -> Result<Size, GeometryError> {
    if let Some(size) = os.filter(|s| !s.is_empty()) {
        debug!(target: "term.geometry", cols = size.cols, rows = size.rows, "os size");
        return Ok(size);
    }

    warn!(target: "term.geometry", "os size unavailable, probing cursor");
    let size = probe(out, input).inspect_err(|err| {
        warn!(target: "term.geometry", %err, "cursor probe failed");
    })?;
    if size.is_empty() {
        return Err(GeometryError::ZeroSize);
    }
    debug!(target: "term.geometry", cols = size.cols, rows = size.rows, "probed size");
    Ok(size)
}

/// Move to the far corner, query the cursor position, and parse the reply.
///
/// # Errors
///
/// Returns [`GeometryError::Io`] if the probe cannot be written or the
/// reply cannot be read, [`GeometryError::Unavailable`] if the terminal sent
/// nothing back, or [`GeometryError::Probe`] for a malformed reply.
pub fn probe(out: &mut impl Write, input: &mut impl ByteSource) -> Result<Size, GeometryError> {
    ansi::cursor_to_far_corner(out)
        .and_then(|()| ansi::query_cursor_position(out))
        .and_then(|()| out.flush())
        .map_err(GeometryError::Io)?;

    let reply = read_cursor_report(input)?;
    if reply.is_empty() {
        return Err(GeometryError::Unavailable);
    }
    Ok(parse_cursor_report(&reply)?)
}

/// Read a reply up to and including the terminating `R`.
///
/// Read timeouts are retried, up to [`REPLY_TIMEOUTS`] in total. Stops
/// early, without the terminator, if the buffer fills or the timeouts run
/// out; the parser then reports the reply as truncated.
///
/// # Errors
///
/// Returns [`GeometryError::Io`] if the device read fails.
pub fn read_cursor_report(input: &mut impl ByteSource) -> Result<Vec<u8>, GeometryError> {
    let mut reply = Vec::with_capacity(REPLY_CAPACITY);
    let mut timeouts = 0;
    while reply.len() < REPLY_CAPACITY {
        let byte = match input.read_byte() {
            Ok(Some(b)) => b,
            Ok(None) if timeouts < REPLY_TIMEOUTS => {
                timeouts += 1;
                continue;
            }
            Ok(None) => break,
            Err(crate::TerminalError::Read(err)) => return Err(GeometryError::Io(err)),
            Err(other) => return Err(GeometryError::Io(std::io::Error::other(other))),
        };
        reply.push(byte);
        if byte == b'R' {
            break;
        }
    }
    Ok(reply)
}

/// Parse `ESC [ <rows> ; <cols> R` into a [`Size`].
///
/// # Errors
///
/// Returns a [`ProtocolError`] if the introducer, separator, terminator, or
/// either numeric field is missing or malformed.
pub fn parse_cursor_report(reply: &[u8]) -> Result<Size, ProtocolError> {
    let body = reply
        .strip_prefix(b"\x1b[")
        .ok_or(ProtocolError::MissingIntroducer)?;
    let body = body.strip_suffix(b"R").ok_or(ProtocolError::Truncated)?;

    let sep = body
        .iter()
        .position(|&b| b == SEPARATOR)
        .ok_or(ProtocolError::MissingSeparator)?;
    let rows = parse_field(&body[..sep], "rows")?;
    let cols = parse_field(&body[sep + 1..], "cols")?;

    Ok(Size { cols, rows })
}

fn parse_field(digits: &[u8], field: &'static str) -> Result<u16, ProtocolError> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::InvalidField { field });
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ProtocolError::InvalidField { field })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    fn input(bytes: &[u8]) -> VecDeque<u8> {
        bytes.iter().copied().collect()
    }

    /// A terminal that lets `stalls` read timeouts pass before (and
    /// between) the bytes of its reply.
    struct Laggy {
        stalls: usize,
        every_byte: bool,
        bytes: VecDeque<u8>,
        reads: usize,
    }

    impl Laggy {
        fn new(stalls: usize, bytes: &[u8]) -> Self {
            Self {
                stalls,
                every_byte: false,
                bytes: input(bytes),
                reads: 0,
            }
        }
    }

    impl ByteSource for Laggy {
        fn read_byte(&mut self) -> Result<Option<u8>, crate::TerminalError> {
            self.reads += 1;
            if self.stalls > 0 {
                self.stalls -= 1;
                return Ok(None);
            }
            if self.every_byte {
                self.stalls = 1;
            }
            Ok(self.bytes.pop_front())
        }
    }

    // ── Reply parsing ───────────────────────────────────────────────────

    #[test]
    fn parses_standard_reply() {
        assert_eq!(parse_cursor_report(b"\x1b[24;80R"), Ok(Size::new(80, 24)));
    }

    #[test]
    fn parses_large_reply() {
        assert_eq!(parse_cursor_report(b"\x1b[300;1200R"), Ok(Size::new(1200, 300)));
    }

    #[test]
    fn missing_introducer() {
        assert_eq!(
            parse_cursor_report(b"24;80R"),
            Err(ProtocolError::MissingIntroducer)
        );
        assert_eq!(
            parse_cursor_report(b"\x1b24;80R"),
            Err(ProtocolError::MissingIntroducer)
        );
    }

    #[test]
    fn missing_terminator() {
        assert_eq!(parse_cursor_report(b"\x1b[24;80"), Err(ProtocolError::Truncated));
    }

    #[test]
    fn missing_separator() {
        assert_eq!(
            parse_cursor_report(b"\x1b[2480R"),
            Err(ProtocolError::MissingSeparator)
        );
    }

    #[test]
    fn colon_is_not_a_separator() {
        assert_eq!(
            parse_cursor_report(b"\x1b[24:80R"),
            Err(ProtocolError::MissingSeparator)
        );
    }

    #[test]
    fn bad_fields() {
        assert_eq!(
            parse_cursor_report(b"\x1b[;80R"),
            Err(ProtocolError::InvalidField { field: "rows" })
        );
        assert_eq!(
            parse_cursor_report(b"\x1b[24;R"),
            Err(ProtocolError::InvalidField { field: "cols" })
        );
        assert_eq!(
            parse_cursor_report(b"\x1b[2x;80R"),
            Err(ProtocolError::InvalidField { field: "rows" })
        );
        assert_eq!(
            parse_cursor_report(b"\x1b[24;99999R"),
            Err(ProtocolError::InvalidField { field: "cols" })
        );
    }

    // ── Reply reading ───────────────────────────────────────────────────

    #[test]
    fn read_stops_at_terminator() {
        let mut src = input(b"\x1b[24;80Rxyz");
        assert_eq!(read_cursor_report(&mut src).unwrap(), b"\x1b[24;80R");
        assert_eq!(src.len(), 3);
    }

    #[test]
    fn read_is_bounded() {
        let mut src = input(&[b'9'; 100]);
        assert_eq!(read_cursor_report(&mut src).unwrap().len(), REPLY_CAPACITY);
    }

    #[test]
    fn read_stops_when_timeouts_run_out() {
        let mut src = input(b"\x1b[24");
        assert_eq!(read_cursor_report(&mut src).unwrap(), b"\x1b[24");
    }

    #[test]
    fn read_waits_out_a_slow_reply() {
        let mut src = Laggy::new(3, b"\x1b[24;80R");
        assert_eq!(read_cursor_report(&mut src).unwrap(), b"\x1b[24;80R");
        assert_eq!(src.reads, 3 + 8);
    }

    #[test]
    fn read_timeout_budget_is_bounded() {
        let mut src = Laggy::new(usize::MAX, b"\x1b[24;80R");
        assert!(read_cursor_report(&mut src).unwrap().is_empty());
        assert_eq!(src.reads, REPLY_TIMEOUTS + 1);
    }

    // ── Resolution ──────────────────────────────────────────────────────

    #[test]
    fn os_size_wins_without_probing() {
        let mut out = Vec::new();
        let mut src = input(b"");
        let size = resolve(Some(Size::new(100, 40)), &mut out, &mut src).unwrap();
        assert_eq!(size, Size::new(100, 40));
        assert!(out.is_empty());
    }

    #[test]
    fn zero_columns_falls_back_to_probe() {
        let mut out = Vec::new();
        let mut src = input(b"\x1b[24;80R");
        let size = resolve(Some(Size::new(0, 50)), &mut out, &mut src).unwrap();
        assert_eq!(size, Size::new(80, 24));
        assert_eq!(out, b"\x1b[999C\x1b[999B\x1b[6n");
    }

    #[test]
    fn unavailable_os_size_falls_back_to_probe() {
        let mut out = Vec::new();
        let mut src = input(b"\x1b[50;132R");
        let size = resolve(None, &mut out, &mut src).unwrap();
        assert_eq!(size, Size::new(132, 50));
    }

    #[test]
    fn malformed_probe_reply_is_protocol_error() {
        let mut out = Vec::new();
        let mut src = input(b"24;80R");
        let err = resolve(None, &mut out, &mut src).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Probe(ProtocolError::MissingIntroducer)
        ));
    }

    #[test]
    fn late_reply_still_resolves() {
        let mut out = Vec::new();
        let mut src = Laggy::new(1, b"\x1b[24;80R");
        let size = resolve(None, &mut out, &mut src).unwrap();
        assert_eq!(size, Size::new(80, 24));
    }

    #[test]
    fn reply_trickling_in_between_timeouts_resolves() {
        let mut out = Vec::new();
        let mut src = Laggy::new(0, b"\x1b[24;80R");
        src.every_byte = true;
        // Seven timeouts between eight bytes: within budget.
        let size = resolve(None, &mut out, &mut src).unwrap();
        assert_eq!(size, Size::new(80, 24));
    }

    #[test]
    fn silent_terminal_fails_probe() {
        let mut out = Vec::new();
        let mut src = input(b"");
        let err = resolve(None, &mut out, &mut src).unwrap_err();
        assert!(matches!(err, GeometryError::Unavailable));
    }

    #[test]
    fn zero_probed_size_is_rejected() {
        let mut out = Vec::new();
        let mut src = input(b"\x1b[0;80R");
        let err = resolve(None, &mut out, &mut src).unwrap_err();
        assert!(matches!(err, GeometryError::ZeroSize));
    }
}
