//! Editor options.
//!
//! Everything the editor can be configured with, as one typed struct with
//! defaults. Nothing is read from the command line or the environment; the
//! binary builds an [`Options`] and passes it down explicitly.
//!
//! | Field              | Default                              |
//! |--------------------|--------------------------------------|
//! | `welcome`          | `Tilde editor -- version <VERSION>`  |
//! | `empty_row_marker` | `~`                                  |
//! | `quit_key`         | Ctrl-Q (`0x11`)                      |
//! | `clamp`            | [`ClampPolicy::Inclusive`]           |
//! | `log_file`         | none (logging off)                   |
//! | `log_filter`       | `info`                               |

use std::path::PathBuf;

use tilde_term::input::ctrl;
use tilde_term::terminal::RawModeConfig;

use crate::cursor::ClampPolicy;

/// Editor version shown in the welcome banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Banner centered a third of the way down an empty document.
    pub welcome: String,
    /// Glyph drawn on rows past the end of the document.
    pub empty_row_marker: u8,
    /// Control byte that quits the editor.
    pub quit_key: u8,
    /// Cursor bound policy.
    pub clamp: ClampPolicy,
    /// Raw-mode line-discipline settings.
    pub raw_mode: RawModeConfig,
    /// Log file. `None` disables logging, so nothing is written to the
    /// working directory unless a path is set here.
    pub log_file: Option<PathBuf>,
    /// `tracing` filter directive for the log file.
    pub log_filter: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            welcome: format!("Tilde editor -- version {VERSION}"),
            empty_row_marker: b'~',
            quit_key: ctrl(b'q'),
            clamp: ClampPolicy::default(),
            raw_mode: RawModeConfig::default(),
            log_file: None,
            log_filter: "info".to_owned(),
        }
    }
}
