//! # tilde-editor — Editor core for tilde
//!
//! The session-level half of the editor, on top of `tilde-term`:
//!
//! - **[`position`]** — `Position` (x, y), 0-indexed screen coordinates
//! - **[`cursor`]** — one-cell movement with a configurable clamp policy
//! - **[`document`]** — the placeholder document (zero or one row)
//! - **[`state`]** — `EditorState`, the session context, and key dispatch
//! - **[`view`]** — composes a full frame from the state
//! - **[`options`]** — typed configuration with defaults

pub mod cursor;
pub mod document;
pub mod options;
pub mod position;
pub mod state;
pub mod view;
