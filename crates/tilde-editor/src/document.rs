//! Document stub.
//!
//! Stands in for the text buffer that later stages will provide. It exposes
//! exactly what the renderer needs: a row count and the text of a row. At
//! most one row is held in memory.

/// A placeholder document of zero or one rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    row: Option<String>,
}

impl Document {
    /// A document with no rows.
    #[must_use]
    pub const fn empty() -> Self {
        Self { row: None }
    }

    /// A single-row document.
    #[must_use]
    pub fn from_line(text: impl Into<String>) -> Self {
        Self {
            row: Some(text.into()),
        }
    }

    /// Number of rows (0 or 1).
    #[must_use]
    pub const fn row_count(&self) -> usize {
        if self.row.is_some() { 1 } else { 0 }
    }

    /// Whether the document has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.row.is_none()
    }

    /// Text of row `index`, if it exists.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&str> {
        if index == 0 { self.row.as_deref() } else { None }
    }
}
