//! Core domain types: source documents and diagnostics.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Column used as "end of line" when the real extent of an error is unknown.
pub const RANGE_EOL: u32 = 4096;

// ---------------------------------------------------------------------------
// SourceDocument
// ---------------------------------------------------------------------------

/// Snapshot of a source document taken when a compile is triggered.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Absolute path of the document.
    pub path: PathBuf,
    /// Raw text, possibly unsaved.
    pub content: String,
    /// Whether the text differs from what is on disk.
    pub dirty: bool,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            dirty: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A zero-based source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Range {
    pub const fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// The first line of the document, start to end-of-line sentinel.
    pub const fn first_line() -> Self {
        Self::new(0, 0, 0, RANGE_EOL)
    }

    /// From `column` to the end of `line`.
    pub const fn rest_of_line(line: u32, column: u32) -> Self {
        Self::new(line, column, line, RANGE_EOL)
    }

    /// Empty range at the very start of the document.
    pub const fn document_start() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

/// A positioned error attached to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub range: Range,
    /// The file the diagnostic belongs to; may be an import of the compiled
    /// document.
    pub affected_file: PathBuf,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: error: {}",
            self.affected_file.display(),
            self.range.start_line + 1,
            self.range.start_column + 1,
            self.message
        )
    }
}
