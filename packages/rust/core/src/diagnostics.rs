//! Error classification and diagnostic bookkeeping.
//!
//! [`classify`] turns any [`CompileError`] into exactly one [`Diagnostic`].
//! Renderers rarely report where an error ends, so ranges run to the
//! [`RANGE_EOL`](stylepress_shared::RANGE_EOL) sentinel.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stylepress_shared::{CompileError, Diagnostic, Range};

/// Classify a compile failure for the document at `document_path`.
pub fn classify(error: &CompileError, document_path: &Path) -> Diagnostic {
    match error {
        CompileError::Filesystem { path, source }
            if matches!(
                source.kind(),
                ErrorKind::NotFound | ErrorKind::PermissionDenied
            ) =>
        {
            Diagnostic {
                message: format!("cannot open file '{}'", path.display()),
                range: Range::first_line(),
                affected_file: document_path.to_path_buf(),
            }
        }
        CompileError::Render {
            message,
            line,
            column,
            filename,
        } => {
            let Some(filename) = filename else {
                // Nothing to anchor to.
                return Diagnostic {
                    message: message.clone(),
                    range: Range::document_start(),
                    affected_file: document_path.to_path_buf(),
                };
            };

            let range = match (line, column) {
                (Some(line), Some(column)) => {
                    Range::rest_of_line(to_u32(line.saturating_sub(1)), to_u32(*column))
                }
                _ => Range::first_line(),
            };

            Diagnostic {
                message: message.clone(),
                range,
                affected_file: affected_file(filename, document_path),
            }
        }
        CompileError::Filesystem { .. } | CompileError::Unknown { .. } => Diagnostic {
            message: error.to_string(),
            range: Range::first_line(),
            affected_file: document_path.to_path_buf(),
        },
    }
}

/// Resolve the file an error names.
///
/// Renderers often report the compiled document by bare file name; a name
/// without separators that matches the document's own name is the document.
/// Anything else is another file (typically an import), resolved against the
/// document's directory.
pub fn affected_file(filename: &str, document_path: &Path) -> PathBuf {
    let is_bare = !filename.contains(['/', '\\']);
    let document_name = document_path.file_name().and_then(|n| n.to_str());

    if is_bare && document_name == Some(filename) {
        return document_path.to_path_buf();
    }

    let dir = document_path.parent().unwrap_or_else(|| Path::new(""));
    let path = dir.join(filename);
    std::path::absolute(&path).unwrap_or(path)
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Current diagnostics, keyed by file.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    entries: BTreeMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the diagnostics of `file`. An empty list clears it.
    pub fn set(&mut self, file: impl Into<PathBuf>, diagnostics: Vec<Diagnostic>) {
        let file = file.into();
        if diagnostics.is_empty() {
            self.entries.remove(&file);
        } else {
            self.entries.insert(file, diagnostics);
        }
    }

    /// Forget the diagnostics of `file`.
    pub fn delete(&mut self, file: &Path) {
        self.entries.remove(file);
    }

    pub fn get(&self, file: &Path) -> &[Diagnostic] {
        self.entries.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All diagnostics, ordered by file.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.values().flatten()
    }
}
