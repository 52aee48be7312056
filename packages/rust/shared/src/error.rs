//! Error types for stylepress.
//!
//! Library crates use [`StylepressError`] for configuration and setup failures
//! and [`CompileError`] for everything that can abort a single compile.
//! App crates (cli) wrap these with `color-eyre` for rich diagnostics.

use std::io::ErrorKind;
use std::path::PathBuf;

/// Top-level error type for configuration and setup operations.
#[derive(Debug, thiserror::Error)]
pub enum StylepressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StylepressError>;

impl StylepressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failure raised while compiling one document.
///
/// Produced by the filesystem, the renderer, and preprocessors. The
/// diagnostics classifier matches on these variants to build a positioned
/// diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A file could not be read or written.
    #[error("{}: {path:?}: {source}", fs_error_code(.source.kind()))]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The renderer rejected the source text.
    #[error("{message}")]
    Render {
        message: String,
        /// 1-based line, when the renderer reported one.
        line: Option<usize>,
        /// 0-based column, when the renderer reported one.
        column: Option<usize>,
        /// File the error was raised in, as reported by the renderer.
        filename: Option<String>,
    },

    /// Anything else.
    #[error("{message}")]
    Unknown { message: String },
}

impl CompileError {
    /// Wrap a `std::io::Error` with the path it concerns.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Renderer error without position information.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
            line: None,
            column: None,
            filename: None,
        }
    }

    /// Create an unclassified error from any displayable message.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown {
            message: msg.into(),
        }
    }

    /// System error code for filesystem failures (`ENOENT`, `EACCES`, ...).
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Filesystem { source, .. } => Some(fs_error_code(source.kind())),
            _ => None,
        }
    }
}

/// Map an I/O error kind to the POSIX-style code users recognise.
pub fn fs_error_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "ENOENT",
        ErrorKind::PermissionDenied => "EACCES",
        ErrorKind::AlreadyExists => "EEXIST",
        ErrorKind::IsADirectory => "EISDIR",
        ErrorKind::NotADirectory => "ENOTDIR",
        _ => "EIO",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StylepressError::config("unknown key");
        assert_eq!(err.to_string(), "config error: unknown key");

        let err = CompileError::unknown("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn filesystem_error_exposes_code() {
        let err = CompileError::filesystem(
            "/tmp/missing.less",
            std::io::Error::from(ErrorKind::NotFound),
        );
        assert_eq!(err.code(), Some("ENOENT"));
        assert!(err.to_string().starts_with("ENOENT"));

        let err = CompileError::filesystem(
            "/root/secret.less",
            std::io::Error::from(ErrorKind::PermissionDenied),
        );
        assert_eq!(err.code(), Some("EACCES"));
    }

    #[test]
    fn non_filesystem_errors_have_no_code() {
        assert_eq!(CompileError::render("bad").code(), None);
        assert_eq!(CompileError::unknown("bad").code(), None);
    }
}
