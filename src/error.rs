//! Top-level error type for the conversion pipeline.
//!
//! Component-local failures (unknown keyword, unclosed block, ...) never
//! unwind; they become `Diagnostic`s accumulated on the document (see
//! `diagnostics`). Only I/O failures, strict-mode validation totals, and
//! template failures surface here.

use std::fmt;
use std::path::PathBuf;

use crate::diagnostics::Diagnostic;

/// Errors that can escape `convert`/`convert_str`.
#[derive(Debug)]
pub enum ConvertError {
    /// Reading the source file or writing the output file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// `error_level` was `Strict` and at least one `error`-severity
    /// diagnostic was produced; the renderer was never invoked.
    StrictModeErrors(Vec<Diagnostic>),
    /// The injected `TemplateRenderer` failed.
    Template(String),
    /// The caller's `CancellationToken` was set mid-run; partial output was
    /// discarded.
    Cancelled,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ConvertError::StrictModeErrors(diags) => {
                write!(f, "strict mode: {} validation error(s)", diags.len())
            }
            ConvertError::Template(msg) => write!(f, "template error: {}", msg),
            ConvertError::Cancelled => write!(f, "conversion was cancelled"),
        }
    }
}

impl std::error::Error for ConvertError {}

/// The process exit code the CLI collaborator should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    IoError = 1,
    StrictModeError = 2,
    InternalError = 3,
}

impl From<&ConvertError> for ExitCode {
    fn from(err: &ConvertError) -> Self {
        match err {
            ConvertError::Io { .. } => ExitCode::IoError,
            ConvertError::StrictModeErrors(_) => ExitCode::StrictModeError,
            ConvertError::Template(_) => ExitCode::InternalError,
            ConvertError::Cancelled => ExitCode::InternalError,
        }
    }
}
