//! Error types for batch translation.

use std::path::PathBuf;
use thiserror::Error;

pub type TranslateResult<T> = std::result::Result<T, TranslateError>;

/// Fatal pipeline errors.
///
/// Translator failures are not here: they are isolated to their batch and
/// surface as error placeholders in the output.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("{} is not valid UTF-8 (line {line})", path.display())]
    InvalidUtf8 { path: PathBuf, line: usize },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The output on disk was produced for a different input or translator.
    #[error("cannot resume {}: {reason}", output.display())]
    ResumeMismatch { output: PathBuf, reason: String },

    #[error("cannot resume {}: it has {existing} lines but the input has only {total}", output.display())]
    ResumeBeyondInput { output: PathBuf, existing: usize, total: usize },

    #[error("malformed record file {}: {reason}", path.display())]
    Records { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
