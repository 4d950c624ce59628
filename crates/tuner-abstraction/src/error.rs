use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error raised by a model or translation backend.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// The model artifact could not be found.
    #[error("Model not found: {0}")]
    NotFound(String),

    /// A single optimisation step failed.
    #[error("Training step failed: {0}")]
    TrainStep(String),

    /// Generating translations failed (e.g. out of memory, malformed input).
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Saving or loading model state failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
