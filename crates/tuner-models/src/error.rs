use std::path::PathBuf;
use thiserror::Error;
use tuner_abstraction::ModelError;

pub type ModelsResult<T> = std::result::Result<T, ModelsError>;

#[derive(Debug, Error)]
pub enum ModelsError {
    #[error("corpus file not found: {}", .0.display())]
    CorpusNotFound(PathBuf),

    #[error("{} is not valid UTF-8 (line {line})", path.display())]
    InvalidUtf8 { path: PathBuf, line: usize },

    #[error("{split} split is misaligned: {source_lines} source lines, {target_lines} target lines")]
    Misaligned { split: String, source_lines: usize, target_lines: usize },

    #[error("{0} split is empty")]
    EmptyCorpus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<ModelsError> for ModelError {
    fn from(err: ModelsError) -> Self {
        match err {
            ModelsError::CorpusNotFound(path) => Self::NotFound(path.display().to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}
