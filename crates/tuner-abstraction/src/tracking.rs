use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Experiment-tracking sink.
///
/// Tracking is never load-bearing: callers log failures and carry on.
pub trait TrackingSink {
    /// Record scalar metrics, keyed by epoch when `step` is set.
    fn log_metrics(&mut self, step: Option<usize>, metrics: &BTreeMap<String, f64>) -> Result<(), TrackingError>;

    /// Record run parameters (configuration echo).
    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<(), TrackingError>;

    /// Register a file or directory produced by the run under `group`.
    fn log_artifact(&mut self, path: &Path, group: &str) -> Result<(), TrackingError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrackingSink;

impl TrackingSink for NullTrackingSink {
    fn log_metrics(&mut self, _step: Option<usize>, _metrics: &BTreeMap<String, f64>) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_params(&mut self, _params: &BTreeMap<String, String>) -> Result<(), TrackingError> {
        Ok(())
    }

    fn log_artifact(&mut self, _path: &Path, _group: &str) -> Result<(), TrackingError> {
        Ok(())
    }
}
