//! File-backed experiment tracking.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tuner_abstraction::{TrackingError, TrackingSink};

pub const METRICS_FILE: &str = "metrics.jsonl";
pub const PARAMS_FILE: &str = "params.json";
pub const ARTIFACTS_FILE: &str = "artifacts.jsonl";

#[derive(Serialize)]
struct MetricsLine<'a> {
    timestamp: String,
    step: Option<usize>,
    metrics: &'a BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct ArtifactLine<'a> {
    timestamp: String,
    group: &'a str,
    path: &'a Path,
}

/// Appends metrics and artifacts as JSON lines under one directory.
#[derive(Debug, Clone)]
pub struct JsonlTrackingSink {
    dir: PathBuf,
}

impl JsonlTrackingSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TrackingError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append<T: Serialize>(&self, file: &str, line: &T) -> Result<(), TrackingError> {
        let mut out = OpenOptions::new().create(true).append(true).open(self.dir.join(file))?;
        let mut json = serde_json::to_string(line)?;
        json.push('\n');
        out.write_all(json.as_bytes())?;
        Ok(())
    }
}

impl TrackingSink for JsonlTrackingSink {
    fn log_metrics(&mut self, step: Option<usize>, metrics: &BTreeMap<String, f64>) -> Result<(), TrackingError> {
        // JSON has no NaN or infinity
        let finite: BTreeMap<String, f64> =
            metrics.iter().filter(|(_, v)| v.is_finite()).map(|(k, v)| (k.clone(), *v)).collect();
        self.append(METRICS_FILE, &MetricsLine { timestamp: Utc::now().to_rfc3339(), step, metrics: &finite })
    }

    /// Merged into any params already logged for the run.
    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<(), TrackingError> {
        let path = self.dir.join(PARAMS_FILE);
        let mut merged: BTreeMap<String, String> = if path.is_file() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        std::fs::write(path, serde_json::to_string_pretty(&merged)?)?;
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path, group: &str) -> Result<(), TrackingError> {
        if !path.exists() {
            return Err(TrackingError::Unavailable(format!("artifact {} does not exist", path.display())));
        }
        self.append(ARTIFACTS_FILE, &ArtifactLine { timestamp: Utc::now().to_rfc3339(), group, path })
    }
}
