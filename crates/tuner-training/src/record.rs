use crate::artifacts::TrainingArtifact;
use crate::config::TrainingConfig;
use crate::convergence::ConvergenceSummary;
use crate::error::TrainingResult;
use crate::tracker::CheckpointRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Persistent summary of one training run, written as `training_record.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRunRecord {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model_id: String,
    pub config: TrainingConfig,
    pub best_score: Option<f64>,
    pub best_epoch: Option<usize>,
    pub total_elapsed_secs: f64,
    pub early_stopped: bool,
    /// Number of epochs that completed training.
    pub final_epoch: usize,
    pub convergence: Option<ConvergenceSummary>,
    pub loss_history: Vec<f64>,
    pub checkpoint: Option<CheckpointRecord>,
    pub final_model: Option<PathBuf>,
    #[serde(default)]
    pub artifacts: Vec<TrainingArtifact>,
}

impl TrainingRunRecord {
    pub fn write(&self, path: &Path) -> TrainingResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn read(path: &Path) -> TrainingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
