//! Best-score bookkeeping across evaluated epochs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tuner_abstraction::EvaluationResult;

/// Where the best model lives and what it scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub best_score: f64,
    pub best_epoch: usize,
    /// `None` when saving the checkpoint failed.
    pub location: Option<PathBuf>,
}

/// Keeps the per-epoch evaluation history and the running maximum of the primary score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsTracker {
    history: Vec<EvaluationResult>,
    best: Option<(f64, usize)>,
    checkpoint: Option<CheckpointRecord>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an evaluation. Returns `true` when its primary score is a strict new maximum.
    ///
    /// The first evaluation is always a new maximum.
    pub fn record(&mut self, result: EvaluationResult) -> bool {
        let score = result.primary_score();
        let epoch = result.epoch;
        self.history.push(result);

        let improved = match self.best {
            None => true,
            Some((best, _)) => score > best,
        };
        if improved {
            self.best = Some((score, epoch));
        }
        improved
    }

    /// Note the outcome of saving the checkpoint for the current best epoch.
    pub fn set_checkpoint(&mut self, location: Option<PathBuf>) {
        if let Some((best_score, best_epoch)) = self.best {
            self.checkpoint = Some(CheckpointRecord { best_score, best_epoch, location });
        }
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.map(|(score, _)| score)
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best.map(|(_, epoch)| epoch)
    }

    pub fn checkpoint(&self) -> Option<&CheckpointRecord> {
        self.checkpoint.as_ref()
    }

    pub fn history(&self) -> &[EvaluationResult] {
        &self.history
    }

    /// Primary score of the evaluation before the latest one.
    pub fn previous_score(&self) -> Option<f64> {
        let len = self.history.len();
        (len >= 2).then(|| self.history[len - 2].primary_score())
    }

    pub fn latest(&self) -> Option<&EvaluationResult> {
        self.history.last()
    }
}
