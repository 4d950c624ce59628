use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tuner_abstraction::{format_duration, SampleTranslation};

/// Direction of the primary score relative to the previous evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    First,
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn between(previous: Option<f64>, current: f64) -> Self {
        match previous {
            None => Self::First,
            Some(prev) if current > prev => Self::Up,
            Some(prev) if current < prev => Self::Down,
            Some(_) => Self::Flat,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::First => "·",
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => "→",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedEpoch {
    pub primary_score: f64,
    pub trend: Trend,
    /// The evaluation set a new best score.
    pub is_best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub total_epochs: usize,
    pub loss: f64,
    /// `None` when evaluation was skipped this epoch.
    pub evaluation: Option<EvaluatedEpoch>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrainingEvent {
    Started { run_dir: PathBuf, epochs: usize, batches_per_epoch: usize, examples: usize },
    EpochStarted { epoch: usize, total_epochs: usize },
    BatchCompleted { epoch: usize, batch: usize, total_batches: usize, loss: f64 },
    EpochCompleted(EpochSummary),
    CheckpointSaved { epoch: usize, score: f64, path: PathBuf },
    CheckpointFailed { epoch: usize, reason: String },
    Samples { epoch: usize, samples: Vec<SampleTranslation> },
    EarlyStopped { epoch: usize, best_score: f64, best_epoch: usize },
    Finished { best_score: Option<f64>, best_epoch: Option<usize>, elapsed: Duration },
}

pub trait ProgressSink {
    fn on_event(&self, event: TrainingEvent);
}

/// Reports progress through `tracing`.
///
/// Per-batch events are dropped; checkpoint failures are already logged as warnings.
#[derive(Debug, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn on_event(&self, event: TrainingEvent) {
        match event {
            TrainingEvent::Started { run_dir, epochs, batches_per_epoch, examples } => {
                info!(run_dir = %run_dir.display(), epochs, batches_per_epoch, examples, "training started");
            }
            TrainingEvent::EpochStarted { .. }
            | TrainingEvent::BatchCompleted { .. }
            | TrainingEvent::CheckpointFailed { .. } => {}
            TrainingEvent::EpochCompleted(summary) => match summary.evaluation {
                Some(eval) => info!(
                    epoch = summary.epoch + 1,
                    total = summary.total_epochs,
                    loss = summary.loss,
                    chrf = eval.primary_score,
                    trend = eval.trend.arrow(),
                    best = eval.is_best,
                    time = %format_duration(summary.elapsed),
                    "epoch completed"
                ),
                None => info!(
                    epoch = summary.epoch + 1,
                    total = summary.total_epochs,
                    loss = summary.loss,
                    time = %format_duration(summary.elapsed),
                    "epoch completed (evaluation skipped)"
                ),
            },
            TrainingEvent::CheckpointSaved { epoch, score, path } => {
                info!(epoch = epoch + 1, score, path = %path.display(), "best checkpoint saved");
            }
            TrainingEvent::Samples { epoch, samples } => {
                for sample in samples {
                    info!(
                        epoch = epoch + 1,
                        source = %sample.source,
                        reference = %sample.reference,
                        prediction = %sample.prediction,
                        "sample translation"
                    );
                }
            }
            TrainingEvent::EarlyStopped { epoch, best_score, best_epoch } => {
                info!(epoch = epoch + 1, best_score, best_epoch = best_epoch + 1, "early stopping triggered");
            }
            TrainingEvent::Finished { best_score, best_epoch, elapsed } => {
                info!(
                    best_score = best_score.unwrap_or(0.0),
                    best_epoch = best_epoch.map_or(0, |e| e + 1),
                    time = %format_duration(elapsed),
                    "training finished"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_between() {
        assert_eq!(Trend::between(None, 3.0), Trend::First);
        assert_eq!(Trend::between(Some(2.0), 3.0), Trend::Up);
        assert_eq!(Trend::between(Some(4.0), 3.0), Trend::Down);
        assert_eq!(Trend::between(Some(3.0), 3.0), Trend::Flat);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = TrainingEvent::CheckpointFailed { epoch: 2, reason: "disk full".to_string() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "checkpoint_failed");
        assert_eq!(json["epoch"], 2);
    }
}
