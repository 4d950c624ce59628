//! Convergence statistics over the evaluated epochs of a run.

use serde::{Deserialize, Serialize};
use tuner_abstraction::EvaluationResult;

/// Trailing evaluations considered for stability.
const STABILITY_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSummary {
    pub best_epoch: usize,
    pub best_score: f64,
    /// `1 / (1 + sum of squared deviations)` of the trailing primary scores; 1.0 is flat.
    pub stability: f64,
    /// `(best - first) / max(1, best_epoch)`.
    pub improvement_rate: f64,
}

impl ConvergenceSummary {
    /// Summarize `history`. Needs at least two evaluations.
    pub fn from_history(history: &[EvaluationResult]) -> Option<Self> {
        if history.len() < 2 {
            return None;
        }

        let mut best = &history[0];
        for result in &history[1..] {
            if result.primary_score() > best.primary_score() {
                best = result;
            }
        }
        let best_score = best.primary_score();
        let best_epoch = best.epoch;

        let recent: Vec<f64> =
            history[history.len().saturating_sub(STABILITY_WINDOW)..].iter().map(EvaluationResult::primary_score).collect();
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        let spread: f64 = recent.iter().map(|s| (s - mean).powi(2)).sum();
        let stability = 1.0 / (1.0 + spread);

        let first = history[0].primary_score();
        let improvement_rate = (best_score - first) / best_epoch.max(1) as f64;

        Some(Self { best_epoch, best_score, stability, improvement_rate })
    }

    /// Flat metric map for tracking sinks.
    pub fn to_metrics(&self) -> Vec<(String, f64)> {
        vec![
            ("convergence_best_epoch".to_string(), self.best_epoch as f64),
            ("convergence_best_score".to_string(), self.best_score),
            ("stability".to_string(), self.stability),
            ("improvement_rate".to_string(), self.improvement_rate),
        ]
    }
}
