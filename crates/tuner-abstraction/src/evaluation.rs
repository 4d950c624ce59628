use crate::error::ModelError;
use crate::model::Seq2SeqModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric key of the primary score (character n-gram F-score, 0-100).
///
/// Drives early stopping and best-checkpoint selection.
pub const PRIMARY_METRIC: &str = "eval_chrf";

/// Outcome of evaluating the model once, at the end of an epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub epoch: usize,
    /// Metric name to score, e.g. `eval_chrf`.
    pub scores: BTreeMap<String, f64>,
    pub samples: usize,
    pub avg_input_length: f64,
    pub avg_output_length: f64,
}

impl EvaluationResult {
    #[must_use]
    pub fn new(epoch: usize, scores: BTreeMap<String, f64>, samples: usize) -> Self {
        Self { epoch, scores, samples, avg_input_length: 0.0, avg_output_length: 0.0 }
    }

    /// Neutral result used when evaluation itself failed.
    #[must_use]
    pub fn empty(epoch: usize) -> Self {
        Self::new(epoch, BTreeMap::new(), 0)
    }

    #[must_use]
    pub fn with_lengths(mut self, avg_input_length: f64, avg_output_length: f64) -> Self {
        self.avg_input_length = avg_input_length;
        self.avg_output_length = avg_output_length;
        self
    }

    /// Primary score; a missing metric counts as 0.
    pub fn primary_score(&self) -> f64 {
        self.score(PRIMARY_METRIC).unwrap_or(0.0)
    }

    pub fn score(&self, metric: &str) -> Option<f64> {
        self.scores.get(metric).copied()
    }
}

/// A source/reference/prediction triple shown to the operator during training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTranslation {
    pub source: String,
    pub reference: String,
    pub prediction: String,
}

/// Evaluates a model on held-out data.
pub trait Evaluator {
    /// Evaluate `model`, producing the result for `epoch`.
    ///
    /// Implementations absorb per-sample failures (an empty prediction is scored in
    /// its place); an `Err` means the evaluation as a whole could not run.
    fn evaluate(&mut self, model: &mut dyn Seq2SeqModel, epoch: usize) -> Result<EvaluationResult, ModelError>;

    /// A handful of translations for qualitative inspection.
    fn sample_translations(&mut self, _model: &mut dyn Seq2SeqModel, _count: usize) -> Vec<SampleTranslation> {
        Vec::new()
    }
}

/// Scores hypotheses against references on a 0-100 scale.
pub trait QualityScorer {
    fn name(&self) -> &str;

    fn sentence_score(&self, hypothesis: &str, reference: &str) -> f64;

    fn corpus_score(&self, hypotheses: &[String], references: &[String]) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_score_defaults_to_zero() {
        let result = EvaluationResult::empty(3);
        assert_eq!(result.epoch, 3);
        assert!(result.primary_score().abs() < f64::EPSILON);
    }

    #[test]
    fn test_primary_score_reads_metric() {
        let mut scores = BTreeMap::new();
        scores.insert(PRIMARY_METRIC.to_string(), 41.5);
        scores.insert("eval_bleu".to_string(), 12.0);
        let result = EvaluationResult::new(0, scores, 10).with_lengths(20.0, 18.5);
        assert!((result.primary_score() - 41.5).abs() < f64::EPSILON);
        assert_eq!(result.score("eval_bleu"), Some(12.0));
        assert!((result.avg_output_length - 18.5).abs() < f64::EPSILON);
    }
}
