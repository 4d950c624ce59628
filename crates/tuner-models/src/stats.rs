//! Length statistics of a parallel split, for choosing length-ratio filters.

use crate::corpus::ParallelCorpus;
use serde::{Deserialize, Serialize};

/// Pairs whose character ratio falls below this are listed as extremes.
pub const LOW_RATIO: f64 = 0.5;
/// Pairs whose character ratio rises above this are listed as extremes.
pub const HIGH_RATIO: f64 = 2.0;

const EXTREME_EXAMPLES: usize = 3;

/// Distribution of a target/source length ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSummary {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub p5: f64,
    pub p10: f64,
    pub p90: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl RatioSummary {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / sorted.len() as f64;
        Self {
            mean,
            median: interpolate(&sorted, 0.5),
            std: variance.sqrt(),
            p5: interpolate(&sorted, 0.05),
            p10: interpolate(&sorted, 0.10),
            p90: interpolate(&sorted, 0.90),
            p95: interpolate(&sorted, 0.95),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

/// Length statistics over the pairs where both sides have text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub pairs: usize,
    /// Pairs left out because one side is blank.
    pub blank_pairs: usize,
    pub avg_source_chars: f64,
    pub avg_target_chars: f64,
    pub avg_source_words: f64,
    pub avg_target_words: f64,
    /// Target characters over source characters.
    pub char_ratio: RatioSummary,
    /// Target words over source words.
    pub word_ratio: RatioSummary,
    /// Indices of the first pairs with a character ratio under [`LOW_RATIO`].
    pub low_ratio_examples: Vec<usize>,
    /// Indices of the first pairs with a character ratio over [`HIGH_RATIO`].
    pub high_ratio_examples: Vec<usize>,
}

impl CorpusStatistics {
    pub fn compute(corpus: &ParallelCorpus) -> Self {
        let mut stats = Self::default();
        let mut char_ratios = Vec::new();
        let mut word_ratios = Vec::new();
        let (mut source_chars, mut target_chars, mut source_words, mut target_words) = (0usize, 0usize, 0usize, 0usize);

        for (i, (source, target)) in corpus.source.iter().zip(&corpus.target).enumerate() {
            if source.trim().is_empty() || target.trim().is_empty() {
                stats.blank_pairs += 1;
                continue;
            }
            let (sc, tc) = (source.chars().count(), target.chars().count());
            let (sw, tw) = (source.split_whitespace().count(), target.split_whitespace().count());
            source_chars += sc;
            target_chars += tc;
            source_words += sw;
            target_words += tw;

            let ratio = tc as f64 / sc as f64;
            if ratio < LOW_RATIO && stats.low_ratio_examples.len() < EXTREME_EXAMPLES {
                stats.low_ratio_examples.push(i);
            }
            if ratio > HIGH_RATIO && stats.high_ratio_examples.len() < EXTREME_EXAMPLES {
                stats.high_ratio_examples.push(i);
            }
            char_ratios.push(ratio);
            word_ratios.push(tw as f64 / sw as f64);
        }

        stats.pairs = char_ratios.len();
        if stats.pairs > 0 {
            let n = stats.pairs as f64;
            stats.avg_source_chars = source_chars as f64 / n;
            stats.avg_target_chars = target_chars as f64 / n;
            stats.avg_source_words = source_words as f64 / n;
            stats.avg_target_words = target_words as f64 / n;
        }
        stats.char_ratio = RatioSummary::from_values(&char_ratios);
        stats.word_ratio = RatioSummary::from_values(&word_ratios);
        stats
    }
}

/// Linear interpolation between closest ranks of an ascending slice.
fn interpolate(sorted: &[f64], quantile: f64) -> f64 {
    let position = quantile * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
