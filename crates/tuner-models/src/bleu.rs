//! BLEU: geometric mean of word n-gram precisions with a brevity penalty.

use std::collections::HashMap;
use tuner_abstraction::QualityScorer;

const MAX_ORDER: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BleuStats {
    matches: [usize; MAX_ORDER],
    totals: [usize; MAX_ORDER],
    hyp_len: usize,
    ref_len: usize,
}

impl BleuStats {
    fn add(&mut self, other: &Self) {
        for n in 0..MAX_ORDER {
            self.matches[n] += other.matches[n];
            self.totals[n] += other.totals[n];
        }
        self.hyp_len += other.hyp_len;
        self.ref_len += other.ref_len;
    }
}

/// BLEU on a 0-100 scale, orders 1-4.
///
/// Orders the hypothesis is too short to have are left out of the mean, and an
/// order without matches is smoothed exponentially, so short sentences still get
/// a non-zero score.
#[derive(Debug, Clone, Default)]
pub struct BleuScorer;

impl BleuScorer {
    pub fn new() -> Self {
        Self
    }

    fn stats(hypothesis: &str, reference: &str) -> BleuStats {
        let hyp = tokenize(hypothesis);
        let reference = tokenize(reference);
        let mut stats = BleuStats { hyp_len: hyp.len(), ref_len: reference.len(), ..BleuStats::default() };
        for n in 1..=MAX_ORDER {
            let hyp_grams = ngrams(&hyp, n);
            let ref_grams = ngrams(&reference, n);
            stats.totals[n - 1] = hyp_grams.values().sum();
            stats.matches[n - 1] =
                hyp_grams.iter().map(|(gram, count)| ref_grams.get(gram).map_or(0, |r| (*r).min(*count))).sum();
        }
        stats
    }

    fn score(stats: &BleuStats) -> f64 {
        if stats.hyp_len == 0 {
            return 0.0;
        }
        let mut log_sum = 0.0;
        let mut orders = 0usize;
        let mut smoothing = 1.0;
        for n in 0..MAX_ORDER {
            if stats.totals[n] == 0 {
                continue;
            }
            orders += 1;
            let precision = if stats.matches[n] == 0 {
                smoothing *= 2.0;
                100.0 / (smoothing * stats.totals[n] as f64)
            } else {
                100.0 * stats.matches[n] as f64 / stats.totals[n] as f64
            };
            log_sum += precision.ln();
        }
        if orders == 0 {
            return 0.0;
        }
        let brevity = if stats.hyp_len < stats.ref_len {
            (1.0 - stats.ref_len as f64 / stats.hyp_len as f64).exp()
        } else {
            1.0
        };
        brevity * (log_sum / orders as f64).exp()
    }
}

/// Whitespace tokens with every ASCII punctuation mark split off as its own token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let mut current = String::new();
        for c in word.chars() {
            if c.is_ascii_punctuation() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

fn ngrams(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}

impl QualityScorer for BleuScorer {
    fn name(&self) -> &str {
        "BLEU"
    }

    fn sentence_score(&self, hypothesis: &str, reference: &str) -> f64 {
        Self::score(&Self::stats(hypothesis, reference))
    }

    /// Counts and lengths are summed over all pairs first.
    fn corpus_score(&self, hypotheses: &[String], references: &[String]) -> f64 {
        let mut totals = BleuStats::default();
        for (hyp, reference) in hypotheses.iter().zip(references) {
            totals.add(&Self::stats(hyp, reference));
        }
        Self::score(&totals)
    }
}
