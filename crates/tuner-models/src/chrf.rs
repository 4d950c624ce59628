//! chrF++: character n-gram F-score with word n-grams added.

use std::collections::HashMap;
use tuner_abstraction::QualityScorer;

const CHAR_ORDER: usize = 6;
const WORD_ORDER: usize = 2;
const BETA: f64 = 2.0;

/// Per n-gram order: hypothesis count, reference count, matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OrderStats {
    hyp: usize,
    reference: usize,
    matched: usize,
}

/// chrF++ on a 0-100 scale (character orders 1-6, word orders 1-2, beta 2).
#[derive(Debug, Clone)]
pub struct ChrfScorer {
    char_order: usize,
    word_order: usize,
    beta: f64,
}

impl Default for ChrfScorer {
    fn default() -> Self {
        Self { char_order: CHAR_ORDER, word_order: WORD_ORDER, beta: BETA }
    }
}

impl ChrfScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain chrF: character n-grams only.
    pub fn chars_only() -> Self {
        Self { word_order: 0, ..Self::default() }
    }

    fn stats(&self, hypothesis: &str, reference: &str) -> Vec<OrderStats> {
        let hyp_chars: Vec<char> = hypothesis.chars().filter(|c| !c.is_whitespace()).collect();
        let ref_chars: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();
        let hyp_words = words(hypothesis);
        let ref_words = words(reference);

        let mut stats = Vec::with_capacity(self.char_order + self.word_order);
        for n in 1..=self.char_order {
            stats.push(match_ngrams(&ngrams(&hyp_chars, n), &ngrams(&ref_chars, n)));
        }
        for n in 1..=self.word_order {
            stats.push(match_ngrams(&ngrams(&hyp_words, n), &ngrams(&ref_words, n)));
        }
        stats
    }

    fn f_score(&self, stats: &[OrderStats]) -> f64 {
        let factor = self.beta * self.beta;
        let mut total = 0.0;
        let mut orders = 0usize;
        for s in stats {
            if s.hyp == 0 && s.reference == 0 {
                continue;
            }
            orders += 1;
            if s.hyp == 0 || s.reference == 0 || s.matched == 0 {
                continue;
            }
            let precision = s.matched as f64 / s.hyp as f64;
            let recall = s.matched as f64 / s.reference as f64;
            total += (1.0 + factor) * precision * recall / (factor * precision + recall);
        }
        if orders == 0 { 0.0 } else { 100.0 * total / orders as f64 }
    }
}

/// Whitespace tokens with a leading or trailing punctuation mark split off.
fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        let first = word.chars().next();
        let last = word.chars().next_back();
        if word.chars().count() == 1 {
            out.push(word.to_string());
        } else if let Some(p) = last.filter(char::is_ascii_punctuation) {
            out.push(word[..word.len() - p.len_utf8()].to_string());
            out.push(p.to_string());
        } else if let Some(p) = first.filter(char::is_ascii_punctuation) {
            out.push(p.to_string());
            out.push(word[p.len_utf8()..].to_string());
        } else {
            out.push(word.to_string());
        }
    }
    out
}

fn ngrams<T: Clone + Eq + std::hash::Hash>(tokens: &[T], n: usize) -> HashMap<Vec<T>, usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        *counts.entry(window.to_vec()).or_insert(0) += 1;
    }
    counts
}

fn match_ngrams<T: Eq + std::hash::Hash>(hyp: &HashMap<Vec<T>, usize>, reference: &HashMap<Vec<T>, usize>) -> OrderStats {
    let matched = hyp.iter().map(|(gram, count)| reference.get(gram).map_or(0, |r| (*r).min(*count))).sum();
    OrderStats { hyp: hyp.values().sum(), reference: reference.values().sum(), matched }
}

impl QualityScorer for ChrfScorer {
    fn name(&self) -> &str {
        if self.word_order > 0 { "chrF++" } else { "chrF" }
    }

    fn sentence_score(&self, hypothesis: &str, reference: &str) -> f64 {
        self.f_score(&self.stats(hypothesis, reference))
    }

    /// Statistics are summed over all pairs before the F-score is taken.
    fn corpus_score(&self, hypotheses: &[String], references: &[String]) -> f64 {
        let mut totals = vec![OrderStats::default(); self.char_order + self.word_order];
        for (hyp, reference) in hypotheses.iter().zip(references) {
            for (total, s) in totals.iter_mut().zip(self.stats(hyp, reference)) {
                total.hyp += s.hyp;
                total.reference += s.reference;
                total.matched += s.matched;
            }
        }
        self.f_score(&totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_is_100() {
        let scorer = ChrfScorer::new();
        assert!((scorer.sentence_score("Hola, mundo.", "Hola, mundo.") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_is_0() {
        let scorer = ChrfScorer::new();
        assert!(scorer.sentence_score("xyz", "abc").abs() < 1e-9);
        assert!(scorer.sentence_score("", "abc").abs() < 1e-9);
        assert!(scorer.sentence_score("", "").abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap_is_between() {
        let scorer = ChrfScorer::new();
        let close = scorer.sentence_score("el gato negro", "el gato blanco");
        let far = scorer.sentence_score("un perro", "el gato blanco");
        assert!(close > far);
        assert!(close > 0.0 && close < 100.0);
    }

    #[test]
    fn test_corpus_pools_statistics() {
        let scorer = ChrfScorer::new();
        let hyps = vec!["hola mundo".to_string(), "abc".to_string()];
        let refs = vec!["hola mundo".to_string(), "xyz".to_string()];
        let corpus = scorer.corpus_score(&hyps, &refs);
        assert!(corpus > 0.0 && corpus < 100.0);
    }

    #[test]
    fn test_words_split_punctuation() {
        assert_eq!(words("Hola, mundo. ¿qué? a"), vec!["Hola", ",", "mundo", ".", "¿qué", "?", "a"]);
        assert_eq!(words("(nota"), vec!["(", "nota"]);
    }

    #[test]
    fn test_names() {
        assert_eq!(ChrfScorer::new().name(), "chrF++");
        assert_eq!(ChrfScorer::chars_only().name(), "chrF");
    }
}
