//! Standalone evaluation of trained models, and side-by-side comparison.
//!
//! Unlike [`CorpusEvaluator`](crate::CorpusEvaluator), which feeds the training
//! loop one number per epoch, this reports the full picture for a finished model:
//! chrF++ and BLEU, exact matches, lengths, throughput, per-domain scores and
//! sample translations.

use crate::bleu::BleuScorer;
use crate::chrf::ChrfScorer;
use crate::corpus::ParallelCorpus;
use crate::error::{ModelsError, ModelsResult};
use crate::evaluator::generate_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use tuner_abstraction::{QualityScorer, Seq2SeqModel};

/// Corpus-level results of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScores {
    pub model: String,
    pub samples: usize,
    pub chrf: f64,
    pub bleu: f64,
    /// Predictions equal to the reference, ignoring case and surrounding space.
    pub exact_matches: usize,
    pub exact_match_rate: f64,
    /// Average lengths, in characters.
    pub avg_source_length: f64,
    pub avg_reference_length: f64,
    pub avg_prediction_length: f64,
    pub elapsed_secs: f64,
    pub samples_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScores {
    pub samples: usize,
    pub chrf: f64,
    pub bleu: f64,
    pub avg_source_length: f64,
    pub avg_reference_length: f64,
    pub avg_prediction_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSample {
    pub domain: String,
    pub source: String,
    pub reference: String,
    pub prediction: String,
    pub chrf: f64,
}

/// Per-sentence chrF++ duel between two models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub model_a: String,
    pub model_b: String,
    pub wins_a: usize,
    pub wins_b: usize,
    pub ties: usize,
    pub total: usize,
    pub win_rate_a: f64,
    pub win_rate_b: f64,
}

/// A sentence the compared models disagree on most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergentExample {
    pub index: usize,
    pub source: String,
    pub reference: String,
    pub scores: BTreeMap<String, f64>,
    pub predictions: BTreeMap<String, String>,
    /// Population variance of the per-model sentence scores.
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub split: String,
    pub scores: ModelScores,
    /// Empty when the split has no domain labels.
    pub domains: BTreeMap<String, DomainScores>,
    pub samples: Vec<ScoredSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub split: String,
    pub samples: usize,
    /// Best chrF++ first.
    pub ranking: Vec<ModelScores>,
    pub head_to_head: Vec<HeadToHead>,
    pub divergent: Vec<DivergentExample>,
}

/// Scores predictions with chrF++ and BLEU.
#[derive(Debug, Clone)]
pub struct Assessor {
    chrf: ChrfScorer,
    bleu: BleuScorer,
    batch_size: usize,
}

impl Assessor {
    pub fn new(batch_size: usize) -> Self {
        Self { chrf: ChrfScorer::new(), bleu: BleuScorer::new(), batch_size: batch_size.max(1) }
    }

    /// Translate the corpus with `model` and score it.
    pub fn evaluate(
        &self,
        label: &str,
        model: &mut dyn Seq2SeqModel,
        corpus: &ParallelCorpus,
    ) -> ModelsResult<(ModelScores, Vec<String>)> {
        if corpus.is_empty() {
            return Err(ModelsError::EmptyCorpus("evaluation".to_string()));
        }
        let started = Instant::now();
        let predictions = generate_all(model, &corpus.source, self.batch_size);
        let elapsed = started.elapsed().as_secs_f64();
        let scores = self.score(label, corpus, &predictions, elapsed);
        info!(model = label, samples = scores.samples, chrf = scores.chrf, bleu = scores.bleu, "model evaluated");
        Ok((scores, predictions))
    }

    pub fn score(&self, label: &str, corpus: &ParallelCorpus, predictions: &[String], elapsed_secs: f64) -> ModelScores {
        let samples = corpus.len();
        let exact_matches = predictions
            .iter()
            .zip(&corpus.target)
            .filter(|(p, r)| p.trim().to_lowercase() == r.trim().to_lowercase())
            .count();
        ModelScores {
            model: label.to_string(),
            samples,
            chrf: round2(self.chrf.corpus_score(predictions, &corpus.target)),
            bleu: round2(self.bleu.corpus_score(predictions, &corpus.target)),
            exact_matches,
            exact_match_rate: round2(percent(exact_matches, samples)),
            avg_source_length: avg_chars(corpus.source.iter()),
            avg_reference_length: avg_chars(corpus.target.iter()),
            avg_prediction_length: avg_chars(predictions.iter()),
            elapsed_secs,
            samples_per_second: if elapsed_secs > 0.0 { samples as f64 / elapsed_secs } else { 0.0 },
        }
    }

    /// Scores per domain label, `domains[i]` labelling pair `i`.
    pub fn by_domain(
        &self,
        corpus: &ParallelCorpus,
        predictions: &[String],
        domains: &[String],
    ) -> BTreeMap<String, DomainScores> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, domain) in domains.iter().enumerate().take(corpus.len()) {
            groups.entry(domain.as_str()).or_default().push(i);
        }
        groups
            .into_iter()
            .map(|(domain, indices)| {
                let subset = corpus.select(&indices);
                let preds: Vec<String> = indices.iter().map(|&i| predictions.get(i).cloned().unwrap_or_default()).collect();
                let scores = DomainScores {
                    samples: indices.len(),
                    chrf: round2(self.chrf.corpus_score(&preds, &subset.target)),
                    bleu: round2(self.bleu.corpus_score(&preds, &subset.target)),
                    avg_source_length: avg_chars(subset.source.iter()),
                    avg_reference_length: avg_chars(subset.target.iter()),
                    avg_prediction_length: avg_chars(preds.iter()),
                };
                (domain.to_string(), scores)
            })
            .collect()
    }

    /// Up to `count` seeded samples, kept in corpus order.
    pub fn samples(
        &self,
        corpus: &ParallelCorpus,
        predictions: &[String],
        domains: Option<&[String]>,
        count: usize,
        seed: u64,
    ) -> Vec<ScoredSample> {
        corpus
            .sample_indices(count, seed)
            .into_iter()
            .map(|i| {
                let prediction = predictions.get(i).cloned().unwrap_or_default();
                ScoredSample {
                    domain: domains.and_then(|d| d.get(i)).cloned().unwrap_or_else(|| "unknown".to_string()),
                    source: corpus.source[i].clone(),
                    reference: corpus.target[i].clone(),
                    chrf: round2(self.chrf.sentence_score(&prediction, &corpus.target[i])),
                    prediction,
                }
            })
            .collect()
    }

    /// Every unordered pair of models, in the order given.
    pub fn head_to_head(&self, names: &[String], predictions: &[Vec<String>], references: &[String]) -> Vec<HeadToHead> {
        let sentence_scores: Vec<Vec<f64>> = predictions.iter().map(|p| self.sentence_scores(p, references)).collect();
        let total = references.len();
        let mut duels = Vec::new();
        for a in 0..names.len() {
            for b in a + 1..names.len() {
                let (mut wins_a, mut wins_b, mut ties) = (0, 0, 0);
                for (sa, sb) in sentence_scores[a].iter().zip(&sentence_scores[b]) {
                    if sa > sb {
                        wins_a += 1;
                    } else if sb > sa {
                        wins_b += 1;
                    } else {
                        ties += 1;
                    }
                }
                duels.push(HeadToHead {
                    model_a: names[a].clone(),
                    model_b: names[b].clone(),
                    wins_a,
                    wins_b,
                    ties,
                    total,
                    win_rate_a: round2(percent(wins_a, total)),
                    win_rate_b: round2(percent(wins_b, total)),
                });
            }
        }
        duels
    }

    /// The `count` sentences with the highest variance of per-model scores.
    pub fn divergent_examples(
        &self,
        corpus: &ParallelCorpus,
        names: &[String],
        predictions: &[Vec<String>],
        count: usize,
    ) -> Vec<DivergentExample> {
        if names.is_empty() {
            return Vec::new();
        }
        let sentence_scores: Vec<Vec<f64>> = predictions.iter().map(|p| self.sentence_scores(p, &corpus.target)).collect();
        let mut examples: Vec<DivergentExample> = (0..corpus.len())
            .map(|i| {
                let values: Vec<f64> = sentence_scores.iter().map(|s| s.get(i).copied().unwrap_or(0.0)).collect();
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
                DivergentExample {
                    index: i,
                    source: corpus.source[i].clone(),
                    reference: corpus.target[i].clone(),
                    scores: names.iter().cloned().zip(values.iter().map(|v| round2(*v))).collect(),
                    predictions: names
                        .iter()
                        .cloned()
                        .zip(predictions.iter().map(|p| p.get(i).cloned().unwrap_or_default()))
                        .collect(),
                    variance: round2(variance),
                }
            })
            .collect();
        examples.sort_by(|a, b| b.variance.total_cmp(&a.variance).then(a.index.cmp(&b.index)));
        examples.truncate(count);
        examples
    }

    fn sentence_scores(&self, predictions: &[String], references: &[String]) -> Vec<f64> {
        references
            .iter()
            .enumerate()
            .map(|(i, reference)| self.chrf.sentence_score(predictions.get(i).map_or("", String::as_str), reference))
            .collect()
    }
}

/// Sort best chrF++ first; ties keep their order.
pub fn rank(scores: &mut [ModelScores]) {
    scores.sort_by(|a, b| b.chrf.total_cmp(&a.chrf));
}

/// `source,reference,prediction,domain` with a header row.
pub fn write_predictions_csv(
    path: &Path,
    corpus: &ParallelCorpus,
    predictions: &[String],
    domains: Option<&[String]>,
) -> ModelsResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["source", "reference", "prediction", "domain"])?;
    for (i, (source, reference)) in corpus.source.iter().zip(&corpus.target).enumerate() {
        let prediction = predictions.get(i).map_or("", String::as_str);
        let domain = domains.and_then(|d| d.get(i)).map_or("unknown", String::as_str);
        writer.write_record([source.as_str(), reference.as_str(), prediction, domain])?;
    }
    writer.flush()?;
    Ok(())
}

/// `source,reference,prediction_<name>...` with one prediction column per model.
pub fn write_translations_csv(
    path: &Path,
    corpus: &ParallelCorpus,
    names: &[String],
    predictions: &[Vec<String>],
) -> ModelsResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["source".to_string(), "reference".to_string()];
    header.extend(names.iter().map(|n| format!("prediction_{n}")));
    writer.write_record(&header)?;
    for (i, (source, reference)) in corpus.source.iter().zip(&corpus.target).enumerate() {
        let mut row = vec![source.clone(), reference.clone()];
        row.extend(predictions.iter().map(|p| p.get(i).cloned().unwrap_or_default()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Ranking table, one row per model.
pub fn write_ranking_csv(path: &Path, ranking: &[ModelScores]) -> ModelsResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["rank", "model", "chrf", "bleu", "exact_match_rate", "avg_prediction_length", "samples_per_second"])?;
    for (i, scores) in ranking.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            scores.model.clone(),
            format!("{:.2}", scores.chrf),
            format!("{:.2}", scores.bleu),
            format!("{:.1}", scores.exact_match_rate),
            format!("{:.1}", scores.avg_prediction_length),
            format!("{:.1}", scores.samples_per_second),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn avg_chars<'a>(texts: impl ExactSizeIterator<Item = &'a String>) -> f64 {
    let n = texts.len();
    if n == 0 {
        return 0.0;
    }
    round2(texts.map(|t| t.chars().count()).sum::<usize>() as f64 / n as f64)
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 * 100.0 }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
