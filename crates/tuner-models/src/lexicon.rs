//! Word co-occurrence lexicon: a small, deterministic stand-in for a neural seq2seq model.
//!
//! Training counts how often each source word appears in a sentence pair with each
//! target word. Generation replaces every source word by the target word with the
//! strongest Dice association, or copies it when nothing is associated strongly enough.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;
use tuner_abstraction::{ModelError, Seq2SeqModel};

const LEXICON_FILE: &str = "lexicon.json";

/// Association below which a source word is copied instead of translated.
const MIN_ASSOCIATION: f64 = 0.1;

/// Floor for per-word probabilities in the loss.
const MIN_PROBABILITY: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct LexiconState {
    id: String,
    max_length: usize,
    /// Pairs seen in training.
    pairs: u64,
    source_counts: BTreeMap<String, u64>,
    target_counts: BTreeMap<String, u64>,
    cooccurrence: BTreeMap<String, BTreeMap<String, u64>>,
}

#[derive(Debug, Clone)]
pub struct LexiconModel {
    state: LexiconState,
    /// Best target per source word, rebuilt lazily after training.
    cache: Option<BTreeMap<String, (String, f64)>>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

impl LexiconModel {
    pub fn new(id: impl Into<String>, max_length: usize) -> Self {
        Self {
            state: LexiconState { id: id.into(), max_length: max_length.max(1), ..LexiconState::default() },
            cache: None,
        }
    }

    /// Load a model saved with [`Seq2SeqModel::save`].
    pub fn from_dir(dir: &Path) -> Result<Self, ModelError> {
        let mut model = Self::new("lexicon", 1);
        model.load(dir)?;
        Ok(model)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.state.source_counts.len()
    }

    pub fn pairs_seen(&self) -> u64 {
        self.state.pairs
    }

    fn dice(&self, source: &str, target: &str) -> f64 {
        let joint = self.state.cooccurrence.get(source).and_then(|t| t.get(target)).copied().unwrap_or(0);
        let fs = self.state.source_counts.get(source).copied().unwrap_or(0);
        let ft = self.state.target_counts.get(target).copied().unwrap_or(0);
        if joint == 0 || fs + ft == 0 {
            return 0.0;
        }
        2.0 * joint as f64 / (fs + ft) as f64
    }

    /// Probability-like score of `target` given the source words: the best association.
    fn target_probability(&self, source: &[String], target: &str) -> f64 {
        source.iter().map(|s| self.dice(s, target)).fold(0.0, f64::max).max(MIN_PROBABILITY)
    }

    fn best_targets(&mut self) -> &BTreeMap<String, (String, f64)> {
        if self.cache.is_none() {
            let mut best = BTreeMap::new();
            for (source, targets) in &self.state.cooccurrence {
                let choice = targets
                    .keys()
                    .map(|t| (t.clone(), self.dice(source, t)))
                    .fold(None, |acc: Option<(String, f64)>, (t, score)| match acc {
                        Some((_, s)) if s >= score => acc,
                        _ => Some((t, score)),
                    });
                if let Some(choice) = choice {
                    best.insert(source.clone(), choice);
                }
            }
            self.cache = Some(best);
        }
        self.cache.get_or_insert_with(BTreeMap::new)
    }

    fn translate_sentence(&mut self, sentence: &str) -> String {
        let max_length = self.state.max_length;
        let lexicon = self.best_targets();
        tokenize(sentence)
            .into_iter()
            .take(max_length)
            .map(|word| match lexicon.get(&word) {
                Some((target, score)) if *score >= MIN_ASSOCIATION => target.clone(),
                _ => word,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Seq2SeqModel for LexiconModel {
    fn id(&self) -> &str {
        &self.state.id
    }

    /// Loss is the mean negative log association of each target word, measured
    /// before the batch is counted.
    fn train_step(&mut self, source: &[String], target: &[String]) -> Result<f64, ModelError> {
        if source.len() != target.len() {
            return Err(ModelError::TrainStep(format!(
                "batch has {} source and {} target sentences",
                source.len(),
                target.len()
            )));
        }

        let mut loss = 0.0;
        let mut scored = 0usize;
        for (src, tgt) in source.iter().zip(target) {
            let src_words = tokenize(src);
            let tgt_words = tokenize(tgt);
            for word in &tgt_words {
                loss -= self.target_probability(&src_words, word).ln();
                scored += 1;
            }

            let src_unique: BTreeSet<String> = src_words.into_iter().collect();
            let tgt_unique: BTreeSet<String> = tgt_words.into_iter().collect();
            for s in &src_unique {
                *self.state.source_counts.entry(s.clone()).or_insert(0) += 1;
                let row = self.state.cooccurrence.entry(s.clone()).or_default();
                for t in &tgt_unique {
                    *row.entry(t.clone()).or_insert(0) += 1;
                }
            }
            for t in tgt_unique {
                *self.state.target_counts.entry(t).or_insert(0) += 1;
            }
            self.state.pairs += 1;
        }
        self.cache = None;

        Ok(if scored == 0 { 0.0 } else { loss / scored as f64 })
    }

    fn generate(&mut self, source: &[String]) -> Result<Vec<String>, ModelError> {
        Ok(source.iter().map(|s| self.translate_sentence(s)).collect())
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join(LEXICON_FILE), serde_json::to_string(&self.state)?)?;
        debug!(path = %path.display(), vocabulary = self.vocabulary_size(), "lexicon saved");
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<(), ModelError> {
        let file = path.join(LEXICON_FILE);
        if !file.is_file() {
            return Err(ModelError::NotFound(format!("no model at {}", path.display())));
        }
        self.state = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
        self.cache = None;
        Ok(())
    }

    fn release_buffers(&mut self) {
        self.cache = None;
    }
}
