//! Parallel corpora stored as `<split>.<lang>` line files, and batching over them.

use crate::error::{ModelsError, ModelsResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use tracing::debug;
use tuner_abstraction::{decode_utf8, split_lines, BatchSupply, ParallelBatch};

/// Aligned sentence pairs: `source[i]` translates to `target[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelCorpus {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

impl ParallelCorpus {
    pub fn new(source: Vec<String>, target: Vec<String>) -> ModelsResult<Self> {
        if source.len() != target.len() {
            return Err(ModelsError::Misaligned {
                split: "in-memory".to_string(),
                source_lines: source.len(),
                target_lines: target.len(),
            });
        }
        Ok(Self { source, target })
    }

    /// Load `<dir>/<split>.<src>` and `<dir>/<split>.<tgt>`.
    pub fn load(dir: &Path, split: &str, source_lang: &str, target_lang: &str) -> ModelsResult<Self> {
        let source = read_lines(&dir.join(format!("{split}.{source_lang}")))?;
        let target = read_lines(&dir.join(format!("{split}.{target_lang}")))?;
        if source.len() != target.len() {
            return Err(ModelsError::Misaligned {
                split: split.to_string(),
                source_lines: source.len(),
                target_lines: target.len(),
            });
        }
        debug!(dir = %dir.display(), split, pairs = source.len(), "corpus loaded");
        Ok(Self { source, target })
    }

    /// Domain label of each pair from `<dir>/<split>.source`, when that file exists.
    pub fn load_domains(dir: &Path, split: &str, expected: usize) -> ModelsResult<Option<Vec<String>>> {
        let path = dir.join(format!("{split}.source"));
        if !path.is_file() {
            return Ok(None);
        }
        let domains = read_lines(&path)?;
        if domains.len() != expected {
            return Err(ModelsError::Misaligned {
                split: format!("{split} domains"),
                source_lines: expected,
                target_lines: domains.len(),
            });
        }
        Ok(Some(domains))
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Up to `n` pairs chosen with a seeded shuffle, kept in corpus order.
    #[must_use]
    pub fn sample(&self, n: usize, seed: u64) -> Self {
        self.select(&self.sample_indices(n, seed))
    }

    /// Indices [`sample`](Self::sample) keeps, for filtering data aligned with the corpus.
    pub fn sample_indices(&self, n: usize, seed: u64) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        if n >= self.len() {
            return indices;
        }
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
        indices.truncate(n);
        indices.sort_unstable();
        indices
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            source: indices.iter().map(|&i| self.source[i].clone()).collect(),
            target: indices.iter().map(|&i| self.target[i].clone()).collect(),
        }
    }
}

fn read_lines(path: &Path) -> ModelsResult<Vec<String>> {
    if !path.is_file() {
        return Err(ModelsError::CorpusNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let text = decode_utf8(&bytes).map_err(|e| ModelsError::InvalidUtf8 { path: path.to_path_buf(), line: e.line })?;
    Ok(split_lines(text).into_iter().map(|l| l.trim().to_string()).collect())
}

/// Fixed-size batches over a corpus, optionally reshuffled every epoch.
pub struct CorpusBatches {
    corpus: ParallelCorpus,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
}

impl CorpusBatches {
    /// `batch_size` of 0 is treated as 1.
    pub fn new(corpus: ParallelCorpus, batch_size: usize, shuffle: bool, seed: u64) -> Self {
        Self { corpus, batch_size: batch_size.max(1), shuffle, seed }
    }

    fn order(&self, epoch: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.corpus.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(epoch as u64));
            indices.shuffle(&mut rng);
        }
        indices
    }
}

impl BatchSupply for CorpusBatches {
    fn num_batches(&self) -> usize {
        self.corpus.len().div_ceil(self.batch_size)
    }

    fn num_examples(&self) -> usize {
        self.corpus.len()
    }

    fn epoch_batches(&mut self, epoch: usize) -> Box<dyn Iterator<Item = ParallelBatch> + '_> {
        let order = self.order(epoch);
        let batch_size = self.batch_size;
        let corpus = &self.corpus;
        Box::new((0..order.len()).step_by(batch_size).map(move |start| {
            let end = (start + batch_size).min(order.len());
            let picked = corpus.select(&order[start..end]);
            ParallelBatch::new(picked.source, picked.target)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus(n: usize) -> ParallelCorpus {
        ParallelCorpus::new(
            (0..n).map(|i| format!("s{i}")).collect(),
            (0..n).map(|i| format!("t{i}")).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_load_and_misalignment() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("train.es"), "hola\nmundo\n").unwrap();
        std::fs::write(temp.path().join("train.agr"), "ju\nnugka\n").unwrap();
        std::fs::write(temp.path().join("dev.es"), "a\nb\n").unwrap();
        std::fs::write(temp.path().join("dev.agr"), "a\n").unwrap();

        let train = ParallelCorpus::load(temp.path(), "train", "es", "agr").unwrap();
        assert_eq!(train.source, vec!["hola", "mundo"]);
        assert_eq!(train.target, vec!["ju", "nugka"]);

        assert!(matches!(
            ParallelCorpus::load(temp.path(), "dev", "es", "agr"),
            Err(ModelsError::Misaligned { source_lines: 2, target_lines: 1, .. })
        ));
        assert!(matches!(
            ParallelCorpus::load(temp.path(), "test", "es", "agr"),
            Err(ModelsError::CorpusNotFound(_))
        ));
    }

    #[test]
    fn test_load_splits_carriage_returns_and_rejects_bad_bytes() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("train.es"), "hola\rmundo\r").unwrap();
        std::fs::write(temp.path().join("train.agr"), "ju\r\nnugka\n").unwrap();
        std::fs::write(temp.path().join("dev.es"), b"a\n\xffb\n").unwrap();
        std::fs::write(temp.path().join("dev.agr"), "a\nb\n").unwrap();

        let train = ParallelCorpus::load(temp.path(), "train", "es", "agr").unwrap();
        assert_eq!(train.source, vec!["hola", "mundo"]);
        assert_eq!(train.target, vec!["ju", "nugka"]);

        assert!(matches!(
            ParallelCorpus::load(temp.path(), "dev", "es", "agr"),
            Err(ModelsError::InvalidUtf8 { line: 2, .. })
        ));
    }

    #[test]
    fn test_load_domains() {
        let temp = TempDir::new().unwrap();
        assert_eq!(ParallelCorpus::load_domains(temp.path(), "dev", 2).unwrap(), None);

        std::fs::write(temp.path().join("dev.source"), "bible\nnews\n").unwrap();
        assert_eq!(
            ParallelCorpus::load_domains(temp.path(), "dev", 2).unwrap(),
            Some(vec!["bible".to_string(), "news".to_string()])
        );
        assert!(matches!(ParallelCorpus::load_domains(temp.path(), "dev", 3), Err(ModelsError::Misaligned { .. })));
    }

    #[test]
    fn test_sample_is_seeded_and_ordered() {
        let full = corpus(20);
        let a = full.sample(5, 7);
        let b = full.sample(5, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        let mut sorted = a.source.clone();
        sorted.sort_by_key(|s| s[1..].parse::<usize>().unwrap());
        assert_eq!(a.source, sorted);
        assert_eq!(full.sample(50, 7), full);
    }

    #[test]
    fn test_batches_cover_corpus() {
        let mut batches = CorpusBatches::new(corpus(5), 2, false, 0);
        assert_eq!(batches.num_batches(), 3);
        assert_eq!(batches.num_examples(), 5);

        let sizes: Vec<usize> = batches.epoch_batches(0).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let first = batches.epoch_batches(0).next().unwrap();
        assert_eq!(first.source, vec!["s0", "s1"]);
        assert_eq!(first.target, vec!["t0", "t1"]);
    }

    #[test]
    fn test_shuffle_is_per_epoch_and_aligned() {
        let mut batches = CorpusBatches::new(corpus(30), 30, true, 42);
        let epoch0 = batches.epoch_batches(0).next().unwrap();
        let again = batches.epoch_batches(0).next().unwrap();
        let epoch1 = batches.epoch_batches(1).next().unwrap();

        assert_eq!(epoch0, again);
        assert_ne!(epoch0.source, epoch1.source);
        for (s, t) in epoch0.source.iter().zip(&epoch0.target) {
            assert_eq!(s[1..], t[1..]);
        }
    }
}
