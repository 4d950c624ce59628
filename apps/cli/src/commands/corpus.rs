//! Held-out corpus selection shared by `evaluate`, `compare` and `stats`.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tuner_models::{ModelsError, ParallelCorpus};

#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Dataset directory holding <split>.<lang> files
    #[arg(long, default_value = "data/v1")]
    pub data_dir: PathBuf,

    /// Split to read (a missing test split falls back to dev)
    #[arg(long, default_value = "dev")]
    pub split: String,

    /// Source language code
    #[arg(long, default_value = "es")]
    pub source_lang: String,

    /// Target language code
    #[arg(long, default_value = "agr")]
    pub target_lang: String,

    /// Use a seeded sample of this many pairs instead of the whole split
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Seed for --sample-size and sample translations
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// A loaded split with its optional per-pair domain labels.
pub struct LoadedCorpus {
    pub split: String,
    pub corpus: ParallelCorpus,
    pub domains: Option<Vec<String>>,
}

impl CorpusArgs {
    pub fn load(&self) -> Result<LoadedCorpus> {
        let mut split = self.split.clone();
        let corpus = match ParallelCorpus::load(&self.data_dir, &split, &self.source_lang, &self.target_lang) {
            Err(ModelsError::CorpusNotFound(path)) if split == "test" => {
                tracing::warn!(missing = %path.display(), "test split not found, using dev");
                split = "dev".to_string();
                ParallelCorpus::load(&self.data_dir, &split, &self.source_lang, &self.target_lang)
            }
            other => other,
        }
        .with_context(|| format!("Failed to load the {} split from {}", split, self.data_dir.display()))?;

        let domains = ParallelCorpus::load_domains(&self.data_dir, &split, corpus.len())
            .with_context(|| format!("Failed to load domain labels from {}", self.data_dir.display()))?;

        let Some(n) = self.sample_size else {
            return Ok(LoadedCorpus { split, corpus, domains });
        };
        let indices = corpus.sample_indices(n, self.seed);
        let domains = domains.map(|d| indices.iter().map(|&i| d[i].clone()).collect());
        Ok(LoadedCorpus { split, corpus: corpus.select(&indices), domains })
    }
}
