//! Training configuration.
//!
//! Loaded from TOML. Every section rejects unknown keys so a typo fails the run at
//! load time instead of silently falling back to a default.

use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub training: HyperParams,
    pub evaluation: EvaluationConfig,
    pub data: DataConfig,
    pub experiment: ExperimentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Model identifier (engine-specific).
    pub id: String,
    /// Human-friendly name shown in logs and tracked as `model_name`.
    /// Run directories are named after `experiment.name` instead.
    pub display_name: Option<String>,
    pub max_length: usize,
    /// Start from a previously saved model instead of a fresh one.
    pub init_from: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { id: "lexicon".to_string(), display_name: None, max_length: 128, init_from: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HyperParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Evaluations without improvement tolerated before stopping.
    pub patience: usize,
    /// Minimum gain in primary score that counts as improvement.
    pub min_improvement: f64,
    pub seed: u64,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self { epochs: 10, batch_size: 16, learning_rate: 1e-4, patience: 3, min_improvement: 0.1, seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Evaluate every N epochs (first and last epoch are always evaluated).
    pub eval_frequency: usize,
    /// Evaluate on a seeded sample of the dev split instead of all of it.
    pub sample_size: Option<usize>,
    /// Sample translations logged every third scheduled evaluation.
    pub sample_translations: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { eval_frequency: 1, sample_size: None, sample_translations: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub base_path: PathBuf,
    pub dataset_version: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Reshuffle training pairs every epoch (seeded).
    pub shuffle: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data"),
            dataset_version: "v1".to_string(),
            source_lang: "es".to_string(),
            target_lang: "agr".to_string(),
            shuffle: true,
        }
    }
}

impl DataConfig {
    /// Direction tag such as `es2agr`.
    pub fn direction(&self) -> String {
        format!("{}2{}", self.source_lang, self.target_lang)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub runs_dir: PathBuf,
    pub name: Option<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self { runs_dir: PathBuf::from("runs"), name: None }
    }
}

/// Command-line overrides applied on top of a loaded config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_id: Option<String>,
    pub epochs: Option<usize>,
    pub batch_size: Option<usize>,
    pub learning_rate: Option<f64>,
    pub patience: Option<usize>,
    pub eval_frequency: Option<usize>,
    pub dataset_version: Option<String>,
}

impl TrainingConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> TrainingResult<Self> {
        if !path.exists() {
            return Err(TrainingError::InvalidConfig(format!("config file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| TrainingError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> TrainingResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref id) = overrides.model_id {
            self.model.id = id.clone();
        }
        if let Some(epochs) = overrides.epochs {
            self.training.epochs = epochs;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.training.batch_size = batch_size;
        }
        if let Some(lr) = overrides.learning_rate {
            self.training.learning_rate = lr;
        }
        if let Some(patience) = overrides.patience {
            self.training.patience = patience;
        }
        if let Some(freq) = overrides.eval_frequency {
            self.evaluation.eval_frequency = freq;
        }
        if let Some(ref version) = overrides.dataset_version {
            self.data.dataset_version = version.clone();
        }
    }

    pub fn validate(&self) -> TrainingResult<()> {
        let invalid = |msg: &str| Err(TrainingError::InvalidConfig(msg.to_string()));

        if self.model.id.trim().is_empty() {
            return invalid("model.id is required");
        }
        if self.training.epochs == 0 {
            return invalid("training.epochs must be >= 1");
        }
        if self.training.batch_size == 0 {
            return invalid("training.batch_size must be >= 1");
        }
        if !self.training.learning_rate.is_finite() || self.training.learning_rate <= 0.0 {
            return invalid("training.learning_rate must be > 0");
        }
        if self.training.patience == 0 {
            return invalid("training.patience must be >= 1");
        }
        if !self.training.min_improvement.is_finite() || self.training.min_improvement < 0.0 {
            return invalid("training.min_improvement must be >= 0");
        }
        if self.evaluation.eval_frequency == 0 {
            return invalid("evaluation.eval_frequency must be >= 1");
        }
        if self.data.source_lang.trim().is_empty() || self.data.target_lang.trim().is_empty() {
            return invalid("data.source_lang and data.target_lang are required");
        }
        if self.data.source_lang == self.data.target_lang {
            return invalid("data.source_lang and data.target_lang must differ");
        }
        Ok(())
    }

    /// Name shown in logs and tracked as `model_name`; falls back to the model id.
    pub fn display_name(&self) -> &str {
        self.model.display_name.as_deref().unwrap_or(&self.model.id)
    }

    /// Directory holding `<split>.<lang>` files for the configured dataset version.
    pub fn dataset_dir(&self) -> PathBuf {
        self.data.base_path.join(&self.data.dataset_version)
    }

    /// Flat parameter echo for experiment tracking.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("model_id".to_string(), self.model.id.clone());
        params.insert("model_name".to_string(), self.display_name().to_string());
        params.insert("max_length".to_string(), self.model.max_length.to_string());
        params.insert("epochs".to_string(), self.training.epochs.to_string());
        params.insert("batch_size".to_string(), self.training.batch_size.to_string());
        params.insert("learning_rate".to_string(), self.training.learning_rate.to_string());
        params.insert("patience".to_string(), self.training.patience.to_string());
        params.insert("min_improvement".to_string(), self.training.min_improvement.to_string());
        params.insert("seed".to_string(), self.training.seed.to_string());
        params.insert("eval_frequency".to_string(), self.evaluation.eval_frequency.to_string());
        params.insert("dataset_version".to_string(), self.data.dataset_version.clone());
        params.insert("direction".to_string(), self.data.direction());
        params
    }
}
