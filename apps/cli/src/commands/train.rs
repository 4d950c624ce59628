//! Training command implementation.

use crate::progress::TrainingBars;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tuner_models::{ChrfScorer, CorpusBatches, CorpusEvaluator, JsonlTrackingSink, LexiconModel, ParallelCorpus};
use tuner_training::{ConfigOverrides, LogProgressSink, RunLayout, TrainingConfig, TrainingOrchestrator};

/// Read when `--config` is not given; defaults apply if it does not exist.
const DEFAULT_CONFIG: &str = "tuner.toml";

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the number of epochs
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Override the batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Override the early-stopping patience
    #[arg(long)]
    pub patience: Option<usize>,

    /// Override the model id
    #[arg(long)]
    pub model_id: Option<String>,

    /// Override the dataset version (directory under the data base path)
    #[arg(long)]
    pub dataset_version: Option<String>,

    /// Override the evaluation frequency in epochs
    #[arg(long)]
    pub eval_frequency: Option<usize>,

    /// Print the run record as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

impl TrainArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model_id: self.model_id.clone(),
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            patience: self.patience,
            eval_frequency: self.eval_frequency,
            dataset_version: self.dataset_version.clone(),
        }
    }
}

fn load_config(args: &TrainArgs) -> Result<TrainingConfig> {
    let mut config = match args.config {
        Some(ref path) => TrainingConfig::load_from_file(path)
            .with_context(|| format!("Failed to load training config: {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => TrainingConfig::load_from_file(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load training config: {DEFAULT_CONFIG}"))?,
        None => TrainingConfig::default(),
    };
    config.apply_overrides(&args.overrides());
    config.validate().context("Invalid training configuration")?;
    Ok(config)
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = load_config(&args)?;
    let dataset_dir = config.dataset_dir();
    let (src, tgt) = (config.data.source_lang.clone(), config.data.target_lang.clone());

    let train = ParallelCorpus::load(&dataset_dir, "train", &src, &tgt)
        .with_context(|| format!("Failed to load training data from {}", dataset_dir.display()))?;
    let mut dev = ParallelCorpus::load(&dataset_dir, "dev", &src, &tgt)
        .with_context(|| format!("Failed to load evaluation data from {}", dataset_dir.display()))?;
    if let Some(n) = config.evaluation.sample_size {
        dev = dev.sample(n, config.training.seed);
    }

    let layout = RunLayout::for_config(&config, Local::now());
    let tracking = JsonlTrackingSink::new(layout.tracking_dir())
        .with_context(|| format!("Failed to create tracking directory under {}", layout.root().display()))?;
    let run_dir = layout.root().to_path_buf();

    let data = CorpusBatches::new(train, config.training.batch_size, config.data.shuffle, config.training.seed);
    let evaluator = CorpusEvaluator::new(dev, Box::new(ChrfScorer::new()), config.training.batch_size);
    let model = LexiconModel::new(config.model.id.clone(), config.model.max_length);

    let mut orchestrator = TrainingOrchestrator::new(config, model, Box::new(data), Box::new(evaluator), layout)
        .context("Failed to set up training")?
        .with_tracking(Box::new(tracking));
    orchestrator = if args.json {
        orchestrator.with_progress(Box::new(LogProgressSink))
    } else {
        orchestrator.with_progress(Box::new(TrainingBars::default()))
    };

    let record = orchestrator.run().context("Training failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!();
    println!("{}", "Training run complete".bold().green());
    println!("  Run:        {}", run_dir.display().to_string().cyan());
    match (record.best_score, record.best_epoch) {
        (Some(score), Some(epoch)) => println!("  Best chrF:  {:.2} (epoch {})", score, epoch + 1),
        _ => println!("  Best chrF:  {}", "none".dimmed()),
    }
    println!("  Epochs:     {}{}", record.final_epoch, if record.early_stopped { " (early stopped)" } else { "" });
    if let Some(checkpoint) = record.checkpoint.as_ref().and_then(|c| c.location.as_ref()) {
        println!("  Best model: {}", checkpoint.display().to_string().dimmed());
    }
    if let Some(ref final_model) = record.final_model {
        println!("  Final:      {}", final_model.display().to_string().dimmed());
    }
    println!();
    Ok(())
}
