//! Batch translation command implementation.

use crate::progress::PipelineBar;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tuner_models::LexiconModel;
use tuner_translate::{LogPipelineProgress, PipelineOptions, TranslationPipeline};

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Model directory (e.g. a run's best_model)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Input text file, one sentence per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file, one translation per input line
    #[arg(short, long)]
    pub output: PathBuf,

    /// Lines per translator call
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Continue an existing output instead of backing it up
    #[arg(long)]
    pub resume: bool,

    /// Resume even if the output was started with another model or input
    #[arg(long)]
    pub no_verify_manifest: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: TranslateArgs) -> Result<()> {
    let mut model = LexiconModel::from_dir(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;

    let options = PipelineOptions { batch_size: args.batch_size, resume: args.resume, verify_manifest: !args.no_verify_manifest };
    let pipeline = if args.json {
        TranslationPipeline::new(options).with_progress(Box::new(LogPipelineProgress))
    } else {
        TranslationPipeline::new(options).with_progress(Box::new(PipelineBar::default()))
    };

    let summary = pipeline
        .run(&mut model, &args.input, &args.output)
        .with_context(|| format!("Failed to translate {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if let Some(ref backup) = summary.backup {
        println!("Previous output moved to {}", backup.display());
    }
    Ok(())
}
