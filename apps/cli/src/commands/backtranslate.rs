//! Back-translation command implementation.

use crate::progress::PipelineBar;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tuner_models::{ChrfScorer, LexiconModel};
use tuner_translate::{BacktranslationOptions, BacktranslationWorkflow, QualityBand};

#[derive(Args, Debug)]
pub struct BacktranslateArgs {
    /// Model translating the corpus text into the other language
    #[arg(long)]
    pub forward_model: PathBuf,

    /// Model translating the synthetic text back
    #[arg(long)]
    pub backward_model: PathBuf,

    /// `document_id|segment_id|text` file with a header row
    #[arg(short, long)]
    pub input: PathBuf,

    /// Record file to write (default: <input stem>_synthetic.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Lines per translator call
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Directory for intermediate files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Keep the intermediate files
    #[arg(long)]
    pub keep_intermediate: bool,
}

pub fn execute(args: BacktranslateArgs) -> Result<()> {
    let mut forward = LexiconModel::from_dir(&args.forward_model)
        .with_context(|| format!("Failed to load forward model from {}", args.forward_model.display()))?;
    let mut backward = LexiconModel::from_dir(&args.backward_model)
        .with_context(|| format!("Failed to load backward model from {}", args.backward_model.display()))?;

    let options = BacktranslationOptions {
        batch_size: args.batch_size,
        keep_intermediate: args.keep_intermediate,
        work_dir: args.work_dir,
    };
    let report = BacktranslationWorkflow::new(Box::new(ChrfScorer::new()), options)
        .with_progress(Box::new(PipelineBar::default()))
        .run(&mut forward, &mut backward, &args.input, args.output.as_deref())
        .with_context(|| format!("Back-translation of {} failed", args.input.display()))?;

    let metrics = &report.metrics;
    let band = match metrics.interpretation.quality {
        QualityBand::Excellent | QualityBand::Good => format!("{:?}", metrics.interpretation.quality).green(),
        QualityBand::Acceptable => format!("{:?}", metrics.interpretation.quality).yellow(),
        QualityBand::NeedsWork => format!("{:?}", metrics.interpretation.quality).red(),
    };

    println!();
    println!("{}", "Back-translation complete".bold().green());
    println!("  Records:  {}", report.output.display().to_string().cyan());
    println!("  Metrics:  {}", report.metrics_path.display().to_string().dimmed());
    println!("  {}:   {:.2} ({})", metrics.scorer, metrics.corpus_score, band);
    println!(
        "  Lines:    {} (avg {:.2}, min {:.2}, max {:.2})",
        metrics.statistics.total_lines, metrics.statistics.avg_score, metrics.statistics.min_score, metrics.statistics.max_score
    );
    println!(
        "  Above:    50: {}  60: {}  70: {}",
        metrics.statistics.lines_above_50, metrics.statistics.lines_above_60, metrics.statistics.lines_above_70
    );
    println!("  {}", metrics.interpretation.recommendation.dimmed());
    if let Some(ref dir) = report.work_dir {
        println!("  Intermediate files kept in {}", dir.display());
    }
    println!();
    Ok(())
}
