//! Standalone model evaluation command implementation.

use super::corpus::CorpusArgs;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tuner_models::{write_predictions_csv, Assessor, EvaluationReport, LexiconModel};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Model directory (e.g. a run's best_model)
    #[arg(short, long)]
    pub model: PathBuf,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Sentences per model call
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Directory for the results file
    #[arg(short, long, default_value = "evaluation_results")]
    pub output_dir: PathBuf,

    /// Also write every prediction to a CSV file
    #[arg(long)]
    pub save_predictions: bool,

    /// Number of sample translations to report
    #[arg(long, default_value_t = 10)]
    pub samples: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let mut model = LexiconModel::from_dir(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;
    let loaded = args.corpus.load()?;

    let assessor = Assessor::new(args.batch_size);
    let label = args.model.display().to_string();
    let (scores, predictions) = assessor
        .evaluate(&label, &mut model, &loaded.corpus)
        .with_context(|| format!("Failed to evaluate {label}"))?;

    let domains = loaded
        .domains
        .as_deref()
        .map(|d| assessor.by_domain(&loaded.corpus, &predictions, d))
        .unwrap_or_default();
    let samples =
        assessor.samples(&loaded.corpus, &predictions, loaded.domains.as_deref(), args.samples, args.corpus.seed);
    let report = EvaluationReport { split: loaded.split, scores, domains, samples };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let results_path = args.output_dir.join(format!("evaluation_{timestamp}.json"));
    std::fs::write(&results_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write {}", results_path.display()))?;

    let predictions_path = if args.save_predictions {
        let path = args.output_dir.join(format!("predictions_{timestamp}.csv"));
        write_predictions_csv(&path, &loaded.corpus, &predictions, loaded.domains.as_deref())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let scores = &report.scores;
    println!();
    println!("{}", "Evaluation complete".bold().green());
    println!("  Model:       {}", scores.model.cyan());
    println!("  Split:       {} ({} pairs)", report.split, scores.samples);
    println!("  chrF++:      {}", format!("{:.2}", scores.chrf).bold());
    println!("  BLEU:        {:.2}", scores.bleu);
    println!("  Exact match: {} ({:.1}%)", scores.exact_matches, scores.exact_match_rate);
    println!(
        "  Lengths:     source {:.1}, reference {:.1}, prediction {:.1} chars",
        scores.avg_source_length, scores.avg_reference_length, scores.avg_prediction_length
    );
    println!("  Speed:       {:.1} samples/s", scores.samples_per_second);

    if !report.domains.is_empty() {
        println!();
        println!("{}", "By domain".bold());
        for (domain, d) in &report.domains {
            println!("  {:<16} chrF++ {:>6.2}  BLEU {:>6.2}  ({} pairs)", domain, d.chrf, d.bleu, d.samples);
        }
    }

    if !report.samples.is_empty() {
        println!();
        println!("{}", "Sample translations".bold());
        for sample in &report.samples {
            println!("  [{}] chrF++ {:.2}", sample.domain, sample.chrf);
            println!("    source:     {}", sample.source);
            println!("    reference:  {}", sample.reference);
            println!("    prediction: {}", sample.prediction.yellow());
        }
    }

    println!();
    println!("Results written to {}", results_path.display());
    if let Some(path) = predictions_path {
        println!("Predictions written to {}", path.display());
    }
    Ok(())
}
