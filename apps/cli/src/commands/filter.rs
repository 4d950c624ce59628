//! Synthetic corpus filtering command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tuner_translate::{build_filtered_dataset, build_filtered_datasets, read_records, DatasetInfo, DatasetVariant, FilterOptions};

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Scored record file written by `backtranslate`
    #[arg(short, long)]
    pub records: PathBuf,

    /// Keep records scoring at or above this quantile (0.0 keeps all, 0.5 the top half)
    #[arg(short, long, required_unless_present = "datasets", conflicts_with = "datasets")]
    pub percentile: Option<f64>,

    /// Build several datasets at once, each in <output-dir>/<NAME> (e.g. --dataset top20=0.8)
    #[arg(long = "dataset", value_name = "NAME=PERCENTILE", value_parser = parse_variant)]
    pub datasets: Vec<DatasetVariant>,

    /// Dataset directory to write (the parent directory with --dataset)
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Existing dataset whose training pairs come first
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Language of the record text column
    #[arg(long, default_value = "agr")]
    pub source_lang: String,

    /// Language of the synthetic translations
    #[arg(long, default_value = "es")]
    pub target_lang: String,

    /// Print the dataset info as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_variant(value: &str) -> Result<DatasetVariant, String> {
    value.parse().map_err(|e: tuner_translate::TranslateError| e.to_string())
}

pub fn execute(args: FilterArgs) -> Result<()> {
    let records = read_records(&args.records)
        .with_context(|| format!("Failed to read records from {}", args.records.display()))?;
    if records.skipped > 0 {
        tracing::warn!(skipped = records.skipped, "malformed records ignored");
    }

    let options = FilterOptions {
        percentile: args.percentile.unwrap_or_default(),
        output_dir: args.output_dir.clone(),
        base_dir: args.base_dir,
        source_lang: args.source_lang,
        target_lang: args.target_lang,
    };

    if !args.datasets.is_empty() {
        let infos = build_filtered_datasets(&records, &args.records, &args.output_dir, &args.datasets, &options)
            .with_context(|| format!("Failed to build datasets in {}", args.output_dir.display()))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&infos)?);
            return Ok(());
        }
        println!();
        println!("{}", format!("{} filtered datasets written", infos.len()).bold().green());
        for info in &infos {
            print_info(&args.output_dir.join(&info.dataset_name), info);
        }
        return Ok(());
    }

    let info = build_filtered_dataset(&records, &args.records, &options)
        .with_context(|| format!("Failed to build dataset in {}", options.output_dir.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("{}", "Filtered dataset written".bold().green());
    print_info(&options.output_dir, &info);
    Ok(())
}

fn print_info(dir: &std::path::Path, info: &DatasetInfo) {
    println!("  Dataset:    {}", dir.display().to_string().cyan());
    println!("  Threshold:  {:.2} (p{:.0})", info.threshold_score, info.threshold_percentile * 100.0);
    println!("  Synthetic:  {} pairs (avg score {:.2})", info.synthetic_pairs, info.avg_score_synthetic);
    println!("  Base:       {} pairs", info.base_pairs);
    println!("  Total:      {} pairs ({:.2}% synthetic)", info.total_pairs, info.synthetic_percentage);
    println!();
}
