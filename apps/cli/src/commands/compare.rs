//! Side-by-side model comparison command implementation.

use super::corpus::CorpusArgs;
use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tuner_models::{rank, write_ranking_csv, write_translations_csv, Assessor, ComparisonReport, LexiconModel};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Model directory; repeat for every model to compare
    #[arg(short, long = "model", required = true)]
    pub models: Vec<PathBuf>,

    /// Display name for each --model, in the same order
    #[arg(long = "name")]
    pub names: Vec<String>,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Sentences per model call
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Directory for the results files
    #[arg(short, long, default_value = "model_comparison")]
    pub output_dir: PathBuf,

    /// Count per-sentence chrF++ wins for every pair of models
    #[arg(long)]
    pub head_to_head: bool,

    /// Also write every model's predictions to one CSV file
    #[arg(long)]
    pub save_translations: bool,

    /// Number of sentences the models disagree on most to report
    #[arg(long, default_value_t = 5)]
    pub divergent: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "chrF++")]
    chrf: String,
    #[tabled(rename = "BLEU")]
    bleu: String,
    #[tabled(rename = "Exact %")]
    exact: String,
    #[tabled(rename = "Samples/s")]
    speed: String,
}

/// Last two path components, e.g. `run_20240101_000000/best_model`.
fn default_name(path: &Path) -> String {
    let parts: Vec<String> =
        path.components().rev().take(2).map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    parts.into_iter().rev().collect::<Vec<_>>().join("/")
}

fn model_names(args: &CompareArgs) -> Result<Vec<String>> {
    if args.models.len() < 2 {
        bail!("compare needs at least two --model directories");
    }
    let names = if args.names.is_empty() {
        args.models.iter().map(|m| default_name(m)).collect()
    } else if args.names.len() == args.models.len() {
        args.names.clone()
    } else {
        bail!("got {} --name values for {} --model directories", args.names.len(), args.models.len());
    };
    let mut seen = BTreeSet::new();
    if let Some(duplicate) = names.iter().find(|n| !seen.insert(n.as_str())) {
        bail!("duplicate model name '{duplicate}', pass --name for each model");
    }
    Ok(names)
}

pub fn execute(args: CompareArgs) -> Result<()> {
    let names = model_names(&args)?;
    let loaded = args.corpus.load()?;
    let assessor = Assessor::new(args.batch_size);

    let mut ranking = Vec::with_capacity(names.len());
    let mut predictions = Vec::with_capacity(names.len());
    for (path, name) in args.models.iter().zip(&names) {
        let mut model = LexiconModel::from_dir(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;
        let (scores, preds) = assessor
            .evaluate(name, &mut model, &loaded.corpus)
            .with_context(|| format!("Failed to evaluate {name}"))?;
        ranking.push(scores);
        predictions.push(preds);
    }
    rank(&mut ranking);

    let head_to_head = if args.head_to_head {
        assessor.head_to_head(&names, &predictions, &loaded.corpus.target)
    } else {
        Vec::new()
    };
    let divergent = assessor.divergent_examples(&loaded.corpus, &names, &predictions, args.divergent);
    let report = ComparisonReport { split: loaded.split, samples: loaded.corpus.len(), ranking, head_to_head, divergent };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let results_path = args.output_dir.join(format!("comparison_{timestamp}.json"));
    std::fs::write(&results_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write {}", results_path.display()))?;
    let table_path = args.output_dir.join(format!("comparison_table_{timestamp}.csv"));
    write_ranking_csv(&table_path, &report.ranking)
        .with_context(|| format!("Failed to write {}", table_path.display()))?;
    if args.save_translations {
        let path = args.output_dir.join(format!("all_translations_{timestamp}.csv"));
        write_translations_csv(&path, &loaded.corpus, &names, &predictions)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let rows: Vec<RankingRow> = report
        .ranking
        .iter()
        .enumerate()
        .map(|(i, s)| RankingRow {
            rank: i + 1,
            model: s.model.clone(),
            chrf: format!("{:.2}", s.chrf),
            bleu: format!("{:.2}", s.bleu),
            exact: format!("{:.1}", s.exact_match_rate),
            speed: format!("{:.1}", s.samples_per_second),
        })
        .collect();

    println!();
    println!("{}", format!("Model ranking on {} ({} pairs)", report.split, report.samples).bold().green());
    println!("{}", Table::new(rows).with(Style::rounded()).to_string());

    if !report.head_to_head.is_empty() {
        println!();
        println!("{}", "Head to head (sentence chrF++)".bold());
        for duel in &report.head_to_head {
            println!(
                "  {} vs {}: {} wins ({:.1}%), {} wins ({:.1}%), {} ties",
                duel.model_a.cyan(),
                duel.model_b.cyan(),
                duel.wins_a,
                duel.win_rate_a,
                duel.wins_b,
                duel.win_rate_b,
                duel.ties
            );
        }
    }

    let disagreements: Vec<_> = report.divergent.iter().filter(|d| d.variance > 0.0).collect();
    if !disagreements.is_empty() {
        println!();
        println!("{}", "Largest disagreements".bold());
        for example in disagreements {
            println!("  source:    {}", example.source);
            println!("  reference: {}", example.reference);
            for (name, prediction) in &example.predictions {
                let score = example.scores.get(name).copied().unwrap_or_default();
                println!("    {name} ({score:.2}): {}", prediction.yellow());
            }
        }
    }

    println!();
    println!("Results written to {}", results_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_keeps_run_directory() {
        assert_eq!(default_name(Path::new("runs/tuner_es2agr_1/best_model")), "tuner_es2agr_1/best_model");
        assert_eq!(default_name(Path::new("model")), "model");
    }
}
