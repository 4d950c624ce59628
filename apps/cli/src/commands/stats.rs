//! Corpus length statistics command implementation.

use super::corpus::CorpusArgs;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tuner_models::{CorpusStatistics, RatioSummary};

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: StatsArgs) -> Result<()> {
    let loaded = args.corpus.load()?;
    let stats = CorpusStatistics::compute(&loaded.corpus);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let (src, tgt) = (&args.corpus.source_lang, &args.corpus.target_lang);
    println!();
    println!("{}", format!("{} split of {}", loaded.split, args.corpus.data_dir.display()).bold().green());
    println!("  Pairs:      {} ({} with a blank side skipped)", stats.pairs, stats.blank_pairs);
    println!("  Characters: {src} {:.1}, {tgt} {:.1}", stats.avg_source_chars, stats.avg_target_chars);
    println!("  Words:      {src} {:.1}, {tgt} {:.1}", stats.avg_source_words, stats.avg_target_words);
    print_ratio(&format!("Character ratio ({tgt}/{src})"), &stats.char_ratio);
    print_ratio(&format!("Word ratio ({tgt}/{src})"), &stats.word_ratio);

    println!();
    println!("{}", "Suggested length-ratio filters".bold());
    println!(
        "  Conservative (p10-p90): chars {:.2}-{:.2}, words {:.2}-{:.2}",
        stats.char_ratio.p10, stats.char_ratio.p90, stats.word_ratio.p10, stats.word_ratio.p90
    );
    println!(
        "  Moderate (p5-p95):      chars {:.2}-{:.2}, words {:.2}-{:.2}",
        stats.char_ratio.p5, stats.char_ratio.p95, stats.word_ratio.p5, stats.word_ratio.p95
    );

    let corpus = &loaded.corpus;
    for (title, indices) in [("Very low ratios", &stats.low_ratio_examples), ("Very high ratios", &stats.high_ratio_examples)] {
        if indices.is_empty() {
            continue;
        }
        println!();
        println!("{}", title.bold());
        for &i in indices {
            println!("  {src}: {}", corpus.source[i]);
            println!("  {tgt}: {}", corpus.target[i].yellow());
        }
    }
    Ok(())
}

fn print_ratio(title: &str, ratio: &RatioSummary) {
    println!();
    println!("{}", title.bold());
    println!("  Mean {:.2}, median {:.2}, std {:.2}", ratio.mean, ratio.median, ratio.std);
    println!("  p5-p95 {:.2}-{:.2}, min-max {:.2}-{:.2}", ratio.p5, ratio.p95, ratio.min, ratio.max);
}
