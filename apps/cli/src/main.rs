//! Tuner CLI - fine-tune and run sentence translation models
//!
//! This CLI provides a `tuner` command for training models on a parallel corpus,
//! translating large files with resumable batches, building synthetic corpora by
//! back-translation and filtering them into new training datasets, and for
//! evaluating, comparing and trying out the resulting models.

mod commands;
mod progress;

use clap::{Parser, Subcommand};
use commands::{backtranslate, compare, evaluate, filter, predict, stats, train, translate};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Tuner CLI - seq2seq fine-tuning and batch translation
#[derive(Parser, Debug)]
#[command(
    name = "tuner",
    author,
    version,
    about = "Fine-tune translation models and translate large corpora",
    long_about = "tuner trains sentence translation models with evaluation-driven checkpointing and \
                  early stopping, and translates large files in resumable, line-aligned batches."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model
    ///
    /// Loads the training configuration, applies any overrides, trains with
    /// periodic evaluation and writes the run directory.
    Train(train::TrainArgs),

    /// Translate a text file line by line
    ///
    /// Every input line produces exactly one output line. Interrupted runs can be
    /// continued with --resume.
    Translate(translate::TranslateArgs),

    /// Build a scored synthetic corpus by round-trip translation
    Backtranslate(backtranslate::BacktranslateArgs),

    /// Keep the best synthetic pairs and write a training dataset
    Filter(filter::FilterArgs),

    /// Score a trained model on a held-out split
    ///
    /// Reports chrF++, BLEU, exact matches, lengths and speed, per domain when
    /// the split has a <split>.source file, and writes a JSON results file.
    Evaluate(evaluate::EvaluateArgs),

    /// Rank several trained models on the same split
    Compare(compare::CompareArgs),

    /// Translate a sentence, a file or stdin with a trained model
    Predict(predict::PredictArgs),

    /// Length statistics of a parallel split
    Stats(stats::StatsArgs),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so `--json` output on stdout stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train(args) => train::execute(args),
        Command::Translate(args) => translate::execute(args),
        Command::Backtranslate(args) => backtranslate::execute(args),
        Command::Filter(args) => filter::execute(args),
        Command::Evaluate(args) => evaluate::execute(args),
        Command::Compare(args) => compare::execute(args),
        Command::Predict(args) => predict::execute(args),
        Command::Stats(args) => stats::execute(args),
    }
}
