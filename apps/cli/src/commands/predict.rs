//! Ad-hoc translation command implementation.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tuner_abstraction::{decode_utf8, split_lines, Seq2SeqModel};
use tuner_models::{generate_all, LexiconModel};

/// Typing one of these ends an interactive session.
const QUIT_WORDS: [&str; 4] = ["quit", "exit", "salir", "q"];

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "input_file", "interactive"])))]
pub struct PredictArgs {
    /// Model directory (e.g. a run's best_model)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Translate this sentence
    #[arg(short, long)]
    pub text: Option<String>,

    /// Translate every non-blank line of this file
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// Read sentences from stdin until EOF or quit
    #[arg(long)]
    pub interactive: bool,

    /// Write translations here instead of stdout
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Sentences per model call
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,
}

pub fn execute(args: PredictArgs) -> Result<()> {
    let mut model = LexiconModel::from_dir(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;

    if args.interactive {
        return interactive(&mut model);
    }

    let sources = if let Some(ref text) = args.text {
        vec![text.trim().to_string()]
    } else if let Some(ref path) = args.input_file {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = decode_utf8(&bytes).with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        let lines: Vec<String> =
            split_lines(text).into_iter().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect();
        if lines.is_empty() {
            bail!("{} has no text to translate", path.display());
        }
        lines
    } else {
        bail!("one of --text, --input-file or --interactive is required");
    };

    let translations = generate_all(&mut model, &sources, args.batch_size);
    tracing::info!(sentences = translations.len(), "translated");

    let mut output = translations.join("\n");
    output.push('\n');
    match args.output_file {
        Some(ref path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Translations written to {}", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

fn interactive(model: &mut dyn Seq2SeqModel) -> Result<()> {
    eprintln!("Type a sentence to translate ({} to stop).", QUIT_WORDS.join("/"));
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let text = line.trim();
        if QUIT_WORDS.contains(&text.to_lowercase().as_str()) {
            break;
        }
        if text.is_empty() {
            continue;
        }
        let translation = generate_all(model, &[text.to_string()], 1).pop().unwrap_or_default();
        writeln!(stdout, "{translation}")?;
        stdout.flush()?;
    }
    Ok(())
}
