//! Terminal rendering of training and translation progress.
//!
//! Bars draw to stderr and hide themselves when stderr is not a terminal.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::{Cell, RefCell};
use std::time::Duration;
use tuner_abstraction::format_duration;
use tuner_training::{ProgressSink, TrainingEvent};
use tuner_translate::{PipelineEvent, PipelineProgress};

const BAR_TEMPLATE: &str = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

fn bar(len: usize, prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(prefix.to_string());
    bar
}

/// Epoch bars plus a colored line per epoch.
#[derive(Default)]
pub struct TrainingBars {
    batches_per_epoch: Cell<usize>,
    current: RefCell<Option<ProgressBar>>,
}

impl TrainingBars {
    fn println(&self, line: String) {
        match self.current.borrow().as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn clear(&self) {
        if let Some(bar) = self.current.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressSink for TrainingBars {
    fn on_event(&self, event: TrainingEvent) {
        match event {
            TrainingEvent::Started { run_dir, epochs, batches_per_epoch, examples } => {
                self.batches_per_epoch.set(batches_per_epoch);
                eprintln!();
                eprintln!("{}", "Training".bold().cyan());
                eprintln!("  Run:      {}", run_dir.display().to_string().dimmed());
                eprintln!("  Epochs:   {epochs}");
                eprintln!("  Examples: {examples} ({batches_per_epoch} batches per epoch)");
                eprintln!();
            }
            TrainingEvent::EpochStarted { epoch, total_epochs } => {
                self.clear();
                let label = format!("epoch {}/{}", epoch + 1, total_epochs);
                *self.current.borrow_mut() = Some(bar(self.batches_per_epoch.get(), &label));
            }
            TrainingEvent::BatchCompleted { epoch, batch, total_batches, loss } => {
                if let Some(bar) = self.current.borrow().as_ref() {
                    bar.set_position((batch + 1).min(total_batches) as u64);
                    bar.set_message(format!("epoch {} loss {loss:.4}", epoch + 1));
                }
            }
            TrainingEvent::EpochCompleted(summary) => {
                self.clear();
                let head = format!("Epoch {}/{}", summary.epoch + 1, summary.total_epochs);
                let time = format_duration(summary.elapsed);
                match summary.evaluation {
                    Some(eval) => {
                        let best = if eval.is_best { format!(" {}", "best".green().bold()) } else { String::new() };
                        eprintln!(
                            "{}  loss {:.4}  chrF {:.2} {}{}  {}",
                            head.bold(),
                            summary.loss,
                            eval.primary_score,
                            eval.trend.arrow(),
                            best,
                            time.dimmed()
                        );
                    }
                    None => {
                        eprintln!("{}  loss {:.4}  {}  {}", head.bold(), summary.loss, "(no eval)".dimmed(), time.dimmed());
                    }
                }
            }
            TrainingEvent::CheckpointSaved { score, path, .. } => {
                eprintln!("  {} {:.2} -> {}", "saved best model".green(), score, path.display().to_string().dimmed());
            }
            TrainingEvent::CheckpointFailed { epoch, reason } => {
                self.println(format!("  {} (epoch {}): {}", "checkpoint not saved".yellow(), epoch + 1, reason));
            }
            TrainingEvent::Samples { samples, .. } => {
                for sample in samples {
                    eprintln!("    {} {}", "src".dimmed(), sample.source);
                    eprintln!("    {} {}", "ref".dimmed(), sample.reference);
                    eprintln!("    {} {}", "out".dimmed(), sample.prediction.cyan());
                }
            }
            TrainingEvent::EarlyStopped { epoch, best_score, best_epoch } => {
                self.clear();
                eprintln!(
                    "{} after epoch {} (best {:.2} at epoch {})",
                    "Early stopping".yellow().bold(),
                    epoch + 1,
                    best_score,
                    best_epoch + 1
                );
            }
            TrainingEvent::Finished { best_score, best_epoch, elapsed } => {
                self.clear();
                eprintln!();
                match (best_score, best_epoch) {
                    (Some(score), Some(epoch)) => eprintln!(
                        "{} best chrF {:.2} at epoch {} in {}",
                        "Training complete:".green().bold(),
                        score,
                        epoch + 1,
                        format_duration(elapsed)
                    ),
                    _ => eprintln!("{} in {}", "Training complete".green().bold(), format_duration(elapsed)),
                }
            }
        }
    }
}

/// One bar per translation run.
#[derive(Default)]
pub struct PipelineBar {
    current: RefCell<Option<ProgressBar>>,
}

impl PipelineProgress for PipelineBar {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started { input, total, resumed_from, .. } => {
                let name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                let bar = bar(total, &name);
                bar.set_position(resumed_from as u64);
                if resumed_from > 0 {
                    bar.println(format!("{} from line {}", "Resuming".cyan(), resumed_from));
                }
                *self.current.borrow_mut() = Some(bar);
            }
            PipelineEvent::BatchWritten { end, rate, .. } => {
                if let Some(bar) = self.current.borrow().as_ref() {
                    bar.set_position(end as u64);
                    bar.set_message(format!("{:.1} lines/s, eta {}", rate.per_second, format_duration(rate.eta())));
                }
            }
            PipelineEvent::BatchFailed { start, end, reason } => {
                let line = format!("{} lines {}-{}: {}", "batch failed".yellow(), start + 1, end, reason);
                match self.current.borrow().as_ref() {
                    Some(bar) => bar.println(line),
                    None => eprintln!("{line}"),
                }
            }
            PipelineEvent::Samples { pairs } => {
                if let Some(bar) = self.current.borrow().as_ref() {
                    for (source, translation) in pairs {
                        bar.println(format!("  {} {}", source.dimmed(), translation.cyan()));
                    }
                }
            }
            PipelineEvent::Finished(summary) => {
                if let Some(bar) = self.current.borrow_mut().take() {
                    bar.finish_and_clear();
                }
                let status = if summary.has_errors() {
                    format!("{} error lines", summary.error_lines).yellow().to_string()
                } else {
                    "no errors".green().to_string()
                };
                eprintln!(
                    "{} {} lines -> {} ({}, {})",
                    "Translated".bold(),
                    summary.total_lines,
                    summary.output.display(),
                    status,
                    format_duration(Duration::from_secs_f64(summary.elapsed_secs))
                );
            }
        }
    }
}
