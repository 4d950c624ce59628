//! Progress reporting for the translation pipeline.

use crate::job::TranslationSummary;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tuner_abstraction::{format_duration, RateEstimate};

/// Events emitted while a pipeline runs. Purely observational.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Started { input: PathBuf, output: PathBuf, total: usize, resumed_from: usize, batch_size: usize },
    /// A batch was written. `end` is exclusive.
    BatchWritten { start: usize, end: usize, failed: bool, rate: RateEstimate },
    BatchFailed { start: usize, end: usize, reason: String },
    /// Source/translation pairs from the first batch of the run.
    Samples { pairs: Vec<(String, String)> },
    Finished(TranslationSummary),
}

pub trait PipelineProgress {
    fn on_event(&self, event: PipelineEvent);
}

/// Logs milestones through `tracing`; per-batch progress at debug level.
#[derive(Debug, Default)]
pub struct LogPipelineProgress;

impl PipelineProgress for LogPipelineProgress {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started { input, output, total, resumed_from, batch_size } => {
                info!(
                    input = %input.display(),
                    output = %output.display(),
                    total,
                    resumed_from,
                    batch_size,
                    "translation started"
                );
            }
            PipelineEvent::BatchWritten { end, rate, .. } => {
                debug!(
                    line = end,
                    total = rate.total,
                    percent = rate.percent,
                    lines_per_sec = rate.per_second,
                    eta = %format_duration(rate.eta()),
                    "batch written"
                );
            }
            PipelineEvent::BatchFailed { start, end, reason } => {
                warn!(batch_start = start, batch_end = end, %reason, "batch failed, writing error placeholders");
            }
            PipelineEvent::Samples { pairs } => {
                for (source, translation) in pairs {
                    info!(%source, %translation, "sample");
                }
            }
            PipelineEvent::Finished(summary) => {
                info!(
                    output = %summary.output.display(),
                    lines = summary.total_lines,
                    translated = summary.translated_lines,
                    errors = summary.error_lines,
                    time = %format_duration(std::time::Duration::from_secs_f64(summary.elapsed_secs)),
                    "translation finished"
                );
            }
        }
    }
}
