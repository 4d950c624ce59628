use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tuner_abstraction::RateEstimate;

/// Position of a translation job in its input.
///
/// The output file always holds exactly `cursor` lines.
#[derive(Debug, Clone)]
pub struct TranslationJobState {
    pub total: usize,
    /// Next unprocessed input line.
    pub cursor: usize,
    /// Lines already present in the output when the job started.
    pub resumed_from: usize,
    /// Lines written as error placeholders by this job.
    pub error_lines: usize,
    pub failed_batches: usize,
    pub started_at: DateTime<Local>,
    started: Instant,
}

impl TranslationJobState {
    pub fn new(total: usize, resumed_from: usize) -> Self {
        Self {
            total,
            cursor: resumed_from,
            resumed_from,
            error_lines: 0,
            failed_batches: 0,
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    /// Record that `lines` more output lines were written.
    pub fn advance(&mut self, lines: usize, failed: bool) {
        self.cursor = (self.cursor + lines).min(self.total);
        if failed {
            self.error_lines += lines;
            self.failed_batches += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total
    }

    /// Lines handled by this process.
    pub fn processed(&self) -> usize {
        self.cursor - self.resumed_from
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn rate(&self) -> RateEstimate {
        RateEstimate::compute(self.cursor, self.total, self.processed(), self.elapsed())
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub translator_id: String,
    pub total_lines: usize,
    pub resumed_from: usize,
    pub translated_lines: usize,
    pub error_lines: usize,
    pub failed_batches: usize,
    pub elapsed_secs: f64,
    /// Previous output moved aside before starting fresh.
    pub backup: Option<PathBuf>,
}

impl TranslationSummary {
    pub fn has_errors(&self) -> bool {
        self.error_lines > 0
    }
}
