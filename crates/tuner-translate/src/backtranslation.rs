//! Round-trip back-translation of a monolingual corpus.
//!
//! The text column of a `document_id|segment_id|text` file is translated forward,
//! translated back, and each line is scored by comparing the back-translation with
//! the original text. The result is a six-column record file plus a metrics JSON.

use crate::error::{TranslateError, TranslateResult};
use crate::job::TranslationSummary;
use crate::outcome::is_error_marker;
use crate::pipeline::{read_lines, PipelineOptions, TranslationPipeline};
use crate::progress::PipelineProgress;
use crate::records::{split_anchored, ADDED_COLUMNS};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tuner_abstraction::{QualityScorer, Translator};

const ORIGINAL_FILE: &str = "original.txt";
const SYNTHETIC_FILE: &str = "synthetic.txt";
const BACKTRANSLATED_FILE: &str = "backtranslated.txt";

/// Quality band of a corpus-level score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityBand {
    Excellent,
    Good,
    Acceptable,
    NeedsWork,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Acceptable
        } else {
            Self::NeedsWork
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent | Self::Good => "synthetic corpus is high quality",
            Self::Acceptable => "consider additional filtering",
            Self::NeedsWork => "review the translation models",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStatistics {
    pub total_lines: usize,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub lines_above_50: usize,
    pub lines_above_60: usize,
    pub lines_above_70: usize,
}

impl LineStatistics {
    pub fn from_scores(scores: &[f64]) -> Self {
        let round2 = |v: f64| (v * 100.0).round() / 100.0;
        let above = |t: f64| scores.iter().filter(|&&s| s >= t).count();
        let (min, max, sum) = scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY, 0.0), |(min, max, sum), &s| (min.min(s), max.max(s), sum + s));

        if scores.is_empty() {
            return Self {
                total_lines: 0,
                avg_score: 0.0,
                min_score: 0.0,
                max_score: 0.0,
                lines_above_50: 0,
                lines_above_60: 0,
                lines_above_70: 0,
            };
        }
        Self {
            total_lines: scores.len(),
            avg_score: round2(sum / scores.len() as f64),
            min_score: round2(min),
            max_score: round2(max),
            lines_above_50: above(50.0),
            lines_above_60: above(60.0),
            lines_above_70: above(70.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub quality: QualityBand,
    pub recommendation: String,
}

/// `<stem>_metrics.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktranslationMetrics {
    pub timestamp: String,
    pub input_file: String,
    pub output_file: String,
    pub scorer: String,
    /// Corpus score over pairs where both sides are non-blank.
    pub corpus_score: f64,
    pub statistics: LineStatistics,
    pub interpretation: Interpretation,
}

#[derive(Debug, Clone)]
pub struct BacktranslationOptions {
    pub batch_size: usize,
    /// Keep the intermediate text files after a successful run.
    pub keep_intermediate: bool,
    /// Directory for intermediate files; defaults to `backtranslation_<stem>` next to the input.
    pub work_dir: Option<PathBuf>,
}

impl Default for BacktranslationOptions {
    fn default() -> Self {
        Self { batch_size: 16, keep_intermediate: false, work_dir: None }
    }
}

#[derive(Debug, Clone)]
pub struct BacktranslationReport {
    pub output: PathBuf,
    pub metrics_path: PathBuf,
    pub metrics: BacktranslationMetrics,
    pub forward: TranslationSummary,
    pub backward: TranslationSummary,
    /// Set when the intermediate files were kept.
    pub work_dir: Option<PathBuf>,
}

/// `<stem>_synthetic<.ext>` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_synthetic.{}", ext.to_string_lossy()),
        None => format!("{stem}_synthetic"),
    };
    input.with_file_name(name)
}

/// `<stem>_metrics.json` next to `output`.
pub fn metrics_path(output: &Path) -> PathBuf {
    let stem = output.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    output.with_file_name(format!("{stem}_metrics.json"))
}

/// Text column of each data row (anchored on the first two fields).
///
/// Rows with fewer than three fields give an empty line so rows stay aligned.
pub fn extract_text_column(rows: &[String]) -> Vec<String> {
    rows.iter().map(|row| split_anchored(row.trim(), 2, 0).map(|mut f| f.remove(2)).unwrap_or_default()).collect()
}

/// Per-line scores: 0 when either side is blank or an error placeholder.
pub fn score_lines(scorer: &dyn QualityScorer, references: &[String], hypotheses: &[String]) -> Vec<f64> {
    references
        .iter()
        .enumerate()
        .map(|(i, reference)| {
            let hypothesis = hypotheses.get(i).map_or("", String::as_str);
            if is_scorable(reference, hypothesis) {
                scorer.sentence_score(hypothesis.trim(), reference.trim())
            } else {
                0.0
            }
        })
        .collect()
}

fn is_scorable(reference: &str, hypothesis: &str) -> bool {
    !reference.trim().is_empty()
        && !hypothesis.trim().is_empty()
        && !is_error_marker(reference)
        && !is_error_marker(hypothesis)
}

/// Corpus-level score over the scorable pairs.
pub fn corpus_score(scorer: &dyn QualityScorer, references: &[String], hypotheses: &[String]) -> f64 {
    let (refs, hyps): (Vec<String>, Vec<String>) = references
        .iter()
        .zip(hypotheses)
        .filter(|(r, h)| is_scorable(r, h))
        .map(|(r, h)| (r.trim().to_string(), h.trim().to_string()))
        .unzip();
    if refs.is_empty() { 0.0 } else { scorer.corpus_score(&hyps, &refs) }
}

/// The row with empty fields appended up to `document_id|segment_id|text`.
fn padded_row(row: &str) -> String {
    let row = row.trim();
    let fields = row.split('|').count();
    format!("{row}{}", "|".repeat(3usize.saturating_sub(fields)))
}

/// Translations are written into `|`-delimited columns.
fn column_safe(text: &str) -> String {
    text.trim().replace('|', " ")
}

pub struct BacktranslationWorkflow {
    pipeline: TranslationPipeline,
    scorer: Box<dyn QualityScorer>,
    options: BacktranslationOptions,
}

impl BacktranslationWorkflow {
    /// Translation stages always resume, so a crashed workflow picks up where it stopped.
    pub fn new(scorer: Box<dyn QualityScorer>, options: BacktranslationOptions) -> Self {
        let pipeline = TranslationPipeline::new(PipelineOptions {
            batch_size: options.batch_size,
            resume: true,
            verify_manifest: true,
        });
        Self { pipeline, scorer, options }
    }

    /// Progress sink for both translation stages.
    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn PipelineProgress>) -> Self {
        self.pipeline = self.pipeline.with_progress(progress);
        self
    }

    pub fn work_dir_for(&self, input: &Path) -> PathBuf {
        self.options.work_dir.clone().unwrap_or_else(|| {
            let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            input.with_file_name(format!("backtranslation_{stem}"))
        })
    }

    pub fn run(
        &self,
        forward: &mut dyn Translator,
        backward: &mut dyn Translator,
        input: &Path,
        output: Option<&Path>,
    ) -> TranslateResult<BacktranslationReport> {
        if !input.is_file() {
            return Err(TranslateError::InputNotFound(input.to_path_buf()));
        }
        let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);

        let (rows, _) = read_lines(input)?;
        let Some((header, data)) = rows.split_first() else {
            return Err(TranslateError::Records { path: input.to_path_buf(), reason: "file is empty".to_string() });
        };

        let data: Vec<String> = data.iter().filter(|row| !row.trim().is_empty()).cloned().collect();
        let skipped = rows.len() - 1 - data.len();
        if skipped > 0 {
            debug!(skipped, "blank rows ignored");
        }

        let work_dir = self.work_dir_for(input);
        std::fs::create_dir_all(&work_dir)?;
        let original_path = work_dir.join(ORIGINAL_FILE);
        let synthetic_path = work_dir.join(SYNTHETIC_FILE);
        let back_path = work_dir.join(BACKTRANSLATED_FILE);

        info!(rows = data.len(), work_dir = %work_dir.display(), "extracting text column");
        let originals = extract_text_column(&data);
        write_text(&original_path, &originals)?;

        info!(translator = forward.id(), "forward translation");
        let forward_summary = self.pipeline.run(forward, &original_path, &synthetic_path)?;
        info!(translator = backward.id(), "back-translation");
        let backward_summary = self.pipeline.run(backward, &synthetic_path, &back_path)?;

        let (synthetic, _) = read_lines(&synthetic_path)?;
        let (back, _) = read_lines(&back_path)?;
        let scores = score_lines(self.scorer.as_ref(), &originals, &back);
        let global = corpus_score(self.scorer.as_ref(), &originals, &back);

        let mut content = format!("{}|{}\n", header.trim(), ADDED_COLUMNS.join("|"));
        for (i, row) in data.iter().enumerate() {
            let synthetic_line = synthetic.get(i).map_or(String::new(), |s| column_safe(s));
            let back_line = back.get(i).map_or(String::new(), |s| column_safe(s));
            content.push_str(&format!("{}|{}|{}|{:.2}\n", padded_row(row), synthetic_line, back_line, scores[i]));
        }
        std::fs::write(&output, content)?;

        let band = QualityBand::from_score(global);
        let metrics = BacktranslationMetrics {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: file_name(input),
            output_file: file_name(&output),
            scorer: self.scorer.name().to_string(),
            corpus_score: (global * 100.0).round() / 100.0,
            statistics: LineStatistics::from_scores(&scores),
            interpretation: Interpretation { quality: band, recommendation: band.recommendation().to_string() },
        };
        let metrics_path = metrics_path(&output);
        std::fs::write(&metrics_path, serde_json::to_string_pretty(&metrics)?)?;

        let kept_work_dir = if self.options.keep_intermediate {
            Some(work_dir)
        } else {
            if let Err(e) = std::fs::remove_dir_all(&work_dir) {
                warn!(work_dir = %work_dir.display(), error = %e, "intermediate files not removed");
            }
            None
        };

        info!(
            output = %output.display(),
            corpus_score = metrics.corpus_score,
            quality = ?band,
            "back-translation finished"
        );
        Ok(BacktranslationReport {
            output,
            metrics_path,
            metrics,
            forward: forward_summary,
            backward: backward_summary,
            work_dir: kept_work_dir,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn write_text(path: &Path, lines: &[String]) -> TranslateResult<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}
