//! Resumable, line-aligned batch translation of a text file.
//!
//! Every input line produces exactly one output line, in order. Blank input lines
//! become blank output lines without reaching the translator. A batch the
//! translator cannot handle is written as error placeholders and the run goes on.

use crate::error::{TranslateError, TranslateResult};
use crate::job::{TranslationJobState, TranslationSummary};
use crate::manifest::{sha256_bytes, ResumeManifest};
use crate::outcome::BatchOutcome;
use crate::output::{backup_existing, complete_lines, OutputWriter};
use crate::progress::{LogPipelineProgress, PipelineEvent, PipelineProgress};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tuner_abstraction::{decode_utf8, split_lines, Translator};

/// Sample pairs reported from the first batch of a run.
const SAMPLE_PAIRS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub batch_size: usize,
    /// Continue an existing output instead of backing it up and starting over.
    pub resume: bool,
    /// Refuse to resume an output produced for another input or translator.
    pub verify_manifest: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { batch_size: 16, resume: false, verify_manifest: true }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> TranslateResult<()> {
        if self.batch_size == 0 {
            return Err(TranslateError::InvalidOptions("batch_size must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Translate one batch, isolating translator failures to the batch.
///
/// Blank lines are not sent to the translator and map to empty strings. Non-blank
/// lines are trimmed before submission; translations are trimmed and have any
/// embedded line breaks replaced by spaces so the output stays line-aligned.
pub fn translate_batch(translator: &mut dyn Translator, lines: &[String]) -> BatchOutcome {
    let mut positions = Vec::new();
    let mut texts = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            positions.push(i);
            texts.push(trimmed.to_string());
        }
    }

    if texts.is_empty() {
        return BatchOutcome::Translated(vec![String::new(); lines.len()]);
    }

    let result = translator.translate_batch(&texts);
    translator.release_buffers();

    match result {
        Ok(translations) if translations.len() == texts.len() => {
            let mut out = vec![String::new(); lines.len()];
            for (position, translation) in positions.into_iter().zip(translations) {
                out[position] = single_line(&translation);
            }
            BatchOutcome::Translated(out)
        }
        Ok(translations) => BatchOutcome::failed(
            lines,
            format!("translator returned {} translations for {} lines", translations.len(), texts.len()),
        ),
        Err(e) => BatchOutcome::failed(lines, e.to_string()),
    }
}

fn single_line(text: &str) -> String {
    text.trim().replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Read `path` as lines, without line terminators, along with its raw bytes.
///
/// Bytes that are not UTF-8 are an error rather than replacement characters.
pub fn read_lines(path: &Path) -> TranslateResult<(Vec<String>, Vec<u8>)> {
    let bytes = std::fs::read(path)?;
    let text = decode_utf8(&bytes).map_err(|e| TranslateError::InvalidUtf8 { path: path.to_path_buf(), line: e.line })?;
    let lines = split_lines(text).into_iter().map(str::to_string).collect();
    Ok((lines, bytes))
}

pub struct TranslationPipeline {
    options: PipelineOptions,
    progress: Box<dyn PipelineProgress>,
}

impl TranslationPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options, progress: Box::new(LogPipelineProgress) }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn PipelineProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate `input` into `output`, line for line.
    ///
    /// # Errors
    /// Fails before translating anything when the options are invalid, the input is
    /// missing, or an existing output cannot be resumed. Failure to write the output
    /// is fatal; translator failures are not.
    pub fn run(&self, translator: &mut dyn Translator, input: &Path, output: &Path) -> TranslateResult<TranslationSummary> {
        self.options.validate()?;
        if !input.is_file() {
            return Err(TranslateError::InputNotFound(input.to_path_buf()));
        }

        let (lines, raw) = read_lines(input)?;
        let total = lines.len();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let manifest = ResumeManifest::new(translator.id(), input, sha256_bytes(&raw), self.options.batch_size);

        let (start, backup) = self.prepare_output(output, total, &manifest)?;
        let mut writer = if start > 0 { OutputWriter::append(output)? } else { OutputWriter::create(output)? };
        let mut job = TranslationJobState::new(total, start);

        self.progress.on_event(PipelineEvent::Started {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            total,
            resumed_from: start,
            batch_size: self.options.batch_size,
        });

        while !job.is_complete() {
            let batch_start = job.cursor;
            let batch_end = (batch_start + self.options.batch_size).min(total);
            let batch = &lines[batch_start..batch_end];

            let outcome = translate_batch(translator, batch);
            writer.write_batch(outcome.lines())?;

            if let Some(reason) = outcome.failure_reason() {
                self.progress.on_event(PipelineEvent::BatchFailed {
                    start: batch_start,
                    end: batch_end,
                    reason: reason.to_string(),
                });
            } else if batch_start == start {
                self.report_samples(batch, outcome.lines());
            }

            job.advance(outcome.len(), outcome.is_failed());
            self.progress.on_event(PipelineEvent::BatchWritten {
                start: batch_start,
                end: batch_end,
                failed: outcome.is_failed(),
                rate: job.rate(),
            });
        }

        let summary = TranslationSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            translator_id: translator.id().to_string(),
            total_lines: total,
            resumed_from: start,
            translated_lines: job.processed() - job.error_lines,
            error_lines: job.error_lines,
            failed_batches: job.failed_batches,
            elapsed_secs: job.elapsed().as_secs_f64(),
            backup,
        };
        if summary.has_errors() {
            warn!(errors = summary.error_lines, batches = summary.failed_batches, "translation finished with errors");
        }
        self.progress.on_event(PipelineEvent::Finished(summary.clone()));
        Ok(summary)
    }

    /// Decide where the run starts: `(first input line, backup of a previous output)`.
    fn prepare_output(
        &self,
        output: &Path,
        total: usize,
        manifest: &ResumeManifest,
    ) -> TranslateResult<(usize, Option<PathBuf>)> {
        if !output.exists() {
            if self.options.resume {
                info!(output = %output.display(), "nothing to resume, starting fresh");
            }
            write_manifest(manifest, output);
            return Ok((0, None));
        }

        if !self.options.resume {
            let backup = backup_existing(output)?;
            write_manifest(manifest, output);
            return Ok((0, Some(backup)));
        }

        let existing = complete_lines(output)?;
        if existing > total {
            return Err(TranslateError::ResumeBeyondInput { output: output.to_path_buf(), existing, total });
        }

        match ResumeManifest::load_for(output)? {
            Some(saved) if self.options.verify_manifest => saved.verify(manifest, output)?,
            Some(_) => {}
            None => {
                warn!(output = %output.display(), "no resume manifest, trusting the existing line count");
                write_manifest(manifest, output);
            }
        }

        info!(output = %output.display(), resume_from = existing, total, "resuming translation");
        Ok((existing, None))
    }

    fn report_samples(&self, batch: &[String], translations: &[String]) {
        let pairs: Vec<(String, String)> = batch
            .iter()
            .zip(translations)
            .filter(|(source, translation)| !source.trim().is_empty() && !translation.is_empty())
            .take(SAMPLE_PAIRS)
            .map(|(source, translation)| (source.trim().to_string(), translation.clone()))
            .collect();
        if !pairs.is_empty() {
            self.progress.on_event(PipelineEvent::Samples { pairs });
        }
    }
}

fn write_manifest(manifest: &ResumeManifest, output: &Path) {
    if let Err(e) = manifest.write_for(output) {
        warn!(output = %output.display(), error = %e, "resume manifest not written");
    }
}
