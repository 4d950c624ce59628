//! End-to-end tests for the batch translation pipeline and back-translation.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;
use tuner_abstraction::{ModelError, QualityScorer, Translator};
use tuner_translate::{
    manifest_path, read_records, BacktranslationOptions, BacktranslationWorkflow, PipelineEvent, PipelineOptions,
    PipelineProgress, QualityBand, TranslateError, TranslationPipeline,
};

/// `<t TEXT>` for every text; fails batches containing a poisoned word.
struct Tagger {
    id: String,
    poison: Option<String>,
    batches: usize,
}

impl Tagger {
    fn new() -> Self {
        Self { id: "tagger".to_string(), poison: None, batches: 0 }
    }

    fn poisoned(word: &str) -> Self {
        Self { poison: Some(word.to_string()), ..Self::new() }
    }
}

impl Translator for Tagger {
    fn id(&self) -> &str {
        &self.id
    }

    fn translate_batch(&mut self, texts: &[String]) -> Result<Vec<String>, ModelError> {
        self.batches += 1;
        if let Some(ref poison) = self.poison {
            if texts.iter().any(|t| t.contains(poison.as_str())) {
                return Err(ModelError::Generation("poisoned batch".to_string()));
            }
        }
        Ok(texts.iter().map(|t| format!("<t {t}>")).collect())
    }
}

/// Reverses the words of each text; applying it twice gives the original back.
struct Reverser;

impl Translator for Reverser {
    fn id(&self) -> &str {
        "reverser"
    }

    fn translate_batch(&mut self, texts: &[String]) -> Result<Vec<String>, ModelError> {
        Ok(texts.iter().map(|t| t.split_whitespace().rev().collect::<Vec<_>>().join(" ")).collect())
    }
}

struct ExactMatch;

impl QualityScorer for ExactMatch {
    fn name(&self) -> &str {
        "exact"
    }

    fn sentence_score(&self, hypothesis: &str, reference: &str) -> f64 {
        if hypothesis == reference { 100.0 } else { 0.0 }
    }

    fn corpus_score(&self, hypotheses: &[String], references: &[String]) -> f64 {
        let hits = hypotheses.iter().zip(references).filter(|(h, r)| h == r).count();
        hits as f64 / references.len() as f64 * 100.0
    }
}

#[derive(Default, Clone)]
struct RecordingProgress {
    events: Rc<RefCell<Vec<PipelineEvent>>>,
}

impl PipelineProgress for RecordingProgress {
    fn on_event(&self, event: PipelineEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn write_input(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&path, content).unwrap();
    path
}

fn pipeline(batch_size: usize, resume: bool) -> TranslationPipeline {
    TranslationPipeline::new(PipelineOptions { batch_size, resume, verify_manifest: true })
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_blank_line_example() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["Hola", "", "Mundo"]);
    let output = temp.path().join("out.txt");
    let mut tagger = Tagger::new();

    let summary = pipeline(2, false).run(&mut tagger, &input, &output).unwrap();

    assert_eq!(read(&output), "<t Hola>\n\n<t Mundo>\n");
    assert_eq!(tagger.batches, 2);
    assert_eq!(summary.total_lines, 3);
    assert_eq!(summary.error_lines, 0);
    assert!(manifest_path(&output).exists());
}

#[test]
fn test_failed_batch_keeps_line_count() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["a", "b", "boom", "c", "d"]);
    let output = temp.path().join("out.txt");
    let progress = RecordingProgress::default();

    let summary = pipeline(2, false)
        .with_progress(Box::new(progress.clone()))
        .run(&mut Tagger::poisoned("boom"), &input, &output)
        .unwrap();

    let content = read(&output);
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["<t a>", "<t b>", "[ERROR: boom]", "[ERROR: c]", "<t d>"]);
    assert_eq!(summary.error_lines, 2);
    assert_eq!(summary.failed_batches, 1);
    assert_eq!(summary.translated_lines, 3);

    let events = progress.events.borrow();
    let failed = events.iter().filter(|e| matches!(e, PipelineEvent::BatchFailed { start: 2, end: 4, .. })).count();
    assert_eq!(failed, 1);
    assert!(matches!(events.last(), Some(PipelineEvent::Finished(_))));
}

#[test]
fn test_resume_matches_clean_run() {
    let temp = TempDir::new().unwrap();
    let lines = ["uno", "dos", "", "tres", "cuatro", "cinco", "seis"];
    let input = write_input(temp.path(), "in.txt", &lines);

    let clean = temp.path().join("clean.txt");
    pipeline(3, false).run(&mut Tagger::new(), &input, &clean).unwrap();

    // A crash after the first batch and half of a line of the second.
    let crashed = temp.path().join("crashed.txt");
    pipeline(3, false).run(&mut Tagger::new(), &input, &crashed).unwrap();
    std::fs::write(&crashed, "<t uno>\n<t dos>\n\n<t tr").unwrap();

    let mut tagger = Tagger::new();
    let summary = pipeline(3, true).run(&mut tagger, &input, &crashed).unwrap();

    assert_eq!(summary.resumed_from, 3);
    assert_eq!(tagger.batches, 2);
    assert_eq!(read(&crashed), read(&clean));
}

#[test]
fn test_resume_of_complete_output_does_nothing() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["a", "b"]);
    let output = temp.path().join("out.txt");
    pipeline(2, false).run(&mut Tagger::new(), &input, &output).unwrap();

    let mut tagger = Tagger::new();
    let summary = pipeline(2, true).run(&mut tagger, &input, &output).unwrap();
    assert_eq!(tagger.batches, 0);
    assert_eq!(summary.resumed_from, 2);
    assert_eq!(read(&output), "<t a>\n<t b>\n");
}

#[test]
fn test_existing_output_is_backed_up() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["a"]);
    let output = temp.path().join("out.txt");
    std::fs::write(&output, "previous work\n").unwrap();

    let summary = pipeline(4, false).run(&mut Tagger::new(), &input, &output).unwrap();

    let backup = summary.backup.expect("backup path");
    assert_eq!(read(&backup), "previous work\n");
    assert_eq!(read(&output), "<t a>\n");
}

#[test]
fn test_resume_rejects_other_translator() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["a", "b", "c"]);
    let output = temp.path().join("out.txt");
    pipeline(1, false).run(&mut Tagger::new(), &input, &output).unwrap();
    std::fs::write(&output, "<t a>\n").unwrap();

    let mut other = Tagger { id: "other".to_string(), ..Tagger::new() };
    let result = pipeline(1, true).run(&mut other, &input, &output);
    assert!(matches!(result, Err(TranslateError::ResumeMismatch { .. })));
    assert_eq!(other.batches, 0);

    // Without verification the line count is trusted.
    let unchecked = TranslationPipeline::new(PipelineOptions { batch_size: 1, resume: true, verify_manifest: false });
    let summary = unchecked.run(&mut other, &input, &output).unwrap();
    assert_eq!(summary.resumed_from, 1);
}

#[test]
fn test_resume_rejects_changed_input() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["a", "b"]);
    let output = temp.path().join("out.txt");
    pipeline(1, false).run(&mut Tagger::new(), &input, &output).unwrap();

    write_input(temp.path(), "in.txt", &["a", "changed"]);
    let result = pipeline(1, true).run(&mut Tagger::new(), &input, &output);
    assert!(matches!(result, Err(TranslateError::ResumeMismatch { .. })));
}

#[test]
fn test_resume_beyond_input_is_fatal() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "in.txt", &["a"]);
    let output = temp.path().join("out.txt");
    std::fs::write(&output, "x\ny\nz\n").unwrap();

    let result = pipeline(1, true).run(&mut Tagger::new(), &input, &output);
    assert!(matches!(result, Err(TranslateError::ResumeBeyondInput { existing: 3, total: 1, .. })));
}

#[test]
fn test_missing_input_is_fatal() {
    let temp = TempDir::new().unwrap();
    let result = pipeline(1, false).run(&mut Tagger::new(), &temp.path().join("nope.txt"), &temp.path().join("o.txt"));
    assert!(matches!(result, Err(TranslateError::InputNotFound(_))));
}

#[test]
fn test_invalid_utf8_input_is_fatal_before_output_is_touched() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.txt");
    std::fs::write(&input, b"Hola\n\xff\xfe\nMundo\n").unwrap();
    let output = temp.path().join("out.txt");
    std::fs::write(&output, "previous\n").unwrap();
    let mut tagger = Tagger::new();

    let result = pipeline(2, false).run(&mut tagger, &input, &output);

    match result {
        Err(TranslateError::InvalidUtf8 { path, line }) => {
            assert_eq!(path, input);
            assert_eq!(line, 2);
        }
        other => panic!("expected InvalidUtf8, got {other:?}"),
    }
    assert_eq!(tagger.batches, 0);
    assert_eq!(read(&output), "previous\n");
    let backups = std::fs::read_dir(temp.path())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().contains(".backup_"))
        .count();
    assert_eq!(backups, 0);
}

#[test]
fn test_carriage_return_line_ends_split_input() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.txt");
    std::fs::write(&input, "uno\rdos\r\ntres\r").unwrap();
    let output = temp.path().join("out.txt");

    let summary = pipeline(2, false).run(&mut Tagger::new(), &input, &output).unwrap();

    assert_eq!(summary.total_lines, 3);
    assert_eq!(read(&output), "<t uno>\n<t dos>\n<t tres>\n");
}

#[test]
fn test_backtranslation_end_to_end() {
    let temp = TempDir::new().unwrap();
    let input = write_input(
        temp.path(),
        "mono.txt",
        &["document_id|segment_id|text", "d1|1|uno dos", "d1|2|", "", "d2|1|a|b c", "broken", "   ", ""],
    );
    let options = BacktranslationOptions { batch_size: 2, keep_intermediate: false, work_dir: None };
    let workflow = BacktranslationWorkflow::new(Box::new(ExactMatch), options);

    let report = workflow.run(&mut Reverser, &mut Reverser, &input, None).unwrap();

    assert_eq!(report.output, temp.path().join("mono_synthetic.txt"));
    assert!(report.work_dir.is_none());
    assert!(!temp.path().join("backtranslation_mono").exists());

    let content = read(&report.output);
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "document_id|segment_id|text|synthetic_translation|back_translation|quality_score");
    assert_eq!(lines[1], "d1|1|uno dos|dos uno|uno dos|100.00");
    assert_eq!(lines[2], "d1|2||||0.00");
    // `|` inside translations would break the columns
    assert_eq!(lines[3], "d2|1|a|b c|c a b|a b c|100.00");
    // short rows are padded so every record has six columns
    assert_eq!(lines[4], "broken|||||0.00");
    assert_eq!(lines.len(), 5);

    let records = read_records(&report.output).unwrap();
    assert_eq!(records.records.len(), 4);
    assert_eq!(records.skipped, 0);
    assert_eq!(records.records[2].source_text, "a|b c");
    assert_eq!(records.records[3].document_id, "broken");
    assert!(records.records[3].quality_score.abs() < f64::EPSILON);

    assert_eq!(report.metrics.statistics.total_lines, 4);
    assert!((report.metrics.corpus_score - 100.0).abs() < 1e-9);
    assert_eq!(report.metrics.interpretation.quality, QualityBand::Excellent);
    assert!(report.metrics_path.ends_with("mono_synthetic_metrics.json"));
    assert!(report.metrics_path.exists());
}

#[test]
fn test_backtranslation_keeps_intermediate_files() {
    let temp = TempDir::new().unwrap();
    let input = write_input(temp.path(), "mono.txt", &["id|seg|text", "d|1|hola mundo"]);
    let work_dir = temp.path().join("work");
    let options = BacktranslationOptions { batch_size: 4, keep_intermediate: true, work_dir: Some(work_dir.clone()) };
    let output = temp.path().join("out.txt");

    let report = BacktranslationWorkflow::new(Box::new(ExactMatch), options)
        .run(&mut Tagger::new(), &mut Reverser, &input, Some(&output))
        .unwrap();

    assert_eq!(report.work_dir.as_deref(), Some(work_dir.as_path()));
    assert_eq!(read(&work_dir.join("original.txt")), "hola mundo\n");
    assert_eq!(read(&work_dir.join("synthetic.txt")), "<t hola mundo>\n");
    assert_eq!(report.metrics.interpretation.quality, QualityBand::NeedsWork);
}
