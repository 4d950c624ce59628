//! `|`-delimited back-translation record files.
//!
//! Six columns: document id, segment id, source text, synthetic translation,
//! back-translation and quality score. The source text may itself contain `|`:
//! the first two and the last three fields are anchors, everything between them
//! is the source text.

use crate::error::{TranslateError, TranslateResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const RECORD_FIELDS: usize = 6;

/// Columns appended to a `document_id|segment_id|text` header.
pub const ADDED_COLUMNS: [&str; 3] = ["synthetic_translation", "back_translation", "quality_score"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktranslationRecord {
    pub document_id: String,
    pub segment_id: String,
    pub source_text: String,
    pub synthetic_translation: String,
    pub back_translation: String,
    pub quality_score: f64,
}

impl BacktranslationRecord {
    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{:.2}",
            self.document_id,
            self.segment_id,
            self.source_text,
            self.synthetic_translation,
            self.back_translation,
            self.quality_score
        )
    }
}

/// Split a row into exactly `anchors_before + 1 + anchors_after` fields.
///
/// Returns `None` when the row has fewer fields than that.
pub fn split_anchored(line: &str, anchors_before: usize, anchors_after: usize) -> Option<Vec<String>> {
    let parts: Vec<&str> = line.split('|').collect();
    let expected = anchors_before + 1 + anchors_after;
    if parts.len() < expected {
        return None;
    }

    let text_end = parts.len() - anchors_after;
    let mut fields: Vec<String> = parts[..anchors_before].iter().map(|s| (*s).to_string()).collect();
    fields.push(parts[anchors_before..text_end].join("|"));
    fields.extend(parts[text_end..].iter().map(|s| (*s).to_string()));
    Some(fields)
}

/// Parse one data row. Rows with too few fields or a non-numeric score yield `None`.
pub fn parse_record(line: &str) -> Option<BacktranslationRecord> {
    let mut fields = split_anchored(line, 2, 3)?.into_iter();
    let document_id = fields.next()?;
    let segment_id = fields.next()?;
    let source_text = fields.next()?;
    let synthetic_translation = fields.next()?;
    let back_translation = fields.next()?;
    let quality_score = fields.next()?.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;

    Some(BacktranslationRecord {
        document_id,
        segment_id,
        source_text,
        synthetic_translation,
        back_translation,
        quality_score,
    })
}

#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub header: Vec<String>,
    pub records: Vec<BacktranslationRecord>,
    /// Non-blank rows that could not be parsed.
    pub skipped: usize,
}

impl RecordSet {
    pub fn mean_score(&self) -> f64 {
        mean(self.records.iter().map(|r| r.quality_score))
    }
}

pub(crate) fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = scores.fold((0.0, 0usize), |(sum, count), s| (sum + s, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Read a record file: one header row, then records.
pub fn read_records(path: &Path) -> TranslateResult<RecordSet> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| TranslateError::Records { path: path.to_path_buf(), reason: "file is empty".to_string() })?
        .trim()
        .split('|')
        .map(str::to_string)
        .collect();

    let mut set = RecordSet { header, ..RecordSet::default() };
    for (index, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_record(line) {
            Some(record) => set.records.push(record),
            None => {
                debug!(row = index + 2, "skipping malformed record");
                set.skipped += 1;
            }
        }
    }
    Ok(set)
}

/// Write `header` and `records` in record-file format.
pub fn write_records(path: &Path, header: &str, records: &[BacktranslationRecord]) -> TranslateResult<()> {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(header);
    out.push('\n');
    for record in records {
        out.push_str(&record.to_line());
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_anchored_rejoins_free_text() {
        let fields = split_anchored("d1|s1|a|b|c|es|agr|55.5", 2, 3).unwrap();
        assert_eq!(fields, vec!["d1", "s1", "a|b|c", "es", "agr", "55.5"]);

        assert_eq!(split_anchored("d1|s1|texto", 2, 0).unwrap(), vec!["d1", "s1", "texto"]);
        assert!(split_anchored("d1|s1", 2, 3).is_none());
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record("doc|3|Ju|ju|Hola|Ju ju|61.23").unwrap();
        assert_eq!(record.source_text, "Ju|ju");
        assert_eq!(record.synthetic_translation, "Hola");
        assert!((record.quality_score - 61.23).abs() < 1e-9);
        assert_eq!(record.to_line(), "doc|3|Ju|ju|Hola|Ju ju|61.23");

        assert!(parse_record("doc|3|text|es|agr|n/a").is_none());
        assert!(parse_record("doc|3|text|es|agr").is_none());
    }

    #[test]
    fn test_read_records_skips_bad_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("synthetic.txt");
        std::fs::write(
            &path,
            "document_id|segment_id|text|synthetic_translation|back_translation|quality_score\n\
             d|1|a|b|c|10.00\n\
             \n\
             d|2|short\n\
             d|3|a|b|c|NaN\n\
             d|4|x|y|z|w|80.5\n",
        )
        .unwrap();

        let set = read_records(&path).unwrap();
        assert_eq!(set.header.len(), 6);
        assert_eq!(set.records.len(), 2);
        assert_eq!(set.skipped, 2);
        assert_eq!(set.records[1].source_text, "x|y");
        assert!((set.mean_score() - 45.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(read_records(&path), Err(TranslateError::Records { .. })));
    }
}
