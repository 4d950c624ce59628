//! Quality filtering of synthetic pairs into a training dataset.

use crate::error::{TranslateError, TranslateResult};
use crate::pipeline::read_lines;
use crate::records::{mean, BacktranslationRecord, RecordSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Score at `percentile` (0.0..=1.0) of the record scores, linearly interpolated.
///
/// A percentile of 0 (or no records) gives a threshold of 0, which keeps everything.
pub fn quality_threshold(records: &[BacktranslationRecord], percentile: f64) -> f64 {
    if percentile <= 0.0 || records.is_empty() {
        return 0.0;
    }
    let mut scores: Vec<f64> = records.iter().map(|r| r.quality_score).collect();
    scores.sort_by(f64::total_cmp);

    let position = percentile.min(1.0) * (scores.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    scores[lower] + (scores[upper] - scores[lower]) * (position - lower as f64)
}

/// Records scoring at or above `threshold`, in file order.
pub fn filter_records(records: &[BacktranslationRecord], threshold: f64) -> Vec<&BacktranslationRecord> {
    records.iter().filter(|r| r.quality_score >= threshold).collect()
}

/// Where the filtered dataset goes and what it is built from.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub percentile: f64,
    pub output_dir: PathBuf,
    /// Existing corpus whose `train.*` pairs come first.
    pub base_dir: Option<PathBuf>,
    /// Language of the record source text.
    pub source_lang: String,
    /// Language of the synthetic translations.
    pub target_lang: String,
}

/// `dataset_info.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub dataset_name: String,
    pub base_corpus: Option<PathBuf>,
    pub synthetic_corpus: PathBuf,
    pub threshold_percentile: f64,
    pub threshold_score: f64,
    pub base_pairs: usize,
    pub synthetic_pairs: usize,
    pub total_pairs: usize,
    pub synthetic_percentage: f64,
    pub avg_score_synthetic: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write `train.<src>`/`train.<tgt>` (base pairs first, then the filtered synthetic
/// pairs), copy any base `dev.*` files, and write `dataset_info.json`.
pub fn build_filtered_dataset(records: &RecordSet, synthetic_path: &Path, options: &FilterOptions) -> TranslateResult<DatasetInfo> {
    if !(0.0..=1.0).contains(&options.percentile) {
        return Err(TranslateError::InvalidOptions(format!(
            "percentile must be within 0..=1, got {}",
            options.percentile
        )));
    }

    let threshold = quality_threshold(&records.records, options.percentile);
    let kept = filter_records(&records.records, threshold);

    let (mut source, mut target) = match options.base_dir {
        Some(ref base) => read_base_pairs(base, &options.source_lang, &options.target_lang)?,
        None => (Vec::new(), Vec::new()),
    };
    let base_pairs = source.len();
    source.extend(kept.iter().map(|r| r.source_text.clone()));
    target.extend(kept.iter().map(|r| r.synthetic_translation.clone()));

    std::fs::create_dir_all(&options.output_dir)?;
    write_lines(&options.output_dir.join(format!("train.{}", options.source_lang)), &source)?;
    write_lines(&options.output_dir.join(format!("train.{}", options.target_lang)), &target)?;

    if let Some(ref base) = options.base_dir {
        for lang in [&options.source_lang, &options.target_lang] {
            let dev = base.join(format!("dev.{lang}"));
            if dev.is_file() {
                std::fs::copy(&dev, options.output_dir.join(format!("dev.{lang}")))?;
            }
        }
    }

    let total_pairs = source.len();
    let synthetic_pairs = kept.len();
    let info = DatasetInfo {
        dataset_name: options
            .output_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        base_corpus: options.base_dir.clone(),
        synthetic_corpus: synthetic_path.to_path_buf(),
        threshold_percentile: options.percentile,
        threshold_score: round2(threshold),
        base_pairs,
        synthetic_pairs,
        total_pairs,
        synthetic_percentage: if total_pairs == 0 { 0.0 } else { round2(synthetic_pairs as f64 / total_pairs as f64 * 100.0) },
        avg_score_synthetic: round2(mean(kept.iter().map(|r| r.quality_score))),
    };
    std::fs::write(options.output_dir.join("dataset_info.json"), serde_json::to_string_pretty(&info)?)?;

    info!(
        output = %options.output_dir.display(),
        threshold = info.threshold_score,
        synthetic = synthetic_pairs,
        total = total_pairs,
        "filtered dataset written"
    );
    Ok(info)
}

/// A named dataset cut at `percentile`, written to `<output root>/<name>`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetVariant {
    pub name: String,
    pub percentile: f64,
}

impl DatasetVariant {
    fn validate(&self) -> TranslateResult<()> {
        let bad_name = self.name.is_empty() || self.name == "." || self.name == ".." || self.name.contains(['/', '\\']);
        if bad_name {
            return Err(TranslateError::InvalidOptions(format!("invalid dataset name {:?}", self.name)));
        }
        if !(0.0..=1.0).contains(&self.percentile) {
            return Err(TranslateError::InvalidOptions(format!(
                "percentile of {} must be within 0..=1, got {}",
                self.name, self.percentile
            )));
        }
        Ok(())
    }
}

/// Parses `name=percentile`, e.g. `top20=0.8`.
impl FromStr for DatasetVariant {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TranslateError::InvalidOptions(format!("expected NAME=PERCENTILE, got {s:?}"));
        let (name, percentile) = s.split_once('=').ok_or_else(invalid)?;
        let percentile = percentile.trim().parse::<f64>().map_err(|_| invalid())?;
        let variant = Self { name: name.trim().to_string(), percentile };
        variant.validate()?;
        Ok(variant)
    }
}

/// Build one dataset per variant under `output_root`, sharing the base corpus and
/// languages of `shared`, then write `datasets_summary.json` listing them all.
///
/// Every variant is checked before anything is written.
pub fn build_filtered_datasets(
    records: &RecordSet,
    synthetic_path: &Path,
    output_root: &Path,
    variants: &[DatasetVariant],
    shared: &FilterOptions,
) -> TranslateResult<Vec<DatasetInfo>> {
    if variants.is_empty() {
        return Err(TranslateError::InvalidOptions("no datasets requested".to_string()));
    }
    for (i, variant) in variants.iter().enumerate() {
        variant.validate()?;
        if variants[..i].iter().any(|v| v.name == variant.name) {
            return Err(TranslateError::InvalidOptions(format!("dataset {} requested twice", variant.name)));
        }
    }

    let mut infos = Vec::with_capacity(variants.len());
    for variant in variants {
        let options = FilterOptions {
            percentile: variant.percentile,
            output_dir: output_root.join(&variant.name),
            ..shared.clone()
        };
        infos.push(build_filtered_dataset(records, synthetic_path, &options)?);
    }
    std::fs::write(output_root.join("datasets_summary.json"), serde_json::to_string_pretty(&infos)?)?;
    Ok(infos)
}

fn read_base_pairs(base: &Path, source_lang: &str, target_lang: &str) -> TranslateResult<(Vec<String>, Vec<String>)> {
    let (source, _) = read_lines(&base.join(format!("train.{source_lang}")))?;
    let (target, _) = read_lines(&base.join(format!("train.{target_lang}")))?;
    if source.len() != target.len() {
        return Err(TranslateError::Records {
            path: base.to_path_buf(),
            reason: format!("train.{source_lang} has {} lines but train.{target_lang} has {}", source.len(), target.len()),
        });
    }
    Ok((source, target))
}

fn write_lines(path: &Path, lines: &[String]) -> TranslateResult<()> {
    let mut content = lines.join("\n");
    if !lines.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(text: &str, score: f64) -> BacktranslationRecord {
        BacktranslationRecord {
            document_id: "d".to_string(),
            segment_id: "1".to_string(),
            source_text: text.to_string(),
            synthetic_translation: format!("es {text}"),
            back_translation: text.to_string(),
            quality_score: score,
        }
    }

    #[test]
    fn test_threshold_interpolates() {
        let records: Vec<_> = [10.0, 40.0, 20.0, 30.0].iter().map(|s| record("x", *s)).collect();
        assert!((quality_threshold(&records, 0.0)).abs() < 1e-9);
        assert!((quality_threshold(&records, 0.5) - 25.0).abs() < 1e-9);
        assert!((quality_threshold(&records, 0.8) - 34.0).abs() < 1e-9);
        assert!((quality_threshold(&records, 1.0) - 40.0).abs() < 1e-9);
        assert!(quality_threshold(&[], 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_filter_keeps_at_or_above() {
        let records = vec![record("a", 10.0), record("b", 25.0), record("c", 30.0)];
        let kept: Vec<_> = filter_records(&records, 25.0).into_iter().map(|r| r.source_text.as_str()).collect();
        assert_eq!(kept, vec!["b", "c"]);
    }

    #[test]
    fn test_build_dataset_with_base() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("v1");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("train.agr"), "base agr\n").unwrap();
        std::fs::write(base.join("train.es"), "base es\n").unwrap();
        std::fs::write(base.join("dev.es"), "dev es\n").unwrap();

        let set = RecordSet {
            header: Vec::new(),
            records: vec![record("low", 10.0), record("mid", 50.0), record("high", 90.0)],
            skipped: 0,
        };
        let options = FilterOptions {
            percentile: 0.5,
            output_dir: temp.path().join("v3-top50"),
            base_dir: Some(base),
            source_lang: "agr".to_string(),
            target_lang: "es".to_string(),
        };

        let info = build_filtered_dataset(&set, Path::new("synthetic.txt"), &options).unwrap();
        assert_eq!(info.dataset_name, "v3-top50");
        assert_eq!(info.base_pairs, 1);
        assert_eq!(info.synthetic_pairs, 2);
        assert_eq!(info.total_pairs, 3);
        assert!((info.threshold_score - 50.0).abs() < 1e-9);
        assert!((info.avg_score_synthetic - 70.0).abs() < 1e-9);

        let out = &options.output_dir;
        assert_eq!(std::fs::read_to_string(out.join("train.agr")).unwrap(), "base agr\nmid\nhigh\n");
        assert_eq!(std::fs::read_to_string(out.join("train.es")).unwrap(), "base es\nes mid\nes high\n");
        assert!(out.join("dev.es").exists());
        assert!(!out.join("dev.agr").exists());
        assert!(out.join("dataset_info.json").exists());
    }

    #[test]
    fn test_misaligned_base_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("train.agr"), "a\nb\n").unwrap();
        std::fs::write(temp.path().join("train.es"), "a\n").unwrap();

        let options = FilterOptions {
            percentile: 0.0,
            output_dir: temp.path().join("out"),
            base_dir: Some(temp.path().to_path_buf()),
            source_lang: "agr".to_string(),
            target_lang: "es".to_string(),
        };
        let result = build_filtered_dataset(&RecordSet::default(), Path::new("s.txt"), &options);
        assert!(matches!(result, Err(TranslateError::Records { .. })));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("top20=0.8".parse::<DatasetVariant>().unwrap(), DatasetVariant {
            name: "top20".to_string(),
            percentile: 0.8,
        });
        assert!("top20".parse::<DatasetVariant>().is_err());
        assert!("top20=80".parse::<DatasetVariant>().is_err());
        assert!("=0.5".parse::<DatasetVariant>().is_err());
        assert!("../x=0.5".parse::<DatasetVariant>().is_err());
    }

    #[test]
    fn test_build_several_datasets() {
        let temp = TempDir::new().unwrap();
        let set = RecordSet {
            header: Vec::new(),
            records: vec![record("a", 20.0), record("b", 40.0), record("c", 60.0), record("d", 80.0)],
            skipped: 0,
        };
        let shared = FilterOptions {
            percentile: 0.0,
            output_dir: PathBuf::new(),
            base_dir: None,
            source_lang: "agr".to_string(),
            target_lang: "es".to_string(),
        };
        let variants = vec![
            DatasetVariant { name: "top25".to_string(), percentile: 0.75 },
            DatasetVariant { name: "all".to_string(), percentile: 0.0 },
        ];

        let infos = build_filtered_datasets(&set, Path::new("s.txt"), temp.path(), &variants, &shared).unwrap();

        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].dataset_name, "top25");
        assert_eq!(infos[0].synthetic_pairs, 1);
        assert_eq!(infos[1].synthetic_pairs, 4);
        assert_eq!(std::fs::read_to_string(temp.path().join("top25/train.agr")).unwrap(), "d\n");
        let summary: Vec<DatasetInfo> =
            serde_json::from_str(&std::fs::read_to_string(temp.path().join("datasets_summary.json")).unwrap()).unwrap();
        assert_eq!(summary, infos);
    }

    #[test]
    fn test_duplicate_variant_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let shared = FilterOptions {
            percentile: 0.0,
            output_dir: PathBuf::new(),
            base_dir: None,
            source_lang: "agr".to_string(),
            target_lang: "es".to_string(),
        };
        let variants = vec![
            DatasetVariant { name: "x".to_string(), percentile: 0.5 },
            DatasetVariant { name: "x".to_string(), percentile: 0.2 },
        ];
        let result = build_filtered_datasets(&RecordSet::default(), Path::new("s.txt"), temp.path(), &variants, &shared);
        assert!(matches!(result, Err(TranslateError::InvalidOptions(_))));
        assert!(!temp.path().join("x").exists());
    }

    #[test]
    fn test_percentile_out_of_range() {
        let temp = TempDir::new().unwrap();
        let options = FilterOptions {
            percentile: 80.0,
            output_dir: temp.path().join("out"),
            base_dir: None,
            source_lang: "agr".to_string(),
            target_lang: "es".to_string(),
        };
        let result = build_filtered_dataset(&RecordSet::default(), Path::new("s.txt"), &options);
        assert!(matches!(result, Err(TranslateError::InvalidOptions(_))));
    }
}
