//! Integration tests for the `tuner filter` command.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECORDS: &str = "document_id|segment_id|text|synthetic_translation|back_translation|quality_score\n\
                       d|1|uno|one|uno|20.00\n\
                       d|2|dos|two|dos|40.00\n\
                       d|3|tres|three|tres|60.00\n\
                       d|4|cuatro|four|cuatro|80.00\n\
                       d|5|broken\n";

#[test]
fn test_filter_top_half() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("synthetic.txt"), RECORDS).unwrap();

    let output = Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .args([
            "filter",
            "--records",
            "synthetic.txt",
            "--percentile",
            "0.5",
            "--output-dir",
            "v2",
            "--source-lang",
            "agr",
            "--target-lang",
            "es",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let info: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(info["synthetic_pairs"], 2);
    assert_eq!(info["threshold_score"], 50.0);

    let dir = temp_dir.path().join("v2");
    assert_eq!(std::fs::read_to_string(dir.join("train.agr")).unwrap(), "tres\ncuatro\n");
    assert_eq!(std::fs::read_to_string(dir.join("train.es")).unwrap(), "three\nfour\n");
    assert!(dir.join("dataset_info.json").is_file());
}

#[test]
fn test_filter_with_base_corpus() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("synthetic.txt"), RECORDS).unwrap();
    let base = temp_dir.path().join("v1");
    std::fs::create_dir_all(&base).unwrap();
    std::fs::write(base.join("train.agr"), "base\n").unwrap();
    std::fs::write(base.join("train.es"), "base es\n").unwrap();

    Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["filter", "--records", "synthetic.txt", "--percentile", "0", "--output-dir", "v2", "--base-dir", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Filtered dataset written"));

    let train = std::fs::read_to_string(temp_dir.path().join("v2/train.agr")).unwrap();
    assert_eq!(train.lines().count(), 5);
    assert!(train.starts_with("base\n"));
}

#[test]
fn test_filter_rejects_percent_scale() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("synthetic.txt"), RECORDS).unwrap();

    Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["filter", "--records", "synthetic.txt", "--percentile", "50", "--output-dir", "v2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("percentile"));
}

#[test]
fn test_filter_builds_several_datasets() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("synthetic.txt"), RECORDS).unwrap();

    let output = Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .args([
            "filter",
            "--records",
            "synthetic.txt",
            "--dataset",
            "top25=0.75",
            "--dataset",
            "top50=0.5",
            "--output-dir",
            "synthetic",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let infos: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(infos[0]["dataset_name"], "top25");
    assert_eq!(infos[0]["synthetic_pairs"], 1);
    assert_eq!(infos[1]["synthetic_pairs"], 2);

    let root = temp_dir.path().join("synthetic");
    assert_eq!(std::fs::read_to_string(root.join("top25/train.agr")).unwrap(), "cuatro\n");
    assert!(root.join("top50/dataset_info.json").is_file());
    assert!(root.join("datasets_summary.json").is_file());
}

#[test]
fn test_filter_rejects_malformed_dataset_flag() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("synthetic.txt"), RECORDS).unwrap();

    Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["filter", "--records", "synthetic.txt", "--dataset", "top20", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=PERCENTILE"));
}
