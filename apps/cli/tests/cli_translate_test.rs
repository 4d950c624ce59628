//! Integration tests for `tuner translate` and `tuner backtranslate`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Train a tiny es->agr model in `root` and return its best checkpoint.
fn train_model(root: &Path) -> PathBuf {
    let dir = root.join("data").join("v1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("train.es"), "perro\ngato\nperro grande\ngato grande\n").unwrap();
    std::fs::write(dir.join("train.agr"), "yawa\nmishu\nyawa muun\nmishu muun\n").unwrap();
    std::fs::write(dir.join("dev.es"), "perro grande\ngato\n").unwrap();
    std::fs::write(dir.join("dev.agr"), "yawa muun\nmishu\n").unwrap();

    let output = Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(root)
        .args(["train", "--epochs", "1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let record: serde_json::Value = serde_json::from_slice(&output).unwrap();
    root.join(record["checkpoint"]["location"].as_str().unwrap())
}

#[test]
fn test_translate_keeps_lines_aligned() {
    let temp_dir = TempDir::new().unwrap();
    let model = train_model(temp_dir.path());
    std::fs::write(temp_dir.path().join("in.es"), "gato grande\n\nperro\n").unwrap();

    let output = Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("translate")
        .arg("--model")
        .arg(&model)
        .args(["--input", "in.es", "--output", "out/in.agr", "--batch-size", "2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["total_lines"], 3);
    assert_eq!(summary["error_lines"], 0);
    let translated = std::fs::read_to_string(temp_dir.path().join("out/in.agr")).unwrap();
    assert_eq!(translated, "mishu muun\n\nyawa\n");
}

#[test]
fn test_translate_resume_rejects_other_input() {
    let temp_dir = TempDir::new().unwrap();
    let model = train_model(temp_dir.path());
    std::fs::write(temp_dir.path().join("in.es"), "gato\nperro\n").unwrap();

    let translate = |extra: &[&str]| {
        let mut cmd = Command::cargo_bin("tuner").unwrap();
        cmd.current_dir(temp_dir.path())
            .arg("translate")
            .arg("--model")
            .arg(&model)
            .args(["--input", "in.es", "--output", "in.agr"])
            .args(extra);
        cmd
    };

    translate(&[]).assert().success();
    std::fs::write(temp_dir.path().join("in.es"), "otro\ntexto\n").unwrap();
    translate(&["--resume"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot resume"));
    translate(&["--resume", "--no-verify-manifest"]).assert().success();
}

#[test]
fn test_translate_missing_model_fails() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("in.es"), "hola\n").unwrap();

    Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["translate", "--model", "nowhere", "--input", "in.es", "--output", "out.agr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load model"));
    assert!(!temp_dir.path().join("out.agr").exists());
}

#[test]
fn test_backtranslate_writes_records_and_metrics() {
    let temp_dir = TempDir::new().unwrap();
    let model = train_model(temp_dir.path());
    std::fs::write(
        temp_dir.path().join("mono.txt"),
        "document_id|segment_id|text\nd1|1|perro grande\nd1|2|gato\n",
    )
    .unwrap();

    // The same model in both directions: unknown words are copied, so the
    // round trip is lossy and every line still gets a score.
    Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("backtranslate")
        .arg("--forward-model")
        .arg(&model)
        .arg("--backward-model")
        .arg(&model)
        .args(["--input", "mono.txt", "--batch-size", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Back-translation complete"));

    let records = std::fs::read_to_string(temp_dir.path().join("mono_synthetic.txt")).unwrap();
    let lines: Vec<&str> = records.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "document_id|segment_id|text|synthetic_translation|back_translation|quality_score");
    assert!(lines[1].starts_with("d1|1|perro grande|yawa muun|"));

    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join("mono_synthetic_metrics.json")).unwrap())
            .unwrap();
    assert_eq!(metrics["scorer"], "chrF++");
    assert_eq!(metrics["statistics"]["total_lines"], 2);
    assert!(!temp_dir.path().join("backtranslation_mono").exists());
}
