//! Integration tests for `tuner compare`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tuner_abstraction::Seq2SeqModel;
use tuner_models::LexiconModel;

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

/// An untrained lexicon, which copies its input.
fn blank_model(root: &Path) -> PathBuf {
    let dir = root.join("blank");
    LexiconModel::new("blank", 64).save(&dir).unwrap();
    dir
}

#[test]
fn test_compare_ranks_models() {
    let temp_dir = TempDir::new().unwrap();
    let blank = blank_model(temp_dir.path());
    let trained = train_model(temp_dir.path());

    let output = Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("compare")
        .arg("--model")
        .arg(&blank)
        .arg("--model")
        .arg(&trained)
        .args(["--name", "blank", "--name", "trained", "--head-to-head", "--save-translations"])
        .args(["--output-dir", "cmp", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["samples"], 2);
    assert_eq!(report["ranking"][0]["model"], "trained");
    assert_eq!(report["ranking"][1]["model"], "blank");
    assert_eq!(report["ranking"][1]["exact_matches"], 0);

    let duel = &report["head_to_head"][0];
    assert_eq!(duel["model_a"], "blank");
    assert_eq!(duel["wins_a"], 0);
    assert_eq!(duel["wins_b"], 2);
    assert_eq!(duel["ties"], 0);
    assert_eq!(report["divergent"][0]["predictions"]["blank"], "perro grande");

    let files: Vec<String> = std::fs::read_dir(temp_dir.path().join("cmp"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 3);
    let translations = files.iter().find(|f| f.starts_with("all_translations_")).unwrap();
    let csv = std::fs::read_to_string(temp_dir.path().join("cmp").join(translations)).unwrap();
    assert!(csv.starts_with("source,reference,prediction_blank,prediction_trained\n"));
    assert!(csv.contains("gato,mishu,gato,mishu\n"));
}

#[test]
fn test_compare_prints_ranking_table() {
    let temp_dir = TempDir::new().unwrap();
    let blank = blank_model(temp_dir.path());
    let trained = train_model(temp_dir.path());

    Command::cargo_bin("tuner")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("compare")
        .arg("--model")
        .arg(&trained)
        .arg("--model")
        .arg(&blank)
        .assert()
        .success()
        .stdout(predicate::str::contains("Model ranking on dev (2 pairs)"))
        .stdout(predicate::str::contains("chrF++"))
        .stdout(predicate::str::contains("best_model"))
        .stdout(predicate::str::contains("Largest disagreements"));
}

#[test]
fn test_compare_needs_two_distinct_models() {
    let temp_dir = TempDir::new().unwrap();
    let blank = blank_model(temp_dir.path());

    let compare = |extra: &[&str]| {
        let mut cmd = Command::cargo_bin("tuner").unwrap();
        cmd.current_dir(temp_dir.path()).arg("compare").arg("--model").arg(&blank).args(extra);
        cmd
    };

    compare(&[]).assert().failure().stderr(predicate::str::contains("at least two"));
    compare(&["--model", blank.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate model name"));
    compare(&["--model", "blank", "--name", "only-one"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--name values"));
}
