//! Trains the lexicon model through the orchestrator and translates with the result.

use std::path::Path;
use tempfile::TempDir;
use tuner_models::{ChrfScorer, CorpusBatches, CorpusEvaluator, JsonlTrackingSink, LexiconModel, ParallelCorpus};
use tuner_training::{RunLayout, TrainingConfig, TrainingOrchestrator, TrainingRunRecord};
use tuner_translate::{PipelineOptions, TranslationPipeline};

fn write_corpus(dir: &Path) {
    std::fs::write(dir.join("train.es"), "perro\ngato\nperro grande\ngato grande\n").unwrap();
    std::fs::write(dir.join("train.agr"), "yawa\nmishu\nyawa muun\nmishu muun\n").unwrap();
    std::fs::write(dir.join("dev.es"), "perro grande\ngato\n").unwrap();
    std::fs::write(dir.join("dev.agr"), "yawa muun\nmishu\n").unwrap();
}

#[test]
fn test_train_then_translate() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let mut config = TrainingConfig::default();
    config.training.epochs = 3;
    config.training.batch_size = 2;

    let train = ParallelCorpus::load(temp.path(), "train", "es", "agr").unwrap();
    let dev = ParallelCorpus::load(temp.path(), "dev", "es", "agr").unwrap();
    let run_dir = temp.path().join("run");
    let layout = RunLayout::new(run_dir.clone());

    let data = CorpusBatches::new(train, config.training.batch_size, true, config.training.seed);
    let evaluator = CorpusEvaluator::new(dev, Box::new(ChrfScorer::new()), 4);
    let tracking = JsonlTrackingSink::new(layout.tracking_dir()).unwrap();
    let model = LexiconModel::new(config.model.id.clone(), config.model.max_length);

    let mut orchestrator = TrainingOrchestrator::new(config, model, Box::new(data), Box::new(evaluator), layout)
        .unwrap()
        .with_tracking(Box::new(tracking));
    let record = orchestrator.run().unwrap();

    assert_eq!(record.final_epoch, 3);
    assert_eq!(record.best_epoch, Some(0));
    assert!((record.best_score.unwrap() - 100.0).abs() < 1e-6);
    assert!(record.loss_history[2] < record.loss_history[0]);

    let layout = RunLayout::new(run_dir);
    let saved = TrainingRunRecord::read(&layout.record_path()).unwrap();
    assert_eq!(saved.run_id, record.run_id);
    assert!(layout.tracking_dir().join("metrics.jsonl").is_file());
    assert!(layout.tracking_dir().join("params.json").is_file());

    let mut best = LexiconModel::from_dir(&layout.best_model_dir()).unwrap();
    let output = temp.path().join("dev.translated");
    let summary = TranslationPipeline::new(PipelineOptions::default())
        .run(&mut best, &temp.path().join("dev.es"), &output)
        .unwrap();

    assert_eq!(summary.error_lines, 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "yawa muun\nmishu\n");
}
