//! Epoch loop: train, maybe evaluate, maybe checkpoint, maybe stop.

use crate::artifacts::{make_artifact, ArtifactKind, TrainingArtifact};
use crate::config::TrainingConfig;
use crate::convergence::ConvergenceSummary;
use crate::early_stopping::{EarlyStopping, StopDecision};
use crate::error::{TrainingError, TrainingResult};
use crate::layout::RunLayout;
use crate::progress::{EpochSummary, EvaluatedEpoch, LogProgressSink, ProgressSink, TrainingEvent, Trend};
use crate::record::TrainingRunRecord;
use crate::schedule::should_evaluate;
use crate::state::TrainingState;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use tuner_abstraction::{
    BatchSupply, EvaluationResult, Evaluator, NullTrackingSink, Seq2SeqModel, TrackingError, TrackingSink,
};
use uuid::Uuid;

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    TrainingEpoch,
    EvaluatingEpoch,
    SkippingEvaluation,
    CheckpointDecision,
    Finalizing,
    Terminal,
}

/// Drives a model through the configured number of epochs.
pub struct TrainingOrchestrator<M: Seq2SeqModel> {
    config: TrainingConfig,
    model: M,
    data: Box<dyn BatchSupply>,
    evaluator: Box<dyn Evaluator>,
    tracking: Box<dyn TrackingSink>,
    progress: Box<dyn ProgressSink>,
    layout: RunLayout,
    phase: Phase,
}

impl<M: Seq2SeqModel> TrainingOrchestrator<M> {
    /// Validate the configuration and the batch supply.
    ///
    /// Both failures are fatal and happen before any training.
    pub fn new(
        config: TrainingConfig,
        model: M,
        data: Box<dyn BatchSupply>,
        evaluator: Box<dyn Evaluator>,
        layout: RunLayout,
    ) -> TrainingResult<Self> {
        config.validate()?;
        if data.num_batches() == 0 {
            return Err(TrainingError::Dataset("training data yields no batches".to_string()));
        }

        Ok(Self {
            config,
            model,
            data,
            evaluator,
            tracking: Box::new(NullTrackingSink),
            progress: Box::new(LogProgressSink),
            layout,
            phase: Phase::Initializing,
        })
    }

    #[must_use]
    pub fn with_tracking(mut self, tracking: Box<dyn TrackingSink>) -> Self {
        self.tracking = tracking;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "training phase");
        self.phase = phase;
    }

    /// Run every epoch (or until early stopping) and write the run record.
    pub fn run(&mut self) -> TrainingResult<TrainingRunRecord> {
        let started = Instant::now();
        self.layout.ensure_dirs()?;

        if let Some(init_from) = self.config.model.init_from.clone() {
            info!(path = %init_from.display(), "initializing model from saved state");
            self.model.load(&init_from)?;
        }

        let total_epochs = self.config.training.epochs;
        self.progress.on_event(TrainingEvent::Started {
            run_dir: self.layout.root().to_path_buf(),
            epochs: total_epochs,
            batches_per_epoch: self.data.num_batches(),
            examples: self.data.num_examples(),
        });
        info!(
            model = self.config.display_name(),
            direction = %self.config.data.direction(),
            dataset_version = %self.config.data.dataset_version,
            eval_frequency = self.config.evaluation.eval_frequency,
            "starting training"
        );

        let policy = EarlyStopping::maximize(self.config.training.patience, self.config.training.min_improvement);
        let mut state = TrainingState::new(policy);

        while state.epoch < total_epochs {
            state = self.run_epoch(state, started)?;
            if state.stopped_early {
                break;
            }
        }

        self.finalize(state, started)
    }

    fn run_epoch(&mut self, mut state: TrainingState, started: Instant) -> TrainingResult<TrainingState> {
        let epoch = state.epoch;
        let total_epochs = self.config.training.epochs;
        let epoch_started = Instant::now();

        self.enter(Phase::TrainingEpoch);
        self.progress.on_event(TrainingEvent::EpochStarted { epoch, total_epochs });
        let loss = self.train_epoch(epoch)?;
        state.loss_history.push(loss);

        let evaluation = if should_evaluate(epoch, total_epochs, self.config.evaluation.eval_frequency) {
            self.enter(Phase::EvaluatingEpoch);
            Some(self.evaluate_epoch(&mut state, epoch, loss))
        } else {
            self.enter(Phase::SkippingEvaluation);
            let mut metrics = BTreeMap::new();
            metrics.insert("train_loss_epoch".to_string(), loss);
            self.track_metrics(Some(epoch), &metrics);
            None
        };

        state.epoch += 1;
        state.elapsed = started.elapsed();
        self.progress.on_event(TrainingEvent::EpochCompleted(EpochSummary {
            epoch,
            total_epochs,
            loss,
            evaluation,
            elapsed: epoch_started.elapsed(),
        }));
        Ok(state)
    }

    /// One pass over the batch supply; returns the mean batch loss.
    fn train_epoch(&mut self, epoch: usize) -> TrainingResult<f64> {
        let total_batches = self.data.num_batches();
        let mut loss_sum = 0.0;
        let mut batches = 0usize;

        for (index, batch) in self.data.epoch_batches(epoch).enumerate() {
            if batch.is_empty() {
                continue;
            }
            if index == 0 {
                debug!(epoch = epoch + 1, size = batch.len(), "first batch of epoch");
            }
            let loss = self.model.train_step(&batch.source, &batch.target)?;
            self.model.release_buffers();
            loss_sum += loss;
            batches += 1;
            self.progress.on_event(TrainingEvent::BatchCompleted { epoch, batch: index, total_batches, loss });
        }

        if batches == 0 {
            return Err(TrainingError::Dataset(format!("epoch {} yielded no batches", epoch + 1)));
        }
        Ok(loss_sum / batches as f64)
    }

    fn evaluate_epoch(&mut self, state: &mut TrainingState, epoch: usize, loss: f64) -> EvaluatedEpoch {
        let result = match self.evaluator.evaluate(&mut self.model, epoch) {
            Ok(result) => result,
            Err(e) => {
                warn!(epoch = epoch + 1, error = %e, "evaluation failed, scoring epoch as empty");
                EvaluationResult::empty(epoch)
            }
        };
        let score = result.primary_score();
        let mut metrics = result.scores.clone();

        let decision = state.early_stopping.observe(score);
        debug!(epoch = epoch + 1, score, status = ?state.early_stopping.status(), "early stopping observed");
        let previous = state.tracker.latest().map(EvaluationResult::primary_score);
        let improved = state.tracker.record(result);

        self.enter(Phase::CheckpointDecision);
        if improved {
            self.save_best_checkpoint(state, epoch, score);
        }

        metrics.insert("train_loss_epoch".to_string(), loss);
        metrics.insert("best_score".to_string(), state.tracker.best_score().unwrap_or(0.0));
        metrics.insert("best_epoch".to_string(), state.tracker.best_epoch().unwrap_or(0) as f64);
        self.track_metrics(Some(epoch), &metrics);

        let sample_every = self.config.evaluation.eval_frequency.max(1) * 3;
        let sample_count = self.config.evaluation.sample_translations;
        if sample_count > 0 && epoch % sample_every == 0 {
            let samples = self.evaluator.sample_translations(&mut self.model, sample_count);
            if !samples.is_empty() {
                self.progress.on_event(TrainingEvent::Samples { epoch, samples });
            }
        }

        if decision == StopDecision::Stop {
            state.stopped_early = true;
            self.progress.on_event(TrainingEvent::EarlyStopped {
                epoch,
                best_score: state.tracker.best_score().unwrap_or(0.0),
                best_epoch: state.tracker.best_epoch().unwrap_or(0),
            });
        }

        EvaluatedEpoch { primary_score: score, trend: Trend::between(previous, score), is_best: improved }
    }

    fn save_best_checkpoint(&mut self, state: &mut TrainingState, epoch: usize, score: f64) {
        let path = self.layout.best_model_dir();
        match self.model.save(&path) {
            Ok(()) => {
                state.tracker.set_checkpoint(Some(path.clone()));
                self.progress.on_event(TrainingEvent::CheckpointSaved { epoch, score, path });
            }
            Err(e) => {
                warn!(epoch = epoch + 1, path = %path.display(), error = %e, "best checkpoint not saved");
                state.tracker.set_checkpoint(None);
                self.progress.on_event(TrainingEvent::CheckpointFailed { epoch, reason: e.to_string() });
            }
        }
    }

    fn finalize(&mut self, state: TrainingState, started: Instant) -> TrainingResult<TrainingRunRecord> {
        self.enter(Phase::Finalizing);

        let convergence = ConvergenceSummary::from_history(state.tracker.history());

        let final_dir = self.layout.final_model_dir();
        let final_model = match self.model.save(&final_dir) {
            Ok(()) => Some(final_dir),
            Err(e) => {
                warn!(error = %e, "final model not saved");
                None
            }
        };

        let mut artifacts = Vec::new();
        if let Some(location) = state.tracker.checkpoint().and_then(|c| c.location.clone()) {
            self.collect_artifact(&mut artifacts, ArtifactKind::BestCheckpoint, location);
        }
        if let Some(ref path) = final_model {
            self.collect_artifact(&mut artifacts, ArtifactKind::FinalModel, path.clone());
        }

        let elapsed = started.elapsed();
        let params = self.config.to_params();
        self.track_params(&params);
        let mut summary = BTreeMap::new();
        summary.insert("total_training_time_minutes".to_string(), elapsed.as_secs_f64() / 60.0);
        summary.insert("early_stopped".to_string(), if state.stopped_early { 1.0 } else { 0.0 });
        summary.insert("final_epoch".to_string(), state.completed_epochs() as f64);
        if let Some(ref convergence) = convergence {
            summary.extend(convergence.to_metrics());
        }
        self.track_metrics(None, &summary);

        let record = TrainingRunRecord {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            model_id: self.model.id().to_string(),
            config: self.config.clone(),
            best_score: state.tracker.best_score(),
            best_epoch: state.tracker.best_epoch(),
            total_elapsed_secs: elapsed.as_secs_f64(),
            early_stopped: state.stopped_early,
            final_epoch: state.completed_epochs(),
            convergence,
            loss_history: state.loss_history.clone(),
            checkpoint: state.tracker.checkpoint().cloned(),
            final_model,
            artifacts,
        };

        let record_path = self.layout.record_path();
        match record.write(&record_path) {
            Ok(()) => self.track_artifact(&record_path, ArtifactKind::TrainingRecord.group()),
            Err(e) => warn!(path = %record_path.display(), error = %e, "training record not written"),
        }

        self.progress.on_event(TrainingEvent::Finished {
            best_score: record.best_score,
            best_epoch: record.best_epoch,
            elapsed,
        });
        self.enter(Phase::Terminal);
        Ok(record)
    }

    fn collect_artifact(&mut self, artifacts: &mut Vec<TrainingArtifact>, kind: ArtifactKind, path: PathBuf) {
        match make_artifact(kind, path) {
            Ok(artifact) => {
                self.track_artifact(&artifact.path, artifact.kind.group());
                artifacts.push(artifact);
            }
            Err(e) => warn!(error = %e, "artifact not recorded"),
        }
    }

    fn track_metrics(&mut self, step: Option<usize>, metrics: &BTreeMap<String, f64>) {
        report_tracking(self.tracking.log_metrics(step, metrics), "metrics");
    }

    fn track_params(&mut self, params: &BTreeMap<String, String>) {
        report_tracking(self.tracking.log_params(params), "params");
    }

    fn track_artifact(&mut self, path: &Path, group: &str) {
        report_tracking(self.tracking.log_artifact(path, group), "artifact");
    }
}

fn report_tracking(result: Result<(), TrackingError>, what: &str) {
    if let Err(e) = result {
        warn!(what, error = %e, "tracking failed");
    }
}
