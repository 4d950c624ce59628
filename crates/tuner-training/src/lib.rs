//! Tuner Training
//!
//! Epoch-level orchestration of seq2seq fine-tuning:
//! - Configuration (`TrainingConfig`) loaded from TOML
//! - Evaluation scheduling, early stopping and best-checkpoint selection
//! - Convergence statistics and the persistent run record
//! - Typed progress events (`ProgressSink`)
//!
//! Models, data, evaluation and tracking are collaborators from `tuner-abstraction`.

pub mod artifacts;
pub mod config;
pub mod convergence;
pub mod early_stopping;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod progress;
pub mod record;
pub mod schedule;
pub mod state;
pub mod tracker;

pub use artifacts::{make_artifact, sha256_dir, sha256_file, ArtifactKind, TrainingArtifact};
pub use config::{
    ConfigOverrides, DataConfig, EvaluationConfig, ExperimentConfig, HyperParams, ModelConfig, TrainingConfig,
};
pub use convergence::ConvergenceSummary;
pub use early_stopping::{EarlyStopping, EarlyStoppingStatus, StopDecision, StopMode};
pub use error::{TrainingError, TrainingResult};
pub use layout::RunLayout;
pub use orchestrator::{Phase, TrainingOrchestrator};
pub use progress::{EpochSummary, EvaluatedEpoch, LogProgressSink, ProgressSink, TrainingEvent, Trend};
pub use record::TrainingRunRecord;
pub use schedule::{evaluation_epochs, should_evaluate};
pub use state::TrainingState;
pub use tracker::{CheckpointRecord, MetricsTracker};
