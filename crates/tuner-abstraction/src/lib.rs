//! Collaborator abstractions for tuner.
//!
//! The training orchestrator and the batch translation pipeline never talk to a
//! concrete model, dataset, metric or tracking backend. They are written against
//! the traits in this crate:
//! - [`Seq2SeqModel`] / [`Translator`]: train, generate, persist
//! - [`BatchSupply`]: ordered batches of aligned sentence pairs
//! - [`Evaluator`] / [`QualityScorer`]: scoring predictions against references
//! - [`TrackingSink`]: experiment tracking (scalars keyed by epoch, params, artifacts)
//!
//! [`decode_utf8`] and [`split_lines`] define how every text file is read.

pub mod data;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod rate;
pub mod text;
pub mod tracking;

pub use data::{BatchSupply, ParallelBatch};
pub use error::ModelError;
pub use evaluation::{EvaluationResult, Evaluator, QualityScorer, SampleTranslation, PRIMARY_METRIC};
pub use model::{Seq2SeqModel, Translator};
pub use rate::{format_duration, RateEstimate};
pub use text::{decode_utf8, split_lines, InvalidUtf8};
pub use tracking::{NullTrackingSink, TrackingError, TrackingSink};
