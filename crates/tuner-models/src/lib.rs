//! Reference collaborators for tuner.
//!
//! Concrete implementations of the `tuner-abstraction` traits, small enough to run
//! anywhere and deterministic enough to test against:
//!
//! - **LexiconModel**: word co-occurrence translation model (`Seq2SeqModel`)
//! - **ChrfScorer / BleuScorer**: chrF++ and BLEU quality metrics (`QualityScorer`)
//! - **ParallelCorpus / CorpusBatches**: `<split>.<lang>` corpora and seeded batching (`BatchSupply`)
//! - **CorpusEvaluator**: held-out evaluation with per-sample fallback (`Evaluator`)
//! - **Assessor**: standalone evaluation and side-by-side comparison of finished models
//! - **CorpusStatistics**: length-ratio statistics of a parallel split
//! - **JsonlTrackingSink**: JSON-lines experiment tracking (`TrackingSink`)

pub mod assessment;
pub mod bleu;
pub mod chrf;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod lexicon;
pub mod stats;
pub mod tracking;

pub use assessment::{
    rank, write_predictions_csv, write_ranking_csv, write_translations_csv, Assessor, ComparisonReport,
    DivergentExample, DomainScores, EvaluationReport, HeadToHead, ModelScores, ScoredSample,
};
pub use bleu::BleuScorer;
pub use chrf::ChrfScorer;
pub use corpus::{CorpusBatches, ParallelCorpus};
pub use error::{ModelsError, ModelsResult};
pub use evaluator::{generate_all, CorpusEvaluator};
pub use lexicon::LexiconModel;
pub use stats::{CorpusStatistics, RatioSummary};
pub use tracking::JsonlTrackingSink;
