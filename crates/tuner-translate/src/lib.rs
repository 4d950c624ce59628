//! Tuner Translate
//!
//! Batch translation of large text files with any [`tuner_abstraction::Translator`]:
//! - Line-aligned, resumable output with per-batch failure isolation
//! - Resume manifests guarding against continuing the wrong job
//! - Round-trip back-translation with per-line quality scores
//! - Percentile filtering of synthetic pairs into a training dataset

pub mod backtranslation;
pub mod error;
pub mod filter;
pub mod job;
pub mod manifest;
pub mod outcome;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod records;

pub use backtranslation::{
    BacktranslationMetrics, BacktranslationOptions, BacktranslationReport, BacktranslationWorkflow, LineStatistics,
    QualityBand,
};
pub use error::{TranslateError, TranslateResult};
pub use filter::{
    build_filtered_dataset, build_filtered_datasets, filter_records, quality_threshold, DatasetInfo, DatasetVariant,
    FilterOptions,
};
pub use job::{TranslationJobState, TranslationSummary};
pub use manifest::{manifest_path, ResumeManifest};
pub use outcome::{error_marker, is_error_marker, BatchOutcome};
pub use pipeline::{translate_batch, PipelineOptions, TranslationPipeline};
pub use progress::{LogPipelineProgress, PipelineEvent, PipelineProgress};
pub use records::{read_records, write_records, BacktranslationRecord, RecordSet};
