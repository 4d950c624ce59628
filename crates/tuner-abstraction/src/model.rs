use crate::error::ModelError;
use std::path::Path;

/// A trainable sequence-to-sequence model.
///
/// All calls are blocking. Implementations that run on an accelerator are free to
/// parallelise internally; callers treat every call as one synchronous unit of work.
pub trait Seq2SeqModel {
    /// Stable identifier of the model (used in manifests and run records).
    fn id(&self) -> &str;

    /// Run one optimisation step on an aligned batch and return the scalar loss.
    ///
    /// Parameter updates are a side effect the caller never inspects.
    fn train_step(&mut self, source: &[String], target: &[String]) -> Result<f64, ModelError>;

    /// Translate a batch of source sentences. The result has the same length as `source`.
    fn generate(&mut self, source: &[String]) -> Result<Vec<String>, ModelError>;

    /// Persist the current model state under `path`.
    fn save(&self, path: &Path) -> Result<(), ModelError>;

    /// Replace the current model state with the one persisted under `path`.
    fn load(&mut self, path: &Path) -> Result<(), ModelError>;

    /// Drop transient compute buffers held between calls.
    fn release_buffers(&mut self) {}
}

/// Batched text-to-text translation capability.
///
/// Every [`Seq2SeqModel`] is a translator through its `generate` method.
pub trait Translator {
    /// Identifier recorded in resume manifests.
    fn id(&self) -> &str;

    /// Translate `texts`, returning one translation per input.
    fn translate_batch(&mut self, texts: &[String]) -> Result<Vec<String>, ModelError>;

    /// Drop transient compute buffers after a batch.
    fn release_buffers(&mut self) {}
}

impl<M: Seq2SeqModel + ?Sized> Translator for M {
    fn id(&self) -> &str {
        Seq2SeqModel::id(self)
    }

    fn translate_batch(&mut self, texts: &[String]) -> Result<Vec<String>, ModelError> {
        self.generate(texts)
    }

    fn release_buffers(&mut self) {
        Seq2SeqModel::release_buffers(self);
    }
}
