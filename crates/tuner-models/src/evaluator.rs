use crate::corpus::ParallelCorpus;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use tuner_abstraction::{
    EvaluationResult, Evaluator, ModelError, QualityScorer, SampleTranslation, Seq2SeqModel, PRIMARY_METRIC,
};

/// Scores model output on a held-out corpus with a [`QualityScorer`].
pub struct CorpusEvaluator {
    corpus: ParallelCorpus,
    scorer: Box<dyn QualityScorer>,
    batch_size: usize,
}

impl CorpusEvaluator {
    pub fn new(corpus: ParallelCorpus, scorer: Box<dyn QualityScorer>, batch_size: usize) -> Self {
        Self { corpus, scorer, batch_size: batch_size.max(1) }
    }

    pub fn corpus(&self) -> &ParallelCorpus {
        &self.corpus
    }

    fn predict(&self, model: &mut dyn Seq2SeqModel, sources: &[String]) -> Vec<String> {
        generate_all(model, sources, self.batch_size)
    }
}

/// Translate every source sentence, `batch_size` at a time.
///
/// A batch that fails (or returns the wrong number of lines) is retried one
/// sentence at a time; a sentence that still fails is predicted as empty.
pub fn generate_all(model: &mut dyn Seq2SeqModel, sources: &[String], batch_size: usize) -> Vec<String> {
    let mut predictions = Vec::with_capacity(sources.len());
    for chunk in sources.chunks(batch_size.max(1)) {
        match model.generate(chunk) {
            Ok(out) if out.len() == chunk.len() => predictions.extend(out),
            result => {
                if let Err(e) = result {
                    debug!(error = %e, size = chunk.len(), "batch generation failed, retrying per sample");
                }
                predictions.extend(chunk.iter().map(|s| predict_one(model, s)));
            }
        }
        model.release_buffers();
    }
    predictions
}

fn predict_one(model: &mut dyn Seq2SeqModel, source: &str) -> String {
    match model.generate(std::slice::from_ref(&source.to_string())) {
        Ok(mut out) if out.len() == 1 => out.remove(0),
        Ok(_) => String::new(),
        Err(e) => {
            warn!(error = %e, "sample generation failed, scoring an empty prediction");
            String::new()
        }
    }
}

fn avg_words(texts: &[String]) -> f64 {
    if texts.is_empty() {
        return 0.0;
    }
    texts.iter().map(|t| t.split_whitespace().count()).sum::<usize>() as f64 / texts.len() as f64
}

impl Evaluator for CorpusEvaluator {
    fn evaluate(&mut self, model: &mut dyn Seq2SeqModel, epoch: usize) -> Result<EvaluationResult, ModelError> {
        if self.corpus.is_empty() {
            return Err(ModelError::Other("evaluation corpus is empty".to_string()));
        }

        let predictions = self.predict(model, &self.corpus.source);
        let mut scores = BTreeMap::new();
        scores.insert(PRIMARY_METRIC.to_string(), self.scorer.corpus_score(&predictions, &self.corpus.target));

        Ok(EvaluationResult::new(epoch, scores, predictions.len())
            .with_lengths(avg_words(&self.corpus.source), avg_words(&predictions)))
    }

    fn sample_translations(&mut self, model: &mut dyn Seq2SeqModel, count: usize) -> Vec<SampleTranslation> {
        let n = count.min(self.corpus.len());
        let sources = &self.corpus.source[..n];
        let predictions = self.predict(model, sources);
        sources
            .iter()
            .zip(&self.corpus.target)
            .zip(predictions)
            .map(|((source, reference), prediction)| SampleTranslation {
                source: source.clone(),
                reference: reference.clone(),
                prediction,
            })
            .collect()
    }
}
