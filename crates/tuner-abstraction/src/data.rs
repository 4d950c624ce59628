use serde::{Deserialize, Serialize};

/// One batch of aligned sentence pairs: `source[i]` translates to `target[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelBatch {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

impl ParallelBatch {
    #[must_use]
    pub fn new(source: Vec<String>, target: Vec<String>) -> Self {
        Self { source, target }
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Supplies the ordered training batches for an epoch.
///
/// Batches are consumed strictly in the order yielded.
pub trait BatchSupply {
    /// Number of batches one epoch yields.
    fn num_batches(&self) -> usize;

    /// Number of aligned pairs behind the batches.
    fn num_examples(&self) -> usize;

    /// Batches for `epoch` (implementations may reshuffle per epoch).
    fn epoch_batches(&mut self, epoch: usize) -> Box<dyn Iterator<Item = ParallelBatch> + '_>;
}
