use crate::early_stopping::EarlyStopping;
use crate::tracker::MetricsTracker;
use std::time::Duration;

/// Everything that changes between epochs.
///
/// Each epoch step takes the state by value and hands back the next one.
#[derive(Debug, Clone)]
pub struct TrainingState {
    /// Next epoch to run (0-based).
    pub epoch: usize,
    /// Mean training loss of each completed epoch, in order.
    pub loss_history: Vec<f64>,
    pub tracker: MetricsTracker,
    pub early_stopping: EarlyStopping,
    pub stopped_early: bool,
    pub elapsed: Duration,
}

impl TrainingState {
    pub fn new(early_stopping: EarlyStopping) -> Self {
        Self {
            epoch: 0,
            loss_history: Vec::new(),
            tracker: MetricsTracker::new(),
            early_stopping,
            stopped_early: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn early_stop_counter(&self) -> usize {
        self.early_stopping.counter()
    }

    /// Number of epochs that finished training.
    pub fn completed_epochs(&self) -> usize {
        self.loss_history.len()
    }

    pub fn last_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}
