//! Patience-based early stopping over a stream of evaluation scores.

use serde::{Deserialize, Serialize};

/// Which direction counts as an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    Stop,
}

/// Stops training once `patience` consecutive observations fail to beat the best
/// score by more than `min_delta`.
///
/// The stop decision latches: every observation after the first `Stop` is also `Stop`.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    mode: StopMode,
    best: Option<f64>,
    counter: usize,
    stopped: bool,
}

/// Snapshot of the policy, for logs and run records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingStatus {
    pub counter: usize,
    pub best_score: Option<f64>,
    pub patience: usize,
    pub early_stop: bool,
}

impl EarlyStopping {
    /// `patience` below 1 is raised to 1 and a negative `min_delta` is treated as 0.
    pub fn new(patience: usize, min_delta: f64, mode: StopMode) -> Self {
        Self { patience: patience.max(1), min_delta: min_delta.max(0.0), mode, best: None, counter: 0, stopped: false }
    }

    pub fn maximize(patience: usize, min_delta: f64) -> Self {
        Self::new(patience, min_delta, StopMode::Maximize)
    }

    pub fn observe(&mut self, score: f64) -> StopDecision {
        if self.stopped {
            return StopDecision::Stop;
        }

        let Some(best) = self.best else {
            self.best = Some(score);
            return StopDecision::Continue;
        };

        if self.improves(score, best) {
            self.best = Some(score);
            self.counter = 0;
            return StopDecision::Continue;
        }

        self.counter += 1;
        if self.counter >= self.patience {
            self.stopped = true;
            StopDecision::Stop
        } else {
            StopDecision::Continue
        }
    }

    fn improves(&self, score: f64, best: f64) -> bool {
        match self.mode {
            StopMode::Maximize => score > best + self.min_delta,
            StopMode::Minimize => score < best - self.min_delta,
        }
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn status(&self) -> EarlyStoppingStatus {
        EarlyStoppingStatus {
            counter: self.counter,
            best_score: self.best,
            patience: self.patience,
            early_stop: self.stopped,
        }
    }
}
