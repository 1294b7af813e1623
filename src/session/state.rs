use serde::Serialize;

use crate::data::stats::NormalizationStats;
use crate::train::epoch_stats::EpochStats;

// ---------------------------------------------------------------------------
// Training status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrainingState {
    /// No training has been started yet.
    Idle,
    /// A run is in flight; further `train` calls are rejected.
    Training,
    /// The last run finished and its model is being served.
    Trained,
    /// The last run failed. A model from an earlier run, if any, is still served.
    Failed { reason: String },
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A fitted model paired with the normalization stats it was trained under.
///
/// Immutable once published: retraining swaps in a new snapshot rather than
/// mutating this one.
#[derive(Debug)]
pub struct TrainedModel<M> {
    pub model: M,
    pub stats: NormalizationStats,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Summary of a successful training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub epochs_completed: usize,
    pub total_epochs: usize,
    /// True when the run ended early through the stop flag or a dropped receiver.
    pub was_stopped: bool,
    pub elapsed_secs: f64,
    /// Accepted samples, before the validation split.
    pub samples: usize,
    pub train_samples: usize,
    pub val_samples: usize,
    pub final_stats: Option<EpochStats>,
}
