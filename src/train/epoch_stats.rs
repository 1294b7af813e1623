use serde::{Deserialize, Serialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the loop sends
/// one `EpochStats` at the end of every completed epoch. This is the only
/// thing the presentation layer receives while training runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Wall-clock seconds since the run started (cumulative).
    pub elapsed_secs: f64,
    /// Mean training loss over the epoch's mini-batches, L2 penalty included.
    pub loss: f64,
    /// Training-partition accuracy in [0, 1], measured with dropout off.
    pub accuracy: f64,
    /// `None` when the validation partition is empty.
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}
