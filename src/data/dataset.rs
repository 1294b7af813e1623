use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::species::Species;
use crate::data::stats::NormalizationStats;
use crate::network::spec::FEATURES;

/// One accepted row: raw measurements plus its species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f64; FEATURES],
    pub species: Species,
}

/// Normalized features and one-hot labels, ready for fitting.
///
/// Owned by value: a training run consumes it, so its buffers are released on
/// every exit path of that run.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub labels: Vec<Vec<f64>>,
    /// Stats the inputs were normalized with; inference must reuse them.
    pub stats: NormalizationStats,
    /// Rows whose column count matched the header.
    pub raw_rows: usize,
    /// Matched rows rejected for bad features or an unknown species.
    pub dropped_rows: usize,
}

/// A borrowed slice of a dataset: the training or the validation partition.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    pub inputs: Vec<&'a [f64]>,
    pub labels: Vec<&'a [f64]>,
}

impl Partition<'_> {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl Dataset {
    /// Computes stats over `samples`, then normalizes and one-hot encodes them.
    pub fn from_samples(samples: &[Sample]) -> Dataset {
        let rows: Vec<[f64; FEATURES]> = samples.iter().map(|s| s.features).collect();
        let stats = NormalizationStats::compute(&rows);
        let inputs = rows.iter().map(|r| stats.normalize(r).to_vec()).collect();
        let labels = samples.iter().map(|s| s.species.one_hot()).collect();
        Dataset {
            inputs,
            labels,
            stats,
            raw_rows: samples.len(),
            dropped_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Shuffles once and holds out the last `floor(len * validation_split)`
    /// samples for validation.
    pub fn split<R: Rng + ?Sized>(&self, validation_split: f64, rng: &mut R) -> (Partition<'_>, Partition<'_>) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);

        let val_count = ((self.len() as f64) * validation_split).floor() as usize;
        let (train_idx, val_idx) = order.split_at(self.len() - val_count.min(self.len()));

        let take = |idx: &[usize]| Partition {
            inputs: idx.iter().map(|&i| self.inputs[i].as_slice()).collect(),
            labels: idx.iter().map(|&i| self.labels[i].as_slice()).collect(),
        };
        (take(train_idx), take(val_idx))
    }
}
