use std::sync::atomic::Ordering;
use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::backend::Classifier;
use crate::data::dataset::{Dataset, Partition};
use crate::error::{IrisError, Result};
use crate::inference::argmax;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Offsets the data RNG from the initialization RNG when both share a seed.
const SHUFFLE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// What a finished `train_loop` reports back.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub epochs_completed: usize,
    /// True when the stop flag or a dropped receiver ended the run early.
    pub was_stopped: bool,
    pub history: Vec<EpochStats>,
    pub train_samples: usize,
    pub val_samples: usize,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Fits `model` on `dataset` for `config.epochs` epochs.
///
/// The dataset is shuffled once and split into training and validation
/// partitions; the training partition is reshuffled at the start of every
/// epoch and walked in mini-batches of `config.batch_size`.
///
/// # Early termination
/// The loop stops after the current epoch if `config.stop_flag` is set or the
/// `progress_tx` receiver has been dropped.
///
/// # Errors
/// - `InsufficientData` if the training partition is empty
/// - whatever `Classifier::train_batch` raises
/// - `Cancelled` if the run stopped before completing a single epoch
pub fn train_loop<M: Classifier + ?Sized>(
    model: &mut M,
    dataset: &Dataset,
    config: &TrainConfig,
) -> Result<LoopOutcome> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ SHUFFLE_SEED_SALT),
        None => StdRng::from_entropy(),
    };

    let (train, val) = dataset.split(config.validation_split, &mut rng);
    if train.is_empty() {
        return Err(IrisError::InsufficientData("training partition is empty".into()));
    }

    let started = Instant::now();
    let mut history = Vec::with_capacity(config.epochs);
    let mut was_stopped = false;

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            was_stopped = true;
            break;
        }

        let loss = run_one_epoch(model, &train, config.batch_size, &mut rng)?;
        let accuracy = compute_accuracy(model, &train);
        let (val_loss, val_accuracy) = if val.is_empty() {
            (None, None)
        } else {
            (Some(compute_eval_loss(model, &val)), Some(compute_accuracy(model, &val)))
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            elapsed_secs: started.elapsed().as_secs_f64(),
            loss,
            accuracy,
            val_loss,
            val_accuracy,
        };
        debug!(
            "epoch {}/{}: loss {:.4}, accuracy {:.2}%",
            epoch,
            config.epochs,
            loss,
            accuracy * 100.0
        );
        history.push(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // Receiver gone: nobody is watching, stop.
            if tx.send(stats).is_err() {
                was_stopped = epoch < config.epochs;
                break;
            }
        }
    }

    if history.is_empty() {
        return Err(IrisError::Cancelled);
    }

    Ok(LoopOutcome {
        epochs_completed: history.len(),
        was_stopped,
        history,
        train_samples: train.len(),
        val_samples: val.len(),
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// One shuffled pass of mini-batch updates. Returns the sample-weighted mean
/// batch loss.
fn run_one_epoch<M: Classifier + ?Sized>(
    model: &mut M,
    train: &Partition<'_>,
    batch_size: usize,
    rng: &mut StdRng,
) -> Result<f64> {
    let n = train.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut total_loss = 0.0;
    for batch in indices.chunks(batch_size) {
        let inputs: Vec<&[f64]> = batch.iter().map(|&i| train.inputs[i]).collect();
        let labels: Vec<&[f64]> = batch.iter().map(|&i| train.labels[i]).collect();
        total_loss += model.train_batch(&inputs, &labels)? * batch.len() as f64;
    }
    Ok(total_loss / n as f64)
}

/// Mean cross-entropy over a partition in inference mode.
fn compute_eval_loss<M: Classifier + ?Sized>(model: &M, part: &Partition<'_>) -> f64 {
    if part.is_empty() {
        return 0.0;
    }
    let total: f64 = part
        .inputs
        .iter()
        .zip(part.labels.iter())
        .map(|(input, label)| CrossEntropyLoss::loss(&model.predict(input), label))
        .sum();
    total / part.len() as f64
}

/// Fraction of samples whose arg-max matches the one-hot label.
fn compute_accuracy<M: Classifier + ?Sized>(model: &M, part: &Partition<'_>) -> f64 {
    if part.is_empty() {
        return 0.0;
    }
    let correct = part
        .inputs
        .iter()
        .zip(part.labels.iter())
        .filter(|(input, label)| argmax(&model.predict(input)) == argmax(label))
        .count();
    correct as f64 / part.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{build, DenseBackend};
    use crate::data::dataset::Sample;
    use crate::data::species::Species;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    /// Three well-separated clusters, one per species.
    fn clustered(n_per_class: usize) -> Dataset {
        let centers = [[5.0, 3.4, 1.5, 0.2], [5.9, 2.8, 4.3, 1.3], [6.6, 3.0, 5.6, 2.0]];
        let mut samples = Vec::new();
        for i in 0..n_per_class {
            for (class, c) in centers.iter().enumerate() {
                let wobble = ((i * 7 + class * 3) % 11) as f64 / 11.0 - 0.5;
                samples.push(Sample {
                    features: [c[0] + 0.3 * wobble, c[1] - 0.2 * wobble, c[2] + 0.2 * wobble, c[3] + 0.1 * wobble],
                    species: Species::ALL[class],
                });
            }
        }
        Dataset::from_samples(&samples)
    }

    /// Counts calls and always reports the same loss.
    struct Counting {
        batches: Vec<usize>,
    }

    impl Classifier for Counting {
        fn train_batch(&mut self, inputs: &[&[f64]], _: &[&[f64]]) -> Result<f64> {
            self.batches.push(inputs.len());
            Ok(0.5)
        }
        fn predict(&self, _: &[f64]) -> Vec<f64> {
            vec![1.0, 0.0, 0.0]
        }
    }

    #[test]
    fn walks_every_training_sample_in_batches() {
        let ds = clustered(10); // 30 samples, 6 held out
        let mut model = Counting { batches: Vec::new() };
        let config = TrainConfig { validation_split: 0.2, ..TrainConfig::new(2, 16, 0.001).with_seed(1) };
        let outcome = train_loop(&mut model, &ds, &config).unwrap();

        assert_eq!((outcome.train_samples, outcome.val_samples), (24, 6));
        assert_eq!(model.batches, vec![16, 8, 16, 8]);
        assert_eq!(outcome.epochs_completed, 2);
        assert!(!outcome.was_stopped);

        let last = &outcome.history[1];
        assert_eq!(last.epoch, 2);
        assert_eq!(last.total_epochs, 2);
        assert_eq!(last.loss, 0.5);
        // Every sample predicted as class 0: a third of the data is right.
        assert!((last.accuracy - 8.0 / 24.0).abs() < 0.2);
        assert!(last.val_loss.is_some());
        assert!(outcome.history[0].elapsed_secs <= last.elapsed_secs);
    }

    #[test]
    fn streams_one_record_per_epoch() {
        let (tx, rx) = mpsc::channel();
        let mut model = build(&DenseBackend, 0.01, Some(3)).unwrap();
        let config = TrainConfig::new(5, 8, 0.01).with_seed(3).with_progress(tx);
        train_loop(&mut model, &clustered(10), &config).unwrap();
        drop(config);

        let epochs: Vec<usize> = rx.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn learns_separable_clusters() {
        let mut model = build(&DenseBackend, 0.01, Some(8)).unwrap();
        let config = TrainConfig::new(60, 8, 0.01).with_seed(8);
        let outcome = train_loop(&mut model, &clustered(20), &config).unwrap();
        let first = &outcome.history[0];
        let last = outcome.history.last().unwrap();
        assert!(last.loss < first.loss);
        assert!(last.accuracy > 0.9, "accuracy {}", last.accuracy);
    }

    #[test]
    fn preset_stop_flag_cancels_the_run() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut model = Counting { batches: Vec::new() };
        let config = TrainConfig::new(5, 4, 0.001).with_stop_flag(flag);
        assert!(matches!(train_loop(&mut model, &clustered(5), &config), Err(IrisError::Cancelled)));
        assert!(model.batches.is_empty());
    }

    #[test]
    fn dropped_receiver_stops_after_the_current_epoch() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut model = Counting { batches: Vec::new() };
        let config = TrainConfig::new(5, 100, 0.001).with_progress(tx);
        let outcome = train_loop(&mut model, &clustered(5), &config).unwrap();
        assert_eq!(outcome.epochs_completed, 1);
        assert!(outcome.was_stopped);
    }

    #[test]
    fn batch_failure_propagates() {
        struct Exploding;
        impl Classifier for Exploding {
            fn train_batch(&mut self, _: &[&[f64]], _: &[&[f64]]) -> Result<f64> {
                Err(IrisError::Training("boom".into()))
            }
            fn predict(&self, _: &[f64]) -> Vec<f64> {
                vec![1.0 / 3.0; 3]
            }
        }
        let config = TrainConfig::new(3, 4, 0.001);
        assert!(matches!(train_loop(&mut Exploding, &clustered(5), &config), Err(IrisError::Training(_))));
    }
}
