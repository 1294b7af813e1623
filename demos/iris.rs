//! Trains the iris classifier on the bundled dataset and classifies a few
//! reference flowers.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example iris --release

use std::sync::{mpsc, Arc};
use std::thread;

use iris_nn::{EpochStats, IrisError, Session, TrainConfig};

const IRIS_CSV: &str = include_str!("../data/iris.csv");

fn main() -> Result<(), IrisError> {
    env_logger::init();

    let session = Arc::new(Session::new());
    let (tx, rx) = mpsc::channel::<EpochStats>();
    let config = TrainConfig::default().with_seed(42).with_progress(tx);

    // Training runs on its own thread; this one plays the presentation layer.
    let trainer = {
        let session = session.clone();
        thread::spawn(move || session.train_csv(IRIS_CSV, &config))
    };

    for stats in rx {
        if stats.epoch % 10 == 0 || stats.epoch == stats.total_epochs {
            println!(
                "Epoch {:>3}/{}  loss {:.4}  acc {:>6.2}%  val acc {}  ({:.1}s)",
                stats.epoch,
                stats.total_epochs,
                stats.loss,
                stats.accuracy * 100.0,
                stats
                    .val_accuracy
                    .map(|a| format!("{:.2}%", a * 100.0))
                    .unwrap_or_else(|| "-".into()),
                stats.elapsed_secs,
            );
        }
    }

    let report = trainer
        .join()
        .map_err(|_| IrisError::Training("training thread panicked".into()))??;
    println!(
        "Trained on {} samples ({} held out) in {:.2}s",
        report.samples, report.val_samples, report.elapsed_secs
    );

    let flowers = [
        [5.1, 3.5, 1.4, 0.2],
        [7.0, 3.2, 4.7, 1.4],
        [6.3, 3.3, 6.0, 2.5],
    ];
    for features in flowers {
        let c = session.predict(features)?;
        println!(
            "{:?} -> {} ({:.1}%)  {}",
            features,
            c.class_name,
            c.confidence_percent,
            serde_json::to_string(&c).unwrap_or_default()
        );
    }

    Ok(())
}
