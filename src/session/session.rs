use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::{info, warn};

use crate::backend::{build, Backend, DenseBackend};
use crate::data::dataset::Dataset;
use crate::data::loader::{load, LoaderConfig};
use crate::data::stats::NormalizationStats;
use crate::error::{IrisError, Result};
use crate::inference::{classify, Classification};
use crate::network::spec::FEATURES;
use crate::session::state::{TrainedModel, TrainingReport, TrainingState};
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

struct SessionState<M> {
    status: TrainingState,
    /// Model served by `predict`; replaced only when a run succeeds.
    snapshot: Option<Arc<TrainedModel<M>>>,
    /// Epoch stats from the most recent successful run.
    history: Vec<EpochStats>,
}

/// Owns the trained model, its normalization stats and the training state.
///
/// All methods take `&self`, so a session can be shared across threads (e.g.
/// in an `Arc`). At most one training run is in flight at a time; predictions
/// always read a complete snapshot and never observe a half-finished retrain.
pub struct Session<B: Backend = DenseBackend> {
    backend: B,
    loader: LoaderConfig,
    state: Mutex<SessionState<B::Model>>,
}

impl Session<DenseBackend> {
    pub fn new() -> Self {
        Session::with_backend(DenseBackend)
    }
}

impl Default for Session<DenseBackend> {
    fn default() -> Self {
        Session::new()
    }
}

impl<B: Backend> Session<B> {
    pub fn with_backend(backend: B) -> Self {
        Session {
            backend,
            loader: LoaderConfig::default(),
            state: Mutex::new(SessionState {
                status: TrainingState::Idle,
                snapshot: None,
                history: Vec::new(),
            }),
        }
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    pub fn status(&self) -> TrainingState {
        self.lock().status.clone()
    }

    /// True once any run has succeeded, even if a later one failed.
    pub fn is_trained(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<Arc<TrainedModel<B::Model>>> {
        self.lock().snapshot.clone()
    }

    /// Stats of the model currently being served.
    pub fn stats(&self) -> Option<NormalizationStats> {
        self.lock().snapshot.as_ref().map(|s| s.stats)
    }

    pub fn history(&self) -> Vec<EpochStats> {
        self.lock().history.clone()
    }

    /// Loads `csv` and trains on it. Loading happens inside the run, so a
    /// malformed file leaves the session `Failed` with the old model intact.
    pub fn train_csv(&self, csv: &str, config: &TrainConfig) -> Result<TrainingReport> {
        self.run(config, || load(csv, &self.loader))
    }

    /// Trains on an already loaded dataset. The dataset is consumed and
    /// released when this call returns, whatever the outcome.
    pub fn train(&self, dataset: Dataset, config: &TrainConfig) -> Result<TrainingReport> {
        self.run(config, move || Ok(dataset))
    }

    /// Classifies one set of raw measurements against the current snapshot.
    ///
    /// # Errors
    /// - `ModelNotTrained` if no run has ever succeeded
    /// - `Validation` if a value is non-finite or outside `[0, 10]`
    pub fn predict(&self, features: [f64; FEATURES]) -> Result<Classification> {
        let snapshot = self.snapshot().ok_or(IrisError::ModelNotTrained)?;
        classify(&snapshot.model, &snapshot.stats, &features)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, SessionState<B::Model>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run<F>(&self, config: &TrainConfig, load_dataset: F) -> Result<TrainingReport>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        config.validate()?;
        let flight = self.begin()?;
        info!(
            "training started: {} epochs, batch size {}, learning rate {}",
            config.epochs, config.batch_size, config.learning_rate
        );

        match load_dataset().and_then(|dataset| self.fit(dataset, config)) {
            Ok((trained, report, history)) => {
                info!(
                    "training finished after {} epoch(s) in {:.2}s",
                    report.epochs_completed, report.elapsed_secs
                );
                flight.succeed(trained, history);
                Ok(report)
            }
            Err(e) => {
                warn!("training failed: {}", e);
                flight.fail(&e);
                Err(e)
            }
        }
    }

    /// Moves the session into `Training`, or reports `Busy`.
    fn begin(&self) -> Result<Flight<'_, B>> {
        let mut st = self.lock();
        if st.status == TrainingState::Training {
            return Err(IrisError::Busy);
        }
        st.status = TrainingState::Training;
        Ok(Flight { session: self, resolved: false })
    }

    fn fit(
        &self,
        dataset: Dataset,
        config: &TrainConfig,
    ) -> Result<(TrainedModel<B::Model>, TrainingReport, Vec<EpochStats>)> {
        let started = Instant::now();
        let mut model = build(&self.backend, config.learning_rate, config.seed).map_err(|e| match e {
            IrisError::Training(_) => e,
            other => IrisError::Training(format!("could not build model: {}", other)),
        })?;

        let outcome = train_loop(&mut model, &dataset, config)?;
        let stats = dataset.stats;
        let samples = dataset.len();
        drop(dataset);

        let report = TrainingReport {
            epochs_completed: outcome.epochs_completed,
            total_epochs: config.epochs,
            was_stopped: outcome.was_stopped,
            elapsed_secs: started.elapsed().as_secs_f64(),
            samples,
            train_samples: outcome.train_samples,
            val_samples: outcome.val_samples,
            final_stats: outcome.history.last().cloned(),
        };
        Ok((TrainedModel { model, stats }, report, outcome.history))
    }
}

/// The single in-flight run. Resolving it publishes the outcome; dropping it
/// unresolved (a panic inside the run) marks the session `Failed`.
struct Flight<'a, B: Backend> {
    session: &'a Session<B>,
    resolved: bool,
}

impl<B: Backend> Flight<'_, B> {
    fn succeed(mut self, trained: TrainedModel<B::Model>, history: Vec<EpochStats>) {
        let mut st = self.session.lock();
        st.snapshot = Some(Arc::new(trained));
        st.history = history;
        st.status = TrainingState::Trained;
        self.resolved = true;
    }

    fn fail(mut self, error: &IrisError) {
        self.session.lock().status = TrainingState::Failed { reason: error.to_string() };
        self.resolved = true;
    }
}

impl<B: Backend> Drop for Flight<'_, B> {
    fn drop(&mut self) {
        if !self.resolved {
            self.session.lock().status = TrainingState::Failed { reason: "training aborted".into() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Classifier;
    use crate::data::dataset::Sample;
    use crate::data::species::Species;
    use crate::network::spec::ModelSpec;

    fn small_dataset() -> Dataset {
        let samples: Vec<Sample> = (0..30)
            .map(|i| Sample {
                features: [1.0 + (i % 3) as f64 * 2.0, 3.0, 1.0 + (i % 3) as f64 * 2.5, 0.2 + (i % 3) as f64],
                species: Species::ALL[i % 3],
            })
            .collect();
        Dataset::from_samples(&samples)
    }

    /// Backend whose models always predict class 1.
    struct Constant;

    struct ConstantModel;

    impl Classifier for ConstantModel {
        fn train_batch(&mut self, _: &[&[f64]], _: &[&[f64]]) -> Result<f64> {
            Ok(1.0)
        }
        fn predict(&self, _: &[f64]) -> Vec<f64> {
            vec![0.1, 0.8, 0.1]
        }
    }

    impl Backend for Constant {
        type Model = ConstantModel;
        fn compile(&self, _: &ModelSpec, _: Option<u64>) -> Result<ConstantModel> {
            Ok(ConstantModel)
        }
    }

    #[test]
    fn fresh_session_is_idle_and_untrained() {
        let session = Session::new();
        assert_eq!(session.status(), TrainingState::Idle);
        assert!(!session.is_trained());
        assert!(matches!(session.predict([5.0, 3.0, 1.0, 0.2]), Err(IrisError::ModelNotTrained)));
    }

    #[test]
    fn successful_run_publishes_a_snapshot() {
        let session = Session::with_backend(Constant);
        let report = session.train(small_dataset(), &TrainConfig::new(3, 8, 0.001).with_seed(1)).unwrap();
        assert_eq!(report.epochs_completed, 3);
        assert_eq!(report.samples, 30);
        assert_eq!(session.status(), TrainingState::Trained);
        assert_eq!(session.history().len(), 3);

        let c = session.predict([3.0, 3.0, 3.5, 1.2]).unwrap();
        assert_eq!(c.species, Species::Versicolor);
    }

    #[test]
    fn invalid_config_leaves_state_alone() {
        let session = Session::with_backend(Constant);
        let err = session.train(small_dataset(), &TrainConfig::new(0, 8, 0.001)).unwrap_err();
        assert!(matches!(err, IrisError::InvalidConfig(_)));
        assert_eq!(session.status(), TrainingState::Idle);
    }

    #[test]
    fn busy_while_a_flight_is_open() {
        let session = Session::with_backend(Constant);
        let flight = session.begin().unwrap();
        assert!(matches!(
            session.train(small_dataset(), &TrainConfig::new(1, 8, 0.001)),
            Err(IrisError::Busy)
        ));
        assert_eq!(session.status(), TrainingState::Training);
        drop(flight);
        assert!(matches!(session.status(), TrainingState::Failed { .. }));
    }

    #[test]
    fn validation_runs_after_the_trained_check() {
        let session = Session::with_backend(Constant);
        session.train(small_dataset(), &TrainConfig::new(1, 8, 0.001)).unwrap();
        assert!(matches!(session.predict([10.5, 1.0, 1.0, 1.0]), Err(IrisError::Validation(_))));
        assert!(session.predict([0.0, 10.0, 0.0, 10.0]).is_ok());
    }
}
