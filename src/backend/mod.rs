//! The numeric backend seam.
//!
//! The training loop and the session never touch layers directly: they ask a
//! [`Backend`] to compile a [`ModelSpec`] and then drive the resulting
//! [`Classifier`]. [`DenseBackend`] is the in-crate implementation; tests plug
//! in their own.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{IrisError, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::math::matrix::Matrix;
use crate::network::{ModelSpec, Network};
use crate::optim::adam::Adam;

/// A compiled, trainable classifier.
pub trait Classifier: Send + Sync {
    /// Runs one optimizer step on a mini-batch and returns its mean loss
    /// (data term plus regularization).
    fn train_batch(&mut self, inputs: &[&[f64]], labels: &[&[f64]]) -> Result<f64>;

    /// Read-only inference pass returning class probabilities.
    fn predict(&self, input: &[f64]) -> Vec<f64>;
}

/// Compiles model descriptions into classifiers.
pub trait Backend: Send + Sync {
    type Model: Classifier;

    /// `seed` fixes weight initialization and dropout masks; `None` draws from entropy.
    fn compile(&self, spec: &ModelSpec, seed: Option<u64>) -> Result<Self::Model>;
}

/// Model Builder: compiles the fixed iris topology with the given learning rate.
pub fn build<B: Backend>(backend: &B, learning_rate: f64, seed: Option<u64>) -> Result<B::Model> {
    backend.compile(&ModelSpec::iris(learning_rate), seed)
}

/// Backend over the crate's own dense layers and Adam optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseBackend;

impl Backend for DenseBackend {
    type Model = DenseModel;

    fn compile(&self, spec: &ModelSpec, seed: Option<u64>) -> Result<DenseModel> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let network = Network::from_spec(spec, &mut rng)?;
        Ok(DenseModel {
            network,
            optimizer: Adam::new(spec.learning_rate),
            rng,
        })
    }
}

/// A [`Network`] bundled with its optimizer state and dropout RNG.
#[derive(Debug, Clone)]
pub struct DenseModel {
    pub network: Network,
    pub optimizer: Adam,
    rng: StdRng,
}

impl Classifier for DenseModel {
    fn train_batch(&mut self, inputs: &[&[f64]], labels: &[&[f64]]) -> Result<f64> {
        if inputs.is_empty() || inputs.len() != labels.len() {
            return Err(IrisError::Training(format!(
                "batch has {} inputs and {} labels",
                inputs.len(),
                labels.len()
            )));
        }

        let batch = Matrix::from_data(inputs.iter().map(|x| x.to_vec()).collect());
        let output = self.network.forward(batch, &mut self.rng);
        let loss = CrossEntropyLoss::batch_loss(&output, labels) + self.network.penalty();
        if !loss.is_finite() {
            return Err(IrisError::Training(format!("loss diverged to {}", loss)));
        }

        let delta = CrossEntropyLoss::derivative(&output, labels);
        let grads = self.network.backward(delta);
        self.network.apply_gradients(&grads, &mut self.optimizer);
        Ok(loss)
    }

    fn predict(&self, input: &[f64]) -> Vec<f64> {
        self.network.predict(input)
    }
}
