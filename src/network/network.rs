use rand::Rng;

use crate::error::Result;
use crate::layers::{Dense, DenseGradients, Dropout, Layer};
use crate::math::matrix::Matrix;
use crate::network::spec::{LayerSpec, ModelSpec};
use crate::optim::adam::Adam;

#[derive(Debug, Clone)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a freshly initialized network from a validated spec.
    pub fn from_spec<R: Rng + ?Sized>(spec: &ModelSpec, rng: &mut R) -> Result<Network> {
        spec.validate()?;
        let layers = spec
            .layers
            .iter()
            .map(|l| match *l {
                LayerSpec::Dense { size, input_size, activation, init, l2 } => {
                    Layer::Dense(Dense::new(input_size, size, activation, init, l2, rng))
                }
                LayerSpec::Dropout { rate } => Layer::Dropout(Dropout::new(rate)),
            })
            .collect();
        Ok(Network { layers })
    }

    /// Inference forward pass over a batch; dropout is the identity here.
    pub fn predict_batch(&self, inputs: &Matrix) -> Matrix {
        let mut current = inputs.clone();
        for layer in &self.layers {
            if let Layer::Dense(dense) = layer {
                current = dense.forward(&current);
            }
        }
        current
    }

    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        self.predict_batch(&Matrix::row_vector(input))
            .data
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Training forward pass; every layer caches what backprop needs.
    pub fn forward<R: Rng + ?Sized>(&mut self, batch: Matrix, rng: &mut R) -> Matrix {
        let mut current = batch;
        for layer in &mut self.layers {
            current = match layer {
                Layer::Dense(dense) => dense.feed_from(current),
                Layer::Dropout(dropout) => dropout.feed_from(current, rng),
            };
        }
        current
    }

    /// Backward pass from the output delta. Returns one gradient set per
    /// dense layer, in input → output order.
    pub fn backward(&self, output_delta: Matrix) -> Vec<DenseGradients> {
        let mut delta = output_delta;
        let mut grads = Vec::new();
        for layer in self.layers.iter().rev() {
            match layer {
                Layer::Dense(dense) => {
                    let g = dense.compute_gradients(&delta);
                    delta = g.input_delta.clone();
                    grads.push(g);
                }
                Layer::Dropout(dropout) => delta = dropout.backward(&delta),
            }
        }
        grads.reverse();
        grads
    }

    /// One optimizer step. Slot `2k` holds dense layer k's weights, `2k + 1` its biases.
    pub fn apply_gradients(&mut self, grads: &[DenseGradients], optimizer: &mut Adam) {
        optimizer.begin_step();
        let dense_layers = self.layers.iter_mut().filter_map(|l| match l {
            Layer::Dense(dense) => Some(dense),
            Layer::Dropout(_) => None,
        });
        for (k, (dense, g)) in dense_layers.zip(grads).enumerate() {
            optimizer.update(2 * k, &mut dense.weights, &g.weights);
            optimizer.update(2 * k + 1, &mut dense.biases, &g.biases);
        }
    }

    /// Total L2 penalty across all dense layers.
    pub fn penalty(&self) -> f64 {
        self.layers
            .iter()
            .map(|l| match l {
                Layer::Dense(dense) => dense.penalty(),
                Layer::Dropout(_) => 0.0,
            })
            .sum()
    }
}
