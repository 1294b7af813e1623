use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{activation::activation::ActivationFunction, math::matrix::Matrix};

/// Weight initialization scheme for a dense kernel. Biases always start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    HeNormal,
    GlorotUniform,
}

/// Gradients of one dense layer for a mini-batch, already averaged over it.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub weights: Matrix,
    pub biases: Matrix,
    /// ∂L/∂input, to be handed to the previous layer.
    pub input_delta: Matrix,
}

#[derive(Debug, Clone)]
pub struct Dense {
    pub size: usize,
    pub input_size: usize,
    /// Shape (input_size, size).
    pub weights: Matrix,
    /// Shape (1, size).
    pub biases: Matrix,
    pub activator: ActivationFunction,
    /// L2 kernel penalty coefficient; the loss gains `l2 * Σ w²`.
    pub l2: f64,
    inputs: Matrix,
    pre_neurons: Matrix, // z = xW + b, needed for the activation derivative
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        size: usize,
        activation: ActivationFunction,
        init: Initializer,
        l2: f64,
        rng: &mut R,
    ) -> Dense {
        let weights = match init {
            Initializer::HeNormal => Matrix::he(input_size, size, rng),
            Initializer::GlorotUniform => Matrix::glorot_uniform(input_size, size, rng),
        };

        Dense {
            size,
            input_size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            l2,
            inputs: Matrix::default(),
            pre_neurons: Matrix::default(),
        }
    }

    fn activate(&self, z: &Matrix) -> Matrix {
        Matrix::from_data(z.data.iter().map(|row| self.activator.apply_row(row)).collect())
    }

    /// Inference pass over a batch (rows = samples). Caches nothing.
    pub fn forward(&self, input: &Matrix) -> Matrix {
        let z = (input * &self.weights).add_row(&self.biases);
        self.activate(&z)
    }

    /// Training pass: same as `forward` but keeps the input and `z` for backprop.
    pub fn feed_from(&mut self, input: Matrix) -> Matrix {
        let z = (&input * &self.weights).add_row(&self.biases);
        let a = self.activate(&z);
        self.inputs = input;
        self.pre_neurons = z;
        a
    }

    /// Backpropagates `delta` (∂L/∂a for every row of the last `feed_from`
    /// batch, not yet divided by the batch size).
    pub fn compute_gradients(&self, delta: &Matrix) -> DenseGradients {
        let n = self.inputs.rows.max(1) as f64;
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        let layer_delta = delta.hadamard(&act_derivative);

        let data_grad = (&self.inputs.transpose() * &layer_delta).map(|x| x / n);
        let penalty_grad = self.weights.map(|w| 2.0 * self.l2 * w);
        let weights = &data_grad + &penalty_grad;
        let biases = layer_delta.sum_rows().map(|x| x / n);
        let input_delta = &layer_delta * &self.weights.transpose();

        DenseGradients { weights, biases, input_delta }
    }

    /// Regularization term this layer adds to the loss.
    pub fn penalty(&self) -> f64 {
        if self.l2 == 0.0 {
            0.0
        } else {
            self.l2 * self.weights.sum_squares()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_layer(activation: ActivationFunction, l2: f64) -> Dense {
        let mut layer = Dense::new(2, 2, activation, Initializer::HeNormal, l2, &mut StdRng::seed_from_u64(1));
        layer.weights = Matrix::from_data(vec![vec![1.0, -1.0], vec![0.5, 2.0]]);
        layer.biases = Matrix::row_vector(&[0.0, 0.5]);
        layer
    }

    #[test]
    fn forward_applies_weights_bias_and_relu() {
        let layer = fixed_layer(ActivationFunction::ReLU, 0.0);
        let out = layer.forward(&Matrix::row_vector(&[2.0, 1.0]));
        // z = [2 + 0.5, -2 + 2 + 0.5] = [2.5, 0.5]
        assert_eq!(out.data, vec![vec![2.5, 0.5]]);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let input = Matrix::from_data(vec![vec![0.3, -0.7], vec![1.1, 0.4]]);
        let target = [vec![1.0, 0.0], vec![0.0, 1.0]];

        // Loss: mean over rows of 0.5 * Σ (a - t)² plus the L2 penalty.
        let loss = |layer: &Dense| {
            let out = layer.forward(&input);
            let data: f64 = out
                .data
                .iter()
                .zip(target.iter())
                .map(|(a, t)| a.iter().zip(t).map(|(x, y)| 0.5 * (x - y).powi(2)).sum::<f64>())
                .sum::<f64>()
                / 2.0;
            data + layer.penalty()
        };

        let mut layer = fixed_layer(ActivationFunction::ReLU, 0.01);
        let out = layer.feed_from(input.clone());
        let delta = Matrix::from_data(
            out.data
                .iter()
                .zip(target.iter())
                .map(|(a, t)| a.iter().zip(t).map(|(x, y)| x - y).collect())
                .collect(),
        );
        let grads = layer.compute_gradients(&delta);

        let h = 1e-6;
        for i in 0..2 {
            for j in 0..2 {
                let mut plus = layer.clone();
                plus.weights.data[i][j] += h;
                let mut minus = layer.clone();
                minus.weights.data[i][j] -= h;
                let numeric = (loss(&plus) - loss(&minus)) / (2.0 * h);
                assert_abs_diff_eq!(grads.weights.data[i][j], numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn penalty_scales_with_coefficient() {
        let layer = fixed_layer(ActivationFunction::ReLU, 0.001);
        // Σ w² = 1 + 1 + 0.25 + 4
        assert_abs_diff_eq!(layer.penalty(), 0.001 * 6.25, epsilon = 1e-15);
    }
}
