use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Keeps log() away from -inf on a zero probability.
const EPS: f64 = 1e-7;

impl CrossEntropyLoss {
    /// L = -Σ expected[i] · ln(predicted[i] + ε) for a single sample.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted
            .iter()
            .zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Mean per-sample loss over a batch (rows = samples).
    pub fn batch_loss(predicted: &Matrix, expected: &[&[f64]]) -> f64 {
        if predicted.rows == 0 {
            return 0.0;
        }
        predicted
            .data
            .iter()
            .zip(expected.iter())
            .map(|(p, e)| CrossEntropyLoss::loss(p, e))
            .sum::<f64>()
            / predicted.rows as f64
    }

    /// Gradient of softmax + cross-entropy w.r.t. the logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    ///
    /// Rows are per-sample; the layers divide by the batch size.
    pub fn derivative(predicted: &Matrix, expected: &[&[f64]]) -> Matrix {
        Matrix::from_data(
            predicted
                .data
                .iter()
                .zip(expected.iter())
                .map(|(p, e)| p.iter().zip(e.iter()).map(|(p, e)| p - e).collect())
                .collect(),
        )
    }
}
