use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    ReLU,
    /// Softmax is vector-valued; `Dense` applies it across the whole row
    /// through [`ActivationFunction::apply_row`].
    Softmax,
}

impl ActivationFunction {
    /// Activates one row of pre-activations.
    pub fn apply_row(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::ReLU => z.iter().map(|&x| if x > 0.0 { x } else { 0.0 }).collect(),
            ActivationFunction::Softmax => softmax(z),
        }
    }

    /// Element-wise derivative evaluated at the pre-activation `x`.
    ///
    /// For `Softmax` the layer is always paired with cross-entropy, whose
    /// gradient w.r.t. the logits is already `predicted - expected`. Returning
    /// `1.0` passes that delta through without applying the Jacobian twice.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationFunction::Softmax => 1.0,
        }
    }
}

/// Numerically stable softmax: shifts by the row max before exponentiating.
pub fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn relu_clamps_negatives() {
        let out = ActivationFunction::ReLU.apply_row(&[-1.0, 0.0, 2.5]);
        assert_eq!(out, vec![0.0, 0.0, 2.5]);
        assert_eq!(ActivationFunction::ReLU.derivative(-0.5), 0.0);
        assert_eq!(ActivationFunction::ReLU.derivative(0.5), 1.0);
    }

    #[test]
    fn softmax_survives_large_logits() {
        let p = softmax(&[1000.0, 1000.0, -1000.0]);
        assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-12);
    }
}
