use serde::{Deserialize, Serialize};

use crate::network::spec::FEATURES;

/// Per-feature mean and population standard deviation of a training set.
///
/// A zero standard deviation is stored as 1 so normalization never divides by
/// zero. Computed once per training run and reused unchanged for inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub means: [f64; FEATURES],
    pub stds: [f64; FEATURES],
}

impl NormalizationStats {
    /// Computes stats over `rows`. An empty slice yields mean 0, std 1.
    pub fn compute(rows: &[[f64; FEATURES]]) -> NormalizationStats {
        let mut means = [0.0; FEATURES];
        let mut stds = [1.0; FEATURES];
        if rows.is_empty() {
            return NormalizationStats { means, stds };
        }

        let n = rows.len() as f64;
        for i in 0..FEATURES {
            let mean = rows.iter().map(|r| r[i]).sum::<f64>() / n;
            let variance = rows.iter().map(|r| (r[i] - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            means[i] = mean;
            stds[i] = if std == 0.0 { 1.0 } else { std };
        }
        NormalizationStats { means, stds }
    }

    pub fn normalize(&self, raw: &[f64; FEATURES]) -> [f64; FEATURES] {
        let mut out = [0.0; FEATURES];
        for i in 0..FEATURES {
            out[i] = (raw[i] - self.means[i]) / self.stds[i];
        }
        out
    }

    pub fn denormalize(&self, normalized: &[f64; FEATURES]) -> [f64; FEATURES] {
        let mut out = [0.0; FEATURES];
        for i in 0..FEATURES {
            out[i] = normalized[i] * self.stds[i] + self.means[i];
        }
        out
    }
}
