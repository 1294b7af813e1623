use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{IrisError, Result};
use crate::layers::dense::Initializer;

/// Number of measurements per sample.
pub const FEATURES: usize = 4;
/// Number of species the classifier separates.
pub const CLASSES: usize = 3;

/// Describes one stage of a sequential network.
///
/// - `Dense`: fully connected layer: `size` units fed by `input_size`
///   units, followed by `activation`; `l2` is the kernel penalty
/// - `Dropout`: training-time regularization dropping units with
///   probability `rate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        init: Initializer,
        #[serde(default)]
        l2: f64,
    },
    Dropout {
        rate: f64,
    },
}

/// Serializable description of a classifier: its layers plus the optimizer
/// learning rate. Loss is always categorical cross-entropy and the tracked
/// metric is accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Ordered list of stages (input → output).
    pub layers: Vec<LayerSpec>,
    /// Adam step size.
    pub learning_rate: f64,
}

impl ModelSpec {
    /// The fixed iris topology:
    /// dense(16, relu) → dropout(0.2) → dense(8, relu) → dropout(0.1) → dense(3, softmax).
    pub fn iris(learning_rate: f64) -> ModelSpec {
        const L2: f64 = 0.001;
        ModelSpec {
            layers: vec![
                LayerSpec::Dense {
                    size: 16,
                    input_size: FEATURES,
                    activation: ActivationFunction::ReLU,
                    init: Initializer::HeNormal,
                    l2: L2,
                },
                LayerSpec::Dropout { rate: 0.2 },
                LayerSpec::Dense {
                    size: 8,
                    input_size: 16,
                    activation: ActivationFunction::ReLU,
                    init: Initializer::HeNormal,
                    l2: L2,
                },
                LayerSpec::Dropout { rate: 0.1 },
                LayerSpec::Dense {
                    size: CLASSES,
                    input_size: 8,
                    activation: ActivationFunction::Softmax,
                    init: Initializer::GlorotUniform,
                    l2: 0.0,
                },
            ],
            learning_rate,
        }
    }

    fn dense_sizes(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.layers.iter().filter_map(|l| match l {
            LayerSpec::Dense { size, input_size, .. } => Some((*input_size, *size)),
            LayerSpec::Dropout { .. } => None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.dense_sizes().next().map(|(i, _)| i).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.dense_sizes().last().map(|(_, o)| o).unwrap_or(0)
    }

    /// Checks that layer widths chain and every hyperparameter is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(IrisError::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }

        let mut width: Option<usize> = None;
        for (idx, layer) in self.layers.iter().enumerate() {
            match layer {
                LayerSpec::Dense { size, input_size, l2, .. } => {
                    if *size == 0 || *input_size == 0 {
                        return Err(IrisError::InvalidConfig(format!("layer {}: zero width", idx)));
                    }
                    if let Some(w) = width {
                        if w != *input_size {
                            return Err(IrisError::InvalidConfig(format!(
                                "layer {}: expects {} inputs but previous layer has {} units",
                                idx, input_size, w
                            )));
                        }
                    }
                    if !(l2.is_finite() && *l2 >= 0.0) {
                        return Err(IrisError::InvalidConfig(format!("layer {}: bad l2 {}", idx, l2)));
                    }
                    width = Some(*size);
                }
                LayerSpec::Dropout { rate } => {
                    if !(0.0..1.0).contains(rate) {
                        return Err(IrisError::InvalidConfig(format!(
                            "layer {}: dropout rate {} outside [0, 1)",
                            idx, rate
                        )));
                    }
                }
            }
        }

        if self.input_size() != FEATURES || self.output_size() != CLASSES {
            return Err(IrisError::InvalidConfig(format!(
                "network maps {} inputs to {} outputs, expected {} to {}",
                self.input_size(),
                self.output_size(),
                FEATURES,
                CLASSES
            )));
        }

        match self.layers.last() {
            Some(LayerSpec::Dense { activation: ActivationFunction::Softmax, .. }) => Ok(()),
            _ => Err(IrisError::InvalidConfig("last layer must be a softmax dense layer".into())),
        }
    }
}
