//! Prediction post-processing: input validation, arg-max and the
//! user-facing [`Classification`] record.

use serde::Serialize;

use crate::backend::Classifier;
use crate::data::species::Species;
use crate::data::stats::NormalizationStats;
use crate::error::{IrisError, Result};
use crate::network::spec::{CLASSES, FEATURES};

/// Inclusive bounds every raw measurement must fall within.
pub const FEATURE_RANGE: (f64, f64) = (0.0, 10.0);

pub const FEATURE_NAMES: [&str; FEATURES] = ["sepal length", "sepal width", "petal length", "petal width"];

/// Outcome of classifying one set of measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub class_index: usize,
    pub species: Species,
    pub class_name: &'static str,
    /// Arg-max probability as a percentage in [0, 100].
    pub confidence_percent: f64,
    pub probabilities: [f64; CLASSES],
}

impl Classification {
    /// Post-processes a raw probability vector. Ties go to the lowest index.
    pub fn from_probabilities(probabilities: &[f64]) -> Result<Classification> {
        if probabilities.len() != CLASSES || probabilities.iter().any(|p| !p.is_finite()) {
            return Err(IrisError::Training(format!(
                "model produced an invalid distribution: {:?}",
                probabilities
            )));
        }
        let mut probs = [0.0; CLASSES];
        probs.copy_from_slice(probabilities);

        let class_index = argmax(&probs);
        let species = Species::from_index(class_index).unwrap_or(Species::Setosa);
        Ok(Classification {
            class_index,
            species,
            class_name: species.name(),
            confidence_percent: probs[class_index] * 100.0,
            probabilities: probs,
        })
    }
}

/// Index of the largest element; the first one wins on ties. NaNs are ignored.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, &x) in v.iter().enumerate() {
        if x > best_val {
            best = i;
            best_val = x;
        }
    }
    best
}

/// Rejects non-finite or out-of-range measurements, naming the first offender.
pub fn validate_features(features: &[f64; FEATURES]) -> Result<()> {
    let (min, max) = FEATURE_RANGE;
    for (value, name) in features.iter().zip(FEATURE_NAMES.iter()) {
        if !value.is_finite() {
            return Err(IrisError::Validation(format!("{} is not a number", name)));
        }
        if *value < min || *value > max {
            return Err(IrisError::Validation(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }
    }
    Ok(())
}

/// Validates, normalizes with `stats`, and runs one forward pass.
pub fn classify<M: Classifier + ?Sized>(
    model: &M,
    stats: &NormalizationStats,
    features: &[f64; FEATURES],
) -> Result<Classification> {
    validate_features(features)?;
    let input = stats.normalize(features);
    Classification::from_probabilities(&model.predict(&input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Fixed(Vec<f64>);

    impl Classifier for Fixed {
        fn train_batch(&mut self, _: &[&[f64]], _: &[&[f64]]) -> Result<f64> {
            Ok(0.0)
        }
        fn predict(&self, _: &[f64]) -> Vec<f64> {
            self.0.clone()
        }
    }

    #[test]
    fn range_edges_are_inclusive() {
        assert!(validate_features(&[0.0, 10.0, 5.0, 0.0]).is_ok());
        assert!(matches!(validate_features(&[10.0001, 1.0, 1.0, 1.0]), Err(IrisError::Validation(_))));
        assert!(matches!(validate_features(&[1.0, -0.0001, 1.0, 1.0]), Err(IrisError::Validation(_))));
        assert!(matches!(validate_features(&[1.0, 1.0, f64::NAN, 1.0]), Err(IrisError::Validation(_))));
        assert!(matches!(validate_features(&[1.0, 1.0, 1.0, f64::INFINITY]), Err(IrisError::Validation(_))));
    }

    #[test]
    fn validation_message_names_the_feature() {
        let err = validate_features(&[1.0, 1.0, 11.0, 1.0]).unwrap_err();
        assert!(err.to_string().contains("petal length"), "{}", err);
    }

    #[test]
    fn ties_resolve_to_the_lowest_index() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[0.1, f64::NAN, 0.9]), 2);
    }

    #[test]
    fn classification_reports_percent_and_name() {
        let c = Classification::from_probabilities(&[0.05, 0.15, 0.8]).unwrap();
        assert_eq!(c.class_index, 2);
        assert_eq!(c.species, Species::Virginica);
        assert_eq!(c.class_name, "virginica");
        assert_abs_diff_eq!(c.confidence_percent, 80.0, epsilon = 1e-9);

        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["species"], "virginica");
    }

    #[test]
    fn invalid_distribution_is_rejected() {
        assert!(Classification::from_probabilities(&[0.5, 0.5]).is_err());
        assert!(Classification::from_probabilities(&[0.5, f64::NAN, 0.5]).is_err());
    }

    #[test]
    fn classify_validates_before_touching_the_model() {
        let stats = NormalizationStats::compute(&[]);
        let model = Fixed(vec![]);
        // An empty distribution would be an error; validation must fail first.
        assert!(matches!(
            classify(&model, &stats, &[12.0, 1.0, 1.0, 1.0]),
            Err(IrisError::Validation(_))
        ));
        let ok = classify(&Fixed(vec![0.9, 0.05, 0.05]), &stats, &[5.1, 3.5, 1.4, 0.2]).unwrap();
        assert_eq!(ok.species, Species::Setosa);
    }
}
