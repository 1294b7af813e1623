use rand::Rng;

use crate::math::matrix::Matrix;

/// Inverted dropout: during training each unit is zeroed with probability
/// `rate` and survivors are scaled by `1 / (1 - rate)`, so inference is the
/// identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub rate: f64,
    mask: Matrix,
}

impl Dropout {
    pub fn new(rate: f64) -> Dropout {
        Dropout { rate, mask: Matrix::default() }
    }

    pub fn feed_from<R: Rng + ?Sized>(&mut self, input: Matrix, rng: &mut R) -> Matrix {
        if self.rate == 0.0 {
            self.mask = input.map(|_| 1.0);
            return input;
        }
        let keep = 1.0 - self.rate;
        let mask = Matrix::from_data(
            input
                .data
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|_| if rng.gen::<f64>() < keep { 1.0 / keep } else { 0.0 })
                        .collect()
                })
                .collect(),
        );
        let out = input.hadamard(&mask);
        self.mask = mask;
        out
    }

    /// Routes the gradient only through the units kept in the last pass.
    pub fn backward(&self, delta: &Matrix) -> Matrix {
        delta.hadamard(&self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn kept_units_are_rescaled_and_dropped_units_are_zero() {
        let mut layer = Dropout::new(0.5);
        let input = Matrix::from_data(vec![vec![1.0; 200]]);
        let out = layer.feed_from(input, &mut StdRng::seed_from_u64(3));

        assert!(out.data[0].iter().all(|&x| x == 0.0 || x == 2.0));
        let kept = out.data[0].iter().filter(|&&x| x > 0.0).count();
        assert!((60..140).contains(&kept), "kept {} of 200", kept);

        let back = layer.backward(&Matrix::from_data(vec![vec![1.0; 200]]));
        assert_eq!(back, out);
    }

    #[test]
    fn zero_rate_is_identity() {
        let mut layer = Dropout::new(0.0);
        let input = Matrix::from_data(vec![vec![0.5, -1.5]]);
        let out = layer.feed_from(input.clone(), &mut StdRng::seed_from_u64(0));
        assert_eq!(out, input);
    }
}
