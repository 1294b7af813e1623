use crate::math::matrix::Matrix;

/// Adam optimizer.
///
/// Each parameter matrix owns a slot holding its first (m) and second (v)
/// moment estimates. Slots are created lazily on first update, so the same
/// optimizer can drive any network whose slot order stays stable.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: u64,
    m: Vec<Option<Matrix>>,
    v: Vec<Option<Matrix>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam::with_params(learning_rate, 0.9, 0.999, 1e-7)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Adam {
        Adam { learning_rate, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// Advances the step counter. Call once per mini-batch, before `update`.
    pub fn begin_step(&mut self) {
        self.t += 1;
    }

    /// Applies one bias-corrected Adam update to `param` in place.
    pub fn update(&mut self, slot: usize, param: &mut Matrix, grad: &Matrix) {
        if slot >= self.m.len() {
            self.m.resize(slot + 1, None);
            self.v.resize(slot + 1, None);
        }
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let t = self.t.max(1) as i32;
        let lr_t = self.learning_rate * (1.0 - b2.powi(t)).sqrt() / (1.0 - b1.powi(t));

        let m = self.m[slot].get_or_insert_with(|| Matrix::zeros(grad.rows, grad.cols));
        let v = self.v[slot].get_or_insert_with(|| Matrix::zeros(grad.rows, grad.cols));

        for i in 0..grad.rows {
            for j in 0..grad.cols {
                let g = grad.data[i][j];
                let mi = b1 * m.data[i][j] + (1.0 - b1) * g;
                let vi = b2 * v.data[i][j] + (1.0 - b2) * g * g;
                m.data[i][j] = mi;
                v.data[i][j] = vi;
                param.data[i][j] -= lr_t * mi / (vi.sqrt() + eps);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_step_moves_by_learning_rate() {
        // With bias correction the first update is lr * sign(g).
        let mut adam = Adam::new(0.01);
        let mut p = Matrix::from_data(vec![vec![1.0, -1.0]]);
        adam.begin_step();
        adam.update(0, &mut p, &Matrix::from_data(vec![vec![3.0, -0.5]]));
        assert_abs_diff_eq!(p.data[0][0], 0.99, epsilon = 1e-6);
        assert_abs_diff_eq!(p.data[0][1], -0.99, epsilon = 1e-6);
    }

    #[test]
    fn minimizes_a_quadratic() {
        let mut adam = Adam::new(0.1);
        let mut p = Matrix::from_data(vec![vec![5.0]]);
        for _ in 0..500 {
            let grad = p.map(|x| 2.0 * (x - 2.0));
            adam.begin_step();
            adam.update(0, &mut p, &grad);
        }
        assert_abs_diff_eq!(p.data[0][0], 2.0, epsilon = 1e-2);
        assert_eq!(adam.step_count(), 500);
    }
}
