use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// Loss between current estimates `Q(s)[a]` and bootstrapped targets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum TdLoss {
    /// Mean squared error
    #[default]
    Mse,

    /// Huber loss (smooth L1): quadratic within `delta`, linear outside
    Huber { delta: f32 },
}

impl TdLoss {
    /// Mean loss over the batch.
    pub fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let n = predictions.len().max(1) as f32;
        let total: f32 = Zip::from(&predictions)
            .and(&targets)
            .fold(0.0, |acc, &p, &t| acc + self.pointwise(p - t));
        total / n
    }

    /// Gradient of the mean loss with respect to each prediction.
    pub fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let n = predictions.len().max(1) as f32;
        Zip::from(&predictions)
            .and(&targets)
            .map_collect(|&p, &t| {
                let diff = p - t;
                let g = match *self {
                    TdLoss::Mse => 2.0 * diff,
                    TdLoss::Huber { delta } => diff.max(-delta).min(delta),
                };
                g / n
            })
    }

    fn pointwise(&self, diff: f32) -> f32 {
        match *self {
            TdLoss::Mse => diff * diff,
            TdLoss::Huber { delta } => {
                let abs = diff.abs();
                if abs <= delta {
                    0.5 * diff * diff
                } else {
                    delta * abs - 0.5 * delta * delta
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_value_and_gradient() {
        let p = array![1.0, 3.0];
        let t = array![0.0, 1.0];
        assert!((TdLoss::Mse.compute(p.view(), t.view()) - 2.5).abs() < 1e-6);
        assert_eq!(TdLoss::Mse.gradient(p.view(), t.view()), array![1.0, 2.0]);
    }

    #[test]
    fn test_huber_is_linear_outside_delta() {
        let loss = TdLoss::Huber { delta: 1.0 };
        let p = array![5.0];
        let t = array![0.0];
        assert!((loss.compute(p.view(), t.view()) - 4.5).abs() < 1e-6);
        assert_eq!(loss.gradient(p.view(), t.view()), array![1.0]);
    }
}
