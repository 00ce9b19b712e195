use serde::{Deserialize, Serialize};

use crate::layers::LayerGradients;

/// Gradient clipping methods
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum GradientClipper {
    /// Clip every gradient element into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// Rescale all gradients together when their joint L2 norm exceeds `max_norm`
    ClipByGlobalNorm { max_norm: f32 },

    /// No clipping
    #[default]
    None,
}

impl GradientClipper {
    /// Clip `gradients` in place and return their global norm before clipping.
    pub fn clip(&self, gradients: &mut [LayerGradients]) -> f32 {
        let global_norm = Self::compute_global_norm(gradients);

        match *self {
            GradientClipper::ClipByValue { min, max } => {
                for grads in gradients.iter_mut() {
                    grads.weights.mapv_inplace(|g| g.max(min).min(max));
                    grads.biases.mapv_inplace(|g| g.max(min).min(max));
                }
            }

            GradientClipper::ClipByGlobalNorm { max_norm } => {
                if global_norm > max_norm && global_norm > 0.0 {
                    let scale = max_norm / global_norm;
                    for grads in gradients.iter_mut() {
                        grads.weights.mapv_inplace(|g| g * scale);
                        grads.biases.mapv_inplace(|g| g * scale);
                    }
                }
            }

            GradientClipper::None => {}
        }

        global_norm
    }

    /// Compute global norm of all gradients
    pub fn compute_global_norm(gradients: &[LayerGradients]) -> f32 {
        gradients
            .iter()
            .map(|g| {
                g.weights.iter().map(|&x| x * x).sum::<f32>()
                    + g.biases.iter().map(|&x| x * x).sum::<f32>()
            })
            .sum::<f32>()
            .sqrt()
    }
}
