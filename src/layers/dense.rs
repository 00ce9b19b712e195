use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::initialization::WeightInit;
use crate::activations::Activation;

/// A fully connected (dense) layer in a neural network
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
}

/// Values recorded by a training forward pass, consumed by the backward pass.
#[derive(Clone, Debug)]
pub struct LayerCache {
    inputs: Array2<f32>,
    pre_activation: Array2<f32>,
}

/// Gradients of a loss with respect to one layer's parameters.
#[derive(Clone, Debug)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl DenseLayer {
    /// Create a dense layer with weights initialized for its activation
    /// and zero biases.
    pub fn new<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        Self::new_with_init(
            input_size,
            output_size,
            activation,
            WeightInit::for_activation(&activation),
            rng,
        )
    }

    pub fn new_with_init<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        DenseLayer {
            weights: init.initialize_weights((input_size, output_size), rng),
            biases: init.initialize_biases(output_size),
            activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn affine(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    /// Inference pass for a batch. Records nothing.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Training pass for a batch, returning the outputs and the cache
    /// `backward_batch` needs.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> (Array2<f32>, LayerCache) {
        let pre_activation = self.affine(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        let cache = LayerCache {
            inputs: inputs.to_owned(),
            pre_activation,
        };
        (outputs, cache)
    }

    /// Backpropagate `output_errors` (dLoss/dOutput) through the layer.
    ///
    /// Returns the error with respect to the layer input and the parameter gradients.
    pub fn backward_batch(
        &self,
        cache: &LayerCache,
        output_errors: ArrayView2<f32>,
    ) -> (Array2<f32>, LayerGradients) {
        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let gradients = LayerGradients {
            weights: cache.inputs.t().dot(&adjusted_error),
            biases: adjusted_error.sum_axis(Axis(0)),
        };
        let input_error = adjusted_error.dot(&self.weights.t());
        (input_error, gradients)
    }
}
