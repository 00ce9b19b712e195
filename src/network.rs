use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, LayerCache, LayerGradients};

/// Per-layer caches of one training forward pass, in layer order.
#[derive(Clone, Debug)]
pub struct ForwardTrace {
    caches: Vec<LayerCache>,
}

/// A feed-forward network of dense layers mapping a state vector to one
/// value per discrete action.
///
/// Inference (`predict`, `predict_batch`) borrows the network immutably and
/// records nothing, so evaluating a target network can never contribute to a
/// gradient step.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes and activations.
    ///
    /// `layer_sizes` includes the input and output sizes, so it must be one
    /// longer than `activations`.
    pub fn new<R: Rng>(
        layer_sizes: &[usize],
        activations: &[Activation],
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_parameter(
                "layer_sizes",
                "must contain at least an input and an output size",
            ));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(DqnError::InvalidParameter {
                name: "activations".to_string(),
                reason: format!(
                    "expected {} activations, got {}",
                    layer_sizes.len() - 1,
                    activations.len()
                ),
            });
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(DqnError::invalid_parameter(
                "layer_sizes",
                "every layer needs at least one unit",
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, rng))
            .collect();

        Ok(NeuralNetwork { layers })
    }

    /// ReLU hidden layers and a linear output layer, the usual Q-network shape.
    pub fn mlp<R: Rng>(
        input_size: usize,
        hidden_sizes: &[usize],
        output_size: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        layer_sizes.push(input_size);
        layer_sizes.extend_from_slice(hidden_sizes);
        layer_sizes.push(output_size);

        let mut activations = vec![Activation::Relu; hidden_sizes.len()];
        activations.push(Activation::Linear);

        Self::new(&layer_sizes, &activations, rng)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    /// Evaluate a single input vector.
    pub fn predict(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let output = self.predict_batch(input.insert_axis(Axis(0)));
        output.row(0).to_owned()
    }

    /// Evaluate a batch of input vectors, one per row.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.predict_batch(current.view());
        }
        current
    }

    /// Training forward pass. The returned trace feeds `backward_batch`.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> (Array2<f32>, ForwardTrace) {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            let (output, cache) = layer.forward_batch(current.view());
            caches.push(cache);
            current = output;
        }
        (current, ForwardTrace { caches })
    }

    /// Backpropagate the loss gradient with respect to the network output.
    ///
    /// Gradients are returned in layer order.
    pub fn backward_batch(
        &self,
        trace: &ForwardTrace,
        output_errors: ArrayView2<f32>,
    ) -> Vec<LayerGradients> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (layer, cache) in self.layers.iter().zip(trace.caches.iter()).rev() {
            let (input_error, layer_gradients) = layer.backward_batch(cache, current_error.view());
            gradients.push(layer_gradients);
            current_error = input_error;
        }

        gradients.reverse();
        gradients
    }

    /// Overwrite every parameter with the corresponding one from `other`.
    pub fn copy_from(&mut self, other: &NeuralNetwork) {
        self.layers.clone_from(&other.layers);
    }
}
