//! Parameter update rules for the policy network.
//!
//! Optimizers keep their moment estimates per layer index, so one optimizer
//! must only ever be used with one network.

pub mod gradient_clipper;

use ndarray::{Array1, Array2, Dimension};
use serde::{Deserialize, Serialize};

use crate::layers::LayerGradients;
use crate::network::NeuralNetwork;

pub use gradient_clipper::GradientClipper;

pub trait Optimizer {
    /// Called once before the per-layer updates of an optimization step.
    fn begin_step(&mut self) {}

    fn update_weights(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    );

    fn update_biases(
        &mut self,
        layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    );

    /// Apply one optimization step to every layer of `network`.
    fn apply_gradients(
        &mut self,
        network: &mut NeuralNetwork,
        gradients: &[LayerGradients],
        learning_rate: f32,
    ) {
        self.begin_step();
        for (index, (layer, grads)) in network.layers.iter_mut().zip(gradients).enumerate() {
            self.update_weights(index, &mut layer.weights, &grads.weights, learning_rate);
            self.update_biases(index, &mut layer.biases, &grads.biases, learning_rate);
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn begin_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.begin_step(),
        }
    }

    fn update_weights(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    ) {
        match self {
            OptimizerWrapper::SGD(optimizer) => {
                optimizer.update_weights(layer, weights, gradients, learning_rate)
            }
            OptimizerWrapper::Adam(optimizer) => {
                optimizer.update_weights(layer, weights, gradients, learning_rate)
            }
        }
    }

    fn update_biases(
        &mut self,
        layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        match self {
            OptimizerWrapper::SGD(optimizer) => {
                optimizer.update_biases(layer, biases, gradients, learning_rate)
            }
            OptimizerWrapper::Adam(optimizer) => {
                optimizer.update_biases(layer, biases, gradients, learning_rate)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(
        &mut self,
        _layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    ) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(
        &mut self,
        _layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with optional decoupled weight decay (AdamW when `weight_decay > 0`).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    pub weight_decay: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    pub t: usize,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            weight_decay: 0.0,
            m_weights: Vec::new(),
            v_weights: Vec::new(),
            m_biases: Vec::new(),
            v_biases: Vec::new(),
            t: 0,
        }
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    fn bias_corrections(&self) -> (f32, f32) {
        let t = self.t.max(1) as i32;
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

/// Moment buffer for `layer`, (re)allocated when missing or mis-shaped.
fn moment_slot<D: Dimension>(
    store: &mut Vec<ndarray::Array<f32, D>>,
    layer: usize,
    dim: D,
) -> &mut ndarray::Array<f32, D> {
    if store.len() <= layer {
        store.resize_with(layer + 1, || ndarray::Array::zeros(D::zeros(dim.ndim())));
    }
    if store[layer].raw_dim() != dim {
        store[layer] = ndarray::Array::zeros(dim);
    }
    &mut store[layer]
}

fn adam_update<D: Dimension>(
    params: &mut ndarray::Array<f32, D>,
    gradients: &ndarray::Array<f32, D>,
    m: &mut ndarray::Array<f32, D>,
    v: &mut ndarray::Array<f32, D>,
    hyper: (f32, f32, f32, f32),
    corrections: (f32, f32),
    learning_rate: f32,
) {
    let (beta1, beta2, epsilon, weight_decay) = hyper;
    let (c1, c2) = corrections;

    if weight_decay > 0.0 {
        params.mapv_inplace(|p| p * (1.0 - learning_rate * weight_decay));
    }

    m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
    v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

    ndarray::Zip::from(params)
        .and(&*m)
        .and(&*v)
        .for_each(|p, &m, &v| {
            let m_hat = m / c1;
            let v_hat = v / c2;
            *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        });
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update_weights(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    ) {
        let hyper = (self.beta1, self.beta2, self.epsilon, self.weight_decay);
        let corrections = self.bias_corrections();
        let dim = weights.raw_dim();
        moment_slot(&mut self.m_weights, layer, dim.clone());
        moment_slot(&mut self.v_weights, layer, dim);
        adam_update(
            weights,
            gradients,
            &mut self.m_weights[layer],
            &mut self.v_weights[layer],
            hyper,
            corrections,
            learning_rate,
        );
    }

    fn update_biases(
        &mut self,
        layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        // Decay applies to weights only.
        let hyper = (self.beta1, self.beta2, self.epsilon, 0.0);
        let corrections = self.bias_corrections();
        let dim = biases.raw_dim();
        moment_slot(&mut self.m_biases, layer, dim.clone());
        moment_slot(&mut self.v_biases, layer, dim);
        adam_update(
            biases,
            gradients,
            &mut self.m_biases[layer],
            &mut self.v_biases[layer],
            hyper,
            corrections,
            learning_rate,
        );
    }
}
