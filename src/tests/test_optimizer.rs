use ndarray::{array, Array1, Array2};

use crate::layers::LayerGradients;
use crate::optimizer::{Adam, GradientClipper, Optimizer, SGD};

#[test]
fn test_sgd_step() {
    let mut optimizer = SGD::new();
    let mut weights = array![[1.0, 2.0], [3.0, 4.0]];
    let gradients = array![[0.5, -0.5], [1.0, 0.0]];
    optimizer.update_weights(0, &mut weights, &gradients, 0.1);
    let expected = array![[0.95, 2.05], [2.9, 4.0]];
    for (w, e) in weights.iter().zip(expected.iter()) {
        assert!((w - e).abs() < 1e-6);
    }

    let mut biases = array![1.0, -1.0];
    optimizer.update_biases(0, &mut biases, &array![2.0, -2.0], 0.5);
    assert_eq!(biases, array![0.0, 0.0]);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    let mut optimizer = Adam::default();
    let mut weights = Array2::<f32>::zeros((2, 3));
    let gradients = array![[0.1, -2.0, 5.0], [-0.3, 0.7, 1e-3]];

    optimizer.begin_step();
    optimizer.update_weights(0, &mut weights, &gradients, 0.01);

    for (w, g) in weights.iter().zip(gradients.iter()) {
        assert!((w + 0.01 * g.signum()).abs() < 1e-4, "w = {}, g = {}", w, g);
    }
    assert_eq!(optimizer.t, 1);
}

#[test]
fn test_adam_keeps_state_per_layer() {
    let mut optimizer = Adam::default();
    let mut first = Array1::<f32>::zeros(2);
    let mut second = Array1::<f32>::zeros(3);

    for _ in 0..3 {
        optimizer.begin_step();
        optimizer.update_biases(0, &mut first, &array![1.0, 1.0], 0.1);
        optimizer.update_biases(1, &mut second, &array![-1.0, -1.0, -1.0], 0.1);
    }
    assert!(first.iter().all(|&b| b < 0.0));
    assert!(second.iter().all(|&b| b > 0.0));
}

#[test]
fn test_adamw_decays_weights_without_gradient() {
    let mut optimizer = Adam::default().with_weight_decay(0.1);
    let mut weights = Array2::<f32>::ones((2, 2));
    let mut biases = Array1::<f32>::ones(2);

    optimizer.begin_step();
    optimizer.update_weights(0, &mut weights, &Array2::zeros((2, 2)), 0.5);
    optimizer.update_biases(0, &mut biases, &Array1::zeros(2), 0.5);

    for &w in weights.iter() {
        assert!((w - 0.95).abs() < 1e-6);
    }
    assert_eq!(biases, Array1::<f32>::ones(2));
}

fn gradients(weights: Array2<f32>, biases: Array1<f32>) -> LayerGradients {
    LayerGradients { weights, biases }
}

#[test]
fn test_global_norm_clipping() {
    let mut grads = vec![
        gradients(array![[3.0]], array![0.0]),
        gradients(array![[0.0]], array![4.0]),
    ];
    let clipper = GradientClipper::ClipByGlobalNorm { max_norm: 1.0 };

    let norm = clipper.clip(&mut grads);
    assert!((norm - 5.0).abs() < 1e-6);
    assert!((grads[0].weights[[0, 0]] - 0.6).abs() < 1e-6);
    assert!((grads[1].biases[0] - 0.8).abs() < 1e-6);
    assert!((GradientClipper::compute_global_norm(&grads) - 1.0).abs() < 1e-6);
}

#[test]
fn test_global_norm_below_threshold_is_untouched() {
    let mut grads = vec![gradients(array![[0.3, 0.4]], array![0.0])];
    let clipper = GradientClipper::ClipByGlobalNorm { max_norm: 1.0 };
    clipper.clip(&mut grads);
    assert_eq!(grads[0].weights, array![[0.3, 0.4]]);
}

#[test]
fn test_clip_by_value() {
    let mut grads = vec![gradients(array![[-3.0, 0.5]], array![2.0])];
    GradientClipper::ClipByValue { min: -1.0, max: 1.0 }.clip(&mut grads);
    assert_eq!(grads[0].weights, array![[-1.0, 0.5]]);
    assert_eq!(grads[0].biases, array![1.0]);
}
