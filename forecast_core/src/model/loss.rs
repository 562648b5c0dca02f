//! Training losses.
//!
//! Huber is used for optimisation since degradation targets carry occasional
//! outliers; absolute error is tracked alongside as the reporting metric.

use ndarray::Array1;

/// Mean Huber loss over the output vector.
pub fn huber_loss(prediction: &Array1<f64>, target: &Array1<f64>, delta: f64) -> f64 {
    let total: f64 = prediction
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| {
            let err = p - t;
            if err.abs() <= delta {
                0.5 * err * err
            } else {
                delta * (err.abs() - 0.5 * delta)
            }
        })
        .sum();
    total / prediction.len() as f64
}

/// Gradient of [`huber_loss`] with respect to the prediction.
pub fn huber_grad(prediction: &Array1<f64>, target: &Array1<f64>, delta: f64) -> Array1<f64> {
    let scale = 1.0 / prediction.len() as f64;
    let mut grad = Array1::zeros(prediction.len());
    for (j, (&p, &t)) in prediction.iter().zip(target.iter()).enumerate() {
        let err = p - t;
        grad[j] = if err.abs() <= delta {
            err * scale
        } else {
            delta * err.signum() * scale
        };
    }
    grad
}

/// Mean absolute error over the output vector.
pub fn mean_absolute_error(prediction: &Array1<f64>, target: &Array1<f64>) -> f64 {
    let total: f64 = prediction
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| (p - t).abs())
        .sum();
    total / prediction.len() as f64
}
