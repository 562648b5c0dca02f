//! Sequence regression network
//!
//! A compact recurrent regressor built directly over `ndarray`: two stacked
//! LSTM layers with dropout between them, a small dense head and a linear
//! (optionally rectified) output. Training runs full backpropagation through
//! time with Adam. Dropout masks draw from a caller-supplied seeded RNG, so
//! the same masks can be kept active at inference for stochastic sampling.

mod adam;
mod dense;
mod loss;
mod lstm;
mod network;

pub use adam::Adam;
pub use loss::{huber_grad, huber_loss, mean_absolute_error};
pub use network::{NetGrads, SequenceRegressor};

use ndarray::{Array1, Array2, Axis};

/// Outer product of two vectors
pub(crate) fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let lhs = a.view().insert_axis(Axis(1));
    let rhs = b.view().insert_axis(Axis(0));
    lhs.dot(&rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_outer_product_shape_and_values() {
        let product = outer(&array![1.0, 2.0], &array![3.0, 4.0, 5.0]);
        assert_eq!(product, array![[3.0, 4.0, 5.0], [6.0, 8.0, 10.0]]);
    }
}
