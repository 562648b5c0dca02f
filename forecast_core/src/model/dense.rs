//! Fully-connected layer. Linear only; activations are applied by the
//! network so their gradients stay next to the places that use them.

use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::outer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DenseLayer {
    /// Shape `(output, input)`.
    weights: Array2<f64>,
    bias: Array1<f64>,
    input_size: usize,
    output_size: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct DenseGrads {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl DenseGrads {
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            weights: Array2::zeros((output_size, input_size)),
            bias: Array1::zeros(output_size),
        }
    }

    pub fn add(&mut self, other: &DenseGrads) {
        self.weights += &other.weights;
        self.bias += &other.bias;
    }

    pub fn scale(&mut self, factor: f64) {
        self.weights *= factor;
        self.bias *= factor;
    }

    pub fn views(&self) -> Vec<ArrayViewD<f64>> {
        vec![self.weights.view().into_dyn(), self.bias.view().into_dyn()]
    }
}

impl DenseLayer {
    pub fn new(input_size: usize, output_size: usize, rng: &mut StdRng) -> Self {
        let spread = (6.0 / (input_size + output_size) as f64).sqrt();
        let weights =
            Array2::from_shape_fn((output_size, input_size), |_| rng.gen_range(-spread..spread));
        Self {
            weights,
            bias: Array1::zeros(output_size),
            input_size,
            output_size,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(x) + &self.bias
    }

    /// Returns weight gradients and the gradient with respect to the input.
    pub fn backward(&self, x: &Array1<f64>, d_out: &Array1<f64>) -> (DenseGrads, Array1<f64>) {
        let grads = DenseGrads {
            weights: outer(d_out, x),
            bias: d_out.clone(),
        };
        let d_input = self.weights.t().dot(d_out);
        (grads, d_input)
    }

    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<f64>> {
        vec![self.weights.view_mut().into_dyn(), self.bias.view_mut().into_dyn()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_forward_is_affine() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = DenseLayer::new(2, 2, &mut rng);
        layer.weights = array![[1.0, 2.0], [3.0, 4.0]];
        layer.bias = array![0.5, -0.5];

        let y = layer.forward(&array![1.0, 1.0]);
        assert_relative_eq!(y[0], 3.5);
        assert_relative_eq!(y[1], 6.5);
    }

    #[test]
    fn test_backward_matches_numerical_gradient() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut layer = DenseLayer::new(3, 2, &mut rng);
        let x = array![0.4, -0.2, 0.9];

        let d_out = Array1::ones(2);
        let (grads, d_input) = layer.backward(&x, &d_out);

        let eps = 1e-6;
        let orig = layer.weights[[1, 2]];
        layer.weights[[1, 2]] = orig + eps;
        let plus = layer.forward(&x).sum();
        layer.weights[[1, 2]] = orig - eps;
        let minus = layer.forward(&x).sum();
        layer.weights[[1, 2]] = orig;
        assert_relative_eq!(
            grads.weights[[1, 2]],
            (plus - minus) / (2.0 * eps),
            max_relative = 1e-6
        );

        // d_input = W^T d_out = column sums of W
        for j in 0..3 {
            let expected = layer.weights[[0, j]] + layer.weights[[1, j]];
            assert_relative_eq!(d_input[j], expected, max_relative = 1e-12);
        }
    }
}
