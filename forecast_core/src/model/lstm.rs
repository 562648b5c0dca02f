//! Single LSTM layer with backpropagation through time.
//!
//! Gate blocks inside the stacked weight matrices follow the conventional
//! order: input, forget, cell candidate, output. The forget-gate bias block
//! starts at 1.0 so early training does not flush cell state.

use ndarray::{s, Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::outer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LstmLayer {
    /// Input-to-hidden weights, shape `(4 * hidden, input)`.
    w_ih: Array2<f64>,
    /// Hidden-to-hidden weights, shape `(4 * hidden, hidden)`.
    w_hh: Array2<f64>,
    /// Stacked gate biases, shape `(4 * hidden,)`.
    bias: Array1<f64>,
    input_size: usize,
    hidden_size: usize,
}

/// Everything the backward pass needs about one timestep.
#[derive(Debug, Clone)]
pub(crate) struct LstmStep {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

/// Forward-pass record: hidden states per timestep plus the per-step cache.
#[derive(Debug, Clone)]
pub(crate) struct LstmRun {
    pub outputs: Vec<Array1<f64>>,
    steps: Vec<LstmStep>,
}

/// Accumulated weight gradients for one layer.
#[derive(Debug, Clone)]
pub(crate) struct LstmGrads {
    pub w_ih: Array2<f64>,
    pub w_hh: Array2<f64>,
    pub bias: Array1<f64>,
}

impl LstmGrads {
    pub fn zeros(input_size: usize, hidden_size: usize) -> Self {
        Self {
            w_ih: Array2::zeros((4 * hidden_size, input_size)),
            w_hh: Array2::zeros((4 * hidden_size, hidden_size)),
            bias: Array1::zeros(4 * hidden_size),
        }
    }

    pub fn add(&mut self, other: &LstmGrads) {
        self.w_ih += &other.w_ih;
        self.w_hh += &other.w_hh;
        self.bias += &other.bias;
    }

    pub fn scale(&mut self, factor: f64) {
        self.w_ih *= factor;
        self.w_hh *= factor;
        self.bias *= factor;
    }

    pub fn views(&self) -> Vec<ArrayViewD<f64>> {
        vec![
            self.w_ih.view().into_dyn(),
            self.w_hh.view().into_dyn(),
            self.bias.view().into_dyn(),
        ]
    }
}

impl LstmLayer {
    /// Glorot-uniform initialisation from a seeded RNG.
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let spread_ih = (6.0 / (input_size + hidden_size) as f64).sqrt();
        let spread_hh = (6.0 / (2 * hidden_size) as f64).sqrt();
        let w_ih = Array2::from_shape_fn((4 * hidden_size, input_size), |_| {
            rng.gen_range(-spread_ih..spread_ih)
        });
        let w_hh = Array2::from_shape_fn((4 * hidden_size, hidden_size), |_| {
            rng.gen_range(-spread_hh..spread_hh)
        });
        let mut bias = Array1::zeros(4 * hidden_size);
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);
        Self {
            w_ih,
            w_hh,
            bias,
            input_size,
            hidden_size,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Runs the layer over a full sequence from zeroed initial state.
    pub fn forward(&self, inputs: &[Array1<f64>]) -> LstmRun {
        let hidden = self.hidden_size;
        let mut h: Array1<f64> = Array1::zeros(hidden);
        let mut c: Array1<f64> = Array1::zeros(hidden);
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = self.w_ih.dot(x) + self.w_hh.dot(&h) + &self.bias;
            let i = z.slice(s![..hidden]).mapv(sigmoid);
            let f = z.slice(s![hidden..2 * hidden]).mapv(sigmoid);
            let g = z.slice(s![2 * hidden..3 * hidden]).mapv(f64::tanh);
            let o = z.slice(s![3 * hidden..]).mapv(sigmoid);
            let c_new = &f * &c + &i * &g;
            let tanh_c = c_new.mapv(f64::tanh);
            let h_new = &o * &tanh_c;

            steps.push(LstmStep {
                x: x.clone(),
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                tanh_c,
            });
            h = h_new.clone();
            c = c_new;
            outputs.push(h_new);
        }

        LstmRun { outputs, steps }
    }

    /// Backpropagation through time. `d_outputs[t]` is the loss gradient with
    /// respect to the hidden state emitted at step `t`. Returns the weight
    /// gradients and the gradient with respect to each input vector.
    pub fn backward(&self, run: &LstmRun, d_outputs: &[Array1<f64>]) -> (LstmGrads, Vec<Array1<f64>>) {
        let hidden = self.hidden_size;
        let mut grads = LstmGrads::zeros(self.input_size, hidden);
        let mut d_inputs = vec![Array1::zeros(self.input_size); run.steps.len()];
        let mut dh_next: Array1<f64> = Array1::zeros(hidden);
        let mut dc_next: Array1<f64> = Array1::zeros(hidden);

        for (t, step) in run.steps.iter().enumerate().rev() {
            let dh = &d_outputs[t] + &dh_next;
            let dc = &dh * &step.o * &step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;

            let d_o = &dh * &step.tanh_c;
            let d_i = &dc * &step.g;
            let d_f = &dc * &step.c_prev;
            let d_g = &dc * &step.i;

            // Back through the gate nonlinearities to the pre-activations.
            let da_i = d_i * step.i.mapv(|v| v * (1.0 - v));
            let da_f = d_f * step.f.mapv(|v| v * (1.0 - v));
            let da_g = d_g * step.g.mapv(|v| 1.0 - v * v);
            let da_o = d_o * step.o.mapv(|v| v * (1.0 - v));

            let mut da: Array1<f64> = Array1::zeros(4 * hidden);
            da.slice_mut(s![..hidden]).assign(&da_i);
            da.slice_mut(s![hidden..2 * hidden]).assign(&da_f);
            da.slice_mut(s![2 * hidden..3 * hidden]).assign(&da_g);
            da.slice_mut(s![3 * hidden..]).assign(&da_o);

            grads.w_ih += &outer(&da, &step.x);
            grads.w_hh += &outer(&da, &step.h_prev);
            grads.bias += &da;

            d_inputs[t] = self.w_ih.t().dot(&da);
            dh_next = self.w_hh.t().dot(&da);
            dc_next = dc * &step.f;
        }

        (grads, d_inputs)
    }

    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<f64>> {
        vec![
            self.w_ih.view_mut().into_dyn(),
            self.w_hh.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn sample_inputs(steps: usize, width: usize) -> Vec<Array1<f64>> {
        (0..steps)
            .map(|t| Array1::from_shape_fn(width, |j| 0.3 * t as f64 - 0.2 * j as f64 + 0.1))
            .collect()
    }

    /// Sum of all hidden activations over the sequence, used as a scalar loss
    /// for numerical gradient checks.
    fn summed_output(layer: &LstmLayer, inputs: &[Array1<f64>]) -> f64 {
        layer
            .forward(inputs)
            .outputs
            .iter()
            .map(|h| h.sum())
            .sum()
    }

    #[test]
    fn test_forward_shapes_and_determinism() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = LstmLayer::new(4, 6, &mut rng);
        let inputs = sample_inputs(5, 4);

        let first = layer.forward(&inputs);
        let second = layer.forward(&inputs);
        assert_eq!(first.outputs.len(), 5);
        assert_eq!(first.outputs[0].len(), 6);
        assert_eq!(first.outputs[4], second.outputs[4]);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let mut rng_a = StdRng::seed_from_u64(11);
        let mut rng_b = StdRng::seed_from_u64(11);
        let layer_a = LstmLayer::new(3, 5, &mut rng_a);
        let layer_b = LstmLayer::new(3, 5, &mut rng_b);
        assert_eq!(layer_a.w_ih, layer_b.w_ih);
        assert_eq!(layer_a.w_hh, layer_b.w_hh);
    }

    #[test]
    fn test_forget_bias_initialised_to_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer = LstmLayer::new(2, 4, &mut rng);
        for j in 4..8 {
            assert_relative_eq!(layer.bias[j], 1.0);
        }
        for j in 0..4 {
            assert_relative_eq!(layer.bias[j], 0.0);
        }
    }

    #[test]
    fn test_backward_matches_numerical_gradient_w_ih() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layer = LstmLayer::new(2, 3, &mut rng);
        let inputs = sample_inputs(4, 2);

        let run = layer.forward(&inputs);
        let d_outputs: Vec<Array1<f64>> = run.outputs.iter().map(|_| Array1::ones(3)).collect();
        let (grads, _) = layer.backward(&run, &d_outputs);

        let eps = 1e-5;
        for &(row, col) in &[(0usize, 0usize), (5, 1), (11, 0)] {
            let orig = layer.w_ih[[row, col]];
            layer.w_ih[[row, col]] = orig + eps;
            let plus = summed_output(&layer, &inputs);
            layer.w_ih[[row, col]] = orig - eps;
            let minus = summed_output(&layer, &inputs);
            layer.w_ih[[row, col]] = orig;

            let numeric = (plus - minus) / (2.0 * eps);
            assert_relative_eq!(grads.w_ih[[row, col]], numeric, epsilon = 1e-7, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_backward_matches_numerical_gradient_w_hh_and_bias() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut layer = LstmLayer::new(2, 3, &mut rng);
        let inputs = sample_inputs(5, 2);

        let run = layer.forward(&inputs);
        let d_outputs: Vec<Array1<f64>> = run.outputs.iter().map(|_| Array1::ones(3)).collect();
        let (grads, _) = layer.backward(&run, &d_outputs);

        let eps = 1e-5;
        for &(row, col) in &[(1usize, 0usize), (7, 2), (10, 1)] {
            let orig = layer.w_hh[[row, col]];
            layer.w_hh[[row, col]] = orig + eps;
            let plus = summed_output(&layer, &inputs);
            layer.w_hh[[row, col]] = orig - eps;
            let minus = summed_output(&layer, &inputs);
            layer.w_hh[[row, col]] = orig;

            let numeric = (plus - minus) / (2.0 * eps);
            assert_relative_eq!(grads.w_hh[[row, col]], numeric, epsilon = 1e-7, max_relative = 1e-4);
        }

        for &j in &[0usize, 4, 9] {
            let orig = layer.bias[j];
            layer.bias[j] = orig + eps;
            let plus = summed_output(&layer, &inputs);
            layer.bias[j] = orig - eps;
            let minus = summed_output(&layer, &inputs);
            layer.bias[j] = orig;

            let numeric = (plus - minus) / (2.0 * eps);
            assert_relative_eq!(grads.bias[j], numeric, epsilon = 1e-7, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_backward_input_gradient_is_numerically_correct() {
        let mut rng = StdRng::seed_from_u64(9);
        let layer = LstmLayer::new(3, 4, &mut rng);
        let mut inputs = sample_inputs(3, 3);

        let run = layer.forward(&inputs);
        let d_outputs: Vec<Array1<f64>> = run.outputs.iter().map(|_| Array1::ones(4)).collect();
        let (_, d_inputs) = layer.backward(&run, &d_outputs);

        let eps = 1e-5;
        let orig = inputs[1][2];
        inputs[1][2] = orig + eps;
        let plus = summed_output(&layer, &inputs);
        inputs[1][2] = orig - eps;
        let minus = summed_output(&layer, &inputs);
        inputs[1][2] = orig;

        let numeric = (plus - minus) / (2.0 * eps);
        assert_relative_eq!(d_inputs[1][2], numeric, epsilon = 1e-7, max_relative = 1e-4);
    }
}
