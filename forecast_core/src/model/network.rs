//! Two-layer LSTM regressor with a dense head.
//!
//! Layout: LSTM over the full window, inverted dropout on every hidden state,
//! a second LSTM reduced to its final hidden state, dropout again, a ReLU
//! dense layer and a linear output (rectified for quantity targets). Dropout
//! masks come from a caller-owned RNG so stochastic inference can reuse the
//! training-time noise.

use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::dense::{DenseGrads, DenseLayer};
use super::lstm::{LstmGrads, LstmLayer, LstmRun};
use crate::config::NetworkConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRegressor {
    lstm1: LstmLayer,
    lstm2: LstmLayer,
    hidden: DenseLayer,
    output: DenseLayer,
    dropout: f64,
    output_relu: bool,
}

/// Dropout masks for one forward pass. Identity masks make the pass
/// deterministic.
#[derive(Debug, Clone)]
struct Masks {
    seq: Vec<Array1<f64>>,
    head: Array1<f64>,
}

/// Cached activations for one training forward pass.
#[derive(Debug, Clone)]
pub struct NetTrace {
    run1: LstmRun,
    run2: LstmRun,
    masks: Masks,
    head_input: Array1<f64>,
    dense_pre: Array1<f64>,
    dense_act: Array1<f64>,
    y_pre: Array1<f64>,
}

/// Gradients for every tensor in the network, in [`SequenceRegressor::params_mut`] order.
#[derive(Debug, Clone)]
pub struct NetGrads {
    lstm1: LstmGrads,
    lstm2: LstmGrads,
    hidden: DenseGrads,
    output: DenseGrads,
}

impl NetGrads {
    pub fn zeros_like(net: &SequenceRegressor) -> Self {
        Self {
            lstm1: LstmGrads::zeros(net.lstm1.input_size(), net.lstm1.hidden_size()),
            lstm2: LstmGrads::zeros(net.lstm2.input_size(), net.lstm2.hidden_size()),
            hidden: DenseGrads::zeros(net.hidden.input_size(), net.hidden.output_size()),
            output: DenseGrads::zeros(net.output.input_size(), net.output.output_size()),
        }
    }

    pub fn add(&mut self, other: &NetGrads) {
        self.lstm1.add(&other.lstm1);
        self.lstm2.add(&other.lstm2);
        self.hidden.add(&other.hidden);
        self.output.add(&other.output);
    }

    pub fn scale(&mut self, factor: f64) {
        self.lstm1.scale(factor);
        self.lstm2.scale(factor);
        self.hidden.scale(factor);
        self.output.scale(factor);
    }

    /// Read views in the same order as [`SequenceRegressor::params_mut`].
    pub fn views(&self) -> Vec<ArrayViewD<f64>> {
        let mut views = self.lstm1.views();
        views.extend(self.lstm2.views());
        views.extend(self.hidden.views());
        views.extend(self.output.views());
        views
    }
}

impl SequenceRegressor {
    pub fn new(config: &NetworkConfig, input_size: usize, rng: &mut StdRng) -> Self {
        Self {
            lstm1: LstmLayer::new(input_size, config.hidden1, rng),
            lstm2: LstmLayer::new(config.hidden1, config.hidden2, rng),
            hidden: DenseLayer::new(config.hidden2, config.dense_units, rng),
            output: DenseLayer::new(config.dense_units, config.output_len, rng),
            dropout: config.dropout,
            output_relu: config.output_relu,
        }
    }

    pub fn input_size(&self) -> usize {
        self.lstm1.input_size()
    }

    pub fn output_len(&self) -> usize {
        self.output.output_size()
    }

    /// Deterministic prediction with dropout disabled.
    pub fn predict(&self, window: &Array2<f64>) -> Array1<f64> {
        let masks = self.identity_masks(window.nrows());
        self.run(window, masks).0
    }

    /// Prediction with dropout left active; repeated calls with an advancing
    /// RNG sample the model's predictive distribution.
    pub fn predict_stochastic(&self, window: &Array2<f64>, rng: &mut StdRng) -> Array1<f64> {
        let masks = self.sampled_masks(window.nrows(), rng);
        self.run(window, masks).0
    }

    /// Forward pass with dropout active, keeping everything backward needs.
    pub fn forward_train(&self, window: &Array2<f64>, rng: &mut StdRng) -> (Array1<f64>, NetTrace) {
        let masks = self.sampled_masks(window.nrows(), rng);
        self.run(window, masks)
    }

    fn identity_masks(&self, steps: usize) -> Masks {
        Masks {
            seq: vec![Array1::ones(self.lstm1.hidden_size()); steps],
            head: Array1::ones(self.lstm2.hidden_size()),
        }
    }

    fn sampled_masks(&self, steps: usize, rng: &mut StdRng) -> Masks {
        Masks {
            seq: (0..steps)
                .map(|_| dropout_mask(self.lstm1.hidden_size(), self.dropout, rng))
                .collect(),
            head: dropout_mask(self.lstm2.hidden_size(), self.dropout, rng),
        }
    }

    fn run(&self, window: &Array2<f64>, masks: Masks) -> (Array1<f64>, NetTrace) {
        let inputs: Vec<Array1<f64>> = window.rows().into_iter().map(|r| r.to_owned()).collect();

        let run1 = self.lstm1.forward(&inputs);
        let dropped: Vec<Array1<f64>> = run1
            .outputs
            .iter()
            .zip(masks.seq.iter())
            .map(|(h, m)| h * m)
            .collect();

        let run2 = self.lstm2.forward(&dropped);
        let last = run2
            .outputs
            .last()
            .cloned()
            .unwrap_or_else(|| Array1::zeros(self.lstm2.hidden_size()));
        let head_input = &last * &masks.head;

        let dense_pre = self.hidden.forward(&head_input);
        let dense_act = dense_pre.mapv(relu);
        let y_pre = self.output.forward(&dense_act);
        let y = if self.output_relu {
            y_pre.mapv(relu)
        } else {
            y_pre.clone()
        };

        let trace = NetTrace {
            run1,
            run2,
            masks,
            head_input,
            dense_pre,
            dense_act,
            y_pre,
        };
        (y, trace)
    }

    /// Backpropagates a loss gradient on the output vector.
    pub fn backward(&self, trace: &NetTrace, d_output: &Array1<f64>) -> NetGrads {
        let d_y_pre = if self.output_relu {
            d_output * &trace.y_pre.mapv(relu_grad)
        } else {
            d_output.clone()
        };

        let (output_grads, d_dense_act) = self.output.backward(&trace.dense_act, &d_y_pre);
        let d_dense_pre = d_dense_act * trace.dense_pre.mapv(relu_grad);
        let (hidden_grads, d_head_input) = self.hidden.backward(&trace.head_input, &d_dense_pre);
        let d_last = d_head_input * &trace.masks.head;

        let steps = trace.masks.seq.len();
        let mut d_outputs2 = vec![Array1::zeros(self.lstm2.hidden_size()); steps];
        if steps > 0 {
            d_outputs2[steps - 1] = d_last;
        }
        let (lstm2_grads, d_dropped) = self.lstm2.backward(&trace.run2, &d_outputs2);

        let d_seq1: Vec<Array1<f64>> = d_dropped
            .iter()
            .zip(trace.masks.seq.iter())
            .map(|(d, m)| d * m)
            .collect();
        let (lstm1_grads, _) = self.lstm1.backward(&trace.run1, &d_seq1);

        NetGrads {
            lstm1: lstm1_grads,
            lstm2: lstm2_grads,
            hidden: hidden_grads,
            output: output_grads,
        }
    }

    /// Mutable views over every weight tensor, in a stable order matching
    /// [`NetGrads::views`].
    pub fn params_mut(&mut self) -> Vec<ArrayViewMutD<f64>> {
        let mut params = self.lstm1.params_mut();
        params.extend(self.lstm2.params_mut());
        params.extend(self.hidden.params_mut());
        params.extend(self.output.params_mut());
        params
    }
}

fn relu(v: f64) -> f64 {
    v.max(0.0)
}

fn relu_grad(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Inverted dropout: kept units are scaled by `1 / keep` so the expected
/// activation is unchanged.
fn dropout_mask(len: usize, rate: f64, rng: &mut StdRng) -> Array1<f64> {
    if rate <= 0.0 {
        return Array1::ones(len);
    }
    let keep = 1.0 - rate;
    Array1::from_shape_fn(len, |_| {
        if rng.gen::<f64>() < keep {
            1.0 / keep
        } else {
            0.0
        }
    })
}
