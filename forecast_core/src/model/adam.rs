//! Adam optimiser over a flat list of parameter tensors.
//!
//! Moment buffers are allocated lazily from the first gradient shapes, so the
//! optimiser does not need to know the network layout up front. The learning
//! rate is mutable to support plateau-driven decay during training.

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step_count: usize,
    m: Vec<ArrayD<f64>>,
    v: Vec<ArrayD<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step_count: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    /// Applies one update. `params` and `grads` must line up index by index
    /// and keep a stable order across calls.
    pub fn step(&mut self, params: &mut [ArrayViewMutD<f64>], grads: &[ArrayViewD<f64>]) {
        if self.m.len() != grads.len() {
            self.m = grads.iter().map(|g| ArrayD::zeros(g.raw_dim())).collect();
            self.v = grads.iter().map(|g| ArrayD::zeros(g.raw_dim())).collect();
        }

        self.step_count += 1;
        let bc1 = 1.0 - self.beta1.powi(self.step_count as i32);
        let bc2 = 1.0 - self.beta2.powi(self.step_count as i32);
        let (beta1, beta2) = (self.beta1, self.beta2);
        let (lr, eps) = (self.learning_rate, self.epsilon);

        for (((param, grad), m), v) in params
            .iter_mut()
            .zip(grads.iter())
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            Zip::from(&mut *m)
                .and(grad)
                .for_each(|m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
            Zip::from(&mut *v)
                .and(grad)
                .for_each(|v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);
            Zip::from(param)
                .and(&*m)
                .and(&*v)
                .for_each(|p, &m, &v| {
                    let m_hat = m / bc1;
                    let v_hat = v / bc2;
                    *p -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
    }
}
