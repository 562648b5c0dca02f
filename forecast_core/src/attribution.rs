//! Feature attribution for sequence predictions.
//!
//! Shapley values are estimated in the kernel style: coalitions of flattened
//! window cells are sampled, absent cells are filled from a weighted
//! background distribution, and a weighted least-squares fit under the
//! efficiency constraint recovers per-cell contributions. Cell values are
//! then folded back to per-feature scores (mean absolute contribution across
//! the window, signed by the final timestep).
//!
//! The background is summarised to k-means centroids so it stays small
//! enough to persist next to the model weights.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::index::sample as index_sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use tracing::debug;

use crate::config::AttributionConfig;
use crate::error::{ForecastError, Result};
use crate::model::SequenceRegressor;

/// Direction a feature pushed the prediction, read at the most recent
/// timestep of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increases,
    Decreases,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Increases => write!(f, "increases"),
            Direction::Decreases => write!(f, "decreases"),
        }
    }
}

/// One ranked entry of an explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Mean absolute Shapley value across the window, in output units.
    pub magnitude: f64,
    pub direction: Direction,
}

/// Outcome of an explanation request. Attribution failures never fail the
/// forecast that carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribution {
    Ranked(Vec<FeatureContribution>),
    Unavailable { reason: String },
}

/// Estimates Shapley-style contributions against a fixed background.
pub struct KernelExplainer<'a> {
    network: &'a SequenceRegressor,
    background: Array2<f64>,
    weights: Vec<f64>,
    window_shape: (usize, usize),
    config: AttributionConfig,
}

impl<'a> KernelExplainer<'a> {
    /// Builds an explainer by summarising raw background windows.
    pub fn new(
        network: &'a SequenceRegressor,
        background_windows: &[Array2<f64>],
        window_shape: (usize, usize),
        config: AttributionConfig,
        seed: u64,
    ) -> Self {
        let capped: Vec<&Array2<f64>> = background_windows
            .iter()
            .rev()
            .take(config.background_cap)
            .collect();
        let flats: Vec<Array1<f64>> = capped.iter().map(|w| flatten(w)).collect();
        let (background, weights) = summarize_points(&flats, config.summary_points, seed);
        Self {
            network,
            background,
            weights,
            window_shape,
            config,
        }
    }

    /// Rebuilds an explainer from persisted centroids.
    pub fn from_centroids(
        network: &'a SequenceRegressor,
        background: Array2<f64>,
        weights: Vec<f64>,
        window_shape: (usize, usize),
        config: AttributionConfig,
    ) -> Self {
        Self {
            network,
            background,
            weights,
            window_shape,
            config,
        }
    }

    pub fn background(&self) -> (&Array2<f64>, &[f64]) {
        (&self.background, &self.weights)
    }

    /// Explains one scaled window. Failures come back as
    /// [`Attribution::Unavailable`] rather than an error.
    pub fn explain(&self, window: &Array2<f64>, feature_names: &[String], seed: u64) -> Attribution {
        match self.ranked(window, feature_names, seed) {
            Ok(contributions) => Attribution::Ranked(contributions),
            Err(err) => {
                debug!(reason = %err, "attribution unavailable");
                Attribution::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn ranked(
        &self,
        window: &Array2<f64>,
        feature_names: &[String],
        seed: u64,
    ) -> Result<Vec<FeatureContribution>> {
        let (rows, cols) = self.window_shape;
        if window.dim() != self.window_shape {
            return Err(ForecastError::Attribution(format!(
                "window is {:?}, explainer expects {:?}",
                window.dim(),
                self.window_shape
            )));
        }
        if feature_names.len() != cols {
            return Err(ForecastError::Attribution(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                cols
            )));
        }
        if self.background.nrows() == 0 {
            return Err(ForecastError::Attribution(
                "no background windows available".to_string(),
            ));
        }

        let x = flatten(window);
        let mut rng = StdRng::seed_from_u64(seed);
        let eval = |flat: &Array1<f64>| -> f64 { self.scalar_output(flat) };
        let phi = shapley_flat(
            &eval,
            &x,
            &self.background,
            &self.weights,
            self.config.coalition_samples,
            &mut rng,
        )?;

        // Fold cell contributions back onto named features.
        let mut contributions: Vec<FeatureContribution> = (0..cols)
            .map(|feature_idx| {
                let mut total = 0.0;
                for t in 0..rows {
                    total += phi[t * cols + feature_idx].abs();
                }
                let latest = phi[(rows - 1) * cols + feature_idx];
                FeatureContribution {
                    feature: feature_names[feature_idx].clone(),
                    magnitude: total / rows as f64,
                    direction: if latest >= 0.0 {
                        Direction::Increases
                    } else {
                        Direction::Decreases
                    },
                }
            })
            .collect();

        contributions.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        contributions.truncate(self.config.top_k);
        Ok(contributions)
    }

    /// Collapses the network output to the scalar being explained.
    fn scalar_output(&self, flat: &Array1<f64>) -> f64 {
        let (rows, cols) = self.window_shape;
        let window = Array2::from_shape_vec((rows, cols), flat.to_vec())
            .unwrap_or_else(|_| Array2::zeros((rows, cols)));
        let y = self.network.predict(&window);
        if y.len() == 1 {
            y[0]
        } else {
            y.sum()
        }
    }
}

/// Flattens a window row-major: timestep-by-timestep, features within each.
fn flatten(window: &Array2<f64>) -> Array1<f64> {
    Array1::from_iter(window.iter().copied())
}

/// Summarises flattened points to at most `k` weighted centroids.
///
/// With `k` or fewer points the points themselves become the background with
/// uniform weights; otherwise a short Lloyd iteration clusters them and the
/// normalised cluster sizes become the weights.
pub fn summarize_background(
    windows: &[Array2<f64>],
    k: usize,
    seed: u64,
) -> (Array2<f64>, Vec<f64>) {
    let flats: Vec<Array1<f64>> = windows.iter().map(flatten).collect();
    summarize_points(&flats, k, seed)
}

fn summarize_points(points: &[Array1<f64>], k: usize, seed: u64) -> (Array2<f64>, Vec<f64>) {
    if points.is_empty() {
        return (Array2::zeros((0, 0)), Vec::new());
    }
    let dims = points[0].len();
    let n = points.len();

    if n <= k || k == 0 {
        let mut background = Array2::zeros((n, dims));
        for (i, p) in points.iter().enumerate() {
            background.row_mut(i).assign(p);
        }
        return (background, vec![1.0 / n as f64; n]);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids: Vec<Array1<f64>> = index_sample(&mut rng, n, k)
        .into_iter()
        .map(|i| points[i].clone())
        .collect();
    let mut assignment = vec![0usize; n];

    for _ in 0..10 {
        let mut moved = false;
        for (i, point) in points.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(point, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            if assignment[i] != best {
                assignment[i] = best;
                moved = true;
            }
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Array1<f64>> = points
                .iter()
                .zip(assignment.iter())
                .filter(|(_, &a)| a == c)
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut mean = Array1::zeros(dims);
            for member in &members {
                mean += *member;
            }
            centroid.assign(&(mean / members.len() as f64));
        }

        if !moved {
            break;
        }
    }

    let mut counts = vec![0usize; k];
    for &a in &assignment {
        counts[a] += 1;
    }
    let mut background = Array2::zeros((k, dims));
    for (c, centroid) in centroids.iter().enumerate() {
        background.row_mut(c).assign(centroid);
    }
    let weights = counts.iter().map(|&c| c as f64 / n as f64).collect();
    (background, weights)
}

fn squared_distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

/// Core kernel estimator over flattened inputs. `eval` must be deterministic.
fn shapley_flat(
    eval: &dyn Fn(&Array1<f64>) -> f64,
    x: &Array1<f64>,
    background: &Array2<f64>,
    weights: &[f64],
    coalition_samples: usize,
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    let dims = x.len();
    if dims < 2 {
        return Err(ForecastError::Attribution(
            "attribution needs at least two flattened inputs".to_string(),
        ));
    }
    if background.ncols() != dims {
        return Err(ForecastError::Attribution(format!(
            "background has {} columns, input has {}",
            background.ncols(),
            dims
        )));
    }

    // Base value: weighted expectation of the model over the background.
    let mut base = 0.0;
    for (i, w) in weights.iter().enumerate() {
        base += w * eval(&background.row(i).to_owned());
    }
    let fx = eval(x);

    // Sample coalitions, evaluate them against one background draw each and
    // record the Shapley kernel weight for the coalition size.
    let mut rows: Vec<(Vec<bool>, f64, f64)> = Vec::with_capacity(coalition_samples);
    let ln_dims_minus_one = ((dims - 1) as f64).ln();
    let mut max_kernel = f64::MIN;
    for _ in 0..coalition_samples {
        let size = rng.gen_range(1..dims);
        let mut present = vec![false; dims];
        for idx in index_sample(rng, dims, size) {
            present[idx] = true;
        }

        let b_idx = sample_weighted(weights, rng);
        let mut masked = background.row(b_idx).to_owned();
        for (j, &keep) in present.iter().enumerate() {
            if keep {
                masked[j] = x[j];
            }
        }
        let value = eval(&masked);

        let ln_binom = ln_gamma(dims as f64 + 1.0)
            - ln_gamma(size as f64 + 1.0)
            - ln_gamma((dims - size) as f64 + 1.0);
        let ln_kernel =
            ln_dims_minus_one - ln_binom - (size as f64).ln() - ((dims - size) as f64).ln();
        max_kernel = max_kernel.max(ln_kernel);
        rows.push((present, value, ln_kernel));
    }

    // Constrained weighted least squares: the last cell is eliminated via
    // the efficiency constraint sum(phi) = f(x) - base, leaving dims - 1
    // unknowns.
    let unknowns = dims - 1;
    let mut a = Array2::<f64>::zeros((unknowns, unknowns));
    let mut b = Array1::<f64>::zeros(unknowns);
    for (present, value, ln_kernel) in &rows {
        let kernel = (ln_kernel - max_kernel).exp();
        let last = if present[dims - 1] { 1.0 } else { 0.0 };
        let design: Vec<f64> = (0..unknowns)
            .map(|j| (if present[j] { 1.0 } else { 0.0 }) - last)
            .collect();
        let target = value - base - last * (fx - base);

        for (r, &dr) in design.iter().enumerate() {
            if dr == 0.0 {
                continue;
            }
            b[r] += kernel * dr * target;
            for (c, &dc) in design.iter().enumerate() {
                if dc != 0.0 {
                    a[[r, c]] += kernel * dr * dc;
                }
            }
        }
    }

    // Small ridge keeps the system solvable when sampled coalitions alias.
    let trace: f64 = (0..unknowns).map(|i| a[[i, i]]).sum();
    let ridge = 1e-8 * (trace / unknowns as f64).max(1e-4);
    for i in 0..unknowns {
        a[[i, i]] += ridge;
    }

    let head = solve(a, b)?;
    let mut phi = head.to_vec();
    let tail = (fx - base) - phi.iter().sum::<f64>();
    phi.push(tail);
    Ok(phi)
}

fn sample_weighted(weights: &[f64], rng: &mut StdRng) -> usize {
    let u: f64 = rng.gen();
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if u < acc {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let mut pivot = col;
        for row in (col + 1)..n {
            if a[[row, col]].abs() > a[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(ForecastError::Attribution(
                "singular attribution system".to_string(),
            ));
        }
        if pivot != col {
            for j in 0..n {
                let tmp = a[[col, j]];
                a[[col, j]] = a[[pivot, j]];
                a[[pivot, j]] = tmp;
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for j in (row + 1)..n {
            sum -= a[[row, j]] * x[j];
        }
        x[row] = sum / a[[row, row]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_solver_recovers_known_solution() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![5.0, 10.0];
        let x = solve(a, b).unwrap();
        // 2x + y = 5, x + 3y = 10 -> x = 1, y = 3
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solver_rejects_singular_system() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(solve(a, b).is_err());
    }

    #[test]
    fn test_linear_function_recovers_exact_shapley_values() {
        // For f(z) = 2 z0 - 3 z1 + 0.5 z2 + 1 with a single background
        // point, the exact Shapley value of cell j is coef_j * (x_j - b_j).
        let f = |z: &Array1<f64>| 2.0 * z[0] - 3.0 * z[1] + 0.5 * z[2] + 1.0;
        let x = array![1.0, 2.0, -1.0, 4.0];
        let background = array![[0.0, 1.0, 1.0, 4.0]];
        let weights = vec![1.0];
        let mut rng = StdRng::seed_from_u64(5);

        let phi = shapley_flat(&f, &x, &background, &weights, 300, &mut rng).unwrap();
        assert_relative_eq!(phi[0], 2.0 * (1.0 - 0.0), epsilon = 1e-4);
        assert_relative_eq!(phi[1], -3.0 * (2.0 - 1.0), epsilon = 1e-4);
        assert_relative_eq!(phi[2], 0.5 * (-1.0 - 1.0), epsilon = 1e-4);
        // z3 has zero coefficient and identical background value.
        assert_relative_eq!(phi[3], 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_shapley_values_satisfy_efficiency() {
        let f = |z: &Array1<f64>| z[0] * z[1] + 0.3 * z[2];
        let x = array![1.5, 2.0, 1.0];
        let background = array![[0.5, 0.5, 0.0]];
        let weights = vec![1.0];
        let mut rng = StdRng::seed_from_u64(9);

        let phi = shapley_flat(&f, &x, &background, &weights, 200, &mut rng).unwrap();
        let base = f(&array![0.5, 0.5, 0.0]);
        let total: f64 = phi.iter().sum();
        assert_relative_eq!(total, f(&x) - base, epsilon = 1e-8);
    }

    #[test]
    fn test_summarize_keeps_small_sets_verbatim() {
        let windows = vec![array![[1.0, 2.0]], array![[3.0, 4.0]]];
        let (background, weights) = summarize_background(&windows, 10, 1);

        assert_eq!(background.nrows(), 2);
        assert_eq!(background.row(0).to_vec(), vec![1.0, 2.0]);
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_summarize_clusters_large_sets() {
        let windows: Vec<Array2<f64>> = (0..40)
            .map(|i| {
                // Two well-separated blobs, every point distinct.
                let offset = if i % 2 == 0 { 0.0 } else { 100.0 };
                array![[offset + i as f64 * 0.1, offset + 1.0]]
            })
            .collect();
        let (background, weights) = summarize_background(&windows, 2, 7);

        assert_eq!(background.nrows(), 2);
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        // One centroid per blob.
        let mut firsts: Vec<f64> = background.column(0).to_vec();
        firsts.sort_by(f64::total_cmp);
        assert!(firsts[0] < 10.0);
        assert!(firsts[1] > 90.0);
    }

    fn explainer_fixture() -> (SequenceRegressor, Vec<Array2<f64>>) {
        let config = NetworkConfig {
            hidden1: 6,
            hidden2: 4,
            dense_units: 3,
            dropout: 0.2,
            output_len: 1,
            output_relu: false,
        };
        let mut rng = StdRng::seed_from_u64(17);
        let network = SequenceRegressor::new(&config, 3, &mut rng);
        let windows: Vec<Array2<f64>> = (0..12)
            .map(|i| {
                Array2::from_shape_fn((4, 3), |(r, c)| {
                    (i as f64 * 0.05 + r as f64 * 0.1 + c as f64 * 0.2).fract()
                })
            })
            .collect();
        (network, windows)
    }

    fn attribution_config() -> AttributionConfig {
        AttributionConfig {
            background_cap: 50,
            summary_points: 5,
            coalition_samples: 120,
            top_k: 2,
        }
    }

    #[test]
    fn test_explain_returns_ranked_top_k() {
        let (network, windows) = explainer_fixture();
        let explainer =
            KernelExplainer::new(&network, &windows, (4, 3), attribution_config(), 3);
        let names: Vec<String> = ["temp", "vib", "load"].iter().map(|s| s.to_string()).collect();

        let attribution = explainer.explain(&windows[0], &names, 11);
        match attribution {
            Attribution::Ranked(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(entries[0].magnitude >= entries[1].magnitude);
                assert!(names.contains(&entries[0].feature));
            }
            Attribution::Unavailable { reason } => panic!("unexpected: {reason}"),
        }
    }

    #[test]
    fn test_explain_is_deterministic_per_seed() {
        let (network, windows) = explainer_fixture();
        let explainer =
            KernelExplainer::new(&network, &windows, (4, 3), attribution_config(), 3);
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let first = explainer.explain(&windows[1], &names, 21);
        let second = explainer.explain(&windows[1], &names, 21);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_background_reports_unavailable() {
        let (network, _) = explainer_fixture();
        let explainer = KernelExplainer::new(&network, &[], (4, 3), attribution_config(), 3);
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let window = Array2::zeros((4, 3));
        match explainer.explain(&window, &names, 1) {
            Attribution::Unavailable { .. } => {}
            Attribution::Ranked(_) => panic!("expected unavailable"),
        }
    }

    #[test]
    fn test_shape_mismatch_reports_unavailable() {
        let (network, windows) = explainer_fixture();
        let explainer =
            KernelExplainer::new(&network, &windows, (4, 3), attribution_config(), 3);
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        match explainer.explain(&Array2::zeros((2, 3)), &names, 1) {
            Attribution::Unavailable { .. } => {}
            Attribution::Ranked(_) => panic!("expected unavailable"),
        }
    }
}
