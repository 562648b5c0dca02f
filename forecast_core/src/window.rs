//! Sliding-window sequence construction
//!
//! Slices a preprocessed feature matrix into fixed-length windows with
//! aligned targets: a scalar remaining-life target for RUL, a multi-month
//! vector target for demand. Too few rows yields zero windows rather than an
//! error; callers decide whether that makes training infeasible.

use crate::error::{ForecastError, Result};
use ndarray::{s, Array1, Array2};

/// Build RUL training windows
///
/// Produces `max(0, N - W)` windows. The window starting at row `i` pairs
/// with the remaining life at row `i + W`, computed from the raw elapsed
/// series as `max(0, nominal_life - elapsed)`.
///
/// `elapsed` holds the unscaled elapsed-life feature aligned with the rows
/// of `features`.
pub fn rul_windows(
    features: &Array2<f64>,
    elapsed: &[f64],
    nominal_life: f64,
    window: usize,
) -> Result<(Vec<Array2<f64>>, Vec<Array1<f64>>)> {
    if elapsed.len() != features.nrows() {
        return Err(ForecastError::InvalidInput(format!(
            "elapsed series has {} entries for {} rows",
            elapsed.len(),
            features.nrows()
        )));
    }
    if window == 0 {
        return Err(ForecastError::InvalidInput(
            "window length must be at least 1".to_string(),
        ));
    }
    if nominal_life <= 0.0 {
        return Err(ForecastError::InvalidInput(format!(
            "nominal life must be positive, got {nominal_life}"
        )));
    }

    let count = features.nrows().saturating_sub(window);
    let mut windows = Vec::with_capacity(count);
    let mut targets = Vec::with_capacity(count);
    for i in 0..count {
        windows.push(features.slice(s![i..i + window, ..]).to_owned());
        let rul = (nominal_life - elapsed[i + window]).max(0.0);
        targets.push(Array1::from_vec(vec![rul]));
    }
    Ok((windows, targets))
}

/// Build demand training windows
///
/// Produces `max(0, N - W - M + 1)` windows. The window starting at row `i`
/// pairs with the `M` raw outbound quantities at rows `i + W .. i + W + M`.
pub fn demand_windows(
    features: &Array2<f64>,
    outbound: &[f64],
    window: usize,
    horizon: usize,
) -> Result<(Vec<Array2<f64>>, Vec<Array1<f64>>)> {
    if outbound.len() != features.nrows() {
        return Err(ForecastError::InvalidInput(format!(
            "outbound series has {} entries for {} rows",
            outbound.len(),
            features.nrows()
        )));
    }
    if window == 0 || horizon == 0 {
        return Err(ForecastError::InvalidInput(
            "window and horizon must be at least 1".to_string(),
        ));
    }

    let count = (features.nrows() + 1).saturating_sub(window + horizon);
    let mut windows = Vec::with_capacity(count);
    let mut targets = Vec::with_capacity(count);
    for i in 0..count {
        windows.push(features.slice(s![i..i + window, ..]).to_owned());
        targets.push(Array1::from_vec(
            outbound[i + window..i + window + horizon].to_vec(),
        ));
    }
    Ok((windows, targets))
}

/// Latest inference window, zero-padded at the head when rows are short
///
/// Scaled features live in [0, 1], so padding rows of zeros read as
/// minimum-range observations preceding the real data.
pub fn latest_window(features: &Array2<f64>, window: usize) -> Array2<f64> {
    let rows = features.nrows();
    if rows >= window {
        return features.slice(s![rows - window.., ..]).to_owned();
    }

    let mut padded = Array2::zeros((window, features.ncols()));
    padded
        .slice_mut(s![window - rows.., ..])
        .assign(&features.view());
    padded
}
