//! Feature preprocessing
//!
//! Missing values are forward-filled then mean-filled per feature, after
//! which a min-max transform maps every feature into [0, 1]. The transform
//! is fitted once on training data and reused verbatim at inference; values
//! outside the fitted range clip instead of erroring.

use crate::error::{ForecastError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Replace NaN cells in place, column by column
///
/// Each column is forward-filled from the last finite value, then remaining
/// gaps (leading NaNs) take the column mean. A column with no finite value
/// at all becomes zero.
pub fn fill_missing(data: &mut Array2<f64>) {
    let rows = data.nrows();
    for col in 0..data.ncols() {
        let mut last_seen = f64::NAN;
        for row in 0..rows {
            let value = data[[row, col]];
            if value.is_finite() {
                last_seen = value;
            } else if last_seen.is_finite() {
                data[[row, col]] = last_seen;
            }
        }

        let mut sum = 0.0;
        let mut count = 0usize;
        for row in 0..rows {
            let value = data[[row, col]];
            if value.is_finite() {
                sum += value;
                count += 1;
            }
        }
        let fallback = if count > 0 { sum / count as f64 } else { 0.0 };
        for row in 0..rows {
            if !data[[row, col]].is_finite() {
                data[[row, col]] = fallback;
            }
        }
    }
}

/// Fitted per-feature min-max mapping onto [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingTransform {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl ScalingTransform {
    /// Fit a transform from training data
    ///
    /// Call only on filled data; NaN cells make the fit fail.
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(ForecastError::InvalidInput(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }

        let mut mins = vec![f64::INFINITY; data.ncols()];
        let mut maxs = vec![f64::NEG_INFINITY; data.ncols()];
        for row in data.rows() {
            for (col, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ForecastError::InvalidInput(format!(
                        "non-finite value in feature column {col}"
                    )));
                }
                mins[col] = mins[col].min(value);
                maxs[col] = maxs[col].max(value);
            }
        }

        Ok(Self { mins, maxs })
    }

    /// Number of features the transform was fitted on
    pub fn feature_count(&self) -> usize {
        self.mins.len()
    }

    /// Map data into [0, 1] using the fitted ranges
    ///
    /// Values outside the fitted range clip to the boundary. A feature whose
    /// fitted range is a single point maps to 0.
    pub fn apply(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.feature_count() {
            return Err(ForecastError::InvalidInput(format!(
                "scaler fitted on {} features, data has {}",
                self.feature_count(),
                data.ncols()
            )));
        }

        let mut scaled = data.clone();
        for (col, mut column) in scaled.columns_mut().into_iter().enumerate() {
            let min = self.mins[col];
            let range = self.maxs[col] - min;
            for value in column.iter_mut() {
                *value = if range > 0.0 {
                    ((*value - min) / range).clamp(0.0, 1.0)
                } else {
                    0.0
                };
            }
        }
        Ok(scaled)
    }
}
