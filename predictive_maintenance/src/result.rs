//! Forecast result types.

use chrono::{DateTime, Utc};
use forecast_core::{Attribution, DataQuality, PredictionInterval, Strategy};
use serde::{Deserialize, Serialize};

use crate::alert::MaintenanceAlert;

/// Completed remaining-useful-life forecast for one part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulForecast {
    pub part_id: String,
    /// Point estimate of remaining useful life in operating hours.
    pub predicted_rul_hours: f64,
    /// 95% band around the point estimate.
    pub interval: PredictionInterval,
    /// How much real data backed this answer.
    pub quality: DataQuality,
    /// Which path produced the number.
    pub strategy: Strategy,
    pub alert: MaintenanceAlert,
    /// Ranked feature contributions, or the reason none are available.
    pub attribution: Attribution,
    pub generated_at: DateTime<Utc>,
}

impl RulForecast {
    /// Lower edge of the 95% band, clamped at zero by construction.
    pub fn lower_bound_hours(&self) -> f64 {
        self.interval.lower.first().copied().unwrap_or(0.0)
    }

    pub fn upper_bound_hours(&self) -> f64 {
        self.interval.upper.first().copied().unwrap_or(0.0)
    }
}
