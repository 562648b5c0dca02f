//! Forecast and recommendation result types.

use chrono::{DateTime, Utc};
use forecast_core::{Attribution, DataQuality, PredictionInterval, Strategy};
use serde::{Deserialize, Serialize};

use crate::priority::DemandPriority;
use crate::purchase::PurchasePlan;
use crate::supplier::SupplierChoice;
use crate::ReplenishError;

/// Completed demand forecast for one part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandForecast {
    pub part_id: String,
    /// Point estimate per horizon month, in units.
    pub monthly_qty: Vec<f64>,
    /// Sum over the horizon.
    pub total_qty: f64,
    /// 95% band around the monthly estimates.
    pub interval: PredictionInterval,
    /// How much real data backed this answer.
    pub quality: DataQuality,
    /// Which path produced the numbers.
    pub strategy: Strategy,
    /// Ranked feature contributions, or the reason none are available.
    pub attribution: Attribution,
    pub generated_at: DateTime<Utc>,
}

/// Forecast plus the purchase recommendation built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentAdvice {
    pub forecast: DemandForecast,
    pub priority: DemandPriority,
    pub purchase: PurchasePlan,
    pub supplier: SupplierChoice,
    /// Units on hand when the plan was drawn up.
    pub current_stock: f64,
}

/// One entry of a batch run. A failed part keeps its error here instead of
/// aborting the parts around it.
#[derive(Debug)]
pub struct PartOutcome {
    pub part_id: String,
    pub result: Result<ReplenishmentAdvice, ReplenishError>,
}

impl PartOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The advice, `None` for a failed part.
    pub fn advice(&self) -> Option<&ReplenishmentAdvice> {
        self.result.as_ref().ok()
    }
}
