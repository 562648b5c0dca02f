//! # Smart Replenishment
//!
//! Demand forecasting and purchase planning for industrial spare parts. The
//! planner reads monthly consumption history from a part store, forecasts the
//! coming months with the shared forecast engine and turns the numbers into
//! a purchase recommendation: how many units to order, when, and from whom.
//!
//! ## Data tiers
//!
//! | Months of history  | Strategy                                    |
//! |--------------------|---------------------------------------------|
//! | none               | fixed default demand with a wide band       |
//! | below critical     | previously trained model, or a hard error   |
//! | below sufficient   | synthetic augmentation, then training       |
//! | sufficient         | training on real history alone              |
//!
//! A series too short to window even after augmentation falls back to a
//! statistical forecast instead of failing.
//!
//! ## Quick Start
//!
//! ```rust
//! use part_store::mock::seed_demo_part;
//! use part_store::{MemoryStore, PartInfo};
//! use smart_replenishment::ReplenishmentPlanner;
//! use forecast_core::ArtifactStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let part = PartInfo {
//!     part_id: "SEAL-3".to_string(),
//!     name: "Shaft seal".to_string(),
//!     nominal_life_hours: 4000.0,
//!     current_stock: 6.0,
//!     current_supplier: "Meridian Parts".to_string(),
//!     unit_price: 35.0,
//! };
//! seed_demo_part(&store, part, 0, 0, 7);
//!
//! let dir = tempfile::tempdir()?;
//! let planner = ReplenishmentPlanner::new(store, ArtifactStore::new(dir.path()));
//! let outcomes = planner.forecast_demand(&["SEAL-3"]);
//! let advice = outcomes[0].result.as_ref().map_err(|e| e.to_string())?;
//! println!(
//!     "{}: order {:.0} units from {}",
//!     advice.forecast.part_id, advice.purchase.suggested_qty, advice.supplier.supplier
//! );
//! # Ok(())
//! # }
//! ```

use part_store::StoreError;
use thiserror::Error;

pub mod demand;
pub mod pipeline;
pub mod priority;
pub mod purchase;
pub mod result;
pub mod supplier;

// Re-export commonly used types
pub use crate::demand::demand_matrix;
pub use crate::pipeline::ReplenishmentPlanner;
pub use crate::priority::{evaluate_priority, DemandPriority, Priority};
pub use crate::purchase::{plan_purchase, OrderTiming, PurchasePlan, ReplenishmentInputs};
pub use crate::result::{DemandForecast, PartOutcome, ReplenishmentAdvice};
pub use crate::supplier::{performance_score, select_supplier, SupplierChoice};

/// Errors a replenishment plan can end in.
#[derive(Error, Debug)]
pub enum ReplenishError {
    /// The backing store could not produce the part or its history.
    #[error("demand data for part '{part_id}' unavailable: {source}")]
    DataUnavailable {
        part_id: String,
        source: StoreError,
    },

    /// Too little history to train and no previously trained model to fall
    /// back on.
    #[error(
        "part '{part_id}' has {available} demand months, needs {needed}, \
         and no stored model exists"
    )]
    InsufficientDataNoFallback {
        part_id: String,
        available: usize,
        needed: usize,
    },

    /// The forecast engine itself failed.
    #[error("forecast engine: {0}")]
    Engine(#[from] forecast_core::ForecastError),
}

pub type Result<T> = std::result::Result<T, ReplenishError>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
