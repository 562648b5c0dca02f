//! # Predictive Maintenance
//!
//! Remaining-useful-life forecasting for industrial spare parts. The
//! pipeline reads sensor history from a part store, picks a strategy from
//! the amount of real data available, runs the shared forecast engine and
//! turns the result into a maintenance alert.
//!
//! ## Data tiers
//!
//! | Records            | Strategy                                    |
//! |--------------------|---------------------------------------------|
//! | none               | conservative default, half the nominal life |
//! | below critical     | previously trained model, or a hard error   |
//! | below sufficient   | synthetic augmentation, then training       |
//! | sufficient         | training on real history alone              |
//!
//! ## Quick Start
//!
//! ```rust
//! use part_store::mock::seed_demo_part;
//! use part_store::{MemoryStore, PartInfo};
//! use predictive_maintenance::RulForecaster;
//! use forecast_core::{ArtifactStore, EngineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let part = PartInfo {
//!     part_id: "PUMP-7".to_string(),
//!     name: "Coolant pump".to_string(),
//!     nominal_life_hours: 8000.0,
//!     current_stock: 4.0,
//!     current_supplier: "Meridian Parts".to_string(),
//!     unit_price: 420.0,
//! };
//! seed_demo_part(&store, part, 0, 0, 11);
//!
//! let dir = tempfile::tempdir()?;
//! let forecaster = RulForecaster::new(store, ArtifactStore::new(dir.path()));
//! let forecast = forecaster.forecast_rul("PUMP-7")?;
//! println!(
//!     "{}: {:.0} h left ({})",
//!     forecast.part_id, forecast.predicted_rul_hours, forecast.alert.message
//! );
//! # Ok(())
//! # }
//! ```

use part_store::StoreError;
use thiserror::Error;

pub mod alert;
pub mod features;
pub mod pipeline;
pub mod result;

// Re-export commonly used types
pub use crate::alert::{evaluate_alert, AlertLevel, MaintenanceAlert};
pub use crate::features::sensor_matrix;
pub use crate::pipeline::RulForecaster;
pub use crate::result::RulForecast;

/// Errors a remaining-life forecast can end in.
#[derive(Error, Debug)]
pub enum MaintenanceError {
    /// The backing store could not produce the part or its history.
    #[error("history for part '{part_id}' unavailable: {source}")]
    DataUnavailable {
        part_id: String,
        source: StoreError,
    },

    /// Too little history to train and no previously trained model to fall
    /// back on.
    #[error(
        "part '{part_id}' has {available} sensor records, needs {needed}, \
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

pub type Result<T> = std::result::Result<T, MaintenanceError>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
