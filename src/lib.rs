//! # Sparecast
//!
//! Workspace facade over the spare-part forecasting crates. The member
//! crates do the work; this root re-exports them so a consumer can depend
//! on one package:
//!
//! - [`part_store`] - storage traits, record types and the in-memory store
//! - [`forecast_core`] - the shared forecast engine (preprocessing, model,
//!   training, uncertainty, attribution, artifacts)
//! - [`predictive_maintenance`] - remaining-useful-life forecasts and alerts
//! - [`smart_replenishment`] - demand forecasts and purchase planning
//!
//! ## Example
//!
//! ```
//! use sparecast_workspace::part_store::{MemoryStore, PartInfo};
//! use sparecast_workspace::forecast_core::ArtifactStore;
//! use sparecast_workspace::predictive_maintenance::RulForecaster;
//!
//! let store = MemoryStore::new();
//! store.upsert_part(PartInfo {
//!     part_id: "PUMP-7".to_string(),
//!     name: "Coolant pump".to_string(),
//!     nominal_life_hours: 8000.0,
//!     current_stock: 4.0,
//!     current_supplier: "Meridian Parts".to_string(),
//!     unit_price: 420.0,
//! });
//!
//! let dir = tempfile::tempdir().unwrap();
//! let forecaster = RulForecaster::new(store, ArtifactStore::new(dir.path()));
//! let forecast = forecaster.forecast_rul("PUMP-7").unwrap();
//! assert_eq!(forecast.predicted_rul_hours, 4000.0);
//! ```

pub use forecast_core;
pub use part_store;
pub use predictive_maintenance;
pub use smart_replenishment;
