//! # Part Store
//!
//! `part_store` holds the data model and storage seam for the sparecast
//! workspace: spare-part history records (sensor snapshots and monthly
//! consumption), part and supplier master data, the repository traits the
//! forecasting crates consume, and two reference backends (an in-memory
//! store and CSV file loaders).
//!
//! ## Usage Example
//!
//! ```
//! use part_store::{HistoryStore, MemoryStore, PartInfo};
//! use part_store::mock;
//!
//! let store = MemoryStore::new();
//! store.ensure_schema();
//!
//! let part = PartInfo {
//!     part_id: "P-1001".to_string(),
//!     name: "Drive bearing".to_string(),
//!     nominal_life_hours: 2000.0,
//!     current_stock: 8.0,
//!     current_supplier: "Meridian Parts".to_string(),
//!     unit_price: 120.0,
//! };
//! mock::seed_demo_part(&store, part, 120, 24, 7);
//!
//! let history = store.sensor_history("P-1001").unwrap();
//! assert_eq!(history.len(), 120);
//! ```

use thiserror::Error;

mod memory;
mod records;
mod store;

pub mod csv_io;
pub mod mock;

pub use memory::MemoryStore;
pub use records::{DemandRecord, PartInfo, SensorRecord, SupplierPerformance};
pub use store::{HistoryStore, PartStore, StockStore, SupplierStore};

/// Errors that can occur when reading or provisioning part data
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// No master data exists for the requested part
    #[error("unknown part: {0}")]
    UnknownPart(String),

    /// A file or row could not be parsed into a record
    #[error("data load error: {0}")]
    DataLoad(String),

    /// Error from IO operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::DataLoad(err.to_string())
    }
}
