//! Storage traits consumed by the forecasting crates
//!
//! Backends implement the three focused traits; `PartStore` bundles them for
//! call sites that need the full surface.

use crate::records::{DemandRecord, PartInfo, SensorRecord, SupplierPerformance};
use crate::StoreError;

/// Read access to per-part history logs
pub trait HistoryStore {
    /// Sensor snapshots for a part, ascending by operating hours
    ///
    /// Returns an empty vector when the part has no recorded history.
    fn sensor_history(&self, part_id: &str) -> Result<Vec<SensorRecord>, StoreError>;

    /// Monthly consumption rows for a part, ascending by period
    ///
    /// Returns an empty vector when the part has no recorded history.
    fn demand_history(&self, part_id: &str) -> Result<Vec<DemandRecord>, StoreError>;
}

/// Read access to supplier delivery performance
pub trait SupplierStore {
    /// Performance rows usable for a part
    ///
    /// Part-specific rows come first, then supplier-wide rows. A supplier may
    /// appear once in each group; callers resolve the duplicate in favor of
    /// the part-specific row.
    fn performance_rows(&self, part_id: &str) -> Result<Vec<SupplierPerformance>, StoreError>;
}

/// Read access to part master data and stock levels
pub trait StockStore {
    /// Master data for a part, `None` when the part is not registered
    fn part_info(&self, part_id: &str) -> Result<Option<PartInfo>, StoreError>;

    /// Units on hand for a part
    fn stock_level(&self, part_id: &str) -> Result<f64, StoreError> {
        match self.part_info(part_id)? {
            Some(info) => Ok(info.current_stock),
            None => Err(StoreError::UnknownPart(part_id.to_string())),
        }
    }
}

/// Full storage surface needed by the forecasting pipelines
pub trait PartStore: HistoryStore + SupplierStore + StockStore {}

impl<T: HistoryStore + SupplierStore + StockStore> PartStore for T {}
