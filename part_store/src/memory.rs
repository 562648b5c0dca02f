//! In-memory reference implementation of the storage traits
//!
//! Backs the demos and tests. Reads go through a `RwLock` so a demand batch
//! can fan out over parts without cloning the store.

use crate::records::{DemandRecord, PartInfo, SensorRecord, SupplierPerformance};
use crate::store::{HistoryStore, StockStore, SupplierStore};
use crate::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct Tables {
    sensor_log: HashMap<String, Vec<SensorRecord>>,
    demand_log: HashMap<String, Vec<DemandRecord>>,
    parts: HashMap<String, PartInfo>,
    supplier_perf: Vec<SupplierPerformance>,
    provisioned: bool,
}

/// In-memory part store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision the log tables
    ///
    /// Safe to call repeatedly. The in-memory tables exist from construction,
    /// so this only records provisioning, matching the create-if-absent step
    /// a SQL-backed store runs before first use.
    pub fn ensure_schema(&self) {
        let mut tables = self.tables.write();
        if !tables.provisioned {
            tables.provisioned = true;
            debug!("part store schema provisioned");
        }
    }

    /// Append a sensor snapshot
    pub fn insert_sensor(&self, record: SensorRecord) {
        let mut tables = self.tables.write();
        tables
            .sensor_log
            .entry(record.part_id.clone())
            .or_default()
            .push(record);
    }

    /// Append a monthly consumption row
    pub fn insert_demand(&self, record: DemandRecord) {
        let mut tables = self.tables.write();
        tables
            .demand_log
            .entry(record.part_id.clone())
            .or_default()
            .push(record);
    }

    /// Insert or replace part master data
    pub fn upsert_part(&self, part: PartInfo) {
        let mut tables = self.tables.write();
        tables.parts.insert(part.part_id.clone(), part);
    }

    /// Append a supplier performance row
    pub fn insert_supplier(&self, row: SupplierPerformance) {
        let mut tables = self.tables.write();
        tables.supplier_perf.push(row);
    }
}

impl HistoryStore for MemoryStore {
    fn sensor_history(&self, part_id: &str) -> Result<Vec<SensorRecord>, StoreError> {
        let tables = self.tables.read();
        let mut rows = tables.sensor_log.get(part_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| a.operating_hours.total_cmp(&b.operating_hours));
        Ok(rows)
    }

    fn demand_history(&self, part_id: &str) -> Result<Vec<DemandRecord>, StoreError> {
        let tables = self.tables.read();
        let mut rows = tables.demand_log.get(part_id).cloned().unwrap_or_default();
        rows.sort_by_key(|r| (r.year, r.month));
        Ok(rows)
    }
}

impl SupplierStore for MemoryStore {
    fn performance_rows(&self, part_id: &str) -> Result<Vec<SupplierPerformance>, StoreError> {
        let tables = self.tables.read();
        let mut rows: Vec<SupplierPerformance> = tables
            .supplier_perf
            .iter()
            .filter(|row| row.part_id.as_deref().map_or(true, |p| p == part_id))
            .cloned()
            .collect();
        // false sorts before true, so part-specific rows lead
        rows.sort_by_key(|row| row.part_id.is_none());
        Ok(rows)
    }
}

impl StockStore for MemoryStore {
    fn part_info(&self, part_id: &str) -> Result<Option<PartInfo>, StoreError> {
        Ok(self.tables.read().parts.get(part_id).cloned())
    }
}
