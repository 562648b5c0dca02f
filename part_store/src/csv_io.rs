//! CSV ingestion for history logs and supplier data
//!
//! Column layouts mirror the record types one field per column, with a header
//! row. Optional columns may be left empty.

use crate::records::{DemandRecord, SensorRecord, SupplierPerformance};
use crate::StoreError;
use std::path::Path;
use tracing::info;

/// Load sensor history rows from a CSV file
///
/// Expected header:
/// `part_id,recorded_at,operating_hours,temperature,vibration,pressure,current_load,rpm,error_code`
///
/// Rows come back ascending by operating hours regardless of file order.
pub fn load_sensor_history<P: AsRef<Path>>(path: P) -> Result<Vec<SensorRecord>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for (i, line) in reader.deserialize::<SensorRecord>().enumerate() {
        let record = line.map_err(|e| StoreError::DataLoad(format!("row {}: {}", i + 2, e)))?;
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(StoreError::DataLoad("no rows in file".to_string()));
    }

    rows.sort_by(|a, b| a.operating_hours.total_cmp(&b.operating_hours));
    info!(rows = rows.len(), "loaded sensor history");
    Ok(rows)
}

/// Load monthly consumption rows from a CSV file
///
/// Expected header:
/// `part_id,year,month,outbound_qty,repair_count,avg_unit_price,working_days`
///
/// Rows come back ascending by (year, month) regardless of file order.
pub fn load_demand_history<P: AsRef<Path>>(path: P) -> Result<Vec<DemandRecord>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for (i, line) in reader.deserialize::<DemandRecord>().enumerate() {
        let record = line.map_err(|e| StoreError::DataLoad(format!("row {}: {}", i + 2, e)))?;
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(StoreError::DataLoad("no rows in file".to_string()));
    }

    rows.sort_by_key(|r| (r.year, r.month));
    info!(rows = rows.len(), "loaded demand history");
    Ok(rows)
}

/// Load supplier performance rows from a CSV file
///
/// Expected header:
/// `supplier,part_id,quality_rate,on_time_rate,price_competitiveness,lead_time_days`
///
/// An empty `part_id` column marks a supplier-wide row.
pub fn load_supplier_rows<P: AsRef<Path>>(path: P) -> Result<Vec<SupplierPerformance>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for (i, line) in reader.deserialize::<SupplierPerformance>().enumerate() {
        let record = line.map_err(|e| StoreError::DataLoad(format!("row {}: {}", i + 2, e)))?;
        rows.push(record);
    }

    if rows.is_empty() {
        return Err(StoreError::DataLoad("no rows in file".to_string()));
    }

    info!(rows = rows.len(), "loaded supplier performance rows");
    Ok(rows)
}
