//! Record types for spare-part history and master data

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One sensor snapshot for an in-service part
///
/// Rows are ordered by `operating_hours`, which advances monotonically over
/// the part's service life and doubles as the elapsed-life measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Part identifier
    pub part_id: String,
    /// Wall-clock time the snapshot was taken
    pub recorded_at: DateTime<Utc>,
    /// Cumulative operating hours at the snapshot
    pub operating_hours: f64,
    /// Surface temperature in °C; absent when the probe dropped out
    pub temperature: Option<f64>,
    /// Vibration amplitude in mm/s
    pub vibration: Option<f64>,
    /// Hydraulic pressure in MPa
    pub pressure: Option<f64>,
    /// Electrical load in A
    pub current_load: Option<f64>,
    /// Shaft speed in revolutions per minute
    pub rpm: Option<f64>,
    /// 1 when the controller reported a fault during the period, else 0
    pub error_code: u8,
}

/// Monthly consumption figures for one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    /// Part identifier
    pub part_id: String,
    /// Calendar year of the period
    pub year: i32,
    /// Calendar month of the period (1-12)
    pub month: u32,
    /// Units issued from stock during the month
    pub outbound_qty: f64,
    /// Repair jobs that consumed the part
    pub repair_count: Option<f64>,
    /// Average unit price across the month's issues
    pub avg_unit_price: Option<f64>,
    /// Working days in the month
    pub working_days: f64,
}

impl DemandRecord {
    /// First day of the record's period, `None` for an out-of-range month
    pub fn period(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

/// Master data for one spare part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInfo {
    /// Part identifier
    pub part_id: String,
    /// Human-readable part name
    pub name: String,
    /// Nominal service life in operating hours
    pub nominal_life_hours: f64,
    /// Units currently on hand
    pub current_stock: f64,
    /// Supplier currently on contract for the part
    pub current_supplier: String,
    /// Catalogue unit price
    pub unit_price: f64,
}

/// Delivery performance for a supplier, optionally scoped to one part
///
/// Rows with `part_id = Some(..)` take precedence over supplier-wide rows
/// when scoring candidates for that part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPerformance {
    /// Supplier name
    pub supplier: String,
    /// Part the row applies to; `None` marks a supplier-wide row
    pub part_id: Option<String>,
    /// Accepted-quality rate in [0,1]
    pub quality_rate: f64,
    /// On-time delivery rate in [0,1]
    pub on_time_rate: f64,
    /// Price competitiveness in [0,1], higher is cheaper
    pub price_competitiveness: f64,
    /// Quoted replenishment lead time in days
    pub lead_time_days: u32,
}
