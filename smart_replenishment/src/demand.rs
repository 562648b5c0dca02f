//! Projection of monthly consumption records onto the model feature space.

use ndarray::Array2;
use part_store::DemandRecord;
use std::f64::consts::PI;

/// Builds the feature matrix and the raw outbound column for a demand
/// series. Row order follows the input; columns are outbound quantity,
/// repair count, unit price, the cyclical month encoding and working days.
/// Missing readings become NaN so the fill stage can repair them.
pub fn demand_matrix(records: &[DemandRecord]) -> (Array2<f64>, Vec<f64>) {
    let mut matrix = Array2::zeros((records.len(), 6));
    let mut outbound = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let angle = 2.0 * PI * record.month as f64 / 12.0;
        matrix[[i, 0]] = record.outbound_qty;
        matrix[[i, 1]] = record.repair_count.unwrap_or(f64::NAN);
        matrix[[i, 2]] = record.avg_unit_price.unwrap_or(f64::NAN);
        matrix[[i, 3]] = angle.sin();
        matrix[[i, 4]] = angle.cos();
        matrix[[i, 5]] = record.working_days;
        outbound.push(record.outbound_qty);
    }
    (matrix, outbound)
}
