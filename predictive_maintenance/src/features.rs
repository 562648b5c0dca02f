//! Projection of sensor records onto the model feature space.

use ndarray::Array2;
use part_store::SensorRecord;

/// Builds the feature matrix and the raw elapsed-hours column for a sensor
/// series. Row order follows the input; columns are operating hours, the
/// five channels and the error flag. Missing readings become NaN so the
/// fill stage can repair them.
pub fn sensor_matrix(records: &[SensorRecord]) -> (Array2<f64>, Vec<f64>) {
    let mut matrix = Array2::zeros((records.len(), 7));
    let mut elapsed = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        matrix[[i, 0]] = record.operating_hours;
        matrix[[i, 1]] = record.temperature.unwrap_or(f64::NAN);
        matrix[[i, 2]] = record.vibration.unwrap_or(f64::NAN);
        matrix[[i, 3]] = record.pressure.unwrap_or(f64::NAN);
        matrix[[i, 4]] = record.current_load.unwrap_or(f64::NAN);
        matrix[[i, 5]] = record.rpm.unwrap_or(f64::NAN);
        matrix[[i, 6]] = record.error_code as f64;
        elapsed.push(record.operating_hours);
    }
    (matrix, elapsed)
}
