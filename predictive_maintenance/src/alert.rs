//! Alert evaluation over a predicted remaining life.

use serde::{Deserialize, Serialize};

/// Below this many remaining hours a part needs immediate replacement.
pub const CRITICAL_RUL_HOURS: f64 = 500.0;
/// Below this many remaining hours maintenance should be scheduled.
pub const WARNING_RUL_HOURS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    Critical,
    Warning,
    Ok,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "CRITICAL",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Ok => "OK",
        }
    }
}

/// Level plus a human-readable line for dashboards and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceAlert {
    pub level: AlertLevel,
    pub message: String,
}

/// Thresholds are strict: a prediction of exactly 500 hours is a warning,
/// exactly 1000 hours is ok.
pub fn evaluate_alert(rul_hours: f64) -> MaintenanceAlert {
    if rul_hours < CRITICAL_RUL_HOURS {
        MaintenanceAlert {
            level: AlertLevel::Critical,
            message: format!(
                "predicted remaining life {rul_hours:.0} h is under the {CRITICAL_RUL_HOURS:.0} h critical threshold, replace immediately"
            ),
        }
    } else if rul_hours < WARNING_RUL_HOURS {
        MaintenanceAlert {
            level: AlertLevel::Warning,
            message: format!(
                "predicted remaining life {rul_hours:.0} h is under the {WARNING_RUL_HOURS:.0} h warning threshold, schedule maintenance"
            ),
        }
    } else {
        MaintenanceAlert {
            level: AlertLevel::Ok,
            message: format!("predicted remaining life {rul_hours:.0} h is above alert thresholds"),
        }
    }
}
