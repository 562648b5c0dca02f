//! Priority evaluation over forecast demand and stock on hand.

use serde::{Deserialize, Serialize};

/// Demand beyond stock times this ratio marks a part as high priority.
pub const ALERT_RATIO: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

/// Level plus a human-readable line for dashboards and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPriority {
    pub level: Priority,
    pub message: String,
}

/// Comparisons are strict: forecast demand exactly at stock times the
/// alert ratio is medium, exactly at stock is low.
pub fn evaluate_priority(total_demand: f64, current_stock: f64) -> DemandPriority {
    if total_demand > current_stock * ALERT_RATIO {
        DemandPriority {
            level: Priority::High,
            message: format!(
                "forecast demand {total_demand:.0} exceeds {ALERT_RATIO}x the {current_stock:.0} units on hand, replenish now"
            ),
        }
    } else if total_demand > current_stock {
        DemandPriority {
            level: Priority::Medium,
            message: format!(
                "forecast demand {total_demand:.0} exceeds the {current_stock:.0} units on hand, plan replenishment"
            ),
        }
    } else {
        DemandPriority {
            level: Priority::Low,
            message: format!(
                "forecast demand {total_demand:.0} is covered by the {current_stock:.0} units on hand"
            ),
        }
    }
}
