//! Purchase-quantity and order-timing arithmetic.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Lead time assumed when no supplier quote is on file.
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 14;
/// Working days backing the monthly-to-daily demand conversion.
pub const WORKING_DAYS_PER_MONTH: f64 = 22.0;
/// Safety-stock multiplier over demand during the lead time.
pub const DEFAULT_SAFETY_FACTOR: f64 = 1.5;

/// Everything the purchase arithmetic needs for one part.
#[derive(Debug, Clone, Copy)]
pub struct ReplenishmentInputs {
    /// Forecast demand over the whole horizon, in units.
    pub total_demand: f64,
    /// Units on hand.
    pub current_stock: f64,
    /// Forecast demand per working day.
    pub daily_avg_demand: f64,
    /// Supplier lead time in days.
    pub lead_time_days: u32,
    /// Safety-stock multiplier.
    pub safety_factor: f64,
    /// Date the plan is drawn up.
    pub today: NaiveDate,
}

/// When the order should go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTiming {
    /// Stock runs out within the lead time, order today.
    Immediate { order_date: NaiveDate },
    /// Stock lasts past the lead time, order on the given date.
    Scheduled { order_date: NaiveDate },
    /// No consumption forecast, stockout cannot be projected.
    NotComputable,
}

/// Completed purchase recommendation for one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasePlan {
    /// Units to order, rounded up to whole units.
    pub suggested_qty: f64,
    /// Buffer covering demand during the lead time.
    pub safety_stock: f64,
    /// Forecast demand per working day.
    pub daily_avg_demand: f64,
    /// Days until stock runs out at the forecast rate, `None` when the
    /// forecast rate is zero.
    pub days_until_stockout: Option<f64>,
    pub timing: OrderTiming,
}

/// Sizes and schedules a replenishment order.
///
/// The quantity covers forecast demand plus safety stock less what is on
/// hand, clamped at zero. A zero daily rate never divides; it yields the
/// explicit `NotComputable` timing instead. Fractional lead-off days round
/// down, moving the order date earlier rather than later.
pub fn plan_purchase(inputs: &ReplenishmentInputs) -> PurchasePlan {
    let safety_stock =
        inputs.daily_avg_demand * inputs.lead_time_days as f64 * inputs.safety_factor;
    let suggested_qty = (inputs.total_demand - inputs.current_stock + safety_stock)
        .ceil()
        .max(0.0);

    if inputs.daily_avg_demand <= 0.0 {
        return PurchasePlan {
            suggested_qty,
            safety_stock,
            daily_avg_demand: inputs.daily_avg_demand,
            days_until_stockout: None,
            timing: OrderTiming::NotComputable,
        };
    }

    let days_until_stockout = inputs.current_stock / inputs.daily_avg_demand;
    let lead_off = days_until_stockout - inputs.lead_time_days as f64;
    let timing = if lead_off < 0.0 {
        OrderTiming::Immediate {
            order_date: inputs.today,
        }
    } else {
        OrderTiming::Scheduled {
            order_date: inputs.today + Days::new(lead_off.floor() as u64),
        }
    };

    PurchasePlan {
        suggested_qty,
        safety_stock,
        daily_avg_demand: inputs.daily_avg_demand,
        days_until_stockout: Some(days_until_stockout),
        timing,
    }
}
