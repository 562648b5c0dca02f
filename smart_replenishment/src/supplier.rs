//! Supplier scoring and selection from delivery performance.

use part_store::SupplierPerformance;
use serde::{Deserialize, Serialize};

/// Weight of the accepted-quality rate in the composite score.
pub const QUALITY_WEIGHT: f64 = 0.4;
/// Weight of the on-time delivery rate.
pub const ON_TIME_WEIGHT: f64 = 0.3;
/// Weight of price competitiveness.
pub const PRICE_WEIGHT: f64 = 0.3;

/// Composite delivery score in [0, 1].
pub fn performance_score(row: &SupplierPerformance) -> f64 {
    QUALITY_WEIGHT * row.quality_rate
        + ON_TIME_WEIGHT * row.on_time_rate
        + PRICE_WEIGHT * row.price_competitiveness
}

/// Supplier chosen for an order, with the lead time the plan was built on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierChoice {
    pub supplier: String,
    pub lead_time_days: u32,
    /// Composite score of the winning row, `None` on the no-data fallback.
    pub score: Option<f64>,
    pub reason: String,
}

/// Picks the best-scoring supplier for a part.
///
/// A part-specific row replaces a supplier-wide row for the same supplier
/// before scoring, whatever order the rows arrive in. With no rows at all
/// the part keeps its current supplier and the default lead time.
pub fn select_supplier(
    current_supplier: &str,
    rows: &[SupplierPerformance],
    default_lead_time_days: u32,
) -> SupplierChoice {
    let mut candidates: Vec<&SupplierPerformance> = Vec::new();
    for row in rows {
        match candidates.iter_mut().find(|c| c.supplier == row.supplier) {
            None => candidates.push(row),
            Some(slot) => {
                if slot.part_id.is_none() && row.part_id.is_some() {
                    *slot = row;
                }
            }
        }
    }

    let best = candidates
        .iter()
        .copied()
        .max_by(|a, b| performance_score(a).total_cmp(&performance_score(b)));
    match best {
        Some(row) => {
            let score = performance_score(row);
            SupplierChoice {
                supplier: row.supplier.clone(),
                lead_time_days: row.lead_time_days,
                score: Some(score),
                reason: format!(
                    "best delivery score {score:.2} across {} candidate suppliers",
                    candidates.len()
                ),
            }
        }
        None => SupplierChoice {
            supplier: current_supplier.to_string(),
            lead_time_days: default_lead_time_days,
            score: None,
            reason: "no delivery performance on file, keeping the current supplier".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(
        supplier: &str,
        part_id: Option<&str>,
        quality: f64,
        on_time: f64,
        price: f64,
        lead: u32,
    ) -> SupplierPerformance {
        SupplierPerformance {
            supplier: supplier.to_string(),
            part_id: part_id.map(str::to_string),
            quality_rate: quality,
            on_time_rate: on_time,
            price_competitiveness: price,
            lead_time_days: lead,
        }
    }

    #[test]
    fn test_score_weights() {
        let score = performance_score(&row("A", None, 1.0, 0.0, 0.5, 10));
        assert_eq!(score, 0.4 + 0.15);
    }

    #[test]
    fn test_picks_the_best_scoring_supplier() {
        let rows = vec![
            row("Slow & Cheap", None, 0.8, 0.6, 0.9, 30),
            row("Fast & Dear", None, 0.95, 0.98, 0.5, 5),
        ];
        let choice = select_supplier("Incumbent", &rows, 14);

        assert_eq!(choice.supplier, "Fast & Dear");
        assert_eq!(choice.lead_time_days, 5);
        assert!(choice.reason.contains("2 candidate suppliers"));
    }

    #[test]
    fn test_part_specific_row_replaces_the_generic_row() {
        // Meridian scores 1.0 company-wide but only 0.9 on this part, so
        // the 0.95 competitor must win.
        let rows = vec![
            row("Meridian", None, 1.0, 1.0, 1.0, 10),
            row("Meridian", Some("P-1"), 0.9, 0.9, 0.9, 12),
            row("Ostwind", None, 0.95, 0.95, 0.95, 18),
        ];
        let choice = select_supplier("Incumbent", &rows, 14);
        assert_eq!(choice.supplier, "Ostwind");

        let mut reversed = rows;
        reversed.reverse();
        let choice = select_supplier("Incumbent", &reversed, 14);
        assert_eq!(choice.supplier, "Ostwind");
    }

    #[test]
    fn test_part_specific_lead_time_is_the_one_reported() {
        let rows = vec![
            row("Meridian", None, 0.9, 0.9, 0.9, 10),
            row("Meridian", Some("P-1"), 0.99, 0.99, 0.99, 7),
        ];
        let choice = select_supplier("Incumbent", &rows, 14);

        assert_eq!(choice.supplier, "Meridian");
        assert_eq!(choice.lead_time_days, 7);
    }

    #[test]
    fn test_no_rows_falls_back_to_the_current_supplier() {
        let choice = select_supplier("Incumbent", &[], 14);

        assert_eq!(choice.supplier, "Incumbent");
        assert_eq!(choice.lead_time_days, 14);
        assert_eq!(choice.score, None);
        assert!(choice.reason.contains("no delivery performance"));
    }
}
