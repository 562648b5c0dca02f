//! Seeded mock-data generation for demos and tests
//!
//! Generators take an explicit seed so a demo run or a test case can be
//! reproduced exactly.

use crate::records::{DemandRecord, PartInfo, SensorRecord, SupplierPerformance};
use crate::MemoryStore;
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution, Normal};
use std::f64::consts::PI;

/// Generate a degradation-shaped sensor history
///
/// Temperature, vibration and load drift upward with wear while rpm sags;
/// fault codes become more likely toward end of life.
///
/// # Arguments
/// * `part_id` - Part the rows belong to
/// * `points` - Number of snapshots to generate
/// * `nominal_life_hours` - Nominal service life driving the wear trend
/// * `start_hours` - Operating hours of the first snapshot
/// * `seed` - RNG seed; equal seeds produce equal series
///
/// # Returns
/// * `Vec<SensorRecord>` - Snapshots ascending by operating hours
pub fn generate_sensor_history(
    part_id: &str,
    points: usize,
    nominal_life_hours: f64,
    start_hours: f64,
    seed: u64,
) -> Vec<SensorRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let first_snapshot = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
    let step_hours = 10.0;

    let mut rows = Vec::with_capacity(points);
    for i in 0..points {
        let hours = start_hours + step_hours * i as f64;
        let wear = (hours / nominal_life_hours).clamp(0.0, 1.0);
        let fault = Bernoulli::new((0.3 * wear).clamp(0.0, 1.0)).unwrap();

        rows.push(SensorRecord {
            part_id: part_id.to_string(),
            recorded_at: first_snapshot + Duration::hours(12 * i as i64),
            operating_hours: hours,
            temperature: Some(70.0 + 12.0 * wear + 1.5 * noise.sample(&mut rng)),
            vibration: Some(1.2 + 2.5 * wear + 0.2 * noise.sample(&mut rng)),
            pressure: Some(1.05 - 0.15 * wear + 0.04 * noise.sample(&mut rng)),
            current_load: Some(10.0 + 4.0 * wear + 0.8 * noise.sample(&mut rng)),
            rpm: Some(1500.0 - 120.0 * wear + 25.0 * noise.sample(&mut rng)),
            error_code: u8::from(fault.sample(&mut rng)),
        });
    }

    rows
}

/// Generate seasonally varying monthly consumption history
///
/// # Arguments
/// * `part_id` - Part the rows belong to
/// * `months` - Number of months to generate, starting January 2023
/// * `base_qty` - Average monthly outbound quantity
/// * `seed` - RNG seed; equal seeds produce equal series
///
/// # Returns
/// * `Vec<DemandRecord>` - Rows ascending by period
pub fn generate_demand_history(
    part_id: &str,
    months: usize,
    base_qty: f64,
    seed: u64,
) -> Vec<DemandRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();

    let mut rows = Vec::with_capacity(months);
    let (mut year, mut month) = (2023, 1u32);
    for _ in 0..months {
        let season = (2.0 * PI * month as f64 / 12.0).sin();
        let outbound =
            (base_qty + 0.4 * base_qty * season + 0.2 * base_qty * noise.sample(&mut rng))
                .max(0.0)
                .round();

        rows.push(DemandRecord {
            part_id: part_id.to_string(),
            year,
            month,
            outbound_qty: outbound,
            repair_count: Some((0.2 * outbound + noise.sample(&mut rng)).max(0.0).round()),
            avg_unit_price: Some(100.0 + 5.0 * noise.sample(&mut rng)),
            working_days: 20.0 + rng.gen_range(0..=3) as f64,
        });

        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    rows
}

/// Generate supplier performance rows for a part
///
/// Produces two supplier-wide rows and one part-specific row so selection
/// logic has a precedence case to exercise.
pub fn generate_supplier_rows(part_id: &str, seed: u64) -> Vec<SupplierPerformance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jitter = move |base: f64| (base + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);

    vec![
        SupplierPerformance {
            supplier: "Meridian Parts".to_string(),
            part_id: None,
            quality_rate: jitter(0.94),
            on_time_rate: jitter(0.90),
            price_competitiveness: jitter(0.72),
            lead_time_days: 12,
        },
        SupplierPerformance {
            supplier: "Ostwind Industrial".to_string(),
            part_id: None,
            quality_rate: jitter(0.91),
            on_time_rate: jitter(0.86),
            price_competitiveness: jitter(0.85),
            lead_time_days: 18,
        },
        SupplierPerformance {
            supplier: "Meridian Parts".to_string(),
            part_id: Some(part_id.to_string()),
            quality_rate: jitter(0.97),
            on_time_rate: jitter(0.93),
            price_competitiveness: jitter(0.70),
            lead_time_days: 10,
        },
    ]
}

/// Seed a store with one fully wired demo part
///
/// Inserts the master record plus generated sensor, demand and supplier
/// rows derived from it.
pub fn seed_demo_part(
    store: &MemoryStore,
    part: PartInfo,
    sensor_points: usize,
    demand_months: usize,
    seed: u64,
) {
    for row in generate_sensor_history(&part.part_id, sensor_points, part.nominal_life_hours, 0.0, seed)
    {
        store.insert_sensor(row);
    }
    for row in generate_demand_history(&part.part_id, demand_months, 12.0, seed) {
        store.insert_demand(row);
    }
    for row in generate_supplier_rows(&part.part_id, seed) {
        store.insert_supplier(row);
    }
    store.upsert_part(part);
}
