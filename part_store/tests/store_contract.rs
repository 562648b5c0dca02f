//! Exercises the composite storage surface the way the forecasting crates
//! consume it: through a caller generic over `PartStore`.

use part_store::mock;
use part_store::{MemoryStore, PartInfo, PartStore, StoreError};

fn part_summary<S: PartStore>(
    store: &S,
    part_id: &str,
) -> Result<(usize, usize, usize, f64), StoreError> {
    let sensors = store.sensor_history(part_id)?.len();
    let demand = store.demand_history(part_id)?.len();
    let suppliers = store.performance_rows(part_id)?.len();
    let stock = store.stock_level(part_id)?;
    Ok((sensors, demand, suppliers, stock))
}

fn demo_part(part_id: &str) -> PartInfo {
    PartInfo {
        part_id: part_id.to_string(),
        name: "Hydraulic pump seal".to_string(),
        nominal_life_hours: 1800.0,
        current_stock: 14.0,
        current_supplier: "Meridian Parts".to_string(),
        unit_price: 65.0,
    }
}

#[test]
fn test_generic_caller_sees_seeded_part() {
    let store = MemoryStore::new();
    store.ensure_schema();
    mock::seed_demo_part(&store, demo_part("P-2001"), 150, 24, 11);

    let (sensors, demand, suppliers, stock) = part_summary(&store, "P-2001").unwrap();
    assert_eq!(sensors, 150);
    assert_eq!(demand, 24);
    assert_eq!(suppliers, 3);
    assert_eq!(stock, 14.0);
}

#[test]
fn test_generic_caller_surfaces_unknown_part() {
    let store = MemoryStore::new();
    store.ensure_schema();

    let err = part_summary(&store, "P-none").unwrap_err();
    assert!(matches!(err, StoreError::UnknownPart(_)));
}
