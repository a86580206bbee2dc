//! Resource accrual properties and persistence behavior.

use chrono::Duration;
use proptest::prelude::*;
use starhold_core::accrual::{self, energy_ratio};
use starhold_core::prelude::*;
use starhold_test_utils::fixtures::{at, at_hours, epoch, pid, uid, WorldBuilder};
use starhold_test_utils::strategies::{arb_elapsed_secs, arb_planet_ledger};

fn within(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-9 * scale.max(1.0)
}

// ==========================================================================
// Properties
// ==========================================================================

proptest! {
    /// Stock never leaves `[0, capacity]` however long the gap.
    #[test]
    fn prop_stock_stays_within_bounds(
        ledger in arb_planet_ledger(),
        secs in arb_elapsed_secs(),
    ) {
        let config = EconomyConfig::default();
        let now = epoch() + Duration::seconds(secs);
        let projected = accrual::project(&ledger, now, &config).resources;

        for kind in ResourceKind::PRODUCED {
            let stock = projected.stock(kind);
            let cap = projected.capacity(kind).unwrap() as f64;
            prop_assert!(stock >= 0.0, "{kind} went negative: {stock}");
            prop_assert!(stock <= cap, "{kind} exceeded cap: {stock} > {cap}");
        }
    }

    /// Reconciling halfway and then projecting lands where a single
    /// projection does. Rates keep their sign, so clamping cannot depend on
    /// the path.
    #[test]
    fn prop_split_reconciliation_matches_single(
        ledger in arb_planet_ledger(),
        first in arb_elapsed_secs(),
        second in arb_elapsed_secs(),
    ) {
        let config = EconomyConfig::default();
        let middle = epoch() + Duration::seconds(first);
        let end = middle + Duration::seconds(second);

        let direct = accrual::project(&ledger, end, &config).resources;
        let mut stepped = ledger.clone();
        accrual::reconcile(&mut stepped, middle, &config);
        let stepped = accrual::project(&stepped, end, &config).resources;

        for kind in ResourceKind::PRODUCED {
            let cap = direct.capacity(kind).unwrap() as f64;
            prop_assert!(
                within(direct.stock(kind), stepped.stock(kind), cap),
                "{kind}: {} vs {}", direct.stock(kind), stepped.stock(kind)
            );
        }
    }

    /// Projection reads the ledger and nothing else.
    #[test]
    fn prop_projection_is_pure(
        ledger in arb_planet_ledger(),
        secs in arb_elapsed_secs(),
    ) {
        let config = EconomyConfig::default();
        let now = epoch() + Duration::seconds(secs);
        let before = ledger.clone();
        let a = accrual::project(&ledger, now, &config);
        let b = accrual::project(&ledger, now, &config);
        prop_assert_eq!(&ledger, &before);
        prop_assert_eq!(a, b);
    }

    /// Observing before the last update integrates nothing.
    #[test]
    fn prop_past_instant_is_noop(
        ledger in arb_planet_ledger(),
        secs in 1_i64..=86_400,
    ) {
        let config = EconomyConfig::default();
        let mut reconciled = ledger.clone();
        accrual::reconcile(&mut reconciled, epoch() - Duration::seconds(secs), &config);
        prop_assert_eq!(reconciled, ledger);
    }

    /// The throttle is a ratio.
    #[test]
    fn prop_energy_ratio_in_unit_range(
        production in 0_u64..=100_000,
        consumption in 0_u64..=100_000,
    ) {
        let ratio = energy_ratio(production, consumption);
        prop_assert!((0.0..=1.0).contains(&ratio));
        if production >= consumption {
            prop_assert!((ratio - 1.0).abs() < f64::EPSILON);
        }
    }

    /// An energy deficit never produces more than a surplus would.
    #[test]
    fn prop_deficit_never_increases_gain(
        ledger in arb_planet_ledger(),
        secs in arb_elapsed_secs(),
    ) {
        let config = EconomyConfig::default();
        let now = epoch() + Duration::seconds(secs);
        let mut surplus = ledger.clone();
        surplus.energy_consumption = 0;
        let throttled = accrual::project(&ledger, now, &config).resources;
        let unthrottled = accrual::project(&surplus, now, &config).resources;

        for kind in ResourceKind::PRODUCED {
            let gain = throttled.stock(kind) - ledger.stock(kind);
            let full = unthrottled.stock(kind) - ledger.stock(kind);
            prop_assert!(gain.abs() <= full.abs() + 1e-9);
        }
    }
}

// ==========================================================================
// Engine projections
// ==========================================================================

#[test]
fn test_energy_deficit_throttles_production() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::ZERO)
        .building(1, BuildingType::MetalMine, 1)
        .building(1, BuildingType::CrystalMine, 1)
        .building(1, BuildingType::SolarPlant, 1)
        .build();

    let res = engine.projected_resources(pid(1), uid(7), at_hours(1)).unwrap();
    // solar 22 against 11 + 11 consumption: exactly balanced
    assert_eq!(res.energy_production, 22);
    assert_eq!(res.energy_consumption, 22);
    assert_eq!(res.displayed().metal, 33);

    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::ZERO)
        .building(1, BuildingType::MetalMine, 2)
        .building(1, BuildingType::CrystalMine, 2)
        .building(1, BuildingType::SolarPlant, 1)
        .build();
    let res = engine.projected_resources(pid(1), uid(7), at_hours(1)).unwrap();
    let ratio = energy_ratio(res.energy_production, res.energy_consumption);
    assert!(ratio < 1.0);
    assert!((res.metal - res.metal_production * ratio).abs() < 1e-9);
}

#[test]
fn test_short_projection_is_not_persisted() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(1_000, 1_000, 1_000))
        .build();

    engine.projected_resources(pid(1), uid(7), at(60)).unwrap();
    let tables = engine.store().snapshot().unwrap();
    let stored = tables.planets[&pid(1)].resources().unwrap();
    assert_eq!(stored.last_updated, epoch());

    engine.projected_resources(pid(1), uid(7), at(61)).unwrap();
    let tables = engine.store().snapshot().unwrap();
    let stored = tables.planets[&pid(1)].resources().unwrap();
    assert_eq!(stored.last_updated, at(61));
    assert!(stored.metal > 1_000.0);
}

#[test]
fn test_repeated_observation_is_stable() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(1_000, 1_000, 1_000))
        .build();

    let first = engine.projected_resources(pid(1), uid(7), at_hours(3)).unwrap();
    let second = engine.projected_resources(pid(1), uid(7), at_hours(3)).unwrap();
    assert_eq!(first, second);
    assert!((first.metal - 1_090.0).abs() < 1e-9);
    assert!((first.crystal - 1_045.0).abs() < 1e-9);
}

#[test]
fn test_full_storage_loses_overflow() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(9_990, 0, 0))
        .build();
    let res = engine.projected_resources(pid(1), uid(7), at_hours(10)).unwrap();
    assert!((res.metal - 10_000.0).abs() < f64::EPSILON);

    // time spent full is not banked
    engine.projected_resources(pid(1), uid(7), at_hours(20)).unwrap();
    let res = engine.projected_resources(pid(1), uid(7), at_hours(20)).unwrap();
    assert!((res.metal - 10_000.0).abs() < f64::EPSILON);
}

// ==========================================================================
// Totals
// ==========================================================================

#[test]
fn test_total_resources_across_planets() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(1_000, 500, 100))
        .colony(2, 4, 7, ResourceAmounts::new(2_000, 700, 300))
        .colony(3, 4, 8, ResourceAmounts::new(9_000, 9_000, 9_000))
        .build();

    let totals = engine.total_resources(uid(7), at_hours(2)).unwrap();
    assert_eq!(totals.planets, 2);
    assert!((totals.metal - 3_120.0).abs() < 1e-9);
    assert!((totals.crystal - 1_260.0).abs() < 1e-9);
    assert!((totals.deuterium - 400.0).abs() < 1e-9);
    assert!((totals.metal_production - 60.0).abs() < 1e-9);
    assert!((totals.crystal_production - 30.0).abs() < 1e-9);
}

#[test]
fn test_total_resources_without_planets() {
    let engine = WorldBuilder::new().planet(1, 1).build();
    let totals = engine.total_resources(uid(7), epoch()).unwrap();
    assert_eq!(totals, ResourceTotals::default());
}

#[test]
fn test_totals_complete_due_upgrades() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(1_000, 1_000, 1_000))
        .build();
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    let totals = engine.total_resources(uid(7), at_hours(1)).unwrap();
    assert!((totals.metal_production - 33.0).abs() < 1e-9);
}
