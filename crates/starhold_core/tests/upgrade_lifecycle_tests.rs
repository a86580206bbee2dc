//! Upgrade lifecycle tests through the engine.
//!
//! Start, lazy completion and cancel, with the check order and the
//! atomicity guarantees callers rely on.

use starhold_core::prelude::*;
use starhold_test_utils::fixtures::{at, at_hours, epoch, pid, uid, WorldBuilder};

fn home_world(stock: u64) -> Engine<MemoryStore> {
    WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(stock, stock, stock))
        .colony(2, 3, 8, ResourceAmounts::new(stock, stock, stock))
        .build()
}

fn displayed(engine: &Engine<MemoryStore>, now: chrono::DateTime<chrono::Utc>) -> ResourceAmounts {
    engine
        .projected_resources(pid(1), uid(7), now)
        .unwrap()
        .displayed()
}

// ==========================================================================
// Start
// ==========================================================================

#[test]
fn test_metal_mine_start_debits_exact_cost() {
    let engine = home_world(1000);
    let started = engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    assert_eq!(started.cost, ResourceAmounts::new(60, 15, 0));
    assert_eq!(started.build_time_secs, 60);
    assert_eq!(started.finish_at, at(60));
    assert!(started.building.is_upgrading());
    assert_eq!(displayed(&engine, epoch()), ResourceAmounts::new(940, 985, 1000));
}

#[test]
fn test_second_start_is_rejected() {
    let engine = home_world(5000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();
    let err = engine
        .start_upgrade(pid(1), uid(7), BuildingType::CrystalMine, at(10))
        .unwrap_err();

    assert!(matches!(err, GameError::UpgradeAlreadyInProgress { .. }));
    // nothing beyond the first cost was charged
    assert_eq!(displayed(&engine, epoch()), ResourceAmounts::new(4940, 4985, 5000));
}

#[test]
fn test_start_check_order() {
    let engine = home_world(0);

    // unknown planet and foreign planet look the same
    let err = engine
        .start_upgrade(pid(99), uid(7), BuildingType::MetalMine, epoch())
        .unwrap_err();
    assert!(matches!(err, GameError::NotFound { .. }));
    let err = engine
        .start_upgrade(pid(2), uid(7), BuildingType::MetalMine, epoch())
        .unwrap_err();
    assert!(matches!(err, GameError::NotFound { .. }));

    // locked before broke
    let err = engine
        .start_upgrade(pid(1), uid(7), BuildingType::Shipyard, epoch())
        .unwrap_err();
    assert!(matches!(err, GameError::RequirementsNotMet { .. }));

    let err = engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::InsufficientResources {
            resource: ResourceKind::Metal,
            required: 60,
            available: 0,
        }
    ));
}

#[test]
fn test_unknown_type_checked_before_planet() {
    let catalog = Catalog::from_ron(
        r#"CatalogData(
            accelerator: command_center,
            buildings: [
                BuildingDefinition(
                    id: command_center,
                    name: "HQ",
                    description: "",
                    category: infrastructure,
                    base_cost: (metal: 10),
                    cost_multiplier: 2.0,
                    base_build_time: 5,
                    max_level: 3,
                ),
            ],
        )"#,
    )
    .unwrap();
    let engine = WorldBuilder::new().with_catalog(catalog).build();

    let err = engine
        .start_upgrade(pid(99), uid(7), BuildingType::MetalMine, epoch())
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidBuildingType(_)));
}

#[test]
fn test_max_level_is_enforced() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(9000, 9000, 9000))
        .building(1, BuildingType::CommandCenter, 10)
        .build();
    let err = engine
        .start_upgrade(pid(1), uid(7), BuildingType::CommandCenter, epoch())
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::MaxLevelReached {
            building: BuildingType::CommandCenter,
            max_level: 10
        }
    ));
}

#[test]
fn test_accelerator_shortens_build_time() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(9000, 9000, 9000))
        .building(1, BuildingType::CommandCenter, 10)
        .build();
    let started = engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();
    // 60 / (1 + 10 * 0.1)
    assert_eq!(started.build_time_secs, 30);
}

// ==========================================================================
// Lazy completion
// ==========================================================================

#[test]
fn test_completion_before_finish_is_noop() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    let done = engine.complete_due_upgrades(pid(1), uid(7), at(59)).unwrap();
    assert!(done.is_empty());
}

#[test]
fn test_completion_happens_exactly_once() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    let done = engine.complete_due_upgrades(pid(1), uid(7), at(60)).unwrap();
    assert_eq!(
        done,
        vec![CompletedUpgrade {
            building_type: BuildingType::MetalMine,
            new_level: 1
        }]
    );
    assert!(engine
        .complete_due_upgrades(pid(1), uid(7), at(60))
        .unwrap()
        .is_empty());
    assert!(engine
        .complete_due_upgrades(pid(1), uid(7), at(600))
        .unwrap()
        .is_empty());
}

#[test]
fn test_projection_completes_due_upgrade() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    let res = engine.projected_resources(pid(1), uid(7), at_hours(1)).unwrap();
    assert!((res.metal_production - 33.0).abs() < f64::EPSILON);
    assert_eq!(res.energy_consumption, 11);
}

#[test]
fn test_new_rates_apply_from_finish_instant() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    // baseline 30/h for 60 s, then 33/h for the remaining 3540 s. No energy
    // production means no throttle.
    let res = engine.projected_resources(pid(1), uid(7), at_hours(1)).unwrap();
    let expected = 940.0 + 30.0 * (60.0 / 3600.0) + 33.0 * (3540.0 / 3600.0);
    assert!((res.metal - expected).abs() < 1e-9);
}

#[test]
fn test_late_observation_gives_same_result() {
    let early = home_world(1000);
    let late = home_world(1000);
    for engine in [&early, &late] {
        engine
            .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
            .unwrap();
    }

    early.complete_due_upgrades(pid(1), uid(7), at(60)).unwrap();
    let a = early.projected_resources(pid(1), uid(7), at_hours(5)).unwrap();
    let b = late.projected_resources(pid(1), uid(7), at_hours(5)).unwrap();
    assert!((a.metal - b.metal).abs() < 1e-6);
    assert!((a.crystal - b.crystal).abs() < 1e-6);
}

#[test]
fn test_start_after_finish_completes_previous_first() {
    let engine = home_world(5000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();
    let started = engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, at(120))
        .unwrap();

    assert_eq!(started.building.level, 1);
    // 60 * 1.5, 15 * 1.5
    assert_eq!(started.cost, ResourceAmounts::new(90, 22, 0));
    // 60 * 2^1.5 = 169.7..
    assert_eq!(started.build_time_secs, 170);
}

// ==========================================================================
// Cancel
// ==========================================================================

#[test]
fn test_start_then_cancel_refunds_half() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();
    let cancelled = engine
        .cancel_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();

    assert_eq!(cancelled.refund, ResourceAmounts::new(30, 7, 0));
    assert_eq!(cancelled.building.level, 0);
    assert!(!cancelled.building.is_upgrading());
    assert_eq!(displayed(&engine, epoch()), ResourceAmounts::new(970, 992, 1000));

    // the slot is free again
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::CrystalMine, epoch())
        .unwrap();
}

#[test]
fn test_cancel_without_upgrade() {
    let engine = home_world(1000);
    let err = engine
        .cancel_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap_err();
    assert!(matches!(err, GameError::NoActiveUpgrade { .. }));

    let err = engine
        .cancel_upgrade(pid(99), uid(7), BuildingType::MetalMine, epoch())
        .unwrap_err();
    assert!(matches!(err, GameError::NotFound { .. }));
}

#[test]
fn test_cancel_after_finish_is_too_late() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();
    let err = engine
        .cancel_upgrade(pid(1), uid(7), BuildingType::MetalMine, at(61))
        .unwrap_err();
    assert!(matches!(err, GameError::NoActiveUpgrade { .. }));
}

#[test]
fn test_refund_is_capped_at_capacity() {
    let engine = WorldBuilder::new()
        .colony(1, 1, 7, ResourceAmounts::new(10_000, 10_000, 10_000))
        .building(1, BuildingType::MetalMine, 30)
        .build();
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::CommandCenter, epoch())
        .unwrap();
    assert_eq!(displayed(&engine, epoch()), ResourceAmounts::new(9_600, 9_800, 9_900));

    // the level-30 mine refills the spent metal long before the 180 s build ends
    engine
        .cancel_upgrade(pid(1), uid(7), BuildingType::CommandCenter, at(170))
        .unwrap();
    let res = engine.projected_resources(pid(1), uid(7), at(170)).unwrap();
    assert!((res.metal - 10_000.0).abs() < f64::EPSILON);
    assert_eq!(res.displayed().crystal, 9_900);
    assert_eq!(res.displayed().deuterium, 9_950);
}

// ==========================================================================
// Overview
// ==========================================================================

#[test]
fn test_building_overview() {
    let engine = home_world(1000);
    engine
        .start_upgrade(pid(1), uid(7), BuildingType::MetalMine, epoch())
        .unwrap();
    let slots = engine.building_overview(pid(1), uid(7), at(30)).unwrap();

    assert_eq!(slots.len(), 14);
    let categories: Vec<Category> = slots.iter().map(|s| s.category).collect();
    let mut sorted = categories.clone();
    sorted.dedup();
    assert_eq!(sorted, Category::ORDER.to_vec());

    let mine = &slots[0];
    assert_eq!(mine.building_type, BuildingType::MetalMine);
    assert_eq!(mine.upgrade.unwrap().remaining_secs, 30);
    assert_eq!(mine.next_cost, Some(ResourceAmounts::new(60, 15, 0)));
    assert!(mine.is_unlocked());

    let synth = slots
        .iter()
        .find(|s| s.building_type == BuildingType::DeuteriumSynthesizer)
        .unwrap();
    assert!(!synth.is_unlocked());
}
