//! Concurrent access through one shared engine.
//!
//! Racing operations on the same planet must serialize: exactly one wins
//! and the losers see the state the winner left behind.

use std::sync::{Arc, Barrier};
use std::thread;

use starhold_core::prelude::*;
use starhold_test_utils::fixtures::{epoch, pid, uid, WorldBuilder};

const UNLOCKED: [BuildingType; 6] = [
    BuildingType::MetalMine,
    BuildingType::CrystalMine,
    BuildingType::SolarPlant,
    BuildingType::MetalStorage,
    BuildingType::CrystalStorage,
    BuildingType::CommandCenter,
];

/// Run `op` once per input on its own thread, all released together.
fn race<I, T, F>(inputs: Vec<I>, op: F) -> Vec<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(inputs.len()));
    let op = Arc::new(op);
    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| {
            let barrier = Arc::clone(&barrier);
            let op = Arc::clone(&op);
            thread::spawn(move || {
                barrier.wait();
                op(input)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_racing_starts_fill_one_slot() {
    let engine = Arc::new(
        WorldBuilder::new()
            .colony(1, 1, 7, ResourceAmounts::new(10_000, 10_000, 10_000))
            .build(),
    );

    let shared = Arc::clone(&engine);
    let results = race(UNLOCKED.to_vec(), move |ty| {
        shared.start_upgrade(pid(1), uid(7), ty, epoch())
    });

    let winners: Vec<&UpgradeStarted> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
        e,
        GameError::UpgradeAlreadyInProgress { building, .. }
            if *building == winners[0].building.building_type
    )));

    // exactly one cost was charged
    let cost = winners[0].cost;
    let res = engine.projected_resources(pid(1), uid(7), epoch()).unwrap();
    assert_eq!(
        res.displayed(),
        ResourceAmounts::new(
            10_000 - cost.metal,
            10_000 - cost.crystal,
            10_000 - cost.deuterium
        )
    );
}

#[test]
fn test_racing_claims_have_one_owner() {
    let engine = Arc::new(WorldBuilder::new().planet(1, 5).build());

    let shared = Arc::clone(&engine);
    let results = race((1..=8).collect(), move |user| {
        shared.colonize(pid(1), uid(user), epoch()).map(|_| user)
    });

    let winners: Vec<u64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, GameError::AlreadyOwned(_))));

    let tables = engine.store().snapshot().unwrap();
    assert_eq!(tables.planets[&pid(1)].planet.owner, Some(uid(winners[0])));
}

#[test]
fn test_racing_starter_claims_have_one_owner() {
    let engine = Arc::new(WorldBuilder::new().starter_planet(3, 2).build());

    let shared = Arc::clone(&engine);
    let results = race((1..=8).collect(), move |user| {
        shared.claim_starter_planet(pid(3), uid(user), epoch())
    });
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
}

#[test]
fn test_racing_colonies_cannot_overspend() {
    // enough stock for exactly one colony in the home sector
    let engine = Arc::new(
        WorldBuilder::new()
            .colony(1, 1, 7, ResourceAmounts::new(10_000, 10_000, 10_000))
            .planet(2, 1)
            .planet(3, 1)
            .planet(4, 1)
            .build(),
    );

    let shared = Arc::clone(&engine);
    let results = race(vec![2, 3, 4], move |target| {
        shared.colonize(pid(target), uid(7), epoch())
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, GameError::InsufficientResources { .. })));

    let res = engine.projected_resources(pid(1), uid(7), epoch()).unwrap();
    assert_eq!(res.displayed(), ResourceAmounts::new(0, 5_000, 7_500));
}

#[test]
fn test_observers_do_not_lose_a_debit() {
    let engine = Arc::new(
        WorldBuilder::new()
            .colony(1, 1, 7, ResourceAmounts::new(5_000, 5_000, 5_000))
            .build(),
    );

    let shared = Arc::clone(&engine);
    let inputs: Vec<Option<BuildingType>> = (0..8)
        .map(|i| (i == 3).then_some(BuildingType::MetalMine))
        .collect();
    race(inputs, move |input| match input {
        Some(ty) => shared.start_upgrade(pid(1), uid(7), ty, epoch()).is_ok(),
        None => shared.projected_resources(pid(1), uid(7), epoch()).is_ok(),
    });

    let res = engine.projected_resources(pid(1), uid(7), epoch()).unwrap();
    assert_eq!(res.displayed(), ResourceAmounts::new(4_940, 4_985, 5_000));
}
