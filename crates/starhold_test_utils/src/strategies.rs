//! Proptest strategies for economy values.

use proptest::prelude::*;
use starhold_core::prelude::*;

use crate::fixtures::epoch;

/// Any of the fourteen building types.
pub fn arb_building_type() -> impl Strategy<Value = BuildingType> {
    proptest::sample::select(BuildingType::ALL.to_vec())
}

/// A level in the range the standard catalog allows.
pub fn arb_level() -> impl Strategy<Value = u32> {
    0_u32..=50
}

/// An accelerator level.
pub fn arb_accelerator_level() -> impl Strategy<Value = u32> {
    0_u32..=10
}

/// Whole-unit amounts of the three produced resources.
pub fn arb_amounts(max: u64) -> impl Strategy<Value = ResourceAmounts> {
    (0..=max, 0..=max, 0..=max).prop_map(|(m, c, d)| ResourceAmounts::new(m, c, d))
}

/// Elapsed time up to thirty days, in seconds.
pub fn arb_elapsed_secs() -> impl Strategy<Value = i64> {
    0_i64..=30 * 24 * 3600
}

/// A consistent ledger stamped at [`epoch`].
///
/// Stock never exceeds capacity. Deuterium production may be negative, as
/// it is with a fusion reactor burning more than the synthesizer makes.
pub fn arb_planet_ledger() -> impl Strategy<Value = PlanetResources> {
    (
        (10_000_u64..=200_000, 10_000_u64..=200_000, 10_000_u64..=200_000),
        (0.0_f64..=1.0, 0.0_f64..=1.0, 0.0_f64..=1.0),
        (0.0_f64..=5_000.0, 0.0_f64..=5_000.0, -500.0_f64..=2_000.0),
        (0_u64..=2_000, 0_u64..=2_000),
    )
        .prop_map(|(caps, fill, rates, energy)| {
            let mut res = PlanetResources::new(PlanetId(1), ResourceAmounts::ZERO, 0, epoch());
            res.metal_capacity = caps.0;
            res.crystal_capacity = caps.1;
            res.deuterium_capacity = caps.2;
            res.metal = caps.0 as f64 * fill.0;
            res.crystal = caps.1 as f64 * fill.1;
            res.deuterium = caps.2 as f64 * fill.2;
            res.metal_production = rates.0;
            res.crystal_production = rates.1;
            res.deuterium_production = rates.2;
            res.energy_production = energy.0;
            res.energy_consumption = energy.1;
            res
        })
}
