//! Economy formulas.
//!
//! Pure functions over levels and catalog data. All of them are total for
//! any level; results too large for `u64` saturate. Rounding follows the
//! balance sheet exactly: prices and rates floor, build times ceil.

use crate::data::BuildingDefinition;
use crate::resources::ResourceAmounts;

/// Per-level growth shared by production, energy and consumption.
pub const LEVEL_GROWTH: f64 = 1.1;

/// Energy output of a level-1 solar plant before growth.
pub const ENERGY_BASE_OUTPUT: f64 = 20.0;

/// Exponent applied to the target level in build times.
pub const BUILD_TIME_EXPONENT: f64 = 1.5;

/// Build time reduction per accelerator level.
pub const ACCELERATOR_STEP: f64 = 0.1;

/// Storage capacity is a multiple of this block.
pub const STORAGE_BLOCK: f64 = 5000.0;

/// Level-scaled growth term `level * 1.1^level`.
fn level_growth(level: u32) -> f64 {
    let level = f64::from(level);
    level * LEVEL_GROWTH.powf(level)
}

/// Cost of upgrading a building from `current_level` to the next level.
///
/// `base_cost * cost_multiplier^current_level`, floored per resource.
#[must_use]
pub fn cost(def: &BuildingDefinition, current_level: u32) -> ResourceAmounts {
    def.base_cost
        .scale_floor(def.cost_multiplier.powf(f64::from(current_level)))
}

/// Seconds needed to reach `target_level`.
///
/// `base_build_time * target_level^1.5 / (1 + accelerator_level * 0.1)`,
/// rounded up.
#[must_use]
pub fn build_time(def: &BuildingDefinition, target_level: u32, accelerator_level: u32) -> u64 {
    let base = def.base_build_time as f64 * f64::from(target_level).powf(BUILD_TIME_EXPONENT);
    let speed = 1.0 + f64::from(accelerator_level) * ACCELERATOR_STEP;
    (base / speed).ceil() as u64
}

/// Hourly output of a mine.
///
/// `base_rate * level * 1.1^level * planet_bonus`, floored. Level 0 yields
/// 0; callers substitute the baseline trickle.
#[must_use]
pub fn production(base_rate: f64, level: u32, planet_bonus: f64) -> u64 {
    (base_rate * level_growth(level) * planet_bonus).floor() as u64
}

/// Energy output of a power plant.
///
/// `20 * level * 1.1^level * planet_bonus * output_multiplier`, floored.
/// The solar plant has multiplier 1; the fusion reactor doubles it.
#[must_use]
pub fn energy_output(level: u32, planet_bonus: f64, output_multiplier: f64) -> u64 {
    (ENERGY_BASE_OUTPUT * level_growth(level) * planet_bonus * output_multiplier).floor() as u64
}

/// Energy drawn by a mine: `base_consumption * level * 1.1^level`, floored.
#[must_use]
pub fn energy_consumption(base_consumption: f64, level: u32) -> u64 {
    (base_consumption * level_growth(level)).floor() as u64
}

/// Hourly deuterium burned by a fusion reactor.
///
/// Same shape as [`energy_consumption`] with the configured base.
#[must_use]
pub fn deuterium_burn(base_burn: f64, level: u32) -> u64 {
    energy_consumption(base_burn, level)
}

/// Capacity granted by a storage building.
///
/// `5000 * floor(2.5 * e^(20 * level / 33))`. At level 0 the caller's
/// default applies instead; see [`storage_capacity_or`].
#[must_use]
pub fn storage_capacity(level: u32) -> u64 {
    let blocks = (2.5 * (20.0 * f64::from(level) / 33.0).exp()).floor();
    (STORAGE_BLOCK * blocks).floor() as u64
}

/// Capacity for a storage level, using `default_capacity` at level 0.
#[must_use]
pub fn storage_capacity_or(level: u32, default_capacity: u64) -> u64 {
    if level == 0 {
        default_capacity
    } else {
        storage_capacity(level)
    }
}
