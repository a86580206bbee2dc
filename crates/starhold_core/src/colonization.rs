//! Colonization pricing and colony seeding.
//!
//! Sectors of a galaxy form a square grid numbered row-major from 1. The
//! price of a new colony grows linearly with its Euclidean sector distance
//! from the player's main planet. A player's first planet is free.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::buildings::Building;
use crate::config::EconomyConfig;
use crate::data::BuildingType;
use crate::planet::PlanetId;
use crate::resources::{PlanetResources, ResourceAmounts, ResourceKind};
use crate::store::IdSequence;

/// Zero-based (row, column) of a sector on a grid of width `grid_width`.
///
/// Sector 0 is treated as sector 1.
#[must_use]
pub const fn sector_position(sector: u32, grid_width: u32) -> (u32, u32) {
    let index = sector.saturating_sub(1);
    let width = if grid_width == 0 { 1 } else { grid_width };
    (index / width, index % width)
}

/// Euclidean distance between two sectors.
#[must_use]
pub fn sector_distance(a: u32, b: u32, grid_width: u32) -> f64 {
    let (row_a, col_a) = sector_position(a, grid_width);
    let (row_b, col_b) = sector_position(b, grid_width);
    let dr = f64::from(row_a) - f64::from(row_b);
    let dc = f64::from(col_a) - f64::from(col_b);
    dr.hypot(dc)
}

/// Price of a colony at some distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColonizationCost {
    /// Resources charged.
    pub cost: ResourceAmounts,
    /// Unrounded distance multiplier.
    pub multiplier: f64,
}

/// `base * (1 + distance * factor)`, floored per resource.
#[must_use]
pub fn colonization_cost(distance: f64, config: &EconomyConfig) -> ColonizationCost {
    let multiplier = 1.0 + distance * config.colonization_distance_factor;
    ColonizationCost {
        cost: config.colonization_base_cost.scale_floor(multiplier),
        multiplier,
    }
}

/// Price quote shown before colonizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColonizationQuote {
    /// Resources that would be charged.
    pub cost: ResourceAmounts,
    /// Distance from the main planet, rounded to one decimal.
    pub distance: f64,
    /// Distance multiplier, rounded to two decimals. Zero for a first planet.
    pub multiplier: f64,
    /// Whether this would be the player's first planet.
    pub is_first_planet: bool,
}

impl ColonizationQuote {
    /// Quote for a player without planets.
    #[must_use]
    pub const fn first_planet() -> Self {
        Self {
            cost: ResourceAmounts::ZERO,
            distance: 0.0,
            multiplier: 0.0,
            is_first_planet: true,
        }
    }

    /// Quote for a colony `distance` sectors from the main planet.
    #[must_use]
    pub fn at_distance(distance: f64, config: &EconomyConfig) -> Self {
        let ColonizationCost { cost, multiplier } = colonization_cost(distance, config);
        Self {
            cost,
            distance: round_to(distance, 1),
            multiplier: round_to(multiplier, 2),
            is_first_planet: false,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Fresh ledger and level-0 buildings for a newly owned planet.
///
/// Stock comes from the starting stock, production from the baseline
/// trickle, capacities from the default capacity. Energy starts at zero.
#[must_use]
pub fn seed_colony(
    planet_id: PlanetId,
    now: DateTime<Utc>,
    config: &EconomyConfig,
    building_types: &[BuildingType],
    ids: &mut IdSequence,
) -> (PlanetResources, Vec<Building>) {
    let mut resources = PlanetResources::new(
        planet_id,
        config.starting_stock,
        config.default_capacity,
        now,
    );
    for kind in ResourceKind::PRODUCED {
        resources.set_production(kind, config.baseline_production.get(kind));
    }

    let buildings = building_types
        .iter()
        .map(|&ty| Building::new(ids.next_building(), planet_id, ty, 0))
        .collect();

    (resources, buildings)
}
