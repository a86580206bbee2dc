//! Building instances on planets.
//!
//! A planet holds at most one building per type. A building is either idle
//! at some level or upgrading towards `level + 1` with a known finish
//! instant.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::BuildingType;
use crate::planet::PlanetId;

/// Unique identifier for building instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u64);

impl BuildingId {
    /// Create a new building ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeState {
    /// Not upgrading.
    Idle {
        /// Current level.
        level: u32,
    },
    /// Upgrading to `level + 1`.
    Upgrading {
        /// Level before the upgrade completes.
        level: u32,
        /// Instant the upgrade completes.
        finish_at: DateTime<Utc>,
    },
}

/// A building on a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Unique ID.
    pub id: BuildingId,
    /// Planet the building stands on.
    pub planet_id: PlanetId,
    /// Building type.
    pub building_type: BuildingType,
    /// Completed level. Zero means planned but never built.
    pub level: u32,
    /// Finish instant of the upgrade in progress, if any.
    pub upgrade_finish_at: Option<DateTime<Utc>>,
}

impl Building {
    /// Create an idle building.
    #[must_use]
    pub const fn new(
        id: BuildingId,
        planet_id: PlanetId,
        building_type: BuildingType,
        level: u32,
    ) -> Self {
        Self {
            id,
            planet_id,
            building_type,
            level,
            upgrade_finish_at: None,
        }
    }

    /// Check if an upgrade is in progress.
    #[must_use]
    pub const fn is_upgrading(&self) -> bool {
        self.upgrade_finish_at.is_some()
    }

    /// Check if the upgrade in progress has reached its finish instant.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.upgrade_finish_at.is_some_and(|t| t <= now)
    }

    /// Whole seconds until the upgrade completes, if upgrading.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.upgrade_finish_at
            .map(|t| (t - now).num_seconds().max(0))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> UpgradeState {
        match self.upgrade_finish_at {
            Some(finish_at) => UpgradeState::Upgrading {
                level: self.level,
                finish_at,
            },
            None => UpgradeState::Idle { level: self.level },
        }
    }
}

/// Building levels of one planet, keyed by type.
///
/// Types without an entry are at level 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildingLevels(HashMap<BuildingType, u32>);

impl BuildingLevels {
    /// Level of a building type.
    #[must_use]
    pub fn level(&self, building: BuildingType) -> u32 {
        self.0.get(&building).copied().unwrap_or(0)
    }

    /// Set the level of a building type.
    pub fn set(&mut self, building: BuildingType, level: u32) {
        self.0.insert(building, level);
    }
}

impl<'a> FromIterator<&'a Building> for BuildingLevels {
    fn from_iter<I: IntoIterator<Item = &'a Building>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|b| (b.building_type, b.level))
                .collect(),
        )
    }
}
