//! Economy tuning.
//!
//! Every constant of the economy that is not part of a building definition
//! lives here. [`EconomyConfig::default`] carries the live game values;
//! a RON file may override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::BuildingType;
use crate::error::{GameError, Result};
use crate::resources::{ResourceAmounts, ResourceKind};

/// Hourly rates of the three produced resources.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionRates {
    /// Metal per hour.
    pub metal: f64,
    /// Crystal per hour.
    pub crystal: f64,
    /// Deuterium per hour.
    pub deuterium: f64,
}

impl ProductionRates {
    /// Rate of a single resource (zero for unproduced resources).
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
            ResourceKind::Energy | ResourceKind::RareEarth => 0.0,
        }
    }
}

/// Tunable constants of the economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Trickle substituted when a resource has no producing building.
    pub baseline_production: ProductionRates,
    /// Capacity of every capped resource without a storage building.
    pub default_capacity: u64,
    /// Stock of a freshly claimed planet.
    pub starting_stock: ResourceAmounts,
    /// Colonization price at distance zero.
    pub colonization_base_cost: ResourceAmounts,
    /// Extra price multiplier per unit of sector distance.
    pub colonization_distance_factor: f64,
    /// Side length of the square sector grid.
    pub sector_grid_width: u32,
    /// Projections older than this many seconds are written back.
    pub persist_threshold_secs: i64,
    /// Share of the upgrade price returned on cancel.
    pub cancel_refund_ratio: f64,
    /// Hourly deuterium burned by the fusion reactor, before level growth.
    pub fusion_deuterium_base: f64,
    /// Buildings seeded at level 0 on a colonized planet.
    pub colony_buildings: Vec<BuildingType>,
    /// Buildings seeded at level 0 on a claimed starter planet.
    pub starter_buildings: Vec<BuildingType>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            baseline_production: ProductionRates {
                metal: 30.0,
                crystal: 15.0,
                deuterium: 0.0,
            },
            default_capacity: 10_000,
            starting_stock: ResourceAmounts::new(500, 300, 100),
            colonization_base_cost: ResourceAmounts::new(10_000, 5_000, 2_500),
            colonization_distance_factor: 0.5,
            sector_grid_width: 5,
            persist_threshold_secs: 60,
            cancel_refund_ratio: 0.5,
            fusion_deuterium_base: 0.0,
            colony_buildings: vec![
                BuildingType::MetalMine,
                BuildingType::CrystalMine,
                BuildingType::SolarPlant,
            ],
            starter_buildings: vec![
                BuildingType::MetalMine,
                BuildingType::CrystalMine,
                BuildingType::SolarPlant,
                BuildingType::MetalStorage,
                BuildingType::CrystalStorage,
            ],
        }
    }
}

impl EconomyConfig {
    /// Parse and validate a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParse`] or [`GameError::InvalidData`].
    pub fn from_ron(text: &str) -> Result<Self> {
        Self::parse(text, "<inline>")
    }

    /// Load a config from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| GameError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        Self::parse(&text, &path_str)
    }

    fn parse(text: &str, name: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::DataParse {
            path: name.to_string(),
            source: e,
        })?;

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidData {
                data: name.to_string(),
                errors,
            });
        }

        tracing::debug!(source = name, "Loaded economy config");
        Ok(config)
    }

    /// Number of sectors in a galaxy.
    #[must_use]
    pub const fn sector_count(&self) -> u32 {
        self.sector_grid_width.saturating_mul(self.sector_grid_width)
    }

    /// Persistence threshold in milliseconds.
    #[must_use]
    pub const fn persist_threshold_ms(&self) -> i64 {
        self.persist_threshold_secs.saturating_mul(1000)
    }

    /// Validate the config values.
    ///
    /// Returns a list of validation errors (empty if valid).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for kind in ResourceKind::PRODUCED {
            let rate = self.baseline_production.get(kind);
            if !rate.is_finite() || rate < 0.0 {
                errors.push(format!(
                    "baseline_production.{kind} must be a non-negative number"
                ));
            }
        }

        if self.default_capacity == 0 {
            errors.push("default_capacity must be positive".to_string());
        }

        for kind in ResourceKind::PRODUCED {
            if self.starting_stock.get(kind) > self.default_capacity {
                errors.push(format!(
                    "starting_stock.{kind} exceeds default_capacity"
                ));
            }
        }

        if !self.colonization_distance_factor.is_finite()
            || self.colonization_distance_factor < 0.0
        {
            errors.push("colonization_distance_factor must be non-negative".to_string());
        }

        if self.sector_grid_width == 0 {
            errors.push("sector_grid_width must be positive".to_string());
        }

        if self.persist_threshold_secs < 0 {
            errors.push("persist_threshold_secs must be non-negative".to_string());
        }

        if !(0.0..=1.0).contains(&self.cancel_refund_ratio) {
            errors.push("cancel_refund_ratio must be within 0..=1".to_string());
        }

        if !self.fusion_deuterium_base.is_finite() || self.fusion_deuterium_base < 0.0 {
            errors.push("fusion_deuterium_base must be non-negative".to_string());
        }

        for (field, list) in [
            ("colony_buildings", &self.colony_buildings),
            ("starter_buildings", &self.starter_buildings),
        ] {
            let mut seen = Vec::with_capacity(list.len());
            for building in list {
                if seen.contains(building) {
                    errors.push(format!("{field}: duplicate {building}"));
                }
                seen.push(*building);
            }
        }

        errors
    }
}
