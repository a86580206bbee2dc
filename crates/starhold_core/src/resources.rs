//! Resource amounts and the per-planet resource ledger.
//!
//! Prices (costs, refunds, colonization fees) are whole units. Stock is
//! real-valued so that accrual between reconciliations is not lost to
//! rounding; it is only floored for display and affordability checks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::planet::PlanetId;

/// The five resources of the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Structural metal.
    Metal,
    /// Crystal for electronics.
    Crystal,
    /// Deuterium fuel.
    Deuterium,
    /// Energy. A flow, never stocked.
    Energy,
    /// Rare earth. Stocked but not produced by any building.
    RareEarth,
}

impl ResourceKind {
    /// Resources with production rates and storage caps.
    pub const PRODUCED: [Self; 3] = [Self::Metal, Self::Crystal, Self::Deuterium];

    /// Resources held as planet stock.
    pub const STOCKED: [Self; 4] = [Self::Metal, Self::Crystal, Self::Deuterium, Self::RareEarth];

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metal => "metal",
            Self::Crystal => "crystal",
            Self::Deuterium => "deuterium",
            Self::Energy => "energy",
            Self::RareEarth => "rare_earth",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-unit amounts of every resource.
///
/// Used for building costs, refunds and colonization fees. Missing fields
/// deserialize as zero, so data files only list what a price actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceAmounts {
    /// Metal.
    pub metal: u64,
    /// Crystal.
    pub crystal: u64,
    /// Deuterium.
    pub deuterium: u64,
    /// Energy.
    pub energy: u64,
    /// Rare earth.
    pub rare_earth: u64,
}

impl ResourceAmounts {
    /// No resources at all.
    pub const ZERO: Self = Self {
        metal: 0,
        crystal: 0,
        deuterium: 0,
        energy: 0,
        rare_earth: 0,
    };

    /// Create amounts of the three produced resources.
    #[must_use]
    pub const fn new(metal: u64, crystal: u64, deuterium: u64) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
            energy: 0,
            rare_earth: 0,
        }
    }

    /// Set the rare earth amount.
    #[must_use]
    pub const fn with_rare_earth(mut self, rare_earth: u64) -> Self {
        self.rare_earth = rare_earth;
        self
    }

    /// Amount of a single resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
            ResourceKind::Energy => self.energy,
            ResourceKind::RareEarth => self.rare_earth,
        }
    }

    /// Multiply every amount by `factor`, flooring each result.
    ///
    /// Results beyond `u64::MAX` saturate.
    #[must_use]
    pub fn scale_floor(&self, factor: f64) -> Self {
        let scale = |amount: u64| (amount as f64 * factor).floor() as u64;
        Self {
            metal: scale(self.metal),
            crystal: scale(self.crystal),
            deuterium: scale(self.deuterium),
            energy: scale(self.energy),
            rare_earth: scale(self.rare_earth),
        }
    }

    /// True when every amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for ResourceAmounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} metal, {} crystal, {} deuterium",
            self.metal, self.crystal, self.deuterium
        )?;
        if self.rare_earth > 0 {
            write!(f, ", {} rare earth", self.rare_earth)?;
        }
        Ok(())
    }
}

/// Resource ledger of a single planet.
///
/// Holds the stock as of `last_updated` together with the rates needed to
/// project it forward. See [`crate::accrual`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetResources {
    /// Owning planet.
    pub planet_id: PlanetId,

    /// Metal stock.
    pub metal: f64,
    /// Crystal stock.
    pub crystal: f64,
    /// Deuterium stock.
    pub deuterium: f64,
    /// Rare earth stock.
    pub rare_earth: f64,

    /// Metal per hour.
    pub metal_production: f64,
    /// Crystal per hour.
    pub crystal_production: f64,
    /// Deuterium per hour, net of fusion burn. May be negative.
    pub deuterium_production: f64,
    /// Energy produced.
    pub energy_production: u64,
    /// Energy consumed.
    pub energy_consumption: u64,

    /// Metal cap.
    pub metal_capacity: u64,
    /// Crystal cap.
    pub crystal_capacity: u64,
    /// Deuterium cap.
    pub deuterium_capacity: u64,

    /// Instant the stock was last reconciled.
    pub last_updated: DateTime<Utc>,
}

impl PlanetResources {
    /// Create an empty ledger with the given stock, no production and
    /// uniform capacity.
    #[must_use]
    pub fn new(
        planet_id: PlanetId,
        stock: ResourceAmounts,
        capacity: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            planet_id,
            metal: stock.metal as f64,
            crystal: stock.crystal as f64,
            deuterium: stock.deuterium as f64,
            rare_earth: stock.rare_earth as f64,
            metal_production: 0.0,
            crystal_production: 0.0,
            deuterium_production: 0.0,
            energy_production: 0,
            energy_consumption: 0,
            metal_capacity: capacity,
            crystal_capacity: capacity,
            deuterium_capacity: capacity,
            last_updated: now,
        }
    }

    /// Current stock of a resource. Energy is never stocked.
    #[must_use]
    pub fn stock(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
            ResourceKind::RareEarth => self.rare_earth,
            ResourceKind::Energy => 0.0,
        }
    }

    fn stock_mut(&mut self, kind: ResourceKind) -> Option<&mut f64> {
        match kind {
            ResourceKind::Metal => Some(&mut self.metal),
            ResourceKind::Crystal => Some(&mut self.crystal),
            ResourceKind::Deuterium => Some(&mut self.deuterium),
            ResourceKind::RareEarth => Some(&mut self.rare_earth),
            ResourceKind::Energy => None,
        }
    }

    /// Hourly production of a resource (zero for unproduced resources).
    #[must_use]
    pub fn production(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Metal => self.metal_production,
            ResourceKind::Crystal => self.crystal_production,
            ResourceKind::Deuterium => self.deuterium_production,
            ResourceKind::Energy | ResourceKind::RareEarth => 0.0,
        }
    }

    /// Set the hourly production of a produced resource.
    pub fn set_production(&mut self, kind: ResourceKind, rate: f64) {
        match kind {
            ResourceKind::Metal => self.metal_production = rate,
            ResourceKind::Crystal => self.crystal_production = rate,
            ResourceKind::Deuterium => self.deuterium_production = rate,
            ResourceKind::Energy | ResourceKind::RareEarth => {}
        }
    }

    /// Storage cap of a resource. `None` means uncapped.
    #[must_use]
    pub const fn capacity(&self, kind: ResourceKind) -> Option<u64> {
        match kind {
            ResourceKind::Metal => Some(self.metal_capacity),
            ResourceKind::Crystal => Some(self.crystal_capacity),
            ResourceKind::Deuterium => Some(self.deuterium_capacity),
            ResourceKind::Energy | ResourceKind::RareEarth => None,
        }
    }

    /// Set the storage cap of a produced resource.
    pub fn set_capacity(&mut self, kind: ResourceKind, capacity: u64) {
        match kind {
            ResourceKind::Metal => self.metal_capacity = capacity,
            ResourceKind::Crystal => self.crystal_capacity = capacity,
            ResourceKind::Deuterium => self.deuterium_capacity = capacity,
            ResourceKind::Energy | ResourceKind::RareEarth => {}
        }
    }

    /// Stock floored to whole units, as shown to players.
    #[must_use]
    pub fn displayed(&self) -> ResourceAmounts {
        let floor = |v: f64| v.max(0.0).floor() as u64;
        ResourceAmounts {
            metal: floor(self.metal),
            crystal: floor(self.crystal),
            deuterium: floor(self.deuterium),
            energy: 0,
            rare_earth: floor(self.rare_earth),
        }
    }

    /// Check that the stock covers `cost`.
    ///
    /// Energy in a cost is a flow requirement, not a stock debit, and is
    /// ignored here.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientResources`] for the first stocked
    /// resource that falls short.
    pub fn ensure_affordable(&self, cost: &ResourceAmounts) -> Result<()> {
        for kind in ResourceKind::STOCKED {
            let required = cost.get(kind);
            let available = self.stock(kind);
            if available < required as f64 {
                return Err(GameError::InsufficientResources {
                    resource: kind,
                    required,
                    available: available.max(0.0).floor() as u64,
                });
            }
        }
        Ok(())
    }

    /// Remove `cost` from the stock after checking affordability.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientResources`] and leaves the stock
    /// untouched if any resource falls short.
    pub fn debit(&mut self, cost: &ResourceAmounts) -> Result<()> {
        self.ensure_affordable(cost)?;
        for kind in ResourceKind::STOCKED {
            if let Some(stock) = self.stock_mut(kind) {
                *stock -= cost.get(kind) as f64;
            }
        }
        Ok(())
    }

    /// Add `amounts` to the stock, clamping capped resources at capacity.
    pub fn credit(&mut self, amounts: &ResourceAmounts) {
        for kind in ResourceKind::STOCKED {
            let cap = self.capacity(kind);
            if let Some(stock) = self.stock_mut(kind) {
                let mut next = *stock + amounts.get(kind) as f64;
                if let Some(cap) = cap {
                    next = next.min(cap as f64);
                }
                *stock = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ledger(metal: u64, crystal: u64, deuterium: u64) -> PlanetResources {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        PlanetResources::new(
            PlanetId::new(1),
            ResourceAmounts::new(metal, crystal, deuterium),
            10_000,
            now,
        )
    }

    #[test]
    fn test_scale_floor_rounds_down() {
        let cost = ResourceAmounts::new(75, 31, 1);
        assert_eq!(cost.scale_floor(0.5), ResourceAmounts::new(37, 15, 0));
    }

    #[test]
    fn test_scale_floor_saturates() {
        let cost = ResourceAmounts::new(u64::MAX, 1, 0);
        let scaled = cost.scale_floor(1e30);
        assert_eq!(scaled.metal, u64::MAX);
        assert_eq!(scaled.crystal, u64::MAX);
        assert_eq!(scaled.deuterium, 0);
    }

    #[test]
    fn test_debit_exact_cost() {
        let mut res = ledger(1000, 1000, 1000);
        res.debit(&ResourceAmounts::new(60, 15, 0)).unwrap();
        assert_eq!(res.displayed(), ResourceAmounts::new(940, 985, 1000));
    }

    #[test]
    fn test_debit_insufficient_leaves_stock() {
        let mut res = ledger(50, 1000, 1000);
        let err = res.debit(&ResourceAmounts::new(60, 15, 0)).unwrap_err();
        assert!(matches!(
            err,
            GameError::InsufficientResources {
                resource: ResourceKind::Metal,
                required: 60,
                available: 50,
            }
        ));
        assert_eq!(res.displayed(), ResourceAmounts::new(50, 1000, 1000));
    }

    #[test]
    fn test_energy_cost_is_not_debited() {
        let mut res = ledger(100, 100, 100);
        let cost = ResourceAmounts {
            energy: 500,
            ..ResourceAmounts::new(10, 10, 10)
        };
        res.debit(&cost).unwrap();
        assert_eq!(res.displayed(), ResourceAmounts::new(90, 90, 90));
    }

    #[test]
    fn test_credit_clamps_to_capacity() {
        let mut res = ledger(9_990, 0, 0);
        res.credit(&ResourceAmounts::new(50, 20, 0).with_rare_earth(5));
        assert_eq!(res.metal, 10_000.0);
        assert_eq!(res.crystal, 20.0);
        assert_eq!(res.rare_earth, 5.0);
    }

    #[test]
    fn test_displayed_floors_fractional_stock() {
        let mut res = ledger(0, 0, 0);
        res.metal = 12.99;
        res.crystal = 0.5;
        assert_eq!(res.displayed(), ResourceAmounts::new(12, 0, 0));
    }
}
