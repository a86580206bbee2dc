//! Planets, owners and galaxy coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceKind;

/// Unique identifier for planets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub u64);

impl PlanetId {
    /// Create a new planet ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for galaxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GalaxyId(pub u32);

impl GalaxyId {
    /// Create a new galaxy ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Planet climate class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetKind {
    /// Balanced world, used for starters.
    #[default]
    Terra,
    /// Hot and dry.
    Desert,
    /// Frozen.
    Ice,
    /// Volcanic.
    Volcano,
    /// Gas giant.
    GasGiant,
    /// Asteroid field.
    Asteroid,
}

/// Per-planet production multipliers.
///
/// Fed into the production and energy formulas as `planet_bonus`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceBonuses {
    /// Metal multiplier.
    pub metal: f64,
    /// Crystal multiplier.
    pub crystal: f64,
    /// Deuterium multiplier.
    pub deuterium: f64,
    /// Energy multiplier.
    pub energy: f64,
    /// Rare earth multiplier.
    pub rare_earth: f64,
}

impl Default for ResourceBonuses {
    fn default() -> Self {
        Self {
            metal: 1.0,
            crystal: 1.0,
            deuterium: 1.0,
            energy: 1.0,
            rare_earth: 1.0,
        }
    }
}

impl ResourceBonuses {
    /// Multiplier for a single resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
            ResourceKind::Energy => self.energy,
            ResourceKind::RareEarth => self.rare_earth,
        }
    }
}

/// Location of a planet: galaxy, sector, system, orbital position.
///
/// Sectors are numbered from 1 and laid out row-major on a square grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    /// Galaxy.
    pub galaxy: GalaxyId,
    /// Sector within the galaxy (1-based).
    pub sector: u32,
    /// Star system within the sector.
    pub system: u32,
    /// Orbital slot within the system.
    pub position: u32,
}

impl Coordinates {
    /// Create coordinates.
    #[must_use]
    pub const fn new(galaxy: GalaxyId, sector: u32, system: u32, position: u32) -> Self {
        Self {
            galaxy,
            sector,
            system,
            position,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.galaxy.0, self.sector, self.system, self.position
        )
    }
}

/// A planet in the galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Unique ID.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Owner, if colonized.
    pub owner: Option<UserId>,
    /// Climate class.
    pub kind: PlanetKind,
    /// Production multipliers.
    pub bonuses: ResourceBonuses,
    /// Location.
    pub coordinates: Coordinates,
    /// Planet size.
    pub size: u32,
    /// Whether new players may pick this planet as their start.
    pub is_starter: bool,
    /// Global claim sequence number. Orders a player's planets by
    /// colonization time; the lowest is the main planet.
    pub claim_seq: Option<u64>,
}

impl Planet {
    /// Create an unowned terra planet with neutral bonuses.
    #[must_use]
    pub fn new(id: PlanetId, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            kind: PlanetKind::Terra,
            bonuses: ResourceBonuses::default(),
            coordinates,
            size: 5,
            is_starter: false,
            claim_seq: None,
        }
    }

    /// Set the planet kind.
    #[must_use]
    pub fn with_kind(mut self, kind: PlanetKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the production multipliers.
    #[must_use]
    pub fn with_bonuses(mut self, bonuses: ResourceBonuses) -> Self {
        self.bonuses = bonuses;
        self
    }

    /// Set the planet size.
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Mark the planet as a starter.
    #[must_use]
    pub fn starter(mut self) -> Self {
        self.is_starter = true;
        self
    }

    /// Check if `user` owns this planet.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == Some(user)
    }

    /// Check if the planet has an owner.
    #[must_use]
    pub const fn is_colonized(&self) -> bool {
        self.owner.is_some()
    }
}
