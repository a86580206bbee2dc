//! Persistence seam.
//!
//! The engine never talks to a database directly. It runs closures over
//! [`Tables`] through a [`GameStore`], which guarantees that a `write`
//! closure sees and commits state atomically: either every change made by
//! the closure becomes visible, or (when it returns an error) none does.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::buildings::{Building, BuildingId, BuildingLevels};
use crate::data::BuildingType;
use crate::error::{GameError, Result};
use crate::planet::{GalaxyId, Planet, PlanetId, UserId};
use crate::resources::PlanetResources;

/// Monotonic ID allocator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSequence(u64);

impl IdSequence {
    /// Allocate the next value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Allocate the next building ID.
    pub fn next_building(&mut self) -> BuildingId {
        BuildingId::new(self.next())
    }
}

/// A planet together with its ledger and buildings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetRecord {
    /// The planet.
    pub planet: Planet,
    /// Resource ledger. Present once the planet is owned.
    pub resources: Option<PlanetResources>,
    /// Buildings, at most one per type.
    pub buildings: Vec<Building>,
}

impl PlanetRecord {
    /// Wrap an unowned planet.
    #[must_use]
    pub const fn new(planet: Planet) -> Self {
        Self {
            planet,
            resources: None,
            buildings: Vec::new(),
        }
    }

    /// Current building levels.
    #[must_use]
    pub fn levels(&self) -> BuildingLevels {
        self.buildings.iter().collect()
    }

    /// Level of one building type (zero when absent).
    #[must_use]
    pub fn level(&self, building: BuildingType) -> u32 {
        self.building(building).map_or(0, |b| b.level)
    }

    /// Building of a type, if present.
    #[must_use]
    pub fn building(&self, building: BuildingType) -> Option<&Building> {
        self.buildings.iter().find(|b| b.building_type == building)
    }

    /// Mutable building of a type, if present.
    pub fn building_mut(&mut self, building: BuildingType) -> Option<&mut Building> {
        self.buildings
            .iter_mut()
            .find(|b| b.building_type == building)
    }

    /// The building currently upgrading, if any.
    #[must_use]
    pub fn upgrading(&self) -> Option<&Building> {
        self.buildings.iter().find(|b| b.is_upgrading())
    }

    /// Resource ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the planet has no ledger.
    pub fn resources(&self) -> Result<&PlanetResources> {
        self.resources
            .as_ref()
            .ok_or_else(|| missing_ledger(self.planet.id))
    }

    /// Mutable resource ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the planet has no ledger.
    pub fn resources_mut(&mut self) -> Result<&mut PlanetResources> {
        let id = self.planet.id;
        self.resources.as_mut().ok_or_else(|| missing_ledger(id))
    }
}

fn missing_ledger(id: PlanetId) -> GameError {
    GameError::InvalidState(format!("planet {id} has no resource ledger"))
}

/// All economy state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    /// Planets by ID.
    pub planets: BTreeMap<PlanetId, PlanetRecord>,
    /// Building ID allocator.
    pub building_ids: IdSequence,
    /// Ownership claim sequence.
    pub claim_seq: IdSequence,
}

impl Tables {
    /// Add a planet. An existing planet with the same ID is replaced.
    pub fn insert_planet(&mut self, record: PlanetRecord) {
        self.planets.insert(record.planet.id, record);
    }

    /// Planet by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] if absent.
    pub fn planet(&self, id: PlanetId) -> Result<&PlanetRecord> {
        self.planets
            .get(&id)
            .ok_or_else(|| GameError::planet_not_found(id))
    }

    /// Planet owned by `user`.
    ///
    /// Planets owned by someone else are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`].
    pub fn owned_planet(&self, id: PlanetId, user: UserId) -> Result<&PlanetRecord> {
        self.planets
            .get(&id)
            .filter(|r| r.planet.is_owned_by(user))
            .ok_or_else(|| GameError::planet_not_found(id))
    }

    /// Mutable planet owned by `user`, with the building ID allocator.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`].
    pub fn owned_planet_mut(
        &mut self,
        id: PlanetId,
        user: UserId,
    ) -> Result<(&mut PlanetRecord, &mut IdSequence)> {
        let record = self
            .planets
            .get_mut(&id)
            .filter(|r| r.planet.is_owned_by(user))
            .ok_or_else(|| GameError::planet_not_found(id))?;
        Ok((record, &mut self.building_ids))
    }

    /// Planets of `user`, earliest claim first.
    #[must_use]
    pub fn planets_of(&self, user: UserId) -> Vec<&PlanetRecord> {
        let mut owned: Vec<&PlanetRecord> = self
            .planets
            .values()
            .filter(|r| r.planet.is_owned_by(user))
            .collect();
        owned.sort_by_key(|r| (r.planet.claim_seq, r.planet.id));
        owned
    }

    /// The user's earliest claimed planet.
    #[must_use]
    pub fn main_planet(&self, user: UserId) -> Option<&PlanetRecord> {
        self.planets_of(user).into_iter().next()
    }

    /// Planets of a galaxy.
    pub fn planets_in(&self, galaxy: GalaxyId) -> impl Iterator<Item = &PlanetRecord> {
        self.planets
            .values()
            .filter(move |r| r.planet.coordinates.galaxy == galaxy)
    }

    /// Give an unowned planet to `user`.
    ///
    /// The ownership check and the write are one step; a planet that
    /// already has an owner is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] or [`GameError::AlreadyOwned`].
    pub fn claim(&mut self, id: PlanetId, user: UserId) -> Result<&mut PlanetRecord> {
        let seq = self.claim_seq.next();
        let record = self
            .planets
            .get_mut(&id)
            .ok_or_else(|| GameError::planet_not_found(id))?;
        if record.planet.owner.is_some() {
            return Err(GameError::AlreadyOwned(id));
        }
        record.planet.owner = Some(user);
        record.planet.claim_seq = Some(seq);
        Ok(record)
    }
}

/// Transactional access to the economy tables.
///
/// Implementations must run each `write` closure in isolation from every
/// other `read` or `write`, and must discard its changes when it returns
/// an error.
pub trait GameStore: Send + Sync {
    /// Run `f` over a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns the closure's error or a [`GameError::Storage`] failure.
    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T>;

    /// Run `f` as one atomic read-modify-write transaction.
    ///
    /// # Errors
    ///
    /// Returns the closure's error or a [`GameError::Storage`] failure.
    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T>;
}

/// In-memory store.
///
/// A single mutex serializes all access. Writes run on a working copy that
/// replaces the live tables only when the closure succeeds.
///
/// Each `write` clones every table, so its cost grows with the size of the
/// world, and engine observations such as projections are writes. This
/// suits tests, tools and small worlds; a large deployment needs a store
/// with real row-level transactions behind [`GameStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `tables`.
    #[must_use]
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Copy of the current tables.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Storage`] if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Tables> {
        self.read(|t| Ok(t.clone()))
    }
}

impl GameStore for MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let tables = self
            .tables
            .lock()
            .map_err(|e| GameError::Storage(e.to_string()))?;
        f(&tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| GameError::Storage(e.to_string()))?;
        let mut working = tables.clone();
        let value = f(&mut working)?;
        *tables = working;
        Ok(value)
    }
}
