//! Test fixtures and helpers.
//!
//! Pre-built worlds and instants for consistent testing. Panics on misuse;
//! fixtures are only for tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use starhold_core::colonization::seed_colony;
use starhold_core::prelude::*;
use starhold_core::upgrades::UpgradeController;

/// Galaxy used by every fixture planet.
pub const TEST_GALAXY: GalaxyId = GalaxyId(1);

/// Fixed reference instant (2023-11-14T22:13:20Z).
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0)
        .single()
        .expect("valid epoch")
}

/// `secs` seconds after [`epoch`].
#[must_use]
pub fn at(secs: i64) -> DateTime<Utc> {
    epoch() + Duration::seconds(secs)
}

/// `hours` hours after [`epoch`].
#[must_use]
pub fn at_hours(hours: i64) -> DateTime<Utc> {
    epoch() + Duration::hours(hours)
}

/// The standard building catalog.
#[must_use]
pub fn standard_catalog() -> Catalog {
    Catalog::standard().expect("standard catalog loads")
}

/// Shorthand for a planet ID.
#[must_use]
pub const fn pid(id: u64) -> PlanetId {
    PlanetId(id)
}

/// Shorthand for a user ID.
#[must_use]
pub const fn uid(id: u64) -> UserId {
    UserId(id)
}

/// An unowned terra planet in [`TEST_GALAXY`].
#[must_use]
pub fn create_test_planet(id: u64, sector: u32) -> Planet {
    Planet::new(
        PlanetId(id),
        format!("Planet {id}"),
        Coordinates::new(TEST_GALAXY, sector, 1, (id % 15) as u32 + 1),
    )
}

/// Builder for a pre-seeded engine.
///
/// # Example
///
/// ```ignore
/// let engine = WorldBuilder::new()
///     .colony(1, 1, 7, ResourceAmounts::new(1000, 1000, 1000))
///     .building(1, BuildingType::MetalMine, 3)
///     .planet(2, 5)
///     .build();
/// ```
#[derive(Debug)]
pub struct WorldBuilder {
    tables: Tables,
    catalog: Catalog,
    config: EconomyConfig,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    /// Empty world with the standard catalog and default config.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Tables::default(),
            catalog: standard_catalog(),
            config: EconomyConfig::default(),
        }
    }

    /// Replace the config.
    #[must_use]
    pub fn with_config(mut self, config: EconomyConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Add an unowned planet.
    #[must_use]
    pub fn planet(mut self, id: u64, sector: u32) -> Self {
        self.tables
            .insert_planet(PlanetRecord::new(create_test_planet(id, sector)));
        self
    }

    /// Add an unowned planet built by the caller.
    #[must_use]
    pub fn custom_planet(mut self, planet: Planet) -> Self {
        self.tables.insert_planet(PlanetRecord::new(planet));
        self
    }

    /// Add an unowned starter planet.
    #[must_use]
    pub fn starter_planet(mut self, id: u64, sector: u32) -> Self {
        self.tables
            .insert_planet(PlanetRecord::new(create_test_planet(id, sector).starter()));
        self
    }

    /// Add a planet owned by `owner`, seeded as a fresh colony at [`epoch`]
    /// with the given stock.
    ///
    /// Colonies are claimed in call order, so the first colony of an owner
    /// is their main planet.
    #[must_use]
    pub fn colony(self, id: u64, sector: u32, owner: u64, stock: ResourceAmounts) -> Self {
        self.colony_planet(create_test_planet(id, sector), owner, stock)
    }

    /// Like [`Self::colony`] for a planet built by the caller.
    #[must_use]
    pub fn colony_planet(mut self, planet: Planet, owner: u64, stock: ResourceAmounts) -> Self {
        let id = planet.id;
        self.tables.insert_planet(PlanetRecord::new(planet));
        let (mut resources, buildings) = seed_colony(
            id,
            epoch(),
            &self.config,
            &self.config.colony_buildings,
            &mut self.tables.building_ids,
        );
        resources.metal = stock.metal as f64;
        resources.crystal = stock.crystal as f64;
        resources.deuterium = stock.deuterium as f64;
        resources.rare_earth = stock.rare_earth as f64;

        let record = self
            .tables
            .claim(id, UserId(owner))
            .expect("fixture planet is unowned");
        record.resources = Some(resources);
        record.buildings = buildings;
        self
    }

    /// Set a building's level on an owned planet and refresh the planet's
    /// statistics as if the level had been reached by upgrading.
    #[must_use]
    pub fn building(mut self, planet: u64, building_type: BuildingType, level: u32) -> Self {
        let controller = UpgradeController::new(&self.catalog, &self.config);
        let record = self
            .tables
            .planets
            .get_mut(&PlanetId(planet))
            .expect("fixture planet exists");
        if record.building(building_type).is_none() {
            let id = self.tables.building_ids.next_building();
            record
                .buildings
                .push(Building::new(id, PlanetId(planet), building_type, 0));
        }
        record
            .building_mut(building_type)
            .expect("building just ensured")
            .level = level;
        controller
            .recompute_stats(record, building_type)
            .expect("fixture planet has a ledger");
        self
    }

    /// Tables built so far.
    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Build the engine.
    #[must_use]
    pub fn build(self) -> Engine<MemoryStore> {
        Engine::new(
            MemoryStore::with_tables(self.tables),
            Arc::new(self.catalog),
            Arc::new(self.config),
        )
    }
}
