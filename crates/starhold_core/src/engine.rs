//! Engine facade.
//!
//! The operations callers use. Each runs inside a single store transaction,
//! completes any due upgrades on the planets it touches before reading
//! them, and receives the current instant from the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::accrual::{self, ResourceTotals};
use crate::catalog::Catalog;
use crate::colonization::{self, ColonizationQuote};
use crate::config::EconomyConfig;
use crate::data::BuildingType;
use crate::error::{GameError, Result};
use crate::planet::{GalaxyId, Planet, PlanetId, UserId};
use crate::resources::PlanetResources;
use crate::store::{GameStore, PlanetRecord, Tables};
use crate::upgrades::{
    BuildingSlot, CompletedUpgrade, UpgradeCancelled, UpgradeController, UpgradeStarted,
};

/// Planet counts of one sector, as seen by one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectorOwnership {
    /// Sector number (1-based).
    pub sector: u32,
    /// Planets in the sector.
    pub total_planets: u32,
    /// Planets with any owner.
    pub colonized_planets: u32,
    /// Planets owned by the asking player.
    pub owned_by_caller: u32,
}

/// The economy engine.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
    catalog: Arc<Catalog>,
    config: Arc<EconomyConfig>,
}

impl<S: GameStore> Engine<S> {
    /// Create an engine over a store, catalog and config.
    #[must_use]
    pub fn new(store: S, catalog: Arc<Catalog>, config: Arc<EconomyConfig>) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// Create an engine with the standard catalog and default config.
    ///
    /// # Errors
    ///
    /// Returns an error if the standard catalog fails to load.
    pub fn with_defaults(store: S) -> Result<Self> {
        Ok(Self::new(
            store,
            Arc::new(Catalog::standard()?),
            Arc::new(EconomyConfig::default()),
        ))
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Building catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Economy config.
    #[must_use]
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    fn controller(&self) -> UpgradeController<'_> {
        UpgradeController::new(&self.catalog, &self.config)
    }

    /// Add unowned planets to the galaxy.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Storage`] if the store fails.
    pub fn add_planets(&self, planets: impl IntoIterator<Item = Planet>) -> Result<()> {
        let planets: Vec<Planet> = planets.into_iter().collect();
        self.store.write(|tables| {
            for planet in planets {
                tables.insert_planet(PlanetRecord::new(planet));
            }
            Ok(())
        })
    }

    /// Resources of a planet as of `now`.
    ///
    /// Completes due upgrades, then projects the ledger. The projection is
    /// written back once it spans more than the persistence threshold.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] if the planet does not exist or is
    /// not owned by `user`.
    pub fn projected_resources(
        &self,
        planet: PlanetId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<PlanetResources> {
        let ctl = self.controller();
        self.store.write(|tables| {
            let (record, _) = tables.owned_planet_mut(planet, user)?;
            ctl.complete_due(record, now)?;
            let resources = record.resources_mut()?;
            let projection = accrual::project(resources, now, &self.config);
            if projection.should_persist {
                *resources = projection.resources.clone();
                tracing::debug!(
                    planet = %planet,
                    elapsed_hours = projection.elapsed_hours,
                    "Persisted projected resources"
                );
            }
            Ok(projection.resources)
        })
    }

    /// Start upgrading a building.
    ///
    /// # Errors
    ///
    /// In check order: [`GameError::InvalidBuildingType`],
    /// [`GameError::NotFound`], [`GameError::MaxLevelReached`],
    /// [`GameError::RequirementsNotMet`],
    /// [`GameError::UpgradeAlreadyInProgress`],
    /// [`GameError::InsufficientResources`]. On error nothing changes.
    pub fn start_upgrade(
        &self,
        planet: PlanetId,
        user: UserId,
        building_type: BuildingType,
        now: DateTime<Utc>,
    ) -> Result<UpgradeStarted> {
        self.catalog.definition(building_type)?;
        let ctl = self.controller();
        self.store.write(|tables| {
            let (record, ids) = tables.owned_planet_mut(planet, user)?;
            ctl.start(record, building_type, now, ids)
        })
    }

    /// Complete every upgrade of a planet that is due at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for unknown or foreign planets.
    pub fn complete_due_upgrades(
        &self,
        planet: PlanetId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<CompletedUpgrade>> {
        let ctl = self.controller();
        self.store.write(|tables| {
            let (record, _) = tables.owned_planet_mut(planet, user)?;
            ctl.complete_due(record, now)
        })
    }

    /// Cancel the upgrade of a building and refund part of its cost.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidBuildingType`], [`GameError::NotFound`]
    /// or [`GameError::NoActiveUpgrade`].
    pub fn cancel_upgrade(
        &self,
        planet: PlanetId,
        user: UserId,
        building_type: BuildingType,
        now: DateTime<Utc>,
    ) -> Result<UpgradeCancelled> {
        self.catalog.definition(building_type)?;
        let ctl = self.controller();
        self.store.write(|tables| {
            let (record, _) = tables.owned_planet_mut(planet, user)?;
            ctl.cancel(record, building_type, now)
        })
    }

    /// Price of colonizing `target`, without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] if the target does not exist.
    pub fn quote_colonization_cost(
        &self,
        target: PlanetId,
        user: UserId,
    ) -> Result<ColonizationQuote> {
        self.store.read(|tables| {
            let target = tables.planet(target)?;
            Ok(self.quote(tables, &target.planet, user))
        })
    }

    fn quote(&self, tables: &Tables, target: &Planet, user: UserId) -> ColonizationQuote {
        match tables.main_planet(user) {
            None => ColonizationQuote::first_planet(),
            Some(main) => {
                let distance = colonization::sector_distance(
                    main.planet.coordinates.sector,
                    target.coordinates.sector,
                    self.config.sector_grid_width,
                );
                ColonizationQuote::at_distance(distance, &self.config)
            }
        }
    }

    /// Colonize an unowned planet.
    ///
    /// The first planet of a player is free. Later colonies are paid from
    /// the main planet's reconciled stock. The colony is named after the
    /// player's new planet count.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`], [`GameError::AlreadyOwned`] or
    /// [`GameError::InsufficientResources`]. On error nothing changes.
    pub fn colonize(
        &self,
        target: PlanetId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<PlanetId> {
        let ctl = self.controller();
        self.store.write(|tables| {
            let record = tables.planet(target)?;
            if record.planet.is_colonized() {
                return Err(GameError::AlreadyOwned(target));
            }
            let quote = self.quote(tables, &record.planet, user);
            let owned_before = tables.planets_of(user).len();

            if !quote.is_first_planet {
                let main_id = tables
                    .main_planet(user)
                    .map(|m| m.planet.id)
                    .ok_or_else(|| GameError::InvalidState("main planet vanished".to_string()))?;
                let (main, _) = tables.owned_planet_mut(main_id, user)?;
                ctl.complete_due(main, now)?;
                let resources = main.resources_mut()?;
                accrual::reconcile(resources, now, &self.config);
                resources.debit(&quote.cost)?;
            }

            let name = format!("Colony {}", owned_before + 1);
            self.settle(tables, target, user, now, Some(name), ColonyKind::Colony)?;

            tracing::info!(
                planet = %target,
                user = %user,
                cost = %quote.cost,
                first_planet = quote.is_first_planet,
                "Planet colonized"
            );
            Ok(target)
        })
    }

    /// Claim an unowned starter planet for free.
    ///
    /// Only a user without planets may claim one; later planets go through
    /// [`Engine::colonize`]. The planet keeps its name and is seeded with
    /// the starter buildings.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`], [`GameError::NotStarterPlanet`],
    /// [`GameError::AlreadyOwned`] or [`GameError::AlreadyHasPlanet`].
    pub fn claim_starter_planet(
        &self,
        target: PlanetId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<PlanetId> {
        self.store.write(|tables| {
            let planet = &tables.planet(target)?.planet;
            if !planet.is_starter {
                return Err(GameError::NotStarterPlanet(target));
            }
            if planet.is_colonized() {
                return Err(GameError::AlreadyOwned(target));
            }
            if !tables.planets_of(user).is_empty() {
                tracing::warn!(
                    planet = %target,
                    user = %user,
                    "Starter claim by a user with planets"
                );
                return Err(GameError::AlreadyHasPlanet(user));
            }
            self.settle(tables, target, user, now, None, ColonyKind::Starter)?;
            tracing::info!(planet = %target, user = %user, "Starter planet claimed");
            Ok(target)
        })
    }

    fn settle(
        &self,
        tables: &mut Tables,
        target: PlanetId,
        user: UserId,
        now: DateTime<Utc>,
        name: Option<String>,
        kind: ColonyKind,
    ) -> Result<()> {
        let seed_types = match kind {
            ColonyKind::Colony => &self.config.colony_buildings,
            ColonyKind::Starter => &self.config.starter_buildings,
        };
        let mut ids = std::mem::take(&mut tables.building_ids);
        let (resources, buildings) =
            colonization::seed_colony(target, now, &self.config, seed_types, &mut ids);
        tables.building_ids = ids;

        let record: &mut PlanetRecord = tables.claim(target, user)?;
        if let Some(name) = name {
            record.planet.name = name;
        }
        record.resources = Some(resources);
        record.buildings = buildings;
        Ok(())
    }

    /// Unowned starter planets, lowest ID first.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Storage`] if the store fails.
    pub fn available_starter_planets(&self, limit: usize) -> Result<Vec<Planet>> {
        self.store.read(|tables| {
            Ok(tables
                .planets
                .values()
                .filter(|r| r.planet.is_starter && !r.planet.is_colonized())
                .take(limit)
                .map(|r| r.planet.clone())
                .collect())
        })
    }

    /// Planet counts for every sector of a galaxy.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Storage`] if the store fails.
    pub fn ownership_summary(
        &self,
        galaxy: GalaxyId,
        user: UserId,
    ) -> Result<Vec<SectorOwnership>> {
        let sectors = self.config.sector_count();
        self.store.read(|tables| {
            let mut summary: Vec<SectorOwnership> = (1..=sectors)
                .map(|sector| SectorOwnership {
                    sector,
                    total_planets: 0,
                    colonized_planets: 0,
                    owned_by_caller: 0,
                })
                .collect();

            for record in tables.planets_in(galaxy) {
                let sector = record.planet.coordinates.sector;
                let Some(entry) = sector
                    .checked_sub(1)
                    .and_then(|i| summary.get_mut(i as usize))
                else {
                    continue;
                };
                entry.total_planets += 1;
                if record.planet.is_colonized() {
                    entry.colonized_planets += 1;
                }
                if record.planet.is_owned_by(user) {
                    entry.owned_by_caller += 1;
                }
            }
            Ok(summary)
        })
    }

    /// Projected totals over all planets of a player.
    ///
    /// Due upgrades on every planet are completed first. Projections are
    /// written back under the same threshold as [`Self::projected_resources`].
    ///
    /// # Errors
    ///
    /// Returns an error if a planet's ledger is missing or the store fails.
    pub fn total_resources(&self, user: UserId, now: DateTime<Utc>) -> Result<ResourceTotals> {
        let ctl = self.controller();
        self.store.write(|tables| {
            let owned: Vec<PlanetId> = tables
                .planets_of(user)
                .iter()
                .map(|r| r.planet.id)
                .collect();
            let mut projections = Vec::with_capacity(owned.len());
            for id in owned {
                let (record, _) = tables.owned_planet_mut(id, user)?;
                ctl.complete_due(record, now)?;
                let resources = record.resources_mut()?;
                let projection = accrual::project(resources, now, &self.config);
                if projection.should_persist {
                    *resources = projection.resources.clone();
                }
                projections.push(projection);
            }
            Ok(accrual::aggregate(&projections))
        })
    }

    /// Building list of a planet with costs, times and lock state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for unknown or foreign planets.
    pub fn building_overview(
        &self,
        planet: PlanetId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BuildingSlot>> {
        let ctl = self.controller();
        self.store.write(|tables| {
            let (record, _) = tables.owned_planet_mut(planet, user)?;
            ctl.complete_due(record, now)?;
            Ok(ctl.overview(record, now))
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum ColonyKind {
    Colony,
    Starter,
}
