//! Building upgrade lifecycle.
//!
//! Each building is `Idle(level)` or `Upgrading(level, finish_at)`. A planet
//! has a single upgrade slot. Completion is pulled: nothing ticks, and an
//! upgrade whose finish instant has passed is applied the next time the
//! planet is observed through [`UpgradeController::complete_due`].
//!
//! Completing an upgrade recomputes the planet's derived statistics
//! (production, energy, storage caps) for the changed building type. The
//! ledger is first reconciled at the old rates up to the finish instant, so
//! the new rates take effect from that instant onward and never
//! retroactively.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::accrual;
use crate::buildings::{Building, UpgradeState};
use crate::catalog::Catalog;
use crate::config::EconomyConfig;
use crate::data::{BuildingType, Category, Requirement};
use crate::error::{GameError, Result};
use crate::formulas;
use crate::resources::{ResourceAmounts, ResourceKind};
use crate::store::{IdSequence, PlanetRecord};

/// An upgrade that reached its finish instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletedUpgrade {
    /// Building that gained a level.
    pub building_type: BuildingType,
    /// Level after completion.
    pub new_level: u32,
}

/// Outcome of a successful start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeStarted {
    /// Building after the start.
    pub building: Building,
    /// Instant the upgrade completes.
    pub finish_at: DateTime<Utc>,
    /// Construction time.
    pub build_time_secs: u64,
    /// Resources charged.
    pub cost: ResourceAmounts,
}

/// Outcome of a successful cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeCancelled {
    /// Building after the cancel, idle at its old level.
    pub building: Building,
    /// Resources returned (before capacity clamping).
    pub refund: ResourceAmounts,
}

/// Progress of an upgrade, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpgradeStatus {
    /// Seconds until completion.
    pub remaining_secs: i64,
    /// Full construction time.
    pub total_secs: u64,
    /// Completed share in `[0, 1]`.
    pub progress: f64,
}

/// One row of a planet's building list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingSlot {
    /// Building type.
    pub building_type: BuildingType,
    /// Display name.
    pub name: String,
    /// Display group.
    pub category: Category,
    /// Current level (zero if never built).
    pub level: u32,
    /// Catalog cap.
    pub max_level: u32,
    /// Progress of the upgrade in flight, if any.
    pub upgrade: Option<UpgradeStatus>,
    /// Price of the next level. `None` at max level.
    pub next_cost: Option<ResourceAmounts>,
    /// Construction time of the next level. `None` at max level.
    pub next_build_time_secs: Option<u64>,
    /// First prerequisite not yet met.
    pub missing_requirement: Option<Requirement>,
}

impl BuildingSlot {
    /// Check if all prerequisites are met.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.missing_requirement.is_none()
    }
}

/// Applies upgrade transitions to a planet record.
///
/// Holds no state of its own; all changes land in the record passed in.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeController<'a> {
    catalog: &'a Catalog,
    config: &'a EconomyConfig,
}

impl<'a> UpgradeController<'a> {
    /// Create a controller over a catalog and config.
    #[must_use]
    pub const fn new(catalog: &'a Catalog, config: &'a EconomyConfig) -> Self {
        Self { catalog, config }
    }

    /// Complete every upgrade whose finish instant is at or before `now`.
    ///
    /// Upgrades are applied in finish order. Calling again with the same
    /// `now` returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if a completed building is missing from the catalog
    /// or the planet has no ledger.
    pub fn complete_due(
        &self,
        record: &mut PlanetRecord,
        now: DateTime<Utc>,
    ) -> Result<Vec<CompletedUpgrade>> {
        let mut due: Vec<(DateTime<Utc>, BuildingType)> = record
            .buildings
            .iter()
            .filter_map(|b| {
                b.upgrade_finish_at
                    .filter(|finish| *finish <= now)
                    .map(|finish| (finish, b.building_type))
            })
            .collect();
        due.sort_by_key(|(finish, _)| *finish);

        let mut completed = Vec::with_capacity(due.len());
        for (finish_at, building_type) in due {
            if let Some(resources) = record.resources.as_mut() {
                accrual::reconcile(resources, finish_at, self.config);
            }

            let Some(building) = record.building_mut(building_type) else {
                continue;
            };
            building.level += 1;
            building.upgrade_finish_at = None;
            let new_level = building.level;

            self.recompute_stats(record, building_type)?;

            tracing::info!(
                planet = %record.planet.id,
                building = %building_type,
                level = new_level,
                "Upgrade completed"
            );
            completed.push(CompletedUpgrade {
                building_type,
                new_level,
            });
        }
        Ok(completed)
    }

    /// Start upgrading `building_type` to the next level.
    ///
    /// Due upgrades are completed first. The planet's stock is reconciled to
    /// `now` and the exact cost is debited. A building absent from the planet
    /// is created at level 0.
    ///
    /// # Errors
    ///
    /// In check order: [`GameError::InvalidBuildingType`],
    /// [`GameError::MaxLevelReached`], [`GameError::RequirementsNotMet`],
    /// [`GameError::UpgradeAlreadyInProgress`],
    /// [`GameError::InsufficientResources`]. The record may have been
    /// reconciled when an error is returned, but nothing is debited.
    pub fn start(
        &self,
        record: &mut PlanetRecord,
        building_type: BuildingType,
        now: DateTime<Utc>,
        ids: &mut IdSequence,
    ) -> Result<UpgradeStarted> {
        let def = self.catalog.definition(building_type)?;
        self.complete_due(record, now)?;

        let planet = record.planet.id;
        let level = record.level(building_type);
        if level >= def.max_level {
            return Err(GameError::MaxLevelReached {
                building: building_type,
                max_level: def.max_level,
            });
        }
        if let Some(missing) = self.catalog.unmet_requirement(building_type, &record.levels()) {
            return Err(GameError::RequirementsNotMet {
                building: building_type,
                missing,
            });
        }
        if let Some(busy) = record.upgrading() {
            return Err(GameError::UpgradeAlreadyInProgress {
                planet,
                building: busy.building_type,
            });
        }

        let cost = formulas::cost(def, level);
        let accelerator_level = record.level(self.catalog.accelerator());
        let build_time_secs = formulas::build_time(def, level + 1, accelerator_level);
        let finish_at = finish_instant(now, build_time_secs)?;

        let resources = record.resources_mut()?;
        accrual::reconcile(resources, now, self.config);
        resources.debit(&cost)?;

        if record.building(building_type).is_none() {
            record
                .buildings
                .push(Building::new(ids.next_building(), planet, building_type, 0));
        }
        let building = record
            .building_mut(building_type)
            .ok_or_else(|| GameError::InvalidState(format!("{building_type} vanished")))?;
        building.upgrade_finish_at = Some(finish_at);
        let building = building.clone();

        tracing::info!(
            planet = %planet,
            building = %building_type,
            target_level = level + 1,
            build_time_secs,
            "Upgrade started"
        );

        Ok(UpgradeStarted {
            building,
            finish_at,
            build_time_secs,
            cost,
        })
    }

    /// Abort the upgrade of `building_type` and refund part of its cost.
    ///
    /// The refund is `floor(cost(level) * cancel_refund_ratio)` per resource,
    /// added to the reconciled stock and clamped at capacity. The level is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidBuildingType`] for unknown types and
    /// [`GameError::NoActiveUpgrade`] when the building is not upgrading
    /// (including when it completed during the due check).
    pub fn cancel(
        &self,
        record: &mut PlanetRecord,
        building_type: BuildingType,
        now: DateTime<Utc>,
    ) -> Result<UpgradeCancelled> {
        let def = self.catalog.definition(building_type)?;
        self.complete_due(record, now)?;

        let planet = record.planet.id;
        let Some(level) = record
            .building(building_type)
            .filter(|b| b.is_upgrading())
            .map(|b| b.level)
        else {
            tracing::warn!(
                planet = %planet,
                building = %building_type,
                "Cancel requested with no active upgrade"
            );
            return Err(GameError::NoActiveUpgrade {
                planet,
                building: building_type,
            });
        };

        let refund = formulas::cost(def, level).scale_floor(self.config.cancel_refund_ratio);
        let resources = record.resources_mut()?;
        accrual::reconcile(resources, now, self.config);
        resources.credit(&refund);

        let building = record
            .building_mut(building_type)
            .ok_or_else(|| GameError::InvalidState(format!("{building_type} vanished")))?;
        building.upgrade_finish_at = None;
        let building = building.clone();

        tracing::info!(
            planet = %planet,
            building = %building_type,
            refund = %refund,
            "Upgrade cancelled"
        );

        Ok(UpgradeCancelled { building, refund })
    }

    /// Recompute the statistics that depend on `changed`.
    ///
    /// Production and energy buildings refresh every rate and the energy
    /// balance; storage buildings refresh their one capacity. Other types
    /// have no effect on the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if `changed` is not in the catalog or the planet has
    /// no ledger.
    pub fn recompute_stats(&self, record: &mut PlanetRecord, changed: BuildingType) -> Result<()> {
        let def = self.catalog.definition(changed)?;
        if def.affects_production() {
            self.recompute_flows(record)?;
        }
        if let Some(storage) = def.storage {
            let level = record.level(changed);
            let capacity = formulas::storage_capacity_or(level, self.config.default_capacity);
            record.resources_mut()?.set_capacity(storage.resource, capacity);
        }
        Ok(())
    }

    fn recompute_flows(&self, record: &mut PlanetRecord) -> Result<()> {
        let bonuses = record.planet.bonuses;
        let mut rates = [0.0_f64; 3];
        let mut produced = [false; 3];
        let mut energy_production = 0_u64;
        let mut energy_consumption = 0_u64;
        let mut deuterium_burn = 0_u64;

        for building in record.buildings.iter().filter(|b| b.level > 0) {
            let Some(def) = self.catalog.get(building.building_type) else {
                continue;
            };
            if let Some(profile) = def.production {
                let slot = produced_index(profile.resource);
                let rate = formulas::production(
                    profile.base_rate,
                    building.level,
                    bonuses.get(profile.resource),
                );
                if let Some(slot) = slot {
                    rates[slot] += rate as f64;
                    produced[slot] = true;
                }
                energy_consumption = energy_consumption.saturating_add(
                    formulas::energy_consumption(profile.base_energy_use, building.level),
                );
            }
            if let Some(profile) = def.energy {
                energy_production = energy_production.saturating_add(formulas::energy_output(
                    building.level,
                    bonuses.energy,
                    profile.output_multiplier,
                ));
                if profile.burns_deuterium {
                    deuterium_burn = deuterium_burn.saturating_add(formulas::deuterium_burn(
                        self.config.fusion_deuterium_base,
                        building.level,
                    ));
                }
            }
        }

        let baseline = self.config.baseline_production;
        let resources = record.resources_mut()?;
        for (slot, kind) in ResourceKind::PRODUCED.into_iter().enumerate() {
            let rate = if produced[slot] {
                rates[slot]
            } else {
                baseline.get(kind)
            };
            resources.set_production(kind, rate);
        }
        resources.deuterium_production -= deuterium_burn as f64;
        resources.energy_production = energy_production;
        resources.energy_consumption = energy_consumption;

        tracing::debug!(
            planet = %resources.planet_id,
            metal = resources.metal_production,
            crystal = resources.crystal_production,
            deuterium = resources.deuterium_production,
            energy_production,
            energy_consumption,
            "Recomputed planet statistics"
        );
        Ok(())
    }

    /// Progress of a building's upgrade, if it is upgrading.
    ///
    /// The total is derived from the planet's current accelerator level,
    /// which cannot change while the slot is occupied.
    #[must_use]
    pub fn upgrade_status(
        &self,
        record: &PlanetRecord,
        building: &Building,
        now: DateTime<Utc>,
    ) -> Option<UpgradeStatus> {
        let UpgradeState::Upgrading { level, finish_at } = building.state() else {
            return None;
        };
        let def = self.catalog.get(building.building_type)?;
        let total_secs = formulas::build_time(
            def,
            level + 1,
            record.level(self.catalog.accelerator()),
        );
        let remaining_secs = (finish_at - now).num_seconds().max(0);
        let progress = if total_secs == 0 {
            1.0
        } else {
            (1.0 - remaining_secs as f64 / total_secs as f64).clamp(0.0, 1.0)
        };
        Some(UpgradeStatus {
            remaining_secs,
            total_secs,
            progress,
        })
    }

    /// Building list of a planet, grouped by category in catalog order.
    ///
    /// Expects due upgrades to have been completed already.
    #[must_use]
    pub fn overview(&self, record: &PlanetRecord, now: DateTime<Utc>) -> Vec<BuildingSlot> {
        let levels = record.levels();
        let accelerator_level = levels.level(self.catalog.accelerator());

        Catalog::categories_in_order()
            .into_iter()
            .flat_map(|category| self.catalog.definitions_in_category(category))
            .map(|def| {
                let level = levels.level(def.id);
                let at_max = level >= def.max_level;
                BuildingSlot {
                    building_type: def.id,
                    name: def.name.clone(),
                    category: def.category,
                    level,
                    max_level: def.max_level,
                    upgrade: record
                        .building(def.id)
                        .and_then(|b| self.upgrade_status(record, b, now)),
                    next_cost: (!at_max).then(|| formulas::cost(def, level)),
                    next_build_time_secs: (!at_max)
                        .then(|| formulas::build_time(def, level + 1, accelerator_level)),
                    missing_requirement: self.catalog.unmet_requirement(def.id, &levels),
                }
            })
            .collect()
    }
}

fn produced_index(kind: ResourceKind) -> Option<usize> {
    ResourceKind::PRODUCED.iter().position(|k| *k == kind)
}

fn finish_instant(now: DateTime<Utc>, build_time_secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(build_time_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| {
            GameError::InvalidState(format!("build time of {build_time_secs}s is out of range"))
        })
}
