//! # Starhold Core
//!
//! Deterministic economy engine for the Starhold space-strategy game.
//!
//! This crate contains **only** economic rules:
//! - No rendering
//! - No network or database access
//! - No wall-clock reads (every operation receives `now`)
//!
//! State advances lazily. Resources are integrated from stored rates when a
//! planet is observed, and finished upgrades are applied on the next
//! observation instead of by a background scheduler.
//!
//! ## Crate Structure
//!
//! - [`formulas`] - Cost, build time, production, energy and storage curves
//! - [`catalog`] - Registry of building definitions
//! - [`accrual`] - Time integration of planet resources
//! - [`upgrades`] - Building upgrade lifecycle
//! - [`colonization`] - Sector distance and colony pricing
//! - [`store`] - Transactional persistence seam
//! - [`engine`] - Operations exposed to callers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod accrual;
pub mod buildings;
pub mod catalog;
pub mod colonization;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod formulas;
pub mod planet;
pub mod resources;
pub mod store;
pub mod upgrades;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::accrual::{Projection, ResourceTotals};
    pub use crate::buildings::{Building, BuildingId, BuildingLevels, UpgradeState};
    pub use crate::catalog::Catalog;
    pub use crate::colonization::ColonizationQuote;
    pub use crate::config::EconomyConfig;
    pub use crate::data::{BuildingDefinition, BuildingType, Category, Requirement};
    pub use crate::engine::{Engine, SectorOwnership};
    pub use crate::error::{GameError, Result};
    pub use crate::planet::{
        Coordinates, GalaxyId, Planet, PlanetId, PlanetKind, ResourceBonuses, UserId,
    };
    pub use crate::resources::{PlanetResources, ResourceAmounts, ResourceKind};
    pub use crate::store::{GameStore, MemoryStore, PlanetRecord, Tables};
    pub use crate::upgrades::{
        BuildingSlot, CompletedUpgrade, UpgradeCancelled, UpgradeStarted, UpgradeStatus,
    };
}
