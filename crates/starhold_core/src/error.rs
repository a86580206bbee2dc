//! Error types for the economy core.

use thiserror::Error;

use crate::data::{BuildingType, Requirement};
use crate::planet::{PlanetId, UserId};
use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all economy operations.
///
/// Every variant is a recoverable, caller-visible condition. None of them
/// leave stored state partially updated.
#[derive(Debug, Error)]
pub enum GameError {
    /// Referenced planet or building does not exist, or is not owned by the caller.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Building type is absent from the catalog.
    #[error("Invalid building type: {0}")]
    InvalidBuildingType(String),

    /// Upgrade requested beyond the catalog cap.
    #[error("{building} is already at max level {max_level}")]
    MaxLevelReached {
        /// Building that is capped.
        building: BuildingType,
        /// Catalog maximum level.
        max_level: u32,
    },

    /// Another building on the planet already occupies the upgrade slot.
    #[error("Planet {planet} is already upgrading {building}")]
    UpgradeAlreadyInProgress {
        /// Planet whose slot is taken.
        planet: PlanetId,
        /// Building currently upgrading.
        building: BuildingType,
    },

    /// Stock below the required cost at the moment of the attempt.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource that is short.
        resource: ResourceKind,
        /// Amount required.
        required: u64,
        /// Amount available (floored).
        available: u64,
    },

    /// Colonization attempted on a planet that already has an owner.
    #[error("Planet {0} already has an owner")]
    AlreadyOwned(PlanetId),

    /// Cancel attempted with nothing upgrading.
    #[error("No active upgrade for {building} on planet {planet}")]
    NoActiveUpgrade {
        /// Planet the cancel targeted.
        planet: PlanetId,
        /// Building the cancel targeted.
        building: BuildingType,
    },

    /// A prerequisite building is below its required level.
    #[error("{building} requires {missing}")]
    RequirementsNotMet {
        /// Building that was requested.
        building: BuildingType,
        /// First unmet prerequisite.
        missing: Requirement,
    },

    /// Starter claim by a user who already owns a planet.
    #[error("User {0} already owns a planet")]
    AlreadyHasPlanet(UserId),

    /// Starter claim attempted on a planet without the starter flag.
    #[error("Planet {0} is not a starter planet")]
    NotStarterPlanet(PlanetId),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {source}")]
    DataParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Underlying RON error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// Data parsed but failed validation.
    #[error("Validation failed for '{data}': {errors:?}")]
    InvalidData {
        /// Name of the data set that failed.
        data: String,
        /// Every validation problem found.
        errors: Vec<String>,
    },

    /// Failed to read a data file.
    #[error("Failed to read file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Backing store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl GameError {
    /// Shorthand for a missing planet.
    #[must_use]
    pub fn planet_not_found(id: PlanetId) -> Self {
        Self::NotFound {
            entity: "planet",
            id: id.to_string(),
        }
    }
}
