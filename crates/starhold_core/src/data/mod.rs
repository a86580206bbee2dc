//! Data structures for the building catalog.
//!
//! This module contains pure data structures that define building types.
//! All structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! Loading and validation live in [`crate::catalog`].

mod building_data;

pub use building_data::{
    BuildingDefinition, BuildingType, CatalogData, Category, EnergyProfile, ProductionProfile,
    Requirement, StorageProfile,
};
