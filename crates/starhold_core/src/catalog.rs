//! Building catalog: the read-only registry of building definitions.
//!
//! The catalog is built once (usually from the embedded standard data) and
//! shared by reference. Nothing in the core reaches for a global table, so
//! tests can hand the engine an alternate catalog.

use std::collections::HashMap;
use std::path::Path;

use crate::buildings::BuildingLevels;
use crate::data::{BuildingDefinition, BuildingType, CatalogData, Category, Requirement};
use crate::error::{GameError, Result};
use crate::formulas;
use crate::resources::ResourceAmounts;

/// Standard catalog shipped with the game.
const STANDARD_CATALOG: &str = include_str!("../../../assets/data/buildings.ron");

/// Registry of building definitions keyed by type.
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: HashMap<BuildingType, BuildingDefinition>,
    /// Declaration order, used for display grouping.
    order: Vec<BuildingType>,
    accelerator: BuildingType,
}

impl Catalog {
    /// Load the standard catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded data fails to parse or validate.
    pub fn standard() -> Result<Self> {
        Self::from_ron_named(STANDARD_CATALOG, "<standard catalog>")
    }

    /// Parse and validate a catalog from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParse`] or [`GameError::InvalidData`].
    pub fn from_ron(text: &str) -> Result<Self> {
        Self::from_ron_named(text, "<inline>")
    }

    fn from_ron_named(text: &str, name: &str) -> Result<Self> {
        let data: CatalogData = ron::from_str(text).map_err(|e| GameError::DataParse {
            path: name.to_string(),
            source: e,
        })?;
        Self::from_data(data, name)
    }

    /// Load a catalog from a RON file.
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
        Self::from_ron_named(&text, &path_str)
    }

    /// Build a catalog from already-parsed data.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] listing every validation problem.
    pub fn from_data(data: CatalogData, name: &str) -> Result<Self> {
        let errors = data.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidData {
                data: name.to_string(),
                errors,
            });
        }

        let order = data.buildings.iter().map(|d| d.id).collect();
        let definitions = data.buildings.into_iter().map(|d| (d.id, d)).collect();

        let catalog = Self {
            definitions,
            order,
            accelerator: data.accelerator,
        };
        tracing::debug!(
            source = name,
            buildings = catalog.len(),
            "Loaded building catalog"
        );
        Ok(catalog)
    }

    /// Check that all fourteen building types are present.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] naming the missing types.
    pub fn validate_completeness(&self) -> Result<()> {
        let missing: Vec<String> = BuildingType::ALL
            .into_iter()
            .filter(|t| !self.contains(*t))
            .map(|t| format!("{t}: missing definition"))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GameError::InvalidData {
                data: "catalog".to_string(),
                errors: missing,
            })
        }
    }

    /// Definition of a building type.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidBuildingType`] if the type is not in
    /// this catalog.
    pub fn definition(&self, building: BuildingType) -> Result<&BuildingDefinition> {
        self.definitions
            .get(&building)
            .ok_or_else(|| GameError::InvalidBuildingType(building.to_string()))
    }

    /// Definition of a building type, if present.
    #[must_use]
    pub fn get(&self, building: BuildingType) -> Option<&BuildingDefinition> {
        self.definitions.get(&building)
    }

    /// Check if a building type is registered.
    #[must_use]
    pub fn contains(&self, building: BuildingType) -> bool {
        self.definitions.contains_key(&building)
    }

    /// Building whose level shortens construction.
    #[must_use]
    pub const fn accelerator(&self) -> BuildingType {
        self.accelerator
    }

    /// All definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingDefinition> {
        self.order.iter().filter_map(|t| self.definitions.get(t))
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Category display order.
    #[must_use]
    pub const fn categories_in_order() -> [Category; 4] {
        Category::ORDER
    }

    /// Definitions of one category in declaration order.
    pub fn definitions_in_category(
        &self,
        category: Category,
    ) -> impl Iterator<Item = &BuildingDefinition> {
        self.iter().filter(move |d| d.category == category)
    }

    /// First prerequisite of `building` that `owned` does not satisfy.
    ///
    /// Returns `None` when the building is buildable (or unknown).
    #[must_use]
    pub fn unmet_requirement(
        &self,
        building: BuildingType,
        owned: &BuildingLevels,
    ) -> Option<Requirement> {
        self.get(building)?
            .requirements
            .iter()
            .find(|req| owned.level(req.building) < req.level)
            .copied()
    }

    /// Check if every prerequisite of `building` is met.
    ///
    /// Unknown types are never unlocked. Missing buildings count as level 0.
    #[must_use]
    pub fn is_unlocked(&self, building: BuildingType, owned: &BuildingLevels) -> bool {
        self.contains(building) && self.unmet_requirement(building, owned).is_none()
    }

    /// Building types that cannot be built yet, in declaration order.
    ///
    /// A derived view: nothing about locks is stored.
    #[must_use]
    pub fn locked_buildings(&self, owned: &BuildingLevels) -> Vec<BuildingType> {
        self.order
            .iter()
            .copied()
            .filter(|t| !self.is_unlocked(*t, owned))
            .collect()
    }

    /// Cost of upgrading `building` from `current_level`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidBuildingType`] for unknown types.
    pub fn cost(&self, building: BuildingType, current_level: u32) -> Result<ResourceAmounts> {
        Ok(formulas::cost(self.definition(building)?, current_level))
    }

    /// Seconds to reach `target_level` with the given accelerator level.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidBuildingType`] for unknown types.
    pub fn build_time(
        &self,
        building: BuildingType,
        target_level: u32,
        accelerator_level: u32,
    ) -> Result<u64> {
        Ok(formulas::build_time(
            self.definition(building)?,
            target_level,
            accelerator_level,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Catalog {
        Catalog::standard().unwrap()
    }

    #[test]
    fn test_standard_catalog_is_complete() {
        let catalog = standard();
        assert_eq!(catalog.len(), 14);
        catalog.validate_completeness().unwrap();
        assert_eq!(catalog.accelerator(), BuildingType::CommandCenter);
    }

    #[test]
    fn test_standard_costs_match_balance_sheet() {
        let catalog = standard();
        assert_eq!(
            catalog.cost(BuildingType::MetalMine, 0).unwrap(),
            ResourceAmounts::new(60, 15, 0)
        );
        assert_eq!(
            catalog.cost(BuildingType::FusionReactor, 0).unwrap(),
            ResourceAmounts::new(900, 360, 180)
        );
        assert_eq!(
            catalog.cost(BuildingType::MetalStorage, 3).unwrap(),
            ResourceAmounts::new(8000, 0, 0)
        );
    }

    #[test]
    fn test_categories_group_in_order() {
        let catalog = standard();
        let counts: Vec<usize> = Catalog::categories_in_order()
            .into_iter()
            .map(|c| catalog.definitions_in_category(c).count())
            .collect();
        assert_eq!(counts, vec![5, 3, 4, 2]);
    }

    #[test]
    fn test_is_unlocked_with_empty_planet() {
        let catalog = standard();
        let owned = BuildingLevels::default();
        assert!(catalog.is_unlocked(BuildingType::MetalMine, &owned));
        assert!(catalog.is_unlocked(BuildingType::CommandCenter, &owned));
        assert!(!catalog.is_unlocked(BuildingType::DeuteriumSynthesizer, &owned));
        assert!(!catalog.is_unlocked(BuildingType::FusionReactor, &owned));
    }

    #[test]
    fn test_requirements_unlock_at_exact_level() {
        let catalog = standard();
        let mut owned = BuildingLevels::default();
        owned.set(BuildingType::MetalMine, 2);
        assert_eq!(
            catalog.unmet_requirement(BuildingType::DeuteriumSynthesizer, &owned),
            Some(Requirement {
                building: BuildingType::MetalMine,
                level: 3
            })
        );
        owned.set(BuildingType::MetalMine, 3);
        assert!(catalog.is_unlocked(BuildingType::DeuteriumSynthesizer, &owned));
    }

    #[test]
    fn test_locked_buildings_on_fresh_colony() {
        let catalog = standard();
        let locked = catalog.locked_buildings(&BuildingLevels::default());
        assert_eq!(
            locked,
            vec![
                BuildingType::DeuteriumSynthesizer,
                BuildingType::FusionReactor,
                BuildingType::DeuteriumTank,
                BuildingType::ResearchLab,
                BuildingType::Shipyard,
                BuildingType::DefenseFactory,
                BuildingType::SensorStation,
                BuildingType::TradePost,
            ]
        );
    }

    #[test]
    fn test_alternate_catalog_rejects_unknown_type() {
        let catalog = Catalog::from_ron(
            r#"CatalogData(
                accelerator: command_center,
                buildings: [
                    BuildingDefinition(
                        id: command_center,
                        name: "HQ",
                        description: "",
                        category: infrastructure,
                        base_cost: (metal: 10),
                        cost_multiplier: 2.0,
                        base_build_time: 1,
                        max_level: 3,
                    ),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.validate_completeness().is_err());
        assert!(matches!(
            catalog.definition(BuildingType::MetalMine),
            Err(GameError::InvalidBuildingType(_))
        ));
        assert!(!catalog.is_unlocked(BuildingType::MetalMine, &BuildingLevels::default()));
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = Catalog::from_ron("CatalogData(").unwrap_err();
        assert!(matches!(err, GameError::DataParse { .. }));
    }
}
