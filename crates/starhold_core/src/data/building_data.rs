//! Building data structures for data-driven building definitions.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::resources::{ResourceAmounts, ResourceKind};

/// Every building type known to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    /// Produces metal.
    MetalMine,
    /// Produces crystal.
    CrystalMine,
    /// Produces deuterium.
    DeuteriumSynthesizer,
    /// Produces energy.
    SolarPlant,
    /// Produces energy at twice the solar rate, burning deuterium.
    FusionReactor,
    /// Raises metal capacity.
    MetalStorage,
    /// Raises crystal capacity.
    CrystalStorage,
    /// Raises deuterium capacity.
    DeuteriumTank,
    /// Speeds up construction.
    CommandCenter,
    /// Research.
    ResearchLab,
    /// Ship construction.
    Shipyard,
    /// Planetary defenses.
    DefenseFactory,
    /// Early fleet warning.
    SensorStation,
    /// Market access.
    TradePost,
}

impl BuildingType {
    /// All building types in catalog order.
    pub const ALL: [Self; 14] = [
        Self::MetalMine,
        Self::CrystalMine,
        Self::DeuteriumSynthesizer,
        Self::SolarPlant,
        Self::FusionReactor,
        Self::MetalStorage,
        Self::CrystalStorage,
        Self::DeuteriumTank,
        Self::CommandCenter,
        Self::ResearchLab,
        Self::Shipyard,
        Self::DefenseFactory,
        Self::SensorStation,
        Self::TradePost,
    ];

    /// Snake-case identifier used in data files and by collaborators.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MetalMine => "metal_mine",
            Self::CrystalMine => "crystal_mine",
            Self::DeuteriumSynthesizer => "deuterium_synthesizer",
            Self::SolarPlant => "solar_plant",
            Self::FusionReactor => "fusion_reactor",
            Self::MetalStorage => "metal_storage",
            Self::CrystalStorage => "crystal_storage",
            Self::DeuteriumTank => "deuterium_tank",
            Self::CommandCenter => "command_center",
            Self::ResearchLab => "research_lab",
            Self::Shipyard => "shipyard",
            Self::DefenseFactory => "defense_factory",
            Self::SensorStation => "sensor_station",
            Self::TradePost => "trade_post",
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildingType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GameError::InvalidBuildingType(s.to_string()))
    }
}

/// Display grouping for buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Mines and power plants.
    Production,
    /// Storage buildings.
    Storage,
    /// Command, research, shipyards.
    Infrastructure,
    /// Everything else.
    Special,
}

impl Category {
    /// Fixed display order.
    pub const ORDER: [Self; 4] = [
        Self::Production,
        Self::Storage,
        Self::Infrastructure,
        Self::Special,
    ];
}

/// A prerequisite: `building` must be at least `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Required building.
    pub building: BuildingType,
    /// Minimum level.
    pub level: u32,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} level {}", self.building, self.level)
    }
}

/// Resource extraction parameters of a mine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionProfile {
    /// Resource produced.
    pub resource: ResourceKind,
    /// Units per hour at level 1 before growth.
    pub base_rate: f64,
    /// Energy drawn at level 1 before growth.
    pub base_energy_use: f64,
}

/// Energy generation parameters of a power plant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyProfile {
    /// Scale applied to the standard energy output formula.
    pub output_multiplier: f64,
    /// Whether the plant burns deuterium to run.
    #[serde(default)]
    pub burns_deuterium: bool,
}

/// Storage parameters: which capacity this building sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProfile {
    /// Resource whose capacity is raised.
    pub resource: ResourceKind,
}

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingDefinition(
///     id: metal_mine,
///     name: "Metal Mine",
///     description: "Extracts metal from the planetary crust.",
///     category: production,
///     base_cost: (metal: 60, crystal: 15),
///     cost_multiplier: 1.5,
///     base_build_time: 60,
///     max_level: 50,
///     production: Some(ProductionProfile(resource: metal, base_rate: 30.0, base_energy_use: 10.0)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDefinition {
    /// Building type this definition describes.
    pub id: BuildingType,

    /// Display name.
    pub name: String,

    /// Display description.
    pub description: String,

    /// Display grouping.
    pub category: Category,

    /// Cost of the first level.
    pub base_cost: ResourceAmounts,

    /// Growth of the cost per level already built.
    pub cost_multiplier: f64,

    /// Build time in seconds for target level 1 without acceleration.
    pub base_build_time: u64,

    /// Highest reachable level.
    pub max_level: u32,

    /// Prerequisites for construction.
    #[serde(default)]
    pub requirements: Vec<Requirement>,

    /// Set for mines.
    #[serde(default)]
    pub production: Option<ProductionProfile>,

    /// Set for power plants.
    #[serde(default)]
    pub energy: Option<EnergyProfile>,

    /// Set for storage buildings.
    #[serde(default)]
    pub storage: Option<StorageProfile>,
}

impl BuildingDefinition {
    /// Whether a level change of this building alters production or energy.
    #[must_use]
    pub const fn affects_production(&self) -> bool {
        self.production.is_some() || self.energy.is_some()
    }

    /// Validate a single definition. Returns every problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_level == 0 {
            errors.push(format!("{}: max_level must be at least 1", self.id));
        }
        if self.cost_multiplier.is_nan() || self.cost_multiplier <= 1.0 {
            errors.push(format!(
                "{}: cost_multiplier must be greater than 1, got {}",
                self.id, self.cost_multiplier
            ));
        }
        if self.base_cost.is_zero() {
            errors.push(format!("{}: base_cost is empty", self.id));
        }
        if let Some(profile) = &self.production {
            if !ResourceKind::PRODUCED.contains(&profile.resource) {
                errors.push(format!(
                    "{}: cannot produce {}",
                    self.id, profile.resource
                ));
            }
            if profile.base_rate < 0.0 || profile.base_energy_use < 0.0 {
                errors.push(format!("{}: production rates must be non-negative", self.id));
            }
        }
        if let Some(profile) = &self.energy {
            if profile.output_multiplier.is_nan() || profile.output_multiplier <= 0.0 {
                errors.push(format!("{}: output_multiplier must be positive", self.id));
            }
        }
        if let Some(profile) = &self.storage {
            if !ResourceKind::PRODUCED.contains(&profile.resource) {
                errors.push(format!("{}: cannot store {}", self.id, profile.resource));
            }
        }
        for req in &self.requirements {
            if req.building == self.id {
                errors.push(format!("{}: requires itself", self.id));
            }
            if req.level == 0 {
                errors.push(format!("{}: requirement {} has level 0", self.id, req.building));
            }
        }
        errors
    }
}

/// Complete catalog file: all building definitions plus catalog-wide roles.
///
/// # Example RON
///
/// ```ron
/// CatalogData(
///     accelerator: command_center,
///     buildings: [...],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    /// Building whose level shortens build times.
    pub accelerator: BuildingType,

    /// All building definitions in display order.
    pub buildings: Vec<BuildingDefinition>,
}

impl CatalogData {
    /// Validate the catalog as a whole. Returns every problem found.
    ///
    /// Checks each definition, duplicate types, requirements that point at
    /// unknown types, requirement levels above the target's cap, cycles in
    /// the requirement graph, and the accelerator role.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .buildings
            .iter()
            .flat_map(BuildingDefinition::validate)
            .collect();

        let mut by_type: HashMap<BuildingType, &BuildingDefinition> = HashMap::new();
        for def in &self.buildings {
            if by_type.insert(def.id, def).is_some() {
                errors.push(format!("{}: defined more than once", def.id));
            }
        }

        for def in &self.buildings {
            for req in &def.requirements {
                match by_type.get(&req.building) {
                    None => errors.push(format!(
                        "{}: requirement {} is not in the catalog",
                        def.id, req.building
                    )),
                    Some(target) if req.level > target.max_level => errors.push(format!(
                        "{}: requirement {} exceeds its max level {}",
                        def.id, req, target.max_level
                    )),
                    Some(_) => {}
                }
            }
        }

        if let Some(cycle_at) = find_cycle(&self.buildings) {
            errors.push(format!("{cycle_at}: requirement cycle"));
        }

        if !by_type.contains_key(&self.accelerator) {
            errors.push(format!(
                "accelerator {} is not in the catalog",
                self.accelerator
            ));
        }

        errors
    }

    /// Check that every building type has a definition.
    #[must_use]
    pub fn missing_types(&self) -> Vec<BuildingType> {
        let present: HashSet<BuildingType> = self.buildings.iter().map(|d| d.id).collect();
        BuildingType::ALL
            .into_iter()
            .filter(|t| !present.contains(t))
            .collect()
    }
}

/// Depth-first search for a cycle in the requirement graph.
///
/// Returns a building on the cycle, if any. Requirements on unknown types
/// are ignored here; they are reported separately.
fn find_cycle(buildings: &[BuildingDefinition]) -> Option<BuildingType> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        node: BuildingType,
        edges: &HashMap<BuildingType, Vec<BuildingType>>,
        marks: &mut HashMap<BuildingType, Mark>,
    ) -> Option<BuildingType> {
        match marks.get(&node) {
            Some(Mark::Visiting) => return Some(node),
            Some(Mark::Done) => return None,
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        for &next in edges.get(&node).map(Vec::as_slice).unwrap_or_default() {
            if let Some(found) = visit(next, edges, marks) {
                return Some(found);
            }
        }
        marks.insert(node, Mark::Done);
        None
    }

    let edges: HashMap<BuildingType, Vec<BuildingType>> = buildings
        .iter()
        .map(|d| (d.id, d.requirements.iter().map(|r| r.building).collect()))
        .collect();
    let mut marks = HashMap::new();
    buildings
        .iter()
        .find_map(|d| visit(d.id, &edges, &mut marks))
}
