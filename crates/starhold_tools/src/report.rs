//! Balance tables and what-if calculations.
//!
//! Thin wrappers over the core formulas that shape their results for
//! printing, either as text tables or as JSON.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use starhold_core::accrual;
use starhold_core::catalog::Catalog;
use starhold_core::colonization::{sector_distance, ColonizationQuote};
use starhold_core::config::EconomyConfig;
use starhold_core::data::BuildingType;
use starhold_core::formulas;
use starhold_core::planet::PlanetId;
use starhold_core::resources::{PlanetResources, ResourceAmounts};

use crate::error::{Result, ToolError};

/// One level step of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostRow {
    /// Level reached by this step.
    pub target_level: u32,
    /// Price of the step.
    pub cost: ResourceAmounts,
    /// Construction time of the step.
    pub build_time_secs: u64,
}

/// Cost and build time of the first `levels` steps of a building.
///
/// Stops early at the building's max level.
///
/// # Errors
///
/// Returns an error if the building is not in the catalog.
pub fn cost_table(
    catalog: &Catalog,
    building: BuildingType,
    levels: u32,
    accelerator_level: u32,
) -> Result<Vec<CostRow>> {
    let def = catalog.definition(building)?;
    let rows = (0..levels.min(def.max_level))
        .map(|level| CostRow {
            target_level: level + 1,
            cost: formulas::cost(def, level),
            build_time_secs: formulas::build_time(def, level + 1, accelerator_level),
        })
        .collect();
    Ok(rows)
}

/// Render a cost table as aligned text.
#[must_use]
pub fn render_cost_table(title: &str, rows: &[CostRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(
        out,
        "{:>5}  {:>14}  {:>14}  {:>14}  {:>12}",
        "level", "metal", "crystal", "deuterium", "time"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>5}  {:>14}  {:>14}  {:>14}  {:>12}",
            row.target_level,
            row.cost.metal,
            row.cost.crystal,
            row.cost.deuterium,
            format_duration(row.build_time_secs)
        );
    }
    out
}

/// Human-readable duration, e.g. `1h 02m 03s`.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if days > 0 {
        format!("{days}d {hours:02}h {minutes:02}m")
    } else if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Colonization price between two sectors, as the main planet sees it.
#[must_use]
pub fn colonization_quote(from: u32, to: u32, config: &EconomyConfig) -> ColonizationQuote {
    let distance = sector_distance(from, to, config.sector_grid_width);
    ColonizationQuote::at_distance(distance, config)
}

/// Inputs of a stock projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    /// Starting stock.
    pub stock: ResourceAmounts,
    /// Hourly metal, crystal and deuterium rates.
    pub rates: [f64; 3],
    /// Capacity of each capped resource.
    pub capacity: u64,
    /// Energy produced.
    pub energy_production: u64,
    /// Energy consumed.
    pub energy_consumption: u64,
    /// Span to project over.
    pub hours: f64,
}

/// Result of a stock projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionReport {
    /// Stock before.
    pub start: ResourceAmounts,
    /// Stock after, floored.
    pub end: ResourceAmounts,
    /// Hours projected.
    pub hours: f64,
    /// Production throttle applied.
    pub energy_ratio: f64,
}

/// Project a stock forward with the accrual rules of the core.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgument`] for a negative or non-finite
/// span or a start stock above capacity.
pub fn project_stock(input: &ProjectionInput, config: &EconomyConfig) -> Result<ProjectionReport> {
    if !input.hours.is_finite() || input.hours < 0.0 {
        return Err(ToolError::InvalidArgument {
            name: "hours",
            reason: format!("must be a non-negative number, got {}", input.hours),
        });
    }
    if [input.stock.metal, input.stock.crystal, input.stock.deuterium]
        .into_iter()
        .any(|s| s > input.capacity)
    {
        return Err(ToolError::InvalidArgument {
            name: "capacity",
            reason: format!("starting stock exceeds capacity {}", input.capacity),
        });
    }

    let start = DateTime::<Utc>::default();
    let mut ledger = PlanetResources::new(PlanetId::new(0), input.stock, input.capacity, start);
    ledger.metal_production = input.rates[0];
    ledger.crystal_production = input.rates[1];
    ledger.deuterium_production = input.rates[2];
    ledger.energy_production = input.energy_production;
    ledger.energy_consumption = input.energy_consumption;

    let span = Duration::milliseconds((input.hours * 3_600_000.0).round() as i64);
    let projection = accrual::project(&ledger, start + span, config);

    Ok(ProjectionReport {
        start: input.stock,
        end: projection.resources.displayed(),
        hours: projection.elapsed_hours,
        energy_ratio: projection.energy_ratio,
    })
}
