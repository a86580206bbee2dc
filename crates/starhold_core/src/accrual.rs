//! Resource accrual between observations.
//!
//! Stocks are not ticked. A planet's ledger stores the stock as of
//! `last_updated` plus the hourly rates; any later instant is obtained by
//! integrating those rates over the elapsed time. An energy deficit throttles
//! every rate by the same ratio, and capped resources clamp at capacity
//! (overflow is lost).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EconomyConfig;
use crate::resources::{PlanetResources, ResourceKind};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Hours between two instants. Negative spans count as zero.
#[must_use]
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let ms = (to - from).num_milliseconds().max(0);
    ms as f64 / MILLIS_PER_HOUR
}

/// Production throttle for an energy balance, in `[0, 1]`.
///
/// A planet without any energy production runs unthrottled.
#[must_use]
pub fn energy_ratio(production: u64, consumption: u64) -> f64 {
    if production == 0 {
        return 1.0;
    }
    (production as f64 / consumption.max(1) as f64).min(1.0)
}

/// Result of projecting a ledger to an instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Ledger with projected stock.
    pub resources: PlanetResources,
    /// Hours integrated.
    pub elapsed_hours: f64,
    /// Energy throttle applied.
    pub energy_ratio: f64,
    /// Whether the projection should be written back.
    pub should_persist: bool,
}

/// Project a ledger forward to `now`.
///
/// Does not modify `resources`. When enough time has passed to warrant a
/// write back, the projected ledger carries `now` as its timestamp;
/// otherwise the original timestamp is kept so the short span is integrated
/// again next time.
#[must_use]
pub fn project(
    resources: &PlanetResources,
    now: DateTime<Utc>,
    config: &EconomyConfig,
) -> Projection {
    let elapsed_ms = (now - resources.last_updated).num_milliseconds().max(0);
    let hours = elapsed_hours(resources.last_updated, now);
    let ratio = energy_ratio(resources.energy_production, resources.energy_consumption);
    let should_persist = elapsed_ms > config.persist_threshold_ms();

    let mut projected = resources.clone();
    for kind in ResourceKind::PRODUCED {
        let rate = resources.production(kind);
        let cap = resources.capacity(kind).map_or(f64::INFINITY, |c| c as f64);
        let next = (resources.stock(kind) + rate * hours * ratio)
            .max(0.0)
            .min(cap);
        set_stock(&mut projected, kind, next);
    }
    if should_persist {
        projected.last_updated = now;
    }

    tracing::trace!(
        planet = %resources.planet_id,
        elapsed_hours = hours,
        energy_ratio = ratio,
        should_persist,
        "Projected resources"
    );

    Projection {
        resources: projected,
        elapsed_hours: hours,
        energy_ratio: ratio,
        should_persist,
    }
}

/// Bring a ledger up to `instant` and stamp it, regardless of the
/// persistence threshold.
///
/// Used before every debit or refund so the change applies to the current
/// stock. An instant before `last_updated` integrates nothing and leaves the
/// timestamp where it is.
pub fn reconcile(resources: &mut PlanetResources, instant: DateTime<Utc>, config: &EconomyConfig) {
    let projection = project(resources, instant, config);
    let last_updated = resources.last_updated.max(instant);
    *resources = projection.resources;
    resources.last_updated = last_updated;
}

fn set_stock(resources: &mut PlanetResources, kind: ResourceKind, value: f64) {
    match kind {
        ResourceKind::Metal => resources.metal = value,
        ResourceKind::Crystal => resources.crystal = value,
        ResourceKind::Deuterium => resources.deuterium = value,
        ResourceKind::RareEarth => resources.rare_earth = value,
        ResourceKind::Energy => {}
    }
}

/// Sums over all planets of a player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ResourceTotals {
    /// Projected metal stock.
    pub metal: f64,
    /// Projected crystal stock.
    pub crystal: f64,
    /// Projected deuterium stock.
    pub deuterium: f64,
    /// Rare earth stock.
    pub rare_earth: f64,
    /// Effective metal per hour after throttling.
    pub metal_production: f64,
    /// Effective crystal per hour after throttling.
    pub crystal_production: f64,
    /// Effective net deuterium per hour after throttling.
    pub deuterium_production: f64,
    /// Energy produced.
    pub energy_production: u64,
    /// Energy consumed.
    pub energy_consumption: u64,
    /// Number of planets summed.
    pub planets: usize,
}

/// Sum projections across planets.
///
/// Energy is reported per total but never shared: each planet was throttled
/// by its own ratio.
#[must_use]
pub fn aggregate<'a>(projections: impl IntoIterator<Item = &'a Projection>) -> ResourceTotals {
    projections
        .into_iter()
        .fold(ResourceTotals::default(), |mut totals, p| {
            let r = &p.resources;
            totals.metal += r.metal;
            totals.crystal += r.crystal;
            totals.deuterium += r.deuterium;
            totals.rare_earth += r.rare_earth;
            totals.metal_production += r.metal_production * p.energy_ratio;
            totals.crystal_production += r.crystal_production * p.energy_ratio;
            totals.deuterium_production += r.deuterium_production * p.energy_ratio;
            totals.energy_production = totals.energy_production.saturating_add(r.energy_production);
            totals.energy_consumption = totals
                .energy_consumption
                .saturating_add(r.energy_consumption);
            totals.planets += 1;
            totals
        })
}
