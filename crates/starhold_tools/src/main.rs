//! Starhold - Development Tools

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use starhold_core::catalog::Catalog;
use starhold_core::config::EconomyConfig;
use starhold_core::data::BuildingType;
use starhold_core::resources::ResourceAmounts;
use starhold_tools::error::Result;
use starhold_tools::report::{self, ProjectionInput};
use starhold_tools::validate;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "starhold-tools")]
#[command(about = "Development tools for Starhold")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Building catalog to use instead of the standard one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Economy config to use instead of the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Print the cost and build time of each level of a building
    Costs {
        /// Building type, e.g. metal_mine
        building: BuildingType,
        /// Number of levels to print
        #[arg(long, default_value_t = 10)]
        levels: u32,
        /// Accelerator building level
        #[arg(long, default_value_t = 0)]
        accelerator: u32,
    },
    /// Quote the price of a colony between two sectors
    ColonizeCost {
        /// Sector of the main planet
        from: u32,
        /// Sector of the target planet
        to: u32,
    },
    /// Project a planet's stock forward in time
    Project(ProjectArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// Starting metal
    #[arg(long, default_value_t = 0)]
    metal: u64,
    /// Starting crystal
    #[arg(long, default_value_t = 0)]
    crystal: u64,
    /// Starting deuterium
    #[arg(long, default_value_t = 0)]
    deuterium: u64,
    /// Metal per hour
    #[arg(long, default_value_t = 30.0)]
    metal_rate: f64,
    /// Crystal per hour
    #[arg(long, default_value_t = 15.0)]
    crystal_rate: f64,
    /// Deuterium per hour (negative when burning)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    deuterium_rate: f64,
    /// Storage capacity of each resource
    #[arg(long, default_value_t = 10_000)]
    capacity: u64,
    /// Energy produced
    #[arg(long, default_value_t = 0)]
    energy_production: u64,
    /// Energy consumed
    #[arg(long, default_value_t = 0)]
    energy_consumption: u64,
    /// Hours to project
    #[arg(long)]
    hours: f64,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    }
}

/// Run a command. `Ok(false)` means the command ran but found problems.
fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            let report = validate::validate_data_directory(path)?;
            if cli.json {
                print_json(&report)?;
            } else {
                for file in &report.files {
                    let status = if file.is_ok() { "ok" } else { "FAILED" };
                    println!("{status:>6}  {}", file.path.display());
                    for error in &file.errors {
                        println!("        - {error}");
                    }
                }
                for error in &report.errors {
                    println!("FAILED  {error}");
                }
                for skipped in &report.skipped {
                    println!("  skip  {}", skipped.display());
                }
            }
            if report.is_ok() {
                tracing::info!("Validation passed");
            } else {
                tracing::error!("Validation failed with {} errors", report.error_count());
            }
            Ok(report.is_ok())
        }
        Commands::Costs {
            building,
            levels,
            accelerator,
        } => {
            let catalog = load_catalog(cli.catalog.as_deref())?;
            let rows = report::cost_table(&catalog, *building, *levels, *accelerator)?;
            if cli.json {
                print_json(&rows)?;
            } else {
                let name = &catalog.definition(*building)?.name;
                print!("{}", report::render_cost_table(name, &rows));
            }
            Ok(true)
        }
        Commands::ColonizeCost { from, to } => {
            let config = load_config(cli.config.as_deref())?;
            let quote = report::colonization_quote(*from, *to, &config);
            if cli.json {
                print_json(&quote)?;
            } else {
                println!(
                    "sector {from} -> {to}: distance {:.1}, multiplier {:.2}",
                    quote.distance, quote.multiplier
                );
                println!("cost: {}", quote.cost);
            }
            Ok(true)
        }
        Commands::Project(args) => {
            let config = load_config(cli.config.as_deref())?;
            let input = ProjectionInput {
                stock: ResourceAmounts::new(args.metal, args.crystal, args.deuterium),
                rates: [args.metal_rate, args.crystal_rate, args.deuterium_rate],
                capacity: args.capacity,
                energy_production: args.energy_production,
                energy_consumption: args.energy_consumption,
                hours: args.hours,
            };
            let projection = report::project_stock(&input, &config)?;
            if cli.json {
                print_json(&projection)?;
            } else {
                println!(
                    "after {:.2}h at energy ratio {:.3}:",
                    projection.hours, projection.energy_ratio
                );
                println!("start: {}", projection.start);
                println!("end:   {}", projection.end);
            }
            Ok(true)
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    Ok(match path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::standard()?,
    })
}

fn load_config(path: Option<&Path>) -> Result<EconomyConfig> {
    Ok(match path {
        Some(path) => EconomyConfig::load(path)?,
        None => EconomyConfig::default(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
