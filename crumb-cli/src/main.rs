//! Crumb CLI - cost and pricing reports over a catalog snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Price one product
//! crumb price --product 5b3e1a8c-6f2d-4b1e-8a7c-9d0e1f2a3b04
//!
//! # Recipe and product costs
//! crumb costs
//!
//! # Ingredients needed for every scheduled run
//! crumb shopping-list
//!
//! # Refresh stored prices from current costs and save them
//! crumb reprice --reseed --write
//! ```
//!
//! Reports are printed as JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crumb_cli::reports;
use crumb_pricing::PricingEngine;
use crumb_shared::ProductId;
use crumb_store::{CatalogSnapshot, Config};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "crumb")]
#[command(author, version, about = "Production cost and pricing tools")]
struct Cli {
    /// Catalog snapshot to read instead of `snapshot.path`
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a single product
    Price {
        #[arg(short, long)]
        product: ProductId,

        /// Replace the stored base cost with the current product cost
        #[arg(long)]
        reseed: bool,
    },
    /// Recipe and product costs for the whole catalog
    Costs,
    /// Ingredient totals for scheduled production
    ShoppingList {
        /// Limit to one production run
        #[arg(short, long)]
        run: Option<Uuid>,
    },
    /// Recompute every stored pricing record
    Reprice {
        /// Refresh base costs from current product costs first
        #[arg(long)]
        reseed: bool,

        /// Save updated records back into the snapshot file
        #[arg(short, long)]
        write: bool,

        /// Ignore `batch.parallel`
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crumb_cli=info,crumb_pricing=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load().context("Failed to load config")?;
    let path = cli
        .snapshot
        .unwrap_or_else(|| PathBuf::from(&config.snapshot.path));
    let mut snapshot = CatalogSnapshot::load(&path)?;
    let decimals = config.pricing.rounding_decimals;

    match cli.command {
        Commands::Price { product, reseed } => {
            let engine = PricingEngine::new(config.pricing.defaults());
            let report = reports::price_report(&snapshot, &engine, &product, reseed)?;
            print_json(&report, decimals)
        }
        Commands::Costs => print_json(&reports::cost_report(&snapshot), decimals),
        Commands::ShoppingList { run } => print_json(&reports::shopping_list(&snapshot, run)?, decimals),
        Commands::Reprice {
            reseed,
            write,
            sequential,
        } => {
            let parallel = config.batch.parallel && !sequential;
            let outcome = reports::reprice(&mut snapshot, parallel, reseed);
            if write {
                snapshot
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            print_json(&outcome, decimals)
        }
    }
}

fn print_json<T: Serialize>(report: &T, decimals: u32) -> anyhow::Result<()> {
    let mut value = serde_json::to_value(report)?;
    reports::round_numbers(&mut value, decimals);
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
