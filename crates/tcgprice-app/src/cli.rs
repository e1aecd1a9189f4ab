//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tcgprice_core::PriceQuery;

#[derive(Parser, Debug)]
#[command(name = "tcgprice")]
#[command(version, about = "Resolve and cache trading-card prices", long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep prices in memory instead of the configured database
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the price of one card
    Resolve(ResolveArgs),

    /// Show cache statistics
    Stats,

    /// Print the effective configuration
    Config,
}

/// Arguments for the `resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Card number, e.g. BLTR-EN051
    #[arg(short, long, default_value = "")]
    pub number: String,

    /// Card name; may carry an art variant such as "(7th Art)"
    #[arg(long)]
    pub name: Option<String>,

    /// Rarity as printed, e.g. "Quarter Century Secret Rare"
    #[arg(short, long)]
    pub rarity: Option<String>,

    /// Explicit art variant, overriding any found in the name
    #[arg(long)]
    pub art_variant: Option<String>,

    /// Ignore any cached record
    #[arg(short, long)]
    pub force_refresh: bool,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ResolveArgs {
    pub fn to_query(&self) -> PriceQuery {
        let mut query = PriceQuery::new(self.number.clone()).with_force_refresh(self.force_refresh);
        if let Some(name) = &self.name {
            query = query.with_name(name.clone());
        }
        if let Some(rarity) = &self.rarity {
            query = query.with_rarity(rarity.clone());
        }
        if let Some(art) = &self.art_variant {
            query = query.with_art_variant(art.clone());
        }
        query
    }
}
