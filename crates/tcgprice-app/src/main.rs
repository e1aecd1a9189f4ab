//! tcgprice command-line front end.
//!
//! Wires the configuration, price store, browser fetcher and resolver
//! together explicitly and prints results as JSON.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ResolveArgs};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tcgprice_browser::{BrowserEngine, MarketplaceFetcher};
use tcgprice_core::AppConfig;
use tcgprice_db::{Database, MemoryPriceStore, PriceStore};
use tcgprice_engine::{CancellationToken, PriceCache, PriceResolver, ResolverSettings};
use tracing::{error, info};

/// Initialize tracing/logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tcgprice=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Error body printed when a resolution yields no record.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            config.apply_env_overrides();
            config.validate()?;
            config
        }
        None => AppConfig::load_with_env().context("loading config")?,
    };
    Ok(config)
}

async fn open_store(config: &AppConfig, memory: bool) -> Result<Arc<dyn PriceStore>> {
    if memory {
        info!("Using in-memory price store");
        return Ok(Arc::new(MemoryPriceStore::new()));
    }

    let path = config.database.resolved_path()?;
    let db = Database::new(&path, config.database.max_connections)
        .await
        .with_context(|| format!("opening price database at {path}"))?;
    db.run_migrations().await.context("running migrations")?;
    info!("Using price database at {}", path);
    Ok(Arc::new(db))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn resolve(
    config: &AppConfig,
    store: Arc<dyn PriceStore>,
    args: &ResolveArgs,
) -> Result<ExitCode> {
    let engine = Arc::new(
        BrowserEngine::launch(&config.browser, config.scraping.request_delay())
            .await
            .context("launching browser")?,
    );
    let fetcher = MarketplaceFetcher::new(engine.clone(), &config.browser.marketplace_base_url)?;

    let cache = PriceCache::new(store, &config.cache);
    let resolver = PriceResolver::new(cache, Arc::new(fetcher), ResolverSettings::from(config));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            on_signal.cancel();
        }
    });
    if let Some(secs) = args.timeout_secs {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            on_timeout.cancel();
        });
    }

    let outcome = resolver.resolve_with_cancel(&args.to_query(), &cancel).await;
    drop(resolver);

    let code = match outcome {
        Ok(resolution) => {
            print_json(&resolution)?;
            if resolution.record.scrape_success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            error!("{}", e);
            print_json(&ErrorBody {
                error: e.to_string(),
                status: e.status_code(),
            })?;
            ExitCode::FAILURE
        }
    };

    match Arc::try_unwrap(engine) {
        Ok(engine) => engine.close().await,
        Err(_) => tracing::warn!("Browser still in use, leaving it to exit with the process"),
    }
    Ok(code)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats => {
            let store = open_store(&config, cli.memory).await?;
            let stats = PriceCache::new(store, &config.cache).stats().await?;
            print_json(&stats)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve(args) => {
            let store = open_store(&config, cli.memory).await?;
            resolve(&config, store, args).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting tcgprice v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
