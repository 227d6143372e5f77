mod cli;

use anyhow::{Context, Result};
use assetsync::fetch::{AssetDescriptor, MaxAge, ReqwestClient, StateStore};
use assetsync::{SyncConfig, Synchronizer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug,hyper=warn,reqwest=warn"
    } else {
        "info,hyper=warn,reqwest=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    init_tracing(app.verbose);

    let mut config = SyncConfig::load(app.config.as_deref()).context("failed to load configuration")?;
    config.verbose |= app.verbose;

    match app.cmd {
        Commands::Sync => {
            let report = synchronizer(config)?.run().await;
            tracing::info!(
                refreshed = report.refreshed,
                updated = report.any_updated(),
                all_failed = report.all_failed(),
                "pass finished"
            );
        }
        Commands::Refresh => {
            let report = synchronizer(config)?.full_refresh().await;
            for asset in &report.assets {
                println!("{:<24} {}", asset.name, asset.outcome);
            }
        }
        Commands::Fetch(arg) => {
            let asset = AssetDescriptor::new(arg.local, arg.url)
                .max_age(MaxAge::parse(&arg.max_age))
                .verbose(config.verbose);
            let outcome = synchronizer(config)?.fetch_one(&asset).await;
            println!("{outcome}");
        }
        Commands::Reconcile => {
            let report = synchronizer(config)?
                .reconcile()
                .await
                .context("reconciliation failed")?;
            for name in &report.removed {
                println!("removed {name}");
            }
            for name in &report.errors {
                eprintln!("failed to remove {name}");
            }
        }
        Commands::Status => status(&config)?,
    }

    Ok(())
}

fn synchronizer(config: SyncConfig) -> Result<Synchronizer<ReqwestClient>> {
    let client = ReqwestClient::new(config.timeout()).context("failed to build HTTP client")?;
    Synchronizer::new(config, client).context("invalid configuration")
}

fn status(config: &SyncConfig) -> Result<()> {
    let path = config.state_path();
    let state = StateStore::load(&path).with_context(|| format!("failed to read {}", path.display()))?;
    if state.is_empty() {
        println!("no records in {}", path.display());
        return Ok(());
    }

    for (key, record) in state.records() {
        let checked = record.last_checked.map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        let updated = record.last_updated.map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "{key}\n  checked  {checked}\n  updated  {updated}\n  etag     {}",
            record.etag.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
