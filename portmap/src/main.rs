//! `portmap` command-line driver.
//!
//! ```bash
//! portmap --config portmap.toml collect
//! portmap --config portmap.toml reconcile --dry-run
//! portmap run
//! ```
//!
//! Set `RUST_LOG=debug` for verbose output.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use portmap::collect::collect_configured;
use portmap::reconcile::SheetsGrid;
use portmap::{
    AppConfig, GridRange, Inventory, ReconcileOptions, SshConnector, SwitchOutcome, reconcile,
};

#[derive(Debug, Parser)]
#[command(name = "portmap", version, about = "Switch port inventory collector and sheet reconciler")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "PORTMAP_CONFIG", default_value = "portmap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect every switch and save the inventory document
    Collect {
        /// Override the inventory path from the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fill spreadsheet rows from a saved inventory document
    Reconcile {
        /// Override the inventory path from the config
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Log planned updates without writing to the sheet
        #[arg(long)]
        dry_run: bool,
    },

    /// Collect, save, then reconcile from the saved document
    Run {
        /// Log planned updates without writing to the sheet
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Collect { output } => {
            config.validate_collect()?;
            let path = output.unwrap_or_else(|| config.inventory_path.clone());
            run_collect(&config, &path).await?;
        }
        Command::Reconcile { input, dry_run } => {
            config.validate_reconcile()?;
            let path = input.unwrap_or_else(|| config.inventory_path.clone());
            run_reconcile(&config, &path, dry_run).await?;
        }
        Command::Run { dry_run } => {
            config.validate_collect()?;
            config.validate_reconcile()?;
            run_collect(&config, &config.inventory_path).await?;
            run_reconcile(&config, &config.inventory_path, dry_run).await?;
        }
    }

    Ok(())
}

async fn run_collect(config: &AppConfig, path: &Path) -> portmap::Result<()> {
    let report = collect_configured(&SshConnector::new(config), config).await;

    report.inventory.save(path)?;
    info!("Data saved to {}", path.display());

    for (target, outcome) in &report.outcomes {
        match outcome {
            SwitchOutcome::Collected(records) => {
                println!("{:<24} {} devices", target.to_string(), records.len());
            }
            SwitchOutcome::Failed { reason } => {
                println!("{:<24} FAILED: {}", target.to_string(), reason);
            }
        }
    }
    println!("Total devices: {}", report.inventory.len());
    Ok(())
}

async fn run_reconcile(config: &AppConfig, path: &Path, dry_run: bool) -> portmap::Result<()> {
    let settings = config.sheet()?;
    let range: GridRange = settings.range.parse()?;
    let inventory = Inventory::load(path)?;
    let mut grid = SheetsGrid::from_settings(settings)?;

    let summary = reconcile(&mut grid, range, &inventory, ReconcileOptions { dry_run }).await?;

    if dry_run {
        println!("{} rows would be updated", summary.rows_matched());
    } else {
        println!(
            "{} rows matched, {} cells written",
            summary.rows_matched(),
            summary.cells_written
        );
    }
    Ok(())
}
