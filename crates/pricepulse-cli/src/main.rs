mod benchmarks;
mod scrape;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::benchmarks::BenchmarkCommands;
use crate::scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "pricepulse")]
#[command(about = "Storefront price collection for brand listings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every configured platform and publish the results
    Scrape(ScrapeArgs),
    /// Maintain the Benchmarks tab
    Benchmarks {
        #[command(subcommand)]
        command: BenchmarkCommands,
    },
    /// Compare live prices against benchmarks
    Report {
        /// Only show products priced above or below their benchmark
        #[arg(long)]
        deviations_only: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List configured platforms and their collections
    Platforms,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = pricepulse_core::load_app_config().context("failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(?config, "configuration loaded");

    let platforms = pricepulse_core::load_platforms(&config.platforms_path)
        .with_context(|| format!("failed to load {}", config.platforms_path.display()))?;

    match cli.command {
        Some(Commands::Scrape(args)) => scrape::run_scrape(&config, &platforms, &args).await,
        Some(Commands::Benchmarks { command }) => {
            benchmarks::run_benchmarks_command(&config, &platforms, command).await
        }
        Some(Commands::Report {
            deviations_only,
            json,
        }) => benchmarks::run_report(&config, &platforms, deviations_only, json).await,
        Some(Commands::Platforms) => {
            print_platforms(&platforms);
            Ok(())
        }
        None => {
            println!("pricepulse: run `pricepulse --help` for commands");
            Ok(())
        }
    }
}

fn print_platforms(file: &pricepulse_core::PlatformsFile) {
    for platform in &file.platforms {
        println!(
            "{} -> sheet '{}', artifact {}",
            platform.name, platform.sheet, platform.output_file
        );
        for collection in &platform.collections {
            println!("  - {}: {}", collection.name, collection.target);
        }
    }
}
