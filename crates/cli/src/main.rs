use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    BasketArgs, BasketsArgs, ExportArgs, HealthArgs, PairArgs, ScanBasketsArgs, ScanPairsArgs,
};

#[derive(Parser)]
#[command(name = "stat-arb")]
#[command(about = "Basket statistical-arbitrage scanner over close-price history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data completeness report for the loaded price history
    Health(HealthArgs),
    /// Rank every basket by volatility and count open opportunities
    ScanBaskets(ScanBasketsArgs),
    /// Scan, filter, and rank the pairs of one basket
    ScanPairs(ScanPairsArgs),
    /// Drill into one basket: members and pairs
    Basket(BasketArgs),
    /// Drill into one pair: spread, bands, and correlation
    Pair(PairArgs),
    /// List baskets and the members present in the price history
    Baskets(BasketsArgs),
    /// Write the loaded price history as wide CSV
    Export(ExportArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Reports go to stdout; logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Health(args) => commands::run_health(args)?,
        Commands::ScanBaskets(args) => commands::run_scan_baskets(args)?,
        Commands::ScanPairs(args) => commands::run_scan_pairs(args)?,
        Commands::Basket(args) => commands::run_basket(args)?,
        Commands::Pair(args) => commands::run_pair(args)?,
        Commands::Baskets(args) => commands::run_baskets(args)?,
        Commands::Export(args) => commands::run_export(args)?,
    }

    Ok(())
}
