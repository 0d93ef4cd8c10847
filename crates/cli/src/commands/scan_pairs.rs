//! Pair scan CLI command.
//!
//! Scans every pair of one basket, filters the rows, and ranks them by the
//! chosen key.

use super::{format_opt, print_banner, print_json, CommonArgs, OutputFormat};
use anyhow::Result;
use clap::Args;
use stat_arb_analytics::{
    rank_pairs, scan_pairs, valid_tickers, FailureMode, PairFilter, PairRow, PairSort,
};
use tracing::warn;

/// Arguments for the scan-pairs command.
#[derive(Args, Debug, Clone)]
pub struct ScanPairsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Basket to scan
    #[arg(long)]
    pub basket: String,

    /// Only show pairs classified as opportunities
    #[arg(long)]
    pub only_opportunities: bool,

    /// Minimum latest rolling correlation
    #[arg(long)]
    pub min_corr: Option<f64>,

    /// Minimum absolute z-score
    #[arg(long)]
    pub min_abs_z: Option<f64>,

    /// Sort key: abs-z, recent-breach, corr, spread-vol (default: abs-z)
    #[arg(long, default_value = "abs-z")]
    pub sort: String,

    /// Include pairs whose metrics could not be computed
    #[arg(long)]
    pub show_failures: bool,
}

impl ScanPairsArgs {
    fn filter(&self) -> PairFilter {
        PairFilter {
            min_corr: self.min_corr,
            min_abs_z: self.min_abs_z,
            opportunities_only: self.only_opportunities,
        }
    }

    fn failure_mode(&self) -> FailureMode {
        if self.show_failures {
            FailureMode::Report
        } else {
            FailureMode::Skip
        }
    }
}

/// Runs the scan-pairs command.
///
/// # Errors
/// Returns an error if the session cannot be loaded, the basket is unknown,
/// or the sort key is invalid.
pub fn run_scan_pairs(args: ScanPairsArgs) -> Result<()> {
    let sort: PairSort = args.sort.parse()?;
    let session = args.common.load_session()?;
    let basket = session.basket(&args.basket)?;

    let tickers = valid_tickers(session.prices(), basket);
    if tickers.len() < 2 {
        warn!(
            basket = %basket.name,
            usable = tickers.len(),
            "Basket has fewer than two usable tickers"
        );
    }

    let scan = scan_pairs(session.prices(), &tickers, &session.settings);
    let mut rows = args.filter().apply(scan.rows(args.failure_mode()));
    rank_pairs(&mut rows, sort);

    match session.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            let title = format!(
                "PAIR SCAN: {} ({} tickers, {} pairs, sorted by {})",
                basket.name,
                tickers.len(),
                scan.len(),
                sort
            );
            print_pair_table(&title, &rows);
            Ok(())
        }
    }
}

pub(crate) fn print_pair_table(title: &str, rows: &[PairRow]) {
    print_banner(title, 120);
    println!(
        "{:<20} {:<20} {:>8} {:>7} {:>7} {:>7} {:>11} {:>5}",
        "Leg A", "Leg B", "z", "Breach", "Since", "Corr", "Spread vol", "Opp"
    );
    println!("{}", "-".repeat(120));

    for row in rows {
        if let Some(error) = &row.error {
            println!("{:<20} {:<20} [!!] {}", row.a, row.b, error);
            continue;
        }
        println!(
            "{:<20} {:<20} {:>8} {:>7} {:>7} {:>7} {:>11} {:>5}",
            row.a,
            row.b,
            format_opt(row.z, 2),
            if row.boll_breach { "yes" } else { "no" },
            row.bars_since_breach
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            format_opt(row.corr, 2),
            format_opt(row.spread_vol, 5),
            if row.opportunity { "*" } else { "" }
        );
    }

    let opportunities = rows.iter().filter(|r| r.opportunity).count();
    println!("{}", "=".repeat(120));
    println!("  {} rows, {} opportunities", rows.len(), opportunities);
    println!();
}
