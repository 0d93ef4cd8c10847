//! Pair drill-down CLI command.
//!
//! Computes the spread, bands, and rolling correlation of one pair over the
//! full history and reports the display window.

use super::{format_date, format_opt, print_banner, print_json, CommonArgs, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use stat_arb_analytics::{pair_detail, PairDetail};
use stat_arb_data::to_exchange_symbol;

/// Arguments for the pair command.
#[derive(Args, Debug, Clone)]
pub struct PairArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// First leg (raw like ETHUSD or market symbol like ETH/USDT:USDT)
    #[arg(long)]
    pub a: String,

    /// Second leg
    #[arg(long)]
    pub b: String,

    /// Number of most recent bars to print
    #[arg(long, default_value_t = 24)]
    pub tail: usize,
}

/// Runs the pair command.
///
/// # Errors
/// Returns an error if the session cannot be loaded or either leg is absent
/// from the price history.
pub fn run_pair(args: PairArgs) -> Result<()> {
    let session = args.common.load_session()?;
    let a = to_exchange_symbol(&args.a);
    let b = to_exchange_symbol(&args.b);

    let detail = pair_detail(session.prices(), &a, &b, &session.settings)
        .with_context(|| format!("Failed to analyze pair {a}/{b}"))?;
    let shown = match session.snapshot.display_start() {
        Some(start) => detail.since(start),
        None => detail,
    };

    match session.format {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Text => {
            print_pair_detail(&shown, args.tail);
            Ok(())
        }
    }
}

fn print_pair_detail(detail: &PairDetail, tail: usize) {
    let metrics = &detail.metrics;
    print_banner(&format!("PAIR: {} vs {}", detail.a, detail.b), 90);
    println!("  z-score:            {}", format_opt(metrics.z, 3));
    println!("  Bollinger breach:   {}", metrics.boll_breach);
    println!(
        "  Bars since breach:  {}",
        metrics
            .bars_since_breach
            .map_or_else(|| "never".to_string(), |n| n.to_string())
    );
    println!("  Correlation:        {}", format_opt(metrics.corr, 3));
    println!("  Spread vol:         {}", format_opt(metrics.spread_vol, 5));
    println!(
        "  Opportunity:        {}",
        if metrics.opportunity { "YES" } else { "no" }
    );
    println!(
        "  Paired returns:     {} (correlation points shown: {})",
        detail.paired_returns,
        detail.corr_points()
    );
    println!(
        "  Missing:            {} {:.2}%, {} {:.2}%",
        detail.a, detail.missing_pct_a, detail.b, detail.missing_pct_b
    );
    println!("{}", "=".repeat(90));
    println!();

    println!("LAST {tail} BARS:");
    println!(
        "{:<18} {:>12} {:>8} {:>12} {:>12} {:>7}",
        "Time", "Spread", "z", "Upper", "Lower", "Breach"
    );
    println!("{}", "-".repeat(74));
    for bar in detail.recent(tail) {
        println!(
            "{:<18} {:>12} {:>8} {:>12} {:>12} {:>7}",
            format_date(Some(bar.ts)),
            format_opt(bar.spread, 5),
            format_opt(bar.z, 2),
            format_opt(bar.upper, 5),
            format_opt(bar.lower, 5),
            if bar.breach { "x" } else { "" }
        );
    }
    println!();
}
