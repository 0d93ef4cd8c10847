//! Basket drill-down CLI command.

use super::scan_pairs::print_pair_table;
use super::{format_opt, print_banner, print_json, CommonArgs, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use stat_arb_analytics::{basket_detail, rank_pairs, BasketDetail, FailureMode, PairFilter, PairSort};

/// Arguments for the basket command.
#[derive(Args, Debug, Clone)]
pub struct BasketArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Basket to drill into
    #[arg(long)]
    pub basket: String,

    /// Include pairs whose metrics could not be computed
    #[arg(long)]
    pub show_failures: bool,

    /// Only list pairs flagged as opportunities
    #[arg(long)]
    pub only_opportunities: bool,
}

impl BasketArgs {
    fn pair_filter(&self) -> PairFilter {
        PairFilter {
            opportunities_only: self.only_opportunities,
            ..PairFilter::default()
        }
    }
}

/// Runs the basket command.
///
/// # Errors
/// Returns an error if the session cannot be loaded, the basket is unknown,
/// or it has fewer than two usable tickers.
pub fn run_basket(args: BasketArgs) -> Result<()> {
    let session = args.common.load_session()?;
    let basket = session.basket(&args.basket)?;
    let mode = if args.show_failures {
        FailureMode::Report
    } else {
        FailureMode::Skip
    };

    let mut detail = basket_detail(session.prices(), basket, &session.settings, mode)
        .with_context(|| format!("Failed to build drill-down for basket '{}'", basket.name))?;
    detail.pairs = args.pair_filter().apply(detail.pairs);
    rank_pairs(&mut detail.pairs, PairSort::AbsZ);

    match session.format {
        OutputFormat::Json => print_json(&detail),
        OutputFormat::Text => {
            print_basket_detail(&detail, session.settings.lookback_bars);
            Ok(())
        }
    }
}

fn print_basket_detail(detail: &BasketDetail, lookback_bars: usize) {
    print_banner(&format!("BASKET: {}", detail.basket), 80);
    println!("  Tickers:            {}", detail.n_tickers);
    println!(
        "  Return ({lookback_bars} bars):  {:+.2}%",
        detail.return_pct
    );
    println!(
        "  Basket vol:         {}",
        format_opt(detail.basket_vol.map(|v| v * 100.0), 3)
    );
    println!("  Opportunities:      {}", detail.opp_count);
    println!("{}", "=".repeat(80));
    println!();

    println!("MEMBERS (by absolute return):");
    println!(
        "{:<24} {:>12} {:>10} {:>12}",
        "Ticker", "Return %", "Vol %", "Missing %"
    );
    println!("{}", "-".repeat(61));
    for member in &detail.members {
        println!(
            "{:<24} {:>+12.2} {:>10} {:>11.2}%",
            member.ticker,
            member.return_pct,
            format_opt(member.vol.map(|v| v * 100.0), 3),
            member.missing_pct
        );
    }

    print_pair_table("PAIRS (by |z|)", &detail.pairs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use stat_arb_analytics::PairRow;
    use std::path::PathBuf;

    fn args(only_opportunities: bool) -> BasketArgs {
        BasketArgs {
            common: CommonArgs {
                prices: PathBuf::from("prices.csv"),
                config: PathBuf::from("config/Config.toml"),
                universe: PathBuf::from("config/Universe.toml"),
                format: "text".to_string(),
                ffill_limit: 3,
            },
            basket: "eth_l1_core".to_string(),
            show_failures: false,
            only_opportunities,
        }
    }

    fn row(a: &str, z: f64, opportunity: bool) -> PairRow {
        PairRow {
            a: a.to_string(),
            b: "ZZZ".to_string(),
            z: Some(z),
            boll_breach: false,
            bars_since_breach: None,
            corr: Some(0.8),
            spread_vol: Some(0.01),
            opportunity,
            error: None,
        }
    }

    #[test]
    fn test_only_opportunities_filters_pairs() {
        let rows = vec![row("AAA", 2.5, true), row("BBB", 0.4, false), row("CCC", -3.0, true)];

        let kept = args(true).pair_filter().apply(rows.clone());
        let names: Vec<&str> = kept.iter().map(|r| r.a.as_str()).collect();
        assert_eq!(names, vec!["AAA", "CCC"]);

        assert_eq!(args(false).pair_filter().apply(rows).len(), 3);
    }
}
