//! Basket scan CLI command: one ranked row per configured basket.

use super::{format_opt, print_banner, print_json, CommonArgs, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use stat_arb_analytics::{scan_baskets, BasketSummary};
use stat_arb_core::Settings;

/// Arguments for the scan-baskets command.
#[derive(Args, Debug, Clone)]
pub struct ScanBasketsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Only list baskets with at least one opportunity
    #[arg(long)]
    pub only_opportunities: bool,

    /// |z| threshold that marks a pair as an opportunity (overrides config)
    #[arg(long)]
    pub z_entry: Option<f64>,

    /// Bars used for member returns and top movers (overrides config)
    #[arg(long)]
    pub lookback_bars: Option<usize>,
}

impl ScanBasketsArgs {
    /// Settings with the command-line overrides applied.
    ///
    /// # Errors
    /// Returns an error if an override makes the settings invalid.
    pub fn effective_settings(&self, base: &Settings) -> Result<Settings> {
        let mut settings = base.clone();
        if let Some(z_entry) = self.z_entry {
            settings.z_entry = z_entry;
        }
        if let Some(lookback_bars) = self.lookback_bars {
            settings.lookback_bars = lookback_bars;
        }
        settings.validate().context("Invalid scan-baskets override")?;
        Ok(settings)
    }
}

/// Runs the scan-baskets command.
///
/// # Errors
/// Returns an error if the session cannot be loaded or an override is
/// invalid.
pub fn run_scan_baskets(args: ScanBasketsArgs) -> Result<()> {
    let session = args.common.load_session()?;
    let settings = args.effective_settings(&session.settings)?;
    let mut rows = scan_baskets(session.prices(), &session.baskets, &settings);
    if args.only_opportunities {
        rows.retain(|r| r.opp_count > 0);
    }

    match session.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            print_basket_table(&rows);
            Ok(())
        }
    }
}

fn print_basket_table(rows: &[BasketSummary]) {
    print_banner("BASKET SCAN (ranked by basket volatility)", 110);
    println!(
        "{:<30} {:>8} {:>10} {:>6}  {}",
        "Basket", "Tickers", "Vol %", "Opps", "Top movers"
    );
    println!("{}", "-".repeat(110));

    for row in rows {
        println!(
            "{:<30} {:>8} {:>10} {:>6}  {}",
            row.basket,
            row.n_tickers,
            format_opt(row.basket_vol.map(|v| v * 100.0), 3),
            row.opp_count,
            row.top_movers
        );
    }

    let total: usize = rows.iter().map(|r| r.opp_count).sum();
    println!("{}", "=".repeat(110));
    println!("  {} baskets, {} open opportunities", rows.len(), total);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(z_entry: Option<f64>, lookback_bars: Option<usize>) -> ScanBasketsArgs {
        ScanBasketsArgs {
            common: CommonArgs {
                prices: PathBuf::from("prices.csv"),
                config: PathBuf::from("config/Config.toml"),
                universe: PathBuf::from("config/Universe.toml"),
                format: "text".to_string(),
                ffill_limit: 3,
            },
            only_opportunities: false,
            z_entry,
            lookback_bars,
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let base = Settings::default();
        assert_eq!(args(None, None).effective_settings(&base).unwrap(), base);
    }

    #[test]
    fn test_overrides_apply() {
        let base = Settings::default();
        let settings = args(Some(1.5), Some(48)).effective_settings(&base).unwrap();
        assert_eq!(settings.z_entry, 1.5);
        assert_eq!(settings.lookback_bars, 48);
        assert_eq!(settings.z_window, base.z_window);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let base = Settings::default();
        assert!(args(Some(-1.0), None).effective_settings(&base).is_err());
        assert!(args(Some(f64::NAN), None).effective_settings(&base).is_err());
        assert!(args(None, Some(0)).effective_settings(&base).is_err());
    }
}
