//! CLI commands for the stat-arb analytics engine.
//!
//! Every command loads the same session (settings, universe, price history)
//! from [`CommonArgs`] and then prints either a text report or JSON.

pub mod basket;
pub mod baskets;
pub mod export;
pub mod health;
pub mod pair;
pub mod scan_baskets;
pub mod scan_pairs;

pub use basket::{run_basket, BasketArgs};
pub use baskets::{run_baskets, BasketsArgs};
pub use export::{run_export, ExportArgs};
pub use health::{run_health, HealthArgs};
pub use pair::{run_pair, PairArgs};
pub use scan_baskets::{run_scan_baskets, ScanBasketsArgs};
pub use scan_pairs::{run_scan_pairs, ScanPairsArgs};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use stat_arb_core::{Basket, ConfigLoader, PriceTable, Settings, Timestamp};
use stat_arb_data::{resolve_universe, trim_history, CsvPriceLoader, PriceSnapshot, DEFAULT_FFILL_LIMIT};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Arguments shared by every command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Close-price CSV, long (timestamp,symbol,close) or wide (timestamp,<symbols>...)
    #[arg(long, env = "PRICES_CSV")]
    pub prices: PathBuf,

    /// Settings file
    #[arg(long, default_value = "config/Config.toml")]
    pub config: PathBuf,

    /// Basket universe file (built-in baskets are used if it does not exist)
    #[arg(long, default_value = "config/Universe.toml")]
    pub universe: PathBuf,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Longest gap, in bars, bridged by forward-filling when loading prices
    #[arg(long, default_value_t = DEFAULT_FFILL_LIMIT)]
    pub ffill_limit: usize,
}

/// Output format for command reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    ///
    /// # Errors
    /// Returns an error for anything other than `text`/`txt` or `json`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: '{}'. Valid formats: text, json", s)),
        }
    }
}

/// Everything a command needs, loaded once.
pub struct Session {
    pub settings: Settings,
    /// Universe baskets with members resolved to market symbols.
    pub baskets: Vec<Basket>,
    pub snapshot: PriceSnapshot,
    pub format: OutputFormat,
}

impl CommonArgs {
    /// Loads settings, the universe, and the price history of the universe
    /// symbols.
    ///
    /// The loaded history is cut to `history_days_fetch` days; analytics run
    /// over that, reports are cut further to `history_days_display`. The price
    /// file's modification time stands for when the history was fetched.
    ///
    /// # Errors
    /// Returns an error if the format is unknown or any input fails to load.
    pub fn load_session(&self) -> Result<Session> {
        let format = OutputFormat::parse(&self.format)?;
        let settings = ConfigLoader::load_from(&self.config)?;
        let universe = ConfigLoader::load_universe(&self.universe)?;
        let baskets = resolve_universe(&universe);

        let symbols = universe_symbols(&baskets);
        let loaded = CsvPriceLoader::new()
            .with_ffill_limit(self.ffill_limit)
            .load_symbols(&self.prices, &symbols)?;
        let full = trim_history(&loaded, settings.history_days_fetch);
        let snapshot = PriceSnapshot::new(full, &settings, self.fetched_at());

        let now = Utc::now();
        if snapshot.is_stale(now, settings.cache_ttl_seconds) {
            warn!(
                path = %self.prices.display(),
                age_minutes = snapshot.age(now).num_minutes(),
                ttl_seconds = settings.cache_ttl_seconds,
                "Price history is older than the cache TTL"
            );
        }

        info!(
            baskets = baskets.len(),
            rows = snapshot.full.len(),
            display_rows = snapshot.display.len(),
            timeframe = %settings.timeframe,
            "Session loaded"
        );

        Ok(Session {
            settings,
            baskets,
            snapshot,
            format,
        })
    }

    /// Modification time of the price file, or now if it cannot be read.
    fn fetched_at(&self) -> Timestamp {
        fs::metadata(&self.prices)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now())
    }
}

/// Every distinct member across `baskets`, in first-seen order.
fn universe_symbols(baskets: &[Basket]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for member in baskets.iter().flat_map(|b| b.members.iter()) {
        if !symbols.contains(member) {
            symbols.push(member.clone());
        }
    }
    symbols
}

impl Session {
    /// History the analytics run over.
    pub fn prices(&self) -> &PriceTable {
        &self.snapshot.full
    }

    /// Looks up a basket by name.
    ///
    /// # Errors
    /// Returns an error naming the known baskets if `name` is not one.
    pub fn basket(&self, name: &str) -> Result<&Basket> {
        self.baskets.iter().find(|b| b.name == name).ok_or_else(|| {
            anyhow!(
                "Unknown basket: '{}'. Known baskets: {}",
                name,
                self.baskets
                    .iter()
                    .map(|b| b.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_banner(title: &str, width: usize) {
    println!();
    println!("{}", "=".repeat(width));
    println!("{title}");
    println!("{}", "=".repeat(width));
}

/// Fixed-precision number, `-` when undefined.
pub(crate) fn format_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

pub(crate) fn format_date(ts: Option<Timestamp>) -> String {
    ts.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
