//! Data health CLI command.
//!
//! Shows coverage and missing-data percentages of the loaded price history,
//! and how old the price file is against the cache TTL.

use super::{format_date, print_banner, print_json, CommonArgs, OutputFormat, Session};
use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Args;
use serde::Serialize;
use stat_arb_analytics::{data_health, DataHealth};
use stat_arb_core::Timestamp;
use stat_arb_data::PriceSnapshot;

/// Arguments for the health command.
#[derive(Args, Debug, Clone)]
pub struct HealthArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Data health plus freshness of the loaded history.
#[derive(Debug, Clone, Serialize)]
struct HealthReport {
    #[serde(flatten)]
    health: DataHealth,
    price_age_seconds: i64,
    cache_ttl_seconds: u64,
    stale: bool,
}

impl HealthReport {
    fn new(health: DataHealth, snapshot: &PriceSnapshot, ttl_seconds: u64, now: Timestamp) -> Self {
        Self {
            health,
            price_age_seconds: snapshot.age(now).num_seconds(),
            cache_ttl_seconds: ttl_seconds,
            stale: snapshot.is_stale(now, ttl_seconds),
        }
    }
}

/// Runs the health command.
///
/// # Errors
/// Returns an error if the session cannot be loaded.
pub fn run_health(args: HealthArgs) -> Result<()> {
    let session = args.common.load_session()?;
    let report = HealthReport::new(
        data_health(session.prices()),
        &session.snapshot,
        session.settings.cache_ttl_seconds,
        Utc::now(),
    );

    match session.format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_health(&report, &session);
            Ok(())
        }
    }
}

/// Compact age such as `45m`, `3h 10m`, or `2d 4h`.
fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes().max(0);
    match (minutes / 1440, (minutes % 1440) / 60, minutes % 60) {
        (0, 0, m) => format!("{m}m"),
        (0, h, m) => format!("{h}h {m}m"),
        (d, h, _) => format!("{d}d {h}h"),
    }
}

fn span_days(health: &DataHealth) -> Option<f64> {
    match (health.start_ts, health.end_ts) {
        (Some(s), Some(e)) => Some((e - s).num_hours() as f64 / 24.0),
        _ => None,
    }
}

fn print_health(report: &HealthReport, session: &Session) {
    let health = &report.health;
    print_banner("DATA HEALTH REPORT", 80);
    println!("  Exchange:          {}", session.settings.exchange_id);
    println!("  Timeframe:         {}", session.settings.timeframe);
    println!("  Rows:              {}", health.n_rows);
    println!("  Symbols:           {}", health.n_cols);
    println!("  First bar:         {}", format_date(health.start_ts));
    println!("  Latest bar:        {}", format_date(health.end_ts));
    println!(
        "  Span (days):       {}",
        span_days(health).map_or_else(|| "-".to_string(), |d| format!("{d:.1}"))
    );
    println!(
        "  Display from:      {}",
        format_date(session.snapshot.display_start())
    );
    println!(
        "  Price file age:    {}{}",
        format_age(Duration::seconds(report.price_age_seconds)),
        if report.stale { "  [!!] older than cache TTL" } else { "" }
    );
    println!("  Overall missing:   {:.2}%", health.overall_missing_pct);
    println!("{}", "=".repeat(80));

    if health.per_symbol_missing_top10.is_empty() {
        println!();
        return;
    }

    println!();
    println!("MOST INCOMPLETE SYMBOLS:");
    println!("{:<30} {:>12}", "Symbol", "Missing %");
    println!("{}", "-".repeat(43));
    for entry in &health.per_symbol_missing_top10 {
        println!("{:<30} {:>11.2}%", entry.symbol, entry.missing_pct);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stat_arb_core::{PriceTable, Settings};

    #[test]
    fn test_span_days() {
        let mut health = DataHealth::empty();
        assert!(span_days(&health).is_none());

        health.start_ts = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        health.end_ts = Some(Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap());
        let days = span_days(&health).unwrap();
        assert!((days - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::minutes(45)), "45m");
        assert_eq!(format_age(Duration::minutes(190)), "3h 10m");
        assert_eq!(format_age(Duration::hours(52)), "2d 4h");
        assert_eq!(format_age(Duration::seconds(-5)), "0m");
    }

    #[test]
    fn test_report_flags_history_older_than_ttl() {
        let loaded_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let prices = PriceTable::new(
            vec![loaded_at],
            vec![("ETH/USDT:USDT".to_string(), vec![Some(2000.0)])],
        )
        .unwrap();
        let snapshot = PriceSnapshot::new(prices.clone(), &Settings::default(), loaded_at);

        let fresh = HealthReport::new(
            data_health(&prices),
            &snapshot,
            3600,
            loaded_at + Duration::minutes(30),
        );
        assert_eq!(fresh.price_age_seconds, 1800);
        assert!(!fresh.stale);

        let stale = HealthReport::new(
            data_health(&prices),
            &snapshot,
            3600,
            loaded_at + Duration::hours(2),
        );
        assert_eq!(stale.price_age_seconds, 7200);
        assert!(stale.stale);

        let json = serde_json::to_value(&stale).unwrap();
        assert_eq!(json["n_rows"], 1);
        assert_eq!(json["stale"], true);
        assert_eq!(json["cache_ttl_seconds"], 3600);
    }
}
