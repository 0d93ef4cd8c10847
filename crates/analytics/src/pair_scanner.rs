//! Pair scanner.
//!
//! Enumerates every unordered pair in a basket, computes the full metric set
//! for each, and classifies opportunities. Per-pair failures are isolated in
//! [`PairOutcome::result`]; the caller chooses whether to skip or report them
//! through [`FailureMode`].

use crate::returns::{log_returns, pair_corr_latest};
use crate::spread::{bars_since_breach, bollinger_bands, spread_series, spread_vol, zscore};
use serde::Serialize;
use stat_arb_core::{AnalyticsError, LogReturnTable, PriceTable, Series, Settings};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Latest-bar metrics for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairMetrics {
    /// Latest spread z-score.
    pub z: Option<f64>,
    /// Whether the latest spread value sits outside its Bollinger envelope.
    pub boll_breach: bool,
    /// Bars since the most recent band breach.
    pub bars_since_breach: Option<usize>,
    /// Latest rolling correlation of log returns over the analytics window.
    pub corr: Option<f64>,
    /// Volatility of spread changes over the analytics window.
    pub spread_vol: Option<f64>,
    /// `|z| >= z_entry` and a band breach on the latest bar.
    pub opportunity: bool,
}

/// A pair whose metrics could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pair {a}/{b}: {reason}")]
pub struct PairFailure {
    pub a: String,
    pub b: String,
    pub reason: String,
}

impl PairFailure {
    pub fn new(a: impl Into<String>, b: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            reason: reason.into(),
        }
    }
}

/// Scan result for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome {
    pub a: String,
    pub b: String,
    pub result: Result<PairMetrics, PairFailure>,
}

/// Opportunity classification on current data only.
#[must_use]
pub fn is_opportunity(z: Option<f64>, boll_breach: bool, z_entry: f64) -> bool {
    boll_breach && z.is_some_and(|z| z.abs() >= z_entry)
}

/// All unordered pairs `(a, b)` with `a < b`, tickers taken in ascending order.
#[must_use]
pub fn basket_pairs<S: AsRef<str>>(tickers: &[S]) -> Vec<(String, String)> {
    let mut sorted: Vec<&str> = tickers.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut pairs = Vec::with_capacity(sorted.len() * sorted.len().saturating_sub(1) / 2);
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            pairs.push(((*a).to_string(), (*b).to_string()));
        }
    }
    pairs
}

/// Computes the metric set for one pair.
///
/// # Errors
/// Returns a [`PairFailure`] if either leg is missing from the tables or the
/// legs never trade on the same bar.
pub fn compute_pair_metrics(
    prices: &PriceTable,
    logret: &LogReturnTable,
    a: &str,
    b: &str,
    settings: &Settings,
) -> Result<PairMetrics, PairFailure> {
    let fail = |e: AnalyticsError| PairFailure::new(a, b, e.to_string());

    let spread = spread_series(prices, a, b).map_err(fail)?;
    if spread.is_empty() {
        return Err(PairFailure::new(a, b, "no bars with both prices present"));
    }

    let corr = pair_corr_latest(logret, a, b, settings.analytics_window).map_err(fail)?;
    Ok(metrics_for_spread(&spread, corr, settings))
}

/// Latest-bar metrics of an already built spread, given the pair's latest
/// return correlation.
#[must_use]
pub fn metrics_for_spread(spread: &Series, corr: Option<f64>, settings: &Settings) -> PairMetrics {
    let z = zscore(spread, settings.z_window).latest();
    let bands = bollinger_bands(spread, settings.z_window, settings.boll_k);
    let boll_breach = bands.latest_breach(spread);

    PairMetrics {
        z,
        boll_breach,
        bars_since_breach: bars_since_breach(&bands.breaches(spread)),
        corr,
        spread_vol: spread_vol(spread, settings.analytics_window),
        opportunity: is_opportunity(z, boll_breach, settings.z_entry),
    }
}

/// Scans every pair of `tickers`, deriving log returns from `prices`.
#[must_use]
pub fn scan_pairs<S: AsRef<str>>(prices: &PriceTable, tickers: &[S], settings: &Settings) -> PairScan {
    scan_pairs_with_returns(prices, &log_returns(prices), tickers, settings)
}

/// Scans every pair of `tickers` against precomputed log returns.
#[must_use]
pub fn scan_pairs_with_returns<S: AsRef<str>>(
    prices: &PriceTable,
    logret: &LogReturnTable,
    tickers: &[S],
    settings: &Settings,
) -> PairScan {
    let outcomes: Vec<PairOutcome> = basket_pairs(tickers)
        .into_iter()
        .map(|(a, b)| {
            let result = compute_pair_metrics(prices, logret, &a, &b, settings);
            if let Err(failure) = &result {
                warn!(a = %a, b = %b, reason = %failure.reason, "Pair metrics failed");
            }
            PairOutcome { a, b, result }
        })
        .collect();

    let scan = PairScan { outcomes };
    debug!(
        pairs = scan.len(),
        failures = scan.failures().count(),
        opportunities = scan.opportunity_count(),
        "Pair scan complete"
    );
    scan
}

/// How failed pairs appear in tabular output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Drop failed pairs.
    #[default]
    Skip,
    /// Keep failed pairs with undefined metrics and the failure reason.
    Report,
}

/// Every pair outcome of one basket, in enumeration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairScan {
    outcomes: Vec<PairOutcome>,
}

impl PairScan {
    #[must_use]
    pub fn outcomes(&self) -> &[PairOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PairFailure> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Number of pairs classified as opportunities.
    #[must_use]
    pub fn opportunity_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(m) if m.opportunity))
            .count()
    }

    /// Flattens outcomes into table rows.
    #[must_use]
    pub fn rows(&self, mode: FailureMode) -> Vec<PairRow> {
        self.outcomes
            .iter()
            .filter_map(|o| match (&o.result, mode) {
                (Ok(metrics), _) => Some(PairRow::from_metrics(&o.a, &o.b, metrics)),
                (Err(failure), FailureMode::Report) => Some(PairRow::failed(failure)),
                (Err(_), FailureMode::Skip) => None,
            })
            .collect()
    }
}

/// One output row of the pair table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairRow {
    pub a: String,
    pub b: String,
    pub z: Option<f64>,
    pub boll_breach: bool,
    pub bars_since_breach: Option<usize>,
    pub corr: Option<f64>,
    pub spread_vol: Option<f64>,
    pub opportunity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PairRow {
    #[must_use]
    pub fn from_metrics(a: &str, b: &str, metrics: &PairMetrics) -> Self {
        Self {
            a: a.to_string(),
            b: b.to_string(),
            z: metrics.z,
            boll_breach: metrics.boll_breach,
            bars_since_breach: metrics.bars_since_breach,
            corr: metrics.corr,
            spread_vol: metrics.spread_vol,
            opportunity: metrics.opportunity,
            error: None,
        }
    }

    /// Row for a failed pair: every metric undefined, never an opportunity.
    #[must_use]
    pub fn failed(failure: &PairFailure) -> Self {
        Self {
            a: failure.a.clone(),
            b: failure.b.clone(),
            z: None,
            boll_breach: false,
            bars_since_breach: None,
            corr: None,
            spread_vol: None,
            opportunity: false,
            error: Some(failure.reason.clone()),
        }
    }

    #[must_use]
    pub fn abs_z(&self) -> Option<f64> {
        self.z.map(f64::abs)
    }
}

/// Row filter. An undefined value never passes an active threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairFilter {
    pub min_corr: Option<f64>,
    pub min_abs_z: Option<f64>,
    pub opportunities_only: bool,
}

impl PairFilter {
    #[must_use]
    pub fn matches(&self, row: &PairRow) -> bool {
        let passes = |threshold: Option<f64>, value: Option<f64>| match threshold {
            None => true,
            Some(min) => value.is_some_and(|v| v >= min),
        };

        (!self.opportunities_only || row.opportunity)
            && passes(self.min_corr, row.corr)
            && passes(self.min_abs_z, row.abs_z())
    }

    #[must_use]
    pub fn apply(&self, rows: Vec<PairRow>) -> Vec<PairRow> {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sort keys for the pair table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairSort {
    /// `|z|` descending.
    #[default]
    AbsZ,
    /// Bars since breach ascending.
    RecentBreach,
    /// Correlation descending.
    Correlation,
    /// Spread volatility descending.
    SpreadVol,
}

impl PairSort {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AbsZ => "abs-z",
            Self::RecentBreach => "recent-breach",
            Self::Correlation => "corr",
            Self::SpreadVol => "spread-vol",
        }
    }
}

impl fmt::Display for PairSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairSort {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abs-z" | "abs_z" | "z" => Ok(Self::AbsZ),
            "recent-breach" | "bars-since-breach" | "bars_since_breach" => Ok(Self::RecentBreach),
            "corr" | "correlation" => Ok(Self::Correlation),
            "spread-vol" | "spread_vol" => Ok(Self::SpreadVol),
            _ => Err(AnalyticsError::invalid_parameter(format!(
                "unknown pair sort '{s}', expected abs-z, recent-breach, corr, or spread-vol"
            ))),
        }
    }
}

/// Orders defined values by `cmp`, undefined after every defined value.
fn none_last<T>(x: Option<T>, y: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (x, y) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of `rows` by `sort`; undefined keys go last, ties keep
/// enumeration order.
pub fn rank_pairs(rows: &mut [PairRow], sort: PairSort) {
    rows.sort_by(|x, y| match sort {
        PairSort::AbsZ => none_last(x.abs_z(), y.abs_z(), |x, y| y.total_cmp(x)),
        PairSort::RecentBreach => none_last(x.bars_since_breach, y.bars_since_breach, usize::cmp),
        PairSort::Correlation => none_last(x.corr, y.corr, |x, y| y.total_cmp(x)),
        PairSort::SpreadVol => none_last(x.spread_vol, y.spread_vol, |x, y| y.total_cmp(x)),
    });
}
