//! Spread and band engine.
//!
//! Pairwise log-spread, rolling z-score, Bollinger bands, breach flags, and
//! spread volatility. Every transform returns a new [`Series`] aligned to the
//! input index; warm-up and degenerate bars are `None`.

use crate::stats;
use serde::Serialize;
use stat_arb_core::{AnalyticsError, PriceTable, Result, Series};

/// `ln(price_a) - ln(price_b)` on the bars where both prices are present.
///
/// # Errors
/// Returns `MissingColumns` if `a` or `b` is absent.
pub fn spread_series(prices: &PriceTable, a: &str, b: &str) -> Result<Series> {
    let (Some(pa), Some(pb)) = (prices.column(a), prices.column(b)) else {
        return Err(AnalyticsError::missing_columns(
            [a, b].into_iter().filter(|s| !prices.has_column(s)),
        ));
    };

    let (index, values): (Vec<_>, Vec<_>) = prices
        .index()
        .iter()
        .zip(pa.iter().zip(pb))
        .filter_map(|(ts, pair)| match pair {
            (Some(x), Some(y)) => Some((*ts, Some(x.ln() - y.ln()))),
            _ => None,
        })
        .unzip();

    Ok(Series::from_parts(index, values))
}

/// `(x - rolling_mean) / rolling_std`. Undefined during warm-up and where the
/// rolling std is zero.
#[must_use]
pub fn zscore(series: &Series, window: usize) -> Series {
    let mean = stats::rolling_mean(series.values(), window);
    let std = stats::rolling_std(series.values(), window);

    let values = series
        .values()
        .iter()
        .zip(mean.iter().zip(&std))
        .map(|(x, (m, s))| match (x, m, s) {
            (Some(x), Some(m), Some(s)) if *s != 0.0 => Some((x - m) / s),
            _ => None,
        })
        .collect();

    Series::from_parts(series.index().to_vec(), values)
}

/// Rolling mean with an envelope `k` standard deviations either side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub mid: Series,
    pub upper: Series,
    pub lower: Series,
}

impl BollingerBands {
    /// Breach flag per bar; see [`detect_breaches`].
    #[must_use]
    pub fn breaches(&self, series: &Series) -> Vec<bool> {
        detect_breaches(series, &self.upper, &self.lower)
    }

    /// Whether the latest bar breaches; see [`latest_boll_breach`].
    #[must_use]
    pub fn latest_breach(&self, series: &Series) -> bool {
        latest_boll_breach(series, &self.upper, &self.lower)
    }
}

/// Computes `mid = rolling_mean`, `upper = mid + k * std`, `lower = mid - k * std`.
#[must_use]
pub fn bollinger_bands(series: &Series, window: usize, k: f64) -> BollingerBands {
    let mid = stats::rolling_mean(series.values(), window);
    let std = stats::rolling_std(series.values(), window);

    let band = |sign: f64| -> Vec<Option<f64>> {
        mid.iter()
            .zip(&std)
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => Some(m + sign * k * s),
                _ => None,
            })
            .collect()
    };

    let index = series.index().to_vec();
    BollingerBands {
        upper: Series::from_parts(index.clone(), band(1.0)),
        lower: Series::from_parts(index.clone(), band(-1.0)),
        mid: Series::from_parts(index, mid),
    }
}

fn is_breach(x: Option<f64>, upper: Option<f64>, lower: Option<f64>) -> bool {
    match (x, upper, lower) {
        (Some(x), Some(u), Some(l)) => x > u || x < l,
        _ => false,
    }
}

/// Per-bar breach flag: strictly above `upper` or strictly below `lower`.
/// Bars with any undefined input are not breaches.
#[must_use]
pub fn detect_breaches(series: &Series, upper: &Series, lower: &Series) -> Vec<bool> {
    series
        .values()
        .iter()
        .zip(upper.values().iter().zip(lower.values()))
        .map(|(x, (u, l))| is_breach(*x, *u, *l))
        .collect()
}

/// Whether the last bar breaches. False when any input is empty or the last
/// values are undefined.
#[must_use]
pub fn latest_boll_breach(series: &Series, upper: &Series, lower: &Series) -> bool {
    match (
        series.values().last(),
        upper.values().last(),
        lower.values().last(),
    ) {
        (Some(x), Some(u), Some(l)) => is_breach(*x, *u, *l),
        _ => false,
    }
}

/// Bars elapsed since the most recent breach: `Some(0)` if the last bar
/// breaches, `None` if no bar ever did.
#[must_use]
pub fn bars_since_breach(breaches: &[bool]) -> Option<usize> {
    breaches.iter().rev().position(|&b| b)
}

/// Sample std of the first difference of `series` over its last `window`
/// differenced points, or all of them when fewer are available.
///
/// `None` below two raw points or when fewer than two differences are defined.
#[must_use]
pub fn spread_vol(series: &Series, window: usize) -> Option<f64> {
    if series.count_defined() < 2 {
        return None;
    }

    let diffs: Vec<f64> = series
        .values()
        .windows(2)
        .filter_map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        })
        .collect();

    let start = diffs.len().saturating_sub(window);
    stats::sample_std(&diffs[start..])
}
