//! Drill-down reports for a single basket or pair.
//!
//! These compose the scanners and primitives into the detail views a caller
//! renders after picking a row from a scan table.

use crate::basket_scanner::{valid_tickers, windowed_basket_vol};
use crate::pair_scanner::{
    basket_pairs, metrics_for_spread, scan_pairs_with_returns, FailureMode, PairMetrics, PairRow,
};
use crate::returns::{basket_return, log_returns, rolling_corr_min_periods};
use crate::spread::{bollinger_bands, spread_series, zscore, BollingerBands};
use crate::stats;
use serde::Serialize;
use stat_arb_core::{AnalyticsError, Basket, PriceTable, Result, Series, Settings, Timestamp};

/// Floor on the number of paired returns before the drill-down correlation
/// is reported.
pub const MIN_CORR_PERIODS: usize = 20;

/// Per-member figures in a basket drill-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStats {
    pub ticker: String,
    /// Summed log return over the lookback, in percent.
    pub return_pct: f64,
    /// Std of log returns over the analytics window.
    pub vol: Option<f64>,
    /// Missing prices within the display window, in percent.
    pub missing_pct: f64,
}

/// Basket drill-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasketDetail {
    pub basket: String,
    pub n_tickers: usize,
    /// Summed equal-weight basket return over the lookback, in percent.
    pub return_pct: f64,
    pub basket_vol: Option<f64>,
    pub opp_count: usize,
    /// Members by absolute return, largest first.
    pub members: Vec<MemberStats>,
    /// Every pair in enumeration order.
    pub pairs: Vec<PairRow>,
}

fn missing_pct(values: &[Option<f64>]) -> f64 {
    if values.is_empty() {
        return 100.0;
    }
    values.iter().filter(|v| v.is_none()).count() as f64 / values.len() as f64 * 100.0
}

/// Builds the drill-down for one basket.
///
/// # Errors
/// Returns `InvalidParameter` if fewer than two members are present in
/// `prices`.
pub fn basket_detail(
    prices: &PriceTable,
    basket: &Basket,
    settings: &Settings,
    mode: FailureMode,
) -> Result<BasketDetail> {
    let tickers = valid_tickers(prices, basket);
    if tickers.len() < 2 {
        return Err(AnalyticsError::invalid_parameter(format!(
            "basket '{}' has {} usable tickers, need at least 2",
            basket.name,
            tickers.len()
        )));
    }

    let logret = log_returns(prices);
    let recent = logret.tail(settings.lookback_bars);
    let window = logret.tail(settings.analytics_window);
    let display = prices.tail(settings.display_bars());

    let basket_recent = basket_return(&recent, &tickers)?;
    let return_pct = stats::nan_sum(basket_recent.values()) * 100.0;

    let mut members: Vec<MemberStats> = tickers
        .iter()
        .map(|ticker| MemberStats {
            ticker: ticker.clone(),
            return_pct: recent.column(ticker).map_or(0.0, stats::nan_sum) * 100.0,
            vol: window.column(ticker).and_then(stats::nan_std),
            missing_pct: display.column(ticker).map_or(100.0, missing_pct),
        })
        .collect();
    members.sort_by(|x, y| y.return_pct.abs().total_cmp(&x.return_pct.abs()));

    let scan = scan_pairs_with_returns(prices, &logret, &tickers, settings);

    Ok(BasketDetail {
        basket: basket.name.clone(),
        n_tickers: tickers.len(),
        return_pct,
        basket_vol: windowed_basket_vol(&logret, &tickers, settings.analytics_window),
        opp_count: scan.opportunity_count(),
        members,
        pairs: scan.rows(mode),
    })
}

/// One bar of the pair drill-down table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairBar {
    pub ts: Timestamp,
    pub spread: Option<f64>,
    pub z: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub breach: bool,
}

/// Pair drill-down: full spread, band, and correlation series plus the
/// latest metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairDetail {
    pub a: String,
    pub b: String,
    pub spread: Series,
    pub zscore: Series,
    pub bands: BollingerBands,
    pub breaches: Vec<bool>,
    /// Rolling return correlation with a relaxed warm-up.
    pub rolling_corr: Series,
    pub metrics: PairMetrics,
    /// Bars where both legs have a return.
    pub paired_returns: usize,
    pub missing_pct_a: f64,
    pub missing_pct_b: f64,
}

/// Correlation warm-up for the drill-down: half the window, at least
/// [`MIN_CORR_PERIODS`], never more than the window itself.
#[must_use]
pub fn drill_down_min_periods(window: usize) -> usize {
    (window / 2).max(MIN_CORR_PERIODS).min(window)
}

/// Builds the drill-down for one pair over the whole table.
///
/// The headline correlation is the latest value of the relaxed rolling
/// correlation, and leg missing percentages cover the display window.
///
/// # Errors
/// Returns `MissingColumns` if `a` or `b` is absent.
pub fn pair_detail(prices: &PriceTable, a: &str, b: &str, settings: &Settings) -> Result<PairDetail> {
    let spread = spread_series(prices, a, b)?;
    let logret = log_returns(prices);
    let window = settings.analytics_window;

    let rolling_corr = rolling_corr_min_periods(&logret, a, b, window, drill_down_min_periods(window))?;
    let corr = rolling_corr.latest();

    let bands = bollinger_bands(&spread, settings.z_window, settings.boll_k);
    let breaches = bands.breaches(&spread);

    let paired_returns = match (logret.column(a), logret.column(b)) {
        (Some(ra), Some(rb)) => ra
            .iter()
            .zip(rb)
            .filter(|(x, y)| x.is_some() && y.is_some())
            .count(),
        _ => 0,
    };
    let display = prices.tail(settings.display_bars());
    let leg_missing = |symbol: &str| match display.column(symbol) {
        Some(values) if !values.is_empty() => missing_pct(values),
        _ => 0.0,
    };

    Ok(PairDetail {
        a: a.to_string(),
        b: b.to_string(),
        zscore: zscore(&spread, settings.z_window),
        metrics: metrics_for_spread(&spread, corr, settings),
        spread,
        bands,
        breaches,
        rolling_corr,
        paired_returns,
        missing_pct_a: leg_missing(a),
        missing_pct_b: leg_missing(b),
    })
}

impl PairDetail {
    /// Restricts every series to bars at or after `since`. Metrics are kept
    /// as computed over the full history.
    #[must_use]
    pub fn since(&self, since: Timestamp) -> Self {
        let spread = self.spread.since(since);
        let cut = self.spread.len() - spread.len();
        Self {
            a: self.a.clone(),
            b: self.b.clone(),
            zscore: self.zscore.since(since),
            bands: BollingerBands {
                mid: self.bands.mid.since(since),
                upper: self.bands.upper.since(since),
                lower: self.bands.lower.since(since),
            },
            breaches: self.breaches[cut..].to_vec(),
            rolling_corr: self.rolling_corr.since(since),
            spread,
            metrics: self.metrics,
            paired_returns: self.paired_returns,
            missing_pct_a: self.missing_pct_a,
            missing_pct_b: self.missing_pct_b,
        }
    }

    /// The last `n` bars as table rows, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<PairBar> {
        let start = self.spread.len().saturating_sub(n);
        (start..self.spread.len())
            .map(|i| PairBar {
                ts: self.spread.index()[i],
                spread: self.spread.values()[i],
                z: self.zscore.values()[i],
                upper: self.bands.upper.values()[i],
                lower: self.bands.lower.values()[i],
                breach: self.breaches[i],
            })
            .collect()
    }

    /// Defined points in the rolling correlation series.
    #[must_use]
    pub fn corr_points(&self) -> usize {
        self.rolling_corr.count_defined()
    }
}

/// Pairs of a basket that exist in `prices`, for pair pickers.
#[must_use]
pub fn available_pairs(prices: &PriceTable, basket: &Basket) -> Vec<(String, String)> {
    basket_pairs(&valid_tickers(prices, basket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn hours(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    fn wave(n: usize, phase: f64, scale: f64) -> Vec<Option<f64>> {
        (0..n)
            .map(|i| Some(20.0 * (1.0 + scale * ((i as f64) * 0.5 + phase).sin())))
            .collect()
    }

    fn table(columns: Vec<(&str, Vec<Option<f64>>)>) -> PriceTable {
        let n = columns.first().map_or(0, |c| c.1.len());
        PriceTable::new(
            hours(n),
            columns
                .into_iter()
                .map(|(name, v)| (name.to_string(), v))
                .collect(),
        )
        .unwrap()
    }

    fn settings() -> Settings {
        Settings {
            z_window: 6,
            analytics_window: 12,
            lookback_bars: 4,
            history_days_display: 1,
            history_days_fetch: 1,
            ..Settings::default()
        }
    }

    #[test]
    fn drill_down_min_periods_bounds() {
        assert_eq!(drill_down_min_periods(240), 120);
        assert_eq!(drill_down_min_periods(30), 20);
        assert_eq!(drill_down_min_periods(12), 12);
    }

    #[test]
    fn basket_detail_rejects_small_basket() {
        let prices = table(vec![("A", wave(10, 0.0, 0.1))]);
        let basket = Basket::new("solo", ["A", "B"]);
        let err = basket_detail(&prices, &basket, &settings(), FailureMode::Skip).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
    }

    #[test]
    fn basket_detail_members_sorted_by_abs_return() {
        let mut falling = wave(30, 0.0, 0.01);
        for (i, p) in falling.iter_mut().enumerate().skip(26) {
            *p = p.map(|v| v * (1.0 - 0.05 * (i - 25) as f64));
        }
        let prices = table(vec![
            ("FLAT", vec![Some(5.0); 30]),
            ("FALL", falling),
            ("WOBBLE", wave(30, 0.3, 0.01)),
        ]);
        let basket = Basket::new("mix", ["FLAT", "FALL", "WOBBLE"]);
        let detail = basket_detail(&prices, &basket, &settings(), FailureMode::Report).unwrap();

        assert_eq!(detail.n_tickers, 3);
        assert_eq!(detail.members[0].ticker, "FALL");
        assert!(detail.members[0].return_pct < 0.0);
        assert_eq!(detail.members[2].ticker, "FLAT");
        assert_eq!(detail.members[2].return_pct, 0.0);
        assert_eq!(detail.members[2].vol, Some(0.0));
        assert!(detail.members.iter().all(|m| m.missing_pct == 0.0));
        assert_eq!(detail.pairs.len(), 3);
        assert!(detail.basket_vol.is_some());
    }

    #[test]
    fn basket_detail_missing_pct_uses_display_window() {
        // One missing price 30 bars back falls outside a 24-bar display window.
        let mut gappy = wave(40, 0.0, 0.05);
        gappy[5] = None;
        gappy[39] = None;
        let prices = table(vec![("A", gappy), ("B", wave(40, 1.0, 0.05))]);
        let basket = Basket::new("ab", ["A", "B"]);
        let detail = basket_detail(&prices, &basket, &settings(), FailureMode::Skip).unwrap();
        let a = detail.members.iter().find(|m| m.ticker == "A").unwrap();
        assert!((a.missing_pct - 100.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn pair_detail_series_share_the_spread_index() {
        let prices = table(vec![("A", wave(40, 0.0, 0.1)), ("B", wave(40, 0.8, 0.07))]);
        let detail = pair_detail(&prices, "A", "B", &settings()).unwrap();

        assert_eq!(detail.spread.len(), 40);
        assert_eq!(detail.zscore.len(), 40);
        assert_eq!(detail.bands.upper.len(), 40);
        assert_eq!(detail.breaches.len(), 40);
        assert_eq!(detail.paired_returns, 39);
        assert_eq!(detail.missing_pct_a, 0.0);
        // Relaxed warm-up: defined from the twelfth paired return onward.
        assert_eq!(detail.corr_points(), 40 - 12);
        assert_eq!(detail.metrics.z, detail.zscore.latest());
    }

    #[test]
    fn pair_detail_since_cuts_every_series() {
        let prices = table(vec![("A", wave(20, 0.0, 0.1)), ("B", wave(20, 0.8, 0.07))]);
        let detail = pair_detail(&prices, "A", "B", &settings()).unwrap();
        let cut = detail.since(prices.index()[15]);

        assert_eq!(cut.spread.len(), 5);
        assert_eq!(cut.zscore.len(), 5);
        assert_eq!(cut.bands.lower.len(), 5);
        assert_eq!(cut.breaches.len(), 5);
        assert_eq!(cut.rolling_corr.len(), 5);
        assert_eq!(cut.metrics, detail.metrics);

        let recent = detail.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].ts, prices.index()[19]);
        assert_eq!(recent[2].z, detail.zscore.latest());
    }

    #[test]
    fn pair_detail_corr_survives_a_missing_return() {
        // A gap inside the last window leaves the strict correlation undefined.
        let mut a = wave(40, 0.0, 0.1);
        a[35] = None;
        let prices = table(vec![("A", a), ("B", wave(40, 0.8, 0.07))]);
        let settings = Settings {
            analytics_window: 30,
            ..settings()
        };
        let detail = pair_detail(&prices, "A", "B", &settings).unwrap();

        let logret = log_returns(&prices);
        assert_eq!(crate::returns::pair_corr_latest(&logret, "A", "B", 30).unwrap(), None);
        assert!(detail.metrics.corr.is_some());
        assert_eq!(detail.metrics.corr, detail.rolling_corr.latest());
    }

    #[test]
    fn pair_detail_missing_pct_uses_display_window() {
        let mut a = wave(40, 0.0, 0.1);
        a[2] = None;
        a[38] = None;
        let prices = table(vec![("A", a), ("B", wave(40, 0.8, 0.07))]);
        let detail = pair_detail(&prices, "A", "B", &settings()).unwrap();

        // Only the gap at bar 38 is inside the 24-bar display window.
        assert!((detail.missing_pct_a - 100.0 / 24.0).abs() < 1e-9);
        assert_eq!(detail.missing_pct_b, 0.0);
    }

    #[test]
    fn pair_detail_missing_column_errors() {
        let prices = table(vec![("A", wave(5, 0.0, 0.1))]);
        let err = pair_detail(&prices, "A", "NOPE", &settings()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn available_pairs_skip_absent_members() {
        let prices = table(vec![("B", wave(3, 0.0, 0.1)), ("A", wave(3, 0.5, 0.1))]);
        let basket = Basket::new("b", ["B", "GONE", "A"]);
        assert_eq!(
            available_pairs(&prices, &basket),
            vec![("A".to_string(), "B".to_string())]
        );
    }
}
