//! Return and volatility primitives.
//!
//! Elementary transforms over a [`PriceTable`]: log returns, rolling
//! volatility, equal-weight basket returns, and rolling correlation.

use crate::stats;
use stat_arb_core::{AnalyticsError, Frame, LogReturnTable, PriceTable, Result, Series};

/// Per-column `ln(p_t / p_{t-1})`. Row 0 and any row touching a missing
/// price are missing.
#[must_use]
pub fn log_returns(prices: &PriceTable) -> LogReturnTable {
    let frame = prices.frame().map_columns(|column| {
        let mut out = Vec::with_capacity(column.len());
        if !column.is_empty() {
            out.push(None);
        }
        out.extend(column.windows(2).map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => Some((curr / prev).ln()),
            _ => None,
        }));
        out
    });
    LogReturnTable::from_frame(frame)
}

/// Rolling sample standard deviation of each column; the first `window - 1`
/// rows are missing.
#[must_use]
pub fn rolling_vol(logret: &LogReturnTable, window: usize) -> Frame {
    logret
        .frame()
        .map_columns(|column| stats::rolling_std(column, window))
}

/// Equal-weight basket return: per-bar mean of the named columns, skipping
/// members with a missing return on that bar.
///
/// # Errors
/// Returns `MissingColumns` if any ticker is absent from `logret`.
pub fn basket_return<S: AsRef<str>>(logret: &LogReturnTable, tickers: &[S]) -> Result<Series> {
    logret.require(tickers)?;

    let columns: Vec<&[Option<f64>]> = tickers
        .iter()
        .filter_map(|t| logret.column(t.as_ref()))
        .collect();

    let values = (0..logret.len())
        .map(|row| stats::nan_mean(columns.iter().map(|c| &c[row])))
        .collect();

    Ok(Series::from_parts(logret.index().to_vec(), values))
}

/// Sample standard deviation of the whole basket return series.
#[must_use]
pub fn basket_vol(basket_ret: &Series) -> Option<f64> {
    stats::nan_std(basket_ret.values())
}

/// Rolling Pearson correlation between two columns over `window` bars.
///
/// # Errors
/// Returns `MissingColumns` if `a` or `b` is absent.
pub fn rolling_corr(logret: &LogReturnTable, a: &str, b: &str, window: usize) -> Result<Series> {
    rolling_corr_min_periods(logret, a, b, window, window)
}

/// Rolling correlation defined once `min_periods` pairwise-complete
/// observations fall inside the window.
///
/// # Errors
/// Returns `MissingColumns` if `a` or `b` is absent.
pub fn rolling_corr_min_periods(
    logret: &LogReturnTable,
    a: &str,
    b: &str,
    window: usize,
    min_periods: usize,
) -> Result<Series> {
    let (Some(xa), Some(xb)) = (logret.column(a), logret.column(b)) else {
        return Err(AnalyticsError::missing_columns(
            [a, b].into_iter().filter(|s| !logret.has_column(s)),
        ));
    };
    Ok(Series::from_parts(
        logret.index().to_vec(),
        stats::rolling_corr(xa, xb, window, min_periods),
    ))
}

/// Latest rolling correlation, `None` if the table is empty or the last
/// window is incomplete.
///
/// # Errors
/// Returns `MissingColumns` if `a` or `b` is absent.
pub fn pair_corr_latest(
    logret: &LogReturnTable,
    a: &str,
    b: &str,
    window: usize,
) -> Result<Option<f64>> {
    Ok(rolling_corr(logret, a, b, window)?.latest())
}

/// Sum of absolute log returns per ticker over the last `lookback` bars,
/// largest first. Ties keep ticker order.
///
/// # Errors
/// Returns `MissingColumns` if any ticker is absent.
pub fn abs_return_ranking<S: AsRef<str>>(
    logret: &LogReturnTable,
    tickers: &[S],
    lookback: usize,
) -> Result<Vec<(String, f64)>> {
    logret.require(tickers)?;
    let recent = logret.tail(lookback);
    if recent.is_empty() {
        return Ok(Vec::new());
    }

    let mut ranked: Vec<(String, f64)> = tickers
        .iter()
        .map(|t| {
            let total = recent
                .column(t.as_ref())
                .map_or(0.0, |c| c.iter().flatten().map(|r| r.abs()).sum());
            (t.as_ref().to_string(), total)
        })
        .collect();
    ranked.sort_by(|x, y| y.1.total_cmp(&x.1));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use stat_arb_core::Timestamp;

    fn hours(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    fn table(columns: &[(&str, &[f64])]) -> PriceTable {
        let n = columns.first().map_or(0, |c| c.1.len());
        PriceTable::new(
            hours(n),
            columns
                .iter()
                .map(|(name, v)| (name.to_string(), v.iter().copied().map(Some).collect()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn log_returns_first_row_undefined() {
        let prices = table(&[("A", &[100.0, 110.0, 99.0]), ("B", &[1.0, 1.0, 2.0])]);
        let logret = log_returns(&prices);
        for symbol in ["A", "B"] {
            assert_eq!(logret.column(symbol).unwrap()[0], None);
        }
        let b = logret.column("B").unwrap();
        assert_eq!(b[1], Some(0.0));
        assert!((b[2].unwrap() - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_returns_round_trip_reconstructs_prices() {
        let raw = [100.0, 101.5, 99.25, 104.0, 103.1, 107.9];
        let prices = table(&[("A", &raw)]);
        let logret = log_returns(&prices);
        let mut level = raw[0];
        for (i, r) in logret.column("A").unwrap().iter().enumerate().skip(1) {
            level *= r.unwrap().exp();
            assert!((level - raw[i]).abs() < 1e-9, "row {i}: {level} vs {}", raw[i]);
        }
    }

    #[test]
    fn log_returns_missing_price_propagates() {
        let prices = PriceTable::new(
            hours(4),
            vec![("A".to_string(), vec![Some(1.0), None, Some(2.0), Some(4.0)])],
        )
        .unwrap();
        let logret = log_returns(&prices);
        let a = logret.column("A").unwrap();
        assert_eq!(&a[..3], &[None, None, None]);
        assert!((a[3].unwrap() - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_returns_on_empty_table() {
        let logret = log_returns(&PriceTable::empty());
        assert_eq!(logret.len(), 0);
    }

    #[test]
    fn rolling_vol_warms_up() {
        let prices = table(&[("A", &[1.0, 2.0, 1.0, 2.0, 1.0])]);
        let vol = rolling_vol(&log_returns(&prices), 3);
        let a = vol.column("A").unwrap();
        // Row 0 return is missing, so the first full window ends at row 3.
        assert_eq!(&a[..3], &[None, None, None]);
        assert!(a[3].is_some());
    }

    #[test]
    fn basket_return_rejects_missing_tickers() {
        let prices = table(&[("A", &[1.0, 2.0]), ("B", &[1.0, 2.0])]);
        let logret = log_returns(&prices);
        let err = basket_return(&logret, &["A", "Z"]).unwrap_err();
        assert_eq!(err, AnalyticsError::missing_columns(["Z"]));
    }

    #[test]
    fn basket_return_two_members_is_mean() {
        let prices = table(&[("A", &[1.0, 2.0]), ("B", &[1.0, 1.0])]);
        let logret = log_returns(&prices);
        let ret = basket_return(&logret, &["A", "B"]).unwrap();
        assert_eq!(ret.values()[0], None);
        assert!((ret.values()[1].unwrap() - 2.0_f64.ln() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn basket_vol_needs_two_defined_points() {
        let prices = table(&[("A", &[1.0, 2.0])]);
        let ret = basket_return(&log_returns(&prices), &["A"]).unwrap();
        assert_eq!(basket_vol(&ret), None);

        let prices = table(&[("A", &[1.0, 2.0, 1.0, 3.0])]);
        let ret = basket_return(&log_returns(&prices), &["A"]).unwrap();
        assert!(basket_vol(&ret).unwrap() > 0.0);
    }

    #[test]
    fn pair_corr_latest_of_identical_moves_is_one() {
        let prices = table(&[
            ("A", &[1.0, 2.0, 1.5, 3.0, 2.0]),
            ("B", &[10.0, 20.0, 15.0, 30.0, 20.0]),
        ]);
        let logret = log_returns(&prices);
        let corr = pair_corr_latest(&logret, "A", "B", 3).unwrap().unwrap();
        assert!((corr - 1.0).abs() < 1e-10);
    }

    #[test]
    fn pair_corr_latest_errors_on_missing_column() {
        let prices = table(&[("A", &[1.0, 2.0])]);
        let logret = log_returns(&prices);
        assert!(pair_corr_latest(&logret, "A", "B", 2).is_err());
        assert!(rolling_corr(&logret, "Z", "A", 2).is_err());
    }

    #[test]
    fn pair_corr_latest_empty_is_none() {
        let prices = PriceTable::new(
            Vec::new(),
            vec![("A".to_string(), Vec::new()), ("B".to_string(), Vec::new())],
        )
        .unwrap();
        let logret = log_returns(&prices);
        assert_eq!(pair_corr_latest(&logret, "A", "B", 5).unwrap(), None);
    }

    #[test]
    fn abs_return_ranking_orders_by_magnitude() {
        let prices = table(&[
            ("CALM", &[1.0, 1.01, 1.0]),
            ("WILD", &[1.0, 2.0, 1.0]),
            ("MID", &[1.0, 1.2, 1.0]),
        ]);
        let logret = log_returns(&prices);
        let ranked = abs_return_ranking(&logret, &["CALM", "WILD", "MID"], 24).unwrap();
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["WILD", "MID", "CALM"]);
    }
}
