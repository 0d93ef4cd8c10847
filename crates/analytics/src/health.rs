//! Data completeness diagnostics for a price table.

use serde::Serialize;
use stat_arb_core::{Frame, Timestamp};

/// How many symbols [`DataHealth::per_symbol_missing_top10`] keeps.
pub const TOP_MISSING: usize = 10;

/// Missing-value share of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMissing {
    pub symbol: String,
    pub missing_pct: f64,
}

/// Shape, coverage, and missingness of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataHealth {
    pub n_rows: usize,
    pub n_cols: usize,
    /// First index timestamp.
    pub start_ts: Option<Timestamp>,
    /// Last index timestamp.
    pub end_ts: Option<Timestamp>,
    /// Missing cells / total cells x 100.
    pub overall_missing_pct: f64,
    /// Worst columns by missing share, descending. Ties keep column order.
    pub per_symbol_missing_top10: Vec<SymbolMissing>,
}

impl DataHealth {
    /// Report for an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            n_rows: 0,
            n_cols: 0,
            start_ts: None,
            end_ts: None,
            overall_missing_pct: 0.0,
            per_symbol_missing_top10: Vec::new(),
        }
    }
}

/// Computes completeness diagnostics. Never fails; an empty table yields
/// [`DataHealth::empty`].
#[must_use]
pub fn data_health(frame: &Frame) -> DataHealth {
    if frame.is_empty() {
        return DataHealth::empty();
    }

    let n_rows = frame.len();
    let total_cells = n_rows * frame.n_cols();
    let pct = |missing: usize, total: usize| missing as f64 / total as f64 * 100.0;

    let mut per_symbol: Vec<SymbolMissing> = frame
        .columns()
        .map(|(symbol, values)| SymbolMissing {
            symbol: symbol.to_string(),
            missing_pct: pct(values.iter().filter(|v| v.is_none()).count(), n_rows),
        })
        .collect();
    per_symbol.sort_by(|x, y| y.missing_pct.total_cmp(&x.missing_pct));
    per_symbol.truncate(TOP_MISSING);

    DataHealth {
        n_rows,
        n_cols: frame.n_cols(),
        start_ts: frame.index().first().copied(),
        end_ts: frame.index().last().copied(),
        overall_missing_pct: pct(frame.count_missing(), total_cells),
        per_symbol_missing_top10: per_symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn hours(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn empty_table_reports_zeroes() {
        let health = data_health(&Frame::empty());
        assert_eq!(health.n_rows, 0);
        assert_eq!(health.n_cols, 0);
        assert_eq!(health.overall_missing_pct, 0.0);
        assert!(health.per_symbol_missing_top10.is_empty());
        assert_eq!(health.start_ts, None);
    }

    #[test]
    fn columns_without_rows_are_empty() {
        let frame = Frame::new(Vec::new(), vec![("A".to_string(), Vec::new())]).unwrap();
        assert_eq!(data_health(&frame), DataHealth::empty());
    }

    #[test]
    fn missing_percentages() {
        let index = hours(4);
        let frame = Frame::new(
            index.clone(),
            vec![
                ("FULL".to_string(), vec![Some(1.0); 4]),
                ("HALF".to_string(), vec![Some(1.0), None, None, Some(1.0)]),
                ("QUARTER".to_string(), vec![None, Some(1.0), Some(1.0), Some(1.0)]),
            ],
        )
        .unwrap();

        let health = data_health(&frame);
        assert_eq!(health.n_rows, 4);
        assert_eq!(health.n_cols, 3);
        assert_eq!(health.start_ts, Some(index[0]));
        assert_eq!(health.end_ts, Some(index[3]));
        assert!((health.overall_missing_pct - 25.0).abs() < 1e-12);

        let order: Vec<_> = health
            .per_symbol_missing_top10
            .iter()
            .map(|s| s.symbol.as_str())
            .collect();
        assert_eq!(order, vec!["HALF", "QUARTER", "FULL"]);
        assert!((health.per_symbol_missing_top10[0].missing_pct - 50.0).abs() < 1e-12);
    }

    #[test]
    fn keeps_only_ten_worst() {
        let columns = (0..15)
            .map(|i| {
                let values = (0..15).map(|row| (row >= i).then_some(1.0)).collect();
                (format!("S{i:02}"), values)
            })
            .collect();
        let frame = Frame::new(hours(15), columns).unwrap();
        let top = data_health(&frame).per_symbol_missing_top10;
        assert_eq!(top.len(), TOP_MISSING);
        assert_eq!(top[0].symbol, "S14");
        assert_eq!(top[9].symbol, "S05");
    }
}
