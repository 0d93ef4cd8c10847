//! Shaping raw close histories into a price table.

use anyhow::Result;
use chrono::Duration;
use stat_arb_core::{Frame, PriceTable, Settings, Timestamp};
use std::collections::BTreeMap;

/// Longest run of missing bars bridged by [`forward_fill`] when loading.
pub const DEFAULT_FFILL_LIMIT: usize = 3;

/// Outer-joins per-symbol close histories on timestamp.
///
/// Every timestamp seen becomes a row, sorted ascending, even when its close
/// is missing. A repeated timestamp within one symbol keeps the last close
/// seen. Symbols keep their input order.
///
/// # Errors
/// Returns an error if two histories share a symbol name.
pub fn align_closes(histories: Vec<(String, Vec<(Timestamp, Option<f64>)>)>) -> Result<Frame> {
    let maps: Vec<(String, BTreeMap<Timestamp, Option<f64>>)> = histories
        .into_iter()
        .map(|(symbol, closes)| (symbol, closes.into_iter().collect()))
        .collect();

    let mut index: Vec<Timestamp> = maps.iter().flat_map(|(_, m)| m.keys().copied()).collect();
    index.sort_unstable();
    index.dedup();

    let columns = maps
        .into_iter()
        .map(|(symbol, closes)| {
            let values = index.iter().map(|ts| closes.get(ts).copied().flatten()).collect();
            (symbol, values)
        })
        .collect();

    Ok(Frame::new(index, columns)?)
}

/// Carries the last observed value forward over at most `limit` consecutive
/// missing bars. Longer gaps stay missing past the limit.
#[must_use]
pub fn forward_fill(frame: &Frame, limit: usize) -> Frame {
    frame.map_columns(|column| {
        let mut last = None;
        let mut run = 0;
        column
            .iter()
            .map(|value| match value {
                Some(v) => {
                    last = Some(*v);
                    run = 0;
                    Some(*v)
                }
                None => {
                    run += 1;
                    if run <= limit {
                        last
                    } else {
                        None
                    }
                }
            })
            .collect()
    })
}

/// Keeps the rows within `days` of the last timestamp, inclusive.
#[must_use]
pub fn trim_history(prices: &PriceTable, days: u32) -> PriceTable {
    match prices.index().last() {
        Some(end) => prices.since(*end - Duration::days(i64::from(days))),
        None => prices.clone(),
    }
}

/// A loaded price history with its display-window view.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    /// Everything loaded; rolling computations run over this.
    pub full: PriceTable,
    /// The last `history_days_display` days, for presentation.
    pub display: PriceTable,
    /// When the history was fetched; staleness is measured from here.
    pub loaded_at: Timestamp,
}

impl PriceSnapshot {
    #[must_use]
    pub fn new(full: PriceTable, settings: &Settings, loaded_at: Timestamp) -> Self {
        let display = trim_history(&full, settings.history_days_display);
        Self {
            full,
            display,
            loaded_at,
        }
    }

    /// Time elapsed since the history was fetched.
    #[must_use]
    pub fn age(&self, now: Timestamp) -> Duration {
        now - self.loaded_at
    }

    /// True once the snapshot is older than `ttl_seconds` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: Timestamp, ttl_seconds: u64) -> bool {
        let ttl = Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX / 1_000));
        self.age(now) > ttl
    }

    /// First timestamp of the display window.
    #[must_use]
    pub fn display_start(&self) -> Option<Timestamp> {
        self.display.index().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn hour(h: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    #[test]
    fn test_align_closes_outer_joins() {
        let frame = align_closes(vec![
            ("A".to_string(), vec![(hour(2), Some(3.0)), (hour(0), Some(1.0))]),
            ("B".to_string(), vec![(hour(1), Some(10.0)), (hour(2), Some(11.0))]),
        ])
        .unwrap();

        assert_eq!(frame.index(), &[hour(0), hour(1), hour(2)]);
        assert_eq!(frame.column("A").unwrap(), &[Some(1.0), None, Some(3.0)]);
        assert_eq!(frame.column("B").unwrap(), &[None, Some(10.0), Some(11.0)]);
    }

    #[test]
    fn test_align_closes_last_duplicate_wins() {
        let frame = align_closes(vec![(
            "A".to_string(),
            vec![(hour(0), Some(1.0)), (hour(0), Some(2.0))],
        )])
        .unwrap();
        assert_eq!(frame.column("A").unwrap(), &[Some(2.0)]);
    }

    #[test]
    fn test_align_closes_keeps_rows_without_closes() {
        let frame = align_closes(vec![(
            "A".to_string(),
            vec![(hour(0), Some(1.0)), (hour(1), None)],
        )])
        .unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column("A").unwrap(), &[Some(1.0), None]);
    }

    #[test]
    fn test_align_closes_rejects_duplicate_symbol() {
        let result = align_closes(vec![
            ("A".to_string(), vec![(hour(0), Some(1.0))]),
            ("A".to_string(), vec![(hour(1), Some(1.0))]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_forward_fill_respects_limit() {
        let frame = Frame::new(
            (0..7).map(hour).collect(),
            vec![(
                "A".to_string(),
                vec![None, Some(1.0), None, None, None, None, Some(2.0)],
            )],
        )
        .unwrap();
        let filled = forward_fill(&frame, 3);
        assert_eq!(
            filled.column("A").unwrap(),
            &[None, Some(1.0), Some(1.0), Some(1.0), Some(1.0), None, Some(2.0)]
        );
    }

    #[test]
    fn test_trim_history_keeps_last_days() {
        let index: Vec<Timestamp> = (0..72).map(hour).collect();
        let prices = PriceTable::new(index, vec![("A".to_string(), vec![Some(1.0); 72])]).unwrap();
        let trimmed = trim_history(&prices, 1);
        // 24 hours back from hour 71 is hour 47, inclusive.
        assert_eq!(trimmed.len(), 25);
        assert_eq!(trimmed.index()[0], hour(47));

        assert_eq!(trim_history(&PriceTable::empty(), 3).len(), 0);
    }

    #[test]
    fn test_snapshot_staleness() {
        let prices = PriceTable::new(vec![hour(0)], vec![("A".to_string(), vec![Some(1.0)])]).unwrap();
        let snapshot = PriceSnapshot::new(prices, &Settings::default(), hour(0));
        assert!(!snapshot.is_stale(hour(0) + Duration::seconds(300), 300));
        assert!(snapshot.is_stale(hour(0) + Duration::seconds(301), 300));
        assert_eq!(snapshot.age(hour(1)), Duration::hours(1));
        assert_eq!(snapshot.display_start(), Some(hour(0)));
    }
}
