//! Strongly-typed columnar tables keyed by timestamp.
//!
//! A [`Frame`] is an ordered, strictly-increasing timestamp index plus a set
//! of uniquely named columns of equal length. Cells are `Option<f64>`, with
//! `None` standing for a missing observation. [`PriceTable`] and
//! [`LogReturnTable`] wrap a frame and add their own invariants.

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Deref;

/// Timestamp type used for every index.
pub type Timestamp = DateTime<Utc>;

/// A single timestamp-indexed sequence of optional values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    index: Vec<Timestamp>,
    values: Vec<Option<f64>>,
}

impl Series {
    /// Creates a series from an index and values of the same length.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if the lengths differ.
    pub fn new(index: Vec<Timestamp>, values: Vec<Option<f64>>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(AnalyticsError::LengthMismatch {
                column: "series".to_string(),
                expected: index.len(),
                actual: values.len(),
            });
        }
        Ok(Self { index, values })
    }

    /// Builds a series that reuses `index` for a freshly computed value vector.
    ///
    /// Callers guarantee equal lengths; this is used by transforms that map
    /// one value per input row.
    #[must_use]
    pub fn from_parts(index: Vec<Timestamp>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    /// Creates an empty series.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the last bar, `None` if the series is empty or the last value is missing.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    /// Keeps the last `n` bars.
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self::from_parts(self.index[start..].to_vec(), self.values[start..].to_vec())
    }

    /// Keeps the bars at or after `since`.
    #[must_use]
    pub fn since(&self, since: Timestamp) -> Self {
        let start = self.index.partition_point(|ts| *ts < since);
        Self::from_parts(self.index[start..].to_vec(), self.values[start..].to_vec())
    }

    /// Number of defined (non-missing) values.
    #[must_use]
    pub fn count_defined(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Timestamp-indexed table of named, equal-length columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Vec<Timestamp>,
    symbols: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    positions: HashMap<String, usize>,
}

impl Frame {
    /// Creates a frame, validating index order, column uniqueness, and lengths.
    ///
    /// # Errors
    /// - `UnsortedIndex` if timestamps are not strictly increasing
    /// - `DuplicateColumn` if a column name repeats
    /// - `LengthMismatch` if any column length differs from the index
    pub fn new(index: Vec<Timestamp>, columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        if let Some(position) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(AnalyticsError::UnsortedIndex {
                position: position + 1,
            });
        }

        let mut symbols = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut positions = HashMap::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != index.len() {
                return Err(AnalyticsError::LengthMismatch {
                    column: name,
                    expected: index.len(),
                    actual: column.len(),
                });
            }
            if positions.insert(name.clone(), symbols.len()).is_some() {
                return Err(AnalyticsError::DuplicateColumn { column: name });
            }
            symbols.push(name);
            values.push(column);
        }

        Ok(Self {
            index,
            symbols,
            columns: values,
            positions,
        })
    }

    /// Creates a frame with no rows and no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            symbols: Vec::new(),
            columns: Vec::new(),
            positions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// Column names in insertion order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when the frame has no rows or no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.symbols.is_empty()
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn has_column(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    #[must_use]
    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.positions
            .get(symbol)
            .map(|&pos| self.columns[pos].as_slice())
    }

    /// Iterates `(name, values)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.symbols
            .iter()
            .zip(self.columns.iter())
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns one column as a [`Series`] sharing this frame's index.
    #[must_use]
    pub fn series(&self, symbol: &str) -> Option<Series> {
        self.column(symbol)
            .map(|values| Series::from_parts(self.index.clone(), values.to_vec()))
    }

    /// Fails with `MissingColumns` naming every requested column that is absent.
    ///
    /// # Errors
    /// Returns `MissingColumns` if at least one name is not a column.
    pub fn require<S: AsRef<str>>(&self, symbols: &[S]) -> Result<()> {
        let missing: Vec<String> = symbols
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| !self.has_column(s))
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyticsError::MissingColumns { columns: missing })
        }
    }

    /// Returns a frame holding only the named columns, in the requested order.
    ///
    /// # Errors
    /// Returns `MissingColumns` if any name is absent.
    pub fn select<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Self> {
        self.require(symbols)?;
        let columns = symbols
            .iter()
            .map(|s| {
                let name = s.as_ref();
                let values = self.column(name).map(<[_]>::to_vec).unwrap_or_default();
                (name.to_string(), values)
            })
            .collect();
        Self::new(self.index.clone(), columns)
    }

    /// Keeps rows `[start, len)`.
    fn rows_from(&self, start: usize) -> Self {
        let start = start.min(self.len());
        Self {
            index: self.index[start..].to_vec(),
            symbols: self.symbols.clone(),
            columns: self.columns.iter().map(|c| c[start..].to_vec()).collect(),
            positions: self.positions.clone(),
        }
    }

    /// Keeps the last `n` rows.
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        self.rows_from(self.len().saturating_sub(n))
    }

    /// Keeps rows with timestamp at or after `since`.
    #[must_use]
    pub fn since(&self, since: Timestamp) -> Self {
        self.rows_from(self.index.partition_point(|ts| *ts < since))
    }

    /// Total number of missing cells.
    #[must_use]
    pub fn count_missing(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    /// Rebuilds the frame with every column passed through `f`.
    #[must_use]
    pub fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        Self {
            index: self.index.clone(),
            symbols: self.symbols.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| {
                    let mapped = f(c);
                    debug_assert_eq!(mapped.len(), c.len());
                    mapped
                })
                .collect(),
            positions: self.positions.clone(),
        }
    }
}

/// Close prices: a frame whose defined cells are finite and strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable(Frame);

impl PriceTable {
    /// Creates a price table from raw parts.
    ///
    /// # Errors
    /// Returns any frame construction error, or `InvalidPrice` for a
    /// non-finite or non-positive cell.
    pub fn new(index: Vec<Timestamp>, columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        Self::from_frame(Frame::new(index, columns)?)
    }

    /// Wraps an existing frame after checking every defined cell.
    ///
    /// # Errors
    /// Returns `InvalidPrice` for the first non-finite or non-positive cell.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        for (name, values) in frame.columns() {
            for (row, value) in values.iter().enumerate() {
                if let Some(v) = *value {
                    if !v.is_finite() || v <= 0.0 {
                        return Err(AnalyticsError::InvalidPrice {
                            column: name.to_string(),
                            row,
                            value: v,
                        });
                    }
                }
            }
        }
        Ok(Self(frame))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Frame::empty())
    }

    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.0
    }

    /// Keeps the last `n` rows.
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        Self(self.0.tail(n))
    }

    /// Keeps rows at or after `since`.
    #[must_use]
    pub fn since(&self, since: Timestamp) -> Self {
        Self(self.0.since(since))
    }

    /// Restricts the table to the named columns.
    ///
    /// # Errors
    /// Returns `MissingColumns` if any name is absent.
    pub fn select<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Self> {
        Ok(Self(self.0.select(symbols)?))
    }
}

impl Deref for PriceTable {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.0
    }
}

/// Log returns derived from a [`PriceTable`]; same shape, first row missing.
#[derive(Debug, Clone, PartialEq)]
pub struct LogReturnTable(Frame);

impl LogReturnTable {
    /// Wraps a frame of already-computed log returns.
    #[must_use]
    pub fn from_frame(frame: Frame) -> Self {
        Self(frame)
    }

    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.0
    }

    /// Keeps the last `n` rows.
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        Self(self.0.tail(n))
    }
}

impl Deref for LogReturnTable {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.0
    }
}
