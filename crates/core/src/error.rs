//! Error types for the analytics engine.
//!
//! Only hard input failures live here. Insufficient data is never an error:
//! rolling statistics report it as an undefined (`None`) value instead.

use thiserror::Error;

/// Errors raised by table construction and column-addressed primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// Requested columns are absent from the supplied table.
    #[error("missing columns: {}", columns.join(", "))]
    MissingColumns {
        /// The column names that were not found.
        columns: Vec<String>,
    },

    /// A column's length differs from the index length.
    #[error("column {column} has {actual} values, index has {expected}")]
    LengthMismatch {
        /// Offending column.
        column: String,
        /// Index length.
        expected: usize,
        /// Column length.
        actual: usize,
    },

    /// Index is not strictly increasing.
    #[error("index not strictly increasing at position {position}")]
    UnsortedIndex {
        /// First position that is not greater than its predecessor.
        position: usize,
    },

    /// The same column name appears twice.
    #[error("duplicate column: {column}")]
    DuplicateColumn {
        /// The repeated column name.
        column: String,
    },

    /// A price cell is non-finite or not strictly positive.
    #[error("invalid price {value} in column {column} at row {row}")]
    InvalidPrice {
        /// Column holding the bad cell.
        column: String,
        /// Row position of the bad cell.
        row: usize,
        /// The rejected value.
        value: f64,
    },

    /// A parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalyticsError {
    /// Creates a missing-columns error from any list of names.
    pub fn missing_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingColumns {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an invalid-parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Returns true if the error is caused by misconfigured column names.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::MissingColumns { .. })
    }
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
