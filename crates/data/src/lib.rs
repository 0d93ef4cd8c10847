//! Price history input for the stat-arb analytics engine.
//!
//! This crate provides:
//! - CSV loading of close prices (long or wide layout) into a `PriceTable`
//! - Alignment, gap forward-filling, and display-window trimming
//! - Raw universe symbol to exchange market symbol normalization

pub mod csv_storage;
pub mod history;
pub mod symbols;

pub use csv_storage::{parse_timestamp, CsvPriceLoader, CsvPriceWriter};
pub use history::{align_closes, forward_fill, trim_history, PriceSnapshot, DEFAULT_FFILL_LIMIT};
pub use symbols::{normalize_symbols, resolve_basket, resolve_universe, to_exchange_symbol};
