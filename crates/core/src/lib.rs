//! Core types for basket statistical-arbitrage analytics.
//!
//! This crate provides:
//! - The timestamp-indexed table model ([`PriceTable`], [`LogReturnTable`], [`Series`])
//! - The error taxonomy shared by the analytics primitives
//! - Settings, the basket universe, and the figment-based config loader

pub mod config;
pub mod config_loader;
pub mod error;
pub mod table;
pub mod universe;

pub use config::{Settings, Timeframe};
pub use config_loader::ConfigLoader;
pub use error::{AnalyticsError, Result};
pub use table::{Frame, LogReturnTable, PriceTable, Series, Timestamp};
pub use universe::{Basket, Universe};
