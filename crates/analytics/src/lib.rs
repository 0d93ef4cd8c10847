//! Statistical-arbitrage analytics over a wide price table.
//!
//! Layers, leaves first:
//! - [`stats`]: windowed statistics over optional values
//! - [`returns`]: log returns, volatility, basket returns, correlation
//! - [`spread`]: pair spread, z-score, Bollinger bands, breach state
//! - [`pair_scanner`]: per-pair metric sets, filtering, and ranking
//! - [`basket_scanner`]: one ranked summary row per basket
//! - [`health`]: completeness diagnostics
//! - [`report`]: basket and pair drill-downs
//!
//! Everything here is a pure function of its inputs.

pub mod basket_scanner;
pub mod health;
pub mod pair_scanner;
pub mod report;
pub mod returns;
pub mod spread;
pub mod stats;

pub use basket_scanner::{scan_baskets, valid_tickers, BasketSummary};
pub use health::{data_health, DataHealth, SymbolMissing};
pub use pair_scanner::{
    basket_pairs, compute_pair_metrics, is_opportunity, rank_pairs, scan_pairs,
    scan_pairs_with_returns, FailureMode, PairFailure, PairFilter, PairMetrics, PairOutcome,
    PairRow, PairScan, PairSort,
};
pub use report::{
    available_pairs, basket_detail, pair_detail, BasketDetail, MemberStats, PairBar, PairDetail,
};
pub use returns::{
    basket_return, basket_vol, log_returns, pair_corr_latest, rolling_corr, rolling_vol,
};
pub use spread::{
    bars_since_breach, bollinger_bands, detect_breaches, latest_boll_breach, spread_series,
    spread_vol, zscore, BollingerBands,
};
