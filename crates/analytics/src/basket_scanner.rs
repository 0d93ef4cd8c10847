//! Basket scanner: one ranked summary row per configured basket.

use crate::pair_scanner::scan_pairs_with_returns;
use crate::returns::{abs_return_ranking, basket_return, log_returns};
use crate::stats;
use serde::Serialize;
use stat_arb_core::{Basket, LogReturnTable, PriceTable, Settings};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Number of tickers listed in [`BasketSummary::top_movers`].
pub const TOP_MOVERS: usize = 3;

/// Summary metrics for one basket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasketSummary {
    pub basket: String,
    /// Members present as price columns.
    pub n_tickers: usize,
    /// Std of the equal-weight basket return over the analytics window.
    pub basket_vol: Option<f64>,
    /// Pairs currently classified as opportunities.
    pub opp_count: usize,
    /// Largest recent absolute movers, comma separated.
    pub top_movers: String,
}

impl BasketSummary {
    fn too_small(basket: &str, n_tickers: usize) -> Self {
        Self {
            basket: basket.to_string(),
            n_tickers,
            basket_vol: None,
            opp_count: 0,
            top_movers: String::new(),
        }
    }
}

/// Members of `basket` that exist as columns, in basket order, without repeats.
#[must_use]
pub fn valid_tickers(prices: &PriceTable, basket: &Basket) -> Vec<String> {
    let mut valid: Vec<String> = Vec::with_capacity(basket.members.len());
    for member in &basket.members {
        if prices.has_column(member) && !valid.contains(member) {
            valid.push(member.clone());
        }
    }
    valid
}

/// Sample std of the basket return over the last `window` bars, or over all
/// bars when fewer exist. `None` with one bar or less.
#[must_use]
pub fn windowed_basket_vol(logret: &LogReturnTable, tickers: &[String], window: usize) -> Option<f64> {
    let returns = match basket_return(logret, tickers) {
        Ok(returns) => returns,
        Err(e) => {
            warn!(error = %e, "Basket return failed");
            return None;
        }
    };
    if returns.len() <= 1 {
        return None;
    }
    stats::nan_std(returns.tail(window).values())
}

/// Top movers over the last `lookback` bars, joined with ", ".
#[must_use]
pub fn top_movers(logret: &LogReturnTable, tickers: &[String], lookback: usize) -> String {
    match abs_return_ranking(logret, tickers, lookback) {
        Ok(ranked) => ranked
            .into_iter()
            .take(TOP_MOVERS)
            .map(|(ticker, _)| ticker)
            .collect::<Vec<_>>()
            .join(", "),
        Err(e) => {
            warn!(error = %e, "Top movers failed");
            String::new()
        }
    }
}

/// Summarizes one basket. Baskets with fewer than two usable members get
/// the empty row.
#[must_use]
pub fn summarize_basket(
    prices: &PriceTable,
    logret: &LogReturnTable,
    basket: &Basket,
    settings: &Settings,
) -> BasketSummary {
    let tickers = valid_tickers(prices, basket);
    if tickers.len() < 2 {
        debug!(
            basket = %basket.name,
            usable = tickers.len(),
            "Basket has fewer than two usable members"
        );
        return BasketSummary::too_small(&basket.name, tickers.len());
    }

    let basket_vol = windowed_basket_vol(logret, &tickers, settings.analytics_window);

    let opp_count = if prices.len() >= settings.z_window {
        scan_pairs_with_returns(prices, logret, &tickers, settings).opportunity_count()
    } else {
        0
    };

    BasketSummary {
        basket: basket.name.clone(),
        n_tickers: tickers.len(),
        basket_vol,
        opp_count,
        top_movers: top_movers(logret, &tickers, settings.lookback_bars),
    }
}

/// Scans every basket and ranks by volatility descending, then opportunity
/// count descending. Undefined volatility always sorts last.
///
/// Basket members must already be normalized to price column names.
#[must_use]
pub fn scan_baskets(prices: &PriceTable, baskets: &[Basket], settings: &Settings) -> Vec<BasketSummary> {
    let logret = log_returns(prices);
    let mut rows: Vec<BasketSummary> = baskets
        .iter()
        .map(|basket| summarize_basket(prices, &logret, basket, settings))
        .collect();
    rank_baskets(&mut rows);

    debug!(
        baskets = rows.len(),
        opportunities = rows.iter().map(|r| r.opp_count).sum::<usize>(),
        "Basket scan complete"
    );
    rows
}

/// Stable sort by volatility desc (undefined last), then opportunity count desc.
pub fn rank_baskets(rows: &mut [BasketSummary]) {
    rows.sort_by(|x, y| {
        let by_vol = match (x.basket_vol, y.basket_vol) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_vol.then_with(|| y.opp_count.cmp(&x.opp_count))
    });
}
