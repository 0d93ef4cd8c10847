//! Raw universe symbols to exchange market symbols.
//!
//! Universe files list symbols the way traders write them ("ETHUSD",
//! "BCHBTC"); price columns use unified market symbols ("ETH/USDT:USDT",
//! "BCH/BTC").

use stat_arb_core::{Basket, Universe};

/// Converts one raw symbol to its market symbol.
///
/// - already containing `/`: unchanged (after trim/uppercase)
/// - `*BTC` crosses: `BASE/BTC`
/// - `*USDT` and `*USD`: USDT-margined perpetual `BASE/USDT:USDT`
/// - anything else: unchanged
#[must_use]
pub fn to_exchange_symbol(raw: &str) -> String {
    let s = raw.trim().to_uppercase();
    if s.contains('/') {
        return s;
    }

    if s.len() > 3 {
        if let Some(base) = s.strip_suffix("BTC") {
            return format!("{base}/BTC");
        }
    }
    if let Some(base) = s.strip_suffix("USDT") {
        return format!("{base}/USDT:USDT");
    }
    if let Some(base) = s.strip_suffix("USD") {
        return format!("{base}/USDT:USDT");
    }
    s
}

/// Normalizes every symbol, preserving order.
#[must_use]
pub fn normalize_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    symbols
        .into_iter()
        .map(|s| to_exchange_symbol(s.as_ref()))
        .collect()
}

/// Basket with members rewritten to market symbols.
#[must_use]
pub fn resolve_basket(basket: &Basket) -> Basket {
    Basket::new(basket.name.clone(), normalize_symbols(&basket.members))
}

/// Every basket of `universe`, resolved.
#[must_use]
pub fn resolve_universe(universe: &Universe) -> Vec<Basket> {
    universe.baskets.iter().map(resolve_basket).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_and_usdt_map_to_perps() {
        assert_eq!(to_exchange_symbol("ETHUSD"), "ETH/USDT:USDT");
        assert_eq!(to_exchange_symbol("ethusdt"), "ETH/USDT:USDT");
        assert_eq!(to_exchange_symbol("1000PEPEUSD"), "1000PEPE/USDT:USDT");
        assert_eq!(to_exchange_symbol("BTCUSD"), "BTC/USDT:USDT");
    }

    #[test]
    fn test_btc_crosses() {
        assert_eq!(to_exchange_symbol("BCHBTC"), "BCH/BTC");
        // Bare "BTC" is not a cross.
        assert_eq!(to_exchange_symbol("BTC"), "BTC");
    }

    #[test]
    fn test_already_unified_passes_through() {
        assert_eq!(to_exchange_symbol(" arb/usdt "), "ARB/USDT");
        assert_eq!(to_exchange_symbol("ETH/USDT:USDT"), "ETH/USDT:USDT");
    }

    #[test]
    fn test_unknown_quote_unchanged() {
        assert_eq!(to_exchange_symbol("EURGBP"), "EURGBP");
        assert_eq!(to_exchange_symbol(""), "");
    }

    #[test]
    fn test_resolve_basket_keeps_name_and_order() {
        let basket = Basket::new("btc_core_and_forks", ["BTCUSD", "BCHUSD", "BCHBTC"]);
        let resolved = resolve_basket(&basket);
        assert_eq!(resolved.name, "btc_core_and_forks");
        assert_eq!(
            resolved.members,
            vec!["BTC/USDT:USDT", "BCH/USDT:USDT", "BCH/BTC"]
        );
    }

    #[test]
    fn test_resolve_default_universe() {
        let baskets = resolve_universe(&Universe::default());
        assert_eq!(baskets.len(), Universe::default().len());
        assert!(baskets
            .iter()
            .flat_map(|b| b.members.iter())
            .all(|m| m.contains('/')));
    }
}
