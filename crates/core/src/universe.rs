//! Trading universe: named baskets of correlated instruments.
//!
//! Members are raw symbols ("ETHUSD", "BCHBTC", "ARB/USDT"). They must be
//! normalized by the price provider before they can match table columns.

use serde::{Deserialize, Serialize};

/// A named set of instruments analyzed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub name: String,
    pub members: Vec<String>,
}

impl Basket {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered list of baskets. Order is preserved into scan output ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    pub baskets: Vec<Basket>,
}

impl Universe {
    #[must_use]
    pub fn new(baskets: Vec<Basket>) -> Self {
        Self { baskets }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Basket> {
        self.baskets.iter().find(|b| b.name == name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.baskets.iter().map(|b| b.name.as_str()).collect()
    }

    /// Every distinct raw symbol across all baskets, in first-seen order.
    #[must_use]
    pub fn all_symbols(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.baskets
            .iter()
            .flat_map(|b| b.members.iter())
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.baskets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.baskets.is_empty()
    }
}

impl Default for Universe {
    fn default() -> Self {
        let b = |name: &str, members: &[&str]| Basket::new(name, members.iter().copied());
        Self::new(vec![
            // EVM / Ethereum family
            b("eth_l1_core", &["ETHUSD", "ETCUSD", "BTCUSD"]),
            b("eth_l2_scaling", &["ARBUSD", "OPUSD", "LRCUSD", "IMXUSD", "BTCUSD"]),
            // DeFi protocol design
            b("amm_dex_core", &["UNIUSD", "SUSHIUSD", "CRVUSD", "ZRXUSD", "BTCUSD"]),
            b(
                "defi_core_governance",
                &["AAVEUSD", "MKRUSD", "LDOUSD", "YFIUSD", "LINAUSD", "BTCUSD"],
            ),
            b(
                "perps_derivatives",
                &["DYDXUSD", "GMXUSD", "HYPEUSD", "INJUSD", "BTCUSD"],
            ),
            // Data infra
            b("oracles", &["LINKUSD", "BANDUSD", "PYTHUSD", "BTCUSD"]),
            b("web3_infra_services", &["ANKRUSD", "BICOUSD", "CVCUSD", "BTCUSD"]),
            b("content_social_attention", &["BATUSD", "MASKUSD", "COSUSD", "BTCUSD"]),
            // Gaming / NFT / metaverse
            b("gaming_tokens", &["AXSUSD", "GALAUSD", "ENJUSD", "BTCUSD"]),
            b(
                "nft_metaverse_communities",
                &["APEUSD", "MAGICUSD", "AGLDUSD", "PENGUUSD", "BTCUSD"],
            ),
            // Memes
            b(
                "solana_memes",
                &["1000BONKUSD", "WIFUSD", "POPCATUSD", "MELANIAUSD", "ACTUSD", "BTCUSD"],
            ),
            b("dog_memes_large", &["DOGEUSD", "1000SHIBUSD", "1000FLOKIUSD", "BTCUSD"]),
            b(
                "misc_memes",
                &["1000PEPEUSD", "1000CHEEMSUSD", "BRETTUSD", "MEMEUSD", "BTCUSD"],
            ),
            b("fan_tokens", &["CHZUSD", "ASRUSD", "BTCUSD"]),
            // Bitcoin ecosystem
            b("btc_core_and_forks", &["BTCUSD", "BCHUSD", "BSVUSD", "BCHBTC"]),
            b("btc_adjacent_protocols", &["STXUSD", "ORDIUSD", "BTCUSD"]),
            b("utxo_payments_privacy", &["LTCUSD", "DASHUSD", "ZECUSD", "BTCUSD"]),
            // Interop / modular
            b("interop_modular", &["ATOMUSD", "DOTUSD", "TIAUSD", "QNTUSD", "BTCUSD"]),
            b("cosmos_ecosystem_builders", &["SEIUSD", "AKTUSD", "RUNEUSD", "BTCUSD"]),
            // L1 style
            b("evm_compatible_l1s", &["BNBUSD", "AVAXUSD", "FTMUSD", "BTCUSD"]),
            b("new_gen_l1s", &["SOLUSD", "SUIUSD", "APTUSD", "BTCUSD"]),
            b("legacy_alt_l1s", &["ADAUSD", "ALGOUSD", "XTZUSD", "BTCUSD"]),
            b("enterprise_dlt_supplychain", &["HBARUSD", "VETUSD", "BTCUSD"]),
            b("neo_ecosystem", &["NEOUSD", "GASUSD", "FLMUSD", "BTCUSD"]),
            b("other_l1s_mixed", &["NEARUSD", "EGLDUSD", "ICPUSD", "BTCUSD"]),
            b("pow_alt_l1s", &["KASUSD", "CFXUSD", "BTCUSD"]),
            // Payments
            b("payments_remittance", &["XRPUSD", "XLMUSD", "BTCUSD"]),
            // Compute / storage
            b("compute_ai_infra", &["FETUSD", "TAOUSD", "RENDERUSD", "BTCUSD"]),
            b("decentralized_storage", &["FILUSD", "RENDERUSD", "BTCUSD"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_universe_has_every_basket() {
        let universe = Universe::default();
        assert_eq!(universe.len(), 29);
        assert!(universe.get("eth_l1_core").is_some());
        assert!(universe.get("nonexistent").is_none());
    }

    #[test]
    fn all_symbols_deduplicates_in_order() {
        let universe = Universe::new(vec![
            Basket::new("a", ["X", "BTC"]),
            Basket::new("b", ["Y", "BTC", "X"]),
        ]);
        assert_eq!(universe.all_symbols(), vec!["X", "BTC", "Y"]);
    }

    #[test]
    fn universe_round_trips_through_json() {
        let universe = Universe::new(vec![Basket::new("fan_tokens", ["CHZUSD", "ASRUSD"])]);
        let json = serde_json::to_string(&universe).unwrap();
        let back: Universe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, universe);
    }
}
