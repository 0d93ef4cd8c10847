//! Lists configured baskets and which members the price history covers.

use super::{print_banner, print_json, CommonArgs, OutputFormat};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use stat_arb_analytics::valid_tickers;
use stat_arb_core::{Basket, PriceTable};

/// Arguments for the baskets command.
#[derive(Args, Debug, Clone)]
pub struct BasketsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Coverage of one basket by the loaded prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct BasketListing {
    name: String,
    usable: Vec<String>,
    missing: Vec<String>,
}

impl BasketListing {
    fn new(prices: &PriceTable, basket: &Basket) -> Self {
        let usable = valid_tickers(prices, basket);
        let missing = basket
            .members
            .iter()
            .filter(|m| !usable.contains(m))
            .cloned()
            .collect();
        Self {
            name: basket.name.clone(),
            usable,
            missing,
        }
    }
}

/// Runs the baskets command.
///
/// # Errors
/// Returns an error if the session cannot be loaded.
pub fn run_baskets(args: BasketsArgs) -> Result<()> {
    let session = args.common.load_session()?;
    let listings: Vec<BasketListing> = session
        .baskets
        .iter()
        .map(|b| BasketListing::new(session.prices(), b))
        .collect();

    match session.format {
        OutputFormat::Json => print_json(&listings),
        OutputFormat::Text => {
            print_listings(&listings);
            Ok(())
        }
    }
}

fn print_listings(listings: &[BasketListing]) {
    print_banner("BASKETS", 100);
    for listing in listings {
        println!(
            "{:<30} {} usable: {}",
            listing.name,
            listing.usable.len(),
            listing.usable.join(", ")
        );
        if !listing.missing.is_empty() {
            println!("{:<30} [!!] no prices: {}", "", listing.missing.join(", "));
        }
    }
    println!("{}", "=".repeat(100));
    println!();
}
