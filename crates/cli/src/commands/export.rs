//! Export CLI command: writes the loaded price history as wide CSV.
//!
//! The output is what the session analyses (aligned, gap-filled, cut to
//! `history_days_fetch`), so it can be fed back through `--prices`.

use super::{CommonArgs, Session};
use anyhow::{bail, Result};
use clap::Args;
use stat_arb_analytics::valid_tickers;
use stat_arb_core::PriceTable;
use stat_arb_data::CsvPriceWriter;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the export command.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Destination CSV file
    #[arg(long)]
    pub output: PathBuf,

    /// Only export the usable members of this basket
    #[arg(long)]
    pub basket: Option<String>,

    /// Only export the display window
    #[arg(long)]
    pub display_only: bool,
}

/// Runs the export command.
///
/// # Errors
/// Returns an error if the session cannot be loaded, the basket is unknown
/// or has no prices, or the file cannot be written.
pub fn run_export(args: ExportArgs) -> Result<()> {
    let session = args.common.load_session()?;
    let prices = export_table(&session, args.basket.as_deref(), args.display_only)?;

    CsvPriceWriter::write_wide(&args.output, &prices)?;
    info!(
        path = %args.output.display(),
        rows = prices.len(),
        symbols = prices.n_cols(),
        "Exported price history"
    );
    Ok(())
}

fn export_table(session: &Session, basket: Option<&str>, display_only: bool) -> Result<PriceTable> {
    let source = if display_only {
        &session.snapshot.display
    } else {
        session.prices()
    };

    let Some(name) = basket else {
        return Ok(source.clone());
    };
    let basket = session.basket(name)?;
    let tickers = valid_tickers(source, basket);
    if tickers.is_empty() {
        bail!("Basket '{}' has no members with prices", basket.name);
    }
    Ok(source.select(&tickers)?)
}
