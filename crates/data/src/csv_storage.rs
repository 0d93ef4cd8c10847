use crate::history::{align_closes, forward_fill, DEFAULT_FFILL_LIMIT};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{Reader, ReaderBuilder, StringRecord, Writer};
use stat_arb_core::{PriceTable, Timestamp};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), or epoch milliseconds.
///
/// # Errors
/// Returns an error if none of the formats match.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Ok(ts);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(millis) = raw.parse::<i64>() {
        if let Some(ts) = DateTime::from_timestamp_millis(millis) {
            return Ok(ts);
        }
    }
    bail!("Unrecognized timestamp: '{raw}'")
}

/// Parses a close cell. Empty and `NaN` cells are missing.
fn parse_close(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .with_context(|| format!("Invalid close price: '{raw}'"))?;
    Ok(Some(value))
}

/// Loads close prices from CSV into a [`PriceTable`].
///
/// Two layouts are accepted:
/// - long: a header with `timestamp`, `symbol`, and `close` columns (extra
///   OHLCV columns are ignored)
/// - wide: `timestamp` first, then one close column per symbol
///
/// Rows are sorted, repeated timestamps keep the last close, and short gaps
/// are forward-filled.
pub struct CsvPriceLoader {
    ffill_limit: usize,
}

impl Default for CsvPriceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvPriceLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ffill_limit: DEFAULT_FFILL_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_ffill_limit(mut self, limit: usize) -> Self {
        self.ffill_limit = limit;
        self
    }

    /// Loads every symbol in the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or has an invalid layout.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<PriceTable> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open price file: {}", path.display()))?;
        let prices = self
            .from_reader(file)
            .with_context(|| format!("Failed to load prices from {}", path.display()))?;

        info!(
            path = %path.display(),
            rows = prices.len(),
            symbols = prices.n_cols(),
            "Loaded price history"
        );
        Ok(prices)
    }

    /// Loads only the requested symbols that the file contains.
    ///
    /// # Errors
    /// Returns an error if loading fails or none of `symbols` is present.
    pub fn load_symbols<S: AsRef<str>>(&self, path: impl AsRef<Path>, symbols: &[S]) -> Result<PriceTable> {
        let prices = self.load(path)?;

        let (present, missing): (Vec<&str>, Vec<&str>) = symbols
            .iter()
            .map(AsRef::as_ref)
            .partition(|s| prices.has_column(s));
        if present.is_empty() {
            bail!("No valid symbols found. Missing symbols: {}", missing.join(", "));
        }
        if !missing.is_empty() {
            warn!(missing = %missing.join(", "), "Symbols not present in price history");
        }

        let mut unique = Vec::with_capacity(present.len());
        for symbol in present {
            if !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }
        Ok(prices.select(&unique)?)
    }

    /// Parses CSV from any reader.
    ///
    /// # Errors
    /// Returns an error on malformed CSV, timestamps, or prices.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<PriceTable> {
        let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();

        let histories = match long_layout(&headers) {
            Some(columns) => read_long(&mut reader, columns)?,
            None => read_wide(&mut reader, &headers)?,
        };

        let frame = forward_fill(&align_closes(histories)?, self.ffill_limit);
        Ok(PriceTable::from_frame(frame)?)
    }
}

/// Column positions of a long-layout file.
#[derive(Clone, Copy)]
struct LongColumns {
    timestamp: usize,
    symbol: usize,
    close: usize,
}

fn long_layout(headers: &StringRecord) -> Option<LongColumns> {
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    Some(LongColumns {
        timestamp: find("timestamp")?,
        symbol: find("symbol")?,
        close: find("close")?,
    })
}

type Histories = Vec<(String, Vec<(Timestamp, Option<f64>)>)>;

/// Keeps a close only if it is a usable price; anything else reads as missing.
fn accept(symbol: &str, ts: Timestamp, close: Option<f64>, dropped: &mut usize) -> Option<f64> {
    match close {
        Some(v) if v.is_finite() && v > 0.0 => Some(v),
        Some(v) => {
            *dropped += 1;
            debug!(symbol, %ts, value = v, "Dropping unusable close");
            None
        }
        None => None,
    }
}

fn read_long<R: Read>(reader: &mut Reader<R>, columns: LongColumns) -> Result<Histories> {
    let mut order: Vec<String> = Vec::new();
    let mut closes: HashMap<String, Vec<(Timestamp, Option<f64>)>> = HashMap::new();
    let mut dropped = 0;

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or_default();

        let ts = parse_timestamp(field(columns.timestamp)).with_context(|| format!("Row {}", line + 1))?;
        let symbol = field(columns.symbol).to_string();
        let close = parse_close(field(columns.close)).with_context(|| format!("Row {}", line + 1))?;

        let close = accept(&symbol, ts, close, &mut dropped);
        if !closes.contains_key(&symbol) {
            order.push(symbol.clone());
        }
        closes.entry(symbol).or_default().push((ts, close));
    }

    if dropped > 0 {
        warn!(dropped, "Dropped non-positive or non-finite closes");
    }
    Ok(order
        .into_iter()
        .map(|symbol| {
            let history = closes.remove(&symbol).unwrap_or_default();
            (symbol, history)
        })
        .collect())
}

fn read_wide<R: Read>(reader: &mut Reader<R>, headers: &StringRecord) -> Result<Histories> {
    if headers.len() < 2 {
        bail!("Wide price file needs a timestamp column and at least one symbol column");
    }

    let mut histories: Histories = headers
        .iter()
        .skip(1)
        .map(|symbol| (symbol.to_string(), Vec::new()))
        .collect();
    let mut dropped = 0;

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let ts = parse_timestamp(record.get(0).unwrap_or_default())
            .with_context(|| format!("Row {}", line + 1))?;

        for (i, (symbol, history)) in histories.iter_mut().enumerate() {
            let cell = record.get(i + 1).unwrap_or_default();
            let close = parse_close(cell).with_context(|| format!("Row {}, column {symbol}", line + 1))?;
            history.push((ts, accept(symbol, ts, close, &mut dropped)));
        }
    }

    if dropped > 0 {
        warn!(dropped, "Dropped non-positive or non-finite closes");
    }
    Ok(histories)
}

/// Writes a [`PriceTable`] in the wide layout read by [`CsvPriceLoader`].
pub struct CsvPriceWriter;

impl CsvPriceWriter {
    /// Writes `timestamp,<symbol>...` with RFC 3339 timestamps and empty
    /// cells for missing prices.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_wide(path: impl AsRef<Path>, prices: &PriceTable) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        let mut header = vec!["timestamp".to_string()];
        header.extend(prices.symbols().iter().cloned());
        writer.write_record(&header)?;

        let columns: Vec<&[Option<f64>]> = prices.columns().map(|(_, values)| values).collect();
        for (row, ts) in prices.index().iter().enumerate() {
            let mut record = Vec::with_capacity(columns.len() + 1);
            record.push(ts.to_rfc3339());
            record.extend(
                columns
                    .iter()
                    .map(|c| c[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
