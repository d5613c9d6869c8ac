//! Loading closing prices from CSV exports.
//!
//! The expected layout is a header row followed by one row per trading day,
//! with the closing price in column index 4. The value may be quoted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::error::{Error, Result};

/// Zero-based column that holds the closing price
pub const CLOSE_COLUMN: usize = 4;

/// Load the closing-price series from a CSV file.
///
/// A file with only a header (or nothing at all) gives an empty series;
/// callers decide whether that is fatal.
pub fn load_closing_prices<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let file = File::open(path.as_ref())?;
    let prices = read_closing_prices(file)?;
    debug!("loaded {} prices from {}", prices.len(), path.as_ref().display());
    Ok(prices)
}

/// Parse the closing-price series from any CSV source.
///
/// An error names the physical line its record starts on, counting the header
/// as line 1.
pub fn read_closing_prices<R: Read>(source: R) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let mut prices = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // Physical line where the record starts; quoted newlines span several lines
        let row = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(index + 2);

        let field = record.get(CLOSE_COLUMN).ok_or(Error::MissingColumn {
            row,
            column: CLOSE_COLUMN,
        })?;

        prices.push(parse_price(field, row)?);
    }

    Ok(prices)
}

/// Parse a plain decimal-point number: digits with at most one `.`, no sign,
/// exponent or thousands separators
fn parse_price(field: &str, row: usize) -> Result<f64> {
    let invalid = || Error::InvalidPrice {
        row,
        value: field.to_string(),
    };

    let cleaned = field.trim().trim_matches('"');
    let has_digit = cleaned.bytes().any(|b| b.is_ascii_digit());
    let plain = cleaned.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && cleaned.bytes().filter(|&b| b == b'.').count() <= 1;
    if !has_digit || !plain {
        return Err(invalid());
    }

    cleaned.parse::<f64>().map_err(|_| invalid())
}
