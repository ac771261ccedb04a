use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;
use techscan_core::{Bar, DataError, PriceHistory};

/// Parse daily bars from CSV text.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `date` (or `timestamp`, `datetime`), `open`, `high`, `low`, `close`, `volume`.
/// Extra columns such as `adj close` or `dividends` are ignored. Rows whose
/// prices are missing (`null`, empty) are skipped, as are bars failing
/// [`Bar::validate`] (vendor rounding can put a close a cent outside the
/// high/low range). Bars are sorted by date; duplicate dates are an error.
pub fn parse_bars<R: Read>(input: R, ticker: &str) -> Result<PriceHistory, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    let mut invalid = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let prices = [col_map.open, col_map.high, col_map.low, col_map.close].map(field);
        if prices.iter().any(|p| is_missing(p)) {
            skipped += 1;
            continue;
        }

        let date = parse_date(field(col_map.date))?;
        let volume = match col_map.volume {
            Some(idx) => parse_volume(field(idx))?,
            None => 0,
        };

        let bar = Bar::new(
            date,
            parse_decimal(prices[0], "open")?,
            parse_decimal(prices[1], "high")?,
            parse_decimal(prices[2], "low")?,
            parse_decimal(prices[3], "close")?,
            volume,
        );
        match bar {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                tracing::warn!(ticker, error = %e, "Skipping invalid bar");
                invalid += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(ticker, skipped, "Skipped rows with missing prices");
    }
    if invalid > 0 {
        tracing::warn!(ticker, invalid, "Skipped bars failing price checks");
    }

    bars.sort_by_key(|b| b.date);
    Ok(PriceHistory::new(ticker, bars)?)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let date = find_column(headers, &["date", "timestamp", "datetime", "time"])
        .ok_or_else(|| DataError::ParseError("No date column found".into()))?;
    let open = find_column(headers, &["open", "o"])
        .ok_or_else(|| DataError::ParseError("No open column found".into()))?;
    let high = find_column(headers, &["high", "h"])
        .ok_or_else(|| DataError::ParseError("No high column found".into()))?;
    let low = find_column(headers, &["low", "l"])
        .ok_or_else(|| DataError::ParseError("No low column found".into()))?;
    let close = find_column(headers, &["close", "c"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;
    let volume = find_column(headers, &["volume", "vol", "v"]);

    Ok(BarColumnMap {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    for (i, header) in headers.iter().enumerate() {
        let h = header.trim().to_lowercase();
        for name in names {
            if h == *name {
                return Some(i);
            }
        }
    }
    None
}

fn is_missing(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan")
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, DataError> {
    Decimal::from_str(s.trim())
        .or_else(|_| Decimal::from_scientific(s.trim()))
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

/// Volumes sometimes arrive as floats (`1234.0`); the fractional part is dropped.
fn parse_volume(s: &str) -> Result<u64, DataError> {
    if is_missing(s) {
        return Ok(0);
    }
    let value = parse_decimal(s, "volume")?;
    if value < Decimal::ZERO {
        return Err(DataError::ParseError(format!("Negative volume '{}'", s)));
    }
    value
        .trunc()
        .to_u64()
        .ok_or_else(|| DataError::ParseError(format!("Volume out of range '{}'", s)))
}

/// Parse the calendar day of a bar. Timestamps keep their local date, so
/// `2024-01-02 00:00:00-05:00` is January 2nd.
fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();

    let date_formats = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d", "%d.%m.%Y"];
    for fmt in &date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // Try RFC 3339 / ISO 8601 with an offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.date_naive());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in &datetime_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.date());
        }
    }

    // Try Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt.date_naive());
        }
    }

    Err(DataError::ParseError(format!("Unable to parse date: '{}'", s)))
}
