use chrono::{Duration, NaiveDate};

use crate::error::{AppError, Result};

/// Parses a date in strict `YYYY-MM-DD` form: four-two-two digit fields,
/// `-` separators, nothing before or after, and a real calendar date.
/// Returns `None` for anything else.
pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Start of the 12-month window ending at `latest`: the same date minus
/// 365 days, formatted `YYYY-MM-DD`. Every windowed query goes through here
/// so all callers agree on the exact cutoff.
///
/// `latest` comes out of the dataset, so a malformed value is a data error,
/// not a caller error.
pub fn trailing_year_start(latest: &str) -> Result<String> {
    let date = parse_iso_date(latest).ok_or_else(|| {
        AppError::InvalidData(format!("observation date '{}' is not YYYY-MM-DD", latest))
    })?;
    let start = date.checked_sub_signed(Duration::days(365)).ok_or_else(|| {
        AppError::InvalidData(format!("observation date '{}' is out of range", latest))
    })?;

    Ok(start.format("%Y-%m-%d").to_string())
}
