//! Registry duration strings
//!
//! The agent takes check intervals and timeouts as duration strings
//! (`"10s"`, `"1m30s"`, `"1.5s"`, `"250ms"`). They are passed through verbatim,
//! but validated up front so a typo fails at construction.

use crate::error::{Error, Result};
use std::time::Duration;

/// Unit suffixes and their length in nanoseconds
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60e9),
    ("h", 3600e9),
];

/// Parse a duration string into a [`Duration`]
pub fn parse(value: &str) -> Result<Duration> {
    let invalid = || Error::InvalidConfig(format!("invalid duration {value:?}"));

    let rest = value.strip_prefix('+').unwrap_or(value);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut rest = rest;
    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let number = &rest[..number_len];
        if number.is_empty() || number == "." {
            return Err(invalid());
        }
        let number: f64 = number.parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(invalid)?;
        nanos += (number * scale).round();
        rest = &rest[unit_len..];
    }

    // The agent stores durations as signed 64-bit nanoseconds
    if nanos > i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Check that `value` is a valid duration string
pub fn validate(field: &str, value: &str) -> Result<()> {
    parse(value)
        .map(|_| ())
        .map_err(|_| Error::InvalidConfig(format!("{field}: invalid duration {value:?}")))
}
