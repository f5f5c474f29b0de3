use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    // The whole input must be a sequence of <number><unit> tokens. Checking
    // the full string first rejects inputs like "-5m" where a token regex
    // alone would still find a match.
    static ref DURATION_FORMAT: Regex =
        Regex::new(r"^(?:\d+\s*(?:mo|[ywdhms])\s*)+$").unwrap();
    static ref DURATION_TOKEN: Regex = Regex::new(r"(\d+)\s*(mo|[ywdhms])").unwrap();
}

// Parses a relative duration written as "30s", "5m", "2h", "1d" or a
// combination like "1h30m". Months and years use the fixed 30/365 day
// approximations.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let normalized = text.trim().to_lowercase();
    if !DURATION_FORMAT.is_match(&normalized) {
        let message = format!("'{}' does not match formats like 1m, 1h or 1d.", text.trim());
        return Err(Error::InvalidDuration(message));
    }

    let mut total_seconds: u64 = 0;
    for capture in DURATION_TOKEN.captures_iter(&normalized) {
        let value = match capture[1].parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                let message = format!("'{}' is too large.", text.trim());
                return Err(Error::InvalidDuration(message));
            }
        };

        let unit_seconds: u64 = match &capture[2] {
            "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 60 * 60 * 24,
            "w" => 60 * 60 * 24 * 7,
            "mo" => 60 * 60 * 24 * 30,
            "y" => 60 * 60 * 24 * 365,
            _ => 0,
        };

        total_seconds = match value
            .checked_mul(unit_seconds)
            .and_then(|seconds| total_seconds.checked_add(seconds))
        {
            Some(total) => total,
            None => {
                let message = format!("'{}' is too large.", text.trim());
                return Err(Error::InvalidDuration(message));
            }
        };
    }

    match total_seconds {
        0 => {
            let message = format!("'{}' must resolve to a positive duration.", text.trim());
            Err(Error::InvalidDuration(message))
        }
        _ => Ok(Duration::from_secs(total_seconds)),
    }
}
