//! # Duration Parsing
//!
//! cert-manager expresses a requested certificate lifetime as a Go duration
//! string (`2160h0m0s`). The signing API takes whole days.

use crate::constants::{DEFAULT_VALIDITY_DAYS, SECONDS_PER_DAY};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

// `\d` would accept any Unicode digit; Go only accepts ASCII.
static WHOLE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .expect("Failed to compile duration pattern - this should never happen")
});

static DURATION_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<number>[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?P<unit>ns|us|µs|μs|ms|s|m|h)")
        .expect("Failed to compile duration component pattern - this should never happen")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration cannot be empty")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("duration {0:?} is negative")]
    Negative(String),
}

/// Parse a Go duration string such as `168h`, `1h30m` or `1.5s`.
pub fn parse_go_duration(value: &str) -> Result<Duration, DurationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    if unsigned == "0" {
        return Ok(Duration::ZERO);
    }

    if !WHOLE_DURATION.is_match(unsigned) {
        return Err(DurationError::Invalid(trimmed.to_string()));
    }

    let mut nanos: u128 = 0;
    for captures in DURATION_COMPONENT.captures_iter(unsigned) {
        let unit_nanos: u128 = match &captures["unit"] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(DurationError::Invalid(trimmed.to_string())),
        };
        let (int_part, frac_part) = captures["number"]
            .split_once('.')
            .unwrap_or((&captures["number"], ""));
        let int_value: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_err| DurationError::Invalid(trimmed.to_string()))?
        };
        nanos = nanos.saturating_add(int_value.saturating_mul(unit_nanos));

        // Fractions beyond nanosecond precision are dropped.
        let mut scale = unit_nanos;
        for digit in frac_part.bytes() {
            scale /= 10;
            nanos = nanos.saturating_add(u128::from(digit - b'0') * scale);
        }
    }

    if negative && nanos > 0 {
        return Err(DurationError::Negative(trimmed.to_string()));
    }

    let secs = u64::try_from(nanos / 1_000_000_000).map_err(|_err| DurationError::Invalid(trimmed.to_string()))?;
    // Remainder is below 1e9 and fits.
    let subsec = (nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec))
}

/// Requested validity in whole days, truncating any partial day.
///
/// Requests without a duration get the cert-manager default of 90 days.
pub fn requested_validity_days(duration: Option<&str>) -> Result<u32, DurationError> {
    let Some(duration) = duration.filter(|d| !d.trim().is_empty()) else {
        return Ok(DEFAULT_VALIDITY_DAYS);
    };

    let days = parse_go_duration(duration)?.as_secs() / SECONDS_PER_DAY;
    Ok(u32::try_from(days).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cert_manager_durations() {
        assert_eq!(parse_go_duration("168h0m0s").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_go_duration("2160h").unwrap(), Duration::from_secs(90 * 86_400));
        assert_eq!(parse_go_duration("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_go_duration("1.5s").unwrap(), Duration::from_millis(1_500));
        assert_eq!(parse_go_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_go_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(parse_go_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_go_duration("7d"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_go_duration("h"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_go_duration("10"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_go_duration("-1h"), Err(DurationError::Negative(_))));
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        // ARABIC-INDIC DIGIT THREE and FULLWIDTH DIGIT ONE
        assert!(matches!(parse_go_duration("1.\u{0663}h"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_go_duration("\u{FF11}h"), Err(DurationError::Invalid(_))));
        assert!(matches!(
            requested_validity_days(Some("\u{0663}\u{0663}h")),
            Err(DurationError::Invalid(_))
        ));
    }

    #[test]
    fn test_validity_truncates_to_days() {
        assert_eq!(requested_validity_days(Some("168h0m0s")), Ok(7));
        assert_eq!(requested_validity_days(Some("191h59m59s")), Ok(7));
        assert_eq!(requested_validity_days(Some("1h")), Ok(0));
    }

    #[test]
    fn test_validity_defaults_to_ninety_days() {
        assert_eq!(requested_validity_days(None), Ok(90));
        assert_eq!(requested_validity_days(Some("")), Ok(90));
    }
}
