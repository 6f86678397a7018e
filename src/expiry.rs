use std::sync::LazyLock;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use regex::Regex;
use tracing::warn;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;
const SECS_PER_MONTH: u64 = 30 * SECS_PER_DAY;
const SECS_PER_YEAR: u64 = 365 * SECS_PER_DAY;

/// Longest lifetime a paste can get, and the lifetime of pastes saved without one.
const MAX_SECS: u64 = 20 * SECS_PER_YEAR;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:([0-9]+)Y)?(?:([0-9]+)M)?(?:([0-9]+)W)?(?:([0-9]+)D)?(?:T(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?)?$",
    )
    .expect("duration pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("'{0}' is not an ISO-8601 duration")]
    Malformed(String),
    #[error("'{0}' has no duration components")]
    Empty(String),
}

/// Parse an ISO-8601 duration (`P1Y2M3W4DT5H6M7S`) into seconds.
///
/// Years count 365 days and months 30. Sums that overflow saturate, they are clamped
/// by the caller anyway.
pub fn parse_duration(spec: &str) -> Result<u64, DurationParseError> {
    const UNITS: [u64; 7] = [
        SECS_PER_YEAR,
        SECS_PER_MONTH,
        SECS_PER_WEEK,
        SECS_PER_DAY,
        SECS_PER_HOUR,
        SECS_PER_MINUTE,
        1,
    ];

    let caps = DURATION_RE
        .captures(spec)
        .ok_or_else(|| DurationParseError::Malformed(spec.to_owned()))?;

    // a time designator needs at least one of H, M or S after it
    if spec.contains('T') && (5..=7).all(|group| caps.get(group).is_none()) {
        return Err(DurationParseError::Malformed(spec.to_owned()));
    }

    let mut total: u64 = 0;
    let mut seen = false;
    for (group, unit) in UNITS.iter().enumerate() {
        let Some(m) = caps.get(group + 1) else {
            continue;
        };
        seen = true;
        // digits only, so the sole failure mode is overflow
        let amount = m.as_str().parse::<u64>().unwrap_or(u64::MAX);
        total = total.saturating_add(amount.saturating_mul(*unit));
    }

    if !seen {
        return Err(DurationParseError::Empty(spec.to_owned()));
    }
    Ok(total)
}

/// Lifetime of a paste from the duration spec submitted with it.
///
/// Empty specs and unparseable specs get the 20 year default; everything is clamped to it.
pub fn duration_from_expiry(spec: &str) -> Duration {
    let secs = if spec.is_empty() {
        MAX_SECS
    } else {
        match parse_duration(spec) {
            Ok(secs) => secs,
            Err(e) => {
                warn!("{e}, using the default expiry");
                MAX_SECS
            }
        }
    };

    // MAX_SECS fits comfortably in an i64
    Duration::seconds(secs.min(MAX_SECS) as i64)
}

/// Absolute expiry of a paste saved at `now`, to whole seconds.
pub fn resolve(spec: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    (now + duration_from_expiry(spec)).trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn empty_spec_is_twenty_years() {
        assert_eq!(duration_from_expiry("").num_hours(), 175200);
    }

    #[test]
    fn long_durations_are_clamped() {
        assert_eq!(duration_from_expiry("P100Y").num_hours(), 175200);
        assert_eq!(duration_from_expiry("P20Y1D").num_hours(), 175200);
        assert_eq!(
            duration_from_expiry("P99999999999999999999999Y").num_hours(),
            175200
        );
    }

    #[test]
    fn parses_components() {
        assert_eq!(duration_from_expiry("PT5M").num_minutes(), 5);
        assert_eq!(duration_from_expiry("P1D").num_hours(), 24);
        assert_eq!(duration_from_expiry("P2W").num_days(), 14);
        assert_eq!(duration_from_expiry("P1M").num_days(), 30);
        assert_eq!(duration_from_expiry("P1Y").num_days(), 365);
        assert_eq!(duration_from_expiry("P1DT1H1M1S").num_seconds(), 90061);
        assert_eq!(duration_from_expiry("PT0S").num_seconds(), 0);
    }

    #[test]
    fn malformed_specs_fall_back_to_default() {
        for spec in ["5 minutes", "P", "PT", "P1DT", "P1H", "-PT5M", "pt5m"] {
            assert!(parse_duration(spec).is_err(), "{spec} should not parse");
            assert_eq!(duration_from_expiry(spec).num_hours(), 175200);
        }
    }

    #[test]
    fn resolves_against_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            resolve("PT5M", now),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap()
        );
    }
}
