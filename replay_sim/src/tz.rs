//! Time zone parsing and conversion helpers.
//!
//! Historical files usually carry naive wall-clock dates in the broker's
//! zone. Everything inside the replay core is UTC; local times are only
//! accepted at the loading and config edges and must resolve
//! deterministically or error.
//!
//! - [`parse_instant`]: RFC-3339 with offset, or a naive timestamp in a zone.
//! - [`from_local_naive_with_policy`]: naive local time → UTC under a [`DstPolicy`].
//!
//! Ambiguous local times happen during "fall back" when a wall time occurs
//! twice; nonexistent ones during "spring forward" when it is skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Naive layouts accepted for dates, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("unrecognized timestamp: {0:?}")]
    Unparseable(String),

    #[error("unknown time zone: {0:?}")]
    UnknownZone(String),

    #[error("ambiguous local time {naive} in {tz}")]
    Ambiguous { naive: NaiveDateTime, tz: Tz },

    #[error("nonexistent local time {naive} in {tz}")]
    Nonexistent { naive: NaiveDateTime, tz: Tz },
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    #[default]
    Strict,
    /// For ambiguous local times, pick the earlier instant.
    PreferEarliest,
    /// For ambiguous local times, pick the later instant.
    PreferLatest,
    /// For nonexistent local times, shift forward one minute at a time until
    /// the first valid instant (capped at 2 hours).
    ShiftForward,
}

pub fn parse_zone(name: &str) -> Result<Tz, TimeError> {
    name.trim()
        .parse()
        .map_err(|_| TimeError::UnknownZone(name.to_string()))
}

/// Convert a naive local timestamp to UTC using a specific IANA time zone and DST policy.
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TimeError> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(a, b) => match policy {
            DstPolicy::PreferEarliest => Ok(a.with_timezone(&Utc)),
            DstPolicy::PreferLatest => Ok(b.with_timezone(&Utc)),
            _ => Err(TimeError::Ambiguous { naive, tz }),
        },
        None => match policy {
            DstPolicy::ShiftForward => {
                let mut t = naive;
                for _ in 0..120 {
                    t += chrono::Duration::minutes(1);
                    if let Single(dt) = tz.from_local_datetime(&t) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
                Err(TimeError::Nonexistent { naive, tz })
            }
            _ => Err(TimeError::Nonexistent { naive, tz }),
        },
    }
}

/// Parse a naive timestamp in any of the accepted layouts; date-only means midnight.
pub fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse an instant: RFC-3339 keeps its own offset, anything else is local to `tz`.
pub fn parse_instant(s: &str, tz: Tz, policy: DstPolicy) -> Result<DateTime<Utc>, TimeError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = parse_naive(s).ok_or_else(|| TimeError::Unparseable(s.to_string()))?;
    from_local_naive_with_policy(naive, tz, policy)
}

/// Format a UTC datetime as RFC-3339 with second precision (`2024-05-01T00:00:00Z`).
pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ny() -> Tz {
        parse_zone("America/New_York").unwrap()
    }

    #[test]
    fn rfc3339_keeps_its_offset() {
        let got = parse_instant("2024-03-10T09:30:00-05:00", chrono_tz::UTC, DstPolicy::Strict)
            .unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap());
    }

    #[test]
    fn naive_layouts_parse() {
        let want = Utc.with_ymd_and_hms(2024, 5, 1, 13, 5, 0).unwrap();
        for s in [
            "2024-05-01 13:05:00",
            "2024-05-01 13:05",
            "2024-05-01T13:05:00",
            "2024.05.01 13:05",
            "2024/05/01 13:05:00",
        ] {
            assert_eq!(parse_instant(s, chrono_tz::UTC, DstPolicy::Strict).unwrap(), want, "{s}");
        }
    }

    #[test]
    fn date_only_is_midnight() {
        let got = parse_instant("2024-05-01", chrono_tz::UTC, DstPolicy::Strict).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn naive_time_uses_zone() {
        let got = parse_instant("2024-01-15 09:30", ny(), DstPolicy::Strict).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());
    }

    #[test]
    fn garbage_is_unparseable() {
        assert!(matches!(
            parse_instant("yesterday", chrono_tz::UTC, DstPolicy::Strict),
            Err(TimeError::Unparseable(_))
        ));
        assert!(matches!(parse_zone("Mars/Olympus"), Err(TimeError::UnknownZone(_))));
    }

    #[test]
    fn spring_forward_gap() {
        let naive = parse_naive("2024-03-10 02:30").unwrap();
        assert!(matches!(
            from_local_naive_with_policy(naive, ny(), DstPolicy::Strict),
            Err(TimeError::Nonexistent { .. })
        ));
        let shifted = from_local_naive_with_policy(naive, ny(), DstPolicy::ShiftForward).unwrap();
        assert_eq!(shifted, Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap());
    }

    #[test]
    fn fall_back_ambiguity() {
        let naive = parse_naive("2024-11-03 01:30").unwrap();
        assert!(matches!(
            from_local_naive_with_policy(naive, ny(), DstPolicy::Strict),
            Err(TimeError::Ambiguous { .. })
        ));
        let early = from_local_naive_with_policy(naive, ny(), DstPolicy::PreferEarliest).unwrap();
        let late = from_local_naive_with_policy(naive, ny(), DstPolicy::PreferLatest).unwrap();
        assert_eq!(early, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
        assert_eq!(late, Utc.with_ymd_and_hms(2024, 11, 3, 6, 30, 0).unwrap());
    }

    #[test]
    fn rfc3339_output_is_zulu() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(to_rfc3339(dt), "2024-05-01T00:00:00Z");
    }
}
