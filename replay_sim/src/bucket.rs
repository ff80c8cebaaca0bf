//! UTC bucket mapping for resampling.
//!
//! - One stable epoch: Unix (1970-01-01T00:00:00Z).
//! - Fixed-size frames (minute/hour/day): second-based math.
//! - Week: Monday 00:00:00Z–aligned using a week epoch of 1969-12-29.
//! - Month: linear (year, month) indexing relative to 1970-01.
//!
//! Ids are signed so timestamps before the epoch map cleanly.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::models::timeframe::{Timeframe, TimeframeUnit};

pub const EPOCH_UNIX: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

const SECS_PER_DAY: i64 = 86_400;

/// shift so Monday 1969-12-29 00:00Z becomes index 0
const WEEK_MONDAY_ANCHOR_OFFSET_SECS: i64 = 3 * SECS_PER_DAY;

/// Bucket id of the left-closed bucket containing `ts`.
pub fn bucket_id(ts: DateTime<Utc>, tf: Timeframe) -> i64 {
    match (tf.unit(), tf.fixed_secs()) {
        (TimeframeUnit::Week, Some(width)) => {
            (ts.timestamp() + WEEK_MONDAY_ANCHOR_OFFSET_SECS).div_euclid(width)
        }
        (_, Some(width)) => ts.timestamp().div_euclid(width),
        (_, None) => id_month(ts, tf.amount().get() as i64),
    }
}

/// Start instant of a bucket id.
pub fn bucket_start(id: i64, tf: Timeframe) -> DateTime<Utc> {
    match (tf.unit(), tf.fixed_secs()) {
        (TimeframeUnit::Week, Some(width)) => {
            start_fixed(id, width) - Duration::seconds(WEEK_MONDAY_ANCHOR_OFFSET_SECS)
        }
        (_, Some(width)) => start_fixed(id, width),
        (_, None) => start_month(id, tf.amount().get() as i64),
    }
}

/// Exclusive end instant (start of the next bucket).
pub fn bucket_end(id: i64, tf: Timeframe) -> DateTime<Utc> {
    bucket_start(id + 1, tf)
}

fn start_fixed(id: i64, bucket_secs: i64) -> DateTime<Utc> {
    EPOCH_UNIX + Duration::seconds(id * bucket_secs)
}

fn id_month(ts: DateTime<Utc>, amount: i64) -> i64 {
    let idx = (ts.year() as i64 - 1970) * 12 + (ts.month0() as i64);
    idx.div_euclid(amount)
}

fn start_month(id: i64, amount: i64) -> DateTime<Utc> {
    let start_idx = id * amount;
    let year = 1970 + start_idx.div_euclid(12);
    let month = start_idx.rem_euclid(12) as u32 + 1;
    // day 1 at midnight always exists in UTC
    Utc.with_ymd_and_hms(year as i32, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(EPOCH_UNIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tf(s: &str) -> Timeframe {
        s.parse().unwrap()
    }

    #[test]
    fn minute_roundtrip() {
        let t = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let id = bucket_id(t, tf("5m"));
        assert_eq!(
            bucket_start(id, tf("5m")),
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 0, 0).unwrap()
        );
        assert_eq!(
            bucket_end(id, tf("5m")),
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 5, 0).unwrap()
        );
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-06-06 is a Thursday
        let t = Utc.with_ymd_and_hms(2024, 6, 6, 12, 0, 0).unwrap();
        let id = bucket_id(t, tf("1W"));
        assert_eq!(
            bucket_start(id, tf("1W")),
            Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_roundtrip_and_boundaries() {
        let t = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap(); // leap day
        let id = bucket_id(t, tf("1M"));
        assert_eq!(
            bucket_start(id, tf("1M")),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            bucket_end(id, tf("1M")),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn pre_epoch_timestamps_floor_downwards() {
        let t = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 30).unwrap();
        let id = bucket_id(t, tf("1m"));
        assert_eq!(id, -1);
        assert_eq!(
            bucket_start(id, tf("1m")),
            Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 0).unwrap()
        );
    }

    #[test]
    fn multi_week_buckets_stay_monday_aligned() {
        let t = Utc.with_ymd_and_hms(2024, 6, 6, 12, 0, 0).unwrap();
        let start = bucket_start(bucket_id(t, tf("2W")), tf("2W"));
        assert_eq!(start.weekday(), chrono::Weekday::Mon);
        assert!(start <= t && t < start + Duration::weeks(2));
    }
}
