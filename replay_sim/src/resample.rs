//! OHLCV aggregation onto a coarser timeframe.
//!
//! Bars falling in the same bucket are merged: open = first, high = max,
//! low = min, close = last, volume = sum. Buckets without bars are not
//! emitted, so gaps (weekends, holidays) stay gaps.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::bucket::{bucket_end, bucket_id, bucket_start};
use crate::errors::InvalidInput;
use crate::models::{bar::Bar, bar_series::BarSeries, timeframe::Timeframe};

/// Which edge of a bucket is closed, and therefore labels it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEdge {
    /// `[start, end)`, labelled by `start`.
    #[default]
    Left,
    /// `(start, end]`, labelled by `end`.
    Right,
}

pub fn resample(
    series: &BarSeries,
    timeframe: Timeframe,
    edge: BucketEdge,
) -> Result<BarSeries, InvalidInput> {
    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<i64> = None;

    for bar in series.bars() {
        let id = match edge {
            BucketEdge::Left => bucket_id(bar.timestamp, timeframe),
            // a bar exactly on a boundary closes the bucket ending there
            BucketEdge::Right => bucket_id(bar.timestamp - Duration::nanoseconds(1), timeframe),
        };
        match (current, out.last_mut()) {
            (Some(cur), Some(agg)) if cur == id => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                let label = match edge {
                    BucketEdge::Left => bucket_start(id, timeframe),
                    BucketEdge::Right => bucket_end(id, timeframe),
                };
                out.push(Bar::new(label, bar.open, bar.high, bar.low, bar.close, bar.volume));
                current = Some(id);
            }
        }
    }

    BarSeries::new(series.symbol(), Some(timeframe), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, h, m, 0).unwrap()
    }

    fn minute_series() -> BarSeries {
        let rows = [
            (at(9, 0), 1.0, 1.5, 0.9, 1.2, 10.0),
            (at(9, 1), 1.2, 1.3, 1.1, 1.25, 5.0),
            (at(9, 4), 1.25, 1.6, 1.2, 1.4, 7.0),
            (at(9, 5), 1.4, 1.45, 0.8, 1.0, 3.0),
            // 09:10 bucket is empty
            (at(9, 16), 1.0, 1.1, 0.95, 1.05, 2.0),
        ];
        let bars = rows
            .into_iter()
            .map(|(t, o, h, l, c, v)| Bar::new(t, o, h, l, c, v))
            .collect();
        BarSeries::new("EURUSD", None, bars).unwrap()
    }

    #[test]
    fn left_edge_aggregates_ohlcv() {
        let out = resample(&minute_series(), "5m".parse().unwrap(), BucketEdge::Left).unwrap();
        let bars = out.bars();
        assert_eq!(bars.len(), 3);

        assert_eq!(bars[0], Bar::new(at(9, 0), 1.0, 1.6, 0.9, 1.4, 22.0));
        assert_eq!(bars[1], Bar::new(at(9, 5), 1.4, 1.45, 0.8, 1.0, 3.0));
        assert_eq!(bars[2].timestamp, at(9, 15));
        assert_eq!(out.timeframe(), Some("5m".parse().unwrap()));
        assert_eq!(out.symbol(), "EURUSD");
    }

    #[test]
    fn right_edge_closes_on_boundary() {
        let out = resample(&minute_series(), "5m".parse().unwrap(), BucketEdge::Right).unwrap();
        let stamps: Vec<_> = out.bars().iter().map(|b| b.timestamp).collect();
        // 09:00 closes (08:55, 09:00]; 09:01..09:05 close (09:00, 09:05]
        assert_eq!(stamps, vec![at(9, 0), at(9, 5), at(9, 20)]);

        let second = &out.bars()[1];
        assert_eq!(second.open, 1.2);
        assert_eq!(second.close, 1.0);
        assert_eq!(second.low, 0.8);
        assert_eq!(second.volume, 15.0);
    }

    #[test]
    fn hourly_collapses_everything() {
        let out = resample(&minute_series(), "1h".parse().unwrap(), BucketEdge::Left).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.bars()[0].volume, 27.0);
    }
}
