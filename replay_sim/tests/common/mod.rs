#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use replay_sim::{Bar, BarSeries};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

/// `n` hourly bars starting at [`t0`], closes counting up from 1.0.
pub fn hourly_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let c = 1.0 + i as f64;
            Bar::new(t0() + Duration::hours(i as i64), c, c + 0.5, c - 0.5, c, 10.0)
        })
        .collect()
}

pub fn hourly_series(symbol: &str, n: usize) -> BarSeries {
    BarSeries::new(symbol, None, hourly_bars(n)).unwrap()
}

/// Writes `n` hourly rows in the on-disk data format and returns the path.
pub fn write_data_file(dir: &Path, name: &str, n: usize) -> PathBuf {
    let mut text = String::from("Date,Open,High,Low,Close,Volume,Weekday,Price_Change\n");
    for bar in hourly_bars(n) {
        text.push_str(&format!(
            "{},{},{},{},{},{},3,0.0\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write data file");
    path
}
