//! Delimited-file loader for historical bars.
//!
//! Expects the columns `Date, Open, High, Low, Close, Volume` (header names
//! are matched case-insensitively, in any order). Additional columns such as
//! `Weekday` or `Price_Change` are ignored. Dates may be RFC-3339 or naive
//! wall-clock times in the configured zone, see [`crate::tz::parse_instant`].
//!
//! The loader only parses and validates; it never repairs data. Rows that do
//! not parse fail with [`Error::Parse`] carrying the 1-based data row number,
//! and the resulting series is checked by [`BarSeries::new`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::errors::Error;
use crate::models::{bar::Bar, bar_series::BarSeries, timeframe::Timeframe};
use crate::tz::{DstPolicy, parse_instant};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Zone for naive dates.
    pub timezone: Tz,
    pub dst_policy: DstPolicy,
    /// Sort rows by date before validation.
    pub sort: bool,
    pub delimiter: u8,
    /// Interval recorded on the loaded series.
    pub timeframe: Option<Timeframe>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            dst_policy: DstPolicy::Strict,
            sort: false,
            delimiter: b',',
            timeframe: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    options: LoadOptions,
}

impl CsvLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Loads a file, naming the series after the file stem (see [`symbol_from_path`]).
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<BarSeries, Error> {
        let path = path.as_ref();
        let symbol = symbol_from_path(path).ok_or_else(|| Error::Parse {
            row: 0,
            message: format!("cannot derive a symbol from {}", path.display()),
        })?;
        self.load_path_as(path, &symbol)
    }

    pub fn load_path_as(&self, path: impl AsRef<Path>, symbol: &str) -> Result<BarSeries, Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), %symbol, "loading series");
        let series = self.load_reader(File::open(path)?, symbol)?;
        info!(
            %symbol,
            bars = series.len(),
            first = %series.first_timestamp(),
            last = %series.last_timestamp(),
            "loaded series"
        );
        Ok(series)
    }

    pub fn load_reader<R: Read>(&self, reader: R, symbol: &str) -> Result<BarSeries, Error> {
        let mut rows = read_rows(reader, &self.options)?;
        if self.options.sort {
            rows.sort_by_key(|(_, bar)| bar.timestamp);
        }
        let (lines, bars): (Vec<usize>, Vec<Bar>) = rows.into_iter().unzip();
        BarSeries::new(symbol, self.options.timeframe, bars).map_err(|err| match err.index() {
            Some(index) => Error::Parse {
                row: lines[index],
                message: err.describe(),
            },
            None => err.into(),
        })
    }
}

/// `DATA/EURUSD_C.csv` → `EURUSD`: the file stem up to the first underscore.
pub fn symbol_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let symbol = stem.split('_').next().unwrap_or(stem).trim();
    (!symbol.is_empty()).then(|| symbol.to_uppercase())
}

/// Reads raw bars without any ordering checks.
pub(crate) fn read_bars<R: Read>(reader: R, options: &LoadOptions) -> Result<Vec<Bar>, Error> {
    Ok(read_rows(reader, options)?
        .into_iter()
        .map(|(_, bar)| bar)
        .collect())
}

/// Raw bars paired with their 1-based data row.
fn read_rows<R: Read>(reader: R, options: &LoadOptions) -> Result<Vec<(usize, Bar)>, Error> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let positions = column_positions(rdr.headers()?)?;
    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let row = i + 1;
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        bars.push((row, parse_row(&record, &positions, row, options)?));
    }
    Ok(bars)
}

fn column_positions(headers: &StringRecord) -> Result<[usize; 6], Error> {
    let mut positions = [0usize; 6];
    for (slot, name) in positions.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::Parse {
                row: 0,
                message: format!("missing column {name:?}"),
            })?;
    }
    Ok(positions)
}

fn parse_row(
    record: &StringRecord,
    positions: &[usize; 6],
    row: usize,
    options: &LoadOptions,
) -> Result<Bar, Error> {
    let field = |i: usize| record.get(positions[i]).unwrap_or("");
    let number = |i: usize| -> Result<f64, Error> {
        let raw = field(i);
        raw.parse::<f64>().map_err(|_| Error::Parse {
            row,
            message: format!("{} is not a number: {raw:?}", COLUMNS[i]),
        })
    };

    let timestamp =
        parse_instant(field(0), options.timezone, options.dst_policy).map_err(|e| Error::Parse {
            row,
            message: e.to_string(),
        })?;
    Ok(Bar::new(
        timestamp,
        number(1)?,
        number(2)?,
        number(3)?,
        number(4)?,
        number(5)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InvalidInput;
    use chrono::{TimeZone, Utc};

    const CLEAN: &str = "\
Date,Open,High,Low,Close,Volume,Weekday,Price_Change
2024-05-01 00:00:00,1.0670,1.0675,1.0665,1.0672,120,3,0.0002
2024-05-01 00:05:00,1.0672,1.0680,1.0670,1.0678,95,3,0.0006
2024-05-01 00:10:00,1.0678,1.0679,1.0660,1.0661,240,3,-0.0017
";

    #[test]
    fn loads_clean_file_and_ignores_extra_columns() {
        let series = CsvLoader::default()
            .load_reader(CLEAN.as_bytes(), "EURUSD")
            .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.first_timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(series.bars()[2].close, 1.0661);
        assert_eq!(series.bars()[1].volume, 95.0);
    }

    #[test]
    fn header_names_are_case_insensitive_and_unordered() {
        let csv = "close,VOLUME,date,open,high,low\n1.5,10,2024-01-02,1.4,1.6,1.3\n";
        let series = CsvLoader::default().load_reader(csv.as_bytes(), "X").unwrap();
        let expected = Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            1.4,
            1.6,
            1.3,
            1.5,
            10.0,
        );
        assert_eq!(series.bars()[0], expected);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Date,Open,High,Low,Close\n2024-01-02,1,1,1,1\n";
        let err = CsvLoader::default().load_reader(csv.as_bytes(), "X").unwrap_err();
        match err {
            Error::Parse { row, message } => {
                assert_eq!(row, 0);
                assert!(message.contains("volume"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn bad_number_carries_row() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,1,1,1,1\n2024-01-03,1,abc,1,1,1\n";
        let err = CsvLoader::default().load_reader(csv.as_bytes(), "X").unwrap_err();
        assert!(matches!(err, Error::Parse { row: 2, .. }));
    }

    #[test]
    fn unordered_rows_fail_unless_sorted() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-03,1,1,1,1,1\n2024-01-02,1,1,1,1,1\n";
        let err = CsvLoader::default().load_reader(csv.as_bytes(), "X").unwrap_err();
        match err {
            Error::Parse { row, message } => {
                assert_eq!(row, 2);
                assert!(message.contains("does not follow"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }

        let sorted = CsvLoader::new(LoadOptions {
            sort: true,
            ..LoadOptions::default()
        })
        .load_reader(csv.as_bytes(), "X")
        .unwrap();
        assert!(sorted.bars()[0].timestamp < sorted.bars()[1].timestamp);
    }

    #[test]
    fn non_finite_price_reports_its_file_row() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-02,1,1,1,1,1
2024-01-03,1,1,1,1,1
2024-01-04,1,1,1,NaN,1
";
        let err = CsvLoader::default().load_reader(csv.as_bytes(), "X").unwrap_err();
        match err {
            Error::Parse { row, message } => {
                assert_eq!(row, 3);
                assert_eq!(message, "close is not finite (NaN)");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_date_reports_its_file_row_after_sorting() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-02,1,1,1,1,1
2024-01-03,1,1,1,1,1
2024-01-05,1,1,1,1,1
2024-01-03,1,1,1,1,1
";
        for sort in [false, true] {
            let loader = CsvLoader::new(LoadOptions {
                sort,
                ..LoadOptions::default()
            });
            let err = loader.load_reader(csv.as_bytes(), "X").unwrap_err();
            assert!(
                matches!(err, Error::Parse { row: 4, .. }),
                "sort={sort}: {err:?}"
            );
        }
    }

    #[test]
    fn naive_dates_follow_configured_zone() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-15 09:30,1,1,1,1,1\n";
        let loader = CsvLoader::new(LoadOptions {
            timezone: "America/New_York".parse().unwrap(),
            ..LoadOptions::default()
        });
        let series = loader.load_reader(csv.as_bytes(), "SPY").unwrap();
        assert_eq!(
            series.first_timestamp(),
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn tab_delimited_input() {
        let csv = "Date\tOpen\tHigh\tLow\tClose\tVolume\n2024-01-02\t1\t2\t0.5\t1.5\t7\n";
        let loader = CsvLoader::new(LoadOptions {
            delimiter: b'\t',
            ..LoadOptions::default()
        });
        assert_eq!(loader.load_reader(csv.as_bytes(), "X").unwrap().len(), 1);
    }

    #[test]
    fn empty_file_is_empty_series() {
        let csv = "Date,Open,High,Low,Close,Volume\n";
        let err = CsvLoader::default().load_reader(csv.as_bytes(), "X").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(InvalidInput::EmptySeries)));
    }

    #[test]
    fn symbol_comes_from_file_stem() {
        assert_eq!(
            symbol_from_path(Path::new("DATA/EURUSD_C.csv")),
            Some("EURUSD".to_string())
        );
        assert_eq!(
            symbol_from_path(Path::new("gbpusd.csv")),
            Some("GBPUSD".to_string())
        );
        assert_eq!(symbol_from_path(Path::new("_x.csv")), None);
    }
}
