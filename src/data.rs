use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::DataError;
use crate::scanner::LowHigh;

/// Column layout written by [`store_history_csv`].
pub const HISTORY_HEADER: [&str; 10] = [
    "Date", "Open", "High", "Low", "Close", "Adj Close", "Volume", "date_id", "OC_High", "OC_Low",
];

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Adj Close")]
    adj_close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

/// One trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Upper end of the open/close body.
    pub fn oc_high(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Lower end of the open/close body.
    pub fn oc_low(&self) -> f64 {
        self.open.min(self.close)
    }
}

/// Daily price history of one ticker, oldest bar first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerHistory {
    pub bars: Vec<PriceBar>,
}

impl TickerHistory {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn low_high(&self) -> impl Iterator<Item = LowHigh> + '_ {
        self.bars.iter().map(|b| LowHigh::new(b.low, b.high))
    }

    pub fn adj_closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.adj_close)
    }

    /// 1-based calendar-day offset of `bars[index]` from the first bar.
    pub fn date_id(&self, index: usize) -> Option<i64> {
        let first = self.bars.first()?.date;
        let bar = self.bars.get(index)?;
        Some((bar.date - first).num_days() + 1)
    }
}

/// Accepts plain `YYYY-MM-DD` as well as timestamps that start with it
/// (`2021-01-27 00:00:00-05:00`, `2021-01-27T00:00:00Z`).
fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| DataError::Date(raw.to_string()))
}

pub fn read_history<R: Read>(reader: R) -> Result<TickerHistory, DataError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut bars: Vec<PriceBar> = Vec::new();

    for result in rdr.deserialize::<PriceRow>() {
        let row: PriceRow = result?;
        bars.push(PriceBar {
            date: parse_date(&row.date)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
            volume: row.volume,
        });
    }
    Ok(TickerHistory { bars })
}

pub fn load_history_csv(path: &Path) -> Result<TickerHistory, DataError> {
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_history(file)
}

/// Write `history` in the unified layout (see [`HISTORY_HEADER`]).
/// Prices are written with six decimals so a store/load cycle is stable.
pub fn store_history_csv<W: Write>(history: &TickerHistory, writer: W) -> Result<(), DataError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HISTORY_HEADER)?;

    for (i, bar) in history.bars.iter().enumerate() {
        let date_id = history.date_id(i).unwrap_or(1);
        wtr.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            format!("{:.6}", bar.open),
            format!("{:.6}", bar.high),
            format!("{:.6}", bar.low),
            format!("{:.6}", bar.close),
            format!("{:.6}", bar.adj_close),
            format!("{}", bar.volume),
            date_id.to_string(),
            format!("{:.6}", bar.oc_high()),
            format!("{:.6}", bar.oc_low()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const GME_CSV: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2021-01-19,10.0,11.0,9.5,10.5,10.5,1000
2021-01-20,10.5,12.0,10.0,11.0,11.0,1500
2021-01-21,11.0,13.0,10.5,12.5,12.5,2000
2021-01-22,12.5,25.0,12.0,24.0,24.0,9000
";

    #[test]
    fn test_read_history_parses_yahoo_layout() {
        let history = read_history(GME_CSV.as_bytes()).unwrap();

        assert_eq!(history.bars.len(), 4);
        let first = &history.bars[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2021, 1, 19).unwrap());
        assert_eq!(first.low, 9.5);
        assert_eq!(first.high, 11.0);
        assert_eq!(history.bars[3].adj_close, 24.0);
    }

    #[test]
    fn test_read_history_tolerates_extra_columns_and_timestamps() {
        let csv = "\
Date,Open,High,Low,Close,Adj Close,Volume,date_id,OC_High,OC_Low
2021-01-19 00:00:00-05:00,1.0,2.0,0.5,1.5,1.5,10,1,1.5,1.0
";
        let history = read_history(csv.as_bytes()).unwrap();
        assert_eq!(history.bars.len(), 1);
        assert_eq!(
            history.bars[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 19).unwrap()
        );
    }

    #[test]
    fn test_read_history_rejects_bad_date() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\nyesterday,1,1,1,1,1,1\n";
        let err = read_history(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Date(_)));
    }

    #[test]
    fn test_read_history_rejects_non_numeric_price() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n2021-01-19,1,abc,1,1,1,1\n";
        let err = read_history(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }

    #[test]
    fn test_date_id_counts_calendar_days_from_first_bar() {
        let history = read_history(GME_CSV.as_bytes()).unwrap();
        assert_eq!(history.date_id(0), Some(1));
        assert_eq!(history.date_id(3), Some(4));
        assert_eq!(history.date_id(4), None);
    }

    #[test]
    fn test_store_history_csv_writes_unified_layout_that_reads_back() {
        let history = read_history(GME_CSV.as_bytes()).unwrap();

        let mut out: Vec<u8> = Vec::new();
        store_history_csv(&history, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Open,High,Low,Close,Adj Close,Volume,date_id,OC_High,OC_Low")
        );
        assert_eq!(
            lines.next(),
            Some("2021-01-19,10.000000,11.000000,9.500000,10.500000,10.500000,1000,1,10.500000,10.000000")
        );

        let reloaded = read_history(text.as_bytes()).unwrap();
        assert_eq!(reloaded, history);
    }

    #[test]
    fn test_load_history_csv_reports_missing_file() {
        let err = load_history_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataError::Open { .. }));
    }
}
