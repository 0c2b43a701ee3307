use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::TickerHistory;
use crate::scanner::ScanMatch;

pub const MATCH_HEADER: [&str; 4] = ["Ticker", "Date", "Adj Close", "Increase"];

/// One matching ticker: the bar that triggered and the observed increase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    /// Infinite for a zero baseline; written as the string `"inf"`.
    #[serde(rename = "Increase", with = "increase_field")]
    pub increase: f64,
}

/// JSON has no encoding for non-finite numbers, so those travel as strings.
mod increase_field {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&value.to_string())
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid increase {text:?}"))),
        }
    }
}

impl MatchRecord {
    /// `None` if `hit.index` is outside `history`.
    pub fn from_match(ticker: &str, history: &TickerHistory, hit: &ScanMatch) -> Option<Self> {
        let bar = history.bars.get(hit.index)?;
        Some(Self {
            ticker: ticker.to_string(),
            date: bar.date.format("%Y-%m-%d").to_string(),
            adj_close: bar.adj_close,
            increase: hit.ratio,
        })
    }
}

pub trait MatchLogger: Sync {
    fn log(&self, record: &MatchRecord) -> Result<()>;
}

/// Appends one JSON object per line.
pub struct NdjsonMatchLog {
    pub path: PathBuf,
}

impl NdjsonMatchLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MatchLogger for NdjsonMatchLog {
    fn log(&self, record: &MatchRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open match log {:?}", self.path))?;
        let line = serde_json::to_string(record)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub struct NoopLogger;

impl MatchLogger for NoopLogger {
    fn log(&self, _record: &MatchRecord) -> Result<()> {
        Ok(())
    }
}

/// Convert an NDJSON match log into CSV. The header is written even when
/// the log is empty. Blank lines are skipped.
pub fn ndjson_to_csv<R: BufRead, W: Write>(reader: R, writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(MATCH_HEADER)?;

    let mut count = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: MatchRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid match record on line {}", i + 1))?;
        wtr.serialize(&record)?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

/// Write match records as CSV (same layout as [`ndjson_to_csv`]).
pub fn write_matches_csv<W: Write>(records: &[MatchRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(MATCH_HEADER)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Match count of one sweep combination.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub series: String,
    pub multiplier: f64,
    pub days: usize,
    pub count: usize,
    /// Percentage of loaded tickers that matched.
    pub relative: f64,
}

/// The `limit` largest increases, at most one per ticker.
pub fn most_extreme(records: &[MatchRecord], limit: usize) -> Vec<MatchRecord> {
    let mut sorted: Vec<&MatchRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.increase.total_cmp(&a.increase));

    let mut seen = BTreeSet::new();
    sorted
        .into_iter()
        .filter(|r| seen.insert(r.ticker.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

/// Markdown report of a sweep: the count table, then the most extreme moves.
pub fn write_sweep_overview<W: Write>(
    rows: &[SweepRow],
    extremes: &[MatchRecord],
    mut writer: W,
) -> Result<()> {
    writeln!(writer, "| Series    | Multiplier | Days | Stock count | Relative |")?;
    writeln!(writer, "|-----------|-----------:|-----:|------------:|---------:|")?;
    for row in rows {
        writeln!(
            writer,
            "| {:<9} | {:>10} | {:>4} | {:>11} | {:>7.2}% |",
            row.series, row.multiplier, row.days, row.count, row.relative
        )?;
    }

    if !extremes.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "## Most extreme increases")?;
        writeln!(writer)?;
        writeln!(writer, "| Ticker | Date       | Adj Close | Increase |")?;
        writeln!(writer, "|--------|------------|----------:|---------:|")?;
        for r in extremes {
            writeln!(
                writer,
                "| {} | {} | {:.4} | {:.2}x |",
                r.ticker, r.date, r.adj_close, r.increase
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn print_match(record: &MatchRecord) {
    println!("Ticker:                  {}", record.ticker);
    println!("Date:                    {}", record.date);
    println!("Adj Close:               {:.4}", record.adj_close);
    println!("Increase:                {:.2}x", record.increase);
}

pub fn print_summary(scanned: usize, failed: usize, kept: &[String]) {
    println!("=== Scan Summary ===");
    println!("Tickers scanned:  {scanned}");
    println!("Failed:           {failed}");
    println!("Matched:          {}", kept.len());
    if !kept.is_empty() {
        println!("Symbols:          {}", kept.join(", "));
    }
}
