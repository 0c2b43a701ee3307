use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::criteria::TickerFilter;
use crate::data::{TickerHistory, load_history_csv};
use crate::error::DataError;
use crate::output::MatchRecord;
use crate::scanner::ScanMatch;
use crate::store::list_csv_files;

#[derive(Debug)]
pub enum Verdict {
    /// Passed every criterion; one match per criterion, in filter order.
    Kept(Vec<ScanMatch>),
    Rejected,
    /// Loading or scanning failed; the ticker is skipped.
    Failed(String),
}

#[derive(Debug)]
pub struct TickerScan {
    pub symbol: String,
    /// Only kept tickers carry their history.
    pub history: Option<TickerHistory>,
    pub verdict: Verdict,
}

impl TickerScan {
    pub fn is_kept(&self) -> bool {
        matches!(self.verdict, Verdict::Kept(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.verdict, Verdict::Failed(_))
    }

    /// Report rows for a kept ticker, one per criterion match.
    pub fn records(&self) -> Vec<MatchRecord> {
        let (Verdict::Kept(matches), Some(history)) = (&self.verdict, &self.history) else {
            return Vec::new();
        };
        matches
            .iter()
            .filter_map(|hit| MatchRecord::from_match(&self.symbol, history, hit))
            .collect()
    }
}

/// Load every history in parallel. Failures are logged and kept so the
/// caller can count them.
pub fn load_histories(
    files: &[(String, PathBuf)],
) -> Vec<(String, Result<TickerHistory, DataError>)> {
    files
        .par_iter()
        .map(|(symbol, path)| {
            let loaded = load_history_csv(path);
            if let Err(err) = &loaded {
                warn!(ticker = %symbol, error = %err, "failed to load price history");
            }
            (symbol.clone(), loaded)
        })
        .collect()
}

/// Evaluate `filter` against every loaded history in parallel.
pub fn evaluate_histories(
    histories: &[(String, Result<TickerHistory, DataError>)],
    filter: &TickerFilter,
) -> Vec<TickerScan> {
    histories
        .par_iter()
        .map(|(symbol, loaded)| match loaded {
            Ok(history) => evaluate_one(symbol, history, filter),
            Err(err) => TickerScan {
                symbol: symbol.clone(),
                history: None,
                verdict: Verdict::Failed(err.to_string()),
            },
        })
        .collect()
}

fn evaluate_one(symbol: &str, history: &TickerHistory, filter: &TickerFilter) -> TickerScan {
    let verdict = match filter.evaluate(history) {
        Ok(Some(matches)) => {
            debug!(ticker = %symbol, criteria = matches.len(), "ticker kept");
            Verdict::Kept(matches)
        }
        Ok(None) => Verdict::Rejected,
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "scan aborted");
            Verdict::Failed(err.to_string())
        }
    };
    let history = matches!(verdict, Verdict::Kept(_)).then(|| history.clone());
    TickerScan {
        symbol: symbol.to_string(),
        history,
        verdict,
    }
}

/// Load and filter every `*.csv` under `dir`. Results are sorted by symbol.
pub fn scan_directory(dir: &Path, filter: &TickerFilter) -> Result<Vec<TickerScan>, DataError> {
    let files = list_csv_files(dir)?;
    info!(dir = %dir.display(), tickers = files.len(), "scanning price histories");
    let histories = load_histories(&files);
    Ok(evaluate_histories(&histories, filter))
}
