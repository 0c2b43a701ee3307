use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::data::{TickerHistory, load_history_csv, store_history_csv};
use crate::error::DataError;

/// Storage for the histories of tickers that passed the filter.
pub trait TickerStore {
    fn store(&mut self, symbol: &str, history: &TickerHistory) -> Result<(), DataError>;

    /// Stored symbols, sorted.
    fn tickers(&self) -> Result<Vec<String>, DataError>;

    /// `Ok(None)` when `symbol` is not stored.
    fn get(&self, symbol: &str) -> Result<Option<TickerHistory>, DataError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTickerStore {
    histories: BTreeMap<String, TickerHistory>,
}

impl InMemoryTickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &BTreeMap<String, TickerHistory> {
        &self.histories
    }
}

impl TickerStore for InMemoryTickerStore {
    fn store(&mut self, symbol: &str, history: &TickerHistory) -> Result<(), DataError> {
        self.histories.insert(symbol.to_string(), history.clone());
        Ok(())
    }

    fn tickers(&self) -> Result<Vec<String>, DataError> {
        Ok(self.histories.keys().cloned().collect())
    }

    fn get(&self, symbol: &str) -> Result<Option<TickerHistory>, DataError> {
        Ok(self.histories.get(symbol).cloned())
    }
}

/// Keeps one `<SYMBOL>.csv` per ticker in a directory.
///
/// Attaching to a directory that already holds CSV files exposes them as
/// stored tickers. Storing a symbol that exists overwrites its file.
#[derive(Debug, Clone)]
pub struct FileBackedTickerStore {
    dir: PathBuf,
}

impl FileBackedTickerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl TickerStore for FileBackedTickerStore {
    fn store(&mut self, symbol: &str, history: &TickerHistory) -> Result<(), DataError> {
        let file = File::create(self.path_for(symbol))?;
        store_history_csv(history, BufWriter::new(file))
    }

    fn tickers(&self) -> Result<Vec<String>, DataError> {
        list_csv_files(&self.dir).map(|files| files.into_iter().map(|(symbol, _)| symbol).collect())
    }

    fn get(&self, symbol: &str) -> Result<Option<TickerHistory>, DataError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Ok(None);
        }
        load_history_csv(&path).map(Some)
    }
}

/// `(symbol, path)` for every `*.csv` in `dir`, sorted by symbol.
pub fn list_csv_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, DataError> {
    let entries = fs::read_dir(dir).map_err(|source| DataError::Open {
        path: dir.display().to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "csv") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_history;
    use crate::data::tests::GME_CSV;

    fn sample() -> TickerHistory {
        read_history(GME_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_in_memory_store_keeps_sorted_symbols() {
        let mut store = InMemoryTickerStore::new();
        store.store("GME", &sample()).unwrap();
        store.store("AMC", &TickerHistory::default()).unwrap();

        assert_eq!(store.tickers().unwrap(), vec!["AMC", "GME"]);
        assert_eq!(store.get("GME").unwrap(), Some(sample()));
        assert_eq!(store.get("TSLA").unwrap(), None);
        assert_eq!(store.data().len(), 2);
    }

    #[test]
    fn test_file_backed_store_round_trips_through_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBackedTickerStore::new(dir.path());

        store.store("GME", &sample()).unwrap();

        assert!(dir.path().join("GME.csv").is_file());
        assert_eq!(store.tickers().unwrap(), vec!["GME"]);
        assert_eq!(store.get("GME").unwrap(), Some(sample()));
        assert_eq!(store.get("AMC").unwrap(), None);
    }

    #[test]
    fn test_file_backed_store_attaches_to_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        for symbol in ["TSLA", "AMC", "GME"] {
            fs::write(dir.path().join(format!("{symbol}.csv")), GME_CSV).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a ticker").unwrap();

        let store = FileBackedTickerStore::new(dir.path());
        assert_eq!(store.tickers().unwrap(), vec!["AMC", "GME", "TSLA"]);
        assert_eq!(store.get("AMC").unwrap().map(|h| h.bars.len()), Some(4));
    }

    #[test]
    fn test_list_csv_files_reports_missing_directory() {
        let err = list_csv_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, DataError::Open { .. }));
    }
}
