use thiserror::Error;

/// Failures raised by the window caches and the threshold scanner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("window capacity must be at least 1")]
    InvalidCapacity,

    #[error("multiplier must be a finite number greater than 1.0, got {0}")]
    InvalidMultiplier(f64),

    #[error("malformed observation at index {index}: {reason}")]
    MalformedObservation { index: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to read price history: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse date {0:?} (expected YYYY-MM-DD)")]
    Date(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
