use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::data::TickerHistory;
use crate::error::ScanError;
use crate::scanner::{ScanConfig, ScanMatch, scan_low_high, scan_values};

/// A filter applied to a ticker's price history.
pub trait Criterion: Send + Sync {
    fn name(&self) -> String;

    /// `Ok(Some(_))` when the history satisfies the criterion.
    fn evaluate(&self, history: &TickerHistory) -> Result<Option<ScanMatch>, ScanError>;
}

/// Daily high reaches `multiplier` times the lowest low of the trailing
/// `days` bars (current bar included).
#[derive(Debug, Clone, Copy)]
pub struct PriceMultiplied {
    pub config: ScanConfig,
}

impl Criterion for PriceMultiplied {
    fn name(&self) -> String {
        format!(
            "low_high:{}:{}",
            self.config.multiplier(),
            self.config.window()
        )
    }

    fn evaluate(&self, history: &TickerHistory) -> Result<Option<ScanMatch>, ScanError> {
        scan_low_high(history.low_high(), self.config)
    }
}

/// Adjusted close reaches `multiplier` times the lowest adjusted close of
/// the `days` bars before it.
#[derive(Debug, Clone, Copy)]
pub struct AdjCloseMultiplied {
    pub config: ScanConfig,
}

impl Criterion for AdjCloseMultiplied {
    fn name(&self) -> String {
        format!(
            "adj_close:{}:{}",
            self.config.multiplier(),
            self.config.window()
        )
    }

    fn evaluate(&self, history: &TickerHistory) -> Result<Option<ScanMatch>, ScanError> {
        scan_values(history.adj_closes(), self.config)
    }
}

#[derive(Error, Debug)]
pub enum CriterionError {
    #[error(
        "unknown criterion {0:?} (expected `double_price_within_a_week`, `low_high:<multiplier>:<days>` or `adj_close:<multiplier>:<days>`)"
    )]
    Unknown(String),

    #[error("invalid number {value:?} in criterion {spec:?}")]
    Number { spec: String, value: String },

    #[error("invalid criterion {spec:?}: {source}")]
    Config { spec: String, source: ScanError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    LowHigh,
    AdjClose,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::LowHigh => write!(f, "low_high"),
            SeriesKind::AdjClose => write!(f, "adj_close"),
        }
    }
}

/// Parsed form of a criterion name given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionSpec {
    pub series: SeriesKind,
    pub config: ScanConfig,
}

impl CriterionSpec {
    /// The classic short-squeeze definition: price doubles within a trading week.
    pub fn double_price_within_a_week() -> Self {
        Self {
            series: SeriesKind::LowHigh,
            config: ScanConfig::WEEKLY_DOUBLE,
        }
    }

    pub fn build(self) -> Box<dyn Criterion> {
        match self.series {
            SeriesKind::LowHigh => Box::new(PriceMultiplied {
                config: self.config,
            }),
            SeriesKind::AdjClose => Box::new(AdjCloseMultiplied {
                config: self.config,
            }),
        }
    }
}

impl FromStr for CriterionSpec {
    type Err = CriterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "double_price_within_a_week" {
            return Ok(Self::double_price_within_a_week());
        }

        let mut parts = s.split(':');
        let series = match parts.next() {
            Some("low_high") => SeriesKind::LowHigh,
            Some("adj_close") => SeriesKind::AdjClose,
            _ => return Err(CriterionError::Unknown(s.to_string())),
        };
        let (Some(multiplier), Some(days), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CriterionError::Unknown(s.to_string()));
        };

        let number_err = |value: &str| CriterionError::Number {
            spec: s.to_string(),
            value: value.to_string(),
        };
        let multiplier: f64 = multiplier.parse().map_err(|_| number_err(multiplier))?;
        let days: usize = days.parse().map_err(|_| number_err(days))?;

        let config = ScanConfig::new(multiplier, days).map_err(|source| CriterionError::Config {
            spec: s.to_string(),
            source,
        })?;
        Ok(Self { series, config })
    }
}

/// Criteria a ticker must satisfy, all of them, to be kept.
#[derive(Default)]
pub struct TickerFilter {
    criteria: Vec<Box<dyn Criterion>>,
}

impl TickerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: &[CriterionSpec]) -> Self {
        Self {
            criteria: specs.iter().map(|spec| spec.build()).collect(),
        }
    }

    pub fn add_criterion(&mut self, criterion: Box<dyn Criterion>) {
        self.criteria.push(criterion);
    }

    pub fn names(&self) -> Vec<String> {
        self.criteria.iter().map(|c| c.name()).collect()
    }

    /// The match of every criterion, or `None` as soon as one fails.
    /// Without criteria every ticker passes with an empty match list.
    pub fn evaluate(&self, history: &TickerHistory) -> Result<Option<Vec<ScanMatch>>, ScanError> {
        let mut matches = Vec::with_capacity(self.criteria.len());
        for criterion in &self.criteria {
            match criterion.evaluate(history)? {
                Some(hit) => matches.push(hit),
                None => return Ok(None),
            }
        }
        Ok(Some(matches))
    }
}
