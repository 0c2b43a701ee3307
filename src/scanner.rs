use crate::error::ScanError;
use crate::window::{Comparator, OrderedWindowCache, ascending, descending};

/// Multiplier and trailing window shared by both scan variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    multiplier: f64,
    window: usize,
}

impl ScanConfig {
    /// Price doubles within a trading week.
    pub const WEEKLY_DOUBLE: ScanConfig = ScanConfig {
        multiplier: 2.0,
        window: 5,
    };

    /// `multiplier` must be finite and > 1.0, `window` at least one observation.
    pub fn new(multiplier: f64, window: usize) -> Result<Self, ScanError> {
        if !multiplier.is_finite() || multiplier <= 1.0 {
            return Err(ScanError::InvalidMultiplier(multiplier));
        }
        if window == 0 {
            return Err(ScanError::InvalidCapacity);
        }
        Ok(Self { multiplier, window })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

/// One step of the dual-series variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowHigh {
    pub low: f64,
    pub high: f64,
}

impl LowHigh {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn validate(&self, index: usize) -> Result<(), ScanError> {
        let reason = if !self.low.is_finite() || !self.high.is_finite() {
            Some(format!("non-finite low/high ({}, {})", self.low, self.high))
        } else if self.low < 0.0 {
            Some(format!("negative low {}", self.low))
        } else if self.high < self.low {
            Some(format!("high {} below low {}", self.high, self.low))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ScanError::MalformedObservation { index, reason }),
            None => Ok(()),
        }
    }
}

fn validate_value(value: f64, index: usize) -> Result<(), ScanError> {
    if !value.is_finite() {
        return Err(ScanError::MalformedObservation {
            index,
            reason: format!("non-finite value {value}"),
        });
    }
    if value < 0.0 {
        return Err(ScanError::MalformedObservation {
            index,
            reason: format!("negative value {value}"),
        });
    }
    Ok(())
}

/// Where and by how much the threshold was crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanMatch {
    /// Position of the triggering observation in the input sequence.
    pub index: usize,
    /// Window minimum the move is measured from.
    pub extreme: f64,
    /// Value that reached `extreme * multiplier`.
    pub trigger: f64,
    /// `trigger / extreme` (infinite when the baseline is zero).
    pub ratio: f64,
}

impl ScanMatch {
    fn new(index: usize, extreme: f64, trigger: f64) -> Self {
        Self {
            index,
            extreme,
            trigger,
            ratio: trigger / extreme,
        }
    }
}

/// Incremental form of the dual-series scan.
///
/// Tracks the window minimum of the lows and the window maximum of the highs;
/// the current step is part of the window it is compared against.
#[derive(Debug, Clone)]
pub struct LowHighWindow {
    config: ScanConfig,
    lows: OrderedWindowCache<f64>,
    highs: OrderedWindowCache<f64>,
    index: usize,
}

impl LowHighWindow {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let lows = OrderedWindowCache::<f64, Comparator<f64>>::new(config.window, ascending)?;
        let highs = OrderedWindowCache::<f64, Comparator<f64>>::new(config.window, descending)?;
        Ok(Self {
            config,
            lows,
            highs,
            index: 0,
        })
    }

    /// Feed the next observation; `Some` when `min_low * multiplier <= max_high`.
    pub fn push(&mut self, obs: LowHigh) -> Result<Option<ScanMatch>, ScanError> {
        let index = self.index;
        obs.validate(index)?;
        self.index += 1;

        self.lows.add(obs.low);
        self.highs.add(obs.high);

        let (Some(&min_low), Some(&max_high)) = (self.lows.first(), self.highs.first()) else {
            return Ok(None);
        };

        if min_low * self.config.multiplier <= max_high {
            Ok(Some(ScanMatch::new(index, min_low, max_high)))
        } else {
            Ok(None)
        }
    }
}

/// Incremental form of the single-series scan.
///
/// Each value is compared with the minimum of the values before it, then
/// joins the window.
#[derive(Debug, Clone)]
pub struct ValueWindow {
    config: ScanConfig,
    values: OrderedWindowCache<f64>,
    index: usize,
}

impl ValueWindow {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let values = OrderedWindowCache::<f64, Comparator<f64>>::new(config.window, ascending)?;
        Ok(Self {
            config,
            values,
            index: 0,
        })
    }

    /// Feed the next value; `Some` when `value >= multiplier * baseline`.
    pub fn push(&mut self, value: f64) -> Result<Option<ScanMatch>, ScanError> {
        let index = self.index;
        validate_value(value, index)?;
        self.index += 1;

        // Baseline is read before the value is inserted.
        let hit = self
            .values
            .first()
            .copied()
            .filter(|&baseline| value >= self.config.multiplier * baseline)
            .map(|baseline| ScanMatch::new(index, baseline, value));

        self.values.add(value);
        Ok(hit)
    }
}

/// Dual-series scan: first step at which the trailing window's minimum low,
/// multiplied by `config.multiplier()`, is at most its maximum high.
pub fn scan_low_high<I>(observations: I, config: ScanConfig) -> Result<Option<ScanMatch>, ScanError>
where
    I: IntoIterator<Item = LowHigh>,
{
    let mut window = LowHighWindow::new(config)?;
    for obs in observations {
        if let Some(hit) = window.push(obs)? {
            return Ok(Some(hit));
        }
    }
    Ok(None)
}

/// Single-series scan: first value that is at least `config.multiplier()`
/// times the minimum of the preceding `config.window()` values.
pub fn scan_values<I>(values: I, config: ScanConfig) -> Result<Option<ScanMatch>, ScanError>
where
    I: IntoIterator<Item = f64>,
{
    let mut window = ValueWindow::new(config)?;
    for value in values {
        if let Some(hit) = window.push(value)? {
            return Ok(Some(hit));
        }
    }
    Ok(None)
}
