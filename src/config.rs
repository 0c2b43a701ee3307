use serde::Deserialize;
use thiserror::Error;

use std::path::PathBuf;

use crate::criteria::{CriterionSpec, SeriesKind};
use crate::error::ScanError;
use crate::scanner::ScanConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file path is not valid UTF-8")]
    FilePathIntoString,

    #[error("failed to read config: {0}")]
    SettingsInit(String),

    #[error("failed to deserialize config: {0}")]
    Deserialize(String),

    #[error("`{0}` must not be empty")]
    Empty(&'static str),

    #[error("invalid combination multiplier={multiplier} days={days}: {source}")]
    Combination {
        multiplier: f64,
        days: usize,
        source: ScanError,
    },
}

fn default_label() -> String {
    "sweep".to_string()
}

/// Parameter sweep over every (multiplier, days) combination.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Directory with one `<SYMBOL>.csv` price history per ticker
    pub data_dir: PathBuf,

    /// Where the per-combination result CSVs are written
    pub output_dir: PathBuf,

    /// Price increase multipliers (e.g. [2, 3, 5])
    #[serde(default)]
    pub multipliers: Vec<f64>,

    /// Trailing window sizes in trading days (e.g. [5, 10])
    #[serde(default)]
    pub days: Vec<usize>,

    /// Which series the scanner runs over
    pub series: SeriesKind,

    /// Prefix for result file names
    #[serde(default = "default_label")]
    pub label: String,
}

impl SweepConfig {
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let filename = path
            .into_os_string()
            .into_string()
            .map_err(|_| ConfigError::FilePathIntoString)?;
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(&filename))
            .build()
            .map_err(|err| ConfigError::SettingsInit(err.to_string()))?
            .try_deserialize()
            .map_err(|err| ConfigError::Deserialize(err.to_string()))?;
        config.specs()?;
        Ok(config)
    }

    /// Every combination as a validated criterion, multipliers outermost.
    pub fn specs(&self) -> Result<Vec<CriterionSpec>, ConfigError> {
        if self.multipliers.is_empty() {
            return Err(ConfigError::Empty("multipliers"));
        }
        if self.days.is_empty() {
            return Err(ConfigError::Empty("days"));
        }

        let mut specs = Vec::with_capacity(self.multipliers.len() * self.days.len());
        for &multiplier in &self.multipliers {
            for &days in &self.days {
                let config = ScanConfig::new(multiplier, days).map_err(|source| {
                    ConfigError::Combination {
                        multiplier,
                        days,
                        source,
                    }
                })?;
                specs.push(CriterionSpec {
                    series: self.series,
                    config,
                });
            }
        }
        Ok(specs)
    }

    /// `<label>_multi_<m>_days_<d>.csv` inside `output_dir`.
    pub fn result_path(&self, spec: &CriterionSpec) -> PathBuf {
        self.output_dir.join(format!(
            "{}_multi_{}_days_{}.csv",
            self.label,
            spec.config.multiplier(),
            spec.config.window()
        ))
    }

    pub fn overview_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_overview.md", self.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("sweep.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_reads_toml_and_expands_combinations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
data_dir = "data"
output_dir = "results"
multipliers = [2.0, 5.0]
days = [5, 10]
series = "adj_close"
label = "nasdaq_min_1000"
"#,
        );

        let cfg = SweepConfig::load(path).unwrap();
        assert_eq!(cfg.series, SeriesKind::AdjClose);

        let specs = cfg.specs().unwrap();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[1].config.multiplier(), 2.0);
        assert_eq!(specs[1].config.window(), 10);
        assert_eq!(
            cfg.result_path(&specs[2]),
            PathBuf::from("results/nasdaq_min_1000_multi_5_days_5.csv")
        );
    }

    #[test]
    fn test_load_defaults_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
data_dir = "data"
output_dir = "results"
multipliers = [2.0]
days = [5]
series = "low_high"
"#,
        );
        let cfg = SweepConfig::load(path).unwrap();
        assert_eq!(cfg.label, "sweep");
        assert_eq!(cfg.overview_path(), PathBuf::from("results/sweep_overview.md"));
    }

    #[test]
    fn test_load_rejects_invalid_multiplier() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
data_dir = "data"
output_dir = "results"
multipliers = [1.0]
days = [5]
series = "low_high"
"#,
        );
        let err = SweepConfig::load(path).unwrap_err();
        assert!(matches!(err, ConfigError::Combination { days: 5, .. }));
    }

    #[test]
    fn test_load_rejects_empty_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
data_dir = "data"
output_dir = "results"
multipliers = [2.0]
days = []
series = "low_high"
"#,
        );
        let err = SweepConfig::load(path).unwrap_err();
        assert!(matches!(err, ConfigError::Empty("days")));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = SweepConfig::load(PathBuf::from("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::SettingsInit(_)));
    }
}
