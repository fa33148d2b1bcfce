//! Pipeline configuration.
//!
//! Loaded once from TOML, optionally overridden from the command line, and
//! passed by reference into every stage.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::BasinError;
use crate::copulas::bivariate::FrankEstimator;
use crate::copulas::tail::DEFAULT_TAIL_QUANTILE;

/// Settings that change the numbers in a result record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
  /// Quantile `q` of the tail coefficients.
  #[serde(default = "default_tail_quantile")]
  pub tail_quantile: f64,

  /// How the Frank parameter is derived from Kendall's tau.
  #[serde(default)]
  pub frank_estimator: FrankEstimator,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      tail_quantile: default_tail_quantile(),
      frank_estimator: FrankEstimator::default(),
    }
  }
}

impl AnalysisConfig {
  pub fn validate(&self) -> Result<(), BasinError> {
    let q = self.tail_quantile;
    if !(q > 0.5 && q < 1.0) {
      return Err(BasinError::Config {
        reason: format!("tail_quantile must be in (0.5, 1), got {q}"),
      });
    }
    Ok(())
  }
}

fn default_tail_quantile() -> f64 {
  DEFAULT_TAIL_QUANTILE
}

/// File layout and execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
  /// Ordered basin identifiers, one per line.
  #[serde(default = "default_basin_list")]
  pub basin_list: PathBuf,

  /// Monthly `{id}.csv` inputs of the analysis.
  #[serde(default = "default_data_dir")]
  pub data_dir: PathBuf,

  /// Daily `{id}.csv` inputs of the monthly preprocessing.
  #[serde(default = "default_daily_dir")]
  pub daily_dir: PathBuf,

  /// Per-basin `basin_NNNN.csv` results.
  #[serde(default = "default_output_dir")]
  pub output_dir: PathBuf,

  /// Merged table written by `merge`.
  #[serde(default = "default_merged_output")]
  pub merged_output: PathBuf,

  /// Batch worker threads. Defaults to the available parallelism.
  #[serde(default)]
  pub workers: Option<usize>,

  #[serde(default)]
  pub analysis: AnalysisConfig,
}

fn default_basin_list() -> PathBuf {
  PathBuf::from("basins.txt")
}
fn default_data_dir() -> PathBuf {
  PathBuf::from("data/monthly")
}
fn default_daily_dir() -> PathBuf {
  PathBuf::from("data/daily")
}
fn default_output_dir() -> PathBuf {
  PathBuf::from("results/basins")
}
fn default_merged_output() -> PathBuf {
  PathBuf::from("results/all_basins_results.csv")
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      basin_list: default_basin_list(),
      data_dir: default_data_dir(),
      daily_dir: default_daily_dir(),
      output_dir: default_output_dir(),
      merged_output: default_merged_output(),
      workers: None,
      analysis: AnalysisConfig::default(),
    }
  }
}

impl PipelineConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, BasinError> {
    let cfg: Self = toml::from_str(s).map_err(|e| BasinError::Config {
      reason: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn load(path: &Path) -> Result<Self, BasinError> {
    let text = fs::read_to_string(path).map_err(|e| BasinError::Config {
      reason: format!("{}: {e}", path.display()),
    })?;
    Self::from_toml_str(&text)
  }

  pub fn validate(&self) -> Result<(), BasinError> {
    self.analysis.validate()?;
    if self.workers == Some(0) {
      return Err(BasinError::Config {
        reason: "workers must be at least 1".into(),
      });
    }
    Ok(())
  }

  /// Monthly input of basin `basin_id`.
  pub fn input_path(&self, basin_id: &str) -> PathBuf {
    self.data_dir.join(format!("{basin_id}.csv"))
  }

  /// Daily input of basin `basin_id`.
  pub fn daily_path(&self, basin_id: &str) -> PathBuf {
    self.daily_dir.join(format!("{basin_id}.csv"))
  }

  /// Result file of the basin at zero-based position `index`.
  pub fn output_path(&self, index: usize) -> PathBuf {
    self.output_dir.join(format!("basin_{index:04}.csv"))
  }
}
