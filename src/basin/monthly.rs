//! # Monthly aggregation
//!
//! $$
//! P_m=\sum_{d\in m}p_d,\qquad R_m=\sum_{d\in m}r_d
//! $$
//!
//! Daily series are summed per calendar month and labelled by the last day
//! of the month. Months with no daily rows inside the observed span are
//! kept with zero sums.
//!
use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::config::PipelineConfig;
use super::io::read_basin_list;
use super::io::write_rows;
use super::BasinError;

const REQUIRED_COLUMNS: [&str; 3] = ["date", "prcp", "runoff"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRecord {
  pub date: NaiveDate,
  pub prcp: Option<f64>,
  pub runoff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
  /// Last day of the month.
  pub date: NaiveDate,
  /// `YYYY-MM`.
  pub year_month: String,
  pub prcp: f64,
  pub runoff: f64,
}

/// Months since year 0, so consecutive months differ by one.
fn month_key(date: NaiveDate) -> i32 {
  date.year() * 12 + date.month0() as i32
}

fn month_end(key: i32) -> Option<NaiveDate> {
  let (year, month0) = (key.div_euclid(12), key.rem_euclid(12) as u32);
  let (next_year, next_month) = if month0 == 11 {
    (year + 1, 1)
  } else {
    (year, month0 + 2)
  };
  NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

pub fn read_daily(path: &Path) -> Result<Vec<DailyRecord>, BasinError> {
  let mut reader = csv::Reader::from_path(path).map_err(|e| BasinError::input_read(path, e))?;

  let headers = reader
    .headers()
    .map_err(|e| BasinError::input_read(path, e))?
    .clone();
  if let Some(missing) = REQUIRED_COLUMNS
    .iter()
    .find(|c| !headers.iter().any(|h| h.trim() == **c))
  {
    return Err(BasinError::input_read(path, format!("missing column '{missing}'")));
  }

  reader
    .deserialize()
    .collect::<Result<Vec<DailyRecord>, _>>()
    .map_err(|e| BasinError::input_read(path, e))
}

/// Calendar-month sums. Missing daily values count as zero.
pub fn resample_monthly(records: &[DailyRecord]) -> Vec<MonthlyRecord> {
  let mut sums: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
  for record in records {
    let entry = sums.entry(month_key(record.date)).or_default();
    entry.0 += record.prcp.unwrap_or(0.0);
    entry.1 += record.runoff.unwrap_or(0.0);
  }

  let (Some(&first), Some(&last)) = (sums.keys().next(), sums.keys().next_back()) else {
    return Vec::new();
  };

  (first..=last)
    .filter_map(|key| {
      let date = month_end(key)?;
      let (prcp, runoff) = sums.get(&key).copied().unwrap_or_default();
      Some(MonthlyRecord {
        date,
        year_month: date.format("%Y-%m").to_string(),
        prcp,
        runoff,
      })
    })
    .collect()
}

/// Converts the daily file of one basin into its monthly analysis input.
/// Returns the number of months written.
pub fn preprocess_basin(cfg: &PipelineConfig, basin_id: &str) -> Result<usize, BasinError> {
  let input = cfg.daily_path(basin_id);
  let daily = read_daily(&input)?;
  let monthly = resample_monthly(&daily);
  if monthly.is_empty() {
    return Err(BasinError::InvalidSample {
      reason: format!("no daily records in {}", input.display()),
    });
  }

  write_rows(&cfg.input_path(basin_id), &monthly)?;
  Ok(monthly.len())
}

#[derive(Debug, Default)]
pub struct PreprocessSummary {
  pub succeeded: usize,
  pub failed: Vec<(String, BasinError)>,
}

/// Runs [`preprocess_basin`] for every basin of the list.
pub fn preprocess_all(cfg: &PipelineConfig) -> Result<PreprocessSummary, BasinError> {
  let basins = read_basin_list(&cfg.basin_list)?;
  info!(basins = basins.len(), "converting daily series to monthly");

  let mut summary = PreprocessSummary::default();
  for (i, basin_id) in basins.iter().enumerate() {
    match preprocess_basin(cfg, basin_id) {
      Ok(months) => {
        summary.succeeded += 1;
        debug!(basin_id = %basin_id, months, "monthly series written");
      }
      Err(err) => {
        warn!(basin_id = %basin_id, error = %err, "monthly preprocessing failed");
        summary.failed.push((basin_id.clone(), err));
      }
    }
    if (i + 1) % 100 == 0 {
      info!(processed = i + 1, total = basins.len(), "preprocessing progress");
    }
  }

  info!(
    succeeded = summary.succeeded,
    failed = summary.failed.len(),
    "monthly preprocessing finished"
  );
  Ok(summary)
}
