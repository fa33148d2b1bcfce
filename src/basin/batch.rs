//! Per-index invocation and the parallel batch driver.

use std::thread;

use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::error;
use tracing::info;

use super::analysis::analyze_basin;
use super::analysis::BasinResult;
use super::config::PipelineConfig;
use super::io::read_basin_list;
use super::io::write_result;
use super::BasinError;

/// Maps a 1-based `index` onto `basins`, returning the zero-based position
/// and the identifier.
pub fn resolve_index(basins: &[String], index: usize) -> Result<(usize, &str), BasinError> {
  match index.checked_sub(1).and_then(|i| basins.get(i).map(|id| (i, id))) {
    Some((position, id)) => Ok((position, id.as_str())),
    None => Err(BasinError::IndexOutOfRange {
      index,
      len: basins.len(),
    }),
  }
}

/// Analyses the basin at zero-based `position` and writes its record.
pub fn run_single(
  cfg: &PipelineConfig,
  position: usize,
  basin_id: &str,
) -> Result<BasinResult, BasinError> {
  let input = cfg.input_path(basin_id);
  let result = analyze_basin(basin_id, &input, &cfg.analysis)?;

  let output = cfg.output_path(position);
  write_result(&output, &result)?;
  info!(basin_id, output = %output.display(), "result written");

  Ok(result)
}

/// The `analyze <INDEX>` entry point.
pub fn run_index(cfg: &PipelineConfig, index: usize) -> Result<BasinResult, BasinError> {
  let basins = read_basin_list(&cfg.basin_list)?;
  let (position, basin_id) = resolve_index(&basins, index)?;
  run_single(cfg, position, basin_id)
}

#[derive(Debug)]
pub struct BasinFailure {
  pub position: usize,
  pub basin_id: String,
  pub error: BasinError,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
  pub succeeded: usize,
  pub failed: Vec<BasinFailure>,
}

impl BatchSummary {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
  if !visible {
    return ProgressBar::hidden();
  }

  let bar = ProgressBar::new(len as u64);
  if let Ok(style) = ProgressStyle::default_bar()
    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
  {
    bar.set_style(style.progress_chars("=>-"));
  }
  bar
}

/// Runs every basin of the list on a bounded pool. A failing basin is
/// recorded in the summary and never stops the others.
pub fn run_batch(cfg: &PipelineConfig, show_progress: bool) -> Result<BatchSummary, BasinError> {
  let basins = read_basin_list(&cfg.basin_list)?;
  let workers = cfg
    .workers
    .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

  let pool = ThreadPoolBuilder::new()
    .num_threads(workers)
    .build()
    .map_err(|e| BasinError::Config {
      reason: format!("cannot start {workers} workers: {e}"),
    })?;

  info!(basins = basins.len(), workers, "starting batch");
  let bar = progress_bar(basins.len(), show_progress);

  let outcomes: Vec<(usize, &String, Result<BasinResult, BasinError>)> = pool.install(|| {
    basins
      .par_iter()
      .enumerate()
      .map(|(position, basin_id)| {
        let outcome = run_single(cfg, position, basin_id);
        bar.inc(1);
        (position, basin_id, outcome)
      })
      .collect()
  });
  bar.finish_and_clear();

  let mut summary = BatchSummary::default();
  for (position, basin_id, outcome) in outcomes {
    match outcome {
      Ok(_) => summary.succeeded += 1,
      Err(err) => {
        error!(basin_id = %basin_id, position, error = %err, "basin failed");
        summary.failed.push(BasinFailure {
          position,
          basin_id: basin_id.clone(),
          error: err,
        });
      }
    }
  }

  info!(
    succeeded = summary.succeeded,
    failed = summary.failed.len(),
    "batch finished"
  );
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids() -> Vec<String> {
    ["a", "b", "c"].iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn resolve_is_one_based() {
    let basins = ids();
    assert_eq!(resolve_index(&basins, 1).unwrap(), (0, "a"));
    assert_eq!(resolve_index(&basins, 3).unwrap(), (2, "c"));
  }

  #[test]
  fn resolve_out_of_range() {
    let basins = ids();
    for index in [0, 4, 100] {
      let err = resolve_index(&basins, index).unwrap_err();
      assert!(matches!(err, BasinError::IndexOutOfRange { len: 3, .. }), "{index}");
    }
    assert!(resolve_index(&[], 1).is_err());
  }

  #[test]
  fn summary_success_flag() {
    let mut summary = BatchSummary::default();
    assert!(summary.is_success());
    summary.failed.push(BasinFailure {
      position: 0,
      basin_id: "a".into(),
      error: BasinError::InvalidSample { reason: "x".into() },
    });
    assert!(!summary.is_success());
  }
}
