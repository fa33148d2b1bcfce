mod cli;

use std::process;

use anyhow::Context;
use anyhow::Result;
use basin_dependence::basin::batch::run_batch;
use basin_dependence::basin::batch::run_index;
use basin_dependence::basin::merge::merge_results;
use basin_dependence::basin::merge::ResultSummary;
use basin_dependence::basin::monthly::preprocess_all;
use basin_dependence::basin::BasinError;
use basin_dependence::basin::PipelineConfig;
use basin_dependence::logging;
use clap::Parser;
use tracing::error;

use crate::cli::Cli;
use crate::cli::Command;

/// Exit status when some basins of a batch failed.
const EXIT_PARTIAL_BATCH: i32 = 6;

fn main() {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let code = match run(cli) {
    Ok(code) => code,
    Err(e) => {
      error!("{e:#}");
      exit_code(&e)
    }
  };
  process::exit(code);
}

fn exit_code(e: &anyhow::Error) -> i32 {
  e.downcast_ref::<BasinError>()
    .map_or(1, BasinError::exit_code)
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
  let mut cfg = match &cli.config {
    Some(path) => PipelineConfig::load(path)?,
    None => PipelineConfig::default(),
  };
  cli.overrides.apply(&mut cfg);
  cfg.validate()?;
  Ok(cfg)
}

fn run(cli: Cli) -> Result<i32> {
  let mut cfg = load_config(&cli)?;

  match cli.command {
    Command::Analyze { index } => {
      let result = run_index(&cfg, index).with_context(|| format!("basin index {index}"))?;
      println!(
        "{}: best copula {}",
        result.basin_id,
        result
          .best_copula
          .map_or_else(|| "none".to_string(), |f| f.to_string())
      );
      Ok(0)
    }
    Command::Batch { no_progress } => {
      let summary = run_batch(&cfg, !no_progress)?;
      println!(
        "{} basins succeeded, {} failed",
        summary.succeeded,
        summary.failed.len()
      );
      for failure in &summary.failed {
        eprintln!(
          "  #{} {}: {}",
          failure.position + 1,
          failure.basin_id,
          failure.error
        );
      }
      Ok(if summary.is_success() { 0 } else { EXIT_PARTIAL_BATCH })
    }
    Command::Merge { output } => {
      if let Some(path) = output {
        cfg.merged_output = path;
      }
      let merged = merge_results(&cfg.output_dir, &cfg.merged_output)?;
      println!(
        "merged {} basins from {} files into {}",
        merged.results.len(),
        merged.files.len(),
        cfg.merged_output.display()
      );
      ResultSummary::from_results(&merged.results)
        .to_table()
        .printstd();
      Ok(0)
    }
    Command::Monthly { daily_dir } => {
      if let Some(dir) = daily_dir {
        cfg.daily_dir = dir;
      }
      let summary = preprocess_all(&cfg)?;
      println!(
        "{} basins converted, {} failed",
        summary.succeeded,
        summary.failed.len()
      );
      for (basin_id, err) in summary.failed.iter().take(10) {
        eprintln!("  {basin_id}: {err}");
      }
      if summary.failed.len() > 10 {
        eprintln!("  ... and {} more", summary.failed.len() - 10);
      }
      Ok(if summary.failed.is_empty() { 0 } else { EXIT_PARTIAL_BATCH })
    }
  }
}
