use std::path::PathBuf;

use basin_dependence::basin::PipelineConfig;
use basin_dependence::copulas::bivariate::FrankEstimator;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

/// Copula dependence analysis between basin precipitation and runoff.
#[derive(Parser, Debug)]
#[command(name = "basin-dependence", version, about)]
pub struct Cli {
  /// Increase verbosity (-v info, -vv debug, -vvv trace).
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Path to a TOML configuration file.
  #[arg(short, long, global = true)]
  pub config: Option<PathBuf>,

  #[command(flatten)]
  pub overrides: Overrides,

  #[command(subcommand)]
  pub command: Command,
}

/// Command-line overrides of configuration values.
#[derive(clap::Args, Debug, Default)]
pub struct Overrides {
  /// Override the basin list file.
  #[arg(long, global = true)]
  pub basin_list: Option<PathBuf>,

  /// Override the monthly input directory.
  #[arg(long, global = true)]
  pub data_dir: Option<PathBuf>,

  /// Override the per-basin result directory.
  #[arg(long, global = true)]
  pub output_dir: Option<PathBuf>,

  /// Override the number of batch workers.
  #[arg(long, global = true)]
  pub workers: Option<usize>,

  /// Override the Frank parameter estimator.
  #[arg(long, global = true, value_enum)]
  pub frank_estimator: Option<EstimatorArg>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Analyse the basin at a 1-based position of the basin list.
  Analyze {
    /// 1-based index into the basin list.
    index: usize,
  },
  /// Analyse every basin of the list in parallel.
  Batch {
    /// Do not draw a progress bar.
    #[arg(long)]
    no_progress: bool,
  },
  /// Merge the per-basin result files and print a summary.
  Merge {
    /// Override the merged output file.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Convert daily series to the monthly analysis inputs.
  Monthly {
    /// Override the daily input directory.
    #[arg(long)]
    daily_dir: Option<PathBuf>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EstimatorArg {
  Linear,
  Debye,
}

impl From<EstimatorArg> for FrankEstimator {
  fn from(arg: EstimatorArg) -> Self {
    match arg {
      EstimatorArg::Linear => FrankEstimator::Linear,
      EstimatorArg::Debye => FrankEstimator::Debye,
    }
  }
}

impl Overrides {
  pub fn apply(&self, cfg: &mut PipelineConfig) {
    if let Some(path) = &self.basin_list {
      cfg.basin_list = path.clone();
    }
    if let Some(dir) = &self.data_dir {
      cfg.data_dir = dir.clone();
    }
    if let Some(dir) = &self.output_dir {
      cfg.output_dir = dir.clone();
    }
    if let Some(workers) = self.workers {
      cfg.workers = Some(workers);
    }
    if let Some(estimator) = self.frank_estimator {
      cfg.analysis.frank_estimator = estimator.into();
    }
  }
}
