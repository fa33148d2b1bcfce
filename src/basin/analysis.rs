//! # Basin analysis
//!
//! $$
//! (P,R)\;\to\;(u,v)=\tfrac{1}{n+1}\bigl(\operatorname{rank}P,\operatorname{rank}R\bigr)
//! \;\to\;\rho_S,\tau,\chi_U,\chi_L,\hat C
//! $$
//!
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use super::config::AnalysisConfig;
use super::io::read_paired_sample;
use super::BasinError;
use crate::copulas::correlation::kendall;
use crate::copulas::correlation::spearman;
use crate::copulas::selection::fit_all;
use crate::copulas::selection::select_best;
use crate::copulas::tail::tail_dependence;
use crate::copulas::CopulaFamily;
use crate::copulas::PseudoObservations;

/// Precipitation and runoff paired by row.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedSample {
  prcp: Vec<f64>,
  runoff: Vec<f64>,
}

impl PairedSample {
  pub fn new(prcp: Vec<f64>, runoff: Vec<f64>) -> Result<Self, BasinError> {
    if prcp.len() != runoff.len() {
      return Err(BasinError::InvalidSample {
        reason: format!("{} precipitation vs {} runoff values", prcp.len(), runoff.len()),
      });
    }
    if prcp.is_empty() {
      return Err(BasinError::InvalidSample {
        reason: "no observations".into(),
      });
    }
    if let Some(row) = prcp
      .iter()
      .zip(&runoff)
      .position(|(p, r)| !p.is_finite() || !r.is_finite())
    {
      return Err(BasinError::InvalidSample {
        reason: format!("non-finite value in row {row}"),
      });
    }

    Ok(Self { prcp, runoff })
  }

  pub fn prcp(&self) -> &[f64] {
    &self.prcp
  }

  pub fn runoff(&self) -> &[f64] {
    &self.runoff
  }

  pub fn len(&self) -> usize {
    self.prcp.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prcp.is_empty()
  }
}

/// One row of the results table. Empty cells mark undefined values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasinResult {
  pub basin_id: String,
  pub n_months: usize,
  pub spearman_rho: Option<f64>,
  pub spearman_pvalue: Option<f64>,
  pub kendall_tau: Option<f64>,
  pub kendall_pvalue: Option<f64>,
  pub chi_upper: Option<f64>,
  pub chi_lower: Option<f64>,
  pub best_copula: Option<CopulaFamily>,
  pub copula_parameter: Option<f64>,
  pub copula_gof_statistic: Option<f64>,
  pub copula_gof_pvalue: Option<f64>,
}

pub fn analyze_sample(
  basin_id: &str,
  sample: &PairedSample,
  cfg: &AnalysisConfig,
) -> Result<BasinResult, BasinError> {
  let n = sample.len();
  info!(basin_id, n_months = n, "analysing basin");

  let spearman = spearman(sample.prcp(), sample.runoff());
  let kendall = kendall(sample.prcp(), sample.runoff());

  let pobs = PseudoObservations::from_series(sample.prcp(), sample.runoff()).map_err(|e| {
    BasinError::InvalidSample {
      reason: e.to_string(),
    }
  })?;
  let tail = tail_dependence(&pobs, cfg.tail_quantile);

  let outcomes = fit_all(&pobs, cfg.frank_estimator);
  let best = select_best(&outcomes);

  match &best {
    Some(fitted) => info!(
      basin_id,
      copula = %fitted.family,
      parameter = fitted.parameter,
      p_value = fitted.gof.p_value,
      "best copula selected"
    ),
    None => info!(basin_id, "no copula family could be fitted"),
  }

  Ok(BasinResult {
    basin_id: basin_id.to_string(),
    n_months: n,
    spearman_rho: spearman.statistic,
    spearman_pvalue: spearman.p_value,
    kendall_tau: kendall.statistic,
    kendall_pvalue: kendall.p_value,
    chi_upper: tail.upper,
    chi_lower: tail.lower,
    best_copula: best.map(|f| f.family),
    copula_parameter: best.map(|f| f.parameter),
    copula_gof_statistic: best.map(|f| f.gof.statistic),
    copula_gof_pvalue: best.map(|f| f.gof.p_value),
  })
}

/// Reads the sample at `path` and analyses it.
pub fn analyze_basin(
  basin_id: &str,
  path: &Path,
  cfg: &AnalysisConfig,
) -> Result<BasinResult, BasinError> {
  let sample = read_paired_sample(path)?;
  analyze_sample(basin_id, &sample, cfg)
}
