//! # Selection
//!
//! $$
//! \hat C=\operatorname*{arg\,min}_{C\in\{\text{Gaussian},\text{Clayton},\text{Gumbel},\text{Frank}\}} S_n(C)
//! $$
//!
use tracing::debug;
use tracing::warn;

use super::bivariate::FrankEstimator;
use super::gof::cramer_von_mises;
use super::gof::GofResult;
use super::Copula;
use super::CopulaError;
use super::CopulaFamily;
use super::PseudoObservations;

/// A family that fitted and scored successfully.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedCopula {
  pub family: CopulaFamily,
  pub parameter: f64,
  pub gof: GofResult,
}

/// The fit attempt of one family, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOutcome {
  pub family: CopulaFamily,
  pub outcome: Result<FittedCopula, CopulaError>,
}

pub fn fit_family(
  pobs: &PseudoObservations,
  family: CopulaFamily,
  estimator: FrankEstimator,
) -> Result<FittedCopula, CopulaError> {
  let mut copula = Copula::new(family, estimator);
  let parameter = copula.fit(&pobs.as_array2())?;
  let gof = cramer_von_mises(pobs, copula.as_bivariate())?;

  Ok(FittedCopula {
    family,
    parameter,
    gof,
  })
}

/// Fits every family in evaluation order. Failures are logged and kept.
pub fn fit_all(pobs: &PseudoObservations, estimator: FrankEstimator) -> Vec<FamilyOutcome> {
  CopulaFamily::ALL
    .into_iter()
    .map(|family| {
      let outcome = fit_family(pobs, family, estimator);
      match &outcome {
        Ok(fitted) => debug!(
          family = %family,
          parameter = fitted.parameter,
          statistic = fitted.gof.statistic,
          "copula fitted"
        ),
        Err(err) => warn!(family = %family, error = %err, "copula fit failed"),
      }
      FamilyOutcome { family, outcome }
    })
    .collect()
}

/// Lowest statistic wins; on an exact tie the earlier family is kept.
pub fn select_best(outcomes: &[FamilyOutcome]) -> Option<FittedCopula> {
  let mut best: Option<FittedCopula> = None;

  for fitted in outcomes.iter().filter_map(|o| o.outcome.as_ref().ok()) {
    let better = best.map_or(true, |current| fitted.gof.statistic < current.gof.statistic);
    if better {
      best = Some(*fitted);
    }
  }

  best
}
