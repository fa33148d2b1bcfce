//! # Goodness of fit
//!
//! $$
//! S_n=\frac1n\sum_{i=1}^n\bigl(C_n(u_i,v_i)-C_\theta(u_i,v_i)\bigr)^2,\qquad
//! p\approx\frac{1}{1+S_n\sqrt n}
//! $$
//!
use super::Bivariate;
use super::CopulaError;
use super::PseudoObservations;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GofResult {
  pub statistic: f64,
  pub p_value: f64,
}

/// Heuristic p-value attached to a Cramer-von Mises statistic. It is a
/// monotone score, not a calibrated probability.
pub fn approximate_p_value(statistic: f64, n: usize) -> f64 {
  1.0 / (1.0 + statistic * (n as f64).sqrt())
}

/// Cramer-von Mises distance between the empirical copula and a fitted
/// model, evaluated at the sample points.
pub fn cramer_von_mises<C>(pobs: &PseudoObservations, copula: &C) -> Result<GofResult, CopulaError>
where
  C: Bivariate + ?Sized,
{
  if pobs.is_empty() {
    return Err(CopulaError::Empty);
  }

  let n = pobs.len();
  let model = copula.cdf(&pobs.as_array2())?;

  let sum_sq: f64 = pobs
    .u()
    .iter()
    .zip(pobs.v().iter())
    .zip(model.iter())
    .map(|((&u, &v), &c)| (pobs.empirical_cdf(u, v) - c).powi(2))
    .sum();
  let statistic = sum_sq / n as f64;

  if !statistic.is_finite() {
    return Err(CopulaError::Numerical(format!(
      "{} goodness-of-fit statistic is not finite",
      copula.family()
    )));
  }

  Ok(GofResult {
    statistic,
    p_value: approximate_p_value(statistic, n),
  })
}
