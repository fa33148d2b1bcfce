//! # Frank
//!
//! $$
//! C_\theta(u,v)=-\frac{1}{\theta}\ln\!\left(1+\frac{(e^{-\theta u}-1)(e^{-\theta v}-1)}{e^{-\theta}-1}\right),\qquad
//! \tau=1-\frac{4}{\theta}\bigl(1-D_1(\theta)\bigr)
//! $$
//!
use gauss_quad::GaussLegendre;
use roots::find_root_brent;
use roots::SimpleConvergency;
use serde::Deserialize;
use serde::Serialize;

use super::clip_unit;
use super::gauss_legendre;
use super::Bivariate;
use super::CopulaFamily;
use super::CLIP_EPS;
use super::TAU_MAX;
use crate::copulas::CopulaError;

/// Below this |tau| the parameter is taken as exactly zero.
const TAU_ZERO: f64 = 0.001;

/// Slope of the small-tau approximation `theta = 5.7 tau`.
const LINEAR_SLOPE: f64 = 5.7;

/// The Debye integrand is below f64 resolution past this point.
const DEBYE_CUTOFF: f64 = 50.0;

/// How theta is obtained from Kendall's tau.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrankEstimator {
  /// `theta = 5.7 tau`.
  #[default]
  Linear,
  /// Exact inversion through the first Debye function.
  Debye,
}

pub fn theta_from_tau_linear(tau: f64) -> f64 {
  if tau.abs() < TAU_ZERO {
    0.0
  } else {
    LINEAR_SLOPE * tau
  }
}

fn debye1(rule: &GaussLegendre, theta: f64) -> f64 {
  let integrand = |t: f64| if t == 0.0 { 1.0 } else { t / t.exp_m1() };
  rule.integrate(0.0, theta.min(DEBYE_CUTOFF), integrand) / theta
}

fn tau_from_theta_with(rule: &GaussLegendre, theta: f64) -> f64 {
  if theta.abs() < CLIP_EPS {
    return 0.0;
  }
  // tau(-theta) = -tau(theta)
  let a = theta.abs();
  let tau = 1.0 - 4.0 / a * (1.0 - debye1(rule, a));
  tau.copysign(theta)
}

/// Kendall's tau of a Frank copula with parameter `theta`.
pub fn tau_from_theta(theta: f64) -> Result<f64, CopulaError> {
  Ok(tau_from_theta_with(gauss_legendre()?, theta))
}

/// Solves `tau(theta) = tau` with Brent's method.
pub fn theta_from_tau_debye(tau: f64) -> Result<f64, CopulaError> {
  if tau.abs() < TAU_ZERO {
    return Ok(0.0);
  }

  let rule = gauss_legendre()?;
  let target = tau.abs().min(TAU_MAX);
  let f = |theta: f64| tau_from_theta_with(rule, theta) - target;
  let mut convergency = SimpleConvergency {
    eps: 1e-12,
    max_iter: 200,
  };

  let upper = 8.0 / (1.0 - target) + 1.0;
  let theta = find_root_brent(1e-4, upper, f, &mut convergency)
    .map_err(|e| CopulaError::Numerical(format!("frank theta search: {e:?}")))?;

  Ok(theta.copysign(tau))
}

#[derive(Debug, Clone, Default)]
pub struct Frank {
  pub theta: Option<f64>,
  pub tau: Option<f64>,
  pub estimator: FrankEstimator,
}

impl Frank {
  pub fn new(theta: Option<f64>, tau: Option<f64>) -> Self {
    Self {
      theta,
      tau,
      estimator: FrankEstimator::default(),
    }
  }

  pub fn with_estimator(mut self, estimator: FrankEstimator) -> Self {
    self.estimator = estimator;
    self
  }
}

impl Bivariate for Frank {
  fn family(&self) -> CopulaFamily {
    CopulaFamily::Frank
  }

  fn tau(&self) -> Option<f64> {
    self.tau
  }

  fn set_tau(&mut self, tau: f64) {
    self.tau = Some(tau);
  }

  fn theta(&self) -> Option<f64> {
    self.theta
  }

  fn set_theta(&mut self, theta: f64) {
    self.theta = Some(theta);
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (f64::NEG_INFINITY, f64::INFINITY)
  }

  fn compute_theta(&self) -> Result<f64, CopulaError> {
    let tau = self.tau.ok_or(CopulaError::DegenerateTau)?;

    match self.estimator {
      FrankEstimator::Linear => Ok(theta_from_tau_linear(tau)),
      FrankEstimator::Debye => theta_from_tau_debye(tau),
    }
  }

  fn cdf_point(&self, theta: f64, u: f64, v: f64) -> Result<f64, CopulaError> {
    let u = clip_unit(u);
    let v = clip_unit(v);

    if theta.abs() < CLIP_EPS {
      return Ok(u * v);
    }

    let num = (-theta * u).exp_m1() * (-theta * v).exp_m1();
    let den = (-theta).exp_m1();
    Ok(-(num / den).ln_1p() / theta)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn linear_estimator_values() {
    assert_eq!(theta_from_tau_linear(0.0005), 0.0);
    assert_eq!(theta_from_tau_linear(-0.0009), 0.0);
    assert_relative_eq!(theta_from_tau_linear(0.5), 2.85, epsilon = 1e-12);
    assert_relative_eq!(theta_from_tau_linear(-0.2), -1.14, epsilon = 1e-12);
  }

  #[test]
  fn debye_estimator_inverts_kendall_tau() {
    assert_abs_diff_eq!(theta_from_tau_debye(0.5).unwrap(), 5.73628, epsilon = 1e-4);
    assert_abs_diff_eq!(theta_from_tau_debye(0.2).unwrap(), 1.86088, epsilon = 1e-4);
    assert_abs_diff_eq!(theta_from_tau_debye(-0.2).unwrap(), -1.86088, epsilon = 1e-4);
    assert_eq!(theta_from_tau_debye(0.0).unwrap(), 0.0);

    for tau in [-0.7, -0.1, 0.05, 0.35, 0.9] {
      let theta = theta_from_tau_debye(tau).unwrap();
      assert_abs_diff_eq!(tau_from_theta(theta).unwrap(), tau, epsilon = 1e-8);
    }
  }

  #[test]
  fn zero_theta_is_independence() {
    let copula = Frank::new(Some(0.0), None);
    assert_relative_eq!(copula.cdf_scalar(0.3, 0.6).unwrap(), 0.18, epsilon = 1e-12);
  }

  #[test]
  fn closed_form_value() {
    let theta: f64 = 3.0;
    let (u, v) = (0.25, 0.65);
    let expected = -1.0 / theta
      * (1.0
        + ((-theta * u).exp() - 1.0) * ((-theta * v).exp() - 1.0) / ((-theta).exp() - 1.0))
        .ln();
    let copula = Frank::new(Some(theta), None);
    assert_relative_eq!(copula.cdf_scalar(u, v).unwrap(), expected, epsilon = 1e-12);

    // negative dependence stays inside the Frechet bounds
    let copula = Frank::new(Some(-4.0), None);
    let c = copula.cdf_scalar(u, v).unwrap();
    assert!(c < u * v && c >= 0.0);
  }

  #[test]
  fn estimator_choice_changes_the_fit() {
    let x = array![[0.2, 0.2], [0.4, 0.6], [0.6, 0.4], [0.8, 0.8]];
    let mut linear = Frank::new(None, None);
    let mut exact = Frank::new(None, None).with_estimator(FrankEstimator::Debye);
    let a = linear.fit(&x).unwrap();
    let b = exact.fit(&x).unwrap();
    assert_relative_eq!(a, 5.7 * 2.0 / 3.0, epsilon = 1e-9);
    assert!(b > a);
  }

  #[test]
  fn estimator_names_deserialize_lowercase() {
    #[derive(Deserialize)]
    struct Wrapper {
      estimator: FrankEstimator,
    }
    let w: Wrapper = toml::from_str("estimator = \"debye\"").unwrap();
    assert_eq!(w.estimator, FrankEstimator::Debye);
  }
}
