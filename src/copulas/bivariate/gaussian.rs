//! # Gaussian
//!
//! $$
//! C_\rho(u,v)=\Phi_2\!\left(\Phi^{-1}(u),\Phi^{-1}(v);\rho\right)
//! $$
//!
//! $$
//! \Phi_2(h,k;\rho)=\Phi(h)\Phi(k)+\frac{1}{2\pi}\int_0^{\arcsin\rho}
//! \exp\!\left(-\frac{h^2+k^2-2hk\sin t}{2\cos^2 t}\right)dt
//! $$
//!
use std::f64::consts::PI;

use ndarray::Array2;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use super::check_shape;
use super::clip_unit;
use super::gauss_legendre;
use super::Bivariate;
use super::CopulaFamily;
use crate::copulas::correlation::pearson;
use crate::copulas::CopulaError;

fn standard_normal() -> Result<Normal, CopulaError> {
  Normal::new(0.0, 1.0).map_err(|e| CopulaError::Numerical(e.to_string()))
}

/// Standard normal quantile of the clipped value.
fn normal_score(normal: &Normal, p: f64) -> f64 {
  normal.inverse_cdf(clip_unit(p))
}

/// Bivariate standard normal CDF `P(X <= h, Y <= k)` with correlation `rho`.
pub fn bivariate_normal_cdf(h: f64, k: f64, rho: f64) -> Result<f64, CopulaError> {
  let normal = standard_normal()?;

  if rho >= 1.0 {
    return Ok(normal.cdf(h.min(k)));
  }
  if rho <= -1.0 {
    return Ok((normal.cdf(h) + normal.cdf(k) - 1.0).max(0.0));
  }

  let independent = normal.cdf(h) * normal.cdf(k);
  if rho == 0.0 {
    return Ok(independent);
  }

  let integrand = |t: f64| {
    let (sin, cos) = t.sin_cos();
    (-(h * h + k * k - 2.0 * h * k * sin) / (2.0 * cos * cos)).exp()
  };
  let integral = gauss_legendre()?.integrate(0.0, rho.asin(), integrand);

  Ok((independent + integral / (2.0 * PI)).clamp(0.0, 1.0))
}

#[derive(Debug, Clone, Default)]
pub struct Gaussian {
  pub rho: Option<f64>,
  pub tau: Option<f64>,
}

impl Gaussian {
  pub fn new(rho: Option<f64>) -> Self {
    Self { rho, tau: None }
  }
}

impl Bivariate for Gaussian {
  fn family(&self) -> CopulaFamily {
    CopulaFamily::Gaussian
  }

  fn tau(&self) -> Option<f64> {
    self.tau
  }

  fn set_tau(&mut self, tau: f64) {
    self.tau = Some(tau);
  }

  fn theta(&self) -> Option<f64> {
    self.rho
  }

  fn set_theta(&mut self, theta: f64) {
    self.rho = Some(theta);
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (-1.0, 1.0)
  }

  /// Not used: the parameter comes from the normal scores in [`Self::fit`].
  fn compute_theta(&self) -> Result<f64, CopulaError> {
    Err(CopulaError::Numerical(
      "Gaussian correlation is estimated from normal scores, not from tau".into(),
    ))
  }

  /// Pearson correlation of the normal scores.
  fn fit(&mut self, x: &Array2<f64>) -> Result<f64, CopulaError> {
    check_shape(x)?;
    let normal = standard_normal()?;

    let scores = x.mapv(|p| normal_score(&normal, p));
    let rho = pearson(&scores.column(0).to_vec(), &scores.column(1).to_vec())
      .ok_or(CopulaError::DegenerateMargin)?;

    self.set_theta(rho);
    self.check_theta()
  }

  fn cdf_point(&self, theta: f64, u: f64, v: f64) -> Result<f64, CopulaError> {
    let normal = standard_normal()?;
    bivariate_normal_cdf(normal_score(&normal, u), normal_score(&normal, v), theta)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn bivariate_normal_known_values() {
    // P(X <= 0, Y <= 0) = 1/4 + asin(rho) / (2 pi)
    for rho in [-0.9, -0.5, 0.3, 0.8, 0.99] {
      let expected = 0.25 + f64::asin(rho) / (2.0 * PI);
      assert_abs_diff_eq!(bivariate_normal_cdf(0.0, 0.0, rho).unwrap(), expected, epsilon = 1e-10);
    }
    assert_abs_diff_eq!(bivariate_normal_cdf(0.0, 0.0, 0.0).unwrap(), 0.25, epsilon = 1e-15);
  }

  #[test]
  fn bivariate_normal_degenerate_correlations() {
    let normal = Normal::new(0.0, 1.0).unwrap();
    assert_abs_diff_eq!(
      bivariate_normal_cdf(0.3, -0.4, 1.0).unwrap(),
      normal.cdf(-0.4),
      epsilon = 1e-15
    );
    assert_abs_diff_eq!(
      bivariate_normal_cdf(0.3, 0.4, -1.0).unwrap(),
      normal.cdf(0.3) + normal.cdf(0.4) - 1.0,
      epsilon = 1e-15
    );
    assert_eq!(bivariate_normal_cdf(-1.0, -1.0, -1.0).unwrap(), 0.0);
  }

  #[test]
  fn bivariate_normal_is_symmetric_and_monotone_in_rho() {
    let a = bivariate_normal_cdf(0.7, -0.2, 0.45).unwrap();
    let b = bivariate_normal_cdf(-0.2, 0.7, 0.45).unwrap();
    assert_abs_diff_eq!(a, b, epsilon = 1e-14);

    let mut last = 0.0;
    for rho in [-0.8, -0.4, 0.0, 0.4, 0.8] {
      let p = bivariate_normal_cdf(0.5, 0.5, rho).unwrap();
      assert!(p > last);
      last = p;
    }
  }

  #[test]
  fn fit_recovers_perfect_dependence() {
    let x = array![[0.2, 0.2], [0.4, 0.4], [0.6, 0.6], [0.8, 0.8]];
    let mut copula = Gaussian::new(None);
    assert_abs_diff_eq!(copula.fit(&x).unwrap(), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn constant_margin_fails_to_fit() {
    let x = array![[0.2, 0.5], [0.4, 0.5], [0.6, 0.5]];
    let mut copula = Gaussian::new(None);
    assert_eq!(copula.fit(&x), Err(CopulaError::DegenerateMargin));
    assert_eq!(copula.parameter(), None);
  }

  #[test]
  fn tau_path_is_rejected() {
    let mut copula = Gaussian::new(None);
    copula.set_tau(1.0 / 3.0);
    assert!(matches!(copula.compute_theta(), Err(CopulaError::Numerical(_))));
    assert_eq!(copula.parameter(), None);
  }

  #[test]
  fn copula_at_median_matches_orthant_probability() {
    let copula = Gaussian::new(Some(0.5));
    assert_abs_diff_eq!(copula.cdf_scalar(0.5, 0.5).unwrap(), 1.0 / 3.0, epsilon = 1e-10);
  }
}
