//! # Bivariate
//!
//! $$
//! C_\theta:[0,1]^2\to[0,1],\qquad \hat\theta=g^{-1}(\hat\tau)\ \text{or}\ \hat\rho
//! $$
//!
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use gauss_quad::GaussLegendre;
use ndarray::Array1;
use ndarray::Array2;
use serde::Deserialize;
use serde::Serialize;

use super::correlation::kendall_tau;
use super::CopulaError;

pub mod clayton;
pub mod frank;
pub mod gaussian;
pub mod gumbel;

pub use clayton::Clayton;
pub use frank::Frank;
pub use frank::FrankEstimator;
pub use gaussian::Gaussian;
pub use gumbel::Gumbel;

/// Distance kept from 0 and 1 before any quantile or logarithm.
pub const CLIP_EPS: f64 = 1e-6;

/// Upper bound applied to Kendall's tau by the Archimedean fits.
pub const TAU_MAX: f64 = 0.999;

const QUADRATURE_DEGREE: usize = 48;

/// Clamps `x` to `[CLIP_EPS, 1 - CLIP_EPS]`.
#[inline]
pub fn clip_unit(x: f64) -> f64 {
  x.clamp(CLIP_EPS, 1.0 - CLIP_EPS)
}

/// Shared Gauss-Legendre rule for the quadratures in this module.
pub(crate) fn gauss_legendre() -> Result<&'static GaussLegendre, CopulaError> {
  static RULE: OnceLock<GaussLegendre> = OnceLock::new();

  if let Some(rule) = RULE.get() {
    return Ok(rule);
  }
  let rule = GaussLegendre::new(QUADRATURE_DEGREE)
    .map_err(|e| CopulaError::Numerical(format!("quadrature rule: {e:?}")))?;
  Ok(RULE.get_or_init(|| rule))
}

/// The four families, in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CopulaFamily {
  Gaussian,
  Clayton,
  Gumbel,
  Frank,
}

impl CopulaFamily {
  pub const ALL: [CopulaFamily; 4] = [
    CopulaFamily::Gaussian,
    CopulaFamily::Clayton,
    CopulaFamily::Gumbel,
    CopulaFamily::Frank,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      CopulaFamily::Gaussian => "Gaussian",
      CopulaFamily::Clayton => "Clayton",
      CopulaFamily::Gumbel => "Gumbel",
      CopulaFamily::Frank => "Frank",
    }
  }
}

impl fmt::Display for CopulaFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for CopulaFamily {
  type Err = CopulaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    CopulaFamily::ALL
      .into_iter()
      .find(|family| family.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| CopulaError::UnknownFamily(s.to_string()))
  }
}

/// One-parameter bivariate copula.
///
/// `x` is always the `(n x 2)` matrix of pseudo-observations with `u` in
/// column 0 and `v` in column 1.
pub trait Bivariate {
  fn family(&self) -> CopulaFamily;

  fn tau(&self) -> Option<f64>;

  fn set_tau(&mut self, tau: f64);

  fn theta(&self) -> Option<f64>;

  fn set_theta(&mut self, theta: f64);

  fn theta_bounds(&self) -> (f64, f64);

  /// Parameter implied by the stored tau.
  fn compute_theta(&self) -> Result<f64, CopulaError>;

  /// Copula value at a single point for an already checked parameter.
  fn cdf_point(&self, theta: f64, u: f64, v: f64) -> Result<f64, CopulaError>;

  /// The fitted parameter as reported in results.
  fn parameter(&self) -> Option<f64> {
    self.theta()
  }

  fn check_theta(&self) -> Result<f64, CopulaError> {
    let theta = self
      .theta()
      .ok_or(CopulaError::NotFitted(self.family().name()))?;
    let (lower, upper) = self.theta_bounds();

    if !theta.is_finite() || !(lower..=upper).contains(&theta) {
      return Err(CopulaError::Numerical(format!(
        "{} parameter {theta} outside [{lower}, {upper}]",
        self.family()
      )));
    }

    Ok(theta)
  }

  fn check_fit(&self) -> Result<f64, CopulaError> {
    self.check_theta()
  }

  /// Estimates the parameter from Kendall's tau and returns it.
  fn fit(&mut self, x: &Array2<f64>) -> Result<f64, CopulaError> {
    check_shape(x)?;
    let tau = kendall_tau(&x.column(0).to_vec(), &x.column(1).to_vec())?;

    self.set_tau(tau);
    let theta = self.compute_theta()?;
    self.set_theta(theta);
    self.check_theta()
  }

  fn cdf(&self, x: &Array2<f64>) -> Result<Array1<f64>, CopulaError> {
    let theta = self.check_fit()?;
    check_shape(x)?;

    x.rows()
      .into_iter()
      .map(|row| self.checked_point(theta, row[0], row[1]))
      .collect::<Result<Vec<_>, _>>()
      .map(Array1::from)
  }

  fn cdf_scalar(&self, u: f64, v: f64) -> Result<f64, CopulaError> {
    let theta = self.check_fit()?;
    self.checked_point(theta, u, v)
  }

  fn checked_point(&self, theta: f64, u: f64, v: f64) -> Result<f64, CopulaError> {
    let p = self.cdf_point(theta, u, v)?;

    if p.is_finite() {
      Ok(p.clamp(0.0, 1.0))
    } else {
      Err(CopulaError::Numerical(format!(
        "{} cdf is not finite at ({u}, {v})",
        self.family()
      )))
    }
  }
}

fn check_shape(x: &Array2<f64>) -> Result<(), CopulaError> {
  if x.ncols() != 2 {
    return Err(CopulaError::Numerical(format!(
      "expected 2 columns, got {}",
      x.ncols()
    )));
  }
  if x.nrows() == 0 {
    return Err(CopulaError::Empty);
  }
  Ok(())
}

/// A copula of one of the four supported families.
#[derive(Debug, Clone)]
pub enum Copula {
  Gaussian(Gaussian),
  Clayton(Clayton),
  Gumbel(Gumbel),
  Frank(Frank),
}

impl Copula {
  /// Unfitted model for `family`. `estimator` only affects Frank.
  pub fn new(family: CopulaFamily, estimator: FrankEstimator) -> Self {
    match family {
      CopulaFamily::Gaussian => Copula::Gaussian(Gaussian::new(None)),
      CopulaFamily::Clayton => Copula::Clayton(Clayton::new(None, None)),
      CopulaFamily::Gumbel => Copula::Gumbel(Gumbel::new(None, None)),
      CopulaFamily::Frank => Copula::Frank(Frank::new(None, None).with_estimator(estimator)),
    }
  }

  pub fn as_bivariate(&self) -> &dyn Bivariate {
    match self {
      Copula::Gaussian(c) => c,
      Copula::Clayton(c) => c,
      Copula::Gumbel(c) => c,
      Copula::Frank(c) => c,
    }
  }

  pub fn as_bivariate_mut(&mut self) -> &mut dyn Bivariate {
    match self {
      Copula::Gaussian(c) => c,
      Copula::Clayton(c) => c,
      Copula::Gumbel(c) => c,
      Copula::Frank(c) => c,
    }
  }

  pub fn family(&self) -> CopulaFamily {
    self.as_bivariate().family()
  }

  pub fn parameter(&self) -> Option<f64> {
    self.as_bivariate().parameter()
  }

  pub fn fit(&mut self, x: &Array2<f64>) -> Result<f64, CopulaError> {
    self.as_bivariate_mut().fit(x)
  }

  pub fn cdf(&self, x: &Array2<f64>) -> Result<Array1<f64>, CopulaError> {
    self.as_bivariate().cdf(x)
  }

  pub fn cdf_scalar(&self, u: f64, v: f64) -> Result<f64, CopulaError> {
    self.as_bivariate().cdf_scalar(u, v)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn clip_keeps_values_off_the_boundary() {
    assert_eq!(clip_unit(0.0), CLIP_EPS);
    assert_eq!(clip_unit(1.0), 1.0 - CLIP_EPS);
    assert_eq!(clip_unit(0.3), 0.3);
  }

  #[test]
  fn family_names_round_trip() {
    for family in CopulaFamily::ALL {
      assert_eq!(family.name().parse::<CopulaFamily>().unwrap(), family);
      assert_eq!(family.to_string(), family.name());
    }
    assert_eq!(
      "frank".parse::<CopulaFamily>().unwrap(),
      CopulaFamily::Frank
    );
    assert_eq!(
      "student".parse::<CopulaFamily>(),
      Err(CopulaError::UnknownFamily("student".into()))
    );
  }

  #[test]
  fn evaluation_order_is_fixed() {
    assert_eq!(
      CopulaFamily::ALL,
      [
        CopulaFamily::Gaussian,
        CopulaFamily::Clayton,
        CopulaFamily::Gumbel,
        CopulaFamily::Frank
      ]
    );
  }

  #[test]
  fn cdf_before_fit_is_rejected() {
    for family in CopulaFamily::ALL {
      let copula = Copula::new(family, FrankEstimator::Linear);
      assert_eq!(
        copula.cdf_scalar(0.5, 0.5),
        Err(CopulaError::NotFitted(family.name()))
      );
      assert_eq!(copula.parameter(), None);
    }
  }

  #[test]
  fn every_family_is_a_copula_after_fit() {
    let x = array![
      [0.1, 0.2],
      [0.2, 0.1],
      [0.3, 0.4],
      [0.4, 0.3],
      [0.5, 0.6],
      [0.6, 0.5],
      [0.7, 0.8],
      [0.8, 0.7],
      [0.9, 0.9]
    ];
    for family in CopulaFamily::ALL {
      let mut copula = Copula::new(family, FrankEstimator::Linear);
      copula.fit(&x).unwrap();
      assert_eq!(copula.family(), family);

      // boundary conditions and the Frechet-Hoeffding bounds
      for &(u, v) in &[(0.2, 0.7), (0.5, 0.5), (0.9, 0.3)] {
        let c = copula.cdf_scalar(u, v).unwrap();
        let lower = (u + v - 1.0f64).max(0.0);
        assert!(c >= lower - 1e-6 && c <= u.min(v) + 1e-6, "{family} at ({u}, {v}): {c}");
      }
      assert_abs_diff_eq!(copula.cdf_scalar(0.4, 1.0).unwrap(), 0.4, epsilon = 1e-4);
      assert_abs_diff_eq!(copula.cdf_scalar(1.0, 0.7).unwrap(), 0.7, epsilon = 1e-4);

      let batch = copula.cdf(&x).unwrap();
      assert_eq!(batch.len(), x.nrows());
    }
  }

  #[test]
  fn wrong_shape_is_rejected() {
    let mut copula = Copula::new(CopulaFamily::Clayton, FrankEstimator::Linear);
    let x = Array2::<f64>::zeros((0, 2));
    assert_eq!(copula.fit(&x), Err(CopulaError::Empty));
  }
}
