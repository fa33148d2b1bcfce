//! # Gumbel
//!
//! $$
//! C_\theta(u,v)=\exp\!\left(-\left[(-\ln u)^\theta+(-\ln v)^\theta\right]^{1/\theta}\right),\qquad
//! \theta=\frac{1}{1-\tau}
//! $$
//!
use super::clip_unit;
use super::Bivariate;
use super::CopulaFamily;
use super::TAU_MAX;
use crate::copulas::CopulaError;

/// `max(1 / (1 - tau), 1)` with tau capped at `TAU_MAX`.
pub fn theta_from_tau(tau: f64) -> f64 {
  let tau = tau.min(TAU_MAX);
  (1.0 / (1.0 - tau)).max(1.0)
}

#[derive(Debug, Clone, Default)]
pub struct Gumbel {
  pub theta: Option<f64>,
  pub tau: Option<f64>,
}

impl Gumbel {
  pub fn new(theta: Option<f64>, tau: Option<f64>) -> Self {
    Self { theta, tau }
  }
}

impl Bivariate for Gumbel {
  fn family(&self) -> CopulaFamily {
    CopulaFamily::Gumbel
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
    (1.0, f64::INFINITY)
  }

  fn compute_theta(&self) -> Result<f64, CopulaError> {
    let tau = self.tau.ok_or(CopulaError::DegenerateTau)?;
    Ok(theta_from_tau(tau))
  }

  fn cdf_point(&self, theta: f64, u: f64, v: f64) -> Result<f64, CopulaError> {
    let u = clip_unit(u);
    let v = clip_unit(v);

    if theta == 1.0 {
      return Ok(u * v);
    }

    // factor out the larger term so large theta does not underflow
    let (a, b) = (-u.ln(), -v.ln());
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    let norm = hi * (1.0 + (lo / hi).powf(theta)).powf(1.0 / theta);
    Ok((-norm).exp())
  }
}
