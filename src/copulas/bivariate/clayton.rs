//! # Clayton
//!
//! $$
//! C_\theta(u,v)=\left(u^{-\theta}+v^{-\theta}-1\right)^{-1/\theta},\qquad
//! \theta=\frac{2\tau}{1-\tau}
//! $$
//!
use super::clip_unit;
use super::Bivariate;
use super::CopulaFamily;
use super::CLIP_EPS;
use super::TAU_MAX;
use crate::copulas::CopulaError;

/// `max(2 tau / (1 - tau), 1e-6)` with tau capped at `TAU_MAX`.
pub fn theta_from_tau(tau: f64) -> f64 {
  let tau = tau.min(TAU_MAX);
  (2.0 * tau / (1.0 - tau)).max(CLIP_EPS)
}

#[derive(Debug, Clone, Default)]
pub struct Clayton {
  pub theta: Option<f64>,
  pub tau: Option<f64>,
}

impl Clayton {
  pub fn new(theta: Option<f64>, tau: Option<f64>) -> Self {
    Self { theta, tau }
  }
}

impl Bivariate for Clayton {
  fn family(&self) -> CopulaFamily {
    CopulaFamily::Clayton
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
    (CLIP_EPS, f64::INFINITY)
  }

  fn compute_theta(&self) -> Result<f64, CopulaError> {
    let tau = self.tau.ok_or(CopulaError::DegenerateTau)?;
    Ok(theta_from_tau(tau))
  }

  fn cdf_point(&self, theta: f64, u: f64, v: f64) -> Result<f64, CopulaError> {
    let u = clip_unit(u);
    let v = clip_unit(v);

    if theta < CLIP_EPS {
      return Ok(u * v);
    }

    Ok((u.powf(-theta) + v.powf(-theta) - 1.0).powf(-1.0 / theta))
  }
}
