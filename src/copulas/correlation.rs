//! # Correlation
//!
//! $$
//! \rho_S=\operatorname{corr}\big(R(x),R(y)\big),\qquad
//! \tau_b=\frac{n_c-n_d}{\sqrt{(n_0-n_1)(n_0-n_2)}}
//! $$
//!
use std::cmp::Ordering;

use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;
use statrs::distribution::StudentsT;

use super::empirical::rank_average;
use super::CopulaError;

/// A rank statistic with its two-sided p-value.
///
/// `None` marks an undefined value (constant series, too few points).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorrelationResult {
  pub statistic: Option<f64>,
  pub p_value: Option<f64>,
}

impl CorrelationResult {
  pub fn undefined() -> Self {
    Self::default()
  }
}

/// Pearson correlation, `None` when either series has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
  let n = x.len();
  if n < 2 || n != y.len() {
    return None;
  }

  let nf = n as f64;
  let mean_x = x.iter().sum::<f64>() / nf;
  let mean_y = y.iter().sum::<f64>() / nf;

  let mut sxy = 0.0;
  let mut sxx = 0.0;
  let mut syy = 0.0;
  for (&xi, &yi) in x.iter().zip(y) {
    let dx = xi - mean_x;
    let dy = yi - mean_y;
    sxy += dx * dy;
    sxx += dx * dx;
    syy += dy * dy;
  }

  if sxx <= 0.0 || syy <= 0.0 {
    return None;
  }

  let r = sxy / (sxx * syy).sqrt();
  r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Spearman's rank correlation with a Student-t p-value on `n - 2` degrees
/// of freedom.
pub fn spearman(x: &[f64], y: &[f64]) -> CorrelationResult {
  if x.len() != y.len() {
    return CorrelationResult::undefined();
  }

  let Some(rho) = pearson(&rank_average(x), &rank_average(y)) else {
    return CorrelationResult::undefined();
  };

  CorrelationResult {
    statistic: Some(rho),
    p_value: spearman_p_value(rho, x.len()),
  }
}

fn spearman_p_value(rho: f64, n: usize) -> Option<f64> {
  if n < 3 {
    return None;
  }

  let df = (n - 2) as f64;
  let denom = 1.0 - rho * rho;
  if denom <= 0.0 {
    return Some(0.0);
  }

  let t = rho * (df / denom).sqrt();
  let dist = StudentsT::new(0.0, 1.0, df).ok()?;
  Some((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Kendall's tau-b, or [`CopulaError::DegenerateTau`] when it is undefined.
pub fn kendall_tau(x: &[f64], y: &[f64]) -> Result<f64, CopulaError> {
  if x.len() != y.len() {
    return Err(CopulaError::LengthMismatch {
      left: x.len(),
      right: y.len(),
    });
  }
  if x.len() < 2 || is_constant(x) || is_constant(y) {
    return Err(CopulaError::DegenerateTau);
  }

  let (tau, _) = kendalls::tau_b_with_comparator(x, y, |a: &f64, b: &f64| {
    a.partial_cmp(b).unwrap_or(Ordering::Greater)
  })
  .map_err(|_| CopulaError::DegenerateTau)?;

  if tau.is_finite() {
    Ok(tau.clamp(-1.0, 1.0))
  } else {
    Err(CopulaError::DegenerateTau)
  }
}

/// Kendall's tau-b with a two-sided p-value: exact for small samples without
/// ties, otherwise the tie-corrected normal approximation.
pub fn kendall(x: &[f64], y: &[f64]) -> CorrelationResult {
  match kendall_tau(x, y) {
    Ok(tau) => CorrelationResult {
      statistic: Some(tau),
      p_value: kendall_p_value(tau, x, y),
    },
    Err(_) => CorrelationResult::undefined(),
  }
}

/// Largest tie-free sample that gets the exact null distribution.
const KENDALL_EXACT_MAX_N: usize = 33;

fn is_constant(x: &[f64]) -> bool {
  x.windows(2).all(|w| w[0] == w[1])
}

/// Sizes of the tied groups (size > 1) in `x`.
fn tie_groups(x: &[f64]) -> Vec<f64> {
  let mut sorted = x.to_vec();
  sorted.sort_by(f64::total_cmp);

  let mut groups = Vec::new();
  let mut i = 0;
  while i < sorted.len() {
    let mut j = i + 1;
    while j < sorted.len() && sorted[j] == sorted[i] {
      j += 1;
    }
    if j - i > 1 {
      groups.push((j - i) as f64);
    }
    i = j;
  }
  groups
}

/// `P(D <= c)` for the number `D` of discordant pairs of a uniformly random
/// permutation of `n` items.
///
/// $$
/// P_j(k)=\frac1j\sum_{i=0}^{\min(k,\,j-1)}P_{j-1}(k-i)
/// $$
fn discordant_cdf(n: usize, c: usize) -> f64 {
  let mut probs = vec![0.0; c + 1];
  probs[0] = 1.0;
  for j in 2..=n {
    let prev = probs.clone();
    for (k, p) in probs.iter_mut().enumerate() {
      let lo = k.saturating_sub(j - 1);
      *p = prev[lo..=k].iter().sum::<f64>() / j as f64;
    }
  }
  probs.iter().sum()
}

fn kendall_p_value(tau: f64, x: &[f64], y: &[f64]) -> Option<f64> {
  let n = x.len() as f64;
  let m = n * (n - 1.0);
  let n0 = m / 2.0;

  let tx = tie_groups(x);
  let ty = tie_groups(y);
  let pairs = |g: &[f64]| g.iter().map(|t| t * (t - 1.0) / 2.0).sum::<f64>();
  let x_tie = |g: &[f64]| g.iter().map(|t| t * (t - 1.0)).sum::<f64>();
  let x0 = |g: &[f64]| g.iter().map(|t| t * (t - 1.0) * (t - 2.0)).sum::<f64>();
  let x1 = |g: &[f64]| g.iter().map(|t| t * (t - 1.0) * (2.0 * t + 5.0)).sum::<f64>();

  // concordant minus discordant, recovered from tau-b
  let s = tau * ((n0 - pairs(&tx)) * (n0 - pairs(&ty))).sqrt();

  if tx.is_empty() && ty.is_empty() {
    let total = x.len() * (x.len() - 1) / 2;
    let discordant = (((n0 - s) / 2.0).round().max(0.0) as usize).min(total);
    let c = discordant.min(total - discordant);
    if x.len() <= KENDALL_EXACT_MAX_N || c <= 1 {
      return Some((2.0 * discordant_cdf(x.len(), c)).min(1.0));
    }
  }

  let mut var_s = (m * (2.0 * n + 5.0) - x1(&tx) - x1(&ty)) / 18.0
    + 2.0 * (x_tie(&tx) / 2.0) * (x_tie(&ty) / 2.0) / m;
  if n > 2.0 {
    var_s += x0(&tx) * x0(&ty) / (9.0 * m * (n - 2.0));
  }
  if !(var_s > 0.0) {
    return None;
  }

  let z = s / var_s.sqrt();
  let normal = Normal::new(0.0, 1.0).ok()?;
  Some((2.0 * normal.sf(z.abs())).clamp(0.0, 1.0))
}
