//! # Empirical
//!
//! $$
//! C_n(u,v)=\frac{1}{n}\sum_{i=1}^n \mathbf 1\{U_i\le u,\,V_i\le v\}
//! $$
//!
use ndarray::stack;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;

use super::CopulaError;

/// Ranks `x` from 1 to n, giving every member of a tied group the mean of
/// the positions the group occupies.
pub fn rank_average(x: &[f64]) -> Vec<f64> {
  let n = x.len();

  // (value, original_index) sorted by value
  let mut xv: Vec<(f64, usize)> = x.iter().enumerate().map(|(i, &val)| (val, i)).collect();
  xv.sort_by(|a, b| a.0.total_cmp(&b.0));

  let mut ranks = vec![0.0; n];
  let mut i = 0;
  while i < n {
    let mut j = i + 1;
    while j < n && xv[j].0 == xv[i].0 {
      j += 1;
    }
    // positions i..j share ranks i+1..=j
    let avg = (i + j + 1) as f64 / 2.0;
    for &(_val, orig_i) in &xv[i..j] {
      ranks[orig_i] = avg;
    }
    i = j;
  }

  ranks
}

/// Rank-transformed sample on the open unit square.
///
/// `u[i] = rank(x[i]) / (n + 1)` and `v[i] = rank(y[i]) / (n + 1)`, so no
/// coordinate is ever exactly 0 or 1.
#[derive(Clone, Debug, PartialEq)]
pub struct PseudoObservations {
  u: Array1<f64>,
  v: Array1<f64>,
}

impl PseudoObservations {
  /// Builds pseudo-observations from two raw series paired by position.
  pub fn from_series(x: &[f64], y: &[f64]) -> Result<Self, CopulaError> {
    if x.len() != y.len() {
      return Err(CopulaError::LengthMismatch {
        left: x.len(),
        right: y.len(),
      });
    }
    if x.is_empty() {
      return Err(CopulaError::Empty);
    }

    let scale = (x.len() + 1) as f64;
    let u = rank_average(x).into_iter().map(|r| r / scale).collect();
    let v = rank_average(y).into_iter().map(|r| r / scale).collect();

    Ok(Self { u, v })
  }

  /// Wraps values that are already on the unit square.
  pub fn from_uniforms(u: Array1<f64>, v: Array1<f64>) -> Result<Self, CopulaError> {
    if u.len() != v.len() {
      return Err(CopulaError::LengthMismatch {
        left: u.len(),
        right: v.len(),
      });
    }
    if u.is_empty() {
      return Err(CopulaError::Empty);
    }
    if u.iter().chain(v.iter()).any(|p| !(0.0..=1.0).contains(p)) {
      return Err(CopulaError::Numerical(
        "marginal values must be in the interval [0, 1]".into(),
      ));
    }

    Ok(Self { u, v })
  }

  pub fn u(&self) -> &Array1<f64> {
    &self.u
  }

  pub fn v(&self) -> &Array1<f64> {
    &self.v
  }

  pub fn len(&self) -> usize {
    self.u.len()
  }

  pub fn is_empty(&self) -> bool {
    self.u.is_empty()
  }

  /// `(n x 2)` matrix with `u` in column 0 and `v` in column 1.
  pub fn as_array2(&self) -> Array2<f64> {
    stack![Axis(1), self.u.view(), self.v.view()]
  }

  /// Fraction of sample points with `U <= u` and `V <= v`.
  pub fn empirical_cdf(&self, u: f64, v: f64) -> f64 {
    let hits = self
      .u
      .iter()
      .zip(self.v.iter())
      .filter(|&(&ui, &vi)| ui <= u && vi <= v)
      .count();
    hits as f64 / self.len() as f64
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;
  use rand::rngs::StdRng;
  use rand::Rng;
  use rand::SeedableRng;

  use super::*;

  #[test]
  fn average_ranks_for_ties() {
    let ranks = rank_average(&[3.0, 1.0, 4.0, 1.0, 5.0]);
    assert_eq!(ranks, vec![3.0, 1.5, 4.0, 1.5, 5.0]);
  }

  #[test]
  fn all_tied_share_middle_rank() {
    let ranks = rank_average(&[0.0; 4]);
    assert_eq!(ranks, vec![2.5; 4]);
  }

  #[test]
  fn pseudo_observations_scale_by_n_plus_one() {
    let pobs = PseudoObservations::from_series(&[10.0, 30.0, 20.0], &[1.0, 2.0, 3.0]).unwrap();
    assert_relative_eq!(pobs.u()[0], 0.25);
    assert_relative_eq!(pobs.u()[1], 0.75);
    assert_relative_eq!(pobs.u()[2], 0.5);
    assert_relative_eq!(pobs.v()[2], 0.75);
  }

  #[test]
  fn pseudo_observations_stay_inside_unit_interval() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in [2usize, 3, 10, 57] {
      // heavy ties, zeros and extreme magnitudes
      let x: Vec<f64> = (0..n)
        .map(|_| match rng.gen_range(0..4) {
          0 => 0.0,
          1 => 1e300,
          2 => -1e-300,
          _ => rng.gen_range(0..3) as f64,
        })
        .collect();
      let y: Vec<f64> = (0..n).map(|_| rng.gen_range(0..2) as f64).collect();
      let pobs = PseudoObservations::from_series(&x, &y).unwrap();
      for p in pobs.u().iter().chain(pobs.v().iter()) {
        assert!(*p > 0.0 && *p < 1.0, "value {p} escaped (0, 1) for n = {n}");
      }
    }
  }

  #[test]
  fn mismatched_lengths_are_rejected() {
    let err = PseudoObservations::from_series(&[1.0, 2.0], &[1.0]).unwrap_err();
    assert_eq!(err, CopulaError::LengthMismatch { left: 2, right: 1 });
    assert_eq!(
      PseudoObservations::from_series(&[], &[]).unwrap_err(),
      CopulaError::Empty
    );
  }

  #[test]
  fn empirical_cdf_counts_weak_dominance() {
    let pobs =
      PseudoObservations::from_uniforms(array![0.2, 0.4, 0.6, 0.8], array![0.8, 0.2, 0.6, 0.4])
        .unwrap();
    assert_relative_eq!(pobs.empirical_cdf(0.6, 0.6), 0.5);
    assert_relative_eq!(pobs.empirical_cdf(1.0, 1.0), 1.0);
    assert_relative_eq!(pobs.empirical_cdf(0.1, 1.0), 0.0);

    let x = pobs.as_array2();
    assert_eq!(x.shape(), &[4, 2]);
    assert_relative_eq!(x[[1, 1]], 0.2);
  }
}
