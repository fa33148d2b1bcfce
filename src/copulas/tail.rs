//! # Tail dependence
//!
//! $$
//! \chi_U(q)=\mathbb P(U>q\mid V>q),\qquad \chi_L(q)=\mathbb P(U\le 1-q\mid V\le 1-q)
//! $$
//!
use super::PseudoObservations;

pub const DEFAULT_TAIL_QUANTILE: f64 = 0.95;

/// Empirical tail coefficients. `None` when the conditioning event is empty.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TailDependence {
  pub upper: Option<f64>,
  pub lower: Option<f64>,
}

fn conditional_share<'a>(
  pairs: impl Iterator<Item = (&'a f64, &'a f64)>,
  event: impl Fn(f64) -> bool,
) -> Option<f64> {
  let (given, joint) = pairs
    .filter(|&(_, &v)| event(v))
    .fold((0usize, 0usize), |(given, joint), (&u, _)| {
      (given + 1, joint + usize::from(event(u)))
    });

  (given > 0).then(|| joint as f64 / given as f64)
}

pub fn tail_dependence(pobs: &PseudoObservations, q: f64) -> TailDependence {
  let lower_threshold = 1.0 - q;
  let pairs = || pobs.u().iter().zip(pobs.v().iter());

  TailDependence {
    upper: conditional_share(pairs(), |x| x > q),
    lower: conditional_share(pairs(), |x| x <= lower_threshold),
  }
}
