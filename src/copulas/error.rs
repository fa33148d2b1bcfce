//! Copula error types.

/// Failures local to one statistic or one copula family.
///
/// None of these abort a basin analysis: the selector records them per
/// family and moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CopulaError {
  /// The sample has no observations.
  #[error("sample is empty")]
  Empty,

  /// The two series do not pair up.
  #[error("series length mismatch: {left} vs {right}")]
  LengthMismatch { left: usize, right: usize },

  /// Kendall's tau is undefined (constant series or fewer than two points).
  #[error("kendall's tau is undefined for this sample")]
  DegenerateTau,

  /// A margin is constant, so no correlation can be estimated.
  #[error("constant margin, correlation is undefined")]
  DegenerateMargin,

  /// `cdf` was called before `fit`.
  #[error("{0} copula has not been fitted")]
  NotFitted(&'static str),

  /// An unknown family name was parsed.
  #[error("unknown copula family '{0}'")]
  UnknownFamily(String),

  /// A non-finite value appeared while fitting or evaluating.
  #[error("numerical failure: {0}")]
  Numerical(String),
}
