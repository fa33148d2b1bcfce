//! Basin pipeline error types.

use std::path::PathBuf;

/// Errors that end the processing of one basin, or of the whole run.
///
/// Copula fit failures never appear here; they are recorded per family
/// and leave the result record's copula fields empty.
#[derive(Debug, thiserror::Error)]
pub enum BasinError {
  /// The configuration file or an override is invalid.
  #[error("invalid configuration: {reason}")]
  Config { reason: String },

  /// An input file is missing, unreadable or malformed.
  #[error("cannot read {}: {reason}", .path.display())]
  InputRead { path: PathBuf, reason: String },

  /// The paired series cannot be analysed.
  #[error("invalid sample: {reason}")]
  InvalidSample { reason: String },

  /// The 1-based basin index does not select an entry of the list.
  #[error("basin index {index} out of range (list has {len} basins)")]
  IndexOutOfRange { index: usize, len: usize },

  /// A result file could not be written.
  #[error("cannot write {}: {reason}", .path.display())]
  OutputWrite { path: PathBuf, reason: String },

  /// The merger found nothing to merge.
  #[error("no result files found in {}", .dir.display())]
  NoResults { dir: PathBuf },
}

impl BasinError {
  pub fn input_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
    BasinError::InputRead {
      path: path.into(),
      reason: reason.to_string(),
    }
  }

  pub fn output_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
    BasinError::OutputWrite {
      path: path.into(),
      reason: reason.to_string(),
    }
  }

  /// Process exit status for this error. 2 is left to argument parsing.
  pub fn exit_code(&self) -> i32 {
    match self {
      BasinError::Config { .. } | BasinError::NoResults { .. } => 1,
      BasinError::IndexOutOfRange { .. } => 3,
      BasinError::InputRead { .. } | BasinError::InvalidSample { .. } => 4,
      BasinError::OutputWrite { .. } => 5,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn index_out_of_range_display() {
    let err = BasinError::IndexOutOfRange { index: 12, len: 10 };
    let msg = err.to_string();
    assert!(msg.contains("basin index 12"));
    assert!(msg.contains("10 basins"));
  }

  #[test]
  fn input_read_display() {
    let err = BasinError::input_read("data/0101.csv", "no such file");
    let msg = err.to_string();
    assert!(msg.contains("data/0101.csv"));
    assert!(msg.contains("no such file"));
  }

  #[test]
  fn exit_codes_are_distinct() {
    let codes = [
      BasinError::IndexOutOfRange { index: 0, len: 0 }.exit_code(),
      BasinError::input_read("a", "b").exit_code(),
      BasinError::output_write("a", "b").exit_code(),
      BasinError::Config { reason: "x".into() }.exit_code(),
    ];
    assert_eq!(codes, [3, 4, 5, 1]);
  }
}
