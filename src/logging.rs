use tracing_subscriber::EnvFilter;

/// Crate targets that receive log output by default.
const CRATE_TARGETS: &[&str] = &["basin_dependence"];

/// Filter directive for a `-v` count: 0 warn, 1 info, 2 debug, 3+ trace.
pub fn default_filter(verbosity: u8) -> String {
  let level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  CRATE_TARGETS
    .iter()
    .map(|t| format!("{t}={level}"))
    .collect::<Vec<_>>()
    .join(",")
}

/// Installs the global subscriber. `RUST_LOG` overrides the verbosity.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init(verbosity: u8) {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verbosity_levels() {
    assert_eq!(default_filter(0), "basin_dependence=warn");
    assert!(default_filter(2).contains("basin_dependence=debug"));
    assert!(default_filter(9).ends_with("=trace"));
  }

  #[test]
  fn init_twice_is_harmless() {
    init(0);
    init(3);
  }
}
