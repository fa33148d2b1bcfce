//! Merging per-basin result files into one table, with a summary report.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use prettytable::row;
use prettytable::Table;
use tracing::info;
use tracing::warn;

use super::analysis::BasinResult;
use super::io::read_results;
use super::io::write_rows;
use super::BasinError;
use crate::copulas::CopulaFamily;

const SIGNIFICANCE: f64 = 0.05;

#[derive(Debug)]
pub struct MergedResults {
  /// Files that were read successfully.
  pub files: Vec<PathBuf>,
  /// Files that could not be read.
  pub skipped: Vec<PathBuf>,
  /// All rows, sorted by basin id.
  pub results: Vec<BasinResult>,
}

fn is_result_file(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| n.starts_with("basin_") && n.ends_with(".csv"))
}

/// `basin_*.csv` files of `dir`, sorted by name.
pub fn collect_result_files(dir: &Path) -> Result<Vec<PathBuf>, BasinError> {
  let entries = fs::read_dir(dir).map_err(|e| BasinError::input_read(dir, e))?;

  let mut files: Vec<PathBuf> = entries
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.is_file() && is_result_file(p))
    .collect();
  files.sort();
  Ok(files)
}

/// Reads every result file in `dir` and writes the sorted table to `out`.
pub fn merge_results(dir: &Path, out: &Path) -> Result<MergedResults, BasinError> {
  let candidates = collect_result_files(dir)?;
  info!(count = candidates.len(), dir = %dir.display(), "found result files");
  if candidates.is_empty() {
    return Err(BasinError::NoResults {
      dir: dir.to_path_buf(),
    });
  }

  let mut merged = MergedResults {
    files: Vec::with_capacity(candidates.len()),
    skipped: Vec::new(),
    results: Vec::with_capacity(candidates.len()),
  };
  for path in candidates {
    match read_results(&path) {
      Ok(rows) => {
        merged.results.extend(rows);
        merged.files.push(path);
      }
      Err(err) => {
        warn!(error = %err, "skipping unreadable result file");
        merged.skipped.push(path);
      }
    }
  }
  if merged.files.is_empty() {
    return Err(BasinError::NoResults {
      dir: dir.to_path_buf(),
    });
  }

  merged.results.sort_by(|a, b| a.basin_id.cmp(&b.basin_id));
  write_rows(out, &merged.results)?;
  info!(basins = merged.results.len(), out = %out.display(), "merged results written");

  Ok(merged)
}

/// Count, mean and sample standard deviation of the defined values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnStats {
  pub count: usize,
  pub mean: Option<f64>,
  pub std: Option<f64>,
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl ColumnStats {
  pub fn from_values(values: impl Iterator<Item = Option<f64>>) -> Self {
    let xs: Vec<f64> = values.flatten().filter(|x| x.is_finite()).collect();
    let count = xs.len();
    if count == 0 {
      return Self::default();
    }

    let mean = xs.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
      let ss: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
      (ss / (count - 1) as f64).sqrt()
    });

    Self {
      count,
      mean: Some(mean),
      std,
      min: xs.iter().copied().reduce(f64::min),
      max: xs.iter().copied().reduce(f64::max),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
  pub basins: usize,
  pub spearman_rho: ColumnStats,
  pub kendall_tau: ColumnStats,
  pub chi_upper: ColumnStats,
  pub chi_lower: ColumnStats,
  /// Best-copula counts, most frequent first. Absent copulas are not counted.
  pub copula_counts: Vec<(CopulaFamily, usize)>,
  pub significant_spearman: usize,
  pub significant_kendall: usize,
}

impl ResultSummary {
  pub fn from_results(results: &[BasinResult]) -> Self {
    let mut copula_counts: Vec<(CopulaFamily, usize)> = CopulaFamily::ALL
      .into_iter()
      .map(|family| {
        let n = results
          .iter()
          .filter(|r| r.best_copula == Some(family))
          .count();
        (family, n)
      })
      .filter(|&(_, n)| n > 0)
      .collect();
    // stable, so equal counts keep evaluation order
    copula_counts.sort_by(|a, b| b.1.cmp(&a.1));

    let significant = |p: Option<f64>| p.is_some_and(|p| p < SIGNIFICANCE);

    Self {
      basins: results.len(),
      spearman_rho: ColumnStats::from_values(results.iter().map(|r| r.spearman_rho)),
      kendall_tau: ColumnStats::from_values(results.iter().map(|r| r.kendall_tau)),
      chi_upper: ColumnStats::from_values(results.iter().map(|r| r.chi_upper)),
      chi_lower: ColumnStats::from_values(results.iter().map(|r| r.chi_lower)),
      copula_counts,
      significant_spearman: results.iter().filter(|r| significant(r.spearman_pvalue)).count(),
      significant_kendall: results.iter().filter(|r| significant(r.kendall_pvalue)).count(),
    }
  }

  fn share(&self, n: usize) -> String {
    if self.basins == 0 {
      return "-".into();
    }
    format!("{:.1}%", 100.0 * n as f64 / self.basins as f64)
  }

  pub fn to_table(&self) -> Table {
    let fmt = |x: Option<f64>| x.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));

    let mut table = Table::new();
    table.add_row(row!["statistic", "mean", "std", "min", "max", "n"]);
    for (name, stats) in [
      ("spearman rho", &self.spearman_rho),
      ("kendall tau", &self.kendall_tau),
      ("chi upper", &self.chi_upper),
      ("chi lower", &self.chi_lower),
    ] {
      table.add_row(row![
        name,
        fmt(stats.mean),
        fmt(stats.std),
        fmt(stats.min),
        fmt(stats.max),
        stats.count
      ]);
    }

    for (family, n) in &self.copula_counts {
      table.add_row(row![format!("best = {family}"), n, self.share(*n), "", "", ""]);
    }
    table.add_row(row![
      format!("spearman p < {SIGNIFICANCE}"),
      self.significant_spearman,
      self.share(self.significant_spearman),
      "",
      "",
      ""
    ]);
    table.add_row(row![
      format!("kendall p < {SIGNIFICANCE}"),
      self.significant_kendall,
      self.share(self.significant_kendall),
      "",
      "",
      ""
    ]);
    table
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use tempfile::TempDir;

  use super::*;
  use crate::basin::io::write_result;

  fn result(id: &str, rho: f64, best: Option<CopulaFamily>) -> BasinResult {
    BasinResult {
      basin_id: id.into(),
      n_months: 24,
      spearman_rho: Some(rho),
      spearman_pvalue: Some(if rho > 0.5 { 0.001 } else { 0.2 }),
      kendall_tau: Some(rho * 0.7),
      kendall_pvalue: Some(0.01),
      chi_upper: None,
      chi_lower: Some(0.5),
      best_copula: best,
      copula_parameter: best.map(|_| 1.5),
      copula_gof_statistic: best.map(|_| 0.001),
      copula_gof_pvalue: best.map(|_| 0.99),
    }
  }

  #[test]
  fn merge_sorts_by_basin_id_and_skips_bad_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("merged").join("all.csv");
    write_result(&dir.path().join("basin_0000.csv"), &result("c", 0.9, Some(CopulaFamily::Gumbel))).unwrap();
    write_result(&dir.path().join("basin_0001.csv"), &result("a", 0.3, None)).unwrap();
    write_result(&dir.path().join("basin_0002.csv"), &result("b", 0.7, Some(CopulaFamily::Frank))).unwrap();
    fs::write(dir.path().join("basin_0003.csv"), "garbage\n1\n").unwrap();
    fs::write(dir.path().join("notes.csv"), "ignored").unwrap();

    let merged = merge_results(dir.path(), &out).unwrap();
    assert_eq!(merged.files.len(), 3);
    assert_eq!(merged.skipped.len(), 1);
    let ids: Vec<_> = merged.results.iter().map(|r| r.basin_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);

    let back = read_results(&out).unwrap();
    assert_eq!(back, merged.results);
    assert_eq!(back[0].best_copula, None);
  }

  #[test]
  fn empty_directory_has_no_results() {
    let dir = TempDir::new().unwrap();
    let err = merge_results(dir.path(), &dir.path().join("all.csv")).unwrap_err();
    assert!(matches!(err, BasinError::NoResults { .. }));
  }

  #[test]
  fn summary_statistics() {
    let results = vec![
      result("a", 0.2, Some(CopulaFamily::Gumbel)),
      result("b", 0.6, Some(CopulaFamily::Gaussian)),
      result("c", 1.0, Some(CopulaFamily::Gumbel)),
      result("d", 0.8, None),
    ];
    let summary = ResultSummary::from_results(&results);

    assert_eq!(summary.basins, 4);
    assert_relative_eq!(summary.spearman_rho.mean.unwrap(), 0.65);
    assert_relative_eq!(summary.spearman_rho.min.unwrap(), 0.2);
    assert_relative_eq!(summary.spearman_rho.max.unwrap(), 1.0);
    // sample variance of 0.2, 0.6, 1.0, 0.8
    assert_relative_eq!(summary.spearman_rho.std.unwrap(), (0.35f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert_eq!(summary.chi_upper, ColumnStats::default());
    assert_eq!(summary.chi_lower.count, 4);

    assert_eq!(
      summary.copula_counts,
      vec![(CopulaFamily::Gumbel, 2), (CopulaFamily::Gaussian, 1)]
    );
    assert_eq!(summary.significant_spearman, 3);
    assert_eq!(summary.significant_kendall, 4);

    let rendered = summary.to_table().to_string();
    assert!(rendered.contains("spearman rho"));
    assert!(rendered.contains("best = Gumbel"));
  }
}
