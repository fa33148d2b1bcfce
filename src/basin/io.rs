//! Basin list, per-basin sample and result record files.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::analysis::BasinResult;
use super::analysis::PairedSample;
use super::BasinError;

const PRCP_COLUMN: &str = "prcp";
const RUNOFF_COLUMN: &str = "runoff";

/// Reads one basin identifier per line. Blank lines are skipped.
pub fn read_basin_list(path: &Path) -> Result<Vec<String>, BasinError> {
  let text = fs::read_to_string(path).map_err(|e| BasinError::input_read(path, e))?;

  Ok(
    text
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect(),
  )
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize, BasinError> {
  headers
    .iter()
    .position(|h| h.trim() == name)
    .ok_or_else(|| BasinError::input_read(path, format!("missing column '{name}'")))
}

fn parse_cell(record: &csv::StringRecord, col: usize, row: usize, path: &Path) -> Result<f64, BasinError> {
  let cell = record.get(col).unwrap_or("").trim();
  cell.parse::<f64>().map_err(|_| {
    BasinError::input_read(path, format!("row {row}: cannot parse '{cell}' as a number"))
  })
}

/// Reads the `prcp` and `runoff` columns of a CSV file, paired by row.
///
/// Other columns are ignored and column order is free.
pub fn read_paired_sample(path: &Path) -> Result<PairedSample, BasinError> {
  let mut reader = csv::Reader::from_path(path).map_err(|e| BasinError::input_read(path, e))?;

  let headers = reader
    .headers()
    .map_err(|e| BasinError::input_read(path, e))?
    .clone();
  let prcp_col = column_index(&headers, PRCP_COLUMN, path)?;
  let runoff_col = column_index(&headers, RUNOFF_COLUMN, path)?;

  let mut prcp = Vec::new();
  let mut runoff = Vec::new();
  for (i, record) in reader.records().enumerate() {
    let record = record.map_err(|e| BasinError::input_read(path, e))?;
    // header is line 1
    let row = i + 2;
    prcp.push(parse_cell(&record, prcp_col, row, path)?);
    runoff.push(parse_cell(&record, runoff_col, row, path)?);
  }

  PairedSample::new(prcp, runoff)
}

fn temporary_sibling(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Writes `rows` as a CSV table with a header line.
///
/// The table goes to a temporary sibling first and is renamed into place,
/// so `path` either holds the complete table or is left untouched.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BasinError> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|e| BasinError::output_write(path, e))?;
  }

  let tmp = temporary_sibling(path);
  let written = (|| -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(&tmp)?;
    for row in rows {
      writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
  })();

  if let Err(e) = written {
    let _ = fs::remove_file(&tmp);
    return Err(BasinError::output_write(path, e));
  }

  fs::rename(&tmp, path).map_err(|e| {
    let _ = fs::remove_file(&tmp);
    BasinError::output_write(path, e)
  })
}

/// Writes one result record as a single-row table.
pub fn write_result(path: &Path, result: &BasinResult) -> Result<(), BasinError> {
  write_rows(path, std::slice::from_ref(result))
}

/// Reads every row of a CSV table written by [`write_rows`].
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, BasinError> {
  let mut reader = csv::Reader::from_path(path).map_err(|e| BasinError::input_read(path, e))?;

  reader
    .deserialize()
    .collect::<Result<Vec<T>, _>>()
    .map_err(|e| BasinError::input_read(path, e))
}

pub fn read_results(path: &Path) -> Result<Vec<BasinResult>, BasinError> {
  read_rows(path)
}
