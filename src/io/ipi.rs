//! i-PI outputs: `simulation.out` property files and dynamical matrix eigenvalues.

use super::{collect_lines, open, parse_row};
use crate::errors::*;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::io::BufRead;
use std::path::Path;

/// Prefix of i-PI header and comment lines
pub const COMMENT: char = '#';

/// Tabular time series from an i-PI property file
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Column names parsed from `# column N --> name : description` header lines
    pub columns: Vec<String>,
    /// `data[[t, c]]` is column `c` at output step `t`
    pub data: Array2<f64>,
}

impl TimeSeries {
    /// Number of output steps
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Whether the series has no steps
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column `index` from step `skip` onward
    pub fn column_from(&self, index: usize, skip: usize) -> Result<ArrayView1<'_, f64>> {
        let n_columns = self.data.len_of(Axis(1));
        if index >= n_columns {
            return Err(AnharmError::InvalidInput(format!(
                "column {} requested from a series with {} columns",
                index, n_columns
            )));
        }
        let column = self.data.index_axis(Axis(1), index);
        let skip = skip.min(column.len());
        Ok(column.split_at(Axis(0), skip).1)
    }
}

/// Two potential energies of the same trajectory, as written by a lambda-coupled i-PI run
#[derive(Debug, Clone, PartialEq)]
pub struct DualPotentialSeries {
    /// Elapsed simulation time
    pub time: Array1<f64>,
    /// Force-field potential energy
    pub ff: Array1<f64>,
    /// DFT potential energy
    pub dft: Array1<f64>,
}

/// Columns of a [`DualPotentialSeries`] in the property file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualPotentialColumns {
    /// Elapsed time
    pub time: usize,
    /// Force-field potential
    pub ff: usize,
    /// DFT potential
    pub dft: usize,
}

impl Default for DualPotentialColumns {
    fn default() -> Self {
        Self {
            time: 1,
            ff: 7,
            dft: 8,
        }
    }
}

/// Read an i-PI property file.
///
/// Header lines are the leading lines starting with `#` among the first `header_scan_lines`;
/// everything after them is numeric data. Blank lines are ignored.
pub fn read_time_series<R: BufRead>(reader: R, header_scan_lines: usize) -> Result<TimeSeries> {
    let lines = collect_lines(reader)?;

    let n_header = lines
        .iter()
        .take(header_scan_lines)
        .take_while(|line| line.starts_with(COMMENT))
        .count();
    let columns = lines[..n_header]
        .iter()
        .filter_map(|line| column_name(line))
        .collect();
    let data = parse_table(&lines, n_header)?;

    Ok(TimeSeries { columns, data })
}

/// [`read_time_series`] from a file
pub fn time_series_from_path(path: &Path, header_scan_lines: usize) -> Result<TimeSeries> {
    read_time_series(open(path)?, header_scan_lines).map_err(|e| e.with_path(path))
}

/// Read force-field and DFT potentials from the property file of a coupling run.
///
/// The first line is skipped, then data starts after the last `#` line.
pub fn read_dual_potential<R: BufRead>(
    reader: R,
    columns: DualPotentialColumns,
) -> Result<DualPotentialSeries> {
    let lines = collect_lines(reader)?;

    let last_comment = lines
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| line.starts_with(COMMENT))
        .map(|(i, _)| i)
        .last()
        .ok_or(AnharmError::MissingMarker {
            path: Default::default(),
            marker: "#",
        })?;
    let data = parse_table(&lines, last_comment + 1)?;

    let n_columns = data.len_of(Axis(1));
    let needed = columns.time.max(columns.ff).max(columns.dft);
    if data.len_of(Axis(0)) > 0 && needed >= n_columns {
        return Err(AnharmError::parse(
            "",
            last_comment + 2,
            format!(
                "need column {} but rows have {} columns",
                needed, n_columns
            ),
        ));
    }
    let column = |index: usize| {
        if data.len_of(Axis(0)) == 0 {
            Array1::zeros(0)
        } else {
            data.index_axis(Axis(1), index).to_owned()
        }
    };

    Ok(DualPotentialSeries {
        time: column(columns.time),
        ff: column(columns.ff),
        dft: column(columns.dft),
    })
}

/// [`read_dual_potential`] from a file
pub fn dual_potential_from_path(
    path: &Path,
    columns: DualPotentialColumns,
) -> Result<DualPotentialSeries> {
    read_dual_potential(open(path)?, columns).map_err(|e| e.with_path(path))
}

/// Number of leading eigenvalues dropped: the rigid translations of the cell
pub const TRANSLATIONAL_MODES: usize = 3;

/// Read dynamical matrix eigenvalues (atomic units), one per line after a single header line.
///
/// The first [`TRANSLATIONAL_MODES`] values are dropped.
pub fn read_eigenvalues<R: BufRead>(reader: R) -> Result<Array1<f64>> {
    let lines = collect_lines(reader)?;

    let values = lines
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim().parse::<f64>().map_err(|_| {
                AnharmError::parse("", i + 1, format!("'{}' is not an eigenvalue", line.trim()))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(values.into_iter().skip(TRANSLATIONAL_MODES).collect())
}

/// [`read_eigenvalues`] from a file
pub fn eigenvalues_from_path(path: &Path) -> Result<Array1<f64>> {
    read_eigenvalues(open(path)?).map_err(|e| e.with_path(path))
}

/// `# column   3 --> temperature{kelvin} : The current temperature` gives `temperature{kelvin}`
fn column_name(line: &str) -> Option<String> {
    let (_, rest) = line.split_once("-->")?;
    let name = rest.split_once(" : ").map_or(rest, |(name, _)| name);
    Some(name.trim().to_string())
}

/// Rows of numbers from `lines[start..]`, all with the same number of columns
fn parse_table(lines: &[String], start: usize) -> Result<Array2<f64>> {
    let mut n_columns = None;
    let mut n_rows = 0;
    let mut flat = Vec::new();

    for (i, line) in lines.iter().enumerate().skip(start) {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(line, i + 1)?;
        match n_columns {
            None => n_columns = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(AnharmError::parse(
                    "",
                    i + 1,
                    format!("expected {} columns, found {}", n, row.len()),
                ));
            }
            Some(_) => {}
        }
        flat.extend(row);
        n_rows += 1;
    }

    Array2::from_shape_vec((n_rows, n_columns.unwrap_or(0)), flat)
        .map_err(|e| AnharmError::parse("", start + 1, e.to_string()))
}
