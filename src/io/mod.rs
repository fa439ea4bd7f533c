//! Readers for the simulation outputs the analysis consumes.
//!
//! Every reader takes a [`BufRead`] so it can be fed from memory; the `*_from_path` variants open
//! the file and attach its path to any error.

pub mod dirs;
pub mod ipi;
pub mod lammps;
pub mod phonopy;

use crate::errors::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use dirs::labelled_subdirectories;
pub use ipi::{DualPotentialSeries, TimeSeries};

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| AnharmError::io(path, e))
}

fn collect_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| AnharmError::io("", e))
}

/// Parse whitespace separated numbers; `line_no` is one-based
fn parse_row(line: &str, line_no: usize) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|field| {
            field.parse::<f64>().map_err(|_| {
                AnharmError::parse("", line_no, format!("'{}' is not a number", field))
            })
        })
        .collect()
}
