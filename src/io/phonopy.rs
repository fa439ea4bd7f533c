//! phonopy total density of states files.

use super::{collect_lines, open, parse_row};
use crate::errors::*;
use ndarray::Array1;
use std::io::BufRead;
use std::path::Path;

/// Lines preceding the table in a DOS file
pub const HEADER_LINES: usize = 3;

/// Phonon density of states sampled on a frequency grid
#[derive(Debug, Clone, PartialEq)]
pub struct DensityOfStates {
    /// Frequency in cm⁻¹
    pub wavenumber: Array1<f64>,
    /// Density of states at each frequency
    pub dos: Array1<f64>,
}

/// Read a `(frequency, dos)` table after [`HEADER_LINES`] header lines.
///
/// Only the first two columns are used; extra columns (partial DOS) are ignored.
pub fn read_dos<R: BufRead>(reader: R) -> Result<DensityOfStates> {
    let lines = collect_lines(reader)?;

    let mut wavenumber = Vec::new();
    let mut dos = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(line, i + 1)?;
        if row.len() < 2 {
            return Err(AnharmError::parse(
                "",
                i + 1,
                "expected frequency and density of states",
            ));
        }
        wavenumber.push(row[0]);
        dos.push(row[1]);
    }

    Ok(DensityOfStates {
        wavenumber: Array1::from(wavenumber),
        dos: Array1::from(dos),
    })
}

/// [`read_dos`] from a file
pub fn dos_from_path(path: &Path) -> Result<DensityOfStates> {
    read_dos(open(path)?).map_err(|e| e.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Cursor;

    #[test]
    fn skips_three_header_lines() {
        let text = "\
# Sigma = 0.1
# frequency dos
# generated by phonopy
-0.5 0.0
 0.0 0.0
12.5 0.012 0.006 0.006
";
        let table = read_dos(Cursor::new(text)).unwrap();

        assert_eq!(table.wavenumber, array![-0.5, 0.0, 12.5]);
        assert_eq!(table.dos, array![0.0, 0.0, 0.012]);
    }

    #[test]
    fn single_column_row_is_rejected() {
        let text = "a\nb\nc\n1.0 2.0\n3.0\n";
        assert!(matches!(
            read_dos(Cursor::new(text)),
            Err(AnharmError::Parse { line: 5, .. })
        ));
    }
}
