//! LAMMPS log files.

use super::{collect_lines, open};
use crate::errors::*;
use std::io::BufRead;
use std::path::Path;

/// Line that LAMMPS prints right after the last thermo output of a run
pub const LOOP_TIME_MARKER: &str = "Loop time";

/// Name LAMMPS gives its log inside a run directory
pub const LOG_FILE_NAME: &str = "log.lammps";

/// Read the lattice energy of a relaxed structure from a LAMMPS log.
///
/// The energy is the second field of the last thermo line, i.e. the line right before the first
/// line starting with [`LOOP_TIME_MARKER`]. The value is returned as printed, before any
/// normalisation.
pub fn read_lattice_energy<R: BufRead>(reader: R) -> Result<f64> {
    let lines = collect_lines(reader)?;

    let marker = lines
        .iter()
        .position(|line| line.starts_with(LOOP_TIME_MARKER))
        .ok_or(AnharmError::MissingMarker {
            path: Default::default(),
            marker: LOOP_TIME_MARKER,
        })?;
    if marker == 0 {
        return Err(AnharmError::parse(
            "",
            1,
            "no thermo line before the loop time line",
        ));
    }

    let thermo = &lines[marker - 1];
    let field = thermo.split_whitespace().nth(1).ok_or_else(|| {
        AnharmError::parse("", marker, "thermo line has fewer than two fields")
    })?;
    field.parse::<f64>().map_err(|_| {
        AnharmError::parse(
            "",
            marker,
            format!("energy field '{}' is not a number", field),
        )
    })
}

/// [`read_lattice_energy`] from a file, or from [`LOG_FILE_NAME`] if `path` is a directory
pub fn lattice_energy_from_path(path: &Path) -> Result<f64> {
    if path.is_dir() {
        return lattice_energy_from_path(&path.join(LOG_FILE_NAME));
    }
    read_lattice_energy(open(path)?).map_err(|e| e.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LOG: &str = "\
LAMMPS (29 Oct 2020)
Step PotEng Press
       0   -12.34   150.2
Loop time of 0.000123 on 1 procs for 0 steps with 32 atoms
";

    #[test]
    fn reads_energy_before_loop_time() {
        assert_eq!(read_lattice_energy(Cursor::new(LOG)).unwrap(), -12.34);
    }

    #[test]
    fn first_loop_time_wins() {
        let log = format!("{}       9   -99.0   1.0\n{}", LOG, "Loop time of 1 on 1 procs\n");
        assert_eq!(read_lattice_energy(Cursor::new(log)).unwrap(), -12.34);
    }

    #[test]
    fn missing_marker_is_reported() {
        let log = "Step PotEng\n0 -1.0\n";
        assert!(matches!(
            read_lattice_energy(Cursor::new(log)),
            Err(AnharmError::MissingMarker {
                marker: LOOP_TIME_MARKER,
                ..
            })
        ));
    }

    #[test]
    fn marker_on_first_line_is_malformed() {
        let log = "Loop time of 1 on 1 procs\n";
        assert!(matches!(
            read_lattice_energy(Cursor::new(log)),
            Err(AnharmError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn non_numeric_energy_is_reported() {
        let log = "Step PotEng\nLoop time of 1 on 1 procs\n";
        assert!(matches!(
            read_lattice_energy(Cursor::new(log)),
            Err(AnharmError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn directory_means_its_log_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(LOG_FILE_NAME), LOG).unwrap();
        assert_eq!(lattice_energy_from_path(dir.path()).unwrap(), -12.34);
    }

    #[test]
    fn missing_file_carries_path() {
        let path = Path::new("/nonexistent/anharm-rs/log.lammps");
        match lattice_energy_from_path(path) {
            Err(AnharmError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
