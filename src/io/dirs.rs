//! Run directories named by their temperature or coupling parameter.

use crate::errors::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectories of `dir` whose names are numbers, sorted by that number.
///
/// Files are ignored. Any subdirectory whose name does not parse as a finite number is an
/// error: a stray directory in a dataset is a configuration mistake, not something to skip.
pub fn labelled_subdirectories(dir: &Path) -> Result<Vec<(f64, PathBuf)>> {
    let mut labelled = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| AnharmError::io(dir, e))? {
        let path = entry.map_err(|e| AnharmError::io(dir, e))?.path();
        if !path.is_dir() {
            continue;
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = name
            .parse::<f64>()
            .ok()
            .filter(|label| label.is_finite())
            .ok_or_else(|| AnharmError::NonNumericLabel {
                dir: dir.to_path_buf(),
                label: name.clone(),
            })?;
        labelled.push((label, path));
    }

    labelled.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(labelled)
}
