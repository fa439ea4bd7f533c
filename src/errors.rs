use std::path::PathBuf;
use thiserror::Error;

/// Enum for errors in this crate
#[derive(Error, Debug)]
pub enum AnharmError {
    /// Error returned when a builder's `build()` was called improperly
    #[error("Could not build: {0}")]
    BuilderError(String),

    /// Error returned when a file or directory cannot be read
    #[error("Could not read {}: {source}", path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        #[allow(missing_docs)]
        #[source]
        source: std::io::Error,
    },

    /// Error returned when a line of an input file does not have the expected shape
    #[error("Failed to parse {} (at line {line}): {details}", path.display())]
    Parse {
        /// File being parsed; empty when reading from an anonymous stream
        path: PathBuf,
        /// One-based line number
        line: usize,
        /// What was wrong with the line
        details: String,
    },

    /// Error returned when a marker line that anchors a value is absent
    #[error("No line starting with '{marker}' in {}", path.display())]
    MissingMarker {
        /// File being parsed
        path: PathBuf,
        /// The marker that was searched for
        marker: &'static str,
    },

    /// Error returned when a run directory is not named by a number
    #[error("Directory '{label}' in {} is not named by a number", dir.display())]
    NonNumericLabel {
        /// Parent directory
        dir: PathBuf,
        /// Offending subdirectory name
        label: String,
    },

    /// Error returned when no lag of the autocorrelation rises above the decay threshold
    #[error(
        "Cannot estimate statistical error of a series of {len} samples: \
         no autocorrelation lag above the decay threshold (series too short or too correlated)"
    )]
    DegenerateAutocorrelation {
        /// Length of the series
        len: usize,
    },

    /// Error returned when a weighted vibrational mode has a non-positive frequency
    #[error("Mode {index} has non-positive angular frequency {omega} rad/s")]
    NonPositiveFrequency {
        /// Index of the mode in the spectrum
        index: usize,
        /// Its angular frequency
        omega: f64,
    },

    /// Error returned when a series is too short for the requested operation
    #[error("{what}: need at least {needed} samples, found {found}")]
    TooFewSamples {
        /// Description of the series
        what: String,
        /// Minimum number of samples
        needed: usize,
        /// Number of samples available
        found: usize,
    },

    /// Error returned when an array is the wrong length
    #[error("Array of length {0} is incorrect; length should be {1}")]
    ArrayLengthMismatch(usize, usize),

    /// Error returned when input values are outside of their domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error raised while processing the run with the given temperature or lambda label
    #[error("Run {label}: {source}")]
    Run {
        /// Label of the run directory
        label: f64,
        #[allow(missing_docs)]
        #[source]
        source: Box<AnharmError>,
    },

    /// Error raised inside a named stage of the free energy pipeline
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Name of the stage
        stage: &'static str,
        #[allow(missing_docs)]
        #[source]
        source: Box<AnharmError>,
    },
}

impl From<String> for AnharmError {
    fn from(s: String) -> Self {
        Self::BuilderError(s)
    }
}

impl AnharmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            details: details.into(),
        }
    }

    pub(crate) fn too_few(what: impl Into<String>, needed: usize, found: usize) -> Self {
        Self::TooFewSamples {
            what: what.into(),
            needed,
            found,
        }
    }

    /// Attach a path to errors raised by readers that only saw a stream
    pub(crate) fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Parse { line, details, .. } => Self::Parse {
                path: path.into(),
                line,
                details,
            },
            Self::MissingMarker { marker, .. } => Self::MissingMarker {
                path: path.into(),
                marker,
            },
            Self::Io { source, .. } => Self::Io {
                path: path.into(),
                source,
            },
            other => other,
        }
    }

    /// Wrap the error with the label of the run it came from
    pub fn in_run(self, label: f64) -> Self {
        Self::Run {
            label,
            source: Box::new(self),
        }
    }

    /// Wrap the error with the name of the pipeline stage it came from
    pub fn in_stage(self, stage: &'static str) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

/// Result type for the anharm-rs crate
pub type Result<T> = std::result::Result<T, AnharmError>;
