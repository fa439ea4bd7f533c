use crate::autocorr::AutocorrelationParams;

/// What to do when a computation produces a value that is not a finite number
///
/// The plain formulas silently yield `NaN` or `inf` for degenerate input (a series without any
/// correlated lag, the logarithm of a zero frequency). `Strict` turns those cases into errors;
/// `Propagate` lets the non-finite value through and logs a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericPolicy {
    /// Return an error
    Strict,
    /// Return the non-finite value
    Propagate,
}

impl Default for NumericPolicy {
    fn default() -> Self {
        Self::Strict
    }
}

/// Tunable parameters of the free energy analysis
///
/// # Examples
///
/// ```
/// use anharm_rs::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .md_equilibration_steps(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.md_equilibration_steps(), 500);
/// assert_eq!(config.max_lag(), 1000);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct AnalysisConfig {
    /// Number of autocorrelation lags examined
    #[builder(default = "1000")]
    max_lag: usize,

    /// Normalised autocorrelation above which a lag counts as correlated
    #[builder(default = "0.1")]
    decay_threshold: f64,

    /// Leading MD steps discarded as equilibration
    #[builder(default = "1000")]
    md_equilibration_steps: usize,

    /// Leading steps of a coupling run discarded as warm-up
    #[builder(default = "200")]
    coupling_warmup_steps: usize,

    /// Zero-based column of the temperature in an MD run file
    #[builder(default = "3")]
    temperature_column: usize,

    /// Zero-based column of the potential energy in an MD run file
    #[builder(default = "5")]
    potential_column: usize,

    /// Zero-based column of the elapsed time in a coupling run file
    #[builder(default = "1")]
    time_column: usize,

    /// Zero-based column of the force-field potential in a coupling run file
    #[builder(default = "7")]
    ff_column: usize,

    /// Zero-based column of the DFT potential in a coupling run file
    #[builder(default = "8")]
    dft_column: usize,

    /// Number of leading lines searched for `#` header lines in an MD run file
    #[builder(default = "20")]
    header_scan_lines: usize,

    /// Name of the time-series file inside every run directory
    #[builder(setter(into), default = "String::from(\"simulation.out\")")]
    run_file_name: String,

    /// How non-finite intermediate results are handled
    #[builder(default)]
    numeric_policy: NumericPolicy,
}

impl AnalysisConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(max_lag) = self.max_lag {
            if max_lag == 0 {
                return Err("max_lag must be at least 1".to_string());
            }
        }
        if let Some(threshold) = self.decay_threshold {
            if !(threshold > 0.0 && threshold < 1.0) {
                return Err(format!(
                    "decay_threshold must lie in (0, 1), not {}",
                    threshold
                ));
            }
        }
        if let Some(name) = &self.run_file_name {
            if name.is_empty() {
                return Err("run_file_name must not be empty".to_string());
            }
        }

        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("AnalysisConfig should not fail with default params")
    }
}

impl AnalysisConfig {
    /// Get a new builder for the `AnalysisConfig` struct
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Parameters of the autocorrelation error estimate
    pub fn autocorrelation(&self) -> AutocorrelationParams {
        AutocorrelationParams {
            max_lag: self.max_lag,
            decay_threshold: self.decay_threshold,
            policy: self.numeric_policy,
        }
    }

    /// Number of autocorrelation lags examined
    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Normalised autocorrelation above which a lag counts as correlated
    pub fn decay_threshold(&self) -> f64 {
        self.decay_threshold
    }

    /// Leading MD steps discarded as equilibration
    pub fn md_equilibration_steps(&self) -> usize {
        self.md_equilibration_steps
    }

    /// Leading steps of a coupling run discarded as warm-up
    pub fn coupling_warmup_steps(&self) -> usize {
        self.coupling_warmup_steps
    }

    /// Zero-based column of the temperature in an MD run file
    pub fn temperature_column(&self) -> usize {
        self.temperature_column
    }

    /// Zero-based column of the potential energy in an MD run file
    pub fn potential_column(&self) -> usize {
        self.potential_column
    }

    /// Zero-based column of the elapsed time in a coupling run file
    pub fn time_column(&self) -> usize {
        self.time_column
    }

    /// Zero-based column of the force-field potential in a coupling run file
    pub fn ff_column(&self) -> usize {
        self.ff_column
    }

    /// Zero-based column of the DFT potential in a coupling run file
    pub fn dft_column(&self) -> usize {
        self.dft_column
    }

    /// Number of leading lines searched for `#` header lines in an MD run file
    pub fn header_scan_lines(&self) -> usize {
        self.header_scan_lines
    }

    /// Name of the time-series file inside every run directory
    pub fn run_file_name(&self) -> &str {
        &self.run_file_name
    }

    /// How non-finite intermediate results are handled
    pub fn numeric_policy(&self) -> NumericPolicy {
        self.numeric_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();

        assert_eq!(config.max_lag(), 1000);
        assert_eq!(config.decay_threshold(), 0.1);
        assert_eq!(config.md_equilibration_steps(), 1000);
        assert_eq!(config.coupling_warmup_steps(), 200);
        assert_eq!(config.temperature_column(), 3);
        assert_eq!(config.potential_column(), 5);
        assert_eq!(
            (config.time_column(), config.ff_column(), config.dft_column()),
            (1, 7, 8)
        );
        assert_eq!(config.header_scan_lines(), 20);
        assert_eq!(config.run_file_name(), "simulation.out");
        assert_eq!(config.numeric_policy(), NumericPolicy::Strict);
    }

    #[test]
    fn rejects_zero_lags() {
        let err = AnalysisConfig::builder().max_lag(0).build().unwrap_err();
        assert!(err.contains("max_lag"));
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        assert!(AnalysisConfig::builder()
            .decay_threshold(1.5)
            .build()
            .is_err());
        assert!(AnalysisConfig::builder()
            .decay_threshold(0.0)
            .build()
            .is_err());
    }

    #[test]
    fn autocorrelation_params_follow_config() {
        let config = AnalysisConfig::builder()
            .max_lag(50)
            .decay_threshold(0.2)
            .numeric_policy(NumericPolicy::Propagate)
            .build()
            .unwrap();
        let params = config.autocorrelation();

        assert_eq!(params.max_lag, 50);
        assert_eq!(params.decay_threshold, 0.2);
        assert_eq!(params.policy, NumericPolicy::Propagate);
    }
}
