//! Statistical error of the mean of a serially correlated time series.

use crate::config::NumericPolicy;
use crate::errors::*;
use crate::integrate::gradient;
use ndarray::{Array1, ArrayView1};
use tracing::warn;

/// Parameters of the autocorrelation error estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutocorrelationParams {
    /// Number of lags examined. Lags past the end of the series contribute nothing.
    pub max_lag: usize,
    /// A lag counts as correlated while its normalised autocorrelation exceeds this value
    pub decay_threshold: f64,
    /// What to do when no lag exceeds the threshold
    pub policy: NumericPolicy,
}

impl Default for AutocorrelationParams {
    fn default() -> Self {
        Self {
            max_lag: 1000,
            decay_threshold: 0.1,
            policy: NumericPolicy::Strict,
        }
    }
}

/// Standard error of the mean of a time series, corrected for serial correlation
///
/// # Notes
///
/// The estimate works on the first differences `ug` of the series. The lag-$i$ autocovariance
/// $c_i = \sum_t ug_t\, ug_{t+i}$ is normalised by $c_0$ and folded onto positive values with
/// $c_i\,\mathrm{sign}(c_i)$, where $\mathrm{sign}(0) = 0$. The number of lags with
/// $c_i$ above the decay threshold is taken as the correlation length $c_{trs}$, giving
/// $N = \mathrm{len}(u) / c_{trs}$ independent samples and a standard error of
/// $\sigma(u) / \sqrt{N}$, with $\sigma$ the population standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct AutocorrelationEstimate {
    /// $\sigma(u)/\sqrt{N}$
    pub standard_error: f64,
    /// Number of lags whose normalised autocorrelation exceeds the threshold
    pub decay_cutoff: usize,
    /// Effective number of independent samples
    pub n_independent: f64,
    /// Normalised, sign-folded autocorrelation of the first differences, one entry per lag
    pub autocorrelation: Array1<f64>,
}

impl AutocorrelationEstimate {
    /// Estimate the correlation-corrected standard error of `u`
    pub fn new(u: ArrayView1<'_, f64>, params: &AutocorrelationParams) -> Result<Self> {
        let n = u.len();
        let ug = gradient(u)?;

        let lags = params.max_lag.min(n);
        let mut c = Array1::<f64>::zeros(lags);
        for lag in 0..lags {
            c[lag] = (0..n - lag).map(|t| ug[t] * ug[t + lag]).sum::<f64>();
        }
        let c0 = c[0];
        let autocorrelation = c.mapv(|v| {
            let r = v / c0;
            r * sign(r)
        });

        let decay_cutoff = autocorrelation
            .iter()
            .filter(|&&r| r > params.decay_threshold)
            .count();

        if decay_cutoff == 0 {
            // All first differences vanish: the series is constant and its mean is exact.
            if c0 == 0.0 {
                return Ok(Self {
                    standard_error: 0.0,
                    decay_cutoff,
                    n_independent: f64::INFINITY,
                    autocorrelation,
                });
            }
            match params.policy {
                NumericPolicy::Strict => {
                    return Err(AnharmError::DegenerateAutocorrelation { len: n });
                }
                NumericPolicy::Propagate => {
                    warn!(len = n, "no autocorrelation lag above threshold; error is not finite");
                }
            }
        }

        let n_independent = n as f64 / decay_cutoff as f64;
        Ok(Self {
            standard_error: std_dev(u) / n_independent.sqrt(),
            decay_cutoff,
            n_independent,
            autocorrelation,
        })
    }
}

/// Shorthand for [`AutocorrelationEstimate::new`] returning only the standard error
pub fn standard_error(u: ArrayView1<'_, f64>, params: &AutocorrelationParams) -> Result<f64> {
    Ok(AutocorrelationEstimate::new(u, params)?.standard_error)
}

/// Arithmetic mean; `NaN` for an empty series
pub fn mean(u: ArrayView1<'_, f64>) -> f64 {
    u.iter().sum::<f64>() / u.len() as f64
}

/// Population standard deviation (normalised by `N`, not `N - 1`)
pub fn std_dev(u: ArrayView1<'_, f64>) -> f64 {
    let m = mean(u);
    let variance = u.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / u.len() as f64;
    variance.sqrt()
}

/// Sign of `v`, with `sign(0) == 0` and `sign(NaN)` NaN
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else if v == 0.0 {
        0.0
    } else {
        f64::NAN
    }
}
