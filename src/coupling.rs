//! Thermodynamic integration from the force field to DFT over a coupling parameter.

use crate::autocorr::{mean, standard_error};
use crate::config::AnalysisConfig;
use crate::errors::*;
use crate::integrate::{cumulative_trapezoid, gradient};
use crate::io::ipi::{self, DualPotentialColumns, DualPotentialSeries};
use crate::io::labelled_subdirectories;
use ndarray::{s, Array1};
use std::path::Path;
use tracing::{debug, info};

/// Mean energy difference between DFT and the force field at one value of lambda
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambdaPoint {
    /// Coupling parameter
    pub lambda: f64,
    /// `mean(dft - ff) / nmols` in eV
    pub delta: f64,
    /// Average of the statistical errors of the two potentials
    pub error: f64,
}

impl LambdaPoint {
    /// Average a coupling run after its warm-up.
    ///
    /// The first `coupling_warmup_steps` steps are discarded. The error is the mean of the
    /// autocorrelation errors of the force-field and DFT series and is not divided by `nmols`.
    pub fn from_series(
        lambda: f64,
        series: &DualPotentialSeries,
        nmols: usize,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        if nmols == 0 {
            return Err(AnharmError::InvalidInput(
                "number of molecules must be positive".to_string(),
            ));
        }
        if series.ff.len() != series.dft.len() {
            return Err(AnharmError::ArrayLengthMismatch(
                series.dft.len(),
                series.ff.len(),
            ));
        }

        let skip = config.coupling_warmup_steps().min(series.ff.len());
        let ff = series.ff.slice(s![skip..]);
        let dft = series.dft.slice(s![skip..]);
        if ff.len() < 2 {
            return Err(AnharmError::too_few(
                format!(
                    "coupling run after discarding {} warm-up steps",
                    config.coupling_warmup_steps()
                ),
                config.coupling_warmup_steps() + 2,
                series.ff.len(),
            ));
        }

        let params = config.autocorrelation();
        let delta = mean((&dft - &ff).view()) / nmols as f64;
        let error = (standard_error(ff, &params)? + standard_error(dft, &params)?) / 2.0;

        debug!(lambda, delta, error, "averaged coupling run");
        Ok(Self {
            lambda,
            delta,
            error,
        })
    }
}

/// Free energy of switching from the force field to DFT
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouplingCorrection {
    /// Integral over the whole lambda range, in eV per molecule
    pub free_energy: f64,
    /// Statistical error carried through the integral
    pub md_error: f64,
    /// Trapezoid truncation error of the integral
    pub truncation_error: f64,
}

/// Integrate the energy differences of `points` over lambda.
///
/// Points are sorted by lambda first. The integrand is divided by the mean spacing of the
/// lambda grid (from [`gradient`]), and only the integral over the full range is reported.
pub fn coupling_correction(mut points: Vec<LambdaPoint>) -> Result<CouplingCorrection> {
    if points.len() < 2 {
        return Err(AnharmError::too_few("lambda points", 2, points.len()));
    }
    points.sort_by(|a, b| a.lambda.total_cmp(&b.lambda));
    if let Some(pair) = points.windows(2).find(|pair| pair[0].lambda == pair[1].lambda) {
        return Err(AnharmError::InvalidInput(format!(
            "two coupling runs at lambda = {}",
            pair[0].lambda
        )));
    }

    let lambda: Array1<f64> = points.iter().map(|p| p.lambda).collect();
    let spacing = mean(gradient(lambda.view())?.view());
    let delta: Array1<f64> = points.iter().map(|p| p.delta / spacing).collect();
    let error: Array1<f64> = points.iter().map(|p| p.error / spacing).collect();

    let energy = cumulative_trapezoid(lambda.view(), delta.view())?;
    let md = cumulative_trapezoid(lambda.view(), error.view())?;

    Ok(CouplingCorrection {
        free_energy: energy.total(),
        md_error: md.total().abs(),
        truncation_error: energy.total_error().abs(),
    })
}

/// [`coupling_correction`] over the lambda directories of `dir`.
///
/// Every subdirectory is named by its lambda and holds a run file named
/// [`AnalysisConfig::run_file_name`] with both potentials.
pub fn coupling_correction_from_dir(
    dir: &Path,
    nmols: usize,
    config: &AnalysisConfig,
) -> Result<CouplingCorrection> {
    let columns = DualPotentialColumns {
        time: config.time_column(),
        ff: config.ff_column(),
        dft: config.dft_column(),
    };

    let points = labelled_subdirectories(dir)?
        .into_iter()
        .map(|(lambda, path)| {
            let file = path.join(config.run_file_name());
            ipi::dual_potential_from_path(&file, columns)
                .and_then(|series| LambdaPoint::from_series(lambda, &series, nmols, config))
                .map_err(|e| e.in_run(lambda))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(dir = %dir.display(), points = points.len(), "read coupling runs");
    coupling_correction(points)
}
