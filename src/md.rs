//! Mean potential energy of a set of MD runs at different temperatures.

use crate::autocorr::{mean, standard_error, AutocorrelationParams};
use crate::config::AnalysisConfig;
use crate::errors::*;
use crate::io::{ipi, labelled_subdirectories, TimeSeries};
use ndarray::Array1;
use std::path::Path;
use tracing::{debug, info};

/// Per-run averages of a temperature scan, sorted by the nominal temperature of the runs
#[derive(Debug, Clone, PartialEq)]
pub struct MdPotential {
    /// Mean measured temperature of each run in K
    pub temperature: Array1<f64>,
    /// Nominal temperature of each run, parsed from its label
    pub label: Array1<f64>,
    /// Mean potential energy per molecule in eV
    pub potential: Array1<f64>,
    /// Statistical error of `potential`, per molecule
    pub error: Array1<f64>,
}

impl MdPotential {
    /// Number of runs
    pub fn len(&self) -> usize {
        self.label.len()
    }

    /// Whether there are no runs
    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }
}

/// Average the temperature and potential energy of each labelled run.
///
/// The first `md_equilibration_steps` steps of every run are discarded. The error of each mean
/// potential comes from the autocorrelation estimate of its series. Energies are divided by
/// `nmols`.
pub fn md_potential(
    mut runs: Vec<(f64, TimeSeries)>,
    nmols: usize,
    config: &AnalysisConfig,
) -> Result<MdPotential> {
    if nmols == 0 {
        return Err(AnharmError::InvalidInput(
            "number of molecules must be positive".to_string(),
        ));
    }
    runs.sort_by(|a, b| a.0.total_cmp(&b.0));
    if let Some(window) = runs.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(AnharmError::InvalidInput(format!(
            "two runs are labelled {}",
            window[0].0
        )));
    }

    let skip = config.md_equilibration_steps();
    let params = config.autocorrelation();
    let n = runs.len();
    let mut result = MdPotential {
        temperature: Array1::zeros(n),
        label: Array1::zeros(n),
        potential: Array1::zeros(n),
        error: Array1::zeros(n),
    };

    for (i, (label, series)) in runs.iter().enumerate() {
        let (t, u, err) =
            run_averages(series, skip, config, &params).map_err(|e| e.in_run(*label))?;
        debug!(label, temperature = t, potential = u, error = err, "averaged MD run");

        result.temperature[i] = t;
        result.label[i] = *label;
        result.potential[i] = u / nmols as f64;
        result.error[i] = err / nmols as f64;
    }

    Ok(result)
}

fn run_averages(
    series: &TimeSeries,
    skip: usize,
    config: &AnalysisConfig,
    params: &AutocorrelationParams,
) -> Result<(f64, f64, f64)> {
    let temperature = series.column_from(config.temperature_column(), skip)?;
    let potential = series.column_from(config.potential_column(), skip)?;
    if potential.len() < 2 {
        return Err(AnharmError::too_few(
            format!("MD run after discarding {} equilibration steps", skip),
            skip + 2,
            series.len(),
        ));
    }

    Ok((
        mean(temperature),
        mean(potential),
        standard_error(potential, params)?,
    ))
}

/// [`md_potential`] over the run directories of `dir`.
///
/// Every subdirectory is named by its nominal temperature and holds a run file named
/// [`AnalysisConfig::run_file_name`].
pub fn md_potential_from_dir(
    dir: &Path,
    nmols: usize,
    config: &AnalysisConfig,
) -> Result<MdPotential> {
    let runs = labelled_subdirectories(dir)?
        .into_iter()
        .map(|(label, path)| {
            let file = path.join(config.run_file_name());
            ipi::time_series_from_path(&file, config.header_scan_lines())
                .map(|series| (label, series))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(dir = %dir.display(), runs = runs.len(), "read MD runs");
    md_potential(runs, nmols, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    /// Run with columns [step, time, conserved, temperature, kinetic, potential]
    fn run(
        temperature: impl Fn(usize) -> f64,
        potential: impl Fn(usize) -> f64,
        steps: usize,
    ) -> TimeSeries {
        let mut data = Array2::<f64>::zeros((steps, 6));
        for t in 0..steps {
            data[[t, 0]] = t as f64;
            data[[t, 3]] = temperature(t);
            data[[t, 5]] = potential(t);
        }
        TimeSeries {
            columns: Vec::new(),
            data,
        }
    }

    fn config(skip: usize) -> AnalysisConfig {
        AnalysisConfig::builder()
            .md_equilibration_steps(skip)
            .build()
            .unwrap()
    }

    #[test]
    fn sorts_runs_and_normalises() {
        let runs = vec![
            (300.0, run(|_| 301.0, |_| -30.0, 20)),
            (100.0, run(|_| 99.0, |_| -10.0, 20)),
            (200.0, run(|_| 200.5, |_| -20.0, 20)),
        ];
        let md = md_potential(runs, 2, &config(5)).unwrap();

        assert_eq!(md.label.to_vec(), vec![100.0, 200.0, 300.0]);
        assert_eq!(md.temperature.to_vec(), vec![99.0, 200.5, 301.0]);
        assert_eq!(md.potential.to_vec(), vec![-5.0, -10.0, -15.0]);
        assert_eq!(md.error.to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn discards_equilibration_steps() {
        // The first ten steps sit at a different energy and must not enter the mean.
        let runs = vec![(
            50.0,
            run(|_| 50.0, |t| if t < 10 { 100.0 } else { -1.0 }, 40),
        )];
        let md = md_potential(runs, 1, &config(10)).unwrap();

        assert_eq!(md.potential[0], -1.0);
        assert_eq!(md.error[0], 0.0);
    }

    #[test]
    fn flat_run_at_realistic_energy() {
        let runs = vec![(300.0, run(|_| 300.0, |_| -20.3, 1500))];
        let md = md_potential(runs, 1, &config(1000)).unwrap();

        assert_relative_eq!(md.potential[0], -20.3, max_relative = 1e-12);
        assert_eq!(md.error[0], 0.0);
    }

    #[test]
    fn error_is_normalised_by_molecules() {
        let wobble = |t: usize| if t % 3 == 0 { -1.0 } else { -1.2 };
        let one = md_potential(vec![(10.0, run(|_| 10.0, wobble, 60))], 1, &config(0)).unwrap();
        let four = md_potential(vec![(10.0, run(|_| 10.0, wobble, 60))], 4, &config(0)).unwrap();

        assert!(one.error[0] > 0.0);
        assert_relative_eq!(four.error[0], one.error[0] / 4.0, max_relative = 1e-12);
    }

    #[test]
    fn short_run_names_its_label() {
        let runs = vec![(400.0, run(|_| 400.0, |_| 1.0, 5))];
        match md_potential(runs, 1, &config(10)) {
            Err(AnharmError::Run { label, source }) => {
                assert_eq!(label, 400.0);
                assert!(matches!(*source, AnharmError::TooFewSamples { .. }));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let runs = vec![
            (100.0, run(|_| 100.0, |_| 1.0, 5)),
            (100.0, run(|_| 100.0, |_| 1.0, 5)),
        ];
        assert!(matches!(
            md_potential(runs, 1, &config(0)),
            Err(AnharmError::InvalidInput(_))
        ));
    }
}
