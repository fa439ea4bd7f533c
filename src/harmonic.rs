//! Quantum and classical free energy of a set of harmonic oscillators.

use crate::config::NumericPolicy;
use crate::consts::{ATOMIC_TIME_S, CM_TO_HZ, HBAR_J, J_TO_EV, KB_J};
use crate::errors::*;
use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;
use tracing::warn;

/// Vibrational spectrum: angular frequencies with a weight per mode
///
/// The weight is the density of states for a phonopy-style spectrum and 1 for a list of
/// normal modes.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    omega: Array1<f64>,
    weight: Array1<f64>,
}

impl Spectrum {
    /// Modes with angular frequencies `omega` (rad/s), each with weight 1
    pub fn uniform(omega: Array1<f64>) -> Self {
        let weight = Array1::from_elem(omega.len(), 1.0);
        Self { omega, weight }
    }

    /// Modes with angular frequencies `omega` (rad/s) weighted by `weight`
    pub fn weighted(omega: Array1<f64>, weight: Array1<f64>) -> Result<Self> {
        if omega.len() != weight.len() {
            return Err(AnharmError::ArrayLengthMismatch(weight.len(), omega.len()));
        }
        Ok(Self { omega, weight })
    }

    /// Normal modes from i-PI dynamical matrix eigenvalues
    ///
    /// Eigenvalues are squared angular frequencies in atomic units. Their magnitude is used, so
    /// small negative eigenvalues from numerical noise become real modes.
    pub fn from_ipi_eigenvalues(eigenvalues: ArrayView1<'_, f64>) -> Self {
        let omega = eigenvalues.mapv(|lambda| lambda.abs().sqrt() / ATOMIC_TIME_S);
        Self::uniform(omega)
    }

    /// Phonon density of states from phonopy, frequencies in cm⁻¹
    pub fn from_phonopy_dos(
        wavenumber: ArrayView1<'_, f64>,
        dos: ArrayView1<'_, f64>,
    ) -> Result<Self> {
        let omega = wavenumber.mapv(|nu| 2.0 * PI * nu * CM_TO_HZ);
        Self::weighted(omega, dos.to_owned())
    }

    /// Angular frequencies in rad/s
    pub fn omega(&self) -> &Array1<f64> {
        &self.omega
    }

    /// Weight of each mode
    pub fn weight(&self) -> &Array1<f64> {
        &self.weight
    }

    /// Number of modes
    pub fn len(&self) -> usize {
        self.omega.len()
    }

    /// Whether the spectrum has no modes
    pub fn is_empty(&self) -> bool {
        self.omega.is_empty()
    }

    /// Modes that contribute to the free energy: non-zero weight
    fn active_modes(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.omega
            .iter()
            .zip(self.weight.iter())
            .enumerate()
            .filter(|(_, (_, w))| **w != 0.0)
            .map(|(i, (&omega, &w))| (i, omega, w))
    }
}

/// Harmonic free energy per molecule in eV, one entry per temperature
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicFreeEnergy {
    /// Quantum oscillators, including zero-point energy
    pub quantum: Array1<f64>,
    /// Classical oscillators
    pub classical: Array1<f64>,
}

/// Evaluate the harmonic free energy of `spectrum` at each temperature.
///
/// $$
/// \begin{aligned}
///     F_q(T) &= \sum_i w_i \left[ \frac{\hbar\omega_i}{2} + k_B T \ln\left(1 - e^{-\hbar\omega_i/k_B T}\right) \right] \\\\
///     F_c(T) &= \sum_i w_i\, k_B T \ln\frac{\hbar\omega_i}{k_B T}
/// \end{aligned}
/// $$
///
/// Both are converted to eV, divided by `nmols` and offset by the lattice energy `u_latt`.
///
/// # Notes
///
/// - Modes with zero weight are skipped, so they contribute exactly nothing whatever their
///   frequency.
/// - A weighted mode with $\omega \le 0$ has no finite free energy. Under
///   [`NumericPolicy::Strict`] it is an error; under [`NumericPolicy::Propagate`] the
///   logarithm's `-inf`/`NaN` flows into the result.
pub fn harmonic_free_energy(
    spectrum: &Spectrum,
    temperatures: ArrayView1<'_, f64>,
    nmols: usize,
    u_latt: f64,
    policy: NumericPolicy,
) -> Result<HarmonicFreeEnergy> {
    if nmols == 0 {
        return Err(AnharmError::InvalidInput(
            "number of molecules must be positive".to_string(),
        ));
    }
    if let Some(&t) = temperatures.iter().find(|&&t| !(t > 0.0 && t.is_finite())) {
        return Err(AnharmError::InvalidInput(format!(
            "temperature {} K is not positive",
            t
        )));
    }
    if let Some((index, omega, _)) = spectrum.active_modes().find(|&(_, omega, _)| !(omega > 0.0))
    {
        match policy {
            NumericPolicy::Strict => {
                return Err(AnharmError::NonPositiveFrequency { index, omega });
            }
            NumericPolicy::Propagate => {
                warn!(index, omega, "weighted mode with non-positive frequency");
            }
        }
    }

    let scale = J_TO_EV / nmols as f64;
    let mut quantum = Array1::<f64>::zeros(temperatures.len());
    let mut classical = Array1::<f64>::zeros(temperatures.len());
    for (k, &t) in temperatures.iter().enumerate() {
        let kt = KB_J * t;
        let (mut fq, mut fc) = (0.0, 0.0);
        for (_, omega, w) in spectrum.active_modes() {
            let x = HBAR_J * omega / kt;
            // ln(1 - e^-x) through exp_m1 keeps precision for soft modes
            fq += w * (HBAR_J * omega / 2.0 + kt * (-(-x).exp_m1()).ln());
            fc += w * kt * x.ln();
        }
        quantum[k] = fq * scale + u_latt;
        classical[k] = fc * scale + u_latt;
    }

    Ok(HarmonicFreeEnergy { quantum, classical })
}
