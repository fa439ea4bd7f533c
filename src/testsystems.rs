//! Crystals with closed-form free energies.
//!
//! # Examples
//!
//! Evaluate the free energy of an Einstein crystal with default parameters.
//!
//! ```
//! use anharm_rs::testsystems::*;
//! use ndarray::array;
//!
//! let crystal = EinsteinCrystal::default();
//! let f = crystal.analytical_free_energies(array![100.0, 200.0].view());
//! assert!(f.quantum[0] > f.classical[0]);
//! ```
//!
//! Generate the MD temperature scan of a weakly anharmonic crystal.
//!
//! ```
//! use anharm_rs::testsystems::*;
//! use ndarray::Array1;
//!
//! let crystal = AnharmonicCrystal::builder().anharmonicity(1.0e-7).build().unwrap();
//! let md = crystal.md_potential(Array1::linspace(100.0, 300.0, 5).view());
//! assert_eq!(md.len(), 5);
//! ```

use crate::anharmonic::harmonic_potential_energy;
use crate::consts::{ATOMIC_TIME_S, HBAR_J, J_TO_EV, KB_J};
use crate::errors::*;
use crate::harmonic::{HarmonicFreeEnergy, Spectrum};
use crate::md::MdPotential;
use ndarray::{Array1, ArrayView1};

/// `n_modes` identical harmonic oscillators of angular frequency `omega`
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate", name = "build_inner", private))]
pub struct EinsteinCrystal {
    /// Angular frequency of every mode in rad/s
    #[builder(default = "1.0e13")]
    omega: f64,

    /// Number of vibrational modes
    #[builder(default = "9")]
    n_modes: usize,

    /// Number of molecules the free energy is divided by
    #[builder(default = "1")]
    nmols: usize,

    /// Lattice energy per molecule in eV
    #[builder(default = "0.0")]
    u_latt: f64,
}

impl EinsteinCrystalBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(omega) = self.omega {
            if !(omega > 0.0 && omega.is_finite()) {
                return Err(format!("omega must be positive and finite (not {})", omega));
            }
        }
        if let Some(0) = self.nmols {
            return Err("nmols must be positive".to_string());
        }

        Ok(())
    }

    /// Build the crystal
    pub fn build(&self) -> Result<EinsteinCrystal> {
        Ok(self.build_inner()?)
    }
}

impl EinsteinCrystal {
    /// Get a new builder for the `EinsteinCrystal` struct.
    pub fn builder() -> EinsteinCrystalBuilder {
        EinsteinCrystalBuilder::default()
    }

    /// Angular frequency of the modes in rad/s
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Number of modes
    pub fn n_modes(&self) -> usize {
        self.n_modes
    }

    /// Number of molecules
    pub fn nmols(&self) -> usize {
        self.nmols
    }

    /// Lattice energy per molecule in eV
    pub fn u_latt(&self) -> f64 {
        self.u_latt
    }

    /// The crystal's modes, each with weight 1
    pub fn spectrum(&self) -> Spectrum {
        Spectrum::uniform(Array1::from_elem(self.n_modes, self.omega))
    }

    /// Dynamical matrix eigenvalues in atomic units, translations excluded
    pub fn eigenvalues(&self) -> Array1<f64> {
        Array1::from_elem(self.n_modes, (self.omega * ATOMIC_TIME_S).powi(2))
    }

    /// Free energy per molecule in eV.
    ///
    /// The quantum free energy of a mode is $k_B T \ln(2 \sinh(\hbar\omega / 2 k_B T))$, the
    /// classical one $k_B T \ln(\hbar\omega / k_B T)$.
    pub fn analytical_free_energies(
        &self,
        temperatures: ArrayView1<'_, f64>,
    ) -> HarmonicFreeEnergy {
        let scale = self.n_modes as f64 * J_TO_EV / self.nmols as f64;
        let reduced = temperatures.mapv(|t| HBAR_J * self.omega / (KB_J * t));

        let quantum = temperatures
            .iter()
            .zip(reduced.iter())
            .map(|(&t, &x)| KB_J * t * (2.0 * (x / 2.0).sinh()).ln() * scale + self.u_latt)
            .collect();
        let classical = temperatures
            .iter()
            .zip(reduced.iter())
            .map(|(&t, &x)| KB_J * t * x.ln() * scale + self.u_latt)
            .collect();

        HarmonicFreeEnergy { quantum, classical }
    }
}

impl Default for EinsteinCrystal {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("EinsteinCrystal should not fail with default params")
    }
}

/// Einstein crystal whose MD potential energy carries a quadratic anharmonic term
///
/// The potential energy per molecule at temperature $T$ is
///
/// $$
///     U(T) = U_{latt} + \frac{(3N - 3) k_B T}{2 n_{mol}} + a T^2
/// $$
///
/// so the classical free energy relative to the lowest temperature $T_0$ of a scan is the
/// Einstein one minus $a T (T - T_0)$.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate", name = "build_inner", private))]
pub struct AnharmonicCrystal {
    /// Angular frequency of the harmonic modes in rad/s
    #[builder(default = "1.0e13")]
    omega: f64,

    /// Atoms in the cell; the crystal has `3 * natoms - 3` modes
    #[builder(default = "4")]
    natoms: usize,

    /// Molecules in the cell
    #[builder(default = "1")]
    nmols: usize,

    /// Lattice energy per molecule in eV
    #[builder(default = "-1.0")]
    u_latt: f64,

    /// Coefficient $a$ of the anharmonic energy in eV/K²
    #[builder(default = "1.0e-7")]
    anharmonicity: f64,

    /// Statistical error reported for every MD run, per molecule
    #[builder(default = "0.0")]
    md_error: f64,
}

impl AnharmonicCrystalBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(natoms) = self.natoms {
            if natoms < 2 {
                return Err(format!("need at least two atoms (not {})", natoms));
            }
        }
        if let Some(0) = self.nmols {
            return Err("nmols must be positive".to_string());
        }
        if let Some(md_error) = self.md_error {
            if md_error < 0.0 {
                return Err(format!("md_error must not be negative (not {})", md_error));
            }
        }

        Ok(())
    }

    /// Build the crystal
    pub fn build(&self) -> Result<AnharmonicCrystal> {
        let crystal = self.build_inner()?;
        crystal.einstein_builder().build()?;
        Ok(crystal)
    }
}

impl AnharmonicCrystal {
    /// Get a new builder for the `AnharmonicCrystal` struct.
    pub fn builder() -> AnharmonicCrystalBuilder {
        AnharmonicCrystalBuilder::default()
    }

    /// Atoms in the cell
    pub fn natoms(&self) -> usize {
        self.natoms
    }

    /// Molecules in the cell
    pub fn nmols(&self) -> usize {
        self.nmols
    }

    /// Lattice energy per molecule in eV
    pub fn u_latt(&self) -> f64 {
        self.u_latt
    }

    /// Anharmonic coefficient in eV/K²
    pub fn anharmonicity(&self) -> f64 {
        self.anharmonicity
    }

    fn einstein_builder(&self) -> EinsteinCrystalBuilder {
        let mut builder = EinsteinCrystal::builder();
        builder
            .omega(self.omega)
            .n_modes(3 * self.natoms - 3)
            .nmols(self.nmols)
            .u_latt(self.u_latt);
        builder
    }

    /// The harmonic reference of the crystal
    pub fn einstein(&self) -> EinsteinCrystal {
        self.einstein_builder()
            .build()
            .expect("AnharmonicCrystal validates its harmonic reference when built")
    }

    /// Mean potential energy of ideal MD runs at `temperatures`, labelled by those temperatures
    pub fn md_potential(&self, temperatures: ArrayView1<'_, f64>) -> MdPotential {
        let u_harm = harmonic_potential_energy(temperatures, self.natoms) / self.nmols as f64;
        let potential = &u_harm
            + &temperatures.mapv(|t| self.anharmonicity * t * t)
            + self.u_latt;

        MdPotential {
            temperature: temperatures.to_owned(),
            label: temperatures.to_owned(),
            potential,
            error: Array1::from_elem(temperatures.len(), self.md_error),
        }
    }

    /// Classical free energy per molecule, with the scan starting at `temperatures[0]`
    pub fn analytical_classical_free_energy(
        &self,
        temperatures: ArrayView1<'_, f64>,
    ) -> Array1<f64> {
        let t0 = temperatures.iter().next().copied().unwrap_or_default();
        let harmonic = self.einstein().analytical_free_energies(temperatures);
        harmonic.classical - temperatures.mapv(|t| self.anharmonicity * t * (t - t0))
    }
}

impl Default for AnharmonicCrystal {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("AnharmonicCrystal should not fail with default params")
    }
}
