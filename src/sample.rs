//! The free energy of one crystal, assembled from all of its simulation outputs.
//!
//! A [`FreeEnergySample`] is computed in stages, each a plain function returning its own
//! result:
//!
//! 1. `lattice`: lattice energy from the LAMMPS log of the relaxed structure
//! 2. `md`: mean potential energy of every MD run of the temperature scan
//! 3. `harmonic`: harmonic free energies from the i-PI and phonopy spectra
//! 4. `anharmonic`: temperature integration of the anharmonic energy
//! 5. `coupling`: force-field to DFT correction
//!
//! An error from any stage is returned wrapped in [`AnharmError::Stage`] with the stage's name.

use crate::anharmonic::{anharmonic_free_energy, AnharmonicFreeEnergy};
use crate::config::{AnalysisConfig, NumericPolicy};
use crate::coupling::{coupling_correction_from_dir, CouplingCorrection};
use crate::errors::*;
use crate::harmonic::{harmonic_free_energy, HarmonicFreeEnergy, Spectrum};
use crate::io::{ipi, lammps, phonopy};
use crate::md::{md_potential_from_dir, MdPotential};
use ndarray::ArrayView1;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of the simulation outputs of one crystal and the cell each one describes
///
/// Each output comes with the number of molecules (or atoms) its energies are divided by.
///
/// # Examples
///
/// ```no_run
/// use anharm_rs::sample::FreeEnergySample;
///
/// let sample = FreeEnergySample::builder()
///     .lattice_log("crystal/relax/")
///     .lattice_nmols(4)
///     .md_dir("crystal/md/")
///     .md_nmols(4)
///     .harmonic_natoms(48)
///     .harmonic_nmols(4)
///     .phonopy_dos("crystal/phonopy/total_dos.dat")
///     .phonopy_nmols(4)
///     .ipi_eigenvalues("crystal/ipi/phonons.eigval")
///     .ipi_nmols(4)
///     .coupling_dir("crystal/ff_dft/")
///     .coupling_nmols(4)
///     .build()
///     .unwrap();
///
/// for row in sample.rows() {
///     println!("{} K: {} ± {} eV", row.temperature, row.quantum, row.error);
/// }
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate", name = "build_inner", private))]
pub struct SampleInputs {
    /// LAMMPS log of the relaxed crystal, or the directory holding `log.lammps`
    #[builder(setter(into))]
    lattice_log: PathBuf,
    /// Molecules in the relaxed cell
    lattice_nmols: usize,

    /// Directory with one subdirectory per MD temperature
    #[builder(setter(into))]
    md_dir: PathBuf,
    /// Molecules in the MD cell
    md_nmols: usize,

    /// Atoms in the cell used for the harmonic potential energy
    harmonic_natoms: usize,
    /// Molecules in the cell used for the harmonic potential energy
    harmonic_nmols: usize,

    /// phonopy total density of states
    #[builder(setter(into))]
    phonopy_dos: PathBuf,
    /// Molecules in the phonopy cell
    phonopy_nmols: usize,

    /// i-PI dynamical matrix eigenvalues
    #[builder(setter(into))]
    ipi_eigenvalues: PathBuf,
    /// Molecules in the i-PI cell
    ipi_nmols: usize,

    /// Directory with one subdirectory per coupling parameter
    #[builder(setter(into))]
    coupling_dir: PathBuf,
    /// Molecules in the coupling runs
    coupling_nmols: usize,

    /// Parameters of the analysis
    #[builder(default)]
    config: AnalysisConfig,
}

impl SampleInputsBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let counts = [
            ("lattice_nmols", self.lattice_nmols),
            ("md_nmols", self.md_nmols),
            ("harmonic_natoms", self.harmonic_natoms),
            ("harmonic_nmols", self.harmonic_nmols),
            ("phonopy_nmols", self.phonopy_nmols),
            ("ipi_nmols", self.ipi_nmols),
            ("coupling_nmols", self.coupling_nmols),
        ];
        for (name, count) in counts.iter() {
            if let Some(0) = count {
                return Err(format!("{} must be positive", name));
            }
        }

        Ok(())
    }

    /// Read every input and compute the free energy
    pub fn build(&self) -> Result<FreeEnergySample> {
        FreeEnergySample::from_inputs(self.build_inner()?)
    }
}

/// Harmonic free energies of the same crystal from two lattice dynamics codes
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicReference {
    /// From i-PI normal modes at the Γ point
    pub ipi: HarmonicFreeEnergy,
    /// From the phonopy density of states
    pub phonopy: HarmonicFreeEnergy,
}

/// Free energy of one crystal along its MD temperature scan
///
/// Everything is computed when the sample is built; a sample is never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeEnergySample {
    inputs: SampleInputs,
    u_latt: f64,
    md: MdPotential,
    harmonic: HarmonicReference,
    anharmonic: AnharmonicFreeEnergy,
    coupling: CouplingCorrection,
}

/// The free energy at one temperature of a [`FreeEnergySample`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRow {
    /// Nominal temperature in K
    pub temperature: f64,
    /// Classical anharmonic free energy in eV per molecule
    pub classical: f64,
    /// Quantum anharmonic free energy in eV per molecule
    pub quantum: f64,
    /// Total error of both
    pub error: f64,
}

impl FreeEnergySample {
    /// Get a new builder for the inputs of a `FreeEnergySample`. Building it runs the analysis.
    pub fn builder() -> SampleInputsBuilder {
        SampleInputsBuilder::default()
    }

    /// Run every stage of the analysis on `inputs`
    pub fn from_inputs(inputs: SampleInputs) -> Result<Self> {
        let config = &inputs.config;
        debug!(?inputs, "computing free energy sample");

        let u_latt = stage("lattice", || {
            lattice_energy(&inputs.lattice_log, inputs.lattice_nmols)
        })?;
        let md = stage("md", || {
            md_potential_from_dir(&inputs.md_dir, inputs.md_nmols, config)
        })?;
        let harmonic = stage("harmonic", || {
            harmonic_reference(
                &inputs.ipi_eigenvalues,
                inputs.ipi_nmols,
                &inputs.phonopy_dos,
                inputs.phonopy_nmols,
                md.label.view(),
                u_latt,
                config.numeric_policy(),
            )
        })?;
        let anharmonic = stage("anharmonic", || {
            anharmonic_free_energy(
                &md,
                &harmonic.ipi,
                u_latt,
                inputs.harmonic_natoms,
                inputs.harmonic_nmols,
            )
        })?;
        let coupling = stage("coupling", || {
            coupling_correction_from_dir(&inputs.coupling_dir, inputs.coupling_nmols, config)
        })?;

        Ok(Self {
            inputs,
            u_latt,
            md,
            harmonic,
            anharmonic,
            coupling,
        })
    }

    /// The inputs the sample was computed from
    pub fn inputs(&self) -> &SampleInputs {
        &self.inputs
    }

    /// Lattice energy per molecule in eV
    pub fn u_latt(&self) -> f64 {
        self.u_latt
    }

    /// Per-run averages of the MD temperature scan
    pub fn md(&self) -> &MdPotential {
        &self.md
    }

    /// Harmonic free energies on the nominal temperatures of the scan
    pub fn harmonic(&self) -> &HarmonicReference {
        &self.harmonic
    }

    /// Anharmonic free energy and its intermediate terms
    pub fn anharmonic(&self) -> &AnharmonicFreeEnergy {
        &self.anharmonic
    }

    /// Force-field to DFT correction
    pub fn coupling(&self) -> &CouplingCorrection {
        &self.coupling
    }

    /// The anharmonic free energy one temperature at a time
    pub fn rows(&self) -> impl Iterator<Item = TemperatureRow> + '_ {
        let f = &self.anharmonic;
        (0..f.temperature.len()).map(move |k| TemperatureRow {
            temperature: f.temperature[k],
            classical: f.classical[k],
            quantum: f.quantum[k],
            error: f.total_error[k],
        })
    }
}

impl SampleInputs {
    /// Parameters of the analysis
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

fn stage<T>(name: &'static str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    let result = run().map_err(|e| e.in_stage(name))?;
    info!(stage = name, "stage complete");
    Ok(result)
}

/// Lattice energy per molecule from a LAMMPS log
pub fn lattice_energy(log: &Path, nmols: usize) -> Result<f64> {
    if nmols == 0 {
        return Err(AnharmError::InvalidInput(
            "number of molecules must be positive".to_string(),
        ));
    }
    Ok(lammps::lattice_energy_from_path(log)? / nmols as f64)
}

/// Harmonic free energies from an i-PI eigenvalue file and a phonopy DOS file
pub fn harmonic_reference(
    ipi_eigenvalues: &Path,
    ipi_nmols: usize,
    phonopy_dos: &Path,
    phonopy_nmols: usize,
    temperatures: ArrayView1<'_, f64>,
    u_latt: f64,
    policy: NumericPolicy,
) -> Result<HarmonicReference> {
    let eigenvalues = ipi::eigenvalues_from_path(ipi_eigenvalues)?;
    let ipi_spectrum = Spectrum::from_ipi_eigenvalues(eigenvalues.view());
    let ipi = harmonic_free_energy(&ipi_spectrum, temperatures, ipi_nmols, u_latt, policy)?;

    let dos = phonopy::dos_from_path(phonopy_dos)?;
    let phonopy_spectrum = Spectrum::from_phonopy_dos(dos.wavenumber.view(), dos.dos.view())?;
    let phonopy =
        harmonic_free_energy(&phonopy_spectrum, temperatures, phonopy_nmols, u_latt, policy)?;

    debug!(
        ipi_modes = ipi_spectrum.len(),
        phonopy_bins = phonopy_spectrum.len(),
        "evaluated harmonic reference"
    );
    Ok(HarmonicReference { ipi, phonopy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn samples_are_send_and_sync() {
        assert_send_sync::<FreeEnergySample>();
        assert_send_sync::<SampleInputs>();
    }

    fn complete_builder(root: &Path) -> SampleInputsBuilder {
        let mut builder = FreeEnergySample::builder();
        builder
            .lattice_log(root.join("relax"))
            .lattice_nmols(1)
            .md_dir(root.join("md"))
            .md_nmols(1)
            .harmonic_natoms(2)
            .harmonic_nmols(1)
            .phonopy_dos(root.join("total_dos.dat"))
            .phonopy_nmols(1)
            .ipi_eigenvalues(root.join("phonons.eigval"))
            .ipi_nmols(1)
            .coupling_dir(root.join("ff_dft"))
            .coupling_nmols(1);
        builder
    }

    #[test]
    fn zero_counts_are_rejected() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            complete_builder(root.path()).md_nmols(0).build(),
            Err(AnharmError::BuilderError(_))
        ));
    }

    #[test]
    fn missing_input_is_a_builder_error() {
        assert!(matches!(
            FreeEnergySample::builder().lattice_nmols(1).build(),
            Err(AnharmError::BuilderError(_))
        ));
    }

    #[test]
    fn failure_names_its_stage() {
        let root = TempDir::new().unwrap();
        match complete_builder(root.path()).build() {
            Err(AnharmError::Stage { stage, source }) => {
                assert_eq!(stage, "lattice");
                assert!(matches!(*source, AnharmError::Io { .. }));
            }
            other => panic!("unexpected result {:?}", other),
        }

        let relax = root.path().join("relax");
        fs::create_dir(&relax).unwrap();
        fs::write(relax.join("log.lammps"), "0 -1.0\nLoop time of 1\n").unwrap();
        match complete_builder(root.path()).build() {
            Err(AnharmError::Stage { stage, .. }) => assert_eq!(stage, "md"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn lattice_energy_is_per_molecule() {
        let root = TempDir::new().unwrap();
        let log = root.path().join("log.lammps");
        fs::write(&log, "Step PotEng\n10 -8.0 0.0\nLoop time of 1\n").unwrap();

        assert_eq!(lattice_energy(&log, 4).unwrap(), -2.0);
        assert!(lattice_energy(&log, 0).is_err());
    }
}
