//! Thermodynamic integration of the anharmonic energy over temperature.
//!
//! The classical free energy of the crystal at temperature $T$ follows from its value at the
//! lowest temperature $T_0$ of the scan by integrating the anharmonic part of the MD potential
//! energy,
//!
//! $$
//!     \frac{F(T)}{T} = \frac{F(T_0)}{T_0} - \int_{T_0}^{T} \frac{U(T')}{T'^2}\, dT'
//! $$
//!
//! with the harmonic part of $U$ integrated analytically. The integral is evaluated in
//! $x = \ln(T/T_0)$, where it becomes $\int U/(k_B T)\, dx$ up to constants.

use crate::consts::{J_TO_EV, KB_EV, KB_J};
use crate::errors::*;
use crate::harmonic::HarmonicFreeEnergy;
use crate::integrate::cumulative_trapezoid;
use crate::md::MdPotential;
use ndarray::{Array1, ArrayView1};
use tracing::debug;

/// Classical potential energy of `natoms` atoms with the centre of mass fixed, in eV.
///
/// Equipartition over $3N - 3$ degrees of freedom: $U = (3N - 3) k_B T / 2$.
pub fn harmonic_potential_energy(
    temperatures: ArrayView1<'_, f64>,
    natoms: usize,
) -> Array1<f64> {
    let dof = internal_dof(natoms);
    temperatures.mapv(|t| J_TO_EV * dof * KB_J * t / 2.0)
}

/// $U_{anh} = U_{md} - U_{harm} - U_{latt}$
pub fn anharmonic_energy(
    u_md: ArrayView1<'_, f64>,
    u_harm: ArrayView1<'_, f64>,
    u_latt: f64,
) -> Result<Array1<f64>> {
    if u_md.len() != u_harm.len() {
        return Err(AnharmError::ArrayLengthMismatch(u_harm.len(), u_md.len()));
    }
    Ok(&u_md - &u_harm - u_latt)
}

/// Dimensionless temperature integral of the anharmonic energy
#[derive(Debug, Clone, PartialEq)]
pub struct AnharmonicIntegral {
    /// Cumulative integral at each temperature
    pub value: Array1<f64>,
    /// Trapezoid truncation error of `value`
    pub truncation_error: Array1<f64>,
    /// The MD error of the energies carried through the same integral
    pub md_error: Array1<f64>,
}

/// Integrate `u_anh` (and its error `u_err`) over `ln(T/T0)`, with `T0 = temperatures[0]`.
///
/// Both series are mapped through $y = u / (k_B T)$ (with $T = T_0 e^x$) before integration,
/// so the result multiplied by $k_B T$ is an energy.
pub fn integrated_anharmonic_energy(
    temperatures: ArrayView1<'_, f64>,
    u_anh: ArrayView1<'_, f64>,
    u_err: ArrayView1<'_, f64>,
) -> Result<AnharmonicIntegral> {
    let t0 = reference_temperature(temperatures)?;
    for &len in &[u_anh.len(), u_err.len()] {
        if len != temperatures.len() {
            return Err(AnharmError::ArrayLengthMismatch(len, temperatures.len()));
        }
    }

    let x = temperatures.mapv(|t| (t / t0).ln());
    let kt = x.mapv(|x| x.exp() * t0 * KB_EV);

    let energy = cumulative_trapezoid(x.view(), (&u_anh / &kt).view())?;
    let error = cumulative_trapezoid(x.view(), (&u_err / &kt).view())?;

    Ok(AnharmonicIntegral {
        value: energy.value,
        truncation_error: energy.truncation_error,
        md_error: error.value,
    })
}

/// Free energy of the anharmonic crystal along a temperature scan, in eV per molecule
#[derive(Debug, Clone, PartialEq)]
pub struct AnharmonicFreeEnergy {
    /// Temperature axis in K: the nominal temperatures of the MD runs
    pub temperature: Array1<f64>,
    /// Harmonic potential energy per molecule
    pub u_harm: Array1<f64>,
    /// Anharmonic part of the MD potential energy
    pub u_anharm: Array1<f64>,
    /// Temperature integral of `u_anharm`
    pub integral: AnharmonicIntegral,
    /// Classical harmonic free energy at `T0` carried to each temperature, without the lattice
    /// energy
    pub f_harm_part: Array1<f64>,
    /// Change of the classical nuclear kinetic free energy between `T0` and each temperature
    pub f_class_nucl: Array1<f64>,
    /// Free energy with classical nuclei
    pub classical: Array1<f64>,
    /// Free energy with the harmonic quantum correction for the nuclei
    pub quantum: Array1<f64>,
    /// Error from the trapezoid truncation of the temperature integral
    pub ti_error: Array1<f64>,
    /// Error from the statistical error of the MD energies
    pub md_error: Array1<f64>,
    /// `|ti_error| + |md_error|`
    pub total_error: Array1<f64>,
}

/// Combine an MD temperature scan with the harmonic reference into the anharmonic free energy.
///
/// `harmonic_ipi` must be evaluated on the nominal temperatures of `md` (its labels). `natoms`
/// and `nmols` describe the cell used for the harmonic potential energy, which may differ from
/// the cell the MD energies were normalised with.
///
/// $$
/// \begin{aligned}
///     F_c(T) &= U_{latt} + \left(F^{harm}_c(T_0) - U_{latt}\right)\frac{T}{T_0}
///         - \frac{(3N - 3) k_B T}{n_{mol}} \ln\frac{T}{T_0} - k_B T\, I(T) \\\\
///     F_q(T) &= F_c(T) + F^{harm}_q(T) - F^{harm}_c(T)
/// \end{aligned}
/// $$
pub fn anharmonic_free_energy(
    md: &MdPotential,
    harmonic_ipi: &HarmonicFreeEnergy,
    u_latt: f64,
    natoms: usize,
    nmols: usize,
) -> Result<AnharmonicFreeEnergy> {
    if natoms == 0 || nmols == 0 {
        return Err(AnharmError::InvalidInput(format!(
            "harmonic cell needs atoms and molecules (got {} atoms, {} molecules)",
            natoms, nmols
        )));
    }
    let temperature = md.label.clone();
    let t0 = reference_temperature(temperature.view())?;
    for len in &[
        md.potential.len(),
        md.error.len(),
        harmonic_ipi.quantum.len(),
        harmonic_ipi.classical.len(),
    ] {
        if *len != temperature.len() {
            return Err(AnharmError::ArrayLengthMismatch(*len, temperature.len()));
        }
    }

    let u_harm = harmonic_potential_energy(temperature.view(), natoms) / nmols as f64;
    let u_anharm = anharmonic_energy(md.potential.view(), u_harm.view(), u_latt)?;
    let integral =
        integrated_anharmonic_energy(temperature.view(), u_anharm.view(), md.error.view())?;

    let dof = internal_dof(natoms);
    let fc_t0 = harmonic_ipi.classical[0];
    let f_harm_part = temperature.mapv(|t| (fc_t0 - u_latt) * t / t0);
    let f_class_nucl = temperature.mapv(|t| KB_EV * t * dof * (t / t0).ln() / nmols as f64);

    let kt = temperature.mapv(|t| t * KB_EV);
    let classical = &f_harm_part - &f_class_nucl - &(&integral.value * &kt) + u_latt;
    let quantum = &classical + &harmonic_ipi.quantum - &harmonic_ipi.classical;

    let ti_error = &integral.truncation_error * &kt;
    let md_error = &integral.md_error * &kt;
    let total_error = ti_error.mapv(f64::abs) + md_error.mapv(f64::abs);

    debug!(
        t0,
        points = temperature.len(),
        "integrated anharmonic energy over temperature"
    );

    Ok(AnharmonicFreeEnergy {
        temperature,
        u_harm,
        u_anharm,
        integral,
        f_harm_part,
        f_class_nucl,
        classical,
        quantum,
        ti_error,
        md_error,
        total_error,
    })
}

fn internal_dof(natoms: usize) -> f64 {
    3.0 * natoms as f64 - 3.0
}

/// First and lowest temperature of the scan, which anchors the integration constant.
///
/// The scan must be positive, finite and strictly increasing.
fn reference_temperature(temperatures: ArrayView1<'_, f64>) -> Result<f64> {
    let t0 = *temperatures.iter().next().ok_or_else(|| {
        AnharmError::InvalidInput("temperature scan is empty".to_string())
    })?;
    if let Some(&t) = temperatures.iter().find(|&&t| !(t > 0.0 && t.is_finite())) {
        return Err(AnharmError::InvalidInput(format!(
            "temperature {} K is not positive",
            t
        )));
    }
    if let Some((a, b)) = temperatures
        .iter()
        .zip(temperatures.iter().skip(1))
        .find(|(a, b)| !(a < b))
    {
        return Err(AnharmError::InvalidInput(format!(
            "temperatures must increase strictly ({} K is followed by {} K)",
            a, b
        )));
    }
    Ok(t0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NumericPolicy;
    use crate::harmonic::harmonic_free_energy;
    use crate::testsystems::AnharmonicCrystal;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    fn scan(t0: f64, t1: f64, n: usize) -> Array1<f64> {
        Array1::linspace(t0, t1, n)
    }

    fn harmonic(
        crystal: &AnharmonicCrystal,
        temperatures: ArrayView1<'_, f64>,
    ) -> HarmonicFreeEnergy {
        let einstein = crystal.einstein();
        harmonic_free_energy(
            &einstein.spectrum(),
            temperatures,
            einstein.nmols(),
            einstein.u_latt(),
            NumericPolicy::Strict,
        )
        .unwrap()
    }

    #[test]
    fn equipartition_over_internal_degrees_of_freedom() {
        let u = harmonic_potential_energy(array![300.0].view(), 4);
        assert_relative_eq!(u[0], 9.0 * KB_EV * 300.0 / 2.0, max_relative = 1e-6);
        assert_eq!(harmonic_potential_energy(array![300.0].view(), 1)[0], 0.0);
    }

    #[test]
    fn anharmonic_energy_removes_harmonic_and_lattice_parts() {
        let u = anharmonic_energy(array![1.0, 2.0].view(), array![0.25, 0.5].view(), -1.0).unwrap();
        assert_eq!(u, array![1.75, 2.5]);
        assert!(matches!(
            anharmonic_energy(array![1.0].view(), array![0.25, 0.5].view(), 0.0),
            Err(AnharmError::ArrayLengthMismatch(2, 1))
        ));
    }

    #[test]
    fn integral_starts_at_reference_temperature() {
        let t = array![100.0, 200.0, 400.0];
        let u = array![0.01, 0.02, 0.04];
        let integral = integrated_anharmonic_energy(t.view(), u.view(), u.view()).unwrap();

        assert_eq!(integral.value[0], 0.0);
        assert_eq!(integral.md_error[0], 0.0);
        // u / (kB T) is constant, so the integral is exact in ln T.
        let y = 0.01 / (KB_EV * 100.0);
        assert_relative_eq!(integral.value[2], y * 4.0_f64.ln(), max_relative = 1e-12);
        assert_eq!(integral.value, integral.md_error);
    }

    #[test]
    fn harmonic_crystal_recovers_harmonic_free_energy() {
        let crystal = AnharmonicCrystal::builder()
            .natoms(8)
            .nmols(2)
            .u_latt(-4.0)
            .anharmonicity(0.0)
            .build()
            .unwrap();
        let t = scan(50.0, 500.0, 10);
        let md = crystal.md_potential(t.view());
        let reference = harmonic(&crystal, t.view());

        let f = anharmonic_free_energy(&md, &reference, crystal.u_latt(), 8, 2).unwrap();

        for k in 0..t.len() {
            assert_abs_diff_eq!(f.u_anharm[k], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(f.classical[k], reference.classical[k], epsilon = 1e-7);
            assert_abs_diff_eq!(f.quantum[k], reference.quantum[k], epsilon = 1e-7);
            assert_abs_diff_eq!(f.total_error[k], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn quadratic_anharmonicity_lowers_free_energy() {
        let a = 2.0e-7;
        let crystal = AnharmonicCrystal::builder().anharmonicity(a).build().unwrap();
        let t = scan(100.0, 400.0, 301);
        let md = crystal.md_potential(t.view());
        let reference = harmonic(&crystal, t.view());

        let f = anharmonic_free_energy(
            &md,
            &reference,
            crystal.u_latt(),
            crystal.natoms(),
            crystal.nmols(),
        )
        .unwrap();
        let exact = crystal.analytical_classical_free_energy(t.view());

        for k in 0..t.len() {
            assert_abs_diff_eq!(f.classical[k], exact[k], epsilon = 1e-6);
        }
        // Truncation error is a small fraction of the anharmonic contribution.
        let last = t.len() - 1;
        assert!(f.ti_error[last].abs() < 1e-3 * (a * t[last] * (t[last] - t[0])));
    }

    #[test]
    fn md_error_is_carried_to_free_energy() {
        let crystal = AnharmonicCrystal::builder().md_error(1.0e-3).build().unwrap();
        let t = array![100.0, 200.0];
        let md = crystal.md_potential(t.view());
        let f = anharmonic_free_energy(
            &md,
            &harmonic(&crystal, t.view()),
            crystal.u_latt(),
            crystal.natoms(),
            crystal.nmols(),
        )
        .unwrap();

        // Two-point trapezoid of err / (kB T) over ln 2
        let y0 = 1.0e-3 / (KB_EV * 100.0);
        let y1 = 1.0e-3 / (KB_EV * 200.0);
        let expected = 200.0 * KB_EV * 0.5 * (y0 + y1) * 2.0_f64.ln();
        assert_relative_eq!(f.md_error[1], expected, max_relative = 1e-12);
        assert_relative_eq!(
            f.total_error[1],
            f.md_error[1].abs() + f.ti_error[1].abs(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn empty_scan_is_rejected() {
        let crystal = AnharmonicCrystal::default();
        let t = Array1::<f64>::zeros(0);
        let md = crystal.md_potential(t.view());
        let reference = HarmonicFreeEnergy {
            quantum: Array1::zeros(0),
            classical: Array1::zeros(0),
        };
        assert!(matches!(
            anharmonic_free_energy(&md, &reference, 0.0, 4, 1),
            Err(AnharmError::InvalidInput(_))
        ));
    }

    #[test]
    fn unordered_scan_is_rejected() {
        let crystal = AnharmonicCrystal::default();
        for t in &[array![300.0, 100.0, 200.0], array![100.0, 200.0, 200.0]] {
            let md = crystal.md_potential(t.view());
            let reference = harmonic(&crystal, t.view());
            assert!(matches!(
                anharmonic_free_energy(&md, &reference, crystal.u_latt(), 4, 1),
                Err(AnharmError::InvalidInput(_))
            ));
        }

        let u = array![0.0, 0.0, 0.0];
        assert!(matches!(
            integrated_anharmonic_energy(array![200.0, 100.0, 300.0].view(), u.view(), u.view()),
            Err(AnharmError::InvalidInput(_))
        ));
    }

    #[test]
    fn misaligned_harmonic_reference_is_rejected() {
        let crystal = AnharmonicCrystal::default();
        let t = array![100.0, 200.0, 300.0];
        let md = crystal.md_potential(t.view());
        let reference = harmonic(&crystal, t.slice(ndarray::s![..2]));
        assert!(matches!(
            anharmonic_free_energy(&md, &reference, crystal.u_latt(), 4, 1),
            Err(AnharmError::ArrayLengthMismatch(2, 3))
        ));
    }
}
