use anharm_rs::anharmonic::anharmonic_free_energy;
use anharm_rs::harmonic::harmonic_free_energy;
use anharm_rs::testsystems::AnharmonicCrystal;
use anharm_rs::*;
use ndarray::Array1;
use tracing::{error, info};

fn run() -> Result<()> {
    let crystal = AnharmonicCrystal::builder()
        .natoms(12)
        .nmols(2)
        .u_latt(-1.25)
        .anharmonicity(2.0e-7)
        .md_error(5.0e-5)
        .build()?;
    let temperatures = Array1::linspace(50.0, 350.0, 7);

    let einstein = crystal.einstein();
    let harmonic = harmonic_free_energy(
        &einstein.spectrum(),
        temperatures.view(),
        einstein.nmols(),
        einstein.u_latt(),
        NumericPolicy::Strict,
    )?;
    let md = crystal.md_potential(temperatures.view());
    let f = anharmonic_free_energy(
        &md,
        &harmonic,
        crystal.u_latt(),
        crystal.natoms(),
        crystal.nmols(),
    )?;
    let exact = crystal.analytical_classical_free_energy(temperatures.view());

    for k in 0..f.temperature.len() {
        info!(
            temperature = f.temperature[k],
            classical = f.classical[k],
            quantum = f.quantum[k],
            error = f.total_error[k],
            exact_classical = exact[k],
            "free energy per molecule (eV)"
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
