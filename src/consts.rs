//! Physical constants and unit conversions.
//!
//! Fundamental constants are CODATA 2014 values.

/// Reduced Planck constant $\hbar$ in J·s
pub const HBAR_J: f64 = 1.0545718e-34;

/// Boltzmann constant $k_B$ in J/K
pub const KB_J: f64 = 1.38064852e-23;

/// Boltzmann constant $k_B$ in eV/K
pub const KB_EV: f64 = 8.6173303e-5;

/// Joules per electronvolt
pub const EV_TO_J: f64 = 1.60217662e-19;

/// Electronvolts per joule
pub const J_TO_EV: f64 = 1.0 / EV_TO_J;

/// Speed of light in cm/s; converts a wavenumber in cm⁻¹ to a frequency in Hz
pub const CM_TO_HZ: f64 = 0.02998e12;

/// Atomic unit of time in s
pub const ATOMIC_TIME_S: f64 = 2.418e-17;
