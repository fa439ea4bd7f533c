#![warn(rust_2018_idioms, missing_docs, missing_debug_implementations)]

//! Anharmonic free energy of molecular crystals from molecular dynamics and DFT.
//!
//! The free energy is built on a harmonic reference from lattice dynamics. Thermodynamic
//! integration of the MD potential energy over temperature adds the classical anharmonic
//! contribution, the difference between quantum and classical harmonic oscillators adds the
//! nuclear quantum effects, and a second integration over a coupling parameter switches the
//! energy surface from the force field to DFT.
//!
//! Statistical errors of the MD averages are estimated from the decay of the autocorrelation of
//! each time series and carried through the integrals together with the trapezoid truncation
//! error.
//!
//! The numerical stages ([`integrate`], [`autocorr`], [`harmonic`], [`md`], [`anharmonic`],
//! [`coupling`]) work on in-memory arrays. The [`io`] module reads the LAMMPS, i-PI and phonopy
//! outputs they are usually fed from, and [`sample::FreeEnergySample`] runs the whole analysis
//! for one crystal.
//!
//! Library code logs through [`tracing`] and never installs a subscriber.

#[macro_use]
extern crate derive_builder;

pub mod anharmonic;
pub mod autocorr;
pub mod config;
pub mod consts;
pub mod coupling;
pub mod errors;
pub mod harmonic;
pub mod integrate;
pub mod io;
pub mod md;
pub mod sample;
pub mod testsystems;

pub use config::{AnalysisConfig, NumericPolicy};
pub use errors::{AnharmError, Result};
pub use sample::{FreeEnergySample, SampleInputs};
