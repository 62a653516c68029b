//! cholera-validate: validation of cholera outbreak simulations.
//!
//! Compares the CSV outputs of an external epidemic simulation against
//! observed case counts for the governorates of Yemen, and renders the
//! comparison figures.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod plot;
pub mod reference;
pub mod routines;
pub mod stats;
pub mod types;
