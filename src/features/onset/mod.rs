//! Onset detection modules
//!
//! Onset-strength envelopes for tempo estimation:
//! - Energy flux (half-wave rectified frame RMS difference)

pub mod energy_flux;

pub use energy_flux::{onset_envelope, EnergyFluxEnvelope};
