//! Schematic data model: device trees, panels, the service-entrance
//! derivation and the top-level schematic document.

pub mod device;
pub mod schematic;

use thiserror::Error;

pub use device::*;
pub use schematic::*;

/// Values rejected while decoding the closed enumerations of the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid pole count: {0} (expected 2 or 4)")]
    InvalidPoles(u8),

    #[error("Invalid amp rating: {0}A is not a commercial rating")]
    InvalidAmpRating(u16),

    #[error("Invalid differential sensitivity: {0}")]
    InvalidSensitivity(String),

    #[error("Invalid supply voltage: {0}V (expected 230 or 400)")]
    InvalidVoltage(u16),
}
