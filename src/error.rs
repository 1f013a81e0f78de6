//! Error types for vehicle construction and configuration.
//!
//! The per-tick simulation path has no error returns by design: applying a
//! force to a fixed node, driving an undriven wheel, or steering an
//! unsteered one are silent no-ops, and degenerate beam geometry skips force
//! computation for the tick. Errors exist only where a vehicle is assembled
//! from a configuration that cannot produce a valid lattice.

use thiserror::Error;

/// Errors that can occur while building a vehicle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VehicleError {
    /// Lattice dimensions or spacing cannot produce a grid.
    #[error("invalid lattice: {reason}")]
    InvalidLattice {
        /// Description of the lattice problem.
        reason: String,
    },

    /// Wheel geometry is unusable (e.g. non-positive radius).
    #[error("invalid wheel geometry: {reason}")]
    InvalidWheel {
        /// Description of the wheel problem.
        reason: String,
    },

    /// Drivetrain configuration is unusable (e.g. empty gear table).
    #[error("invalid drivetrain: {reason}")]
    InvalidDrivetrain {
        /// Description of the drivetrain problem.
        reason: String,
    },
}

impl VehicleError {
    /// Create an invalid lattice error.
    #[must_use]
    pub fn invalid_lattice(reason: impl Into<String>) -> Self {
        Self::InvalidLattice {
            reason: reason.into(),
        }
    }

    /// Create an invalid wheel error.
    #[must_use]
    pub fn invalid_wheel(reason: impl Into<String>) -> Self {
        Self::InvalidWheel {
            reason: reason.into(),
        }
    }

    /// Create an invalid drivetrain error.
    #[must_use]
    pub fn invalid_drivetrain(reason: impl Into<String>) -> Self {
        Self::InvalidDrivetrain {
            reason: reason.into(),
        }
    }
}

/// Result type for vehicle construction.
pub type Result<T> = std::result::Result<T, VehicleError>;
