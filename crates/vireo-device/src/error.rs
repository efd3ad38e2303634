//! Error types for the device model.

use thiserror::Error;

/// Errors that can occur when building or validating a device.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeviceError {
    /// The device declares a basis gate the gate library does not know.
    #[error("Device declares unsupported basis gate '{name}'")]
    UnsupportedBasisGate {
        /// The unknown gate name.
        name: String,
    },

    /// A calibration value is outside its physical range.
    #[error("Invalid calibration data: {what}")]
    InvalidCalibration {
        /// Description of the offending value.
        what: String,
    },
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
