//! Vireo Device Model
//!
//! The physical side of compilation: an undirected connectivity graph over
//! physical qubits ([`Topology`]), per-qubit and per-gate calibration data
//! ([`Calibration`]), and the [`Device`] record tying them together with the
//! device's native basis gates.
//!
//! All calibration fields a vendor can omit are optional values; consumers
//! state explicitly what a missing value means. A `gate_error` of exactly
//! `1.0` marks a non-operational (obsolete) entry and is classified
//! separately from a missing one.

pub mod calibration;
pub mod device;
pub mod error;
pub mod topology;

pub use calibration::{Calibration, GateCalibration, GateQuality, QubitCalibration};
pub use device::{BasisSet, Device};
pub use error::{DeviceError, DeviceResult};
pub use topology::Topology;
