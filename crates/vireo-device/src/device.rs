//! The device record: topology + basis gates + calibration.

use serde::{Deserialize, Serialize};

use vireo_ir::GateKind;

use crate::calibration::Calibration;
use crate::error::{DeviceError, DeviceResult};
use crate::topology::Topology;

/// The set of gate kinds a device executes natively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisSet {
    kinds: Vec<GateKind>,
}

impl BasisSet {
    /// Build a basis from kinds. Measure and barrier are always accepted as
    /// pass-through and are added if absent.
    pub fn new(kinds: impl IntoIterator<Item = GateKind>) -> Self {
        let mut kinds: Vec<GateKind> = kinds.into_iter().collect();
        for implicit in [GateKind::Measure, GateKind::Barrier] {
            if !kinds.contains(&implicit) {
                kinds.push(implicit);
            }
        }
        Self { kinds }
    }

    /// Resolve a basis from gate names; unknown names are an error.
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> DeviceResult<Self> {
        let mut kinds = vec![];
        for name in names {
            let name = name.as_ref();
            let kind = GateKind::from_name(name)
                .ok_or_else(|| DeviceError::UnsupportedBasisGate { name: name.into() })?;
            kinds.push(kind);
        }
        Ok(Self::new(kinds))
    }

    /// Whether a kind is in the basis.
    #[inline]
    pub fn contains(&self, kind: GateKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// The kinds in the basis.
    pub fn kinds(&self) -> &[GateKind] {
        &self.kinds
    }

    /// IBM-style basis: RZ + SX + X + CX.
    pub fn ibm() -> Self {
        Self::new([GateKind::I, GateKind::Rz, GateKind::SX, GateKind::X, GateKind::CX])
    }

    /// IBM Heron-style basis: RZ + SX + X + CZ.
    pub fn heron() -> Self {
        Self::new([
            GateKind::I,
            GateKind::Rz,
            GateKind::SX,
            GateKind::X,
            GateKind::CZ,
            GateKind::Rzz,
        ])
    }

    /// Rotation basis: RX + RY + RZ + CZ.
    pub fn rotations() -> Self {
        Self::new([GateKind::Rx, GateKind::Ry, GateKind::Rz, GateKind::CZ])
    }

    /// The full target inventory of the gate library.
    pub fn universal() -> Self {
        Self::new([
            GateKind::X,
            GateKind::Y,
            GateKind::Z,
            GateKind::H,
            GateKind::S,
            GateKind::T,
            GateKind::SX,
            GateKind::Rx,
            GateKind::Ry,
            GateKind::Rz,
            GateKind::U3,
            GateKind::CX,
            GateKind::CZ,
            GateKind::Swap,
        ])
    }
}

/// Description of a physical device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Device name.
    pub name: String,
    /// Vendor name.
    pub vendor: String,
    /// Connectivity graph over physical qubits.
    #[serde(flatten)]
    pub topology: Topology,
    /// Native gate kinds.
    pub basis_gates: BasisSet,
    /// Optional structural tag for layout, e.g. `"heavy-hex"` or `"grid"`.
    #[serde(default)]
    pub layout_hint: Option<String>,
    /// Calibration snapshot, if the vendor provides one.
    #[serde(default)]
    pub calibration: Option<Calibration>,
}

impl Device {
    /// Build a device from its parts, validating the calibration ranges.
    pub fn new(
        name: impl Into<String>,
        vendor: impl Into<String>,
        topology: Topology,
        basis_gates: BasisSet,
    ) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
            topology,
            basis_gates,
            layout_hint: None,
            calibration: None,
        }
    }

    /// Attach calibration data, validating it.
    pub fn with_calibration(mut self, calibration: Calibration) -> DeviceResult<Self> {
        calibration.validate()?;
        self.calibration = Some(calibration);
        Ok(self)
    }

    /// Attach a layout hint tag.
    #[must_use]
    pub fn with_layout_hint(mut self, hint: impl Into<String>) -> Self {
        self.layout_hint = Some(hint.into());
        self
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.topology.num_qubits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_from_names() {
        let basis = BasisSet::from_names(["h", "cx"]).unwrap();
        assert!(basis.contains(GateKind::H));
        assert!(basis.contains(GateKind::CX));
        // Implicit pass-through kinds.
        assert!(basis.contains(GateKind::Measure));
        assert!(basis.contains(GateKind::Barrier));
        assert!(!basis.contains(GateKind::Rz));
    }

    #[test]
    fn test_basis_unknown_name() {
        let err = BasisSet::from_names(["h", "frobnicate"]).unwrap_err();
        assert!(matches!(err, DeviceError::UnsupportedBasisGate { .. }));
    }

    #[test]
    fn test_device_json() {
        let json = r#"{
            "name": "linnet-5",
            "vendor": "vireo-test",
            "num_qubits": 5,
            "coupling_map": [[0, 1], [1, 2], [2, 3], [3, 4]],
            "basis_gates": ["rz", "sx", "x", "cx"],
            "layout_hint": "linear"
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.num_qubits(), 5);
        assert!(device.topology.coupled(1, 2));
        assert!(device.basis_gates.contains(GateKind::SX));
        assert_eq!(device.layout_hint.as_deref(), Some("linear"));
        assert!(device.calibration.is_none());
    }
}
