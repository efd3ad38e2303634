//! The gate kind inventory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A gate kind recognized by the compiler.
///
/// This is the closed inventory of operations the gate library knows how to
/// decompose. Unknown names coming in from text or JSON never reach this
/// enum; parsers reject them up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    // Single-qubit constant gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotations
    /// Phase gate P(λ).
    P,
    /// Rotation around X.
    Rx,
    /// Rotation around Y.
    Ry,
    /// Rotation around Z.
    Rz,
    /// Universal single-qubit gate U3(θ, φ, λ).
    U3,

    // Two-qubit gates
    /// Controlled-X (CNOT).
    CX,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Controlled-Hadamard.
    CH,
    /// Controlled phase CP(λ).
    CP,
    /// Controlled X rotation.
    CRx,
    /// Controlled Y rotation.
    CRy,
    /// Controlled Z rotation.
    CRz,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// XX rotation.
    Rxx,
    /// YY rotation.
    Ryy,
    /// ZZ rotation.
    Rzz,

    // Three-qubit gates
    /// Toffoli (CCX).
    CCX,
    /// Fredkin (CSWAP).
    CSwap,

    // Non-unitary operations
    /// Measurement into a classical bit.
    Measure,
    /// Synchronization barrier over any number of qubits.
    Barrier,
}

impl GateKind {
    /// Canonical lowercase name of this kind.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            GateKind::I => "id",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::H => "h",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::SX => "sx",
            GateKind::SXdg => "sxdg",
            GateKind::P => "p",
            GateKind::Rx => "rx",
            GateKind::Ry => "ry",
            GateKind::Rz => "rz",
            GateKind::U3 => "u3",
            GateKind::CX => "cx",
            GateKind::CY => "cy",
            GateKind::CZ => "cz",
            GateKind::CH => "ch",
            GateKind::CP => "cp",
            GateKind::CRx => "crx",
            GateKind::CRy => "cry",
            GateKind::CRz => "crz",
            GateKind::Swap => "swap",
            GateKind::ISwap => "iswap",
            GateKind::Rxx => "rxx",
            GateKind::Ryy => "ryy",
            GateKind::Rzz => "rzz",
            GateKind::CCX => "ccx",
            GateKind::CSwap => "cswap",
            GateKind::Measure => "measure",
            GateKind::Barrier => "barrier",
        }
    }

    /// Resolve a kind from its textual name. Accepts the aliases used by
    /// common frontends (`id`/`i`, `u`/`u3`, `cnot`/`cx`, `toffoli`/`ccx`).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "id" | "i" => GateKind::I,
            "x" => GateKind::X,
            "y" => GateKind::Y,
            "z" => GateKind::Z,
            "h" => GateKind::H,
            "s" => GateKind::S,
            "sdg" => GateKind::Sdg,
            "t" => GateKind::T,
            "tdg" => GateKind::Tdg,
            "sx" => GateKind::SX,
            "sxdg" => GateKind::SXdg,
            "p" | "u1" => GateKind::P,
            "rx" => GateKind::Rx,
            "ry" => GateKind::Ry,
            "rz" => GateKind::Rz,
            "u" | "u3" => GateKind::U3,
            "cx" | "cnot" => GateKind::CX,
            "cy" => GateKind::CY,
            "cz" => GateKind::CZ,
            "ch" => GateKind::CH,
            "cp" | "cu1" => GateKind::CP,
            "crx" => GateKind::CRx,
            "cry" => GateKind::CRy,
            "crz" => GateKind::CRz,
            "swap" => GateKind::Swap,
            "iswap" => GateKind::ISwap,
            "rxx" => GateKind::Rxx,
            "ryy" => GateKind::Ryy,
            "rzz" => GateKind::Rzz,
            "ccx" | "toffoli" => GateKind::CCX,
            "cswap" | "fredkin" => GateKind::CSwap,
            "measure" => GateKind::Measure,
            "barrier" => GateKind::Barrier,
            _ => return None,
        })
    }

    /// Number of qubit operands, or `None` for the variadic barrier.
    #[inline]
    pub fn num_qubits(self) -> Option<u32> {
        Some(match self {
            GateKind::I
            | GateKind::X
            | GateKind::Y
            | GateKind::Z
            | GateKind::H
            | GateKind::S
            | GateKind::Sdg
            | GateKind::T
            | GateKind::Tdg
            | GateKind::SX
            | GateKind::SXdg
            | GateKind::P
            | GateKind::Rx
            | GateKind::Ry
            | GateKind::Rz
            | GateKind::U3
            | GateKind::Measure => 1,

            GateKind::CX
            | GateKind::CY
            | GateKind::CZ
            | GateKind::CH
            | GateKind::CP
            | GateKind::CRx
            | GateKind::CRy
            | GateKind::CRz
            | GateKind::Swap
            | GateKind::ISwap
            | GateKind::Rxx
            | GateKind::Ryy
            | GateKind::Rzz => 2,

            GateKind::CCX | GateKind::CSwap => 3,

            GateKind::Barrier => return None,
        })
    }

    /// Number of real parameters this kind carries.
    #[inline]
    pub fn num_params(self) -> usize {
        match self {
            GateKind::P
            | GateKind::Rx
            | GateKind::Ry
            | GateKind::Rz
            | GateKind::CP
            | GateKind::CRx
            | GateKind::CRy
            | GateKind::CRz
            | GateKind::Rxx
            | GateKind::Ryy
            | GateKind::Rzz => 1,
            GateKind::U3 => 3,
            _ => 0,
        }
    }

    /// Whether this kind carries parameters.
    #[inline]
    pub fn is_parametric(self) -> bool {
        self.num_params() > 0
    }

    /// Whether this is a single-qubit rotation that local fusion may merge
    /// (the parametric axis rotations plus the generic U3).
    #[inline]
    pub fn is_rotation(self) -> bool {
        matches!(
            self,
            GateKind::P | GateKind::Rx | GateKind::Ry | GateKind::Rz | GateKind::U3
        )
    }

    /// Whether this is a unitary gate (everything except measure/barrier).
    #[inline]
    pub fn is_unitary(self) -> bool {
        !matches!(self, GateKind::Measure | GateKind::Barrier)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert_eq!(GateKind::H.num_qubits(), Some(1));
        assert_eq!(GateKind::CX.num_qubits(), Some(2));
        assert_eq!(GateKind::CCX.num_qubits(), Some(3));
        assert_eq!(GateKind::Barrier.num_qubits(), None);
    }

    #[test]
    fn test_params() {
        assert_eq!(GateKind::U3.num_params(), 3);
        assert_eq!(GateKind::Rz.num_params(), 1);
        assert_eq!(GateKind::H.num_params(), 0);
        assert!(GateKind::Rx.is_parametric());
        assert!(!GateKind::CX.is_parametric());
    }

    #[test]
    fn test_name_roundtrip() {
        for kind in [
            GateKind::I,
            GateKind::H,
            GateKind::SXdg,
            GateKind::U3,
            GateKind::CSwap,
            GateKind::Measure,
            GateKind::Barrier,
        ] {
            assert_eq!(GateKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(GateKind::from_name("U"), Some(GateKind::U3));
        assert_eq!(GateKind::from_name("cnot"), Some(GateKind::CX));
        assert_eq!(GateKind::from_name("foo"), None);
    }

    #[test]
    fn test_rotation_subset() {
        assert!(GateKind::Rz.is_rotation());
        assert!(GateKind::U3.is_rotation());
        assert!(!GateKind::H.is_rotation());
        assert!(!GateKind::SX.is_rotation());
    }
}
