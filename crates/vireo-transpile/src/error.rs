//! The transpilation error surface.

use thiserror::Error;
use vireo_ir::IrError;

/// Errors surfaced by the transpilation stack.
///
/// Every variant carries a machine-readable tag (see [`TranspileError::tag`])
/// so callers can distinguish user-facing input problems from internal bugs
/// without matching on message text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranspileError {
    /// A gate kind with no decomposition rule.
    #[error("Unknown gate: {name}")]
    UnknownGate {
        /// The unrecognized gate name.
        name: String,
    },

    /// Operand count does not match the gate's arity.
    #[error("Gate '{gate}' requires {expected} qubits, got {got}")]
    InvalidArity {
        /// Gate name.
        gate: String,
        /// Expected operand count.
        expected: u32,
        /// Provided operand count.
        got: u32,
    },

    /// Parameter count does not match the gate kind.
    #[error("Gate '{gate}' requires {expected} parameters, got {got}")]
    InvalidParamCount {
        /// Gate name.
        gate: String,
        /// Expected parameter count.
        expected: usize,
        /// Provided parameter count.
        got: usize,
    },

    /// The device basis cannot express a required operation.
    #[error("Basis {{{basis}}} cannot express '{gate}'")]
    UnsupportedBasis {
        /// The gate that could not be lowered.
        gate: String,
        /// The declared basis, comma-separated.
        basis: String,
    },

    /// No initial layout exists under the chosen strategy.
    #[error("No feasible layout: {reason}")]
    NoFeasibleLayout {
        /// Why embedding failed.
        reason: String,
    },

    /// Two interacting qubits lie in different connected components.
    #[error("Device is disconnected: no path between physical qubits {a} and {b}")]
    DisconnectedDevice {
        /// One endpoint.
        a: u32,
        /// The other endpoint.
        b: u32,
    },

    /// The transpilation observed its cancellation token.
    #[error("Transpilation cancelled")]
    Cancelled,

    /// The routed circuit is not unitarily equivalent to its input.
    ///
    /// This is an internal consistency failure: it indicates a bug in the
    /// router, not a problem with the caller's input.
    #[error("Routed circuit is not equivalent to its input (Frobenius distance {distance:.3e})")]
    RoutingUnitaryMismatch {
        /// Phase-invariant Frobenius distance between the two unitaries.
        distance: f64,
    },

    /// An internal IR invariant was violated while building circuits.
    #[error("Internal IR error: {0}")]
    Internal(IrError),
}

impl TranspileError {
    /// Machine-readable tag for the §7-style error surface.
    pub fn tag(&self) -> &'static str {
        match self {
            TranspileError::UnknownGate { .. } => "unknown_gate",
            TranspileError::InvalidArity { .. } => "invalid_arity",
            TranspileError::InvalidParamCount { .. } => "invalid_param_count",
            TranspileError::UnsupportedBasis { .. } => "unsupported_basis",
            TranspileError::NoFeasibleLayout { .. } => "no_feasible_layout",
            TranspileError::DisconnectedDevice { .. } => "disconnected_device",
            TranspileError::Cancelled => "cancelled",
            TranspileError::RoutingUnitaryMismatch { .. } => "routing_unitary_mismatch",
            TranspileError::Internal(_) => "internal",
        }
    }

    /// Whether the error indicates an internal bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TranspileError::RoutingUnitaryMismatch { .. } | TranspileError::Internal(_)
        )
    }
}

impl From<IrError> for TranspileError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            } => TranspileError::InvalidArity {
                gate: gate_name,
                expected,
                got,
            },
            IrError::ParamCountMismatch {
                gate_name,
                expected,
                got,
            } => TranspileError::InvalidParamCount {
                gate: gate_name,
                expected,
                got,
            },
            other => TranspileError::Internal(other),
        }
    }
}

/// Result type for transpilation operations.
pub type TranspileResult<T> = Result<T, TranspileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(
            TranspileError::UnknownGate { name: "foo".into() }.tag(),
            "unknown_gate"
        );
        assert_eq!(TranspileError::Cancelled.tag(), "cancelled");
        assert!(
            TranspileError::RoutingUnitaryMismatch { distance: 1.0 }.is_internal()
        );
        assert!(!TranspileError::Cancelled.is_internal());
    }

    #[test]
    fn test_ir_error_mapping() {
        let err: TranspileError = IrError::QubitCountMismatch {
            gate_name: "cx".into(),
            expected: 2,
            got: 1,
        }
        .into();
        assert_eq!(err.tag(), "invalid_arity");
    }
}
