//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index out of range for the circuit.
    #[error("Qubit {qubit} out of range for circuit with {num_qubits} qubits (gate: {gate_name})")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the circuit.
        num_qubits: u32,
        /// Gate name for context.
        gate_name: String,
    },

    /// Classical bit index out of range for the circuit.
    #[error("Classical bit {clbit} out of range for circuit with {num_clbits} bits (gate: {gate_name})")]
    ClbitOutOfRange {
        /// The offending classical bit.
        clbit: ClbitId,
        /// Number of classical bits in the circuit.
        num_clbits: u32,
        /// Gate name for context.
        gate_name: String,
    },

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Gate requires a different number of classical bits.
    #[error("Gate '{gate_name}' requires {expected} classical bits, got {got}")]
    ClbitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of classical bits.
        expected: usize,
        /// Actual number provided.
        got: usize,
    },

    /// Gate requires a different number of parameters.
    #[error("Gate '{gate_name}' requires {expected} parameters, got {got}")]
    ParamCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of parameters.
        expected: usize,
        /// Actual number provided.
        got: usize,
    },

    /// Duplicate qubit operand in one operation.
    #[error("Duplicate qubit {qubit} in operation (gate: {gate_name})")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Gate name for context.
        gate_name: String,
    },

    /// An operation was applied to a qubit after its measurement.
    #[error("Operation '{gate_name}' on {qubit} after it was measured")]
    OpAfterMeasure {
        /// The qubit already measured.
        qubit: QubitId,
        /// Gate name for context.
        gate_name: String,
    },

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Invalid node index.
    #[error("Invalid node index")]
    InvalidNode,
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
