//! Gate operations: a kind applied to concrete operands.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::GateKind;
use crate::qubit::{ClbitId, QubitId};

/// A single operation in a circuit.
///
/// Invariants (checked by [`GateOp::validate`] and enforced when ops are
/// pushed onto a circuit): qubit operands are pairwise distinct, their count
/// matches the kind's arity, and the parameter count matches the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOp {
    /// The kind of operation.
    pub kind: GateKind,
    /// Qubit operands, in order.
    pub qubits: Vec<QubitId>,
    /// Classical bit operands (measurement targets).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<ClbitId>,
    /// Real parameters, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

impl GateOp {
    /// Create a parameterless gate operation.
    pub fn gate(kind: GateKind, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            params: vec![],
        }
    }

    /// Create a parameterized gate operation.
    pub fn parametric(
        kind: GateKind,
        qubits: impl IntoIterator<Item = QubitId>,
        params: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            kind,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            params: params.into_iter().collect(),
        }
    }

    /// Create a measurement of one qubit into one classical bit.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: GateKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
            params: vec![],
        }
    }

    /// Create a barrier over the given qubits.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: GateKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            params: vec![],
        }
    }

    /// Check arity, operand distinctness and parameter count.
    pub fn validate(&self) -> IrResult<()> {
        if let Some(expected) = self.kind.num_qubits() {
            let got = self.qubits.len();
            if got != expected as usize {
                return Err(IrError::QubitCountMismatch {
                    gate_name: self.kind.name().into(),
                    expected,
                    got: got as u32,
                });
            }
        }

        for (i, &q) in self.qubits.iter().enumerate() {
            if self.qubits[..i].contains(&q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q,
                    gate_name: self.kind.name().into(),
                });
            }
        }

        let expected_params = self.kind.num_params();
        if self.params.len() != expected_params {
            return Err(IrError::ParamCountMismatch {
                gate_name: self.kind.name().into(),
                expected: expected_params,
                got: self.params.len(),
            });
        }

        if self.kind == GateKind::Measure && self.clbits.len() != 1 {
            return Err(IrError::ClbitCountMismatch {
                gate_name: self.kind.name().into(),
                expected: 1,
                got: self.clbits.len(),
            });
        }

        Ok(())
    }

    /// Canonical name of the operation.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether this is a two-qubit unitary gate.
    #[inline]
    pub fn is_two_qubit_gate(&self) -> bool {
        self.kind.is_unitary() && self.qubits.len() == 2
    }

    /// Whether this is a measurement.
    #[inline]
    pub fn is_measure(&self) -> bool {
        self.kind == GateKind::Measure
    }

    /// Whether this is a barrier.
    #[inline]
    pub fn is_barrier(&self) -> bool {
        self.kind == GateKind::Barrier
    }
}
