//! The circuit value type and builder API.

use serde::{Deserialize, Serialize};

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::GateKind;
use crate::op::GateOp;
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// A value-typed record: a qubit count, a classical bit count, and an
/// ordered sequence of operations. Transformations elsewhere in the stack
/// never mutate a circuit they received; they build a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    num_qubits: u32,
    num_clbits: u32,
    ops: Vec<GateOp>,
}

impl Circuit {
    /// Create an empty circuit with the given register sizes.
    pub fn new(num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            ops: vec![],
        }
    }

    /// Build a circuit from a complete operation sequence, validating every
    /// operation (ranges, arities, parameter counts, terminal measurements).
    pub fn from_ops(
        num_qubits: u32,
        num_clbits: u32,
        ops: impl IntoIterator<Item = GateOp>,
    ) -> IrResult<Self> {
        let mut circuit = Self::new(num_qubits, num_clbits);
        for op in ops {
            circuit.push(op)?;
        }
        Ok(circuit)
    }

    /// Append an operation, enforcing all circuit invariants.
    pub fn push(&mut self, op: GateOp) -> IrResult<()> {
        self.check_op(&op, true)?;
        self.ops.push(op);
        Ok(())
    }

    /// Append an operation without the measurement-terminality check.
    ///
    /// Routing may legitimately emit SWAPs on a wire after its measurement
    /// (the classical outcome is already latched); everything else is still
    /// validated.
    pub fn push_unchecked(&mut self, op: GateOp) -> IrResult<()> {
        self.check_op(&op, false)?;
        self.ops.push(op);
        Ok(())
    }

    fn check_op(&self, op: &GateOp, enforce_terminal_measure: bool) -> IrResult<()> {
        op.validate()?;

        for &q in &op.qubits {
            if q.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit: q,
                    num_qubits: self.num_qubits,
                    gate_name: op.name().into(),
                });
            }
        }
        for &c in &op.clbits {
            if c.0 >= self.num_clbits {
                return Err(IrError::ClbitOutOfRange {
                    clbit: c,
                    num_clbits: self.num_clbits,
                    gate_name: op.name().into(),
                });
            }
        }

        if enforce_terminal_measure && !op.is_barrier() {
            for &q in &op.qubits {
                let measured = self
                    .ops
                    .iter()
                    .any(|prev| prev.is_measure() && prev.qubits.contains(&q));
                if measured {
                    return Err(IrError::OpAfterMeasure {
                        qubit: q,
                        gate_name: op.name().into(),
                    });
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Builder helpers
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::H, [q]))?;
        Ok(self)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::X, [q]))?;
        Ok(self)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::Y, [q]))?;
        Ok(self)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::Z, [q]))?;
        Ok(self)
    }

    /// Apply S gate.
    pub fn s(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::S, [q]))?;
        Ok(self)
    }

    /// Apply T gate.
    pub fn t(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::T, [q]))?;
        Ok(self)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::SX, [q]))?;
        Ok(self)
    }

    /// Apply Rx rotation.
    pub fn rx(&mut self, theta: f64, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::parametric(GateKind::Rx, [q], [theta]))?;
        Ok(self)
    }

    /// Apply Ry rotation.
    pub fn ry(&mut self, theta: f64, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::parametric(GateKind::Ry, [q], [theta]))?;
        Ok(self)
    }

    /// Apply Rz rotation.
    pub fn rz(&mut self, theta: f64, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::parametric(GateKind::Rz, [q], [theta]))?;
        Ok(self)
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: f64, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::parametric(GateKind::P, [q], [lambda]))?;
        Ok(self)
    }

    /// Apply universal U3 gate.
    pub fn u3(&mut self, theta: f64, phi: f64, lambda: f64, q: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::parametric(GateKind::U3, [q], [theta, phi, lambda]))?;
        Ok(self)
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::CX, [control, target]))?;
        Ok(self)
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::CZ, [control, target]))?;
        Ok(self)
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, lambda: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::parametric(GateKind::CP, [control, target], [lambda]))?;
        Ok(self)
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::Swap, [a, b]))?;
        Ok(self)
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::gate(GateKind::CCX, [c1, c2, target]))?;
        Ok(self)
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, q: QubitId, c: ClbitId) -> IrResult<&mut Self> {
        self.push(GateOp::measure(q, c))?;
        Ok(self)
    }

    /// Measure every qubit into the matching classical bit.
    ///
    /// Requires `num_clbits >= num_qubits`.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for i in 0..self.num_qubits {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    /// Apply a barrier over the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.push(GateOp::barrier(qubits))?;
        Ok(self)
    }

    // =========================================================================
    // Accessors and derived views
    // =========================================================================

    /// Number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// The operation sequence, in program order.
    #[inline]
    pub fn ops(&self) -> &[GateOp] {
        &self.ops
    }

    /// Consume the circuit, returning its operation sequence.
    pub fn into_ops(self) -> Vec<GateOp> {
        self.ops
    }

    /// Number of operations excluding barriers.
    pub fn num_gates(&self) -> usize {
        self.ops.iter().filter(|op| !op.is_barrier()).count()
    }

    /// Number of two-qubit gates.
    pub fn num_two_qubit_gates(&self) -> usize {
        self.ops.iter().filter(|op| op.is_two_qubit_gate()).count()
    }

    /// Number of SWAP gates.
    pub fn num_swap_gates(&self) -> usize {
        self.ops.iter().filter(|op| op.kind == GateKind::Swap).count()
    }

    /// Circuit depth: the longest path through the data-dependency DAG.
    ///
    /// Barriers synchronize wires without contributing a layer.
    pub fn depth(&self) -> usize {
        let mut qubit_depth = vec![0usize; self.num_qubits as usize];
        let mut clbit_depth = vec![0usize; self.num_clbits as usize];
        let mut max_depth = 0usize;

        for op in &self.ops {
            let level = op
                .qubits
                .iter()
                .map(|q| qubit_depth[q.index()])
                .chain(op.clbits.iter().map(|c| clbit_depth[c.index()]))
                .max()
                .unwrap_or(0);

            let level = if op.is_barrier() { level } else { level + 1 };

            for q in &op.qubits {
                qubit_depth[q.index()] = level;
            }
            for c in &op.clbits {
                clbit_depth[c.index()] = level;
            }
            max_depth = max_depth.max(level);
        }

        max_depth
    }

    /// The sorted set of qubits actually touched by any operation.
    pub fn qubits_used(&self) -> Vec<QubitId> {
        let mut used: Vec<QubitId> = vec![];
        for op in &self.ops {
            for &q in &op.qubits {
                if !used.contains(&q) {
                    used.push(q);
                }
            }
        }
        used.sort();
        used
    }

    /// The sorted set of qubits that are measured.
    pub fn qubits_measured(&self) -> Vec<QubitId> {
        let mut measured: Vec<QubitId> = vec![];
        for op in self.ops.iter().filter(|op| op.is_measure()) {
            for &q in &op.qubits {
                if !measured.contains(&q) {
                    measured.push(q);
                }
            }
        }
        measured.sort();
        measured
    }

    /// Build the data-dependency DAG view of this circuit.
    pub fn dag(&self) -> CircuitDag {
        CircuitDag::from_circuit(self)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// A Bell pair with terminal measurements.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new(2, 2);
        circuit.h(QubitId(0))?;
        circuit.cx(QubitId(0), QubitId(1))?;
        circuit.measure(QubitId(0), ClbitId(0))?;
        circuit.measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// An n-qubit GHZ state preparation (no measurements).
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::new(n, 0);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n.saturating_sub(1) {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        Ok(circuit)
    }

    /// An n-qubit quantum Fourier transform (no measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::new(n, 0);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_circuit() {
        let circuit = Circuit::new(3, 2);
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.depth(), 0);
        assert_eq!(circuit.num_gates(), 0);
    }

    #[test]
    fn test_bell_depth() {
        let circuit = Circuit::bell().unwrap();
        // H, CX, then two parallel measures
        assert_eq!(circuit.depth(), 3);
        assert_eq!(circuit.num_gates(), 4);
        assert_eq!(circuit.num_two_qubit_gates(), 1);
    }

    #[test]
    fn test_parallel_depth() {
        let mut circuit = Circuit::new(2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.h(QubitId(1)).unwrap();
        assert_eq!(circuit.depth(), 1);
    }

    #[test]
    fn test_barrier_does_not_add_depth() {
        let mut circuit = Circuit::new(2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.barrier([QubitId(0), QubitId(1)]).unwrap();
        circuit.h(QubitId(1)).unwrap();
        // The barrier forces h(q1) after h(q0), but adds no layer itself.
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut circuit = Circuit::new(2, 0);
        let result = circuit.h(QubitId(5));
        assert!(matches!(result, Err(IrError::QubitOutOfRange { .. })));
    }

    #[test]
    fn test_measurement_terminal() {
        let mut circuit = Circuit::new(1, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        let result = circuit.h(QubitId(0));
        assert!(matches!(result, Err(IrError::OpAfterMeasure { .. })));
    }

    #[test]
    fn test_push_unchecked_allows_trailing_swap() {
        let mut circuit = Circuit::new(2, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit
            .push_unchecked(GateOp::gate(GateKind::Swap, [QubitId(0), QubitId(1)]))
            .unwrap();
        assert_eq!(circuit.num_swap_gates(), 1);
    }

    #[test]
    fn test_qubits_used_and_measured() {
        let mut circuit = Circuit::new(4, 1);
        circuit.cx(QubitId(2), QubitId(0)).unwrap();
        circuit.measure(QubitId(2), ClbitId(0)).unwrap();
        assert_eq!(circuit.qubits_used(), vec![QubitId(0), QubitId(2)]);
        assert_eq!(circuit.qubits_measured(), vec![QubitId(2)]);
    }

    #[test]
    fn test_ghz() {
        let circuit = Circuit::ghz(5).unwrap();
        assert_eq!(circuit.num_gates(), 5);
        assert_eq!(circuit.depth(), 5);
    }

    #[test]
    fn test_qft_counts() {
        let circuit = Circuit::qft(3).unwrap();
        // 3 H + 3 CP + 1 SWAP
        assert_eq!(circuit.num_gates(), 7);
        assert_eq!(circuit.num_swap_gates(), 1);
    }
}
