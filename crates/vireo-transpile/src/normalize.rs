//! Circuit normalization: rewrite into a device basis.
//!
//! One pass over the input collects runs of adjacent single-qubit rotations
//! per qubit and fuses each run into at most one U3 (dropping identities),
//! then every operation is lowered into the basis through the gate library.
//! No optimization happens beyond that local fusion.

use vireo_device::BasisSet;
use vireo_ir::{Circuit, GateKind, GateOp};

use crate::error::TranspileResult;
use crate::library;
use crate::unitary::{gate_unitary_2x2, Unitary2x2};

/// Lowering can expose new adjacent-rotation runs (a T next to an H both
/// become RZ-family gates), so fuse+lower repeats until the gate structure
/// stops changing. Convergence is fast; the bound is a backstop.
const MAX_ROUNDS: usize = 16;

/// Rewrite `circuit` so every operation's kind lies in `basis`.
///
/// Guarantees: basis containment, unitary preservation up to global phase,
/// unchanged register sizes and measurement positions, adjacent rotation
/// runs fused, identities dropped. Structurally idempotent.
pub fn normalize(circuit: &Circuit, basis: &BasisSet) -> TranspileResult<Circuit> {
    let mut current = circuit.clone();

    for _ in 0..MAX_ROUNDS {
        let fused = fuse_rotations(&current);
        let mut ops = vec![];
        for op in fused.ops() {
            ops.extend(library::decompose(op, basis)?);
        }
        let lowered = Circuit::from_ops(circuit.num_qubits(), circuit.num_clbits(), ops)?;

        if same_structure(&lowered, &current) {
            return Ok(lowered);
        }
        current = lowered;
    }

    Ok(current)
}

/// Structural equality: same kinds and operands in the same order
/// (parameters excluded; re-derived angles may differ in the last ulp).
fn same_structure(a: &Circuit, b: &Circuit) -> bool {
    a.ops().len() == b.ops().len()
        && a.ops()
            .iter()
            .zip(b.ops())
            .all(|(x, y)| x.kind == y.kind && x.qubits == y.qubits && x.clbits == y.clbits)
}

/// Fuse adjacent runs (length ≥ 2) of single-qubit rotations on the same
/// qubit into one U3, and drop rotations that are the identity. A run ends
/// at any operation sharing the qubit, including barriers.
fn fuse_rotations(circuit: &Circuit) -> Circuit {
    let num_qubits = circuit.num_qubits() as usize;
    let mut pending: Vec<Vec<GateOp>> = vec![vec![]; num_qubits];
    let mut out: Vec<GateOp> = vec![];

    for op in circuit.ops() {
        if op.kind.is_rotation() && op.qubits.len() == 1 {
            pending[op.qubits[0].index()].push(op.clone());
            continue;
        }
        for &q in &op.qubits {
            flush_run(&mut pending[q.index()], &mut out);
        }
        out.push(op.clone());
    }

    for run in &mut pending {
        flush_run(run, &mut out);
    }

    let mut fused = Circuit::new(circuit.num_qubits(), circuit.num_clbits());
    for op in out {
        fused
            .push_unchecked(op)
            .expect("fused ops come from a valid circuit");
    }
    fused
}

fn flush_run(run: &mut Vec<GateOp>, out: &mut Vec<GateOp>) {
    match run.len() {
        0 => {}
        1 => {
            let op = run.pop().expect("run has one element");
            let u = gate_unitary_2x2(op.kind, &op.params).expect("rotations are single-qubit");
            if !u.is_identity_up_to_phase() {
                out.push(op);
            }
        }
        _ => {
            let qubit = run[0].qubits[0];
            let mut combined = Unitary2x2::identity();
            for op in run.iter() {
                let u = gate_unitary_2x2(op.kind, &op.params).expect("rotations are single-qubit");
                combined = u * combined;
            }
            run.clear();

            if !combined.is_identity_up_to_phase() {
                let (alpha, beta, gamma, _) = combined.zyz_decomposition();
                out.push(GateOp::parametric(
                    GateKind::U3,
                    [qubit],
                    [
                        Unitary2x2::normalize_angle(beta),
                        Unitary2x2::normalize_angle(alpha),
                        Unitary2x2::normalize_angle(gamma),
                    ],
                ));
            }
        }
    }
}
