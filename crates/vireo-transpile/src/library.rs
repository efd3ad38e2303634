//! Gate library: decomposition of every recognized kind into a target basis.
//!
//! Rules are table-driven per kind: a kind already in the basis maps to
//! itself, fixed kinds carry a fixed lowering, and parametric single-qubit
//! kinds go through the generic Euler route (accumulate the 2×2 matrix,
//! then re-express it in whichever rotation family the basis offers). The
//! product of every rule's output equals the input unitary up to global
//! phase.

use std::f64::consts::PI;

use vireo_device::BasisSet;
use vireo_ir::{GateKind, GateOp, QubitId};

use crate::error::{TranspileError, TranspileResult};
use crate::unitary::{gate_unitary_2x2, Unitary2x2, EPSILON};

/// Maximum recursion depth while lowering; the rule table strictly reduces
/// gate "height", so this bound is never reached for well-formed rules.
const MAX_DEPTH: usize = 16;

/// Rewrite one operation into basis kinds only.
pub fn decompose(op: &GateOp, basis: &BasisSet) -> TranspileResult<Vec<GateOp>> {
    decompose_rec(op, basis, 0)
}

fn decompose_rec(op: &GateOp, basis: &BasisSet, depth: usize) -> TranspileResult<Vec<GateOp>> {
    if depth > MAX_DEPTH {
        return Err(unsupported(op.kind, basis));
    }

    // Measure and barrier pass through; kinds already in basis stay.
    if !op.kind.is_unitary() || basis.contains(op.kind) {
        return Ok(vec![op.clone()]);
    }

    let step = lower_one_step(op, basis)?;
    let mut out = vec![];
    for lowered in step {
        if !lowered.kind.is_unitary() || basis.contains(lowered.kind) {
            out.push(lowered);
        } else {
            out.extend(decompose_rec(&lowered, basis, depth + 1)?);
        }
    }
    Ok(out)
}

fn unsupported(kind: GateKind, basis: &BasisSet) -> TranspileError {
    TranspileError::UnsupportedBasis {
        gate: kind.name().into(),
        basis: basis
            .kinds()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// One rule application. Output gates are strictly "lower" than the input
/// (multi-qubit exotics → CX/CZ + 1q; any 1q → the basis rotation family),
/// so recursion terminates.
fn lower_one_step(op: &GateOp, basis: &BasisSet) -> TranspileResult<Vec<GateOp>> {
    // Any single-qubit unitary goes through the Euler route.
    if let Some(u) = gate_unitary_2x2(op.kind, &op.params) {
        return lower_1q(&u, op.qubits[0], basis).ok_or_else(|| unsupported(op.kind, basis));
    }

    let q = |i: usize| op.qubits[i];

    Ok(match op.kind {
        // Two-qubit entanglers convert into each other by H-conjugation.
        GateKind::CX if basis.contains(GateKind::CZ) => vec![
            GateOp::gate(GateKind::H, [q(1)]),
            GateOp::gate(GateKind::CZ, [q(0), q(1)]),
            GateOp::gate(GateKind::H, [q(1)]),
        ],
        GateKind::CZ if basis.contains(GateKind::CX) => vec![
            GateOp::gate(GateKind::H, [q(1)]),
            GateOp::gate(GateKind::CX, [q(0), q(1)]),
            GateOp::gate(GateKind::H, [q(1)]),
        ],
        GateKind::CX | GateKind::CZ => return Err(unsupported(op.kind, basis)),

        // CY = Sdg(t) · CX · S(t)
        GateKind::CY => vec![
            GateOp::gate(GateKind::Sdg, [q(1)]),
            GateOp::gate(GateKind::CX, [q(0), q(1)]),
            GateOp::gate(GateKind::S, [q(1)]),
        ],

        // CH via the S/T conjugation of CX.
        GateKind::CH => vec![
            GateOp::gate(GateKind::S, [q(1)]),
            GateOp::gate(GateKind::H, [q(1)]),
            GateOp::gate(GateKind::T, [q(1)]),
            GateOp::gate(GateKind::CX, [q(0), q(1)]),
            GateOp::gate(GateKind::Tdg, [q(1)]),
            GateOp::gate(GateKind::H, [q(1)]),
            GateOp::gate(GateKind::Sdg, [q(1)]),
        ],

        // CP(λ) = Rz(λ/2)(c) · CX · Rz(-λ/2)(t) · CX · Rz(λ/2)(t)
        GateKind::CP => {
            let lambda = op.params[0];
            vec![
                GateOp::parametric(GateKind::Rz, [q(0)], [lambda / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [-lambda / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [lambda / 2.0]),
            ]
        }

        // CRz(λ): target Rz halves straddling the CX pair.
        GateKind::CRz => {
            let lambda = op.params[0];
            vec![
                GateOp::parametric(GateKind::Rz, [q(1)], [lambda / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [-lambda / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
            ]
        }

        // CRy(θ): same shape in the Y axis.
        GateKind::CRy => {
            let theta = op.params[0];
            vec![
                GateOp::parametric(GateKind::Ry, [q(1)], [theta / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Ry, [q(1)], [-theta / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
            ]
        }

        // CRx(θ) = H(t) · CRz(θ) · H(t)
        GateKind::CRx => {
            let theta = op.params[0];
            vec![
                GateOp::gate(GateKind::H, [q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [theta / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [-theta / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::gate(GateKind::H, [q(1)]),
            ]
        }

        // SWAP = 3 CX.
        GateKind::Swap => vec![
            GateOp::gate(GateKind::CX, [q(0), q(1)]),
            GateOp::gate(GateKind::CX, [q(1), q(0)]),
            GateOp::gate(GateKind::CX, [q(0), q(1)]),
        ],

        // iSWAP = (S⊗S) · H(a) · CX(a,b) · CX(b,a) · H(b)
        GateKind::ISwap => vec![
            GateOp::gate(GateKind::S, [q(0)]),
            GateOp::gate(GateKind::S, [q(1)]),
            GateOp::gate(GateKind::H, [q(0)]),
            GateOp::gate(GateKind::CX, [q(0), q(1)]),
            GateOp::gate(GateKind::CX, [q(1), q(0)]),
            GateOp::gate(GateKind::H, [q(1)]),
        ],

        // Rzz(θ) = CX · Rz(θ)(t) · CX
        GateKind::Rzz => {
            let theta = op.params[0];
            vec![
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [theta]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
            ]
        }

        // Rxx(θ): conjugate Rzz by H on both qubits.
        GateKind::Rxx => {
            let theta = op.params[0];
            vec![
                GateOp::gate(GateKind::H, [q(0)]),
                GateOp::gate(GateKind::H, [q(1)]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [theta]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::gate(GateKind::H, [q(0)]),
                GateOp::gate(GateKind::H, [q(1)]),
            ]
        }

        // Ryy(θ): conjugate Rzz by Rx(π/2) on both qubits.
        GateKind::Ryy => {
            let theta = op.params[0];
            vec![
                GateOp::parametric(GateKind::Rx, [q(0)], [PI / 2.0]),
                GateOp::parametric(GateKind::Rx, [q(1)], [PI / 2.0]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rz, [q(1)], [theta]),
                GateOp::gate(GateKind::CX, [q(0), q(1)]),
                GateOp::parametric(GateKind::Rx, [q(0)], [-PI / 2.0]),
                GateOp::parametric(GateKind::Rx, [q(1)], [-PI / 2.0]),
            ]
        }

        // Toffoli, the standard 15-gate T-depth decomposition.
        GateKind::CCX => {
            let (a, b, t) = (q(0), q(1), q(2));
            vec![
                GateOp::gate(GateKind::H, [t]),
                GateOp::gate(GateKind::CX, [b, t]),
                GateOp::gate(GateKind::Tdg, [t]),
                GateOp::gate(GateKind::CX, [a, t]),
                GateOp::gate(GateKind::T, [t]),
                GateOp::gate(GateKind::CX, [b, t]),
                GateOp::gate(GateKind::Tdg, [t]),
                GateOp::gate(GateKind::CX, [a, t]),
                GateOp::gate(GateKind::T, [b]),
                GateOp::gate(GateKind::T, [t]),
                GateOp::gate(GateKind::H, [t]),
                GateOp::gate(GateKind::CX, [a, b]),
                GateOp::gate(GateKind::T, [a]),
                GateOp::gate(GateKind::Tdg, [b]),
                GateOp::gate(GateKind::CX, [a, b]),
            ]
        }

        // Fredkin via Toffoli.
        GateKind::CSwap => {
            let (c, t1, t2) = (q(0), q(1), q(2));
            vec![
                GateOp::gate(GateKind::CX, [t2, t1]),
                GateOp::gate(GateKind::CCX, [c, t1, t2]),
                GateOp::gate(GateKind::CX, [t2, t1]),
            ]
        }

        // 1q kinds were handled above; measure/barrier never reach here.
        other => return Err(unsupported(other, basis)),
    })
}

/// Re-express a single-qubit unitary in the basis's rotation family.
///
/// Preference order: the `u3` kind itself, ZYZ (`rz`+`ry`), ZSX
/// (`rz`+`sx`), ZXZ (`rz`+`rx`). Identity (up to phase) maps to nothing.
/// Returns `None` when the basis offers none of these.
pub(crate) fn lower_1q(u: &Unitary2x2, qubit: QubitId, basis: &BasisSet) -> Option<Vec<GateOp>> {
    if u.is_identity_up_to_phase() {
        return Some(vec![]);
    }

    let (alpha, beta, gamma, _) = u.zyz_decomposition();
    let alpha = Unitary2x2::normalize_angle(alpha);
    let beta = Unitary2x2::normalize_angle(beta);
    let gamma = Unitary2x2::normalize_angle(gamma);

    // U3 angles from ZYZ: θ = β, φ = α, λ = γ.
    if basis.contains(GateKind::U3) {
        return Some(vec![GateOp::parametric(
            GateKind::U3,
            [qubit],
            [beta, alpha, gamma],
        )]);
    }

    let rz = |angle: f64| GateOp::parametric(GateKind::Rz, [qubit], [angle]);
    let push_rz = |ops: &mut Vec<GateOp>, angle: f64| {
        let angle = Unitary2x2::normalize_angle(angle);
        if angle.abs() > EPSILON {
            ops.push(rz(angle));
        }
    };

    if basis.contains(GateKind::Rz) && basis.contains(GateKind::Ry) {
        let mut ops = vec![];
        push_rz(&mut ops, gamma);
        if beta.abs() > EPSILON {
            ops.push(GateOp::parametric(GateKind::Ry, [qubit], [beta]));
        }
        push_rz(&mut ops, alpha);
        return Some(ops);
    }

    if basis.contains(GateKind::Rz) && basis.contains(GateKind::SX) {
        // U3(θ, φ, λ) ≅ RZ(φ+π) · SX · RZ(θ+π) · SX · RZ(λ)
        let mut ops = vec![];
        if beta.abs() < EPSILON {
            push_rz(&mut ops, alpha + gamma);
        } else {
            push_rz(&mut ops, gamma);
            ops.push(GateOp::gate(GateKind::SX, [qubit]));
            push_rz(&mut ops, beta + PI);
            ops.push(GateOp::gate(GateKind::SX, [qubit]));
            push_rz(&mut ops, alpha + PI);
        }
        return Some(ops);
    }

    if basis.contains(GateKind::Rz) && basis.contains(GateKind::Rx) {
        // U3(θ, φ, λ) ≅ RZ(φ+π/2) · RX(θ) · RZ(λ−π/2)
        let mut ops = vec![];
        if beta.abs() < EPSILON {
            push_rz(&mut ops, alpha + gamma);
        } else {
            push_rz(&mut ops, gamma - PI / 2.0);
            ops.push(GateOp::parametric(GateKind::Rx, [qubit], [beta]));
            push_rz(&mut ops, alpha + PI / 2.0);
        }
        return Some(ops);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unitary::UnitaryMatrix;
    use vireo_ir::Circuit;

    /// Decompose `op` into `basis` and compare unitaries up to phase.
    fn assert_equivalent(op: GateOp, basis: &BasisSet, num_qubits: u32) {
        let lowered = decompose(&op, basis).unwrap();
        for out in &lowered {
            assert!(
                basis.contains(out.kind),
                "{} not in basis after lowering {}",
                out.kind,
                op.kind
            );
        }

        let original = Circuit::from_ops(num_qubits, 0, [op.clone()]).unwrap();
        let rewritten = Circuit::from_ops(num_qubits, 0, lowered).unwrap();
        let a = UnitaryMatrix::from_circuit(&original);
        let b = UnitaryMatrix::from_circuit(&rewritten);
        let distance = a.phase_distance(&b);
        assert!(
            distance < 1e-9,
            "lowering {} changed the unitary (distance {distance:.3e})",
            op.kind
        );
    }

    fn ibm() -> BasisSet {
        BasisSet::ibm()
    }

    fn heron() -> BasisSet {
        BasisSet::heron()
    }

    fn rotations() -> BasisSet {
        BasisSet::rotations()
    }

    #[test]
    fn test_in_basis_passthrough() {
        let op = GateOp::gate(GateKind::CX, [QubitId(0), QubitId(1)]);
        let out = decompose(&op, &ibm()).unwrap();
        assert_eq!(out, vec![op]);
    }

    #[test]
    fn test_measure_barrier_passthrough() {
        let measure = GateOp::measure(QubitId(0), vireo_ir::ClbitId(0));
        assert_eq!(decompose(&measure, &ibm()).unwrap(), vec![measure.clone()]);
        let barrier = GateOp::barrier([QubitId(0), QubitId(1)]);
        assert_eq!(decompose(&barrier, &ibm()).unwrap(), vec![barrier.clone()]);
    }

    #[test]
    fn test_identity_drops() {
        let op = GateOp::gate(GateKind::I, [QubitId(0)]);
        assert!(decompose(&op, &heron()).unwrap().is_empty());
        let zero_rot = GateOp::parametric(GateKind::Rx, [QubitId(0)], [0.0]);
        assert!(decompose(&zero_rot, &heron()).unwrap().is_empty());
        let full_turn = GateOp::parametric(GateKind::Rx, [QubitId(0)], [4.0 * PI]);
        assert!(decompose(&full_turn, &heron()).unwrap().is_empty());
    }

    #[test]
    fn test_1q_to_zsx() {
        for op in [
            GateOp::gate(GateKind::H, [QubitId(0)]),
            GateOp::gate(GateKind::Y, [QubitId(0)]),
            GateOp::gate(GateKind::T, [QubitId(0)]),
            GateOp::gate(GateKind::SXdg, [QubitId(0)]),
            GateOp::parametric(GateKind::Ry, [QubitId(0)], [0.37]),
            GateOp::parametric(GateKind::U3, [QubitId(0)], [1.2, -0.7, 2.9]),
        ] {
            assert_equivalent(op, &ibm(), 1);
        }
    }

    #[test]
    fn test_1q_to_rotations() {
        for op in [
            GateOp::gate(GateKind::H, [QubitId(0)]),
            GateOp::gate(GateKind::S, [QubitId(0)]),
            GateOp::parametric(GateKind::P, [QubitId(0)], [0.9]),
            GateOp::parametric(GateKind::U3, [QubitId(0)], [0.4, 0.5, 0.6]),
        ] {
            assert_equivalent(op, &rotations(), 1);
        }
    }

    #[test]
    fn test_1q_to_u3() {
        let basis = BasisSet::new([GateKind::U3, GateKind::CX]);
        assert_equivalent(GateOp::gate(GateKind::H, [QubitId(0)]), &basis, 1);
        assert_equivalent(
            GateOp::parametric(GateKind::Rz, [QubitId(0)], [1.3]),
            &basis,
            1,
        );
    }

    #[test]
    fn test_pure_z_collapses_to_one_rz() {
        // S · basis {rz, sx}: β = 0 path must emit a single rz.
        let op = GateOp::gate(GateKind::S, [QubitId(0)]);
        let out = decompose(&op, &ibm()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, GateKind::Rz);
        assert_equivalent(op, &ibm(), 1);
    }

    #[test]
    fn test_cx_to_cz_basis() {
        let op = GateOp::gate(GateKind::CX, [QubitId(0), QubitId(1)]);
        assert_equivalent(op, &heron(), 2);
    }

    #[test]
    fn test_cz_to_cx_basis() {
        let op = GateOp::gate(GateKind::CZ, [QubitId(0), QubitId(1)]);
        assert_equivalent(op, &ibm(), 2);
    }

    #[test]
    fn test_two_qubit_exotics() {
        for op in [
            GateOp::gate(GateKind::CY, [QubitId(0), QubitId(1)]),
            GateOp::gate(GateKind::CH, [QubitId(0), QubitId(1)]),
            GateOp::gate(GateKind::ISwap, [QubitId(0), QubitId(1)]),
            GateOp::gate(GateKind::Swap, [QubitId(0), QubitId(1)]),
            GateOp::parametric(GateKind::CP, [QubitId(0), QubitId(1)], [0.8]),
            GateOp::parametric(GateKind::CRx, [QubitId(0), QubitId(1)], [1.1]),
            GateOp::parametric(GateKind::CRy, [QubitId(0), QubitId(1)], [-0.6]),
            GateOp::parametric(GateKind::CRz, [QubitId(0), QubitId(1)], [2.3]),
            GateOp::parametric(GateKind::Rxx, [QubitId(0), QubitId(1)], [0.5]),
            GateOp::parametric(GateKind::Ryy, [QubitId(0), QubitId(1)], [0.5]),
            GateOp::parametric(GateKind::Rzz, [QubitId(0), QubitId(1)], [0.5]),
        ] {
            assert_equivalent(op.clone(), &ibm(), 2);
            assert_equivalent(op, &heron(), 2);
        }
    }

    #[test]
    fn test_three_qubit_gates() {
        let ccx = GateOp::gate(GateKind::CCX, [QubitId(0), QubitId(1), QubitId(2)]);
        assert_equivalent(ccx, &ibm(), 3);
        let cswap = GateOp::gate(GateKind::CSwap, [QubitId(0), QubitId(1), QubitId(2)]);
        assert_equivalent(cswap, &ibm(), 3);
    }

    #[test]
    fn test_unsupported_basis() {
        // A basis with no rotation family cannot express T.
        let basis = BasisSet::from_names(["h", "cx"]).unwrap();
        let op = GateOp::gate(GateKind::T, [QubitId(0)]);
        let err = decompose(&op, &basis).unwrap_err();
        assert_eq!(err.tag(), "unsupported_basis");
    }

    #[test]
    fn test_no_entangler_errors() {
        let basis = BasisSet::from_names(["rz", "sx", "x"]).unwrap();
        let op = GateOp::gate(GateKind::CX, [QubitId(0), QubitId(1)]);
        assert_eq!(decompose(&op, &basis).unwrap_err().tag(), "unsupported_basis");
    }
}
