//! Unitary matrix utilities.
//!
//! [`Unitary2x2`] backs single-qubit fusion and the gate library's Euler
//! decompositions. [`UnitaryMatrix`] is the dense n-qubit representation
//! used by the optional equivalence checks; it is only ever built for small
//! circuits (the pipeline caps the check at 10 qubits).

use num_complex::Complex64;
use std::f64::consts::PI;

use vireo_ir::{GateKind, GateOp};

/// Tolerance for floating point comparisons.
pub(crate) const EPSILON: f64 = 1e-10;

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Identity.
    pub fn identity() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
        )
    }

    /// Hadamard.
    pub fn h() -> Self {
        let s = 1.0 / 2.0_f64.sqrt();
        Self::new(
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(-s, 0.0),
        )
    }

    /// Pauli-X.
    pub fn x() -> Self {
        Self::new(
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
        )
    }

    /// Pauli-Y.
    pub fn y() -> Self {
        Self::new(
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
        )
    }

    /// Pauli-Z.
    pub fn z() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(-1.0, 0.0),
        )
    }

    /// S gate.
    pub fn s() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 1.0),
        )
    }

    /// S-dagger.
    pub fn sdg() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, -1.0),
        )
    }

    /// T gate.
    pub fn t() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::from_polar(1.0, PI / 4.0),
        )
    }

    /// T-dagger.
    pub fn tdg() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::from_polar(1.0, -PI / 4.0),
        )
    }

    /// sqrt(X).
    pub fn sx() -> Self {
        let half = Complex64::new(0.5, 0.0);
        let half_i = Complex64::new(0.0, 0.5);
        Self::new(half + half_i, half - half_i, half - half_i, half + half_i)
    }

    /// sqrt(X)-dagger.
    pub fn sxdg() -> Self {
        let half = Complex64::new(0.5, 0.0);
        let half_i = Complex64::new(0.0, 0.5);
        Self::new(half - half_i, half + half_i, half + half_i, half - half_i)
    }

    /// X rotation.
    pub fn rx(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(0.0, -s),
            Complex64::new(0.0, -s),
            Complex64::new(c, 0.0),
        )
    }

    /// Y rotation.
    pub fn ry(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(c, 0.0),
        )
    }

    /// Z rotation.
    pub fn rz(theta: f64) -> Self {
        Self::new(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// Phase gate P(λ).
    pub fn p(lambda: f64) -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::from_polar(1.0, lambda),
        )
    }

    /// Universal gate U3(θ, φ, λ).
    pub fn u3(theta: f64, phi: f64, lambda: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        )
    }

    /// Matrix product `self * other` (other applied first).
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// Whether this is identity up to global phase.
    pub fn is_identity_up_to_phase(&self) -> bool {
        let [a, b, c, d] = self.data;
        if b.norm() > EPSILON || c.norm() > EPSILON {
            return false;
        }
        (a - d).norm() < EPSILON
    }

    /// ZYZ Euler decomposition: angles `(alpha, beta, gamma, phase)` with
    /// `self = e^{i·phase} · RZ(alpha) · RY(beta) · RZ(gamma)`.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let [a, b, c, d] = self.data;

        let det = a * d - b * c;
        let global_phase = det.arg() / 2.0;

        // Remove global phase to get an SU(2) matrix.
        let phase_factor = Complex64::from_polar(1.0, -global_phase);
        let a = a * phase_factor;
        let b = b * phase_factor;
        let c = c * phase_factor;

        // SU(2): [[cos(β/2)·e^{-i(α+γ)/2}, -sin(β/2)·e^{-i(α-γ)/2}],
        //         [sin(β/2)·e^{ i(α-γ)/2},  cos(β/2)·e^{ i(α+γ)/2}]]
        let beta = 2.0 * a.norm().clamp(0.0, 1.0).acos();

        if beta.abs() < EPSILON {
            let alpha_plus_gamma = -2.0 * a.arg();
            return (
                alpha_plus_gamma / 2.0,
                0.0,
                alpha_plus_gamma / 2.0,
                global_phase,
            );
        }

        if (beta - PI).abs() < EPSILON {
            let alpha_minus_gamma = -2.0 * (-b).arg();
            return (
                alpha_minus_gamma / 2.0,
                PI,
                -alpha_minus_gamma / 2.0,
                global_phase,
            );
        }

        let alpha_plus_gamma = -2.0 * a.arg();
        let alpha_minus_gamma = 2.0 * c.arg();
        let alpha = (alpha_plus_gamma + alpha_minus_gamma) / 2.0;
        let gamma = (alpha_plus_gamma - alpha_minus_gamma) / 2.0;

        (alpha, beta, gamma, global_phase)
    }

    /// Normalize an angle to (-π, π].
    pub fn normalize_angle(angle: f64) -> f64 {
        if !angle.is_finite() {
            return 0.0;
        }
        let mut a = angle.rem_euclid(2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        }
        a
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}

/// The 2x2 matrix of a single-qubit gate kind, `None` for multi-qubit or
/// non-unitary kinds.
pub fn gate_unitary_2x2(kind: GateKind, params: &[f64]) -> Option<Unitary2x2> {
    Some(match kind {
        GateKind::I => Unitary2x2::identity(),
        GateKind::X => Unitary2x2::x(),
        GateKind::Y => Unitary2x2::y(),
        GateKind::Z => Unitary2x2::z(),
        GateKind::H => Unitary2x2::h(),
        GateKind::S => Unitary2x2::s(),
        GateKind::Sdg => Unitary2x2::sdg(),
        GateKind::T => Unitary2x2::t(),
        GateKind::Tdg => Unitary2x2::tdg(),
        GateKind::SX => Unitary2x2::sx(),
        GateKind::SXdg => Unitary2x2::sxdg(),
        GateKind::P => Unitary2x2::p(params[0]),
        GateKind::Rx => Unitary2x2::rx(params[0]),
        GateKind::Ry => Unitary2x2::ry(params[0]),
        GateKind::Rz => Unitary2x2::rz(params[0]),
        GateKind::U3 => Unitary2x2::u3(params[0], params[1], params[2]),
        _ => return None,
    })
}

/// The local matrix of a unitary gate operation, as a row-major
/// `2^k × 2^k` block with the first listed qubit as the most significant
/// local bit. `None` for measure/barrier.
pub fn gate_matrix(op: &GateOp) -> Option<Vec<Complex64>> {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let i = Complex64::new(0.0, 1.0);

    if let Some(u) = gate_unitary_2x2(op.kind, &op.params) {
        return Some(u.data.to_vec());
    }

    // Controlled-U with the first qubit as control: diag(I, U).
    let controlled = |u: Unitary2x2| -> Vec<Complex64> {
        let [a, b, c, d] = u.data;
        vec![
            one, zero, zero, zero, //
            zero, one, zero, zero, //
            zero, zero, a, b, //
            zero, zero, c, d,
        ]
    };

    Some(match op.kind {
        GateKind::CX => controlled(Unitary2x2::x()),
        GateKind::CY => controlled(Unitary2x2::y()),
        GateKind::CZ => controlled(Unitary2x2::z()),
        GateKind::CH => controlled(Unitary2x2::h()),
        GateKind::CP => controlled(Unitary2x2::p(op.params[0])),
        GateKind::CRx => controlled(Unitary2x2::rx(op.params[0])),
        GateKind::CRy => controlled(Unitary2x2::ry(op.params[0])),
        GateKind::CRz => controlled(Unitary2x2::rz(op.params[0])),
        GateKind::Swap => vec![
            one, zero, zero, zero, //
            zero, zero, one, zero, //
            zero, one, zero, zero, //
            zero, zero, zero, one,
        ],
        GateKind::ISwap => vec![
            one, zero, zero, zero, //
            zero, zero, i, zero, //
            zero, i, zero, zero, //
            zero, zero, zero, one,
        ],
        GateKind::Rxx => {
            let c = Complex64::new((op.params[0] / 2.0).cos(), 0.0);
            let ms = Complex64::new(0.0, -(op.params[0] / 2.0).sin());
            vec![
                c, zero, zero, ms, //
                zero, c, ms, zero, //
                zero, ms, c, zero, //
                ms, zero, zero, c,
            ]
        }
        GateKind::Ryy => {
            let c = Complex64::new((op.params[0] / 2.0).cos(), 0.0);
            let s = Complex64::new(0.0, (op.params[0] / 2.0).sin());
            vec![
                c, zero, zero, s, //
                zero, c, -s, zero, //
                zero, -s, c, zero, //
                s, zero, zero, c,
            ]
        }
        GateKind::Rzz => {
            let neg = Complex64::from_polar(1.0, -op.params[0] / 2.0);
            let pos = Complex64::from_polar(1.0, op.params[0] / 2.0);
            vec![
                neg, zero, zero, zero, //
                zero, pos, zero, zero, //
                zero, zero, pos, zero, //
                zero, zero, zero, neg,
            ]
        }
        GateKind::CCX => {
            // Identity except |110⟩ ↔ |111⟩.
            let mut m = vec![zero; 64];
            for idx in 0..6 {
                m[idx * 8 + idx] = one;
            }
            m[6 * 8 + 7] = one;
            m[7 * 8 + 6] = one;
            m
        }
        GateKind::CSwap => {
            // Identity except |101⟩ ↔ |110⟩.
            let mut m = vec![zero; 64];
            for idx in [0usize, 1, 2, 3, 4, 7] {
                m[idx * 8 + idx] = one;
            }
            m[5 * 8 + 6] = one;
            m[6 * 8 + 5] = one;
            m
        }
        _ => return None,
    })
}

/// A dense `2^n × 2^n` unitary, row-major.
#[derive(Debug, Clone)]
pub struct UnitaryMatrix {
    num_qubits: u32,
    dim: usize,
    data: Vec<Complex64>,
}

impl UnitaryMatrix {
    /// The identity on `num_qubits` qubits.
    pub fn identity(num_qubits: u32) -> Self {
        let dim = 1usize << num_qubits;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for idx in 0..dim {
            data[idx * dim + idx] = Complex64::new(1.0, 0.0);
        }
        Self {
            num_qubits,
            dim,
            data,
        }
    }

    /// Number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Left-multiply by a unitary gate: `self ← G · self`. Measure and
    /// barrier operations are ignored.
    pub fn apply_op(&mut self, op: &GateOp) {
        let Some(local) = gate_matrix(op) else {
            return;
        };
        let k = op.qubits.len();
        let block = 1usize << k;
        debug_assert_eq!(local.len(), block * block);

        // Global bit position of each gate-local bit; the first listed
        // qubit is the most significant local bit.
        let positions: Vec<usize> = op.qubits.iter().map(|q| q.index()).collect();
        let local_to_global = |local_idx: usize, base: usize| -> usize {
            let mut global = base;
            for (slot, &pos) in positions.iter().enumerate() {
                if (local_idx >> (k - 1 - slot)) & 1 == 1 {
                    global |= 1 << pos;
                }
            }
            global
        };

        let gate_bits: usize = positions.iter().map(|&p| 1usize << p).sum();
        let mut gathered = vec![Complex64::new(0.0, 0.0); block];

        for col in 0..self.dim {
            for base in 0..self.dim {
                if base & gate_bits != 0 {
                    continue;
                }
                for (j, slot) in gathered.iter_mut().enumerate() {
                    *slot = self.data[local_to_global(j, base) * self.dim + col];
                }
                for (r, row_out) in (0..block).map(|r| (r, local_to_global(r, base))) {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for (j, &amp) in gathered.iter().enumerate() {
                        acc += local[r * block + j] * amp;
                    }
                    self.data[row_out * self.dim + col] = acc;
                }
            }
        }
    }

    /// Compose an entire circuit onto the identity.
    pub fn from_circuit(circuit: &vireo_ir::Circuit) -> Self {
        let mut u = Self::identity(circuit.num_qubits());
        for op in circuit.ops() {
            u.apply_op(op);
        }
        u
    }

    /// Dense product `self * other` (other applied first).
    pub fn matmul(&self, other: &Self) -> Self {
        assert_eq!(self.dim, other.dim);
        let dim = self.dim;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for row in 0..dim {
            for inner in 0..dim {
                let lhs = self.data[row * dim + inner];
                if lhs.norm_sqr() == 0.0 {
                    continue;
                }
                for col in 0..dim {
                    data[row * dim + col] += lhs * other.data[inner * dim + col];
                }
            }
        }
        Self {
            num_qubits: self.num_qubits,
            dim,
            data,
        }
    }

    /// The permutation unitary sending qubit `q` to position `perm[q]`.
    pub fn permutation(num_qubits: u32, perm: &[u32]) -> Self {
        let dim = 1usize << num_qubits;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for col in 0..dim {
            let mut row = 0usize;
            for (q, &target) in perm.iter().enumerate() {
                if (col >> q) & 1 == 1 {
                    row |= 1 << target;
                }
            }
            data[row * dim + col] = Complex64::new(1.0, 0.0);
        }
        Self {
            num_qubits,
            dim,
            data,
        }
    }

    /// Frobenius distance between two unitaries, minimized over a global
    /// phase: `min_φ ‖A − e^{iφ}B‖_F = sqrt(2d − 2|tr(A†B)|)`.
    pub fn phase_distance(&self, other: &Self) -> f64 {
        assert_eq!(self.dim, other.dim);
        let mut trace = Complex64::new(0.0, 0.0);
        for row in 0..self.dim {
            for col in 0..self.dim {
                trace += self.data[col * self.dim + row].conj() * other.data[col * self.dim + row];
            }
        }
        let d = 2.0 * self.dim as f64 - 2.0 * trace.norm();
        d.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_ir::{Circuit, QubitId};

    #[test]
    fn test_hadamard_squared() {
        let h = Unitary2x2::h();
        assert!((h * h).is_identity_up_to_phase());
    }

    #[test]
    fn test_pauli_squared() {
        for u in [Unitary2x2::x(), Unitary2x2::y(), Unitary2x2::z()] {
            assert!((u * u).is_identity_up_to_phase());
        }
    }

    #[test]
    fn test_sx_squared_is_x() {
        let sx2 = Unitary2x2::sx() * Unitary2x2::sx();
        let diff = sx2.dagger() * Unitary2x2::x();
        assert!(diff.is_identity_up_to_phase());
    }

    #[test]
    fn test_u3_specializations() {
        // U3(θ, -π/2, π/2) = Rx(θ)
        let rx = Unitary2x2::u3(0.7, -PI / 2.0, PI / 2.0);
        assert!((rx.dagger() * Unitary2x2::rx(0.7)).is_identity_up_to_phase());
        // U3(θ, 0, 0) = Ry(θ)
        let ry = Unitary2x2::u3(0.7, 0.0, 0.0);
        assert!((ry.dagger() * Unitary2x2::ry(0.7)).is_identity_up_to_phase());
    }

    #[test]
    fn test_zyz_roundtrip() {
        for u in [
            Unitary2x2::h(),
            Unitary2x2::x(),
            Unitary2x2::t(),
            Unitary2x2::u3(1.1, -0.4, 2.7),
            Unitary2x2::rx(0.3) * Unitary2x2::rz(1.9) * Unitary2x2::ry(-2.2),
        ] {
            let (alpha, beta, gamma, phase) = u.zyz_decomposition();
            let rebuilt = Unitary2x2::rz(alpha) * Unitary2x2::ry(beta) * Unitary2x2::rz(gamma);
            let global = Complex64::from_polar(1.0, phase);
            for idx in 0..4 {
                assert!(
                    (u.data[idx] - rebuilt.data[idx] * global).norm() < 1e-9,
                    "mismatch at {idx}"
                );
            }
        }
    }

    #[test]
    fn test_normalize_angle() {
        assert!((Unitary2x2::normalize_angle(3.0 * PI) - PI).abs() < EPSILON);
        assert!((Unitary2x2::normalize_angle(-PI / 2.0) + PI / 2.0).abs() < EPSILON);
        assert_eq!(Unitary2x2::normalize_angle(f64::NAN), 0.0);
    }

    #[test]
    fn test_bell_unitary() {
        let circuit = Circuit::ghz(2).unwrap();
        let u = UnitaryMatrix::from_circuit(&circuit);
        // First column must be the Bell state (|00⟩ + |11⟩)/√2.
        let s = 1.0 / 2.0_f64.sqrt();
        assert!((u.data[0] - Complex64::new(s, 0.0)).norm() < EPSILON);
        assert!((u.data[3 * 4] - Complex64::new(s, 0.0)).norm() < EPSILON);
        assert!(u.data[4].norm() < EPSILON);
    }

    #[test]
    fn test_cx_equals_h_cz_h() {
        let mut direct = Circuit::new(2, 0);
        direct.cx(QubitId(0), QubitId(1)).unwrap();

        let mut composed = Circuit::new(2, 0);
        composed.h(QubitId(1)).unwrap();
        composed.cz(QubitId(0), QubitId(1)).unwrap();
        composed.h(QubitId(1)).unwrap();

        let a = UnitaryMatrix::from_circuit(&direct);
        let b = UnitaryMatrix::from_circuit(&composed);
        assert!(a.phase_distance(&b) < 1e-9);
    }

    #[test]
    fn test_swap_is_three_cx() {
        let mut swap = Circuit::new(2, 0);
        swap.swap(QubitId(0), QubitId(1)).unwrap();

        let mut cxs = Circuit::new(2, 0);
        cxs.cx(QubitId(0), QubitId(1)).unwrap();
        cxs.cx(QubitId(1), QubitId(0)).unwrap();
        cxs.cx(QubitId(0), QubitId(1)).unwrap();

        let a = UnitaryMatrix::from_circuit(&swap);
        let b = UnitaryMatrix::from_circuit(&cxs);
        assert!(a.phase_distance(&b) < 1e-9);
    }

    #[test]
    fn test_permutation_matches_swap() {
        let mut swap = Circuit::new(2, 0);
        swap.swap(QubitId(0), QubitId(1)).unwrap();
        let gate = UnitaryMatrix::from_circuit(&swap);
        let perm = UnitaryMatrix::permutation(2, &[1, 0]);
        assert!(gate.phase_distance(&perm) < 1e-9);
    }

    #[test]
    fn test_phase_distance_invariance() {
        let circuit = Circuit::ghz(3).unwrap();
        let u = UnitaryMatrix::from_circuit(&circuit);
        let mut shifted = u.clone();
        let phase = Complex64::from_polar(1.0, 1.234);
        for v in &mut shifted.data {
            *v *= phase;
        }
        assert!(u.phase_distance(&shifted) < 1e-9);
    }

    #[test]
    fn test_distinct_unitaries_far() {
        let a = UnitaryMatrix::from_circuit(&Circuit::ghz(2).unwrap());
        let b = UnitaryMatrix::identity(2);
        assert!(a.phase_distance(&b) > 0.5);
    }
}
