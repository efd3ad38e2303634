//! Property-style checks over a deterministic random circuit corpus.

use vireo_device::{BasisSet, Calibration, Device, GateCalibration, Topology};
use vireo_ir::{Circuit, GateKind, GateOp, QubitId};
use vireo_transpile::unitary::UnitaryMatrix;
use vireo_transpile::{
    estimate, normalize, plan_layout, route, transpile, CancelToken, Layout, LayoutStrategy,
    RoutingStrategy, TranspileOptions,
};

/// Small xorshift generator so the corpus is fixed across runs.
struct Rng(u64);

impl Rng {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 32) as u32
    }

    fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }

    fn angle(&mut self) -> f64 {
        f64::from(self.next_u32() % 10_000) / 10_000.0 * 6.0 - 3.0
    }
}

/// A random circuit over `n` qubits with `len` gates.
fn random_circuit(rng: &mut Rng, n: u32, len: usize) -> Circuit {
    let mut circuit = Circuit::new(n, 0);
    for _ in 0..len {
        let q0 = QubitId(rng.below(n));
        match rng.below(10) {
            0 => circuit.h(q0).unwrap(),
            1 => circuit.x(q0).unwrap(),
            2 => circuit.t(q0).unwrap(),
            3 => circuit.s(q0).unwrap(),
            4 => circuit.rz(rng.angle(), q0).unwrap(),
            5 => circuit.ry(rng.angle(), q0).unwrap(),
            6 => circuit.sx(q0).unwrap(),
            kind => {
                let mut q1 = QubitId(rng.below(n));
                while q1 == q0 {
                    q1 = QubitId(rng.below(n));
                }
                match kind {
                    7 => circuit.cx(q0, q1).unwrap(),
                    8 => circuit.cz(q0, q1).unwrap(),
                    _ => circuit.cp(rng.angle(), q0, q1).unwrap(),
                }
            }
        };
    }
    circuit
}

fn bases() -> [BasisSet; 3] {
    [BasisSet::ibm(), BasisSet::heron(), BasisSet::rotations()]
}

/// Normalization preserves the unitary up to global phase on a random
/// corpus of small circuits.
#[test]
fn normalization_preserves_semantics() {
    let mut rng = Rng(0x5eed_0001);
    for _ in 0..12 {
        let circuit = random_circuit(&mut rng, 4, 16);
        for basis in bases() {
            let normalized = normalize(&circuit, &basis).unwrap();
            let a = UnitaryMatrix::from_circuit(&circuit);
            let b = UnitaryMatrix::from_circuit(&normalized);
            let distance = a.phase_distance(&b);
            assert!(
                distance < 1e-9,
                "normalization changed the unitary (distance {distance:.3e})"
            );
        }
    }
}

/// Normalizing twice produces the same gate structure as normalizing once.
#[test]
fn normalization_idempotent() {
    let mut rng = Rng(0x5eed_0002);
    for _ in 0..12 {
        let circuit = random_circuit(&mut rng, 4, 16);
        for basis in bases() {
            let once = normalize(&circuit, &basis).unwrap();
            let twice = normalize(&once, &basis).unwrap();
            assert_eq!(once.ops().len(), twice.ops().len());
            for (a, b) in once.ops().iter().zip(twice.ops()) {
                assert_eq!(a.kind, b.kind);
                assert_eq!(a.qubits, b.qubits);
                for (x, y) in a.params.iter().zip(&b.params) {
                    assert!((x - y).abs() < 1e-9);
                }
            }
        }
    }
}

/// Every operation the normalizer emits is in the requested basis.
#[test]
fn normalization_basis_containment() {
    let mut rng = Rng(0x5eed_0003);
    for _ in 0..12 {
        let circuit = random_circuit(&mut rng, 5, 24);
        for basis in bases() {
            let normalized = normalize(&circuit, &basis).unwrap();
            for op in normalized.ops() {
                assert!(basis.contains(op.kind), "{} escaped the basis", op.kind);
            }
        }
    }
}

/// Routed circuits are device-legal and unitarily equivalent to their
/// inputs; the pipeline's internal check enforces the equivalence.
#[test]
fn routing_legal_and_semantics_preserving() {
    let mut rng = Rng(0x5eed_0004);
    let device = Device::new("line-5", "test", Topology::linear(5), BasisSet::ibm());

    for _ in 0..8 {
        let circuit = random_circuit(&mut rng, 5, 14);
        for routing_strategy in [
            RoutingStrategy::Naive,
            RoutingStrategy::Basic,
            RoutingStrategy::Lookahead,
            RoutingStrategy::Sabre,
        ] {
            let options = TranspileOptions {
                routing_strategy,
                verify_unitary: true,
                ..Default::default()
            };
            let result = transpile(&circuit, &device, &options)
                .unwrap_or_else(|e| panic!("{routing_strategy:?}: {e}"));
            for op in result.routed.ops() {
                if op.is_two_qubit_gate() {
                    assert!(
                        device.topology.coupled(op.qubits[0].0, op.qubits[1].0),
                        "{routing_strategy:?} emitted an uncoupled pair"
                    );
                }
            }
        }
    }
}

/// Routing is a pure function of its inputs.
#[test]
fn routing_deterministic() {
    let mut rng = Rng(0x5eed_0005);
    let device = Device::new("grid-6", "test", Topology::grid(3, 2), BasisSet::universal());

    for _ in 0..6 {
        let circuit = random_circuit(&mut rng, 6, 20);
        for routing_strategy in [
            RoutingStrategy::Naive,
            RoutingStrategy::Basic,
            RoutingStrategy::Lookahead,
            RoutingStrategy::Sabre,
        ] {
            let run = || {
                route(
                    &circuit,
                    &device,
                    &Layout::trivial(6),
                    routing_strategy,
                    &CancelToken::new(),
                )
                .unwrap()
            };
            let a = run();
            let b = run();
            assert_eq!(a.circuit.ops(), b.circuit.ops(), "{routing_strategy:?}");
            assert_eq!(a.swap_count, b.swap_count);
            assert_eq!(a.final_layout.pairs(), b.final_layout.pairs());
        }
    }
}

/// A circuit with no two-qubit gates never needs a SWAP.
#[test]
fn no_two_qubit_gates_zero_swaps() {
    let device = Device::new("line-4", "test", Topology::linear(4), BasisSet::universal());
    let mut circuit = Circuit::new(4, 0);
    for i in 0..4 {
        circuit.h(QubitId(i)).unwrap();
        circuit.rz(0.3 * f64::from(i + 1), QubitId(i)).unwrap();
    }

    for routing_strategy in [
        RoutingStrategy::Naive,
        RoutingStrategy::Basic,
        RoutingStrategy::Lookahead,
        RoutingStrategy::Sabre,
    ] {
        let routed = route(
            &circuit,
            &device,
            &Layout::trivial(4),
            routing_strategy,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(routed.swap_count, 0);
    }
}

/// Every logical qubit touched by the circuit is in the layout's domain,
/// mapped injectively, for every strategy.
#[test]
fn layout_totality() {
    let mut rng = Rng(0x5eed_0006);
    let device = Device::new("grid-9", "test", Topology::grid(3, 3), BasisSet::universal());

    for _ in 0..8 {
        let circuit = random_circuit(&mut rng, 6, 18);
        for strategy in [
            LayoutStrategy::Trivial,
            LayoutStrategy::Dense,
            LayoutStrategy::Calibration,
        ] {
            let layout = match plan_layout(&circuit, &device, strategy) {
                Ok(layout) => layout,
                // Calibration may legitimately fail on sparse graphs; the
                // others may not.
                Err(_) if strategy == LayoutStrategy::Calibration => continue,
                Err(e) => panic!("{strategy:?}: {e}"),
            };
            let mut images = vec![];
            for q in circuit.qubits_used() {
                let p = layout
                    .physical(q)
                    .unwrap_or_else(|| panic!("{strategy:?}: {q} unmapped"));
                assert!(p < device.num_qubits());
                assert!(!images.contains(&p), "{strategy:?}: not injective");
                images.push(p);
            }
        }
    }
}

/// Adding a gate can only decrease `F_gate · F_dec`; removing a SWAP can
/// only increase it.
#[test]
fn cost_monotonicity() {
    let cal = Calibration::new(
        vec![],
        vec![
            GateCalibration {
                name: "h".into(),
                qubits: vec![0],
                gate_error: Some(0.002),
                duration: Some(50e-9),
                ..Default::default()
            },
            GateCalibration {
                name: "cx".into(),
                qubits: vec![0, 1],
                gate_error: Some(0.012),
                duration: Some(300e-9),
                ..Default::default()
            },
            GateCalibration {
                name: "swap".into(),
                qubits: vec![1, 2],
                gate_error: Some(0.03),
                duration: Some(900e-9),
                ..Default::default()
            },
        ],
    );
    let device = Device::new("line-3", "test", Topology::linear(3), BasisSet::universal())
        .with_calibration(cal)
        .unwrap();

    let base = {
        let mut c = Circuit::new(3, 0);
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c
    };
    let with_swap = {
        let mut c = base.clone();
        c.swap(QubitId(1), QubitId(2)).unwrap();
        c
    };

    let routed = |c: &Circuit| {
        route(
            c,
            &device,
            &Layout::trivial(3),
            RoutingStrategy::Basic,
            &CancelToken::new(),
        )
        .unwrap()
    };

    let lean = estimate(&routed(&base), &device);
    let heavy = estimate(&routed(&with_swap), &device);
    assert!(
        heavy.gate_fidelity * heavy.decoherence_fidelity
            < lean.gate_fidelity * lean.decoherence_fidelity
    );
}

/// Fidelity stays inside (0, 1] for very deep circuits thanks to log-space
/// accumulation.
#[test]
fn numeric_safety_deep_circuit() {
    let cal = Calibration::new(
        vec![],
        vec![GateCalibration {
            name: "sx".into(),
            qubits: vec![0],
            gate_error: Some(0.0015),
            ..Default::default()
        }],
    );
    let device = Device::new("one", "test", Topology::linear(1), BasisSet::universal())
        .with_calibration(cal)
        .unwrap();

    let mut ops = vec![];
    for _ in 0..10_000 {
        ops.push(GateOp::gate(GateKind::SX, [QubitId(0)]));
    }
    let circuit = Circuit::from_ops(1, 0, ops).unwrap();
    let routed = route(
        &circuit,
        &device,
        &Layout::trivial(1),
        RoutingStrategy::Basic,
        &CancelToken::new(),
    )
    .unwrap();
    let metrics = estimate(&routed, &device);
    assert!(metrics.fidelity > 0.0);
    assert!(metrics.fidelity <= 1.0);
    // The naive product would have underflowed toward zero long before
    // 10,000 gates; the additive error keeps growing past 1 regardless.
    assert!(metrics.overall_gate_error > 10.0);
}
