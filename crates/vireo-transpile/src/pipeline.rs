//! The transpilation pipeline: normalize → layout → route → estimate.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use vireo_device::Device;
use vireo_ir::{Circuit, GateOp};

use crate::cancel::CancelToken;
use crate::cost::{estimate_with, CostMetrics, Warning};
use crate::error::{TranspileError, TranspileResult};
use crate::layout::{plan_layout, Layout, LayoutStrategy};
use crate::normalize::normalize;
use crate::router::{route, RoutedCircuit, RoutingStrategy};
use crate::unitary::UnitaryMatrix;

/// Largest simulated register for the equivalence check; beyond this the
/// check is skipped.
const VERIFY_QUBIT_LIMIT: usize = 10;

/// Phase-invariant Frobenius tolerance for the equivalence check.
const VERIFY_TOLERANCE: f64 = 1e-9;

/// Options for one transpilation call.
#[derive(Debug, Clone, Default)]
pub struct TranspileOptions {
    /// Initial layout strategy.
    pub layout_strategy: LayoutStrategy,
    /// Routing strategy.
    pub routing_strategy: RoutingStrategy,
    /// Error assumed for gates with no calibration entry (0 = contribute
    /// nothing, count only).
    pub fallback_gate_error: f64,
    /// Check that the routed circuit is unitarily equivalent to the input
    /// (small circuits only). Off in production, on in the test suites.
    pub verify_unitary: bool,
    /// Cooperative cancellation token.
    pub cancel: CancelToken,
}

/// Structural metrics recomputed from the routed circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralMetrics {
    /// Depth of the input circuit.
    pub original_depth: usize,
    /// Depth after routing.
    pub transpiled_depth: usize,
    /// Emitted operations, barriers excluded.
    pub gate_count: usize,
    /// Emitted two-qubit gates.
    pub two_qubit_gate_count: usize,
    /// SWAPs inserted by routing.
    pub swap_count: usize,
}

/// Everything a transpilation call produces.
#[derive(Debug, Clone)]
pub struct TranspilationResult {
    /// The circuit after basis normalization, over logical qubits.
    pub normalized: Circuit,
    /// The routed circuit over physical qubits.
    pub routed: Circuit,
    /// The logical→physical embedding in effect before the first emitted
    /// operation.
    pub initial_layout: Layout,
    /// The embedding after the last emitted operation.
    pub final_layout: Layout,
    /// Structural metrics.
    pub structural: StructuralMetrics,
    /// Calibration-weighted cost estimate.
    pub cost: CostMetrics,
    /// Informational warnings accumulated along the way.
    pub warnings: Vec<Warning>,
}

/// Run the full pipeline.
///
/// Pure in its inputs: the same circuit, device and options always produce
/// the same result. Cancellation is observed between stages and on every
/// emitted routing operation; no partial result is ever returned.
#[instrument(skip_all, fields(qubits = circuit.num_qubits(), ops = circuit.ops().len()))]
pub fn transpile(
    circuit: &Circuit,
    device: &Device,
    options: &TranspileOptions,
) -> TranspileResult<TranspilationResult> {
    options.cancel.check()?;
    let normalized = normalize(circuit, &device.basis_gates)?;

    options.cancel.check()?;
    let layout = plan_layout(&normalized, device, options.layout_strategy)?;

    options.cancel.check()?;
    let routed = route(
        &normalized,
        device,
        &layout,
        options.routing_strategy,
        &options.cancel,
    )?;

    options.cancel.check()?;
    if options.verify_unitary && (circuit.num_qubits() as usize) <= VERIFY_QUBIT_LIMIT {
        verify_routing(circuit, &routed)?;
    }

    let cost = estimate_with(&routed, device, options.fallback_gate_error);
    let warnings = cost.warnings.clone();

    // Depths come from the canonical DAG view of each circuit.
    let structural = StructuralMetrics {
        original_depth: circuit.dag().depth(),
        transpiled_depth: routed.circuit.dag().depth(),
        gate_count: routed.circuit.num_gates(),
        two_qubit_gate_count: routed.circuit.num_two_qubit_gates(),
        swap_count: routed.swap_count,
    };

    info!(
        depth = structural.transpiled_depth,
        swaps = structural.swap_count,
        fidelity = cost.fidelity,
        "transpilation complete"
    );

    Ok(TranspilationResult {
        normalized,
        routed: routed.circuit,
        initial_layout: routed.initial_layout,
        final_layout: routed.final_layout,
        structural,
        cost,
        warnings,
    })
}

/// Permutation-aware unitary equivalence between the input circuit and the
/// routed circuit.
///
/// The physical qubits touched by the routed circuit are compacted into a
/// small register; the input is embedded at its initial-layout positions;
/// and the routing permutation (SWAP-induced, ancilla slots included) is
/// applied on top. The two unitaries must then agree up to global phase.
fn verify_routing(input: &Circuit, routed: &RoutedCircuit) -> TranspileResult<()> {
    // Physical slots the comparison must cover: everything the routed
    // circuit touches, plus the initial positions of the input's qubits
    // (normalization may have dropped identity ops on some of them).
    let mut used: BTreeSet<u32> = routed
        .circuit
        .ops()
        .iter()
        .flat_map(|op| op.qubits.iter().map(|q| q.0))
        .collect();
    for q in input.qubits_used() {
        if let Some(p) = routed.initial_layout.physical(q) {
            used.insert(p);
        }
    }
    if used.is_empty() || used.len() > VERIFY_QUBIT_LIMIT {
        return Ok(());
    }

    let compact: FxHashMap<u32, u32> = used
        .iter()
        .enumerate()
        .map(|(i, &p)| (p, i as u32))
        .collect();
    let m = used.len() as u32;

    let remap = |ops: &[GateOp], to_physical: &dyn Fn(vireo_ir::QubitId) -> Option<u32>| {
        let mut circuit = Circuit::new(m, input.num_clbits());
        for op in ops {
            let qubits: Option<Vec<vireo_ir::QubitId>> = op
                .qubits
                .iter()
                .map(|&q| {
                    to_physical(q)
                        .and_then(|p| compact.get(&p).copied())
                        .map(vireo_ir::QubitId)
                })
                .collect();
            let Some(qubits) = qubits else {
                return None;
            };
            let mapped = GateOp {
                kind: op.kind,
                qubits,
                clbits: op.clbits.clone(),
                params: op.params.clone(),
            };
            if circuit.push_unchecked(mapped).is_err() {
                return None;
            }
        }
        Some(circuit)
    };

    // Routed ops are already physical.
    let actual_circuit = remap(routed.circuit.ops(), &|q| Some(q.0)).ok_or_else(|| {
        TranspileError::Internal(vireo_ir::IrError::InvalidDag(
            "routed circuit references untracked qubits".into(),
        ))
    })?;

    // Input ops embed at their initial-layout positions.
    let initial = &routed.initial_layout;
    let embedded_circuit = remap(input.ops(), &|q| initial.physical(q)).ok_or_else(|| {
        TranspileError::Internal(vireo_ir::IrError::InvalidDag(
            "initial layout does not cover the input circuit".into(),
        ))
    })?;

    let mut perm = vec![0u32; used.len()];
    for (i, &p) in used.iter().enumerate() {
        let target = routed.physical_permutation[p as usize];
        perm[i] = *compact.get(&target).ok_or_else(|| {
            TranspileError::Internal(vireo_ir::IrError::InvalidDag(
                "routing permutation escapes the touched qubit set".into(),
            ))
        })?;
    }

    let actual = UnitaryMatrix::from_circuit(&actual_circuit);
    let embedded = UnitaryMatrix::from_circuit(&embedded_circuit);
    let permutation = UnitaryMatrix::permutation(m, &perm);
    let expected = permutation.matmul(&embedded);

    let distance = actual.phase_distance(&expected);
    if distance > VERIFY_TOLERANCE {
        return Err(TranspileError::RoutingUnitaryMismatch { distance });
    }
    Ok(())
}
