//! Initial layout planning: logical → physical qubit embedding.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use vireo_device::{Device, GateQuality};
use vireo_ir::{Circuit, GateKind, QubitId};

use crate::error::{TranspileError, TranspileResult};

/// Log-fidelity stand-in for a non-operational edge; large enough that any
/// usable edge is strictly preferred.
const OBSOLETE_LOG_FIDELITY: f64 = -27.6; // ln(1e-12)

/// Fallback for α when no gate durations are calibrated: 100 ns.
const DEFAULT_GATE_DURATION: f64 = 100e-9;

/// A logical → physical qubit injection.
///
/// Both directions are kept and updated together, so the router can answer
/// "where is logical q" and "who occupies physical p" in O(1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    logical_to_physical: FxHashMap<QubitId, u32>,
    physical_to_logical: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// An empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity layout over `num_qubits` logical qubits.
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(QubitId(i), i);
        }
        layout
    }

    /// Map a logical qubit to a physical qubit, displacing any conflicting
    /// mapping in either direction.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// The physical position of a logical qubit.
    pub fn physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// The logical occupant of a physical qubit.
    pub fn logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Exchange the occupants of two physical qubits.
    pub fn swap_physical(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical.get(&p1).copied();
        let l2 = self.physical_to_logical.get(&p2).copied();

        match l1 {
            Some(l1) => {
                self.logical_to_physical.insert(l1, p2);
                self.physical_to_logical.insert(p2, l1);
            }
            None => {
                self.physical_to_logical.remove(&p2);
            }
        }
        match l2 {
            Some(l2) => {
                self.logical_to_physical.insert(l2, p1);
                self.physical_to_logical.insert(p1, l2);
            }
            None => {
                self.physical_to_logical.remove(&p1);
            }
        }
    }

    /// Number of mapped logical qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Whether no qubit is mapped.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// `(logical, physical)` pairs, sorted by logical index.
    pub fn pairs(&self) -> Vec<(QubitId, u32)> {
        let mut pairs: Vec<_> = self
            .logical_to_physical
            .iter()
            .map(|(&l, &p)| (l, p))
            .collect();
        pairs.sort();
        pairs
    }
}

/// Strategy for choosing the initial embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Logical qubit i on physical qubit i.
    #[default]
    Trivial,
    /// Greedy dense sub-graph packing of the interaction graph.
    Dense,
    /// Dense packing weighted by readout and coherence quality.
    Calibration,
}

/// Pick an initial layout for `circuit` on `device`.
///
/// Fails with `NoFeasibleLayout` when the circuit has more qubits than the
/// device, or when the calibration strategy cannot embed the interaction
/// graph. The dense strategy falls back to trivial instead of failing.
pub fn plan_layout(
    circuit: &Circuit,
    device: &Device,
    strategy: LayoutStrategy,
) -> TranspileResult<Layout> {
    if circuit.num_qubits() > device.num_qubits() {
        return Err(TranspileError::NoFeasibleLayout {
            reason: format!(
                "circuit needs {} qubits but device has {}",
                circuit.num_qubits(),
                device.num_qubits()
            ),
        });
    }

    match strategy {
        LayoutStrategy::Trivial => Ok(Layout::trivial(circuit.num_qubits())),
        LayoutStrategy::Dense => match plan_greedy(circuit, device, false) {
            Some(layout) => Ok(layout),
            None => Ok(Layout::trivial(circuit.num_qubits())),
        },
        LayoutStrategy::Calibration => {
            plan_greedy(circuit, device, true).ok_or_else(|| TranspileError::NoFeasibleLayout {
                reason: "calibration-weighted embedding found no connected placement".into(),
            })
        }
    }
}

/// The logical interaction graph: edge weight = number of two-qubit gates
/// touching the pair.
fn interaction_weights(circuit: &Circuit) -> FxHashMap<(QubitId, QubitId), u32> {
    let mut weights: FxHashMap<(QubitId, QubitId), u32> = FxHashMap::default();
    for op in circuit.ops() {
        if op.is_two_qubit_gate() {
            let (a, b) = (op.qubits[0], op.qubits[1]);
            let key = if a < b { (a, b) } else { (b, a) };
            *weights.entry(key).or_default() += 1;
        }
    }
    weights
}

/// Log-fidelity of the best two-qubit gate calibrated on a physical pair.
fn edge_log_fidelity(device: &Device, a: u32, b: u32) -> f64 {
    let Some(cal) = &device.calibration else {
        return 0.0;
    };
    let mut best: Option<f64> = None;
    let mut obsolete_only = false;
    for kind in [GateKind::CX, GateKind::CZ, GateKind::Swap, GateKind::ISwap] {
        match cal.gate_quality(kind.name(), &[a, b]) {
            GateQuality::Calibrated { error } => {
                let lf = (1.0 - error).ln();
                best = Some(best.map_or(lf, |b: f64| b.max(lf)));
            }
            GateQuality::Obsolete => obsolete_only = true,
            GateQuality::Missing => {}
        }
    }
    match best {
        Some(lf) => lf,
        None if obsolete_only => OBSOLETE_LOG_FIDELITY,
        None => 0.0,
    }
}

/// Quality penalty of a physical qubit: readout error plus α/T1 + α/T2,
/// with α the mean calibrated gate duration so each term is commensurate
/// with one gate error. Missing values contribute nothing.
fn qubit_penalty(device: &Device, p: u32, alpha: f64) -> f64 {
    let Some(cal) = &device.calibration else {
        return 0.0;
    };
    let Some(q) = cal.qubit(p) else { return 0.0 };
    let mut penalty = q.readout_error.unwrap_or(0.0);
    if let Some(t1) = q.t1 {
        penalty += alpha / t1;
    }
    if let Some(t2) = q.t2 {
        penalty += alpha / t2;
    }
    penalty
}

/// Greedy cluster growth: seed from every physical qubit, attach logical
/// qubits in decreasing weighted-degree order to the coupled neighbor that
/// first maximizes the number of satisfied interaction edges, then the sum
/// of `w · ln(1 − gate_error)` over them (minus the quality penalty when
/// `calibrated`). Returns the best-scoring complete embedding.
fn plan_greedy(circuit: &Circuit, device: &Device, calibrated: bool) -> Option<Layout> {
    let weights = interaction_weights(circuit);
    let touched = circuit.qubits_used();
    if touched.is_empty() {
        return Some(complete_layout(Layout::new(), circuit, device));
    }

    let alpha = device
        .calibration
        .as_ref()
        .and_then(|c| c.mean_gate_duration())
        .unwrap_or(DEFAULT_GATE_DURATION);

    // Weighted degree per touched logical qubit.
    let mut degree: FxHashMap<QubitId, u32> = FxHashMap::default();
    for (&(a, b), &w) in &weights {
        *degree.entry(a).or_default() += w;
        *degree.entry(b).or_default() += w;
    }

    // Placement order: decreasing weighted degree, then lower index.
    let mut order = touched.clone();
    order.sort_by_key(|q| (std::cmp::Reverse(degree.get(q).copied().unwrap_or(0)), *q));

    let mut best: Option<(usize, f64, Layout)> = None;

    for seed in 0..device.num_qubits() {
        let Some(candidate) = grow_from(
            seed, &order, &weights, device, calibrated, alpha,
        ) else {
            continue;
        };

        // Cluster score: satisfied edges first, then summed log-fidelity.
        let mut satisfied = 0usize;
        let mut log_fidelity = 0.0;
        for (&(a, b), &w) in &weights {
            let (pa, pb) = (candidate.physical(a).unwrap(), candidate.physical(b).unwrap());
            if device.topology.coupled(pa, pb) {
                satisfied += 1;
                log_fidelity += f64::from(w) * edge_log_fidelity(device, pa, pb);
            }
        }
        if calibrated {
            for &q in &touched {
                log_fidelity -= qubit_penalty(device, candidate.physical(q).unwrap(), alpha);
            }
        }

        let better = match &best {
            None => true,
            Some((s, lf, _)) => satisfied > *s || (satisfied == *s && log_fidelity > *lf),
        };
        if better {
            best = Some((satisfied, log_fidelity, candidate));
        }
    }

    best.map(|(_, _, layout)| complete_layout(layout, circuit, device))
}

/// Grow one embedding from a physical seed. Returns `None` when the cluster
/// cannot be extended to all touched logical qubits.
fn grow_from(
    seed: u32,
    order: &[QubitId],
    weights: &FxHashMap<(QubitId, QubitId), u32>,
    device: &Device,
    calibrated: bool,
    alpha: f64,
) -> Option<Layout> {
    let mut layout = Layout::new();
    layout.add(order[0], seed);

    for &logical in &order[1..] {
        // Candidates: free physical qubits coupled to an already-placed one.
        // A qubit with no interactions has nothing to pack against, so any
        // free slot qualifies for it.
        let isolated = !weights.keys().any(|&(a, b)| a == logical || b == logical);
        let mut candidates: Vec<u32> = vec![];
        if isolated {
            candidates.extend((0..device.num_qubits()).filter(|&p| layout.logical(p).is_none()));
        } else {
            for (_, placed_p) in layout.pairs() {
                for &nb in device.topology.neighbors(placed_p) {
                    if layout.logical(nb).is_none() && !candidates.contains(&nb) {
                        candidates.push(nb);
                    }
                }
            }
        }
        candidates.sort_unstable();

        let mut best: Option<(usize, f64, u32)> = None;
        for &p in &candidates {
            let mut satisfied = 0usize;
            let mut score = 0.0;
            for ((a, b), &w) in weights {
                let other = if *a == logical {
                    *b
                } else if *b == logical {
                    *a
                } else {
                    continue;
                };
                if let Some(po) = layout.physical(other) {
                    if device.topology.coupled(p, po) {
                        satisfied += 1;
                        score += f64::from(w) * edge_log_fidelity(device, p, po);
                    }
                }
            }
            if calibrated {
                score -= qubit_penalty(device, p, alpha);
            }

            // Ties break to the lower physical index (candidates ascend).
            let better = match &best {
                None => true,
                Some((s, sc, _)) => satisfied > *s || (satisfied == *s && score > *sc),
            };
            if better {
                best = Some((satisfied, score, p));
            }
        }

        let (_, _, chosen) = best?;
        layout.add(logical, chosen);
    }

    Some(layout)
}

/// Extend an embedding of the touched qubits to a total injection over all
/// logical indices, filling untouched qubits onto free physical qubits in
/// ascending order.
fn complete_layout(mut layout: Layout, circuit: &Circuit, device: &Device) -> Layout {
    let mut free: Vec<u32> = (0..device.num_qubits())
        .filter(|&p| layout.logical(p).is_none())
        .collect();
    free.reverse();

    for i in 0..circuit.num_qubits() {
        let q = QubitId(i);
        if layout.physical(q).is_none() {
            let p = free.pop().expect("device has at least num_qubits free slots");
            layout.add(q, p);
        }
    }
    layout
}
