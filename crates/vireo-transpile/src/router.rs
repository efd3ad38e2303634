//! SWAP routing: make every two-qubit gate act on a coupled pair.
//!
//! All strategies share one state machine: a working logical↔physical
//! mapping held as two fixed-size arrays, a ready set ordered by
//! (topological depth, program order), and an emitted buffer. They differ
//! only in which pending operation guides SWAP selection and how ties
//! among candidate SWAPs break. Everything is deterministic: repeated calls
//! with the same inputs produce the same sequence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vireo_device::{Device, GateQuality};
use vireo_ir::{Circuit, GateKind, GateOp, QubitId};

use crate::cancel::CancelToken;
use crate::error::{TranspileError, TranspileResult};
use crate::layout::Layout;

/// Lookahead window over pending two-qubit operations.
const LOOKAHEAD_WINDOW: usize = 20;

/// Error assumed for a two-qubit edge with no calibration entry when
/// building weighted distances.
const DEFAULT_EDGE_ERROR: f64 = 0.01;

/// Weighted-distance cost of a non-operational edge; high enough that any
/// usable route is strictly preferred.
const OBSOLETE_EDGE_COST: f64 = 1e3;

/// Routing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    /// Process operations strictly in program order; one SWAP at a time
    /// toward the earliest blocked gate.
    Naive,
    /// Drain every currently executable operation before considering SWAPs.
    #[default]
    Basic,
    /// Score candidate SWAPs over a window of pending two-qubit gates.
    Lookahead,
    /// Bidirectional lookahead with calibration-weighted distances.
    Sabre,
}

/// The routed circuit together with the mappings that bracket it.
#[derive(Debug, Clone)]
pub struct RoutedCircuit {
    /// The emitted circuit over physical qubits.
    pub circuit: Circuit,
    /// The mapping in effect before the first emitted operation (SABRE
    /// refines the one handed in).
    pub initial_layout: Layout,
    /// The mapping after the last emitted operation.
    pub final_layout: Layout,
    /// Number of SWAP gates inserted by routing.
    pub swap_count: usize,
    /// Net permutation of physical slots induced by the inserted SWAPs:
    /// the state starting at slot `s` ends at slot `physical_permutation[s]`.
    /// Covers ancilla slots, which layouts do not track.
    pub physical_permutation: Vec<u32>,
}

/// Route `circuit` on `device` starting from `initial`.
///
/// Guarantees: every two-qubit gate in the output acts on a coupled pair,
/// and the output under its final layout is unitarily equivalent to the
/// input under the returned initial layout.
pub fn route(
    circuit: &Circuit,
    device: &Device,
    initial: &Layout,
    strategy: RoutingStrategy,
    cancel: &CancelToken,
) -> TranspileResult<RoutedCircuit> {
    let mapping = Mapping::from_layout(initial, circuit, device);

    match strategy {
        RoutingStrategy::Naive => {
            let mut engine = Engine::new(circuit, device, mapping, cancel, DistanceModel::Hops);
            engine.run(Mode::Naive)?;
            Ok(engine.finish(initial.clone()))
        }
        RoutingStrategy::Basic => {
            let mut engine = Engine::new(circuit, device, mapping, cancel, DistanceModel::Hops);
            engine.run(Mode::Basic)?;
            Ok(engine.finish(initial.clone()))
        }
        RoutingStrategy::Lookahead => {
            let mut engine = Engine::new(circuit, device, mapping, cancel, DistanceModel::Hops);
            engine.run(Mode::Lookahead)?;
            Ok(engine.finish(initial.clone()))
        }
        RoutingStrategy::Sabre => route_sabre(circuit, device, mapping, cancel),
    }
}

/// SABRE: a forward pass refines the mapping, a reverse pass over the
/// reversed circuit refines it again, and the final forward pass emits.
fn route_sabre(
    circuit: &Circuit,
    device: &Device,
    mapping: Mapping,
    cancel: &CancelToken,
) -> TranspileResult<RoutedCircuit> {
    let weighted = DistanceModel::weighted(device);

    let mut forward = Engine::new(circuit, device, mapping, cancel, weighted.clone());
    forward.run(Mode::Lookahead)?;
    let after_forward = forward.into_mapping();

    let reversed: Circuit = {
        let mut ops: Vec<GateOp> = circuit.ops().to_vec();
        ops.reverse();
        let mut rev = Circuit::new(circuit.num_qubits(), circuit.num_clbits());
        for op in ops {
            rev.push_unchecked(op).map_err(TranspileError::Internal)?;
        }
        rev
    };
    let mut backward = Engine::new(&reversed, device, after_forward, cancel, weighted.clone());
    backward.run(Mode::Lookahead)?;
    let refined = backward.into_mapping();

    let refined_initial = refined.to_layout();
    let mut emit = Engine::new(circuit, device, refined, cancel, weighted);
    emit.run(Mode::Lookahead)?;
    Ok(emit.finish(refined_initial))
}

// =============================================================================
// Working mapping
// =============================================================================

/// The router's working bijection, maintained in both directions as
/// fixed-size arrays.
#[derive(Debug, Clone)]
struct Mapping {
    log2phys: Vec<u32>,
    phys2log: Vec<Option<QubitId>>,
}

impl Mapping {
    /// Materialize a layout into arrays, extending it over any unmapped
    /// logical qubits (ascending free physical slots) so it is total.
    fn from_layout(layout: &Layout, circuit: &Circuit, device: &Device) -> Self {
        let n_logical = circuit.num_qubits() as usize;
        let n_physical = device.num_qubits() as usize;

        let mut log2phys = vec![u32::MAX; n_logical];
        let mut phys2log: Vec<Option<QubitId>> = vec![None; n_physical];
        for (logical, physical) in layout.pairs() {
            if logical.index() < n_logical {
                log2phys[logical.index()] = physical;
                phys2log[physical as usize] = Some(logical);
            }
        }

        let mut free = (0..n_physical as u32)
            .filter(|&p| phys2log[p as usize].is_none())
            .collect::<Vec<_>>()
            .into_iter();
        for (i, slot) in log2phys.iter_mut().enumerate() {
            if *slot == u32::MAX {
                let p = free.next().expect("layout feasibility checked upstream");
                *slot = p;
                phys2log[p as usize] = Some(QubitId(i as u32));
            }
        }

        Self { log2phys, phys2log }
    }

    #[inline]
    fn physical(&self, q: QubitId) -> u32 {
        self.log2phys[q.index()]
    }

    /// Exchange the occupants of two physical qubits.
    fn swap(&mut self, a: u32, b: u32) {
        if let Some(l) = self.phys2log[a as usize] {
            self.log2phys[l.index()] = b;
        }
        if let Some(l) = self.phys2log[b as usize] {
            self.log2phys[l.index()] = a;
        }
        self.phys2log.swap(a as usize, b as usize);
    }

    fn to_layout(&self) -> Layout {
        let mut layout = Layout::new();
        for (i, &p) in self.log2phys.iter().enumerate() {
            layout.add(QubitId(i as u32), p);
        }
        layout
    }
}

// =============================================================================
// Distances
// =============================================================================

/// Distance model used for SWAP guidance.
#[derive(Debug, Clone)]
enum DistanceModel {
    /// Unweighted BFS hops.
    Hops,
    /// All-pairs shortest paths under `-ln(1 - gate_error)` edge costs.
    Weighted(Vec<Vec<f64>>),
}

impl DistanceModel {
    /// Build the calibration-weighted all-pairs matrix (Dijkstra from each
    /// source; the graphs are small).
    fn weighted(device: &Device) -> Self {
        let n = device.num_qubits() as usize;
        let cost = |a: u32, b: u32| -> f64 { edge_cost(device, a, b) };

        let mut matrix = vec![vec![f64::INFINITY; n]; n];
        for (src, row) in matrix.iter_mut().enumerate() {
            row[src] = 0.0;
            let mut visited = vec![false; n];
            loop {
                let mut current: Option<usize> = None;
                for v in 0..n {
                    if !visited[v]
                        && row[v].is_finite()
                        && current.is_none_or(|c| row[v] < row[c])
                    {
                        current = Some(v);
                    }
                }
                let Some(u) = current else { break };
                visited[u] = true;
                for &nb in device.topology.neighbors(u as u32) {
                    let next = row[u] + cost(u as u32, nb);
                    if next < row[nb as usize] {
                        row[nb as usize] = next;
                    }
                }
            }
        }
        DistanceModel::Weighted(matrix)
    }

    fn distance(&self, device: &Device, a: u32, b: u32) -> Option<f64> {
        match self {
            DistanceModel::Hops => device.topology.distance(a, b).map(f64::from),
            DistanceModel::Weighted(matrix) => {
                let d = matrix[a as usize][b as usize];
                d.is_finite().then_some(d)
            }
        }
    }
}

/// Weighted cost of one coupling edge.
fn edge_cost(device: &Device, a: u32, b: u32) -> f64 {
    let Some(cal) = &device.calibration else {
        return -(1.0 - DEFAULT_EDGE_ERROR).ln();
    };
    let mut best: Option<f64> = None;
    let mut obsolete = false;
    for kind in [GateKind::CX, GateKind::CZ] {
        match cal.gate_quality(kind.name(), &[a, b]) {
            GateQuality::Calibrated { error } => {
                best = Some(best.map_or(error, |e: f64| e.min(error)));
            }
            GateQuality::Obsolete => obsolete = true,
            GateQuality::Missing => {}
        }
    }
    match best {
        Some(error) => (-(1.0 - error).ln()).max(1e-9),
        None if obsolete => OBSOLETE_EDGE_COST,
        None => -(1.0 - DEFAULT_EDGE_ERROR).ln(),
    }
}

/// Fidelity product of the calibrated two-qubit gates on an edge, used to
/// break score ties toward better hardware.
fn edge_fidelity(device: &Device, a: u32, b: u32) -> f64 {
    let Some(cal) = &device.calibration else {
        return 1.0;
    };
    let mut fidelity = 1.0;
    for kind in [GateKind::CX, GateKind::CZ, GateKind::Swap] {
        match cal.gate_quality(kind.name(), &[a, b]) {
            GateQuality::Calibrated { error } => fidelity *= 1.0 - error,
            GateQuality::Obsolete => fidelity *= 1e-12,
            GateQuality::Missing => {}
        }
    }
    fidelity
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Naive,
    Basic,
    Lookahead,
}

struct Engine<'a> {
    device: &'a Device,
    cancel: &'a CancelToken,
    distances: DistanceModel,

    ops: Vec<GateOp>,
    successors: Vec<Vec<usize>>,
    indegree: Vec<usize>,
    depth: Vec<u32>,
    /// Ready set keyed by (topological depth, program position).
    ready: BTreeSet<(u32, usize)>,
    emitted_count: usize,

    mapping: Mapping,
    /// `origin[p]` = the physical slot whose initial state now sits at `p`.
    origin: Vec<u32>,
    out: Circuit,
    swap_count: usize,
}

impl<'a> Engine<'a> {
    fn new(
        circuit: &Circuit,
        device: &'a Device,
        mapping: Mapping,
        cancel: &'a CancelToken,
        distances: DistanceModel,
    ) -> Self {
        let ops: Vec<GateOp> = circuit.ops().to_vec();
        let n = ops.len();

        // Wire-adjacency dependencies: the previous op on any shared qubit
        // or classical bit precedes this one.
        let mut successors: Vec<Vec<usize>> = vec![vec![]; n];
        let mut indegree = vec![0usize; n];
        let mut depth = vec![0u32; n];
        let mut last_on_qubit: Vec<Option<usize>> = vec![None; circuit.num_qubits() as usize];
        let mut last_on_clbit: Vec<Option<usize>> = vec![None; circuit.num_clbits() as usize];

        for (idx, op) in ops.iter().enumerate() {
            let mut preds: Vec<usize> = vec![];
            for &q in &op.qubits {
                if let Some(prev) = last_on_qubit[q.index()] {
                    if !preds.contains(&prev) {
                        preds.push(prev);
                    }
                }
                last_on_qubit[q.index()] = Some(idx);
            }
            for &c in &op.clbits {
                if let Some(prev) = last_on_clbit[c.index()] {
                    if !preds.contains(&prev) {
                        preds.push(prev);
                    }
                }
                last_on_clbit[c.index()] = Some(idx);
            }
            indegree[idx] = preds.len();
            depth[idx] = preds.iter().map(|&p| depth[p] + 1).max().unwrap_or(0);
            for p in preds {
                successors[p].push(idx);
            }
        }

        let ready = (0..n)
            .filter(|&i| indegree[i] == 0)
            .map(|i| (depth[i], i))
            .collect();

        Self {
            device,
            cancel,
            distances,
            ops,
            successors,
            indegree,
            depth,
            ready,
            emitted_count: 0,
            mapping,
            origin: (0..device.num_qubits()).collect(),
            out: Circuit::new(device.num_qubits(), circuit.num_clbits()),
            swap_count: 0,
        }
    }

    fn run(&mut self, mode: Mode) -> TranspileResult<()> {
        // Progress backstop; each iteration either emits or strictly
        // shrinks some pending distance, so this is unreachable for any
        // connected instance.
        let limit = 1000 + self.ops.len() * self.device.num_qubits() as usize * 8;

        match mode {
            Mode::Naive => self.run_naive(),
            Mode::Basic | Mode::Lookahead => {
                let mut iterations = 0usize;
                while self.emitted_count < self.ops.len() {
                    self.drain()?;
                    if self.emitted_count == self.ops.len() {
                        break;
                    }

                    match mode {
                        Mode::Basic => self.step_toward_earliest_blocked()?,
                        Mode::Lookahead => self.lookahead_swap()?,
                        Mode::Naive => unreachable!(),
                    }

                    iterations += 1;
                    if iterations > limit {
                        return Err(TranspileError::Internal(vireo_ir::IrError::InvalidDag(
                            "router failed to make progress".into(),
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Naive mode: strict program order, one gate at a time.
    fn run_naive(&mut self) -> TranspileResult<()> {
        for idx in 0..self.ops.len() {
            let op = self.ops[idx].clone();
            if op.is_two_qubit_gate() {
                loop {
                    let (a, b) = (
                        self.mapping.physical(op.qubits[0]),
                        self.mapping.physical(op.qubits[1]),
                    );
                    if self.device.topology.coupled(a, b) {
                        break;
                    }
                    self.insert_path_step(a, b)?;
                }
            }
            self.emit(idx)?;
        }
        Ok(())
    }

    /// Emit every ready operation that is currently executable, repeatedly,
    /// in (depth, program-order) priority.
    fn drain(&mut self) -> TranspileResult<()> {
        loop {
            let next = self
                .ready
                .iter()
                .copied()
                .find(|&(_, idx)| self.is_executable(idx));
            match next {
                Some((key_depth, idx)) => {
                    self.ready.remove(&(key_depth, idx));
                    self.emit(idx)?;
                }
                None => return Ok(()),
            }
        }
    }

    fn is_executable(&self, idx: usize) -> bool {
        let op = &self.ops[idx];
        if !op.is_two_qubit_gate() {
            return true;
        }
        let a = self.mapping.physical(op.qubits[0]);
        let b = self.mapping.physical(op.qubits[1]);
        self.device.topology.coupled(a, b)
    }

    /// Emit one operation at its physical positions and unlock successors.
    fn emit(&mut self, idx: usize) -> TranspileResult<()> {
        self.cancel.check()?;

        let op = &self.ops[idx];
        let mapped = GateOp {
            kind: op.kind,
            qubits: op.qubits.iter().map(|&q| QubitId(self.mapping.physical(q))).collect(),
            clbits: op.clbits.clone(),
            params: op.params.clone(),
        };
        self.out.push_unchecked(mapped).map_err(TranspileError::Internal)?;
        self.emitted_count += 1;

        for s in self.successors[idx].clone() {
            self.indegree[s] -= 1;
            if self.indegree[s] == 0 {
                self.ready.insert((self.depth[s], s));
            }
        }
        Ok(())
    }

    /// Blocked front layer: ready two-qubit ops on uncoupled pairs, in
    /// (depth, program order).
    fn blocked(&self) -> Vec<usize> {
        self.ready
            .iter()
            .map(|&(_, idx)| idx)
            .filter(|&idx| !self.is_executable(idx))
            .collect()
    }

    /// Basic/naive SWAP choice: earliest blocked gate, one step along the
    /// shortest path starting at its first (control) operand.
    fn step_toward_earliest_blocked(&mut self) -> TranspileResult<()> {
        let blocked = self.blocked();
        let &idx = blocked
            .first()
            .expect("drain left unexecutable ready ops");
        let op = &self.ops[idx];
        let a = self.mapping.physical(op.qubits[0]);
        let b = self.mapping.physical(op.qubits[1]);
        self.insert_path_step(a, b)
    }

    /// Insert one SWAP on the first edge of the shortest path `from → to`.
    fn insert_path_step(&mut self, from: u32, to: u32) -> TranspileResult<()> {
        let path = self
            .device
            .topology
            .shortest_path(from, to)
            .ok_or(TranspileError::DisconnectedDevice { a: from, b: to })?;
        debug_assert!(path.len() >= 2);
        self.apply_swap(path[0], path[1])
    }

    /// Emit a SWAP gate and update the mapping.
    fn apply_swap(&mut self, a: u32, b: u32) -> TranspileResult<()> {
        self.cancel.check()?;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.out
            .push_unchecked(GateOp::gate(GateKind::Swap, [QubitId(lo), QubitId(hi)]))
            .map_err(TranspileError::Internal)?;
        self.mapping.swap(a, b);
        self.origin.swap(a as usize, b as usize);
        self.swap_count += 1;
        debug!(swap = ?(lo, hi), "inserted swap");
        Ok(())
    }

    /// Lookahead SWAP choice: score every candidate edge by the summed
    /// distance reduction it induces over the next `LOOKAHEAD_WINDOW`
    /// pending two-qubit gates; ties break by higher edge fidelity, then
    /// by lexicographic pair order. Falls back to a shortest-path step
    /// toward the closest blocked gate when nothing scores positive.
    fn lookahead_swap(&mut self) -> TranspileResult<()> {
        let blocked = self.blocked();

        // The blocked set is non-empty here; verify connectivity up front.
        for &idx in &blocked {
            let op = &self.ops[idx];
            let a = self.mapping.physical(op.qubits[0]);
            let b = self.mapping.physical(op.qubits[1]);
            if self.distance(a, b).is_none() {
                return Err(TranspileError::DisconnectedDevice { a, b });
            }
        }

        let window = self.pending_window();

        // Candidate edges: coupled edges incident to a blocked gate's
        // current physical positions.
        let mut candidates: BTreeSet<(u32, u32)> = BTreeSet::new();
        for &idx in &blocked {
            let op = &self.ops[idx];
            for &q in &op.qubits {
                let p = self.mapping.physical(q);
                for &nb in self.device.topology.neighbors(p) {
                    candidates.insert((p.min(nb), p.max(nb)));
                }
            }
        }

        let mut best: Option<((u32, u32), f64, f64)> = None;
        for &(a, b) in &candidates {
            let score = self.swap_score(a, b, &window);
            let fidelity = edge_fidelity(self.device, a, b);
            let better = match &best {
                None => score > 0.0,
                Some((_, s, f)) => score > *s || (score == *s && fidelity > *f),
            };
            if better {
                best = Some(((a, b), score, fidelity));
            }
        }

        match best {
            Some(((a, b), _, _)) => self.apply_swap(a, b),
            None => {
                // Guaranteed progress: step toward the blocked gate with
                // the smallest distance (ties: lower logical index).
                let &idx = blocked
                    .iter()
                    .min_by(|&&x, &&y| {
                        let key = |i: usize| {
                            let op = &self.ops[i];
                            let a = self.mapping.physical(op.qubits[0]);
                            let b = self.mapping.physical(op.qubits[1]);
                            (
                                self.distance(a, b).unwrap_or(f64::INFINITY),
                                op.qubits.iter().min().copied(),
                            )
                        };
                        key(x).partial_cmp(&key(y)).expect("distances are finite")
                    })
                    .expect("blocked set is non-empty");
                let op = &self.ops[idx];
                let a = self.mapping.physical(op.qubits[0]);
                let b = self.mapping.physical(op.qubits[1]);
                self.insert_path_step(a, b)
            }
        }
    }

    /// The next pending two-qubit gates in program order.
    fn pending_window(&self) -> Vec<(QubitId, QubitId)> {
        let emitted: Vec<bool> = {
            // An op is pending iff its indegree chain hasn't emitted it;
            // reconstruct from the indegree/ready bookkeeping.
            let mut flags = vec![true; self.ops.len()];
            for &(_, idx) in &self.ready {
                flags[idx] = false;
            }
            for idx in 0..self.ops.len() {
                if self.indegree[idx] > 0 {
                    flags[idx] = false;
                }
            }
            flags
        };

        self.ops
            .iter()
            .enumerate()
            .filter(|(idx, op)| !emitted[*idx] && op.is_two_qubit_gate())
            .take(LOOKAHEAD_WINDOW)
            .map(|(_, op)| (op.qubits[0], op.qubits[1]))
            .collect()
    }

    /// Net distance reduction over the window if `(a, b)` were swapped.
    fn swap_score(&self, a: u32, b: u32, window: &[(QubitId, QubitId)]) -> f64 {
        let moved = |q: QubitId| -> u32 {
            let p = self.mapping.physical(q);
            if p == a {
                b
            } else if p == b {
                a
            } else {
                p
            }
        };

        let mut score = 0.0;
        for &(qa, qb) in window {
            let before = self
                .distance(self.mapping.physical(qa), self.mapping.physical(qb))
                .unwrap_or(f64::INFINITY);
            let after = self.distance(moved(qa), moved(qb)).unwrap_or(f64::INFINITY);
            if before.is_finite() && after.is_finite() {
                score += before - after;
            }
        }
        score
    }

    #[inline]
    fn distance(&self, a: u32, b: u32) -> Option<f64> {
        self.distances.distance(self.device, a, b)
    }

    fn into_mapping(self) -> Mapping {
        self.mapping
    }

    fn finish(self, initial_layout: Layout) -> RoutedCircuit {
        let mut permutation = vec![0u32; self.origin.len()];
        for (position, &source) in self.origin.iter().enumerate() {
            permutation[source as usize] = position as u32;
        }
        RoutedCircuit {
            circuit: self.out,
            initial_layout,
            final_layout: self.mapping.to_layout(),
            swap_count: self.swap_count,
            physical_permutation: permutation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_device::{BasisSet, Calibration, GateCalibration, Topology};

    fn line(n: u32) -> Device {
        Device::new("line", "test", Topology::linear(n), BasisSet::universal())
    }

    fn all_strategies() -> [RoutingStrategy; 4] {
        [
            RoutingStrategy::Naive,
            RoutingStrategy::Basic,
            RoutingStrategy::Lookahead,
            RoutingStrategy::Sabre,
        ]
    }

    fn assert_legal(routed: &RoutedCircuit, device: &Device) {
        for op in routed.circuit.ops() {
            if op.is_two_qubit_gate() {
                assert!(
                    device.topology.coupled(op.qubits[0].0, op.qubits[1].0),
                    "{:?} not coupled",
                    op.qubits
                );
            }
        }
    }

    #[test]
    fn test_adjacent_needs_no_swaps() {
        let device = line(3);
        let circuit = Circuit::ghz(2).unwrap();
        for strategy in all_strategies() {
            let routed = route(
                &circuit,
                &device,
                &Layout::trivial(2),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            assert_eq!(routed.swap_count, 0, "{strategy:?}");
            assert_eq!(routed.circuit.num_gates(), 2);
            assert_legal(&routed, &device);
        }
    }

    #[test]
    fn test_distant_cx_inserts_one_swap() {
        let device = line(3);
        let mut circuit = Circuit::new(3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        for strategy in [
            RoutingStrategy::Naive,
            RoutingStrategy::Basic,
            RoutingStrategy::Lookahead,
        ] {
            let routed = route(
                &circuit,
                &device,
                &Layout::trivial(3),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            assert_eq!(routed.swap_count, 1, "{strategy:?}");
            assert_legal(&routed, &device);

            // Exactly two entries of the final layout differ from the
            // initial one.
            let moved = (0..3)
                .filter(|&i| {
                    routed.initial_layout.physical(QubitId(i))
                        != routed.final_layout.physical(QubitId(i))
                })
                .count();
            assert_eq!(moved, 2, "{strategy:?}");
        }
    }

    #[test]
    fn test_sabre_refined_layout_avoids_the_swap() {
        // SABRE's reverse pass is allowed to place q0 next to q2 up front,
        // trading the SWAP for a better initial layout.
        let device = line(3);
        let mut circuit = Circuit::new(3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        let routed = route(
            &circuit,
            &device,
            &Layout::trivial(3),
            RoutingStrategy::Sabre,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(routed.swap_count <= 1);
        assert_legal(&routed, &device);
    }

    #[test]
    fn test_ghz_on_line_no_swaps() {
        let device = line(5);
        let circuit = Circuit::ghz(5).unwrap();
        for strategy in all_strategies() {
            let routed = route(
                &circuit,
                &device,
                &Layout::trivial(5),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            assert_eq!(routed.swap_count, 0, "{strategy:?}");
            assert_legal(&routed, &device);
        }
    }

    #[test]
    fn test_no_two_qubit_gates_no_swaps() {
        let device = line(4);
        let mut circuit = Circuit::new(4, 0);
        for i in 0..4 {
            circuit.h(QubitId(i)).unwrap();
        }
        for strategy in all_strategies() {
            let routed = route(
                &circuit,
                &device,
                &Layout::trivial(4),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            assert_eq!(routed.swap_count, 0);
            assert_eq!(routed.circuit.num_gates(), 4);
        }
    }

    #[test]
    fn test_determinism() {
        let device = line(5);
        let mut circuit = Circuit::new(5, 0);
        circuit.cx(QubitId(0), QubitId(4)).unwrap();
        circuit.cx(QubitId(1), QubitId(3)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        for strategy in all_strategies() {
            let a = route(
                &circuit,
                &device,
                &Layout::trivial(5),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            let b = route(
                &circuit,
                &device,
                &Layout::trivial(5),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            assert_eq!(a.circuit.ops(), b.circuit.ops(), "{strategy:?}");
            assert_eq!(a.swap_count, b.swap_count);
        }
    }

    #[test]
    fn test_disconnected_device() {
        let device = Device::new(
            "split",
            "test",
            Topology::new(4, [(0, 1), (2, 3)]),
            BasisSet::universal(),
        );
        let mut circuit = Circuit::new(4, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        for strategy in all_strategies() {
            let err = route(
                &circuit,
                &device,
                &Layout::trivial(4),
                strategy,
                &CancelToken::new(),
            )
            .unwrap_err();
            assert_eq!(err.tag(), "disconnected_device", "{strategy:?}");
        }
    }

    #[test]
    fn test_cancellation() {
        let device = line(3);
        let circuit = Circuit::ghz(3).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = route(
            &circuit,
            &device,
            &Layout::trivial(3),
            RoutingStrategy::Basic,
            &token,
        )
        .unwrap_err();
        assert_eq!(err.tag(), "cancelled");
    }

    #[test]
    fn test_measurements_routed_to_physical() {
        let device = line(3);
        let mut circuit = Circuit::new(2, 2);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.measure(QubitId(1), vireo_ir::ClbitId(1)).unwrap();

        let mut initial = Layout::new();
        initial.add(QubitId(0), 1);
        initial.add(QubitId(1), 2);

        let routed = route(
            &circuit,
            &device,
            &initial,
            RoutingStrategy::Basic,
            &CancelToken::new(),
        )
        .unwrap();
        let measure = routed
            .circuit
            .ops()
            .iter()
            .find(|op| op.is_measure())
            .unwrap();
        assert_eq!(measure.qubits, vec![QubitId(2)]);
        assert_eq!(measure.clbits, vec![vireo_ir::ClbitId(1)]);
    }

    #[test]
    fn test_lookahead_avoids_obsolete_edge() {
        // Ring of 4; routing 0↔2 can go via 1 or via 3. The (0,1) edge is
        // marked obsolete, so lookahead should swap on the (2,3)/(0,3) side.
        let cal = Calibration::new(
            vec![],
            vec![
                GateCalibration {
                    name: "cx".into(),
                    qubits: vec![0, 1],
                    gate_error: Some(1.0),
                    ..Default::default()
                },
                GateCalibration {
                    name: "cx".into(),
                    qubits: vec![2, 3],
                    gate_error: Some(0.005),
                    ..Default::default()
                },
            ],
        );
        let device = Device::new("ring", "test", Topology::ring(4), BasisSet::universal())
            .with_calibration(cal)
            .unwrap();

        let mut circuit = Circuit::new(4, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        for strategy in [RoutingStrategy::Lookahead, RoutingStrategy::Sabre] {
            let routed = route(
                &circuit,
                &device,
                &Layout::trivial(4),
                strategy,
                &CancelToken::new(),
            )
            .unwrap();
            assert_legal(&routed, &device);
            let swap = routed
                .circuit
                .ops()
                .iter()
                .find(|op| op.kind == GateKind::Swap)
                .expect("one swap inserted");
            assert_ne!(
                (swap.qubits[0].0, swap.qubits[1].0),
                (0, 1),
                "{strategy:?} used the obsolete edge"
            );
        }
    }

    #[test]
    fn test_sabre_refines_initial_layout() {
        // CX(0, 3) on a 4-line from the trivial layout: SABRE's reverse
        // pass should pull the pair together so fewer (or equal) swaps are
        // emitted compared to basic.
        let device = line(4);
        let mut circuit = Circuit::new(4, 0);
        circuit.cx(QubitId(0), QubitId(3)).unwrap();
        circuit.cx(QubitId(0), QubitId(3)).unwrap();

        let basic = route(
            &circuit,
            &device,
            &Layout::trivial(4),
            RoutingStrategy::Basic,
            &CancelToken::new(),
        )
        .unwrap();
        let sabre = route(
            &circuit,
            &device,
            &Layout::trivial(4),
            RoutingStrategy::Sabre,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(sabre.swap_count <= basic.swap_count);
        assert_legal(&sabre, &device);
    }
}
