//! DAG view of a circuit.
//!
//! Nodes are either per-wire input/output markers or operations; edges carry
//! the wire (qubit or classical bit) they represent. Program order is a
//! valid topological order by construction, and operation nodes are created
//! in program order, so iterating operation nodes by ascending index is both
//! topological and deterministic.

use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::op::GateOp;
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node.
    Op(GateOp),
}

impl DagNode {
    /// The operation, if this is an operation node.
    pub fn op(&self) -> Option<&GateOp> {
        match self {
            DagNode::Op(op) => Some(op),
            _ => None,
        }
    }
}

/// An edge in the circuit DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// DAG-based circuit representation.
pub struct CircuitDag {
    graph: DiGraph<DagNode, DagEdge, u32>,
    qubit_outputs: FxHashMap<QubitId, NodeIndex>,
    clbit_outputs: FxHashMap<ClbitId, NodeIndex>,
    num_qubits: u32,
    num_clbits: u32,
}

impl CircuitDag {
    /// Create an empty DAG with wires for every register index.
    pub fn with_size(num_qubits: u32, num_clbits: u32) -> Self {
        let mut dag = Self {
            graph: DiGraph::default(),
            qubit_outputs: FxHashMap::default(),
            clbit_outputs: FxHashMap::default(),
            num_qubits,
            num_clbits,
        };
        for i in 0..num_qubits {
            dag.add_qubit_wire(QubitId(i));
        }
        for i in 0..num_clbits {
            dag.add_clbit_wire(ClbitId(i));
        }
        dag
    }

    /// Build the DAG from a circuit in linear time.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut dag = Self::with_size(circuit.num_qubits(), circuit.num_clbits());
        for op in circuit.ops() {
            // Ops in a constructed Circuit already passed validation.
            dag.apply(op.clone())
                .expect("circuit op validated at construction");
        }
        dag
    }

    fn add_qubit_wire(&mut self, qubit: QubitId) {
        let wire = WireId::Qubit(qubit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.qubit_outputs.insert(qubit, out_node);
    }

    fn add_clbit_wire(&mut self, clbit: ClbitId) {
        let wire = WireId::Clbit(clbit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.clbit_outputs.insert(clbit, out_node);
    }

    /// Append an operation at the end of its wires.
    pub fn apply(&mut self, op: GateOp) -> IrResult<NodeIndex> {
        op.validate()?;

        let wires: Vec<WireId> = op
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(op.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();

        for wire in &wires {
            let present = match wire {
                WireId::Qubit(q) => self.qubit_outputs.contains_key(q),
                WireId::Clbit(c) => self.clbit_outputs.contains_key(c),
            };
            if !present {
                return Err(IrError::InvalidDag(format!("unknown wire {wire:?}")));
            }
        }

        let op_node = self.graph.add_node(DagNode::Op(op));

        for wire in wires {
            let out_node = match wire {
                WireId::Qubit(q) => self.qubit_outputs[&q],
                WireId::Clbit(c) => self.clbit_outputs[&c],
            };

            // Splice the op in front of the wire's output marker.
            let incoming: Option<(NodeIndex, _)> = self
                .graph
                .edges_directed(out_node, Direction::Incoming)
                .find(|e| e.weight().wire == wire)
                .map(|e| (e.source(), e.id()));

            if let Some((prev, edge_id)) = incoming {
                self.graph.remove_edge(edge_id);
                self.graph.add_edge(prev, op_node, DagEdge { wire });
                self.graph.add_edge(op_node, out_node, DagEdge { wire });
            }
        }

        Ok(op_node)
    }

    /// Operations in topological (program) order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &GateOp)> {
        // Op nodes are created in program order and never removed, so
        // ascending index order is a deterministic topological order.
        self.graph.node_indices().filter_map(|idx| match &self.graph[idx] {
            DagNode::Op(op) => Some((idx, op)),
            _ => None,
        })
    }

    /// The operation at a node.
    pub fn op(&self, node: NodeIndex) -> Option<&GateOp> {
        self.graph.node_weight(node).and_then(DagNode::op)
    }

    /// Operation predecessors of a node (transitively through wires only one
    /// step back).
    pub fn predecessors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut preds: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .filter(|&n| matches!(self.graph[n], DagNode::Op(_)))
            .collect();
        preds.sort();
        preds.dedup();
        preds
    }

    /// Operation successors of a node.
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut succs: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|&n| matches!(self.graph[n], DagNode::Op(_)))
            .collect();
        succs.sort();
        succs.dedup();
        succs
    }

    /// Two-qubit operations whose dependencies are all satisfied (no
    /// operation predecessors).
    pub fn two_qubit_front_layer(&self) -> Vec<NodeIndex> {
        self.topological_ops()
            .filter(|(idx, op)| op.is_two_qubit_gate() && self.predecessors(*idx).is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Number of operations.
    pub fn num_ops(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&idx| matches!(self.graph[idx], DagNode::Op(_)))
            .count()
    }

    /// Number of qubit wires.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of classical wires.
    #[inline]
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Longest path through the DAG, counting operation nodes (barriers
    /// excluded, matching [`Circuit::depth`]).
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut max_depth = 0usize;

        // Ascending node index is topological: In/Out markers precede the
        // ops that reach them only via earlier-created op nodes.
        let order = petgraph::algo::toposort(&self.graph, None)
            .expect("circuit DAG is acyclic by construction");

        for node in order {
            let pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);

            let node_depth = match &self.graph[node] {
                DagNode::Op(op) if !op.is_barrier() => pred_depth + 1,
                _ => pred_depth,
            };
            max_depth = max_depth.max(node_depth);
            depths.insert(node, node_depth);
        }

        max_depth
    }

    /// Replace one operation node with a sequence, returning a new DAG.
    ///
    /// The replacement lands at the original node's position in program
    /// order: the DAG is rebuilt rather than spliced, which keeps gate
    /// ordering correct for replacements in the middle of a wire.
    pub fn substitute(
        &self,
        node: NodeIndex,
        replacement: impl IntoIterator<Item = GateOp>,
    ) -> IrResult<CircuitDag> {
        if self.op(node).is_none() {
            return Err(IrError::InvalidNode);
        }

        let replacement: Vec<GateOp> = replacement.into_iter().collect();
        let mut new_dag = CircuitDag::with_size(self.num_qubits, self.num_clbits);
        for (idx, op) in self.topological_ops() {
            if idx == node {
                for rep in &replacement {
                    new_dag.apply(rep.clone())?;
                }
            } else {
                new_dag.apply(op.clone())?;
            }
        }
        Ok(new_dag)
    }

    /// Rebuild a circuit from this DAG in topological order.
    pub fn to_circuit(&self) -> Circuit {
        let mut circuit = Circuit::new(self.num_qubits, self.num_clbits);
        for (_, op) in self.topological_ops() {
            circuit
                .push_unchecked(op.clone())
                .expect("DAG ops validated on apply");
        }
        circuit
    }

    /// The underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateKind;

    fn bell_dag() -> CircuitDag {
        let mut circuit = Circuit::new(2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.dag()
    }

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::with_size(2, 1);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth(), 0);
    }

    #[test]
    fn test_bell_structure() {
        let dag = bell_dag();
        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 2);

        let ops: Vec<_> = dag.topological_ops().collect();
        assert_eq!(ops[0].1.kind, GateKind::H);
        assert_eq!(ops[1].1.kind, GateKind::CX);

        let h_node = ops[0].0;
        let cx_node = ops[1].0;
        assert!(dag.predecessors(h_node).is_empty());
        assert_eq!(dag.predecessors(cx_node), vec![h_node]);
        assert_eq!(dag.successors(h_node), vec![cx_node]);
    }

    #[test]
    fn test_front_layer() {
        let mut circuit = Circuit::new(4, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(2), QubitId(3)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        let dag = circuit.dag();

        let front = dag.two_qubit_front_layer();
        assert_eq!(front.len(), 2);
        let kinds: Vec<_> = front.iter().map(|&n| dag.op(n).unwrap().qubits[0]).collect();
        assert_eq!(kinds, vec![QubitId(0), QubitId(2)]);
    }

    #[test]
    fn test_front_layer_blocked_by_1q() {
        let mut circuit = Circuit::new(2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let dag = circuit.dag();
        // CX depends on H, so the 2q front layer is empty.
        assert!(dag.two_qubit_front_layer().is_empty());
    }

    #[test]
    fn test_substitute_preserves_order() {
        let dag = bell_dag();
        let h_node = dag.topological_ops().next().unwrap().0;

        // Replace H with Rz(pi/2), SX, Rz(pi/2).
        let rep = vec![
            GateOp::parametric(GateKind::Rz, [QubitId(0)], [1.0]),
            GateOp::gate(GateKind::SX, [QubitId(0)]),
            GateOp::parametric(GateKind::Rz, [QubitId(0)], [1.0]),
        ];
        let new_dag = dag.substitute(h_node, rep).unwrap();
        assert_eq!(new_dag.num_ops(), 4);

        let kinds: Vec<_> = new_dag.topological_ops().map(|(_, op)| op.kind).collect();
        assert_eq!(
            kinds,
            vec![GateKind::Rz, GateKind::SX, GateKind::Rz, GateKind::CX]
        );
    }

    #[test]
    fn test_to_circuit_roundtrip() {
        let mut circuit = Circuit::new(3, 1);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.measure(QubitId(2), ClbitId(0)).unwrap();

        let rebuilt = circuit.dag().to_circuit();
        assert_eq!(rebuilt.ops(), circuit.ops());
    }

    #[test]
    fn test_parallel_depth() {
        let mut circuit = Circuit::new(2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.h(QubitId(1)).unwrap();
        assert_eq!(circuit.dag().depth(), 1);
    }
}
