//! Vireo Circuit Intermediate Representation
//!
//! Core data structures for representing quantum circuits in Vireo. A
//! [`Circuit`] is an immutable value: a qubit count, a classical bit count,
//! and an ordered sequence of [`GateOp`]s. Every transformation in the
//! compiler stack produces a new `Circuit`.
//!
//! The derived [`CircuitDag`] view exposes the data-dependency structure of
//! a circuit (nodes are operations, edges are qubit/clbit wires) and is the
//! representation the normalizer and router actually work on.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use vireo_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new(2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure(QubitId(0), vireo_ir::ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), vireo_ir::ClbitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3); // H, CX, parallel measures
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod op;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::GateKind;
pub use op::GateOp;
pub use qubit::{ClbitId, QubitId};
