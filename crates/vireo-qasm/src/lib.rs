//! Assembly-format surface for Vireo circuits.
//!
//! Parses the textual assembly-like circuit format (an OpenQASM 2 subset)
//! and the JSON alternative into [`vireo_ir::Circuit`], and emits circuits
//! back to text.
//!
//! # Example
//!
//! ```rust
//! let source = r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0], q[1];
//!     measure q[0] -> c[0];
//!     measure q[1] -> c[1];
//! "#;
//!
//! let circuit = vireo_qasm::parse(source).unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//!
//! let text = vireo_qasm::emit(&circuit);
//! assert!(text.contains("cx q[0], q[1];"));
//! ```

pub mod emitter;
pub mod error;
pub mod json;
pub mod lexer;
pub mod parser;

pub use emitter::emit;
pub use error::{ParseError, ParseResult};
pub use json::parse_json;
pub use parser::parse;
