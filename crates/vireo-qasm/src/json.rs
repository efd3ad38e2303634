//! JSON circuit input.
//!
//! Accepts the alternative wire form:
//! `{ "num_qubits": 2, "num_clbits": 2, "operations": [{ "kind": "h",
//! "qubits": [0] }, ...] }` with the same validation as the text parser.

use serde::Deserialize;

use vireo_ir::{Circuit, ClbitId, GateKind, GateOp, QubitId};

use crate::error::{ParseError, ParseResult};

#[derive(Deserialize)]
struct CircuitJson {
    num_qubits: u32,
    #[serde(default)]
    num_clbits: u32,
    operations: Vec<OpJson>,
}

#[derive(Deserialize)]
struct OpJson {
    kind: String,
    qubits: Vec<u32>,
    #[serde(default)]
    clbits: Vec<u32>,
    #[serde(default)]
    params: Vec<f64>,
}

/// Parse a JSON circuit document.
pub fn parse_json(source: &str) -> ParseResult<Circuit> {
    let doc: CircuitJson =
        serde_json::from_str(source).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let mut ops = vec![];
    for op in doc.operations {
        let kind = GateKind::from_name(&op.kind)
            .ok_or_else(|| ParseError::UnknownGate(op.kind.clone()))?;

        if let Some(arity) = kind.num_qubits() {
            if op.qubits.len() != arity as usize {
                return Err(ParseError::WrongQubitCount {
                    gate: op.kind.clone(),
                    expected: arity as usize,
                    got: op.qubits.len(),
                });
            }
        }
        if op.params.len() != kind.num_params() {
            return Err(ParseError::WrongParameterCount {
                gate: op.kind.clone(),
                expected: kind.num_params(),
                got: op.params.len(),
            });
        }

        ops.push(GateOp {
            kind,
            qubits: op.qubits.into_iter().map(QubitId).collect(),
            clbits: op.clbits.into_iter().map(ClbitId).collect(),
            params: op.params,
        });
    }

    Ok(Circuit::from_ops(doc.num_qubits, doc.num_clbits, ops)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_bell() {
        let circuit = parse_json(
            r#"{
                "num_qubits": 2,
                "num_clbits": 2,
                "operations": [
                    { "kind": "h", "qubits": [0] },
                    { "kind": "cx", "qubits": [0, 1] },
                    { "kind": "measure", "qubits": [0], "clbits": [0] },
                    { "kind": "measure", "qubits": [1], "clbits": [1] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(circuit.num_gates(), 4);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_parse_json_params() {
        let circuit = parse_json(
            r#"{
                "num_qubits": 1,
                "operations": [{ "kind": "rz", "qubits": [0], "params": [1.5707] }]
            }"#,
        )
        .unwrap();
        assert_eq!(circuit.ops()[0].kind, GateKind::Rz);
    }

    #[test]
    fn test_unknown_kind() {
        let err = parse_json(
            r#"{ "num_qubits": 1, "operations": [{ "kind": "foo", "qubits": [0] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnknownGate(name) if name == "foo"));
    }

    #[test]
    fn test_out_of_range_qubit() {
        let err = parse_json(
            r#"{ "num_qubits": 1, "operations": [{ "kind": "h", "qubits": [3] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Circuit(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_json("{ not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }
}
