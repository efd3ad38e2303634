//! Emit a circuit back to the assembly format.

use std::fmt::Write;

use vireo_ir::{Circuit, GateKind};

/// Render a circuit as assembly text with flat `q`/`c` registers.
pub fn emit(circuit: &Circuit) -> String {
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");

    if circuit.num_qubits() > 0 {
        let _ = writeln!(out, "qreg q[{}];", circuit.num_qubits());
    }
    if circuit.num_clbits() > 0 {
        let _ = writeln!(out, "creg c[{}];", circuit.num_clbits());
    }

    for op in circuit.ops() {
        match op.kind {
            GateKind::Measure => {
                let _ = writeln!(out, "measure q[{}] -> c[{}];", op.qubits[0].0, op.clbits[0].0);
            }
            GateKind::Barrier => {
                let _ = writeln!(out, "barrier {};", operand_list(&op.qubits));
            }
            kind => {
                if op.params.is_empty() {
                    let _ = writeln!(out, "{} {};", kind.name(), operand_list(&op.qubits));
                } else {
                    let params = op
                        .params
                        .iter()
                        .map(|p| format!("{p}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let _ = writeln!(
                        out,
                        "{}({}) {};",
                        kind.name(),
                        params,
                        operand_list(&op.qubits)
                    );
                }
            }
        }
    }

    out
}

fn operand_list(qubits: &[vireo_ir::QubitId]) -> String {
    qubits
        .iter()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ")
}
