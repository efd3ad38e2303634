//! Calibration-weighted cost estimation.
//!
//! Prices a routed circuit against the device's calibration snapshot. All
//! fidelity products are accumulated in log space and exponentiated once at
//! the end, so deep circuits cannot underflow to zero. Missing calibration
//! values are never treated as zero: each formula states what "missing"
//! means, and the count of uncalibrated gates is reported alongside a
//! `CalibrationIncomplete` warning.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use vireo_device::{Device, GateQuality};

use crate::router::RoutedCircuit;

/// Per-qubit error detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitCostDetail {
    /// Total time the qubit spends in emitted operations, seconds.
    pub active_time: f64,
    /// `1 − exp(−t/T1)`, or 0 when T1 is unknown.
    pub t1_error: f64,
    /// `1 − exp(−t/T2)`, or 0 when T2 is unknown.
    pub t2_error: f64,
    /// `1 − exp(−t·(1/T1 + 1/T2))`, missing terms contributing 0.
    pub decoherence_error: f64,
    /// Readout error, `None` when the qubit is not calibrated.
    pub readout_error: Option<f64>,
}

/// An informational warning attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum Warning {
    /// Some emitted gates have no usable calibration entry.
    CalibrationIncomplete {
        /// Gates with no entry at all.
        missing_gates: usize,
        /// Gates whose entry is marked non-operational (`gate_error = 1.0`).
        obsolete_gates: usize,
    },
}

impl Warning {
    /// Machine-readable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Warning::CalibrationIncomplete { .. } => "calibration_incomplete",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CalibrationIncomplete {
                missing_gates,
                obsolete_gates,
            } => write!(
                f,
                "calibration incomplete: {missing_gates} gates uncalibrated, \
                 {obsolete_gates} marked non-operational"
            ),
        }
    }
}

/// Quantitative estimate for a routed circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostMetrics {
    /// Product of per-gate fidelities, `Π (1 − gate_error)`.
    pub gate_fidelity: f64,
    /// Additive gate error, `Σ gate_error` (diverges from `1 − gate_fidelity`
    /// on large circuits; both are reported).
    pub overall_gate_error: f64,
    /// Product of per-qubit decoherence survival probabilities.
    pub decoherence_fidelity: f64,
    /// Arithmetic mean of per-qubit decoherence error over active qubits.
    pub avg_decoherence_error: f64,
    /// Product of `1 − readout_error` over measured qubits.
    pub readout_fidelity: f64,
    /// Sum of readout errors over measured qubits.
    pub overall_readout_error: f64,
    /// Mean readout error over measured qubits with a calibrated value.
    pub avg_readout_error: f64,
    /// Total circuit fidelity `F = F_gate · F_ro · F_dec`.
    pub fidelity: f64,
    /// `1 − F`.
    pub effective_error: f64,
    /// Critical-path execution time through the emitted sequence, seconds.
    pub execution_time: f64,
    /// Emitted gates with no calibration entry.
    pub missing_calibration_gates: usize,
    /// Emitted gates whose entry is non-operational.
    pub obsolete_calibration_gates: usize,
    /// Per-qubit detail, keyed by physical qubit.
    pub per_qubit: BTreeMap<u32, QubitCostDetail>,
    /// Informational warnings.
    pub warnings: Vec<Warning>,
}

/// Estimate with the default fallback (uncalibrated gates contribute no
/// error and are only counted).
pub fn estimate(routed: &RoutedCircuit, device: &Device) -> CostMetrics {
    estimate_with(routed, device, 0.0)
}

/// Estimate with a configured fallback error for uncalibrated gates.
pub fn estimate_with(routed: &RoutedCircuit, device: &Device, fallback_error: f64) -> CostMetrics {
    let calibration = device.calibration.as_ref();
    let circuit = &routed.circuit;

    let mut log_gate_fidelity = 0.0;
    let mut overall_gate_error = 0.0;
    let mut missing = 0usize;
    let mut obsolete = 0usize;

    let mut active_time: BTreeMap<u32, f64> = BTreeMap::new();

    // Wire-ready times for the critical path.
    let mut qubit_ready = vec![0.0f64; circuit.num_qubits() as usize];
    let mut clbit_ready = vec![0.0f64; circuit.num_clbits() as usize];
    let mut execution_time = 0.0f64;

    for op in circuit.ops() {
        let tuple: Vec<u32> = op.qubits.iter().map(|q| q.0).collect();
        let duration = calibration
            .and_then(|c| c.gate_duration(op.name(), &tuple))
            .unwrap_or(0.0);

        if !op.is_barrier() && !op.is_measure() {
            match calibration
                .map(|c| c.gate_quality(op.name(), &tuple))
                .unwrap_or(GateQuality::Missing)
            {
                GateQuality::Calibrated { error } => {
                    log_gate_fidelity += (1.0 - error).ln();
                    overall_gate_error += error;
                }
                GateQuality::Obsolete => obsolete += 1,
                GateQuality::Missing => {
                    missing += 1;
                    if fallback_error > 0.0 {
                        log_gate_fidelity += (1.0 - fallback_error).ln();
                        overall_gate_error += fallback_error;
                    }
                }
            }
        }

        for &p in &tuple {
            *active_time.entry(p).or_default() += duration;
        }

        // Critical path: the op starts when all its wires are free.
        let start = op
            .qubits
            .iter()
            .map(|q| qubit_ready[q.index()])
            .chain(op.clbits.iter().map(|c| clbit_ready[c.index()]))
            .fold(0.0f64, f64::max);
        let finish = start + duration;
        for q in &op.qubits {
            qubit_ready[q.index()] = finish;
        }
        for c in &op.clbits {
            clbit_ready[c.index()] = finish;
        }
        execution_time = execution_time.max(finish);
    }

    // Decoherence per active qubit.
    let mut log_dec_fidelity = 0.0;
    let mut dec_error_sum = 0.0;
    let mut per_qubit: BTreeMap<u32, QubitCostDetail> = BTreeMap::new();

    for (&p, &t) in &active_time {
        let mut detail = QubitCostDetail {
            active_time: t,
            ..Default::default()
        };
        if let Some(q) = calibration.and_then(|c| c.qubit(p)) {
            let mut rate = 0.0;
            if let Some(t1) = q.t1 {
                detail.t1_error = 1.0 - (-t / t1).exp();
                rate += 1.0 / t1;
            }
            if let Some(t2) = q.t2 {
                detail.t2_error = 1.0 - (-t / t2).exp();
                rate += 1.0 / t2;
            }
            detail.decoherence_error = 1.0 - (-t * rate).exp();
            // ln(1 − e_dec) = −t·rate, exactly.
            log_dec_fidelity -= t * rate;
            detail.readout_error = q.readout_error;
        }
        dec_error_sum += detail.decoherence_error;
        per_qubit.insert(p, detail);
    }

    let active_count = active_time.len();
    let avg_decoherence_error = if active_count > 0 {
        dec_error_sum / active_count as f64
    } else {
        0.0
    };

    // Readout over measured qubits.
    let measured = circuit.qubits_measured();
    let mut log_ro_fidelity = 0.0;
    let mut overall_readout_error = 0.0;
    let mut readout_values = 0usize;
    for q in &measured {
        if let Some(r) = calibration.and_then(|c| c.readout_error(q.0)) {
            log_ro_fidelity += (1.0 - r).ln();
            overall_readout_error += r;
            readout_values += 1;
        }
    }
    let avg_readout_error = if readout_values > 0 {
        overall_readout_error / readout_values as f64
    } else {
        0.0
    };

    let gate_fidelity = log_gate_fidelity.exp();
    let decoherence_fidelity = log_dec_fidelity.exp();
    let readout_fidelity = log_ro_fidelity.exp();
    let fidelity = (log_gate_fidelity + log_dec_fidelity + log_ro_fidelity)
        .exp()
        .clamp(f64::MIN_POSITIVE, 1.0);

    let mut warnings = vec![];
    if missing + obsolete > 0 {
        warnings.push(Warning::CalibrationIncomplete {
            missing_gates: missing,
            obsolete_gates: obsolete,
        });
    }

    CostMetrics {
        gate_fidelity,
        overall_gate_error,
        decoherence_fidelity,
        avg_decoherence_error,
        readout_fidelity,
        overall_readout_error,
        avg_readout_error,
        fidelity,
        effective_error: 1.0 - fidelity,
        execution_time,
        missing_calibration_gates: missing,
        obsolete_calibration_gates: obsolete,
        per_qubit,
        warnings,
    }
}
