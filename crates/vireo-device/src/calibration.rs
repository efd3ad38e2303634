//! Typed calibration records with explicit optionals.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, DeviceResult};

/// Calibration data for one physical qubit. Every field is optional; a
/// vendor that does not report a value leaves it `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitCalibration {
    /// Physical qubit index.
    pub qubit: u32,
    /// Relaxation time constant, seconds.
    #[serde(default)]
    pub t1: Option<f64>,
    /// Dephasing time constant, seconds.
    #[serde(default)]
    pub t2: Option<f64>,
    /// Transition frequency, Hz.
    #[serde(default)]
    pub frequency: Option<f64>,
    /// Readout (measurement) error probability.
    #[serde(default)]
    pub readout_error: Option<f64>,
}

/// Calibration data for one gate on a specific qubit tuple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateCalibration {
    /// Gate name, lowercase.
    pub name: String,
    /// Physical qubits the entry applies to.
    pub qubits: Vec<u32>,
    /// Error probability. Exactly `1.0` marks a non-operational entry.
    #[serde(default)]
    pub gate_error: Option<f64>,
    /// Gate duration, seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Vendor-specific extra parameters.
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub parameters: FxHashMap<String, f64>,
}

/// Classification of a gate calibration entry for cost purposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateQuality {
    /// Entry present with a usable error value.
    Calibrated {
        /// The error probability, `< 1.0`.
        error: f64,
    },
    /// Entry present but marked non-operational (`gate_error == 1.0`).
    Obsolete,
    /// No entry, or an entry without an error value.
    Missing,
}

/// Device calibration: per-qubit and per-gate maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CalibrationWire", into = "CalibrationWire")]
pub struct Calibration {
    qubits: Vec<QubitCalibration>,
    gates: Vec<GateCalibration>,
    qubit_index: FxHashMap<u32, usize>,
    gate_index: FxHashMap<(String, Vec<u32>), usize>,
}

#[derive(Serialize, Deserialize)]
struct CalibrationWire {
    #[serde(default)]
    qubits: Vec<QubitCalibration>,
    #[serde(default)]
    gates: Vec<GateCalibration>,
}

impl From<CalibrationWire> for Calibration {
    fn from(wire: CalibrationWire) -> Self {
        Calibration::new(wire.qubits, wire.gates)
    }
}

impl From<Calibration> for CalibrationWire {
    fn from(cal: Calibration) -> Self {
        CalibrationWire {
            qubits: cal.qubits,
            gates: cal.gates,
        }
    }
}

/// Lookup key: lowercase name plus the sorted qubit tuple, so directionless
/// entries match however the router orders a pair.
fn gate_key(name: &str, qubits: &[u32]) -> (String, Vec<u32>) {
    let mut sorted = qubits.to_vec();
    sorted.sort_unstable();
    (name.to_ascii_lowercase(), sorted)
}

impl Calibration {
    /// Build the lookup maps from record lists.
    pub fn new(qubits: Vec<QubitCalibration>, gates: Vec<GateCalibration>) -> Self {
        let qubit_index = qubits.iter().enumerate().map(|(i, q)| (q.qubit, i)).collect();
        let gate_index = gates
            .iter()
            .enumerate()
            .map(|(i, g)| (gate_key(&g.name, &g.qubits), i))
            .collect();
        Self {
            qubits,
            gates,
            qubit_index,
            gate_index,
        }
    }

    /// Validate value ranges: `t1, t2 > 0`, `0 ≤ readout_error ≤ 1`,
    /// `0 ≤ gate_error ≤ 1`, `duration ≥ 0`.
    pub fn validate(&self) -> DeviceResult<()> {
        for q in &self.qubits {
            if q.t1.is_some_and(|v| v <= 0.0) || q.t2.is_some_and(|v| v <= 0.0) {
                return Err(DeviceError::InvalidCalibration {
                    what: format!("non-positive T1/T2 on qubit {}", q.qubit),
                });
            }
            if q.readout_error.is_some_and(|v| !(0.0..=1.0).contains(&v)) {
                return Err(DeviceError::InvalidCalibration {
                    what: format!("readout_error out of [0, 1] on qubit {}", q.qubit),
                });
            }
        }
        for g in &self.gates {
            if g.gate_error.is_some_and(|v| !(0.0..=1.0).contains(&v)) {
                return Err(DeviceError::InvalidCalibration {
                    what: format!("gate_error out of [0, 1] for {} {:?}", g.name, g.qubits),
                });
            }
            if g.duration.is_some_and(|v| v < 0.0) {
                return Err(DeviceError::InvalidCalibration {
                    what: format!("negative duration for {} {:?}", g.name, g.qubits),
                });
            }
        }
        Ok(())
    }

    /// Per-qubit record, if present.
    pub fn qubit(&self, qubit: u32) -> Option<&QubitCalibration> {
        self.qubit_index.get(&qubit).map(|&i| &self.qubits[i])
    }

    /// Per-gate record for `(name, qubit tuple)`, if present.
    pub fn gate(&self, name: &str, qubits: &[u32]) -> Option<&GateCalibration> {
        self.gate_index
            .get(&gate_key(name, qubits))
            .map(|&i| &self.gates[i])
    }

    /// Classify a gate entry for cost purposes.
    pub fn gate_quality(&self, name: &str, qubits: &[u32]) -> GateQuality {
        match self.gate(name, qubits).and_then(|g| g.gate_error) {
            Some(e) if e >= 1.0 => GateQuality::Obsolete,
            Some(e) => GateQuality::Calibrated { error: e },
            None => GateQuality::Missing,
        }
    }

    /// Duration of a gate entry, `None` when unknown.
    pub fn gate_duration(&self, name: &str, qubits: &[u32]) -> Option<f64> {
        self.gate(name, qubits).and_then(|g| g.duration)
    }

    /// Readout error of a qubit, `None` when unknown.
    pub fn readout_error(&self, qubit: u32) -> Option<f64> {
        self.qubit(qubit).and_then(|q| q.readout_error)
    }

    /// Mean duration over all calibrated gate entries, `None` when none
    /// carry a duration.
    pub fn mean_gate_duration(&self) -> Option<f64> {
        let durations: Vec<f64> = self.gates.iter().filter_map(|g| g.duration).collect();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    }

    /// All per-qubit records.
    pub fn qubits(&self) -> &[QubitCalibration] {
        &self.qubits
    }

    /// All per-gate records.
    pub fn gates(&self) -> &[GateCalibration] {
        &self.gates
    }
}
