//! Vireo Transpilation Stack
//!
//! Transforms a circuit into one a physical device can execute, and prices
//! the result:
//!
//! 1. **Normalization** ([`normalize`]): rewrite every operation into the
//!    device's basis gate set, fusing adjacent single-qubit rotations and
//!    dropping identities.
//! 2. **Layout** ([`plan_layout`]): choose an initial logical→physical
//!    embedding (trivial, dense sub-graph, or calibration-weighted).
//! 3. **Routing** ([`route`]): insert SWAPs so every two-qubit gate acts on
//!    a coupled pair (`naive`, `basic`, `lookahead`, or `sabre`).
//! 4. **Cost estimation** ([`estimate`]): fidelity, error decomposition and
//!    critical-path execution time from the calibration snapshot.
//!
//! [`transpile`] glues the stages together and returns a
//! [`TranspilationResult`]. Each transpilation is a pure, synchronous,
//! single-threaded function of its inputs; concurrent calls share nothing
//! but a read-only [`vireo_device::Device`]. A caller-provided
//! [`CancelToken`] is observed between stages and on every emitted
//! operation inside the router loop.
//!
//! # Example
//!
//! ```rust
//! use vireo_device::{BasisSet, Device, Topology};
//! use vireo_ir::Circuit;
//! use vireo_transpile::{transpile, TranspileOptions};
//!
//! let device = Device::new(
//!     "line-3",
//!     "example",
//!     Topology::linear(3),
//!     BasisSet::from_names(["h", "cx"]).unwrap(),
//! );
//!
//! let circuit = Circuit::ghz(2).unwrap();
//! let result = transpile(&circuit, &device, &TranspileOptions::default()).unwrap();
//! assert_eq!(result.structural.swap_count, 0);
//! ```

pub mod cancel;
pub mod cost;
pub mod error;
pub mod layout;
pub mod library;
pub mod normalize;
pub mod pipeline;
pub mod router;
pub mod unitary;

pub use cancel::CancelToken;
pub use cost::{estimate, estimate_with, CostMetrics, QubitCostDetail, Warning};
pub use error::{TranspileError, TranspileResult};
pub use layout::{plan_layout, Layout, LayoutStrategy};
pub use normalize::normalize;
pub use pipeline::{transpile, StructuralMetrics, TranspilationResult, TranspileOptions};
pub use router::{route, RoutedCircuit, RoutingStrategy};
