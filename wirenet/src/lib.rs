//! WireNet - orthogonal wire routing and net topology for schematic editors
//!
//! Keeps Manhattan wire polylines consistent with component pins under
//! incremental edits, and derives electrical nets from the geometry.
//!
//! # Quick Start
//!
//! ```no_run
//! use wirenet::{load_model, EngineOptions, WireNetCore};
//! use std::path::Path;
//!
//! let mut model = load_model(Path::new("circuit.json")).unwrap();
//! let options = EngineOptions::default();
//! WireNetCore::normalize(&mut model, &options);
//!
//! for net in WireNetCore::nets(&model) {
//!     println!("{}: {} pins", net.node_label(), net.pins.len());
//! }
//! ```
//!
//! # Features
//!
//! - **Normalization**: orthogonal repair, obstacle detours, overlap and
//!   junction splitting, two-way junction merging
//! - **Nets**: geometric connectivity with `NET` label unions and ground queries
//! - **Probing**: pointer-to-node and pointer-to-component resolution
//! - **Guarded transforms**: simplify and regrid only when nets are unchanged

pub mod core;
pub mod disjoint_set;
pub mod edit;
pub mod model;
pub mod netlist;
pub mod obstacles;
pub mod probe;
pub mod routing;
pub mod topology;

// Re-export main types
pub use crate::core::{
    load_model, save_model, CheckIssue, CheckReport, CheckStats, EngineOptions, Severity,
    TransformError, WireNetCore, WireNetError,
};
pub use model::{Bounds, Component, ComponentKind, Model, Pin, Point, PointKey, Wire};
pub use netlist::{build_nets, ground_status, topology_signature, GroundStatus, Net, PinRef};
pub use obstacles::{build_obstacles, build_pass_through_obstacles, Obstacle, ObstacleKind};
pub use probe::{
    pick_probe_target, resolve_probe_node_point, resolve_probe_targets, ProbeStrategy,
    ProbeTarget, ProbeTargets,
};
pub use routing::{ensure_orthogonal, optimize, reroute, simplify, EndpointAxisHints};
pub use topology::{
    merge_two_way_junctions, normalize_all, split_at_junctions, split_at_overlaps,
    NormalizeReport,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        EngineOptions, Model, Net, NormalizeReport, Point, TransformError, Wire, WireNetCore,
        WireNetError,
    };
}
