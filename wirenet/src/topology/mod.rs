//! Topology normalizer
//!
//! Brings a wire set back to canonical form after edits: orthogonal
//! segments, no redundant points, overlaps split into shared vertices,
//! and exactly one wire per non-branching run between anchors. Net
//! membership of every pin is preserved.

pub mod index;
pub mod merge;
pub mod split;

pub use index::{
    find_contacts, materialize_contacts, overlap_boundaries, Contact, PointIndex, SegmentBuckets,
    SegmentRef,
};
pub use merge::{merge_two_way_junctions, MAX_MERGE_ITERATIONS};
pub use split::{split_at_junctions, split_at_overlaps};

use serde::Serialize;

use crate::core::EngineOptions;
use crate::model::{Model, Point, PointKey, Wire};
use crate::netlist::NetlistBuilder;
use crate::obstacles::{build_obstacles, build_pass_through_obstacles};
use crate::routing::optimize::optimize_avoiding;
use crate::routing::{dedupe, ensure_orthogonal_avoiding, simplify, EndpointAxisHints, Keepout, Router};

/// Upper bound on normalization rounds. A round that leaves the wires
/// unchanged ends the loop early.
pub const MAX_NORMALIZE_ROUNDS: usize = 4;

/// What a normalization run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    pub rounds: usize,
    pub converged: bool,
    pub contacts_materialized: usize,
    pub wires_before: usize,
    pub wires_after: usize,
}

/// Electrical pin positions, one entry per pin.
pub fn pin_points(model: &Model) -> Vec<PointKey> {
    model
        .electrical_pins()
        .map(|(_, pin)| pin.position().key())
        .collect()
}

/// Normalize every wire of `model` in place.
pub fn normalize_all(model: &mut Model, options: &EngineOptions) -> NormalizeReport {
    normalize_with_rounds(model, options, MAX_NORMALIZE_ROUNDS)
}

pub(crate) fn normalize_with_rounds(
    model: &mut Model,
    options: &EngineOptions,
    max_rounds: usize,
) -> NormalizeReport {
    let mut report = NormalizeReport {
        wires_before: model.wires.len(),
        ..Default::default()
    };
    for _ in 0..max_rounds {
        let before = model.wires.clone();
        normalize_round(model, options, &mut report);
        report.rounds += 1;
        if model.wires == before {
            report.converged = true;
            break;
        }
    }
    if !report.converged {
        tracing::warn!(
            "normalize_all: no fixed point after {} rounds, keeping last result",
            max_rounds
        );
    }
    report.wires_after = model.wires.len();
    tracing::debug!(
        "normalize_all: {} rounds, {} -> {} wires, {} contacts materialized",
        report.rounds,
        report.wires_before,
        report.wires_after,
        report.contacts_materialized
    );
    report
}

fn normalize_round(model: &mut Model, options: &EngineOptions, report: &mut NormalizeReport) {
    for wire in &mut model.wires {
        wire.points = dedupe(&wire.points);
    }
    model.wires.retain(|w| !w.is_degenerate());
    report.contacts_materialized += materialize_contacts(&mut model.wires);

    let pins = pin_points(model);
    let index = PointIndex::build(&model.wires, &pins);
    let anchored = index.anchored_keys();
    let junctions = index.junctions();
    let netlist = NetlistBuilder::new(model).build();

    for wi in 0..model.wires.len() {
        let keepout = Keepout::for_wire(model, wi);
        let wire = &model.wires[wi];
        let connected = netlist.connected_component_ids(&wire.points[0]);
        let mut obstacles = build_obstacles(&model.components, &connected, options);
        obstacles.extend(build_pass_through_obstacles(
            wire,
            &connected,
            &junctions,
            &model.components,
            options,
        ));

        let points = ensure_orthogonal_avoiding(&wire.points, &anchored, &keepout, options.grid_size);
        let points = Router::new(&obstacles, options.grid_size)
            .with_keepout(&keepout)
            .route(&points);
        let mut points = simplify(&points, &anchored);
        if options.optimize_paths {
            let hints = endpoint_axis_hints(model, &points);
            points = optimize_avoiding(&points, &anchored, &obstacles, hints, &keepout);
            points = simplify(&points, &anchored);
        }
        model.wires[wi].points = points;
    }

    model.wires = split_at_overlaps(&model.wires);
    merge_two_way_junctions(&mut model.wires, &pins);
    let junctions = PointIndex::build(&model.wires, &pins).junctions();
    model.wires = split_at_junctions(&model.wires, &junctions);
}

/// Preferred leaving axis at each end of a path: the line of the pins of
/// the component whose pin the path starts or ends on.
pub fn endpoint_axis_hints(model: &Model, points: &[Point]) -> EndpointAxisHints {
    let axis_at = |p: Option<&Point>| {
        let key = p?.key();
        model
            .components
            .iter()
            .filter(|c| c.is_electrical())
            .find(|c| c.pins.iter().any(|pin| pin.position().key() == key))
            .and_then(|c| c.collinear_pin_axis())
            .map(|(axis, _)| axis)
    };
    EndpointAxisHints {
        start: axis_at(points.first()),
        end: axis_at(points.last()),
    }
}

/// Normalize a standalone wire list against `model`'s components. Used by
/// callers that hold wires outside a model.
pub fn normalize_wires(model: &Model, wires: Vec<Wire>, options: &EngineOptions) -> Vec<Wire> {
    let mut scratch = Model {
        components: model.components.clone(),
        wires,
    };
    normalize_all(&mut scratch, options);
    scratch.wires
}
