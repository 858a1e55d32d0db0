//! Routing engine
//!
//! Produces orthogonal, obstacle-avoiding polylines from a wire's anchored
//! points:
//! - [`ensure_orthogonal`]: repairs diagonal segments left by edits
//! - [`reroute`]: detours segments around obstacle rectangles
//! - [`simplify`]: removes redundant points while keeping anchors
//! - [`optimize`]: opt-in search for visually minimal sub-paths

pub mod optimize;
pub mod orthogonal;
pub mod reroute;
pub mod simplify;

pub use optimize::{optimize, EndpointAxisHints};
pub use orthogonal::{ensure_orthogonal, ensure_orthogonal_avoiding, ORTHOGONAL_ITERATION_FACTOR};
pub use reroute::{reroute, Router, MIN_REROUTE_PASSES};
pub use simplify::{dedupe, simplify};

use std::collections::HashSet;

use crate::model::{point_strictly_inside_segment, segment_axis, Axis, Model, Point, PointKey};

/// Foreign geometry that newly created wire points must not touch, so that
/// routing never creates a connection that was not there before.
#[derive(Debug, Clone, Default)]
pub struct Keepout {
    keys: HashSet<PointKey>,
    points: Vec<Point>,
    segments: Vec<(Point, Point)>,
}

impl Keepout {
    pub fn new(points: Vec<Point>, segments: Vec<(Point, Point)>) -> Self {
        let keys = points.iter().map(Point::key).collect();
        Self {
            keys,
            points,
            segments,
        }
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self::new(points, Vec::new())
    }

    /// Everything outside wire `wire_index`: other wires' vertices and
    /// segments, and electrical pins not already on this wire.
    pub fn for_wire(model: &Model, wire_index: usize) -> Self {
        let own: HashSet<PointKey> = model
            .wires
            .get(wire_index)
            .map(|w| w.points.iter().map(Point::key).collect())
            .unwrap_or_default();
        let mut points = Vec::new();
        let mut segments = Vec::new();
        for (wi, wire) in model.wires.iter().enumerate() {
            if wi == wire_index {
                continue;
            }
            points.extend(wire.points.iter().copied());
            segments.extend(wire.segments().map(|(a, b)| (*a, *b)));
        }
        points.extend(
            model
                .electrical_pins()
                .map(|(_, p)| p.position())
                .filter(|p| !own.contains(&p.key())),
        );
        Self::new(points, segments)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.segments.is_empty()
    }

    /// A new vertex at `p` would coincide with, or land on, foreign geometry.
    pub fn blocks_point(&self, p: &Point) -> bool {
        self.keys.contains(&p.key())
            || self
                .segments
                .iter()
                .any(|(a, b)| point_strictly_inside_segment(p, a, b))
    }

    /// A new segment `a-b` would run through a foreign point or along a
    /// foreign segment.
    pub fn blocks_leg(&self, a: &Point, b: &Point) -> bool {
        self.points
            .iter()
            .any(|q| point_strictly_inside_segment(q, a, b))
            || self
                .segments
                .iter()
                .any(|(p, q)| collinear_overlap(a, b, p, q))
    }

    /// Corner `c` and the legs `a-c`, `c-b` are all clear.
    pub fn allows_corner(&self, a: &Point, c: &Point, b: &Point) -> bool {
        !self.blocks_point(c) && !self.blocks_leg(a, c) && !self.blocks_leg(c, b)
    }
}

/// Two orthogonal segments on the same line sharing a positive length.
fn collinear_overlap(a: &Point, b: &Point, p: &Point, q: &Point) -> bool {
    match (segment_axis(a, b), segment_axis(p, q)) {
        (Some(Axis::Horizontal), Some(Axis::Horizontal)) if a.y == p.y => {
            a.x.max(b.x).min(p.x.max(q.x)) - a.x.min(b.x).max(p.x.min(q.x)) > 0.0
        }
        (Some(Axis::Vertical), Some(Axis::Vertical)) if a.x == p.x => {
            a.y.max(b.y).min(p.y.max(q.y)) - a.y.min(b.y).max(p.y.min(q.y)) > 0.0
        }
        _ => false,
    }
}
