//! Obstacle model
//!
//! Component bodies become inflated rectangles that wires route around.
//! Components already connected to a wire are not obstacles for it; instead
//! a thin pass-through sliver keeps the wire from running across the body
//! between two of the component's own pins.

use std::collections::HashSet;

use serde::Serialize;

use crate::core::EngineOptions;
use crate::model::{rotate_quarter, Axis, Bounds, Component, ComponentKind, Point, PointKey, Wire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObstacleKind {
    /// Inflated component body.
    Body,
    /// Sliver between collinear pins of a connected component.
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    pub owner: String,
    pub kind: ObstacleKind,
    pub bounds: Bounds,
}

/// Body rectangle of a component before clearance, or `None` for
/// components that take no space on the wiring layer.
pub fn footprint(component: &Component, grid: f64) -> Option<Bounds> {
    if !component.is_obstacle_source() {
        return None;
    }
    match &component.kind {
        ComponentKind::Ground => {
            let pin = component.pins.first()?.position();
            marker_box(&pin, component.rotation, (-0.5 * grid, 0.0), (0.5 * grid, 0.75 * grid))
        }
        ComponentKind::NetLabel => {
            let pin = component.pins.first()?.position();
            marker_box(&pin, component.rotation, (0.0, -0.4 * grid), (2.0 * grid, 0.4 * grid))
        }
        kind => {
            let pins = component.pin_bounds()?;
            let pad = if kind.is_switch() { 0.75 * grid } else { 0.5 * grid };
            let (w, h) = (pins.width(), pins.height());
            Some(if w > h {
                pins.inflate_xy(0.0, pad)
            } else if h > w {
                pins.inflate_xy(pad, 0.0)
            } else {
                pins.inflate(pad)
            })
        }
    }
}

/// Local box `lo..hi` anchored at the pin, rotated with the component.
fn marker_box(pin: &Point, rotation: i32, lo: (f64, f64), hi: (f64, f64)) -> Option<Bounds> {
    let turns = rotation.div_euclid(90);
    let corners = [
        pin.offset(lo.0, lo.1),
        pin.offset(hi.0, hi.1),
    ]
    .map(|c| rotate_quarter(&c, pin, turns));
    Bounds::from_points(corners.iter())
}

/// Body obstacles of every obstacle-source component not in `exclude_ids`,
/// inflated by the routing clearance.
pub fn build_obstacles(
    components: &[Component],
    exclude_ids: &HashSet<String>,
    options: &EngineOptions,
) -> Vec<Obstacle> {
    let clearance = options.clearance();
    components
        .iter()
        .filter(|c| !exclude_ids.contains(&c.id))
        .filter_map(|c| {
            footprint(c, options.grid_size).map(|b| Obstacle {
                owner: c.id.clone(),
                kind: ObstacleKind::Body,
                bounds: b.inflate(clearance),
            })
        })
        .collect()
}

/// Slivers for connected components whose pins sit on one line. Only built
/// when the wire touches a junction or the connected set reaches a component
/// other than the sliver's owner.
pub fn build_pass_through_obstacles(
    wire: &Wire,
    connected_component_ids: &HashSet<String>,
    junctions: &HashSet<PointKey>,
    components: &[Component],
    options: &EngineOptions,
) -> Vec<Obstacle> {
    let touches_junction = wire.points.iter().any(|p| junctions.contains(&p.key()));
    let pad = options.pass_through_padding();
    components
        .iter()
        .filter(|c| c.is_obstacle_source() && connected_component_ids.contains(&c.id))
        .filter(|c| touches_junction || connected_component_ids.iter().any(|id| id != &c.id))
        .filter_map(|c| {
            let (axis, span) = c.collinear_pin_axis()?;
            if !wire_covers_span(wire, axis, &span) {
                return None;
            }
            let bounds = match axis {
                Axis::Horizontal => span.inflate_xy(0.0, pad),
                Axis::Vertical => span.inflate_xy(pad, 0.0),
            };
            Some(Obstacle {
                owner: c.id.clone(),
                kind: ObstacleKind::PassThrough,
                bounds,
            })
        })
        .collect()
}

/// The wire reaches both ends of the pin span along `axis`.
fn wire_covers_span(wire: &Wire, axis: Axis, span: &Bounds) -> bool {
    let along = |p: &Point| match axis {
        Axis::Horizontal => p.x,
        Axis::Vertical => p.y,
    };
    let (lo, hi) = match axis {
        Axis::Horizontal => (span.min_x, span.max_x),
        Axis::Vertical => (span.min_y, span.max_y),
    };
    let min = wire.points.iter().map(along).fold(f64::INFINITY, f64::min);
    let max = wire.points.iter().map(along).fold(f64::NEG_INFINITY, f64::max);
    min <= lo && max >= hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pin;

    fn resistor(id: &str, a: (f64, f64), b: (f64, f64)) -> Component {
        Component::two_pin(
            id,
            ComponentKind::Resistor,
            Point::new(a.0, a.1),
            Point::new(b.0, b.1),
        )
    }

    #[test]
    fn test_device_footprint_pads_thin_axis() {
        let r = resistor("R1", (0.0, 0.0), (40.0, 0.0));
        assert_eq!(footprint(&r, 20.0), Some(Bounds::new(0.0, -10.0, 40.0, 10.0)));

        let sw = Component::two_pin(
            "S1",
            ComponentKind::Switch { closed: false },
            Point::new(0.0, 0.0),
            Point::new(0.0, 40.0),
        );
        assert_eq!(footprint(&sw, 20.0), Some(Bounds::new(-15.0, 0.0, 15.0, 40.0)));
    }

    #[test]
    fn test_marker_footprints_follow_rotation() {
        let gnd = Component::marker("G1", ComponentKind::Ground, Point::new(100.0, 100.0));
        assert_eq!(
            footprint(&gnd, 20.0),
            Some(Bounds::new(90.0, 100.0, 110.0, 115.0))
        );

        let mut net = Component::marker("N1", ComponentKind::NetLabel, Point::new(0.0, 0.0));
        net.rotation = 90;
        let b = footprint(&net, 20.0).unwrap();
        assert_eq!(b.width(), 16.0);
        assert_eq!(b.height(), 40.0);
    }

    #[test]
    fn test_probes_and_text_have_no_footprint() {
        let probe = Component::marker("P1", ComponentKind::VoltageProbe, Point::new(0.0, 0.0));
        let text = Component::new("T1", ComponentKind::Text { text: "hi".into() })
            .with_pin(Pin::new("1", 0.0, 0.0));
        assert!(footprint(&probe, 20.0).is_none());
        assert!(footprint(&text, 20.0).is_none());
    }

    #[test]
    fn test_build_obstacles_applies_clearance_and_exclusions() {
        let options = EngineOptions::default();
        let components = vec![
            resistor("R1", (0.0, 0.0), (40.0, 0.0)),
            resistor("R2", (100.0, 0.0), (140.0, 0.0)),
        ];
        let exclude: HashSet<String> = ["R2".to_string()].into_iter().collect();
        let obstacles = build_obstacles(&components, &exclude, &options);
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].owner, "R1");
        assert_eq!(obstacles[0].bounds, Bounds::new(-10.0, -20.0, 50.0, 20.0));
    }

    #[test]
    fn test_pass_through_requires_trigger() {
        let options = EngineOptions::default();
        let components = vec![resistor("R1", (0.0, 0.0), (40.0, 0.0))];
        let wire = Wire::new(
            "W1",
            vec![Point::new(0.0, 0.0), Point::new(0.0, 40.0), Point::new(60.0, 40.0)],
        );
        let only_r1: HashSet<String> = ["R1".to_string()].into_iter().collect();

        let none = build_pass_through_obstacles(&wire, &only_r1, &HashSet::new(), &components, &options);
        assert!(none.is_empty());

        let junctions: HashSet<PointKey> = [Point::new(0.0, 40.0).key()].into_iter().collect();
        let some = build_pass_through_obstacles(&wire, &only_r1, &junctions, &components, &options);
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].kind, ObstacleKind::PassThrough);
        assert_eq!(some[0].bounds, Bounds::new(0.0, -6.0, 40.0, 6.0));
    }

    #[test]
    fn test_pass_through_needs_wire_across_pin_span() {
        let options = EngineOptions::default();
        let components = vec![resistor("R1", (0.0, 0.0), (40.0, 0.0))];
        let only_r1: HashSet<String> = ["R1".to_string()].into_iter().collect();
        let junctions: HashSet<PointKey> = [Point::new(0.0, 40.0).key()].into_iter().collect();

        // Leaves the pin straight down: never reaches x = 40.
        let lead = Wire::new("W1", vec![Point::new(0.0, 0.0), Point::new(0.0, 40.0)]);
        let slivers = build_pass_through_obstacles(&lead, &only_r1, &junctions, &components, &options);
        assert!(slivers.is_empty());
    }
}
