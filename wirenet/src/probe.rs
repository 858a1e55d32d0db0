//! Probe target resolver
//!
//! Turns a pointer position into the thing a probe would attach to: an
//! electrical node (pin, junction, wire end or a point along a wire) or a
//! component body.

use serde::Serialize;

use crate::core::EngineOptions;
use crate::model::{point_strictly_inside_segment, project_onto_segment, Model, Point};
use crate::netlist::{Netlist, NetlistBuilder};
use crate::topology::{pin_points, PointIndex};

/// Everything a probe could attach to near a point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeTargets {
    pub node_point: Option<Point>,
    pub node_label: Option<String>,
    pub component: Option<String>,
    pub component_anchor: Option<Point>,
    pub node_distance_sq: Option<f64>,
    pub component_distance_sq: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    /// Nearest target wins; a tie goes to the node.
    #[default]
    Closest,
    /// Any node hit wins over a component.
    NodeFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProbeTarget {
    Node { point: Point, label: Option<String> },
    Component { id: String, anchor: Point },
}

/// Nearest node point to `world`: a pin, junction or wire endpoint within
/// the node radius, or the projection onto a wire within the wire radius,
/// whichever is closer. Ties go to the node.
pub fn resolve_probe_node_point(model: &Model, world: &Point, options: &EngineOptions) -> Option<Point> {
    nearest_node(model, world, options).map(|(p, _)| p)
}

fn nearest_node(model: &Model, world: &Point, options: &EngineOptions) -> Option<(Point, f64)> {
    let pins = pin_points(model);
    let index = PointIndex::build(&model.wires, &pins);
    let mut nodes: Vec<Point> = pins.iter().map(|k| k.point()).collect();
    nodes.extend(index.junctions().into_iter().map(|k| k.point()));
    nodes.extend(
        model
            .wires
            .iter()
            .filter(|w| !w.is_degenerate())
            .flat_map(|w| [w.points[0], w.points[w.points.len() - 1]]),
    );

    let node_r2 = options.node_hit_radius * options.node_hit_radius;
    let node_hit = nearest(nodes.into_iter(), world).filter(|(_, d)| *d <= node_r2);

    let wire_r2 = options.wire_hit_radius * options.wire_hit_radius;
    let projections = model
        .wires
        .iter()
        .flat_map(|w| w.segments().map(|(a, b)| project_onto_segment(world, a, b)));
    let wire_hit = nearest(projections, world).filter(|(_, d)| *d <= wire_r2);

    match (node_hit, wire_hit) {
        (Some(node), Some(wire)) if wire.1 < node.1 => Some(wire),
        (Some(node), _) => Some(node),
        (None, wire) => wire,
    }
}

/// Closest point to `world`; among equals the lexically smallest.
fn nearest(points: impl Iterator<Item = Point>, world: &Point) -> Option<(Point, f64)> {
    points
        .map(|p| (p, p.distance_sq(world)))
        .min_by(|(p, dp), (q, dq)| dp.total_cmp(dq).then_with(|| p.lexical_cmp(q)))
}

pub fn resolve_probe_targets(model: &Model, world: &Point, options: &EngineOptions) -> ProbeTargets {
    let mut targets = ProbeTargets::default();

    if let Some((point, d2)) = nearest_node(model, world, options) {
        let netlist = NetlistBuilder::new(model).build();
        targets.node_label = node_label_at(model, &netlist, &point);
        targets.node_point = Some(point);
        targets.node_distance_sq = Some(d2);
    }

    let grid = options.grid_size;
    let radius = options.component_hit_radius();
    let hit = model
        .components
        .iter()
        .filter(|c| c.is_probe_target())
        .filter_map(|c| {
            let (a, b) = (c.pins[0].position(), c.pins[1].position());
            let anchor = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0).snapped(grid);
            let d2 = anchor.distance_sq(world);
            (d2 <= radius * radius).then(|| (c, anchor, d2))
        })
        .min_by(|x, y| x.2.total_cmp(&y.2).then_with(|| x.0.id.cmp(&y.0.id)));
    if let Some((component, anchor, d2)) = hit {
        targets.component = Some(component.id.clone());
        targets.component_anchor = Some(anchor);
        targets.component_distance_sq = Some(d2);
    }
    targets
}

/// Label of the net a point sits on, also for points along a segment.
fn node_label_at(model: &Model, netlist: &Netlist, point: &Point) -> Option<String> {
    if let Some(net) = netlist.net_at(point) {
        return Some(net.node_label());
    }
    model
        .wires
        .iter()
        .flat_map(|w| w.segments())
        .find(|(a, b)| point_strictly_inside_segment(point, a, b))
        .and_then(|(a, _)| netlist.net_at(a))
        .map(|net| net.node_label())
}

pub fn pick_probe_target(targets: &ProbeTargets, strategy: ProbeStrategy) -> Option<ProbeTarget> {
    let node = targets.node_point.map(|point| ProbeTarget::Node {
        point,
        label: targets.node_label.clone(),
    });
    let component = match (&targets.component, targets.component_anchor) {
        (Some(id), Some(anchor)) => Some(ProbeTarget::Component {
            id: id.clone(),
            anchor,
        }),
        _ => None,
    };
    match strategy {
        ProbeStrategy::NodeFirst => node.or(component),
        ProbeStrategy::Closest => match (node, component) {
            (Some(n), Some(c)) => {
                let dn = targets.node_distance_sq.unwrap_or(f64::INFINITY);
                let dc = targets.component_distance_sq.unwrap_or(f64::INFINITY);
                Some(if dn <= dc { n } else { c })
            }
            (n, c) => n.or(c),
        },
    }
}
