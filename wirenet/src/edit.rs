//! Editing transforms
//!
//! State-in/state-out edits on a [`Model`]. None of them normalize; callers
//! run [`crate::topology::normalize_all`] when a gesture is committed.
//!
//! When a pin moves, wires attached to it are kept attached:
//! - if the old pin position is a junction (degree three or more, the pin
//!   included), the branches stay put and a stub wire joins the old point
//!   to the new pin position;
//! - if exactly one wire ends there, that end follows the pin.

use crate::core::{EngineOptions, WireNetError};
use crate::model::{
    fresh_wire_id, mirror_x, project_onto_segment, rotate_quarter, segment_axis, Axis, Component,
    Model, Point, PointKey, Wire,
};
use crate::topology::{pin_points, PointIndex};

enum Relocation {
    Stub { from: Point, to: Point },
    Follow { wire: usize, at_start: bool, to: Point },
}

pub fn add_component(model: &mut Model, component: Component) -> Result<(), WireNetError> {
    if model.component(&component.id).is_some() {
        return Err(WireNetError::Other(format!(
            "Component id already in use: {}",
            component.id
        )));
    }
    model.components.push(component);
    Ok(())
}

/// Remove a component. Wires that ended on its pins are left in place.
pub fn remove_component(model: &mut Model, id: &str) -> Result<Component, WireNetError> {
    let pos = model
        .components
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| WireNetError::UnknownComponent(id.to_string()))?;
    Ok(model.components.remove(pos))
}

pub fn move_component(model: &mut Model, id: &str, dx: f64, dy: f64) -> Result<(), WireNetError> {
    relocate_pins(model, id, |_, p| p.offset(dx, dy))
}

/// Quarter turn clockwise about the pin centroid, pins snapped to the grid.
pub fn rotate_component(model: &mut Model, id: &str, options: &EngineOptions) -> Result<(), WireNetError> {
    let center = pin_centroid(model, id)?;
    let grid = options.grid_size;
    relocate_pins(model, id, |_, p| rotate_quarter(p, &center, 1).snapped(grid))?;
    if let Some(c) = model.component_mut(id) {
        c.rotation = (c.rotation + 90).rem_euclid(360);
    }
    Ok(())
}

/// Mirror about the vertical line through the pin centroid.
pub fn flip_component(model: &mut Model, id: &str, options: &EngineOptions) -> Result<(), WireNetError> {
    let center = pin_centroid(model, id)?;
    let grid = options.grid_size;
    relocate_pins(model, id, |_, p| mirror_x(p, center.x).snapped(grid))
}

fn pin_centroid(model: &Model, id: &str) -> Result<Point, WireNetError> {
    let component = model
        .component(id)
        .ok_or_else(|| WireNetError::UnknownComponent(id.to_string()))?;
    component
        .pin_centroid()
        .ok_or_else(|| WireNetError::Other(format!("Component {} has no pins", id)))
}

/// Move every pin of `id` to `place(index, old)` and keep wires attached.
fn relocate_pins(
    model: &mut Model,
    id: &str,
    place: impl Fn(usize, &Point) -> Point,
) -> Result<(), WireNetError> {
    let component = model
        .component(id)
        .ok_or_else(|| WireNetError::UnknownComponent(id.to_string()))?;
    let moves: Vec<(Point, Point)> = component
        .pins
        .iter()
        .enumerate()
        .map(|(i, pin)| {
            let old = pin.position();
            (old, place(i, &old))
        })
        .collect();

    // Plan against the pre-move state so pins that trade places do not
    // pick up each other's wires.
    let plans = if component.is_electrical() {
        plan_relocations(model, &moves)
    } else {
        Vec::new()
    };

    if let Some(component) = model.component_mut(id) {
        for (pin, (_, new)) in component.pins.iter_mut().zip(&moves) {
            pin.set_position(*new);
        }
    }
    for plan in plans {
        match plan {
            Relocation::Stub { from, to } => {
                model.wires.push(Wire::new(fresh_wire_id(), vec![from, to]));
            }
            Relocation::Follow { wire, at_start, to } => {
                let points = &mut model.wires[wire].points;
                if at_start {
                    points[0] = to;
                } else if let Some(last) = points.last_mut() {
                    *last = to;
                }
            }
        }
    }
    Ok(())
}

fn plan_relocations(model: &Model, moves: &[(Point, Point)]) -> Vec<Relocation> {
    let pins: Vec<PointKey> = pin_points(model);
    let index = PointIndex::build(&model.wires, &pins);
    let mut plans = Vec::new();
    for (old, new) in moves {
        if old == new {
            continue;
        }
        let key = old.key();
        if index.degree(&key) <= 1 {
            continue;
        }
        let ends: Vec<(usize, bool)> = model
            .wires
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.is_degenerate())
            .flat_map(|(wi, w)| {
                let mut hits = Vec::new();
                if w.points[0].key() == key {
                    hits.push((wi, true));
                }
                if w.points[w.points.len() - 1].key() == key {
                    hits.push((wi, false));
                }
                hits
            })
            .collect();
        if index.is_junction(&key) || ends.len() != 1 {
            plans.push(Relocation::Stub { from: *old, to: *new });
        } else {
            let (wire, at_start) = ends[0];
            plans.push(Relocation::Follow { wire, at_start, to: *new });
        }
    }
    plans
}

/// Add a wire with a fresh id; returns the id.
pub fn add_wire(model: &mut Model, points: Vec<Point>) -> String {
    let id = fresh_wire_id();
    model.wires.push(Wire::new(id.clone(), points));
    id
}

pub fn remove_wire(model: &mut Model, id: &str) -> Result<Wire, WireNetError> {
    let pos = model
        .wires
        .iter()
        .position(|w| w.id == id)
        .ok_or_else(|| WireNetError::UnknownWire(id.to_string()))?;
    Ok(model.wires.remove(pos))
}

/// Insert the projection of `world` onto the nearest segment of the wire.
pub fn insert_wire_point(model: &mut Model, wire_id: &str, world: &Point) -> Result<Point, WireNetError> {
    let wire = model
        .wire_mut(wire_id)
        .ok_or_else(|| WireNetError::UnknownWire(wire_id.to_string()))?;
    let (segment, point) = wire
        .segments()
        .enumerate()
        .map(|(i, (a, b))| (i, project_onto_segment(world, a, b)))
        .min_by(|(_, p), (_, q)| p.distance_sq(world).total_cmp(&q.distance_sq(world)))
        .ok_or_else(|| WireNetError::Other(format!("Wire {} has no segments", wire_id)))?;
    wire.points.insert(segment + 1, point);
    Ok(point)
}

/// Move segment `segment` of a wire perpendicular to itself by `offset`.
/// Wire endpoints never move: dragging an end segment leaves a stub at the
/// endpoint, and so does a collinear neighbour. Returns the moved vertices, which callers keep anchored while
/// the drag is live.
pub fn drag_segment(
    model: &mut Model,
    wire_id: &str,
    segment: usize,
    offset: f64,
) -> Result<Vec<Point>, WireNetError> {
    let wire = model
        .wire_mut(wire_id)
        .ok_or_else(|| WireNetError::UnknownWire(wire_id.to_string()))?;
    if segment + 1 >= wire.points.len() {
        return Err(WireNetError::Other(format!(
            "Wire {} has no segment {}",
            wire_id, segment
        )));
    }
    let (a, b) = (wire.points[segment], wire.points[segment + 1]);
    let Some(axis) = segment_axis(&a, &b) else {
        return Err(WireNetError::Other(format!(
            "Segment {} of wire {} is not axis-aligned",
            segment, wire_id
        )));
    };
    let (dx, dy) = match axis {
        Axis::Horizontal => (0.0, offset),
        Axis::Vertical => (offset, 0.0),
    };
    let perpendicular = Some(axis.other());

    // A vertex whose other segment is not perpendicular cannot slide; leave
    // a copy behind so the neighbour stays put.
    let mut i = segment;
    if i == 0 || segment_axis(&wire.points[i - 1], &a) != perpendicular {
        wire.points.insert(i, a);
        i += 1;
    }
    let j = i + 1;
    if j + 1 == wire.points.len() || segment_axis(&b, &wire.points[j + 1]) != perpendicular {
        wire.points.insert(j + 1, b);
    }
    let moved = [wire.points[i].offset(dx, dy), wire.points[j].offset(dx, dy)];
    wire.points[i] = moved[0];
    wire.points[j] = moved[1];
    Ok(moved.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentKind;

    fn resistor(id: &str, a: (f64, f64), b: (f64, f64)) -> Component {
        Component::two_pin(
            id,
            ComponentKind::Resistor,
            Point::new(a.0, a.1),
            Point::new(b.0, b.1),
        )
    }

    fn wire(id: &str, raw: &[(f64, f64)]) -> Wire {
        Wire::new(id, raw.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_single_wire_end_follows_pin() {
        let mut model = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_wire(wire("W1", &[(40.0, 0.0), (100.0, 0.0)]));
        move_component(&mut model, "R1", 0.0, 20.0).unwrap();
        assert_eq!(model.wires.len(), 1);
        assert_eq!(model.wires[0].points[0], Point::new(40.0, 20.0));
    }

    #[test]
    fn test_junction_keeps_branches_and_adds_stub() {
        let mut model = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_wire(wire("W1", &[(40.0, 0.0), (100.0, 0.0)]))
            .with_wire(wire("W2", &[(40.0, 0.0), (40.0, 60.0)]));
        move_component(&mut model, "R1", 0.0, -20.0).unwrap();
        assert_eq!(model.wires.len(), 3);
        assert_eq!(model.wires[0].points[0], Point::new(40.0, 0.0));
        assert_eq!(model.wires[1].points[0], Point::new(40.0, 0.0));
        assert_eq!(
            model.wires[2].points,
            vec![Point::new(40.0, 0.0), Point::new(40.0, -20.0)]
        );
    }

    #[test]
    fn test_flip_swaps_wires_with_pins() {
        let mut model = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_wire(wire("WA", &[(0.0, 0.0), (0.0, 40.0)]))
            .with_wire(wire("WB", &[(40.0, 0.0), (40.0, 40.0)]));
        flip_component(&mut model, "R1", &EngineOptions::default()).unwrap();
        assert_eq!(model.wires[0].points[0], Point::new(40.0, 0.0));
        assert_eq!(model.wires[1].points[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_rotate_turns_about_centroid() {
        let mut model = Model::new().with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)));
        rotate_component(&mut model, "R1", &EngineOptions::default()).unwrap();
        let r1 = model.component("R1").unwrap();
        assert_eq!(r1.rotation, 90);
        assert_eq!(r1.pins[0].position(), Point::new(20.0, -20.0));
        assert_eq!(r1.pins[1].position(), Point::new(20.0, 20.0));
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut model = Model::new();
        assert!(matches!(
            move_component(&mut model, "X", 1.0, 1.0),
            Err(WireNetError::UnknownComponent(_))
        ));
        assert!(matches!(
            remove_wire(&mut model, "W"),
            Err(WireNetError::UnknownWire(_))
        ));
    }

    #[test]
    fn test_insert_and_drag() {
        let mut model = Model::new().with_wire(wire("W1", &[(0.0, 0.0), (100.0, 0.0)]));
        let p = insert_wire_point(&mut model, "W1", &Point::new(40.0, 7.0)).unwrap();
        assert_eq!(p, Point::new(40.0, 0.0));
        assert_eq!(model.wires[0].points.len(), 3);

        let handles = drag_segment(&mut model, "W1", 0, 20.0).unwrap();
        assert_eq!(handles, vec![Point::new(0.0, 20.0), Point::new(40.0, 20.0)]);
        assert_eq!(
            model.wires[0].points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 20.0),
                Point::new(40.0, 20.0),
                Point::new(40.0, 0.0),
                Point::new(100.0, 0.0)
            ]
        );
    }
}
