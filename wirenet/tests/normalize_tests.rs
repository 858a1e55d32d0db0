//! Normalization properties over fixture models.

use std::collections::HashSet;
use std::path::PathBuf;

use wirenet::edit::move_component;
use wirenet::model::is_orthogonal;
use wirenet::prelude::*;
use wirenet::routing::Router;
use wirenet::topology::{pin_points, PointIndex};
use wirenet::{
    build_obstacles, load_model, merge_two_way_junctions, normalize_all, simplify,
    split_at_junctions, topology_signature, Component, ComponentKind,
};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> Model {
    load_model(&fixture_path(name)).expect("fixture should load")
}

const FIXTURES: &[&str] = &[
    "two_resistors.json",
    "ground_label.json",
    "label_union.json",
    "junction_drag.json",
    "messy.json",
];

#[test]
fn test_normalize_is_idempotent() {
    let options = EngineOptions::default();
    for name in FIXTURES {
        let mut model = fixture(name);
        let report = normalize_all(&mut model, &options);
        assert!(report.converged, "{} did not converge", name);
        let once = model.clone();
        normalize_all(&mut model, &options);
        assert_eq!(model, once, "{} changed on second normalize", name);
    }
}

#[test]
fn test_normalize_leaves_only_orthogonal_segments() {
    let options = EngineOptions::default();
    for name in FIXTURES {
        let mut model = fixture(name);
        normalize_all(&mut model, &options);
        for wire in &model.wires {
            assert!(wire.points.len() >= 2, "{}: degenerate wire {}", name, wire.id);
            for pair in wire.points.windows(2) {
                assert!(
                    is_orthogonal(&pair[0], &pair[1]) && pair[0] != pair[1],
                    "{}: wire {} has bad segment {:?}",
                    name,
                    wire.id,
                    pair
                );
            }
        }
    }
}

#[test]
fn test_normalize_preserves_topology() {
    let options = EngineOptions::default();
    for name in FIXTURES {
        let mut model = fixture(name);
        let before = topology_signature(&model);
        normalize_all(&mut model, &options);
        assert_eq!(topology_signature(&model), before, "{} changed nets", name);
    }
}

fn resistor(id: &str, a: (f64, f64), b: (f64, f64)) -> Component {
    Component::two_pin(
        id,
        ComponentKind::Resistor,
        Point::new(a.0, a.1),
        Point::new(b.0, b.1),
    )
}

#[test]
fn test_diagonal_between_side_by_side_pins_keeps_nets() {
    let options = EngineOptions::default();
    let mut model = Model::new()
        .with_component(resistor("R0", (80.0, 40.0), (80.0, 80.0)))
        .with_component(resistor("R1", (0.0, 40.0), (0.0, 80.0)))
        .with_wire(Wire::new("W1", vec![Point::new(80.0, 80.0), Point::new(0.0, 40.0)]));
    let before = topology_signature(&model);

    normalize_all(&mut model, &options);

    assert_eq!(topology_signature(&model), before);
    let w1 = model.wire("W1").unwrap();
    assert!(!w1.points.contains(&Point::new(0.0, 80.0)));
    assert!(!w1.points.contains(&Point::new(80.0, 40.0)));
    assert!(w1.points.windows(2).all(|s| is_orthogonal(&s[0], &s[1])));
}

#[test]
fn test_zero_length_wire_is_dropped_without_changing_nets() {
    let options = EngineOptions::default();
    let mut model = Model::new()
        .with_component(resistor("R1", (60.0, 80.0), (100.0, 80.0)))
        .with_component(resistor("R2", (0.0, 0.0), (-40.0, 0.0)))
        .with_wire(Wire::new(
            "W1",
            vec![Point::new(0.0, 0.0), Point::new(60.0, 0.0), Point::new(60.0, 160.0)],
        ))
        .with_wire(Wire::new("W0", vec![Point::new(60.0, 80.0), Point::new(60.0, 80.0)]));
    let before = topology_signature(&model);

    normalize_all(&mut model, &options);

    assert!(model.wire("W0").is_none());
    assert_eq!(topology_signature(&model), before);
}

#[test]
fn test_simplify_keeps_anchored_points() {
    let model = fixture("messy.json");
    let pins = pin_points(&model);
    let anchored = PointIndex::build(&model.wires, &pins).anchored_keys();
    for wire in &model.wires {
        let out = simplify(&wire.points, &anchored);
        for p in wire.points.iter().filter(|p| anchored.contains(&p.key())) {
            assert!(out.contains(p), "anchor {:?} of {} was dropped", p, wire.id);
        }
    }
}

#[test]
fn test_split_then_merge_is_identity() {
    let wire = Wire::new(
        "W1",
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 40.0),
            Point::new(80.0, 40.0),
            Point::new(80.0, 100.0),
        ],
    );
    let mut wires = split_at_junctions(&[wire.clone()], &HashSet::new());
    merge_two_way_junctions(&mut wires, &[]);
    assert_eq!(wires, vec![wire]);
}

#[test]
fn test_wires_avoid_unrelated_bodies() {
    let options = EngineOptions::default();
    let mut model = fixture("messy.json");
    normalize_all(&mut model, &options);

    let r9_only: HashSet<String> = model
        .components
        .iter()
        .map(|c| c.id.clone())
        .filter(|id| id != "R9")
        .collect();
    let obstacles = build_obstacles(&model.components, &r9_only, &options);
    assert_eq!(obstacles.len(), 1);
    let router = Router::new(&obstacles, options.grid_size);
    for wire in &model.wires {
        assert!(router.is_clear(&wire.points), "wire {} crosses R9", wire.id);
    }
}

#[test]
fn test_drag_at_junction_keeps_other_branches() {
    let options = EngineOptions::default();
    let mut model = fixture("junction_drag.json");
    normalize_all(&mut model, &options);
    let w1 = model.wire("W1").cloned().unwrap();
    let w2 = model.wire("W2").cloned().unwrap();

    move_component(&mut model, "R1", 0.0, -40.0).unwrap();
    normalize_all(&mut model, &options);

    assert_eq!(model.wire("W1"), Some(&w1));
    assert_eq!(model.wire("W2"), Some(&w2));
    assert_eq!(model.wires.len(), 3);
    let stub = model
        .wires
        .iter()
        .find(|w| w.id != "W1" && w.id != "W2")
        .unwrap();
    assert_eq!(stub.points, vec![Point::new(40.0, 0.0), Point::new(40.0, -40.0)]);

    let nets = wirenet::build_nets(&model);
    let shared = nets.iter().find(|n| n.contains_pin("R1", "2")).unwrap();
    assert!(shared.contains_pin("R2", "1"));
    assert!(shared.contains_pin("R3", "1"));
}

#[test]
fn test_removed_branch_is_merged_away() {
    let options = EngineOptions::default();
    let mut model = fixture("junction_drag.json");
    model.components.retain(|c| c.id != "R1");
    normalize_all(&mut model, &options);
    // With R1 gone the junction is a plain bend: one wire from R2 to R3.
    assert_eq!(model.wires.len(), 1);
    let wire = &model.wires[0];
    let ends: HashSet<_> = [wire.points[0], wire.points[wire.points.len() - 1]]
        .iter()
        .map(|p| p.key())
        .collect();
    assert!(ends.contains(&Point::new(120.0, 0.0).key()));
    assert!(ends.contains(&Point::new(40.0, 80.0).key()));
}
