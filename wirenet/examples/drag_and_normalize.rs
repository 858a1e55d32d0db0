//! Drag a component off a junction, normalize, and print the resulting wires
//! and nets.

use wirenet::edit::move_component;
use wirenet::prelude::*;
use wirenet::{build_nets, Component, ComponentKind};

fn main() -> Result<(), WireNetError> {
    let mut model = Model::new()
        .with_component(Component::two_pin(
            "R1",
            ComponentKind::Resistor,
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
        ))
        .with_component(Component::two_pin(
            "R2",
            ComponentKind::Resistor,
            Point::new(120.0, 0.0),
            Point::new(160.0, 0.0),
        ))
        .with_component(Component::two_pin(
            "R3",
            ComponentKind::Resistor,
            Point::new(40.0, 80.0),
            Point::new(40.0, 120.0),
        ))
        .with_wire(Wire::new("W1", vec![Point::new(40.0, 0.0), Point::new(120.0, 0.0)]))
        .with_wire(Wire::new("W2", vec![Point::new(40.0, 0.0), Point::new(40.0, 80.0)]));

    let options = EngineOptions::default();
    WireNetCore::normalize(&mut model, &options);

    let dx = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(-20.0);
    let dy = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(-40.0);
    move_component(&mut model, "R1", dx, dy)?;

    let report = WireNetCore::normalize(&mut model, &options);
    println!(
        "Normalized in {} round(s), converged: {}",
        report.rounds, report.converged
    );
    println!();

    println!("Wires:");
    for wire in &model.wires {
        let path: Vec<String> = wire
            .points
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect();
        println!("  {}: {}", wire.id, path.join(" -> "));
    }
    println!();

    println!("Nets:");
    for net in build_nets(&model) {
        let pins: Vec<String> = net.pins.iter().map(|p| p.identity()).collect();
        println!("  {}: {}", net.node_label(), pins.join(", "));
    }

    Ok(())
}
