//! Net derivation and ground queries.

pub mod builder;

pub use builder::{Netlist, NetlistBuilder};

use serde::{Deserialize, Serialize};

use crate::model::{Component, Model, Pin, Point};

/// One pin as seen from a net.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRef {
    pub component_id: String,
    pub pin_id: String,
    pub pin_name: String,
    pub component_type: String,
}

impl PinRef {
    pub fn new(component: &Component, pin: &Pin) -> Self {
        Self {
            component_id: component.id.clone(),
            pin_id: pin.id.clone(),
            pin_name: pin.name.clone(),
            component_type: component.kind.tag().to_string(),
        }
    }

    /// Ground marker pin, or a pin named or numbered `0` / `gnd`.
    pub fn is_ground(&self) -> bool {
        if self.component_type == "GND" {
            return true;
        }
        [&self.pin_name, &self.pin_id].iter().any(|s| {
            let s = s.trim().to_ascii_lowercase();
            s == "0" || s == "gnd"
        })
    }

    /// `component:pin` identity used in topology signatures.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.component_id, self.pin_id)
    }
}

/// An electrical net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    /// 1-based, stable for a given model.
    pub id: usize,
    pub pins: Vec<PinRef>,
    pub nodes: Vec<Point>,
    /// `NET` labels on this net as written, one per distinct label.
    pub labels: Vec<String>,
    pub grounded: bool,
}

impl Net {
    /// Display name: first label, `0` for ground, otherwise `N<id>`.
    pub fn node_label(&self) -> String {
        if let Some(label) = self.labels.first() {
            label.clone()
        } else if self.grounded {
            "0".to_string()
        } else {
            format!("N{}", self.id)
        }
    }

    pub fn contains_pin(&self, component_id: &str, pin_id: &str) -> bool {
        self.pins
            .iter()
            .any(|p| p.component_id == component_id && p.pin_id == pin_id)
    }
}

pub fn build_nets(model: &Model) -> Vec<Net> {
    NetlistBuilder::new(model).build().nets
}

/// Ground presence as seen by the electrical rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroundStatus {
    /// A grounded net reaches at least one device pin.
    Present,
    /// Ground markers exist but none shares a net with a device pin.
    Floating,
    Missing,
}

pub fn ground_status(nets: &[Net]) -> GroundStatus {
    let mut grounded = nets.iter().filter(|n| n.grounded).peekable();
    if grounded.peek().is_none() {
        return GroundStatus::Missing;
    }
    let reaches_device = grounded.any(|net| {
        net.pins
            .iter()
            .any(|p| p.component_type != "GND" && p.component_type != "NET")
    });
    if reaches_device {
        GroundStatus::Present
    } else {
        GroundStatus::Floating
    }
}

/// Order-independent partition of pin identities into nets.
pub fn topology_signature(model: &Model) -> Vec<Vec<String>> {
    let mut signature: Vec<Vec<String>> = build_nets(model)
        .iter()
        .filter(|n| !n.pins.is_empty())
        .map(|n| {
            let mut ids: Vec<String> = n.pins.iter().map(PinRef::identity).collect();
            ids.sort();
            ids
        })
        .collect();
    signature.sort();
    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentKind, Wire};

    fn resistor(id: &str, a: (f64, f64), b: (f64, f64)) -> Component {
        Component::two_pin(
            id,
            ComponentKind::Resistor,
            Point::new(a.0, a.1),
            Point::new(b.0, b.1),
        )
    }

    fn net_label(id: &str, name: &str, at: (f64, f64)) -> Component {
        Component::marker(id, ComponentKind::NetLabel, Point::new(at.0, at.1)).with_name(name)
    }

    #[test]
    fn test_wire_joins_pins() {
        let model = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_component(resistor("R2", (100.0, 0.0), (140.0, 0.0)))
            .with_wire(Wire::new("W1", vec![Point::new(40.0, 0.0), Point::new(100.0, 0.0)]));

        let nets = build_nets(&model);
        assert_eq!(nets.len(), 3);
        let shared = nets.iter().find(|n| n.pins.len() == 2).unwrap();
        assert!(shared.contains_pin("R1", "2"));
        assert!(shared.contains_pin("R2", "1"));
        assert_eq!(shared.node_label(), format!("N{}", shared.id));
    }

    #[test]
    fn test_endpoint_on_segment_connects_but_crossing_does_not() {
        let model = Model::new()
            .with_component(resistor("R1", (0.0, -40.0), (0.0, -80.0)))
            .with_component(resistor("R2", (60.0, -40.0), (60.0, -80.0)))
            .with_wire(Wire::new("A", vec![Point::new(-40.0, 0.0), Point::new(100.0, 0.0)]))
            .with_wire(Wire::new("B", vec![Point::new(0.0, -40.0), Point::new(0.0, 0.0)]))
            .with_wire(Wire::new("C", vec![Point::new(60.0, -40.0), Point::new(60.0, 40.0)]));

        let nets = build_nets(&model);
        let r1 = nets.iter().find(|n| n.contains_pin("R1", "1")).unwrap();
        assert!(r1.nodes.contains(&Point::new(100.0, 0.0)));
        assert!(!r1.contains_pin("R2", "1"));
    }

    #[test]
    fn test_zero_length_wire_does_not_join_pin_to_segment() {
        let model = Model::new()
            .with_component(resistor("R1", (60.0, 80.0), (100.0, 80.0)))
            .with_component(resistor("R2", (0.0, 0.0), (-40.0, 0.0)))
            .with_wire(Wire::new(
                "W1",
                vec![Point::new(0.0, 0.0), Point::new(60.0, 0.0), Point::new(60.0, 160.0)],
            ))
            .with_wire(Wire::new("W0", vec![Point::new(60.0, 80.0), Point::new(60.0, 80.0)]));

        let nets = build_nets(&model);
        let r2 = nets.iter().find(|n| n.contains_pin("R2", "1")).unwrap();
        assert!(!r2.contains_pin("R1", "1"));
    }

    #[test]
    fn test_labels_merge_case_insensitively() {
        let model = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_component(resistor("R2", (200.0, 0.0), (240.0, 0.0)))
            .with_component(net_label("L1", "Vout", (40.0, 0.0)))
            .with_component(net_label("L2", "  vout ", (200.0, 0.0)));

        let nets = build_nets(&model);
        let vout = nets.iter().find(|n| n.contains_pin("R1", "2")).unwrap();
        assert!(vout.contains_pin("R2", "1"));
        assert_eq!(vout.labels, vec!["Vout".to_string()]);
        assert_eq!(vout.node_label(), "Vout");
    }

    #[test]
    fn test_ground_status() {
        let gnd = |at: (f64, f64)| Component::marker("G1", ComponentKind::Ground, Point::new(at.0, at.1));

        let present = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_component(gnd((0.0, 0.0)));
        assert_eq!(ground_status(&build_nets(&present)), GroundStatus::Present);

        let floating = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_component(gnd((100.0, 100.0)));
        assert_eq!(ground_status(&build_nets(&floating)), GroundStatus::Floating);

        let labelled = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_component(net_label("L1", "GND2", (0.0, 0.0)));
        assert_eq!(ground_status(&build_nets(&labelled)), GroundStatus::Missing);
    }

    #[test]
    fn test_pin_named_zero_grounds_net() {
        let v = Component::new("V1", ComponentKind::VoltageSource)
            .with_pin(Pin::new("1", 0.0, 0.0).with_name("+"))
            .with_pin(Pin::new("2", 0.0, 40.0).with_name("0"));
        let nets = build_nets(&Model::new().with_component(v));
        let grounded: Vec<_> = nets.iter().filter(|n| n.grounded).collect();
        assert_eq!(grounded.len(), 1);
        assert_eq!(grounded[0].node_label(), "0");
    }

    #[test]
    fn test_topology_signature_ignores_wire_ids() {
        let base = Model::new()
            .with_component(resistor("R1", (0.0, 0.0), (40.0, 0.0)))
            .with_component(resistor("R2", (100.0, 0.0), (140.0, 0.0)));
        let a = base
            .clone()
            .with_wire(Wire::new("W1", vec![Point::new(40.0, 0.0), Point::new(100.0, 0.0)]));
        let b = base.with_wire(Wire::new(
            "W9",
            vec![Point::new(100.0, 0.0), Point::new(70.0, 0.0), Point::new(40.0, 0.0)],
        ));
        assert_eq!(topology_signature(&a), topology_signature(&b));
        assert_eq!(topology_signature(&a).len(), 3);
    }
}
