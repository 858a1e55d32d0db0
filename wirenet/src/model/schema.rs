//! Schematic model types
//!
//! The interchange shape consumed and produced by the engine. Everything here
//! is plain serde data so a model survives a JSON round-trip unchanged:
//!
//! ```json
//! { "components": [ { "id": "R1", "type": "R", "rotation": 0,
//!                     "pins": [ { "id": "1", "name": "a", "x": 0, "y": 0 } ] } ],
//!   "wires": [ { "id": "W1", "points": [ { "x": 0, "y": 0 }, { "x": 0, "y": 40 } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

use super::geometry::{Axis, Bounds, Point, PointKey};

/// A component terminal. Positions are absolute world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Pin {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            x,
            y,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }
}

/// Throw position of a single-pole double-throw switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchThrow {
    #[default]
    A,
    B,
}

/// Component discriminant. Serialized as the `type` field of the component
/// record; variant fields are flattened next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentKind {
    #[serde(rename = "R")]
    Resistor,
    #[serde(rename = "C")]
    Capacitor,
    #[serde(rename = "L")]
    Inductor,
    #[serde(rename = "D")]
    Diode,
    #[serde(rename = "LED")]
    Led,
    #[serde(rename = "V")]
    VoltageSource,
    #[serde(rename = "I")]
    CurrentSource,
    #[serde(rename = "Q")]
    Bjt,
    #[serde(rename = "M")]
    Mosfet,
    #[serde(rename = "OA")]
    OpAmp,
    /// Single-pole single-throw switch.
    #[serde(rename = "SW")]
    Switch {
        #[serde(default)]
        closed: bool,
    },
    /// Single-pole double-throw switch.
    #[serde(rename = "SPDT")]
    ThrowSwitch {
        #[serde(default)]
        throw: SwitchThrow,
    },
    /// Named node marker. Two markers with the same label share a net.
    #[serde(rename = "NET")]
    NetLabel,
    #[serde(rename = "GND")]
    Ground,
    #[serde(rename = "PV")]
    VoltageProbe,
    #[serde(rename = "PI")]
    CurrentProbe,
    /// Differential voltage probe; each terminal carries its own rotation.
    #[serde(rename = "PD")]
    DifferentialProbe {
        #[serde(default, rename = "terminalRotations")]
        terminal_rotations: [i32; 2],
    },
    #[serde(rename = "PP")]
    PowerProbe,
    #[serde(rename = "TEXT")]
    Text {
        #[serde(default)]
        text: String,
    },
}

impl ComponentKind {
    /// The `type` tag as written in model files.
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "R",
            ComponentKind::Capacitor => "C",
            ComponentKind::Inductor => "L",
            ComponentKind::Diode => "D",
            ComponentKind::Led => "LED",
            ComponentKind::VoltageSource => "V",
            ComponentKind::CurrentSource => "I",
            ComponentKind::Bjt => "Q",
            ComponentKind::Mosfet => "M",
            ComponentKind::OpAmp => "OA",
            ComponentKind::Switch { .. } => "SW",
            ComponentKind::ThrowSwitch { .. } => "SPDT",
            ComponentKind::NetLabel => "NET",
            ComponentKind::Ground => "GND",
            ComponentKind::VoltageProbe => "PV",
            ComponentKind::CurrentProbe => "PI",
            ComponentKind::DifferentialProbe { .. } => "PD",
            ComponentKind::PowerProbe => "PP",
            ComponentKind::Text { .. } => "TEXT",
        }
    }

    pub fn is_probe(&self) -> bool {
        matches!(
            self,
            ComponentKind::VoltageProbe
                | ComponentKind::CurrentProbe
                | ComponentKind::DifferentialProbe { .. }
                | ComponentKind::PowerProbe
        )
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, ComponentKind::Switch { .. } | ComponentKind::ThrowSwitch { .. })
    }

    /// Electrical kinds contribute pins to the wire graph.
    pub fn is_electrical(&self) -> bool {
        !self.is_probe() && !matches!(self, ComponentKind::Text { .. })
    }
}

/// A placed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    #[serde(flatten)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Rotation in degrees (multiples of 90).
    #[serde(default)]
    pub rotation: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_rotation: Option<i32>,
    #[serde(default)]
    pub pins: Vec<Pin>,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            value: None,
            rotation: 0,
            label_rotation: None,
            pins: Vec::new(),
        }
    }

    /// Two-terminal device with pins `1` (`a`) and `2` (`b`).
    pub fn two_pin(id: impl Into<String>, kind: ComponentKind, a: Point, b: Point) -> Self {
        let mut c = Self::new(id, kind);
        c.pins.push(Pin::new("1", a.x, a.y).with_name("a"));
        c.pins.push(Pin::new("2", b.x, b.y).with_name("b"));
        c
    }

    /// Single-pin marker (`NET`, `GND`, probes).
    pub fn marker(id: impl Into<String>, kind: ComponentKind, at: Point) -> Self {
        let mut c = Self::new(id, kind);
        c.pins.push(Pin::new("1", at.x, at.y));
        c
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn is_probe(&self) -> bool {
        self.kind.is_probe()
    }

    pub fn is_electrical(&self) -> bool {
        self.kind.is_electrical()
    }

    /// Components whose bodies wires route around.
    pub fn is_obstacle_source(&self) -> bool {
        self.is_electrical() && !self.is_probe()
    }

    pub fn is_ground(&self) -> bool {
        matches!(self.kind, ComponentKind::Ground)
    }

    pub fn is_net_label(&self) -> bool {
        matches!(self.kind, ComponentKind::NetLabel)
    }

    /// Components a probe may attach to by body: electrical, not a probe,
    /// not a node marker, with at least two pins.
    pub fn is_probe_target(&self) -> bool {
        self.is_electrical()
            && !self.is_net_label()
            && !self.is_ground()
            && self.pins.len() >= 2
    }

    /// Normalized label of a `NET` marker: trimmed and ASCII case folded.
    pub fn net_label(&self) -> Option<String> {
        if !self.is_net_label() {
            return None;
        }
        let raw = self.name.as_deref().or(self.value.as_deref())?;
        let label = raw.trim().to_ascii_lowercase();
        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    }

    /// Label as displayed (trimmed, original case).
    pub fn display_label(&self) -> Option<String> {
        self.net_label()?;
        self.name
            .as_deref()
            .or(self.value.as_deref())
            .map(|s| s.trim().to_string())
    }

    pub fn pin_positions(&self) -> Vec<Point> {
        self.pins.iter().map(Pin::position).collect()
    }

    pub fn pin_bounds(&self) -> Option<Bounds> {
        let positions = self.pin_positions();
        Bounds::from_points(positions.iter())
    }

    /// Average of all pin positions.
    pub fn pin_centroid(&self) -> Option<Point> {
        if self.pins.is_empty() {
            return None;
        }
        let n = self.pins.len() as f64;
        let (sx, sy) = self
            .pins
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }

    /// Axis and span when the component has two or more pins lying exactly
    /// on one horizontal or vertical line.
    pub fn collinear_pin_axis(&self) -> Option<(Axis, Bounds)> {
        if self.pins.len() < 2 {
            return None;
        }
        let bounds = self.pin_bounds()?;
        let first = &self.pins[0];
        if self.pins.iter().all(|p| p.y == first.y) && bounds.width() > 0.0 {
            Some((Axis::Horizontal, bounds))
        } else if self.pins.iter().all(|p| p.x == first.x) && bounds.height() > 0.0 {
            Some((Axis::Vertical, bounds))
        } else {
            None
        }
    }
}

/// A wire polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: String,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl Wire {
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }

    /// Wire with a freshly minted id.
    pub fn with_fresh_id(points: Vec<Point>) -> Self {
        Self::new(fresh_wire_id(), points)
    }

    /// Fewer than two distinct points: no length, so no connectivity.
    pub fn is_degenerate(&self) -> bool {
        match self.points.first() {
            Some(first) => self.points.iter().all(|p| p.key() == first.key()),
            None => true,
        }
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn endpoint_keys(&self) -> Option<(PointKey, PointKey)> {
        Some((self.first()?.key(), self.last()?.key()))
    }

    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }
}

/// Mint a new wire id.
pub fn fresh_wire_id() -> String {
    format!("w-{}", uuid::Uuid::new_v4().simple())
}

/// The editable schematic: components and wires.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub wires: Vec<Wire>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_wire(mut self, wire: Wire) -> Self {
        self.wires.push(wire);
        self
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn wire(&self, id: &str) -> Option<&Wire> {
        self.wires.iter().find(|w| w.id == id)
    }

    pub fn wire_mut(&mut self, id: &str) -> Option<&mut Wire> {
        self.wires.iter_mut().find(|w| w.id == id)
    }

    /// Pins of electrical components, paired with their owner.
    pub fn electrical_pins(&self) -> impl Iterator<Item = (&Component, &Pin)> {
        self.components
            .iter()
            .filter(|c| c.is_electrical())
            .flat_map(|c| c.pins.iter().map(move |p| (c, p)))
    }

    pub fn pin_keys(&self) -> std::collections::HashSet<PointKey> {
        self.electrical_pins().map(|(_, p)| p.position().key()).collect()
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
