//! Core engine API shared by the CLI and embedding applications.
//! No I/O besides the model load/save helpers.

use std::path::Path;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::model::{is_collinear, is_orthogonal, Model, Point};
use crate::netlist::{build_nets, ground_status, topology_signature, GroundStatus, Net};
use crate::topology::{normalize_all, overlap_boundaries, pin_points, NormalizeReport, PointIndex};

#[derive(Debug, thiserror::Error)]
pub enum WireNetError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Unknown wire: {0}")]
    UnknownWire(String),
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for WireNetError {
    fn from(e: serde_json::Error) -> Self {
        WireNetError::Parse(e.to_string())
    }
}

/// Why a guarded transform was refused. The model is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("transform would change which pins share a net")]
    TopologyMismatch,
    #[error("model has no wires to transform")]
    NoTargetWires,
    #[error("model has nothing to transform")]
    NoTargets,
}

impl TransformError {
    pub fn reason(&self) -> &'static str {
        match self {
            TransformError::TopologyMismatch => "topology-mismatch",
            TransformError::NoTargetWires => "no-target-wires",
            TransformError::NoTargets => "no-targets",
        }
    }
}

impl Serialize for TransformError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TransformError", 2)?;
        s.serialize_field("ok", &false)?;
        s.serialize_field("reason", self.reason())?;
        s.end()
    }
}

/// Engine tunables. Loadable from JSON; missing fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub grid_size: f64,
    pub node_hit_radius: f64,
    pub wire_hit_radius: f64,
    /// Run the path optimizer as part of normalization.
    pub optimize_paths: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            node_hit_radius: 12.0,
            wire_hit_radius: 18.0,
            optimize_paths: false,
        }
    }
}

impl EngineOptions {
    pub fn with_grid(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Gap kept between wires and unrelated component bodies.
    pub fn clearance(&self) -> f64 {
        (0.5 * self.grid_size).max(10.0)
    }

    pub fn pass_through_padding(&self) -> f64 {
        0.3 * self.grid_size
    }

    pub fn component_hit_radius(&self) -> f64 {
        (2.0 * self.grid_size).max(40.0)
    }

    pub fn load(path: &Path) -> Result<Self, WireNetError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One finding of [`WireNetCore::check`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIssue {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wire: Option<String>,
}

impl CheckIssue {
    fn new(rule_id: &str, severity: Severity, message: String, wire: Option<&str>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message,
            wire: wire.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckStats {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// Invariant report for a model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub issues: Vec<CheckIssue>,
    pub stats: CheckStats,
    pub ground: GroundStatus,
    pub net_count: usize,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn total_issues(&self) -> usize {
        self.stats.errors + self.stats.warnings + self.stats.info
    }
}

fn issues_to_stats(issues: &[CheckIssue]) -> CheckStats {
    let mut stats = CheckStats::default();
    for i in issues {
        match i.severity {
            Severity::Error => stats.errors += 1,
            Severity::Warning => stats.warnings += 1,
            Severity::Info => stats.info += 1,
        }
    }
    stats
}

pub fn load_model(path: &Path) -> Result<Model, WireNetError> {
    let text = std::fs::read_to_string(path)?;
    Ok(Model::from_json_str(&text)?)
}

pub fn save_model(path: &Path, model: &Model) -> Result<(), WireNetError> {
    let text = model.to_json_string()?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Engine entry points used by the CLI.
pub struct WireNetCore;

impl WireNetCore {
    pub fn normalize(model: &mut Model, options: &EngineOptions) -> NormalizeReport {
        normalize_all(model, options)
    }

    pub fn nets(model: &Model) -> Vec<Net> {
        build_nets(model)
    }

    /// Normalize and optimize a copy of `model`; refuse if any pin would
    /// change nets.
    pub fn simplify_model(model: &Model, options: &EngineOptions) -> Result<Model, TransformError> {
        if model.wires.is_empty() {
            return Err(TransformError::NoTargetWires);
        }
        let options = EngineOptions {
            optimize_paths: true,
            ..options.clone()
        };
        let mut candidate = model.clone();
        normalize_all(&mut candidate, &options);
        guard(model, candidate)
    }

    /// Move components and wires onto a new grid; refuse if any pin would
    /// change nets.
    pub fn regrid_model(
        model: &Model,
        grid: f64,
        options: &EngineOptions,
    ) -> Result<Model, TransformError> {
        if !(grid > 0.0) || (model.components.is_empty() && model.wires.is_empty()) {
            return Err(TransformError::NoTargets);
        }
        let options = options.clone().with_grid(grid);
        let mut candidate = model.clone();
        for component in &mut candidate.components {
            let Some(first) = component.pins.first().map(|p| p.position()) else {
                continue;
            };
            let target = first.snapped(grid);
            let (dx, dy) = (target.x - first.x, target.y - first.y);
            for pin in &mut component.pins {
                let moved = pin.position().offset(dx, dy);
                pin.set_position(moved);
            }
        }
        for wire in &mut candidate.wires {
            for p in &mut wire.points {
                *p = p.snapped(grid);
            }
        }
        normalize_all(&mut candidate, &options);
        guard(model, candidate)
    }

    pub fn check(model: &Model, options: &EngineOptions) -> CheckReport {
        let mut issues = Vec::new();
        let pins = pin_points(model);
        let anchored = PointIndex::build(&model.wires, &pins).anchored_keys();

        for wire in &model.wires {
            let id = Some(wire.id.as_str());
            if wire.is_degenerate() {
                issues.push(CheckIssue::new(
                    "degenerate-wire",
                    Severity::Warning,
                    format!("wire {} has fewer than two distinct points", wire.id),
                    id,
                ));
                continue;
            }
            for (a, b) in wire.segments() {
                if a == b {
                    issues.push(CheckIssue::new(
                        "duplicate-point",
                        Severity::Warning,
                        format!("wire {} repeats point ({}, {})", wire.id, a.x, a.y),
                        id,
                    ));
                } else if !is_orthogonal(a, b) {
                    issues.push(CheckIssue::new(
                        "orthogonality",
                        Severity::Error,
                        format!(
                            "wire {} has a diagonal segment ({}, {}) -> ({}, {})",
                            wire.id, a.x, a.y, b.x, b.y
                        ),
                        id,
                    ));
                }
            }
            let redundant = wire
                .points
                .windows(3)
                .filter(|w| w[0] != w[1] && w[1] != w[2])
                .filter(|w| is_collinear(&w[0], &w[1], &w[2]) && !anchored.contains(&w[1].key()))
                .count();
            if redundant > 0 {
                issues.push(CheckIssue::new(
                    "redundant-point",
                    Severity::Info,
                    format!("wire {} has {} removable points", wire.id, redundant),
                    id,
                ));
            }
        }

        let overlaps = overlap_boundaries(&model.wires);
        if !overlaps.is_empty() {
            issues.push(CheckIssue::new(
                "overlap",
                Severity::Warning,
                format!("{} collinear overlap boundaries between wires", overlaps.len() / 4),
                None,
            ));
        }

        let mut normalized = model.clone();
        normalize_all(&mut normalized, options);
        if !same_geometry(&normalized, model) {
            issues.push(CheckIssue::new(
                "normalized",
                Severity::Info,
                "model is not in normalized form".to_string(),
                None,
            ));
        }

        let nets = build_nets(model);
        let ground = ground_status(&nets);
        match ground {
            GroundStatus::Present => {}
            GroundStatus::Floating => issues.push(CheckIssue::new(
                "ground",
                Severity::Warning,
                "ground marker is not connected to any device".to_string(),
                None,
            )),
            GroundStatus::Missing => issues.push(CheckIssue::new(
                "ground",
                Severity::Warning,
                "circuit has no ground reference".to_string(),
                None,
            )),
        }

        let stats = issues_to_stats(&issues);
        CheckReport {
            issues,
            stats,
            ground,
            net_count: nets.len(),
        }
    }
}

/// Wire geometry equal regardless of wire ids.
fn same_geometry(a: &Model, b: &Model) -> bool {
    let shapes = |m: &Model| {
        let mut v: Vec<Vec<Point>> = m.wires.iter().map(|w| w.points.clone()).collect();
        v.sort_by(|x, y| {
            x.iter()
                .zip(y.iter())
                .map(|(p, q)| p.lexical_cmp(q))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| x.len().cmp(&y.len()))
        });
        v
    };
    shapes(a) == shapes(b)
}

fn guard(original: &Model, candidate: Model) -> Result<Model, TransformError> {
    if topology_signature(original) == topology_signature(&candidate) {
        Ok(candidate)
    } else {
        tracing::debug!("guarded transform discarded: topology changed");
        Err(TransformError::TopologyMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentKind, Wire};

    fn two_resistors() -> Model {
        Model::new()
            .with_component(Component::two_pin(
                "R1",
                ComponentKind::Resistor,
                Point::new(0.0, 0.0),
                Point::new(40.0, 0.0),
            ))
            .with_component(Component::two_pin(
                "R2",
                ComponentKind::Resistor,
                Point::new(100.0, 40.0),
                Point::new(140.0, 40.0),
            ))
    }

    #[test]
    fn test_options_defaults_and_derived_values() {
        let options: EngineOptions = serde_json::from_str(r#"{"gridSize": 40}"#).unwrap();
        assert_eq!(options.grid_size, 40.0);
        assert_eq!(options.node_hit_radius, 12.0);
        assert_eq!(options.clearance(), 20.0);
        assert_eq!(options.component_hit_radius(), 80.0);
        assert_eq!(EngineOptions::default().clearance(), 10.0);
        assert_eq!(EngineOptions::default().component_hit_radius(), 40.0);
    }

    #[test]
    fn test_transform_error_serializes_reason() {
        let json = serde_json::to_value(TransformError::TopologyMismatch).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "reason": "topology-mismatch"}));
        assert_eq!(TransformError::NoTargetWires.reason(), "no-target-wires");
    }

    #[test]
    fn test_simplify_requires_wires() {
        let err = WireNetCore::simplify_model(&two_resistors(), &EngineOptions::default()).unwrap_err();
        assert_eq!(err, TransformError::NoTargetWires);
    }

    #[test]
    fn test_simplify_keeps_topology() {
        let model = two_resistors().with_wire(Wire::new(
            "W1",
            vec![
                Point::new(40.0, 0.0),
                Point::new(60.0, 0.0),
                Point::new(60.0, 80.0),
                Point::new(100.0, 80.0),
                Point::new(100.0, 40.0),
            ],
        ));
        let simplified = WireNetCore::simplify_model(&model, &EngineOptions::default()).unwrap();
        assert_eq!(topology_signature(&simplified), topology_signature(&model));
        assert!(simplified.wires[0].points.len() <= model.wires[0].points.len());
    }

    #[test]
    fn test_regrid_refuses_to_break_connections() {
        // Pin spacing of 30 cannot land both pins of R1 on a 20 grid while
        // the wire end is snapped independently.
        let model = Model::new()
            .with_component(Component::two_pin(
                "R1",
                ComponentKind::Resistor,
                Point::new(0.0, 0.0),
                Point::new(30.0, 0.0),
            ))
            .with_component(Component::two_pin(
                "R2",
                ComponentKind::Resistor,
                Point::new(30.0, 60.0),
                Point::new(90.0, 60.0),
            ))
            .with_wire(Wire::new("W1", vec![Point::new(30.0, 0.0), Point::new(30.0, 60.0)]));
        let err = WireNetCore::regrid_model(&model, 20.0, &EngineOptions::default()).unwrap_err();
        assert_eq!(err, TransformError::TopologyMismatch);
        assert_eq!(
            WireNetCore::regrid_model(&Model::new(), 20.0, &EngineOptions::default()).unwrap_err(),
            TransformError::NoTargets
        );
    }

    #[test]
    fn test_check_flags_diagonals_and_missing_ground() {
        let model = two_resistors()
            .with_wire(Wire::new("W1", vec![Point::new(40.0, 0.0), Point::new(100.0, 40.0)]));
        let report = WireNetCore::check(&model, &EngineOptions::default());
        assert!(report.has_errors());
        assert_eq!(report.ground, GroundStatus::Missing);
        assert!(report.issues.iter().any(|i| i.rule_id == "orthogonality"));
        assert!(report.issues.iter().any(|i| i.rule_id == "normalized"));
    }
}
