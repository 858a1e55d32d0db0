//! Geometric Netlist Builder
//!
//! Derives nets from geometry: wire points, contacts between wires, and pins
//! sitting exactly on wire points are nodes of one undirected graph. Each
//! connected component is a provisional net; provisional nets carrying the
//! same `NET` label are then merged.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Dfs;

use super::{Net, PinRef};
use crate::disjoint_set::DisjointSet;
use crate::model::{Model, Point, PointKey};
use crate::topology::find_contacts;

/// Nets of a model plus point lookups into them.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub nets: Vec<Net>,
    net_of: HashMap<PointKey, usize>,
    group_of: HashMap<PointKey, usize>,
    group_components: Vec<HashSet<String>>,
}

impl Netlist {
    /// Net containing `p`, if `p` is a wire point or pin.
    pub fn net_at(&self, p: &Point) -> Option<&Net> {
        self.net_of.get(&p.key()).map(|&i| &self.nets[i])
    }

    /// Components wired to `p` through geometry alone; label unions are
    /// not followed.
    pub fn connected_component_ids(&self, p: &Point) -> HashSet<String> {
        self.group_of
            .get(&p.key())
            .map(|&g| self.group_components[g].clone())
            .unwrap_or_default()
    }
}

pub struct NetlistBuilder<'a> {
    model: &'a Model,
    graph: UnGraph<PointKey, ()>,
    nodes: HashMap<PointKey, NodeIndex>,
}

impl<'a> NetlistBuilder<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            model,
            graph: UnGraph::new_undirected(),
            nodes: HashMap::new(),
        }
    }

    fn node(&mut self, key: PointKey) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key);
        self.nodes.insert(key, idx);
        idx
    }

    pub fn build(mut self) -> Netlist {
        let model = self.model;

        // Step 1: Consecutive wire points
        for wire in model.wires.iter().filter(|w| !w.is_degenerate()) {
            let mut prev = self.node(wire.points[0].key());
            for p in &wire.points[1..] {
                let next = self.node(p.key());
                if next != prev {
                    self.graph.add_edge(prev, next, ());
                }
                prev = next;
            }
        }

        // Step 2: Contacts tie a vertex to the segment it lands on
        for contact in find_contacts(&model.wires) {
            let start = model.wires[contact.wire].points[contact.segment].key();
            let a = self.node(contact.point.key());
            let b = self.node(start);
            self.graph.add_edge(a, b, ());
        }

        // Step 3: Pins join by exact position; coincident pins share a node
        for (_, pin) in model.electrical_pins() {
            self.node(pin.position().key());
        }

        // Step 4: Flood fill into provisional groups
        let mut group_of_node: HashMap<NodeIndex, usize> = HashMap::new();
        let mut groups: Vec<Vec<PointKey>> = Vec::new();
        for start in self.graph.node_indices() {
            if group_of_node.contains_key(&start) {
                continue;
            }
            let g = groups.len();
            let mut members = Vec::new();
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(nx) = dfs.next(&self.graph) {
                group_of_node.insert(nx, g);
                members.push(self.graph[nx]);
            }
            groups.push(members);
        }
        let group_of: HashMap<PointKey, usize> = self
            .nodes
            .iter()
            .filter_map(|(k, nx)| group_of_node.get(nx).map(|&g| (*k, g)))
            .collect();

        // Step 5: Pins and labels per group
        let mut group_pins: Vec<Vec<PinRef>> = vec![Vec::new(); groups.len()];
        let mut group_labels: Vec<Vec<(String, String)>> = vec![Vec::new(); groups.len()];
        let mut group_components: Vec<HashSet<String>> = vec![HashSet::new(); groups.len()];
        for (component, pin) in model.electrical_pins() {
            let Some(&g) = group_of.get(&pin.position().key()) else {
                continue;
            };
            group_pins[g].push(PinRef::new(component, pin));
            group_components[g].insert(component.id.clone());
            if let (Some(norm), Some(display)) = (component.net_label(), component.display_label()) {
                group_labels[g].push((norm, display));
            }
        }

        // Step 6: Merge groups sharing a label
        let mut merged: DisjointSet<usize> = DisjointSet::new();
        let mut label_owner: HashMap<String, usize> = HashMap::new();
        for (g, labels) in group_labels.iter().enumerate() {
            merged.insert(g);
            for (norm, _) in labels {
                match label_owner.get(norm) {
                    Some(&other) => {
                        merged.union(&g, &other);
                    }
                    None => {
                        label_owner.insert(norm.clone(), g);
                    }
                }
            }
        }

        // Step 7: Assemble nets, ordered by their first node
        let mut nets: Vec<(Net, Vec<usize>)> = merged
            .groups()
            .into_iter()
            .map(|members| {
                let mut nodes: Vec<Point> = members
                    .iter()
                    .flat_map(|&g| groups[g].iter().map(|k| k.point()))
                    .collect();
                nodes.sort_by(|a, b| a.lexical_cmp(b));
                nodes.dedup();

                let mut pins: Vec<PinRef> =
                    members.iter().flat_map(|&g| group_pins[g].iter().cloned()).collect();
                pins.sort();
                pins.dedup();

                let mut seen = BTreeSet::new();
                let mut labels = Vec::new();
                for &g in &members {
                    for (norm, display) in &group_labels[g] {
                        if seen.insert(norm.clone()) {
                            labels.push(display.clone());
                        }
                    }
                }

                let grounded = pins.iter().any(PinRef::is_ground);
                let net = Net {
                    id: 0,
                    pins,
                    nodes,
                    labels,
                    grounded,
                };
                (net, members)
            })
            .collect();
        nets.sort_by(|(a, _), (b, _)| match (a.nodes.first(), b.nodes.first()) {
            (Some(p), Some(q)) => p.lexical_cmp(q),
            (x, y) => x.is_some().cmp(&y.is_some()),
        });

        let mut net_of_group: HashMap<usize, usize> = HashMap::new();
        for (i, (net, members)) in nets.iter_mut().enumerate() {
            net.id = i + 1;
            for &g in members.iter() {
                net_of_group.insert(g, i);
            }
        }
        let net_of = group_of
            .iter()
            .filter_map(|(k, g)| net_of_group.get(g).map(|&n| (*k, n)))
            .collect();

        Netlist {
            nets: nets.into_iter().map(|(net, _)| net).collect(),
            net_of,
            group_of,
            group_components,
        }
    }
}
