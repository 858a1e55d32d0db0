//! Point and segment indices over the wire set.
//!
//! `PointIndex` answers degree and junction questions; `find_contacts` and
//! `overlap_boundaries` locate the places where one wire touches another
//! without sharing a vertex. Both the normalizer and the net builder rely on
//! these so that what normalization materializes is exactly what the net
//! builder already treats as connected.

use std::collections::{HashMap, HashSet};

use crate::model::{coord_key, point_strictly_inside_segment, segment_axis, Axis, Point, PointKey, Wire};

/// Per-point incidence counts.
#[derive(Debug, Clone, Default)]
pub struct PointIndex {
    degree: HashMap<PointKey, usize>,
    pins: HashMap<PointKey, usize>,
    endpoints: HashSet<PointKey>,
}

impl PointIndex {
    /// Degree of a point = straight segment ends touching it (an interior
    /// vertex counts twice) plus pins located on it.
    pub fn build(wires: &[Wire], pins: &[PointKey]) -> Self {
        let mut index = PointIndex::default();
        for wire in wires {
            if wire.is_degenerate() {
                continue;
            }
            for (a, b) in wire.segments() {
                if a == b {
                    continue;
                }
                *index.degree.entry(a.key()).or_insert(0) += 1;
                *index.degree.entry(b.key()).or_insert(0) += 1;
            }
            if let Some((first, last)) = wire.endpoint_keys() {
                index.endpoints.insert(first);
                index.endpoints.insert(last);
            }
        }
        for key in pins {
            *index.degree.entry(*key).or_insert(0) += 1;
            *index.pins.entry(*key).or_insert(0) += 1;
        }
        index
    }

    pub fn degree(&self, key: &PointKey) -> usize {
        self.degree.get(key).copied().unwrap_or(0)
    }

    pub fn is_pin(&self, key: &PointKey) -> bool {
        self.pins.contains_key(key)
    }

    pub fn is_junction(&self, key: &PointKey) -> bool {
        self.degree(key) >= 3
    }

    pub fn junctions(&self) -> HashSet<PointKey> {
        self.degree
            .iter()
            .filter(|(_, &d)| d >= 3)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Points simplification must keep: pins, junctions and wire endpoints.
    pub fn anchored_keys(&self) -> HashSet<PointKey> {
        let mut anchored = self.junctions();
        anchored.extend(self.pins.keys().copied());
        anchored.extend(self.endpoints.iter().copied());
        anchored
    }
}

/// Reference to one segment of one wire.
#[derive(Debug, Clone, Copy)]
pub struct SegmentRef {
    pub wire: usize,
    pub segment: usize,
    pub a: Point,
    pub b: Point,
}

/// Orthogonal segments bucketed by the line they lie on.
#[derive(Debug, Default)]
pub struct SegmentBuckets {
    horizontal: HashMap<u64, Vec<SegmentRef>>,
    vertical: HashMap<u64, Vec<SegmentRef>>,
}

impl SegmentBuckets {
    pub fn build(wires: &[Wire]) -> Self {
        let mut buckets = SegmentBuckets::default();
        for (wi, wire) in wires.iter().enumerate() {
            for (si, (a, b)) in wire.segments().enumerate() {
                let seg = SegmentRef {
                    wire: wi,
                    segment: si,
                    a: *a,
                    b: *b,
                };
                match segment_axis(a, b) {
                    Some(Axis::Horizontal) => {
                        buckets.horizontal.entry(coord_key(a.y)).or_default().push(seg)
                    }
                    Some(Axis::Vertical) => {
                        buckets.vertical.entry(coord_key(a.x)).or_default().push(seg)
                    }
                    None => {}
                }
            }
        }
        buckets
    }

    /// Segments lying on the horizontal or vertical line through `p`.
    pub fn on_lines_through(&self, p: &Point) -> impl Iterator<Item = &SegmentRef> {
        self.horizontal
            .get(&coord_key(p.y))
            .into_iter()
            .flatten()
            .chain(self.vertical.get(&coord_key(p.x)).into_iter().flatten())
    }

    pub fn lines(&self) -> impl Iterator<Item = &Vec<SegmentRef>> {
        self.horizontal.values().chain(self.vertical.values())
    }
}

/// A vertex of one wire touching the open interior of another wire's segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Wire whose segment is touched.
    pub wire: usize,
    pub segment: usize,
    pub point: Point,
    /// Wire owning the touching vertex.
    pub from_wire: usize,
}

/// Wire endpoints, and vertices running collinear with the touched segment,
/// that land strictly inside another wire's segment. Perpendicular pass-through
/// vertices are not contacts.
pub fn find_contacts(wires: &[Wire]) -> Vec<Contact> {
    let buckets = SegmentBuckets::build(wires);
    let mut contacts = Vec::new();
    for (ai, wire) in wires.iter().enumerate() {
        if wire.is_degenerate() {
            continue;
        }
        let n = wire.points.len();
        for (i, p) in wire.points.iter().enumerate() {
            let is_end = i == 0 || i == n - 1;
            let before = if i > 0 { segment_axis(&wire.points[i - 1], p) } else { None };
            let after = if i + 1 < n { segment_axis(p, &wire.points[i + 1]) } else { None };
            for seg in buckets.on_lines_through(p) {
                if seg.wire == ai || !point_strictly_inside_segment(p, &seg.a, &seg.b) {
                    continue;
                }
                let axis = segment_axis(&seg.a, &seg.b);
                if is_end || before == axis || after == axis {
                    contacts.push(Contact {
                        wire: seg.wire,
                        segment: seg.segment,
                        point: *p,
                        from_wire: ai,
                    });
                }
            }
        }
    }
    contacts
}

/// End points of every positive-length collinear overlap between segments of
/// different wires, reported for both wires involved.
pub fn overlap_boundaries(wires: &[Wire]) -> Vec<(usize, Point)> {
    let buckets = SegmentBuckets::build(wires);
    let mut out = Vec::new();
    for line in buckets.lines() {
        for (i, s) in line.iter().enumerate() {
            for t in &line[i + 1..] {
                if s.wire == t.wire {
                    continue;
                }
                let horizontal = s.a.y == s.b.y;
                let (s_lo, s_hi) = span(s, horizontal);
                let (t_lo, t_hi) = span(t, horizontal);
                let lo = s_lo.max(t_lo);
                let hi = s_hi.min(t_hi);
                if hi - lo <= 0.0 {
                    continue;
                }
                let at = |v: f64| {
                    if horizontal {
                        Point::new(v, s.a.y)
                    } else {
                        Point::new(s.a.x, v)
                    }
                };
                for p in [at(lo), at(hi)] {
                    out.push((s.wire, p));
                    out.push((t.wire, p));
                }
            }
        }
    }
    out
}

fn span(seg: &SegmentRef, horizontal: bool) -> (f64, f64) {
    if horizontal {
        (seg.a.x.min(seg.b.x), seg.a.x.max(seg.b.x))
    } else {
        (seg.a.y.min(seg.b.y), seg.a.y.max(seg.b.y))
    }
}

/// Insert every contact as a vertex of the wire it touches, keeping points
/// ordered along each segment. Returns the number of inserted points.
pub fn materialize_contacts(wires: &mut [Wire]) -> usize {
    let contacts = find_contacts(wires);
    if contacts.is_empty() {
        return 0;
    }
    let mut per_wire: HashMap<usize, HashMap<usize, Vec<Point>>> = HashMap::new();
    for c in &contacts {
        per_wire
            .entry(c.wire)
            .or_default()
            .entry(c.segment)
            .or_default()
            .push(c.point);
    }
    let mut inserted = 0;
    for (wi, by_segment) in per_wire {
        let old = std::mem::take(&mut wires[wi].points);
        let mut points = Vec::with_capacity(old.len() + by_segment.len());
        for (si, p) in old.iter().enumerate() {
            points.push(*p);
            if let (Some(cuts), Some(next)) = (by_segment.get(&si), old.get(si + 1)) {
                let mut cuts = cuts.clone();
                cuts.sort_by(|u, v| p.distance_sq(u).total_cmp(&p.distance_sq(v)));
                cuts.dedup_by(|u, v| u.key() == v.key());
                for c in cuts {
                    if c != *p && c != *next {
                        points.push(c);
                        inserted += 1;
                    }
                }
            }
        }
        wires[wi].points = points;
    }
    inserted
}
