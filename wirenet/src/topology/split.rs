//! Cutting wires at overlaps and junctions.

use std::collections::{HashMap, HashSet};

use super::index::{find_contacts, overlap_boundaries};
use crate::model::{fresh_wire_id, point_strictly_inside_segment, Point, PointKey, Wire};

/// Cut wires so that collinear overlaps between different wires become
/// shared vertices, and emit every overlapped segment exactly once.
///
/// The first piece of a wire keeps its id; later pieces get fresh ids.
/// A segment already emitted by an earlier wire ends the current piece.
pub fn split_at_overlaps(wires: &[Wire]) -> Vec<Wire> {
    let mut forced: HashMap<usize, Vec<Point>> = HashMap::new();
    for contact in find_contacts(wires) {
        forced.entry(contact.wire).or_default().push(contact.point);
    }
    for (wire, point) in overlap_boundaries(wires) {
        forced.entry(wire).or_default().push(point);
    }

    let mut seen: HashSet<(PointKey, PointKey)> = HashSet::new();
    let mut out = Vec::with_capacity(wires.len());
    for (wi, wire) in wires.iter().enumerate() {
        if wire.is_degenerate() {
            continue;
        }
        let cuts = forced.get(&wi).map(Vec::as_slice).unwrap_or(&[]);
        let points = insert_points(&wire.points, cuts);
        let cut_keys: HashSet<PointKey> = cuts.iter().map(Point::key).collect();
        let pieces = walk_pieces(&points, |k| cut_keys.contains(k), Some(&mut seen));
        emit(&wire.id, pieces, &mut out);
    }
    out
}

/// Cut every wire at interior vertices that are junctions.
pub fn split_at_junctions(wires: &[Wire], junctions: &HashSet<PointKey>) -> Vec<Wire> {
    let mut out = Vec::with_capacity(wires.len());
    for wire in wires {
        if wire.is_degenerate() {
            continue;
        }
        let pieces = walk_pieces(&wire.points, |k| junctions.contains(k), None);
        emit(&wire.id, pieces, &mut out);
    }
    out
}

fn emit(id: &str, pieces: Vec<Vec<Point>>, out: &mut Vec<Wire>) {
    for (i, points) in pieces.into_iter().enumerate() {
        let id = if i == 0 { id.to_string() } else { fresh_wire_id() };
        out.push(Wire::new(id, points));
    }
}

/// Insert `extra` points lying strictly inside segments of `points`, ordered
/// along each segment.
fn insert_points(points: &[Point], extra: &[Point]) -> Vec<Point> {
    if extra.is_empty() {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len() + extra.len());
    for (i, a) in points.iter().enumerate() {
        out.push(*a);
        let Some(b) = points.get(i + 1) else {
            continue;
        };
        let mut inside: Vec<Point> = extra
            .iter()
            .filter(|p| point_strictly_inside_segment(p, a, b))
            .copied()
            .collect();
        inside.sort_by(|u, v| a.distance_sq(u).total_cmp(&a.distance_sq(v)));
        inside.dedup();
        out.extend(inside);
    }
    out
}

fn segment_key(a: &Point, b: &Point) -> (PointKey, PointKey) {
    let (ka, kb) = (a.key(), b.key());
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Walk a polyline and cut it into pieces at interior vertices matching
/// `is_cut`. With `seen`, segments already emitted are skipped and end the
/// current piece.
fn walk_pieces(
    points: &[Point],
    is_cut: impl Fn(&PointKey) -> bool,
    mut seen: Option<&mut HashSet<(PointKey, PointKey)>>,
) -> Vec<Vec<Point>> {
    let mut pieces = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let last = points.len().saturating_sub(1);
    for (i, w) in points.windows(2).enumerate() {
        let (a, b) = (w[0], w[1]);
        if a == b {
            continue;
        }
        if let Some(seen) = seen.as_deref_mut() {
            if !seen.insert(segment_key(&a, &b)) {
                if current.len() >= 2 {
                    pieces.push(std::mem::take(&mut current));
                }
                current.clear();
                continue;
            }
        }
        if current.is_empty() {
            current.push(a);
        }
        current.push(b);
        if i + 1 < last && is_cut(&b.key()) {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}
