//! Joining wires through two-way junctions.

use std::collections::{HashMap, HashSet};

use super::index::PointIndex;
use crate::disjoint_set::DisjointSet;
use crate::model::{Point, PointKey, Wire};
use crate::routing::simplify;

/// Upper bound on merge sweeps.
pub const MAX_MERGE_ITERATIONS: usize = 20;

/// Concatenate pairs of wires that meet end to end at a point of degree two
/// which is not a pin. Each sweep merges every available pair; absorbed
/// wires are aliased to their absorber so chains collapse in one sweep.
/// Returns whether anything was merged.
pub fn merge_two_way_junctions(wires: &mut Vec<Wire>, pins: &[PointKey]) -> bool {
    merge_with_budget(wires, pins, MAX_MERGE_ITERATIONS)
}

pub(crate) fn merge_with_budget(wires: &mut Vec<Wire>, pins: &[PointKey], sweeps: usize) -> bool {
    let mut merged_any = false;
    for _ in 0..sweeps {
        if !merge_sweep(wires, pins) {
            return merged_any;
        }
        merged_any = true;
    }
    if !two_way_candidates(wires, pins).is_empty() {
        tracing::warn!(
            "merge_two_way_junctions: {} sweeps exhausted, merges still pending",
            sweeps
        );
    }
    merged_any
}

/// Degree-two, non-pin points that end exactly two distinct wires.
fn two_way_candidates(wires: &[Wire], pins: &[PointKey]) -> Vec<(Point, usize, usize)> {
    let index = PointIndex::build(wires, pins);
    let mut ends: HashMap<PointKey, Vec<usize>> = HashMap::new();
    for (wi, wire) in wires.iter().enumerate() {
        if let (Some(first), Some(last)) = (wire.first(), wire.last()) {
            if wire.points.len() < 2 {
                continue;
            }
            ends.entry(first.key()).or_default().push(wi);
            ends.entry(last.key()).or_default().push(wi);
        }
    }
    let mut candidates: Vec<(Point, usize, usize)> = ends
        .into_iter()
        .filter(|(key, owners)| {
            owners.len() == 2
                && owners[0] != owners[1]
                && index.degree(key) == 2
                && !index.is_pin(key)
        })
        .map(|(key, owners)| (key.point(), owners[0].min(owners[1]), owners[0].max(owners[1])))
        .collect();
    candidates.sort_by(|a, b| a.0.lexical_cmp(&b.0));
    candidates
}

fn merge_sweep(wires: &mut Vec<Wire>, pins: &[PointKey]) -> bool {
    let candidates = two_way_candidates(wires, pins);
    if candidates.is_empty() {
        return false;
    }
    let index = PointIndex::build(wires, pins);
    let mut anchored: HashSet<PointKey> = index.junctions();
    anchored.extend(pins.iter().copied());

    let mut paths: Vec<Option<Vec<Point>>> = wires.iter().map(|w| Some(w.points.clone())).collect();
    let mut alias: DisjointSet<usize> = DisjointSet::new();
    for i in 0..wires.len() {
        alias.insert(i);
    }

    let mut merged = 0;
    for (at, left, right) in candidates {
        let keep = alias.find(&left);
        let absorb = alias.find(&right);
        if keep == absorb {
            // Joining would close a loop onto itself.
            continue;
        }
        let (Some(head), Some(tail)) = (paths[keep].take(), paths[absorb].take()) else {
            continue;
        };
        match join_at(head, tail, &at) {
            Ok(joined) => {
                paths[keep] = Some(joined);
                alias.union(&absorb, &keep);
                merged += 1;
            }
            Err((head, tail)) => {
                paths[keep] = Some(head);
                paths[absorb] = Some(tail);
            }
        }
    }
    if merged == 0 {
        return false;
    }

    let old = std::mem::take(wires);
    *wires = old
        .into_iter()
        .zip(paths)
        .filter_map(|(wire, path)| {
            path.map(|points| Wire::new(wire.id, simplify(&points, &anchored)))
        })
        .collect();
    tracing::debug!("merge_two_way_junctions: merged {} wire pairs", merged);
    true
}

/// Orient `head` to end at `at` and `tail` to start there, then concatenate.
fn join_at(
    mut head: Vec<Point>,
    mut tail: Vec<Point>,
    at: &Point,
) -> Result<Vec<Point>, (Vec<Point>, Vec<Point>)> {
    if head.last() != Some(at) {
        head.reverse();
    }
    if tail.first() != Some(at) {
        tail.reverse();
    }
    if head.last() != Some(at) || tail.first() != Some(at) {
        return Err((head, tail));
    }
    head.extend(tail.into_iter().skip(1));
    Ok(head)
}
