//! Redundant point removal.

use std::collections::HashSet;

use crate::model::{is_collinear, Point, PointKey};

/// Drop consecutive duplicates.
pub fn dedupe(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() != Some(p) {
            out.push(*p);
        }
    }
    out
}

/// Remove consecutive duplicates, then every interior point that shares its
/// x (or its y) with both neighbours, unless the point is anchored.
/// Endpoints are always kept.
pub fn simplify(points: &[Point], anchored: &HashSet<PointKey>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in dedupe(points) {
        while out.len() >= 2 {
            let mid = out[out.len() - 1];
            let prev = out[out.len() - 2];
            if is_collinear(&prev, &mid, &p) && !anchored.contains(&mid.key()) {
                out.pop();
            } else {
                break;
            }
        }
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}
