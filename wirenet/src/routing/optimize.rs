//! Opt-in path optimizer.
//!
//! Splits a path at its anchors and replaces each short sub-path with the
//! cheapest orthogonal alternative that stays clear of obstacles.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::simplify::dedupe;
use super::Keepout;
use crate::model::{bend_count, path_length, segment_axis, Axis, Point, PointKey};
use crate::obstacles::Obstacle;

const BEND_WEIGHT: f64 = 1e8;
const LENGTH_WEIGHT: f64 = 1e4;

/// Preferred axis for the first and last segment of a path, typically the
/// direction a pin leaves its component body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointAxisHints {
    pub start: Option<Axis>,
    pub end: Option<Axis>,
}

pub fn optimize(
    points: &[Point],
    anchored: &HashSet<PointKey>,
    obstacles: &[Obstacle],
    hints: EndpointAxisHints,
) -> Vec<Point> {
    optimize_avoiding(points, anchored, obstacles, hints, &Keepout::default())
}

/// Like [`optimize`], but new corners never land on `keepout` geometry.
pub fn optimize_avoiding(
    points: &[Point],
    anchored: &HashSet<PointKey>,
    obstacles: &[Obstacle],
    hints: EndpointAxisHints,
    keepout: &Keepout,
) -> Vec<Point> {
    let pts = dedupe(points);
    if pts.len() < 2 {
        return pts;
    }
    let last = pts.len() - 1;
    let mut cuts: Vec<usize> = (0..=last)
        .filter(|&i| i == 0 || i == last || anchored.contains(&pts[i].key()))
        .collect();
    cuts.dedup();

    let mut out: Vec<Point> = vec![pts[0]];
    for pair in cuts.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        let original = &pts[i..=j];
        let chosen = if original.len() <= 3 {
            let scope = SubPath {
                at_start: i == 0,
                at_end: j == last,
                hints,
            };
            best_candidate(original, &scope, obstacles, keepout)
        } else {
            original.to_vec()
        };
        out.extend(chosen.into_iter().skip(1));
    }
    dedupe(&out)
}

struct SubPath {
    at_start: bool,
    at_end: bool,
    hints: EndpointAxisHints,
}

impl SubPath {
    fn axis_mismatch(&self, candidate: &[Point]) -> usize {
        let mut mismatch = 0;
        if let (true, Some(hint)) = (self.at_start, self.hints.start) {
            if first_axis(candidate) != Some(hint) {
                mismatch += 1;
            }
        }
        if let (true, Some(hint)) = (self.at_end, self.hints.end) {
            if last_axis(candidate) != Some(hint) {
                mismatch += 1;
            }
        }
        mismatch
    }
}

fn first_axis(points: &[Point]) -> Option<Axis> {
    points.windows(2).find_map(|w| segment_axis(&w[0], &w[1]))
}

fn last_axis(points: &[Point]) -> Option<Axis> {
    points.windows(2).rev().find_map(|w| segment_axis(&w[0], &w[1]))
}

fn best_candidate(
    original: &[Point],
    scope: &SubPath,
    obstacles: &[Obstacle],
    keepout: &Keepout,
) -> Vec<Point> {
    let p = original[0];
    let q = original[original.len() - 1];
    let mut candidates: Vec<Vec<Point>> = Vec::with_capacity(4);
    if p.x == q.x || p.y == q.y {
        candidates.push(vec![p, q]);
    }
    for corner in [Point::new(q.x, p.y), Point::new(p.x, q.y)] {
        if corner != p && corner != q {
            candidates.push(vec![p, corner, q]);
        }
    }

    let mut best: Option<(f64, Vec<Point>)> = None;
    let consider = original.iter().copied().collect::<Vec<_>>();
    for candidate in candidates.into_iter().chain(std::iter::once(consider)) {
        let is_original = candidate.as_slice() == original;
        if !is_original && !admissible(&candidate, original, obstacles, keepout) {
            continue;
        }
        if !candidate.windows(2).all(|w| segment_axis(&w[0], &w[1]).is_some()) {
            continue;
        }
        let score = (bend_count(&candidate) + scope.axis_mismatch(&candidate)) as f64
            * BEND_WEIGHT
            + path_length(&candidate) * LENGTH_WEIGHT
            + displacement(&candidate, original);
        let better = match &best {
            None => true,
            Some((s, b)) => match score.partial_cmp(s) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => lexical(&candidate, b) == Ordering::Less,
                _ => false,
            },
        };
        if better {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, c)| c).unwrap_or_else(|| original.to_vec())
}

fn admissible(candidate: &[Point], original: &[Point], obstacles: &[Obstacle], keepout: &Keepout) -> bool {
    let clear = candidate.windows(2).all(|w| {
        !obstacles
            .iter()
            .any(|o| o.bounds.intersects_segment(&w[0], &w[1]))
            && !keepout.blocks_leg(&w[0], &w[1])
    });
    clear
        && candidate[1..candidate.len() - 1]
            .iter()
            .filter(|c| !original.contains(c))
            .all(|c| !keepout.blocks_point(c))
}

/// How far the candidate's corners moved from the original interior points.
fn displacement(candidate: &[Point], original: &[Point]) -> f64 {
    let inner = &original[1..original.len() - 1];
    if inner.is_empty() {
        return 0.0;
    }
    candidate[1..candidate.len() - 1]
        .iter()
        .map(|c| {
            inner
                .iter()
                .map(|o| c.manhattan(o))
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

fn lexical(a: &[Point], b: &[Point]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| p.lexical_cmp(q))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}
