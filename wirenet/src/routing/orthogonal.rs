//! Diagonal repair.
//!
//! Interactive edits (dragging a component, moving a wire end) leave
//! diagonal segments behind. `ensure_orthogonal` turns every diagonal pair
//! back into Manhattan geometry without moving anchored points.

use std::collections::HashSet;

use super::simplify::dedupe;
use super::Keepout;
use crate::model::{is_orthogonal, snap_to_grid, Point, PointKey};

/// Iteration cap per point. Each iteration repairs one diagonal segment, so
/// this is a safety bound rather than a correctness requirement.
pub const ORTHOGONAL_ITERATION_FACTOR: usize = 3;

/// Make every segment axis-aligned. See [`ensure_orthogonal_avoiding`].
pub fn ensure_orthogonal(points: &[Point], anchored: &HashSet<PointKey>) -> Vec<Point> {
    ensure_orthogonal_avoiding(points, anchored, &Keepout::default(), 0.0)
}

/// Make every segment axis-aligned.
///
/// For a diagonal pair `a-b`, an unanchored interior neighbour is slid along
/// the axis of its other segment when that fixes the pair (`b` first, then
/// `a`). Otherwise a corner is inserted, by default on `a`'s row and `b`'s
/// column. When `keepout` blocks both single corners, a two-corner step
/// through an intermediate column or row is used instead, searched outward
/// from the midpoint in `grid` steps. Moved or inserted points never land on
/// `keepout` geometry when an alternative exists.
pub fn ensure_orthogonal_avoiding(
    points: &[Point],
    anchored: &HashSet<PointKey>,
    keepout: &Keepout,
    grid: f64,
) -> Vec<Point> {
    let budget = ORTHOGONAL_ITERATION_FACTOR * points.len().max(1);
    ensure_orthogonal_with_budget(points, anchored, keepout, grid, budget)
}

pub(crate) fn ensure_orthogonal_with_budget(
    points: &[Point],
    anchored: &HashSet<PointKey>,
    keepout: &Keepout,
    grid: f64,
    budget: usize,
) -> Vec<Point> {
    let mut pts = dedupe(points);
    let movable = |p: &Point| !anchored.contains(&p.key());
    let mut iterations = 0;
    let mut i = 0;

    while i + 1 < pts.len() {
        let a = pts[i];
        let b = pts[i + 1];
        if is_orthogonal(&a, &b) {
            i += 1;
            continue;
        }
        if iterations >= budget {
            tracing::warn!(
                "ensure_orthogonal: iteration budget {} exhausted, leaving diagonal segments",
                budget
            );
            break;
        }
        iterations += 1;

        // Slide b along its outgoing segment.
        if i + 2 < pts.len() && movable(&b) {
            let c = pts[i + 2];
            let candidate = if b.x == c.x && b.y != c.y {
                Some(Point::new(b.x, a.y))
            } else if b.y == c.y && b.x != c.x {
                Some(Point::new(a.x, b.y))
            } else {
                None
            };
            if let Some(nb) = candidate.filter(|p| keepout.allows_corner(&a, p, &c)) {
                pts[i + 1] = nb;
                i += 1;
                continue;
            }
        }

        // Slide a along its incoming segment.
        if i >= 1 && movable(&a) {
            let z = pts[i - 1];
            let candidate = if z.x == a.x && z.y != a.y {
                Some(Point::new(a.x, b.y))
            } else if z.y == a.y && z.x != a.x {
                Some(Point::new(b.x, a.y))
            } else {
                None
            };
            if let Some(na) = candidate.filter(|p| keepout.allows_corner(&z, p, &b)) {
                pts[i] = na;
                i += 1;
                continue;
            }
        }

        let primary = Point::new(b.x, a.y);
        let alternate = Point::new(a.x, b.y);
        if keepout.allows_corner(&a, &primary, &b) {
            pts.insert(i + 1, primary);
        } else if keepout.allows_corner(&a, &alternate, &b) {
            pts.insert(i + 1, alternate);
        } else if let Some([c1, c2]) = step_corners(&a, &b, keepout, grid) {
            pts.insert(i + 1, c1);
            pts.insert(i + 2, c2);
        } else {
            tracing::debug!(
                "ensure_orthogonal: no clear corner between ({}, {}) and ({}, {})",
                a.x,
                a.y,
                b.x,
                b.y
            );
            pts.insert(i + 1, primary);
        }
        i += 1;
    }

    dedupe(&pts)
}

/// Two corners joining `a` to `b` through an intermediate column
/// (horizontal-vertical-horizontal) or row, clear of `keepout`.
fn step_corners(a: &Point, b: &Point, keepout: &Keepout, grid: f64) -> Option<[Point; 2]> {
    let clear = |c1: &Point, c2: &Point| {
        !keepout.blocks_point(c1)
            && !keepout.blocks_point(c2)
            && !keepout.blocks_leg(a, c1)
            && !keepout.blocks_leg(c1, c2)
            && !keepout.blocks_leg(c2, b)
    };
    let columns = between(a.x, b.x, grid)
        .into_iter()
        .map(|x| [Point::new(x, a.y), Point::new(x, b.y)]);
    let rows = between(a.y, b.y, grid)
        .into_iter()
        .map(|y| [Point::new(a.x, y), Point::new(b.x, y)]);
    columns.chain(rows).find(|[c1, c2]| clear(c1, c2))
}

/// Coordinates strictly between `u` and `v`: the midpoint (on the grid when
/// there is one) first, then alternating steps outward.
fn between(u: f64, v: f64, grid: f64) -> Vec<f64> {
    let (lo, hi) = (u.min(v), u.max(v));
    let span = hi - lo;
    if span <= 0.0 {
        return Vec::new();
    }
    let step = if grid > 0.0 { grid } else { span / 4.0 };
    let mid = if grid > 0.0 {
        snap_to_grid((lo + hi) / 2.0, grid)
    } else {
        (lo + hi) / 2.0
    };
    let reach = (span / step).ceil() as i64 + 1;
    let mut out: Vec<f64> = Vec::new();
    for k in 0..=reach {
        for c in [mid - k as f64 * step, mid + k as f64 * step] {
            if c > lo && c < hi && !out.contains(&c) {
                out.push(c);
            }
        }
    }
    let exact = (lo + hi) / 2.0;
    if !out.contains(&exact) {
        out.push(exact);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::is_orthogonal;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn all_orthogonal(points: &[Point]) -> bool {
        points.windows(2).all(|w| is_orthogonal(&w[0], &w[1]))
    }

    #[test]
    fn test_inserts_corner_between_anchors() {
        let input = pts(&[(0.0, 0.0), (40.0, 20.0)]);
        let out = ensure_orthogonal(&input, &HashSet::new());
        assert_eq!(out, pts(&[(0.0, 0.0), (40.0, 0.0), (40.0, 20.0)]));
    }

    #[test]
    fn test_slides_unanchored_neighbour() {
        // The first point was dragged from (0,0) to (0,10); the bend at
        // (40,0) follows along its vertical segment.
        let input = pts(&[(0.0, 10.0), (40.0, 0.0), (40.0, 60.0)]);
        let anchored: HashSet<PointKey> = [Point::new(0.0, 10.0).key(), Point::new(40.0, 60.0).key()]
            .into_iter()
            .collect();
        let out = ensure_orthogonal(&input, &anchored);
        assert_eq!(out, pts(&[(0.0, 10.0), (40.0, 10.0), (40.0, 60.0)]));
    }

    #[test]
    fn test_anchored_points_never_move() {
        let input = pts(&[(0.0, 10.0), (40.0, 0.0), (40.0, 60.0)]);
        let anchored: HashSet<PointKey> = input.iter().map(|p| p.key()).collect();
        let out = ensure_orthogonal(&input, &anchored);
        assert!(all_orthogonal(&out));
        for p in &input {
            assert!(out.contains(p));
        }
    }

    #[test]
    fn test_corner_avoids_keepout_point() {
        let input = pts(&[(0.0, 0.0), (40.0, 20.0)]);
        let keepout = Keepout::from_points(vec![Point::new(40.0, 0.0)]);
        let out = ensure_orthogonal_avoiding(&input, &HashSet::new(), &keepout, 20.0);
        assert_eq!(out, pts(&[(0.0, 0.0), (0.0, 20.0), (40.0, 20.0)]));
    }

    #[test]
    fn test_corner_leg_avoids_foreign_endpoint() {
        let input = pts(&[(0.0, 0.0), (40.0, 20.0)]);
        let keepout = Keepout::from_points(vec![Point::new(20.0, 0.0)]);
        let out = ensure_orthogonal_avoiding(&input, &HashSet::new(), &keepout, 20.0);
        assert_eq!(out, pts(&[(0.0, 0.0), (0.0, 20.0), (40.0, 20.0)]));
    }

    #[test]
    fn test_steps_through_column_when_both_corners_are_taken() {
        let input = pts(&[(80.0, 80.0), (0.0, 40.0)]);
        let anchored: HashSet<PointKey> = input.iter().map(|p| p.key()).collect();
        let keepout = Keepout::from_points(vec![Point::new(80.0, 40.0), Point::new(0.0, 80.0)]);
        let out = ensure_orthogonal_avoiding(&input, &anchored, &keepout, 20.0);
        assert_eq!(out, pts(&[(80.0, 80.0), (40.0, 80.0), (40.0, 40.0), (0.0, 40.0)]));
    }

    #[test]
    fn test_steps_through_row_when_columns_are_blocked() {
        let input = pts(&[(0.0, 0.0), (40.0, 40.0)]);
        let keepout = Keepout::new(
            vec![Point::new(40.0, 0.0), Point::new(0.0, 40.0)],
            vec![
                (Point::new(10.0, -20.0), Point::new(10.0, 60.0)),
                (Point::new(20.0, -20.0), Point::new(20.0, 60.0)),
                (Point::new(30.0, -20.0), Point::new(30.0, 60.0)),
            ],
        );
        let out = ensure_orthogonal_avoiding(&input, &HashSet::new(), &keepout, 10.0);
        assert!(all_orthogonal(&out));
        assert_eq!(out.len(), 4);
        assert_eq!(out[1].x, 0.0);
        assert_eq!(out[2].x, 40.0);
        assert_eq!(out[1].y, out[2].y);
    }

    #[test]
    fn test_budget_exhaustion_returns_best_attempt() {
        let input = pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]);
        let anchored: HashSet<PointKey> = input.iter().map(|p| p.key()).collect();
        let out = ensure_orthogonal_with_budget(&input, &anchored, &Keepout::default(), 0.0, 1);
        // One diagonal repaired, the rest left for the next pass.
        assert_eq!(out.len(), input.len() + 1);
        assert!(!all_orthogonal(&out));
        assert!(is_orthogonal(&out[0], &out[1]) && is_orthogonal(&out[1], &out[2]));
    }
}
