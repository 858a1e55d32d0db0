//! Obstacle detours.

use std::collections::HashSet;

use super::simplify::dedupe;
use super::Keepout;
use crate::model::{segment_axis, snap_above, snap_below, Axis, Bounds, Point, PointKey};
use crate::obstacles::Obstacle;

/// Lower bound on detour passes; the actual cap is `max(6, 2 * points)`.
/// Routing is best effort: when the cap is reached the current path is
/// returned even if an intersection remains.
pub const MIN_REROUTE_PASSES: usize = 6;

/// Detour `points` around `obstacles`. Detour lines are placed on the first
/// grid line (spacing `grid`) past the blocking rectangle.
pub fn reroute(points: &[Point], obstacles: &[Obstacle], grid: f64) -> Vec<Point> {
    Router::new(obstacles, grid).route(points)
}

/// Obstacle-avoiding router for a single polyline.
pub struct Router<'a> {
    obstacles: &'a [Obstacle],
    grid: f64,
    keepout: Option<&'a Keepout>,
    max_passes: Option<usize>,
}

impl<'a> Router<'a> {
    pub fn new(obstacles: &'a [Obstacle], grid: f64) -> Self {
        Self {
            obstacles,
            grid,
            keepout: None,
            max_passes: None,
        }
    }

    /// Reject detours whose new points or legs touch `keepout`.
    pub fn with_keepout(mut self, keepout: &'a Keepout) -> Self {
        self.keepout = Some(keepout);
        self
    }

    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// First `(segment index, obstacle index)` pair that intersects.
    pub fn first_blocked_segment(&self, points: &[Point]) -> Option<(usize, usize)> {
        points.windows(2).enumerate().find_map(|(i, w)| {
            self.obstacles
                .iter()
                .position(|o| o.bounds.intersects_segment(&w[0], &w[1]))
                .map(|oi| (i, oi))
        })
    }

    pub fn is_clear(&self, points: &[Point]) -> bool {
        self.first_blocked_segment(points).is_none()
    }

    pub fn route(&self, points: &[Point]) -> Vec<Point> {
        let mut pts = dedupe(points);
        if pts.len() < 2 || self.obstacles.is_empty() {
            return pts;
        }
        let max_passes = self
            .max_passes
            .unwrap_or_else(|| MIN_REROUTE_PASSES.max(2 * pts.len()));
        let mut failed: HashSet<(PointKey, PointKey, usize)> = HashSet::new();
        let mut passes = 0;

        loop {
            if passes >= max_passes {
                if !self.is_clear(&pts) {
                    tracing::debug!(
                        "reroute: pass budget {} exhausted with intersections remaining",
                        max_passes
                    );
                }
                break;
            }
            passes += 1;

            let mut progressed = false;
            'scan: for i in 0..pts.len() - 1 {
                let a = pts[i];
                let b = pts[i + 1];
                for (oi, obstacle) in self.obstacles.iter().enumerate() {
                    if !obstacle.bounds.intersects_segment(&a, &b)
                        || failed.contains(&(a.key(), b.key(), oi))
                    {
                        continue;
                    }
                    match self.detour(&a, &b, &obstacle.bounds) {
                        Some(inner) => {
                            tracing::trace!(
                                "reroute: detour around {} between ({}, {}) and ({}, {})",
                                obstacle.owner,
                                a.x,
                                a.y,
                                b.x,
                                b.y
                            );
                            pts.splice(i + 1..i + 1, inner);
                            pts = dedupe(&pts);
                            progressed = true;
                            break 'scan;
                        }
                        None => {
                            failed.insert((a.key(), b.key(), oi));
                        }
                    }
                }
            }
            if !progressed {
                break;
            }
        }
        pts
    }

    /// Points to insert between `a` and `b` so the path steps around `r`,
    /// nearest side first.
    fn detour(&self, a: &Point, b: &Point, r: &Bounds) -> Option<Vec<Point>> {
        let horizontal = match segment_axis(a, b)? {
            Axis::Horizontal => true,
            Axis::Vertical => false,
        };
        if r.contains_strict(a) || r.contains_strict(b) {
            return None;
        }
        // Work in a frame where the segment runs horizontally.
        let (fa, fb, fr) = if horizontal {
            (*a, *b, *r)
        } else {
            (swap(a), swap(b), swap_bounds(r))
        };
        let g = self.grid;
        let (entry, exit) = if fb.x > fa.x {
            (snap_below(fr.min_x, g).max(fa.x), snap_above(fr.max_x, g).min(fb.x))
        } else {
            (snap_above(fr.max_x, g).min(fa.x), snap_below(fr.min_x, g).max(fb.x))
        };
        let above = snap_below(fr.min_y, g);
        let below = snap_above(fr.max_y, g);
        let sides = if fa.y - fr.min_y <= fr.max_y - fa.y {
            [above, below]
        } else {
            [below, above]
        };

        for side in sides {
            let framed = [
                Point::new(entry, fa.y),
                Point::new(entry, side),
                Point::new(exit, side),
                Point::new(exit, fa.y),
            ];
            let inner: Vec<Point> = if horizontal {
                framed.to_vec()
            } else {
                framed.iter().map(swap).collect()
            };
            if self.accepts(a, b, r, &inner) {
                return Some(inner);
            }
        }
        None
    }

    fn accepts(&self, a: &Point, b: &Point, blocking: &Bounds, inner: &[Point]) -> bool {
        let legs = inner.windows(2).map(|w| (w[0], w[1]));
        for (p, q) in legs {
            if p == q {
                continue;
            }
            if self
                .obstacles
                .iter()
                .any(|o| o.bounds.intersects_segment(&p, &q))
            {
                return false;
            }
            if self.keepout.map_or(false, |k| k.blocks_leg(&p, &q)) {
                return false;
            }
        }
        let stubs = [(*a, inner[0]), (inner[inner.len() - 1], *b)];
        if stubs.iter().any(|(p, q)| blocking.intersects_segment(p, q)) {
            return false;
        }
        if let Some(keepout) = self.keepout {
            if inner
                .iter()
                .filter(|p| *p != a && *p != b)
                .any(|p| keepout.blocks_point(p))
            {
                return false;
            }
        }
        true
    }
}

fn swap(p: &Point) -> Point {
    Point::new(p.y, p.x)
}

fn swap_bounds(r: &Bounds) -> Bounds {
    Bounds::new(r.min_y, r.min_x, r.max_y, r.max_x)
}
