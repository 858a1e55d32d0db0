//! Geometry primitives
//!
//! Points, exact point keys, axis-aligned bounds and the handful of segment
//! predicates the router and the net builder share. Coordinates are plain
//! `f64`; equality is exact everywhere except the grid snapping helpers,
//! which use [`GRID_EPSILON`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tolerance used when comparing a coordinate against a grid line.
pub const GRID_EPSILON: f64 = 1e-6;

/// A point on the schematic plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Exact hashable identity of this point.
    pub fn key(&self) -> PointKey {
        PointKey::from(*self)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn manhattan(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn snapped(&self, grid: f64) -> Point {
        Point::new(snap_to_grid(self.x, grid), snap_to_grid(self.y, grid))
    }

    /// Total order used for deterministic tie breaking.
    pub fn lexical_cmp(&self, other: &Point) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

/// Exact identity of a point, usable as a map key.
///
/// `-0.0` and `0.0` map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(u64, u64);

impl PointKey {
    pub fn point(self) -> Point {
        Point::new(f64::from_bits(self.0), f64::from_bits(self.1))
    }
}

impl From<Point> for PointKey {
    fn from(p: Point) -> Self {
        PointKey(fold_zero(p.x).to_bits(), fold_zero(p.y).to_bits())
    }
}

/// Hashable identity of a single coordinate (`-0.0` folded into `0.0`).
pub fn coord_key(v: f64) -> u64 {
    fold_zero(v).to_bits()
}

fn fold_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Orientation of an axis-aligned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Axis of a non-degenerate orthogonal segment, `None` for diagonal or
/// zero-length segments.
pub fn segment_axis(a: &Point, b: &Point) -> Option<Axis> {
    if a.y == b.y && a.x != b.x {
        Some(Axis::Horizontal)
    } else if a.x == b.x && a.y != b.y {
        Some(Axis::Vertical)
    } else {
        None
    }
}

pub fn is_orthogonal(a: &Point, b: &Point) -> bool {
    a.x == b.x || a.y == b.y
}

/// True when both neighbours share `p`'s x, or both share its y.
pub fn is_collinear(prev: &Point, p: &Point, next: &Point) -> bool {
    (prev.x == p.x && p.x == next.x) || (prev.y == p.y && p.y == next.y)
}

/// True when `p` lies on the open interior of the orthogonal segment `a-b`.
pub fn point_strictly_inside_segment(p: &Point, a: &Point, b: &Point) -> bool {
    match segment_axis(a, b) {
        Some(Axis::Horizontal) => p.y == a.y && p.x > a.x.min(b.x) && p.x < a.x.max(b.x),
        Some(Axis::Vertical) => p.x == a.x && p.y > a.y.min(b.y) && p.y < a.y.max(b.y),
        None => false,
    }
}

/// Closest point to `p` on the segment `a-b`.
pub fn project_onto_segment(p: &Point, a: &Point, b: &Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return *a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

/// Total Manhattan length of a polyline.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].manhattan(&w[1])).sum()
}

/// Number of direction changes along an orthogonal polyline.
pub fn bend_count(points: &[Point]) -> usize {
    let axes: Vec<Axis> = points
        .windows(2)
        .filter_map(|w| segment_axis(&w[0], &w[1]))
        .collect();
    axes.windows(2).filter(|w| w[0] != w[1]).count()
}

pub fn snap_to_grid(v: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return v;
    }
    (v / grid).round() * grid
}

/// Largest grid line strictly below `v`.
pub fn snap_below(v: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return v - 1.0;
    }
    ((v - GRID_EPSILON) / grid).floor() * grid
}

/// Smallest grid line strictly above `v`.
pub fn snap_above(v: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return v + 1.0;
    }
    ((v + GRID_EPSILON) / grid).ceil() * grid
}

/// Rotate `p` by `quarter_turns` clockwise (screen coordinates, y down)
/// around `center`.
pub fn rotate_quarter(p: &Point, center: &Point, quarter_turns: i32) -> Point {
    let mut dx = p.x - center.x;
    let mut dy = p.y - center.y;
    for _ in 0..quarter_turns.rem_euclid(4) {
        let (nx, ny) = (-dy, dx);
        dx = nx;
        dy = ny;
    }
    Point::new(fold_zero(center.x + dx), fold_zero(center.y + dy))
}

/// Mirror `p` about the vertical line `x = axis_x`.
pub fn mirror_x(p: &Point, axis_x: f64) -> Point {
    Point::new(fold_zero(2.0 * axis_x - p.x), p.y)
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds::new(first.x, first.y, first.x, first.y);
        for p in iter {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    pub fn inflate(&self, d: f64) -> Bounds {
        Bounds::new(self.min_x - d, self.min_y - d, self.max_x + d, self.max_y + d)
    }

    pub fn inflate_xy(&self, dx: f64, dy: f64) -> Bounds {
        Bounds::new(self.min_x - dx, self.min_y - dy, self.max_x + dx, self.max_y + dy)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn contains_strict(&self, p: &Point) -> bool {
        p.x > self.min_x && p.x < self.max_x && p.y > self.min_y && p.y < self.max_y
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Segment-in-rectangle test used by the router: an endpoint strictly
    /// inside, or the segment's line strictly inside the rectangle's span on
    /// the other axis with a positive overlap along its own axis.
    pub fn intersects_segment(&self, a: &Point, b: &Point) -> bool {
        if self.contains_strict(a) || self.contains_strict(b) {
            return true;
        }
        match segment_axis(a, b) {
            Some(Axis::Horizontal) => {
                let y = a.y;
                if y <= self.min_y || y >= self.max_y {
                    return false;
                }
                let lo = a.x.min(b.x).max(self.min_x);
                let hi = a.x.max(b.x).min(self.max_x);
                hi - lo > 0.0
            }
            Some(Axis::Vertical) => {
                let x = a.x;
                if x <= self.min_x || x >= self.max_x {
                    return false;
                }
                let lo = a.y.min(b.y).max(self.min_y);
                let hi = a.y.max(b.y).min(self.max_y);
                hi - lo > 0.0
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_key_folds_negative_zero() {
        assert_eq!(Point::new(-0.0, 5.0).key(), Point::new(0.0, 5.0).key());
        assert_ne!(Point::new(1.0, 5.0).key(), Point::new(0.0, 5.0).key());
        assert_eq!(Point::new(3.5, -2.0).key().point(), Point::new(3.5, -2.0));
    }

    #[test]
    fn test_segment_axis() {
        let a = Point::new(0.0, 0.0);
        assert_eq!(segment_axis(&a, &Point::new(10.0, 0.0)), Some(Axis::Horizontal));
        assert_eq!(segment_axis(&a, &Point::new(0.0, 10.0)), Some(Axis::Vertical));
        assert_eq!(segment_axis(&a, &Point::new(5.0, 5.0)), None);
        assert_eq!(segment_axis(&a, &a), None);
    }

    #[test]
    fn test_point_strictly_inside_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(40.0, 0.0);
        assert!(point_strictly_inside_segment(&Point::new(20.0, 0.0), &a, &b));
        assert!(!point_strictly_inside_segment(&Point::new(40.0, 0.0), &a, &b));
        assert!(!point_strictly_inside_segment(&Point::new(20.0, 1.0), &a, &b));
    }

    #[test]
    fn test_project_onto_segment_clamps() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 40.0);
        assert_eq!(project_onto_segment(&Point::new(7.0, 12.0), &a, &b), Point::new(0.0, 12.0));
        assert_eq!(project_onto_segment(&Point::new(3.0, -9.0), &a, &b), a);
    }

    #[test]
    fn test_snap_outward() {
        assert_eq!(snap_below(40.0, 20.0), 20.0);
        assert_eq!(snap_below(45.0, 20.0), 40.0);
        assert_eq!(snap_above(40.0, 20.0), 60.0);
        assert_eq!(snap_above(41.0, 20.0), 60.0);
    }

    #[test]
    fn test_rotate_quarter_and_mirror() {
        let c = Point::new(20.0, 0.0);
        let p = Point::new(0.0, 0.0);
        assert_eq!(rotate_quarter(&p, &c, 1), Point::new(20.0, -20.0));
        assert_eq!(rotate_quarter(&p, &c, 2), Point::new(40.0, 0.0));
        assert_eq!(rotate_quarter(&p, &c, 4), p);
        assert_eq!(mirror_x(&p, 20.0), Point::new(40.0, 0.0));
    }

    #[test]
    fn test_intersects_segment() {
        let r = Bounds::new(0.0, -10.0, 40.0, 10.0);
        // Through the body along its axis.
        assert!(r.intersects_segment(&Point::new(-20.0, 0.0), &Point::new(60.0, 0.0)));
        // Touching the edge only.
        assert!(!r.intersects_segment(&Point::new(-20.0, 10.0), &Point::new(60.0, 10.0)));
        // Ending exactly at the boundary.
        assert!(!r.intersects_segment(&Point::new(-20.0, 0.0), &Point::new(0.0, 0.0)));
        // Vertical through the middle.
        assert!(r.intersects_segment(&Point::new(20.0, -30.0), &Point::new(20.0, 30.0)));
    }

    #[test]
    fn test_bend_count_and_length() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(40.0, 20.0),
        ];
        assert_eq!(bend_count(&pts), 2);
        assert_eq!(path_length(&pts), 60.0);
    }
}
