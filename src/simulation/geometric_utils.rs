//! Geometric utility functions for sensing and containment tests.
//!
//! Lines are kept in implicit form `A·x + B·y = C`, intersections are solved
//! with Cramer's rule, and containment uses an even-odd ray cast.

use geo::algorithm::Distance;
use geo::{Coord, Euclidean, Point, coord};
use serde::{Deserialize, Serialize};

/// Amount a zero-width or zero-height box is widened on each side before a
/// containment test.
pub const BOX_EPSILON: f64 = 1e-5;

/// A line in implicit form `a·x + b·y = c`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineEquation {
    /// Coefficient of `x`.
    pub a: f64,
    /// Coefficient of `y`.
    pub b: f64,
    /// Right-hand side.
    pub c: f64,
}

impl LineEquation {
    /// Builds the line passing through `p1` and `p2`.
    pub fn through(p1: Coord<f64>, p2: Coord<f64>) -> Self {
        Self {
            a: p1.y - p2.y,
            b: p2.x - p1.x,
            c: p2.x * p1.y - p1.x * p2.y,
        }
    }

    /// Solves the 2×2 system formed by `self` and `other`.
    ///
    /// Returns `None` when the determinant is exactly zero (parallel or
    /// coincident lines).
    #[allow(clippy::float_cmp)]
    pub fn intersect(&self, other: &LineEquation) -> Option<Coord<f64>> {
        let delta = self.a * other.b - other.a * self.b;
        if delta == 0.0 {
            return None;
        }

        Some(coord! {
            x: (other.b * self.c - self.b * other.c) / delta,
            y: (self.a * other.c - other.a * self.c) / delta,
        })
    }
}

/// Result of intersecting two bounded operands.
///
/// `location` is the zero vector whenever the lines are parallel, so callers
/// must test `intersects` rather than the coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Whether a valid intersection was found.
    pub intersects: bool,
    /// Where the supporting lines cross.
    pub location: Coord<f64>,
}

impl Intersection {
    fn none() -> Self {
        Self {
            intersects: false,
            location: Coord::zero(),
        }
    }
}

/// One edge of the track's centerline polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundarySegment {
    /// Lower-left corner of the segment's bounding box.
    pub min: Coord<f64>,
    /// Upper-right corner of the segment's bounding box.
    pub max: Coord<f64>,
    /// Supporting line.
    pub line: LineEquation,
}

impl BoundarySegment {
    /// Creates the segment from `p1` to `p2`.
    pub fn new(p1: Coord<f64>, p2: Coord<f64>) -> Self {
        Self {
            min: coord! { x: p1.x.min(p2.x), y: p1.y.min(p2.y) },
            max: coord! { x: p1.x.max(p2.x), y: p1.y.max(p2.y) },
            line: LineEquation::through(p1, p2),
        }
    }

    /// Intersects `line` with this segment's supporting line and checks that
    /// the crossing lies within the segment's bounding box.
    pub fn find_intersect(&self, line: &LineEquation) -> Intersection {
        match self.line.intersect(line) {
            Some(location) => Intersection {
                intersects: within_box(location, self.min, self.max),
                location,
            },
            None => Intersection::none(),
        }
    }
}

/// Inclusive test of `p` against the axis-aligned box spanned by `c1` and
/// `c2`. An axis whose extent is zero is widened by [`BOX_EPSILON`].
#[allow(clippy::float_cmp)]
pub fn within_box(p: Coord<f64>, c1: Coord<f64>, c2: Coord<f64>) -> bool {
    let (mut x_min, mut x_max) = (c1.x.min(c2.x), c1.x.max(c2.x));
    if x_min == x_max {
        x_min -= BOX_EPSILON;
        x_max += BOX_EPSILON;
    }
    let (mut y_min, mut y_max) = (c1.y.min(c2.y), c1.y.max(c2.y));
    if y_min == y_max {
        y_min -= BOX_EPSILON;
        y_max += BOX_EPSILON;
    }

    p.x >= x_min && p.x <= x_max && p.y >= y_min && p.y <= y_max
}

/// Intersects segment `a1`-`a2` with segment `b1`-`b2`.
///
/// The crossing must lie inside both bounding boxes to count.
pub fn segment_intersection(
    a1: Coord<f64>,
    a2: Coord<f64>,
    b1: Coord<f64>,
    b2: Coord<f64>,
) -> Intersection {
    let segment = BoundarySegment::new(a1, a2);
    let hit = segment.find_intersect(&LineEquation::through(b1, b2));
    Intersection {
        intersects: hit.intersects && within_box(hit.location, b1, b2),
        location: hit.location,
    }
}

/// Even-odd ray-cast containment test.
///
/// Edges are visited pairwise with wraparound; an edge counts as crossed when
/// exactly one endpoint lies strictly below `point.y` and its interpolated `x`
/// is strictly left of `point.x`. For a counter-clockwise square this puts
/// points on the top and right edges inside and points on the bottom and left
/// edges outside. An empty polygon contains nothing.
pub fn is_point_in_polygon(polygon: &[Coord<f64>], point: Coord<f64>) -> bool {
    let mut inside = false;
    let Some(mut j) = polygon.len().checked_sub(1) else {
        return false;
    };

    for (i, pi) in polygon.iter().enumerate() {
        let pj = polygon[j];
        let straddles =
            (pi.y < point.y && pj.y >= point.y) || (pj.y < point.y && pi.y >= point.y);
        if straddles && pi.x + (point.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x) < point.x {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Rotates `v` counter-clockwise by `degrees`.
pub fn rotate_degrees(v: Coord<f64>, degrees: f64) -> Coord<f64> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    coord! {
        x: cos * v.x - sin * v.y,
        y: sin * v.x + cos * v.y,
    }
}

/// Squared Euclidean distance between two points.
pub fn distance_squared(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = a - b;
    d.x * d.x + d.y * d.y
}

/// Euclidean distance between two points.
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean.distance(Point::from(a), Point::from(b))
}

/// Length of a vector.
pub fn length(v: Coord<f64>) -> f64 {
    distance(v, Coord::zero())
}

/// Axis-aligned square of half-extent `half` centered on `center`, corners
/// ordered `(+,+), (+,-), (-,-), (-,+)`.
pub fn square_around(center: Coord<f64>, half: f64) -> Vec<Coord<f64>> {
    vec![
        coord! { x: center.x + half, y: center.y + half },
        coord! { x: center.x + half, y: center.y - half },
        coord! { x: center.x - half, y: center.y - half },
        coord! { x: center.x - half, y: center.y + half },
    ]
}
