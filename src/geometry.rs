//! Planar predicates and the polygon type shared by the polygon units.
//!
//! Orientation signs are exact `f64` comparisons; only the "point lies on a
//! segment" test carries a tolerance, so touching configurations are caught
//! even when rounding nudges the orientation off zero.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::construction::{as_real, describe};
use crate::error::VerifyError;

/// Tolerance for collinearity and bounding-box slack in [`on_segment`].
pub const COLLINEAR_EPS: f64 = 1e-9;

/// A point in the plane, serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// A polygon given by its vertices in boundary order, serialised as `[[x, y], ...]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self(vertices)
    }

    pub fn vertices(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boundary edge `i`, from vertex `i` to vertex `i + 1` (wrapping)
    pub fn edge(&self, i: usize) -> (Point, Point) {
        (self.0[i], self.0[(i + 1) % self.0.len()])
    }

    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        let n = self.0.len();
        (i + 1) % n == j || (j + 1) % n == i
    }

    /// First pair of non-adjacent boundary edges that touch, if any
    pub fn first_crossing(&self) -> Option<(usize, usize)> {
        let n = self.len();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| j != i + 1 && !(i == 0 && j == n - 1))
            .find(|&(i, j)| {
                let (a1, a2) = self.edge(i);
                let (b1, b2) = self.edge(j);
                segments_intersect(a1, a2, b1, b2)
            })
    }

    /// Read a list of `[x, y]` pairs. One extra level of nesting around the
    /// list is unwrapped, e.g. `[[[0, 0], [1, 0], [0, 1]]]`.
    pub fn from_value(value: &Value) -> Result<Self, VerifyError> {
        let mut items = value
            .as_array()
            .ok_or_else(|| VerifyError::malformed("expected a list of [x, y] pairs"))?;
        if let [inner] = items.as_slice() {
            if let Some(inner) = inner.as_array() {
                let wraps_pairs = inner
                    .first()
                    .and_then(Value::as_array)
                    .is_some_and(|pair| pair.len() == 2);
                if wraps_pairs {
                    items = inner;
                }
            }
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item.as_array().map(Vec::as_slice) {
                Some([x, y]) => match (as_real(x), as_real(y)) {
                    (Some(x), Some(y)) => Ok(Point::new(x, y)),
                    _ => Err(VerifyError::malformed(format!(
                        "point at index {i} has non-numeric coordinates: {}",
                        describe(item)
                    ))),
                },
                _ => Err(VerifyError::malformed(format!(
                    "point at index {i} is not a pair: {}",
                    describe(item)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Polygon::new)
    }
}

/// Turn direction of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise turn (cross product < 0)
    NEGATIVE,
    /// Exactly collinear (cross product == 0)
    DEGENERATE,
    /// Counter-clockwise turn (cross product > 0)
    POSITIVE,
}

/// Twice the signed area of triangle `abc`.
pub fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let det = cross(a, b, c);
    if det > 0.0 {
        Orientation::POSITIVE
    } else if det < 0.0 {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// Whether `p` lies on the closed segment `ab`, up to [`COLLINEAR_EPS`].
pub fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let within_x = a.x.min(b.x) - COLLINEAR_EPS <= p.x && p.x <= a.x.max(b.x) + COLLINEAR_EPS;
    let within_y = a.y.min(b.y) - COLLINEAR_EPS <= p.y && p.y <= a.y.max(b.y) + COLLINEAR_EPS;
    within_x && within_y && cross(a, b, p).abs() <= COLLINEAR_EPS
}

/// Whether closed segments `p1p2` and `q1q2` share at least one point.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    use Orientation::*;

    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if (o1 == DEGENERATE && on_segment(p1, p2, q1))
        || (o2 == DEGENERATE && on_segment(p1, p2, q2))
        || (o3 == DEGENERATE && on_segment(q1, q2, p1))
        || (o4 == DEGENERATE && on_segment(q1, q2, p2))
    {
        return true;
    }

    let straddles = |a: Orientation, b: Orientation| {
        matches!((a, b), (POSITIVE, NEGATIVE) | (NEGATIVE, POSITIVE))
    };
    straddles(o1, o2) && straddles(o3, o4)
}

/// Ray-casting point-in-polygon test; points on the boundary count as inside.
pub fn point_in_polygon(pt: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if on_segment(a, b, pt) {
            return true;
        }
        if (a.y > pt.y) != (b.y > pt.y) {
            let x_cross = a.x + (pt.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x_cross == pt.x {
                return true;
            }
            if x_cross > pt.x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Shoelace area, positive for counter-clockwise polygons.
pub fn signed_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}
