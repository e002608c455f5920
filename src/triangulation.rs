//! Simple polygons with a prescribed number of triangulations.
//!
//! `n` points on a shallow convex arc, closed off by a wide horizontal top
//! segment well above it. Every triangulation is fixed by where the top edge's
//! triangle lands on the arc, so there are exactly `n` of them.
//!
//! The verifier counts triangulations directly with the interval DP over
//! valid diagonals and does not assume anything about the shape.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::{ConstructionError, VerifyError};
use crate::geometry::{point_in_polygon, segments_intersect, signed_area, Point, Polygon};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

/// Total angle of the bottom arc, in degrees
const ARC_DEGREES: f64 = 60.0;

/// Two vertices closer than this in both coordinates are the same point
const COINCIDENT_EPS: f64 = 1e-12;

/// `count` points on an arc of radius `radius` centred at `(0, -radius)`,
/// ordered left to right.
fn arc_points(count: usize, radius: f64) -> Vec<Point> {
    let half = ARC_DEGREES.to_radians() / 2.0;
    let angles: Vec<f64> = if count == 1 {
        vec![0.0]
    } else {
        let step = 2.0 * half / (count - 1) as f64;
        (0..count).map(|i| -half + i as f64 * step).collect()
    };
    angles
        .into_iter()
        .map(|a| Point::new(radius * a.sin(), -radius + radius * a.cos()))
        .collect()
}

/// Build a polygon with exactly `n` triangulations (`n < 1` is treated as 1).
pub fn build(n: i64) -> Result<Polygon, ConstructionError> {
    let n = n.max(1) as usize;
    let radius = f64::max(10.0, 0.6 * n as f64);
    let bottom = arc_points(n, radius);
    let (left, right) = match (bottom.first(), bottom.last()) {
        (Some(&l), Some(&r)) => (l, r),
        _ => return Err(ConstructionError::internal("arc has no points")),
    };

    let chord = (right.x - left.x).abs();
    let (height, margin) = if chord > 0.0 {
        (2.0 * chord, 0.6 * chord)
    } else {
        (2.0 * radius, 0.5 * radius)
    };

    let mut vertices = bottom;
    vertices.push(Point::new(right.x + margin, height));
    vertices.push(Point::new(left.x - margin, height));
    let polygon = Polygon::new(vertices);

    if let Some(i) = first_coincident(&polygon) {
        return Err(ConstructionError::internal(format!(
            "vertices {i} and {} coincide for n = {n}",
            (i + 1) % polygon.len()
        )));
    }
    if signed_area(polygon.vertices()) <= 0.0 {
        return Err(ConstructionError::internal(format!("polygon for n = {n} has no positive area")));
    }
    Ok(polygon)
}

fn first_coincident(polygon: &Polygon) -> Option<usize> {
    (0..polygon.len()).find(|&i| {
        let (a, b) = polygon.edge(i);
        (a.x - b.x).abs() < COINCIDENT_EPS && (a.y - b.y).abs() < COINCIDENT_EPS
    })
}

/// A chord `ij` is a diagonal when it meets no boundary edge away from its
/// endpoints and its midpoint lies inside the polygon.
fn is_diagonal(polygon: &Polygon, i: usize, j: usize) -> bool {
    let n = polygon.len();
    let vertices = polygon.vertices();
    let (a, b) = (vertices[i], vertices[j]);
    let blocked = (0..n).any(|k| {
        let k2 = (k + 1) % n;
        if k == i || k == j || k2 == i || k2 == j {
            return false;
        }
        segments_intersect(a, b, vertices[k], vertices[k2])
    });
    !blocked && point_in_polygon(a.midpoint(b), vertices)
}

/// Number of triangulations, by interval DP over the vertex order.
pub fn count_triangulations(polygon: &Polygon) -> BigUint {
    let n = polygon.len();
    if n < 3 {
        return BigUint::zero();
    }
    let mut valid = vec![vec![false; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let ok = polygon.adjacent(i, j) || is_diagonal(polygon, i, j);
            valid[i][j] = ok;
            valid[j][i] = ok;
        }
    }

    let mut dp = vec![vec![BigUint::zero(); n]; n];
    for i in 0..n - 1 {
        dp[i][i + 1] = BigUint::one();
    }
    for length in 2..n {
        for i in 0..n - length {
            let j = i + length;
            if !valid[i][j] {
                continue;
            }
            let mut total = BigUint::zero();
            for k in (i + 1)..j {
                if valid[i][k] && valid[k][j] {
                    total += &dp[i][k] * &dp[k][j];
                }
            }
            dp[i][j] = total;
        }
    }
    tracing::trace!(vertices = n, count = %dp[0][n - 1], "counted triangulations");
    std::mem::take(&mut dp[0][n - 1])
}

/// At least three vertices, none repeated back to back.
fn nondegenerate(polygon: &Polygon, _params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    if polygon.len() < 3 {
        return Err(VerifyError::violation(format!(
            "polygon has {} vertices; at least 3 are required",
            polygon.len()
        )));
    }
    if let Some(i) = first_coincident(polygon) {
        return Err(VerifyError::violation(format!(
            "consecutive vertices {i} and {} are identical",
            (i + 1) % polygon.len()
        )));
    }
    Ok(())
}

fn simple_polygon(polygon: &Polygon, _params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    if polygon.len() < 3 {
        return Err(VerifyError::violation("polygon must have at least 3 vertices"));
    }
    if let Some((i, j)) = polygon.first_crossing() {
        let n = polygon.len();
        return Err(VerifyError::violation(format!(
            "polygon not simple: edges ({i}, {}) and ({j}, {}) intersect",
            i + 1,
            (j + 1) % n
        )));
    }
    Ok(())
}

fn triangulation_count(polygon: &Polygon, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let target = params.require("n")?;
    let count = count_triangulations(polygon);
    if BigUint::try_from(target).ok().as_ref() != Some(&count) {
        return Err(VerifyError::violation(format!(
            "polygon has {count} triangulation(s); expected {target}"
        )));
    }
    Ok(())
}

static CHECKS: [Check<Polygon>; 3] = [
    Check {
        name: "nondegenerate",
        run: nondegenerate,
    },
    Check {
        name: "simple_polygon",
        run: simple_polygon,
    },
    Check {
        name: "triangulation_count",
        run: triangulation_count,
    },
];

/// CT15: polygon with a prescribed triangulation count.
pub struct Triangulation;

impl Problem for Triangulation {
    const NAME: &'static str = "triangulation";
    type Construction = Polygon;

    fn construct(params: &Parameters, _config: &SearchConfig) -> Result<Option<Polygon>, ConstructionError> {
        build(params.get_or("n", 5)).map(Some)
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<Polygon, VerifyError> {
        Polygon::from_value(value)
    }

    fn checks() -> &'static [Check<Polygon>] {
        &CHECKS
    }
}
