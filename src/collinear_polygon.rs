//! Simple polygons in which every side has another side on its extension.
//!
//! The base shape is the outline of two regular k-gons, one rotated by π/k:
//! a 4k-gon whose sides pair up along the k-gon edges. A splice pass cuts a
//! seven-vertex notch between two neighbouring tips, bounded by two lines
//! through a common point, and every new side again lands on a line shared
//! with another side. Up to three passes give every `n = 4k + 7p` with
//! `k >= 3` and `p <= 3`.
//!
//! The verifier works on the vertex list alone: count, simplicity with
//! non-zero area, no straight or doubled-back corners, and a collinear
//! partner for every side.

use std::f64::consts::PI;

use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::{ConstructionError, ParameterError, VerifyError};
use crate::geometry::{signed_area, Point, Polygon, COLLINEAR_EPS};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

/// Smallest k-gon pair the outline is built from
const MIN_STAR: usize = 3;

/// Vertices added by one splice pass
const NOTCH_VERTICES: usize = 7;

/// Parameter slack for proper edge crossings of the two k-gons
const CROSSING_EPS: f64 = 1e-12;

/// Parameter slack when cutting a side with a notch line
const CUT_EPS: f64 = 1e-10;

/// Relative direction tolerance for matching lines and doubled-back corners
const DIR_TOL: f64 = 1e-3;

/// Absolute tolerance on the offset of two matched lines
const OFFSET_TOL: f64 = 1e-3;

/// Relative tolerance below which a corner counts as a straight angle
const STRAIGHT_TOL: f64 = 1e-6;

type Vector = (f64, f64);

fn delta(from: Point, to: Point) -> Vector {
    (to.x - from.x, to.y - from.y)
}

fn perp_dot((ax, ay): Vector, (bx, by): Vector) -> f64 {
    ax * by - ay * bx
}

fn rotate((x, y): Vector, angle: f64) -> Vector {
    let (s, c) = angle.sin_cos();
    (c * x - s * y, s * x + c * y)
}

/// Unit-circle regular k-gon, counter-clockwise from angle `start`.
fn regular_polygon(k: usize, start: f64) -> Vec<Point> {
    (0..k)
        .map(|i| {
            let angle = start + 2.0 * PI * i as f64 / k as f64;
            Point::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Crossing point of `p p2` and `q q2` strictly inside both segments.
fn proper_crossing(p: Point, p2: Point, q: Point, q2: Point) -> Option<Point> {
    let r = delta(p, p2);
    let s = delta(q, q2);
    let rxs = perp_dot(r, s);
    if rxs.abs() < CROSSING_EPS {
        return None;
    }
    let qp = delta(p, q);
    let t = perp_dot(qp, s) / rxs;
    let u = perp_dot(qp, r) / rxs;
    let inside = |v: f64| CROSSING_EPS < v && v < 1.0 - CROSSING_EPS;
    (inside(t) && inside(u)).then(|| Point::new(p.x + t * r.0, p.y + t * r.1))
}

/// Boundary of the union of a regular k-gon and its copy rotated by π/k,
/// in angular order starting from an inner vertex.
fn star_outline(k: usize) -> Result<Vec<Point>, ConstructionError> {
    let outer = regular_polygon(k, 0.0);
    let rotated = regular_polygon(k, PI / k as f64);

    // (vertex, is a k-gon tip)
    let mut tagged: Vec<(Point, bool)> = outer.iter().chain(&rotated).map(|&p| (p, true)).collect();
    for i in 0..k {
        for j in 0..k {
            let crossing = proper_crossing(outer[i], outer[(i + 1) % k], rotated[j], rotated[(j + 1) % k]);
            if let Some(x) = crossing {
                tagged.push((x, false));
            }
        }
    }
    if tagged.len() != 4 * k {
        return Err(ConstructionError::internal(format!(
            "outline for k = {k} has {} vertices, expected {}",
            tagged.len(),
            4 * k
        )));
    }

    tagged.sort_by(|(a, _), (b, _)| a.y.atan2(a.x).total_cmp(&b.y.atan2(b.x)));
    // A tip at angle π can round to -π and sort first
    if tagged.first().is_some_and(|&(_, tip)| tip) {
        tagged.rotate_left(1);
    }
    Ok(tagged.into_iter().map(|(p, _)| p).collect())
}

/// Where the line `p + t·dir` meets the line through `a b`, as the parameter
/// along `a b` and the point itself.
fn cut(a: Point, b: Point, p: Point, dir: Vector) -> Option<(f64, Point)> {
    let s = delta(a, b);
    let sxr = perp_dot(s, dir);
    if sxr.abs() < CUT_EPS {
        return None;
    }
    let u = perp_dot(delta(a, p), dir) / sxr;
    Some((u, Point::new(a.x + u * s.0, a.y + u * s.1)))
}

fn cut_side(a: Point, b: Point, p: Point, dir: Vector) -> Option<Point> {
    cut(a, b, p, dir)
        .filter(|&(u, _)| (-CUT_EPS..=1.0 + CUT_EPS).contains(&u))
        .map(|(_, x)| x)
}

/// As [`cut_side`], on the ray that continues `a b` beyond `b`.
fn cut_beyond(a: Point, b: Point, p: Point, dir: Vector) -> Option<Point> {
    cut(a, b, p, dir).filter(|&(u, _)| u >= 1.0 - CUT_EPS).map(|(_, x)| x)
}

/// Splice the notch into the corner run `v[1]..=v[6]`.
///
/// Two lines through the midpoint of `v[1] v[3]`, one parallel to `v[2] v[4]`
/// and one turned slightly from it, cut the sides `v[2] v[3]` and `v[3] v[4]`
/// and the extension of `v[6] v[5]` past `v[5]`.
fn splice_notch(v: &[Point]) -> Result<Vec<Point>, ConstructionError> {
    let n = v.len();
    if n < NOTCH_VERTICES {
        return Err(ConstructionError::internal(format!("cannot notch a {n}-gon")));
    }
    let hub = v[1].midpoint(v[3]);
    let parallel = delta(v[2], v[4]);
    let turned = rotate(parallel, 2.0 * PI / (8.0 * n as f64));

    let cuts = [
        cut_side(v[2], v[3], hub, parallel),
        cut_side(v[2], v[3], hub, turned),
        cut_side(v[3], v[4], hub, parallel),
        cut_side(v[3], v[4], hub, turned),
        cut_beyond(v[6], v[5], hub, parallel),
        cut_beyond(v[6], v[5], hub, turned),
    ];
    let [Some(q2), Some(q3), Some(q4), Some(q5), Some(q6), Some(q7)] = cuts else {
        return Err(ConstructionError::internal(format!(
            "notch lines miss their sides on a {n}-gon"
        )));
    };

    let mut out = Vec::with_capacity(n + NOTCH_VERTICES);
    out.extend_from_slice(&v[..3]);
    out.extend([q3, hub, q2, v[3], q4, q6, q7, q5, v[4]]);
    out.extend_from_slice(&v[5..]);
    Ok(out)
}

fn unsupported(n: i64) -> ConstructionError {
    ParameterError::new(
        "n",
        format!("no construction for n = {n}; n must be 4k + 7p with k >= 3 and 0 <= p <= 3"),
    )
    .into()
}

/// Build an `n`-gon in which every side has a collinear partner.
pub fn build(n: i64) -> Result<Polygon, ConstructionError> {
    let size = usize::try_from(n).map_err(|_| unsupported(n))?;
    let passes = (4 - size % 4) % 4;
    let k = size
        .checked_sub(NOTCH_VERTICES * passes)
        .map(|rest| rest / 4)
        .filter(|&k| k >= MIN_STAR)
        .ok_or_else(|| unsupported(n))?;

    let shift = 2 * (k / 2 + 1);
    let mut vertices = star_outline(k)?;
    for pass in 0..passes {
        if pass > 0 {
            vertices.rotate_right(shift);
        }
        vertices = splice_notch(&vertices)?;
    }
    if vertices.len() != size {
        return Err(ConstructionError::internal(format!(
            "built {} vertices for n = {n}",
            vertices.len()
        )));
    }
    tracing::debug!(n, k, passes, "built collinear-partner polygon");
    Ok(Polygon::new(vertices))
}

/// Supporting line `a·x + b·y = c` with unit normal in a canonical half-plane.
fn canonical_line(p: Point, q: Point) -> Option<(f64, f64, f64)> {
    let (dx, dy) = delta(p, q);
    let norm = dx.hypot(dy);
    if norm <= COLLINEAR_EPS {
        return None;
    }
    let (mut a, mut b) = (-dy / norm, dx / norm);
    if a < -DIR_TOL || (a.abs() <= DIR_TOL && b < -DIR_TOL) {
        (a, b) = (-a, -b);
    }
    Some((a, b, a * p.x + b * p.y))
}

fn same_line((a1, b1, c1): (f64, f64, f64), (a2, b2, c2): (f64, f64, f64)) -> bool {
    (a1 - a2).abs() + (b1 - b2).abs() <= 5.0 * DIR_TOL && (c1 - c2).abs() <= OFFSET_TOL
}

fn vertex_count(polygon: &Polygon, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = params.require("n")?;
    if polygon.len() as i64 != n {
        return Err(VerifyError::violation(format!(
            "expected {n} vertices, got {}",
            polygon.len()
        )));
    }
    Ok(())
}

fn simple_with_area(polygon: &Polygon, _params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = polygon.len();
    if n < 3 {
        return Err(VerifyError::violation("polygon must have at least 3 vertices"));
    }
    if 2.0 * signed_area(polygon.vertices()).abs() <= COLLINEAR_EPS {
        return Err(VerifyError::violation("polygon area must be nonzero"));
    }
    if let Some(i) = (0..n).find(|&i| {
        let (a, b) = polygon.edge(i);
        (b.x - a.x).hypot(b.y - a.y) <= COLLINEAR_EPS
    }) {
        return Err(VerifyError::violation(format!("edge {i} has zero length")));
    }
    if let Some((i, j)) = polygon.first_crossing() {
        return Err(VerifyError::violation(format!(
            "polygon not simple: edges ({i}, {}) and ({j}, {}) intersect",
            i + 1,
            (j + 1) % n
        )));
    }
    Ok(())
}

/// Consecutive sides must actually turn: neither continue straight on nor
/// double back along the same line.
fn no_straight_angles(polygon: &Polygon, _params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = polygon.len();
    for i in 0..n {
        let (p0, p1) = polygon.edge(i);
        let (_, p2) = polygon.edge((i + 1) % n);
        let (v1, v2) = (delta(p0, p1), delta(p1, p2));
        let lengths = v1.0.hypot(v1.1) * v2.0.hypot(v2.1);
        if lengths <= COLLINEAR_EPS * COLLINEAR_EPS {
            continue;
        }
        let sine = perp_dot(v1, v2).abs() / lengths;
        let dot = v1.0 * v2.0 + v1.1 * v2.1;
        let vertex = (i + 1) % n;
        if dot > 0.0 && sine <= STRAIGHT_TOL {
            return Err(VerifyError::violation(format!(
                "straight (180°) angle at vertex {vertex}"
            )));
        }
        if dot < 0.0 && sine <= DIR_TOL {
            return Err(VerifyError::violation(format!(
                "boundary doubles back on itself at vertex {vertex}"
            )));
        }
    }
    Ok(())
}

fn collinear_partners(polygon: &Polygon, _params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let lines = (0..polygon.len())
        .map(|i| {
            let (p, q) = polygon.edge(i);
            canonical_line(p, q).ok_or_else(|| VerifyError::violation(format!("edge {i} is degenerate")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    for (i, &line) in lines.iter().enumerate() {
        let partnered = lines.iter().enumerate().any(|(j, &other)| j != i && same_line(line, other));
        if !partnered {
            return Err(VerifyError::violation(format!(
                "edge {i} has no other edge lying on its extension"
            )));
        }
    }
    Ok(())
}

static CHECKS: [Check<Polygon>; 4] = [
    Check {
        name: "vertex_count",
        run: vertex_count,
    },
    Check {
        name: "simple_with_area",
        run: simple_with_area,
    },
    Check {
        name: "no_straight_angles",
        run: no_straight_angles,
    },
    Check {
        name: "collinear_partners",
        run: collinear_partners,
    },
];

/// CT3: simple polygon whose every side has a collinear partner.
pub struct CollinearPolygon;

impl Problem for CollinearPolygon {
    const NAME: &'static str = "collinear_polygon";
    type Construction = Polygon;

    fn construct(params: &Parameters, _config: &SearchConfig) -> Result<Option<Polygon>, ConstructionError> {
        build(params.get_or("n", 12)).map(Some)
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<Polygon, VerifyError> {
        Polygon::from_value(value)
    }

    fn checks() -> &'static [Check<Polygon>] {
        &CHECKS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon(points: &[[f64; 2]]) -> Polygon {
        Polygon::new(points.iter().map(|&p| Point::from(p)).collect())
    }

    fn supported(n: i64) -> bool {
        let passes = (4 - n % 4) % 4;
        n - 7 * passes >= 12
    }

    #[test]
    fn test_star_outline_alternates_tips_and_inner_vertices() {
        for k in [3, 4, 7, 26, 27] {
            let outline = star_outline(k).unwrap();
            assert_eq!(outline.len(), 4 * k);
            for (i, p) in outline.iter().enumerate() {
                let radius = p.x.hypot(p.y);
                if i % 2 == 0 {
                    assert!(radius < 1.0 - 1e-6, "k = {k}: vertex {i} should be inner");
                } else {
                    assert!((radius - 1.0).abs() < 1e-12, "k = {k}: vertex {i} should be a tip");
                }
            }
        }
    }

    #[test]
    fn test_supported_sizes() {
        let missing: Vec<i64> = (0..40).filter(|&n| build(n).is_err()).collect();
        assert_eq!(missing, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 14, 15, 17, 18, 21, 22, 25, 29]);
        let err = build(13).unwrap_err();
        assert!(matches!(err, ConstructionError::Parameter(ref p) if p.key == "n"));
        assert!(build(-4).is_err());
    }

    #[test]
    fn test_constructions_verify() {
        for n in (12..=120).filter(|&n| supported(n)) {
            let params = Parameters::new().with("n", n);
            let poly = build(n).unwrap();
            assert_eq!(poly.len() as i64, n);
            let report = CollinearPolygon::verify_construction(&poly, &params, &SearchConfig::default());
            assert!(report.valid, "n = {n}: {:?}", report.failure_summary());
        }
    }

    #[test]
    fn test_outline_starting_near_pi_still_verifies() {
        // k = 26 puts a tip at angle π, which rounds to the front of the sort
        for n in [104, 111, 118, 125] {
            let params = Parameters::new().with("n", n);
            let poly = build(n).unwrap();
            let report = CollinearPolygon::verify_construction(&poly, &params, &SearchConfig::default());
            assert!(report.valid, "n = {n}: {:?}", report.failure_summary());
        }
    }

    #[test]
    fn test_default_parameter() {
        let poly = CollinearPolygon::construct(&Parameters::new(), &SearchConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(poly.len(), 12);
    }

    #[test]
    fn test_square_sides_have_no_partner() {
        let square = polygon(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let err = collinear_partners(&square, &Parameters::new(), &SearchConfig::default()).unwrap_err();
        assert_eq!(err, VerifyError::violation("edge 0 has no other edge lying on its extension"));
        assert!(no_straight_angles(&square, &Parameters::new(), &SearchConfig::default()).is_ok());
    }

    #[test]
    fn test_split_sides_are_straight_angles() {
        // Halving every side of a square gives each half a partner for free
        let octagon = polygon(&[
            [0.0, 0.0],
            [1.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [2.0, 2.0],
            [1.0, 2.0],
            [0.0, 2.0],
            [0.0, 1.0],
        ]);
        let params = Parameters::new().with("n", 8);
        let report = CollinearPolygon::verify_construction(&octagon, &params, &SearchConfig::default());
        let passed: Vec<bool> = report.checks.iter().map(|c| c.passed).collect();
        assert_eq!(passed, [true, true, false, true]);
        assert_eq!(
            report.checks[2].reason.as_deref(),
            Some("straight (180°) angle at vertex 1")
        );
    }

    #[test]
    fn test_doubled_back_corner_rejected() {
        let spike = polygon(&[[0.0, 0.0], [2.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        let err = no_straight_angles(&spike, &Parameters::new(), &SearchConfig::default()).unwrap_err();
        assert_eq!(err, VerifyError::violation("boundary doubles back on itself at vertex 1"));
    }

    #[test]
    fn test_simplicity_and_area() {
        let config = SearchConfig::default();
        let bowtie = polygon(&[[0.0, 0.0], [4.0, 2.0], [4.0, 0.0], [0.0, 1.0]]);
        let err = simple_with_area(&bowtie, &Parameters::new(), &config).unwrap_err();
        assert_eq!(err, VerifyError::violation("polygon not simple: edges (0, 1) and (2, 3) intersect"));

        let flat = polygon(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
        let err = simple_with_area(&flat, &Parameters::new(), &config).unwrap_err();
        assert_eq!(err, VerifyError::violation("polygon area must be nonzero"));

        let repeated = polygon(&[[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let err = simple_with_area(&repeated, &Parameters::new(), &config).unwrap_err();
        assert_eq!(err, VerifyError::violation("edge 1 has zero length"));
    }

    #[test]
    fn test_wrong_vertex_count() {
        let poly = build(12).unwrap();
        let params = Parameters::new().with("n", 16);
        let report = CollinearPolygon::verify_construction(&poly, &params, &SearchConfig::default());
        assert!(!report.checks[0].passed);
        assert!(report.checks[1..].iter().all(|c| c.passed));
        assert_eq!(report.checks[0].reason.as_deref(), Some("expected 16 vertices, got 12"));
    }

    #[test]
    fn test_text_round_trip() {
        let params = Parameters::new().with("n", 19);
        let poly = build(19).unwrap();
        let text = serde_json::to_string(&poly).unwrap();
        let report = CollinearPolygon::verify(&text, &params, &SearchConfig::default());
        assert!(report.valid, "{:?}", report.failure_summary());
    }
}
