//! Straight-or-right tour over every directed street side of an `n × n` town.
//!
//! The town is the grid `(0..=n)²`. Interior streets can be driven both ways;
//! boundary streets run one way, clockwise around the town. That gives `4n²`
//! directed sides. The constructor places "turn right" marks at interior
//! intersections and drives the deterministic local rule until it returns to
//! its first side; the verifier rebuilds the sides from scratch and replays the
//! submitted turning points.

pub mod marks;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use marks::MarkPattern;

use crate::config::SearchConfig;
use crate::construction::{as_integer, describe};
use crate::error::{ConstructionError, ParameterError, VerifyError};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

/// Compass heading of a unit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Clockwise quarter turn
    pub fn turn_right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Heading of a unit step, if `(dx, dy)` is one
    pub fn of_step(dx: i64, dy: i64) -> Option<Direction> {
        match (dx, dy) {
            (0, 1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, -1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }
}

/// A street intersection, serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Corner {
    pub x: i64,
    pub y: i64,
}

impl Corner {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Corner {
        let (dx, dy) = direction.delta();
        Corner::new(self.x + dx, self.y + dy)
    }

    fn within(self, n: i64) -> bool {
        (0..=n).contains(&self.x) && (0..=n).contains(&self.y)
    }

    fn on_boundary(self, n: i64) -> bool {
        self.x == 0 || self.x == n || self.y == 0 || self.y == n
    }
}

impl From<[i64; 2]> for Corner {
    fn from([x, y]: [i64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Corner> for [i64; 2] {
    fn from(c: Corner) -> Self {
        [c.x, c.y]
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A directed street side between neighbouring intersections
type Side = (Corner, Corner);

/// Compressed tour: the start, every turning point, and the final point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tour(Vec<Corner>);

impl Tour {
    pub fn new(points: Vec<Corner>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Corner] {
        &self.0
    }
}

/// Drive the local rule from side `(n,0) → (n−1,0)` until the start side comes
/// around again. Returns every visited intersection, ending back at `(n, 0)`.
fn drive(n: i64, marks: &BTreeSet<Corner>) -> Result<Vec<Corner>, ConstructionError> {
    let expected = (4 * n * n) as usize;
    let start: Side = (Corner::new(n, 0), Corner::new(n - 1, 0));
    let mut visited: HashSet<Side> = HashSet::with_capacity(expected);
    visited.insert(start);

    let mut path = vec![start.0, start.1];
    let mut heading = Direction::West;
    let mut at = start.1;
    loop {
        if at.on_boundary(n) || marks.contains(&at) {
            heading = heading.turn_right();
        }
        let next = at.step(heading);
        let side = (at, next);
        if side == start {
            break;
        }
        if !next.within(n) {
            return Err(ConstructionError::internal(format!("tour left the town at {next}")));
        }
        if !visited.insert(side) {
            return Err(ConstructionError::internal(format!(
                "side {at} -> {next} repeated after {} sides",
                visited.len()
            )));
        }
        if visited.len() > expected {
            return Err(ConstructionError::internal(format!(
                "tour exceeded {expected} sides"
            )));
        }
        path.push(next);
        at = next;
    }

    if visited.len() != expected {
        return Err(ConstructionError::internal(format!(
            "tour closed after {} sides, expected {expected}",
            visited.len()
        )));
    }
    Ok(path)
}

/// Keep the first point, each point where the heading changes, and the last.
fn compress(path: &[Corner]) -> Vec<Corner> {
    let Some((&first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let heading = |a: Corner, b: Corner| (b.x - a.x, b.y - a.y);
    let mut turns = vec![first];
    if let [.., last] = rest {
        for window in path.windows(3) {
            if heading(window[0], window[1]) != heading(window[1], window[2]) {
                turns.push(window[1]);
            }
        }
        if turns.last() != Some(last) {
            turns.push(*last);
        }
    }
    turns
}

/// Build the compressed tour for an `n × n` town.
///
/// There is no straight-or-right tour covering every side when `n = 3`, so
/// that size yields `Ok(None)`.
pub fn build(n: usize) -> Result<Option<Tour>, ConstructionError> {
    if n == 0 {
        return Err(ParameterError::new("n", "must be a positive integer").into());
    }
    if n == 3 {
        return Ok(None);
    }
    let pattern = MarkPattern::for_size(n);
    let marks = pattern.marks(n);
    tracing::debug!(n, ?pattern, marks = marks.len(), "driving town tour");
    let path = drive(n as i64, &marks)?;
    Ok(Some(Tour::new(compress(&path))))
}

/// Every directed side of the town with its heading, rebuilt without
/// reference to the marks.
fn town_sides(n: i64) -> BTreeMap<Side, Direction> {
    let mut sides = BTreeMap::new();
    let mut add = |from: Corner, to: Corner| {
        if let Some(d) = Direction::of_step(to.x - from.x, to.y - from.y) {
            sides.insert((from, to), d);
        }
    };
    for y in 0..=n {
        for x in 0..n {
            let (a, b) = (Corner::new(x, y), Corner::new(x + 1, y));
            if y == 0 {
                add(b, a);
            } else if y == n {
                add(a, b);
            } else {
                add(a, b);
                add(b, a);
            }
        }
    }
    for x in 0..=n {
        for y in 0..n {
            let (a, b) = (Corner::new(x, y), Corner::new(x, y + 1));
            if x == 0 {
                add(a, b);
            } else if x == n {
                add(b, a);
            } else {
                add(a, b);
                add(b, a);
            }
        }
    }
    sides
}

/// Heading and length of the straight segment `a → b`.
fn segment(a: Corner, b: Corner) -> Result<(Direction, i64), VerifyError> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if dx != 0 && dy != 0 {
        return Err(VerifyError::violation(format!(
            "points {a} and {b} are not axis-aligned (no diagonals allowed)"
        )));
    }
    if dx == 0 && dy == 0 {
        return Err(VerifyError::violation(format!(
            "zero-length segment at {a} in turning points list"
        )));
    }
    let length = dx.abs() + dy.abs();
    let heading = Direction::of_step(dx.signum(), dy.signum())
        .ok_or_else(|| VerifyError::violation(format!("no heading from {a} to {b}")))?;
    Ok((heading, length))
}

fn required_n(params: &Parameters) -> Result<i64, VerifyError> {
    let n = params.require("n")?;
    if n <= 0 {
        return Err(ParameterError::new("n", "must be a positive integer").into());
    }
    Ok(n)
}

/// Only real turning points are listed, all inside the town.
fn compressed_turning_points(tour: &Tour, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = required_n(params)?;
    let points = tour.points();
    for triple in points.windows(3) {
        let (before, _) = segment(triple[0], triple[1])?;
        let (after, _) = segment(triple[1], triple[2])?;
        if before.is_horizontal() == after.is_horizontal() {
            return Err(VerifyError::violation(format!(
                "intermediate intersections on straight segments must be omitted; \
                 remove redundant point {} between {} and {}",
                triple[1], triple[0], triple[2]
            )));
        }
    }
    if let [a, b] = points {
        segment(*a, *b)?;
    }
    if let Some(outside) = points.iter().find(|p| !p.within(n)) {
        return Err(VerifyError::violation(format!(
            "point {outside} lies outside the town grid [0,{n}]x[0,{n}]"
        )));
    }
    Ok(())
}

/// Replayed step by step, the route drives every directed side exactly once
/// and never turns left or back.
fn directed_sides_once(tour: &Tour, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = required_n(params)?;
    let sides = town_sides(n);
    let mut used: HashSet<Side> = HashSet::with_capacity(sides.len());
    let mut previous: Option<Direction> = None;

    for pair in tour.points().windows(2) {
        let (heading, length) = segment(pair[0], pair[1])?;
        let mut at = pair[0];
        for _ in 0..length {
            let next = at.step(heading);
            if !sides.contains_key(&(at, next)) {
                return Err(VerifyError::violation(format!(
                    "move {at} -> {next} is not along an allowed street side"
                )));
            }
            if !used.insert((at, next)) {
                return Err(VerifyError::violation(format!(
                    "street side {at} -> {next} is used more than once"
                )));
            }
            if let Some(prev) = previous {
                if heading != prev && heading != prev.turn_right() {
                    return Err(VerifyError::violation(format!(
                        "only straight or right turns are allowed; turned from {prev:?} to {heading:?} at {at}"
                    )));
                }
            }
            previous = Some(heading);
            at = next;
        }
    }

    if used.len() != sides.len() {
        let missing = sides
            .keys()
            .find(|side| !used.contains(*side))
            .map(|(a, b)| format!("; example missing side: {a} -> {b}"))
            .unwrap_or_default();
        return Err(VerifyError::violation(format!(
            "the route traverses {} directed street sides, but the town has exactly {}{missing}",
            used.len(),
            sides.len()
        )));
    }
    Ok(())
}

static CHECKS: [Check<Tour>; 2] = [
    Check {
        name: "compressed_turning_points",
        run: compressed_turning_points,
    },
    Check {
        name: "directed_sides_once",
        run: directed_sides_once,
    },
];

/// CT11: Eulerian town tour unit.
pub struct TownTour;

impl Problem for TownTour {
    const NAME: &'static str = "town_tour";
    type Construction = Tour;

    fn construct(params: &Parameters, _config: &SearchConfig) -> Result<Option<Tour>, ConstructionError> {
        let n = params.require("n")?;
        let n = usize::try_from(n)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParameterError::new("n", "must be a positive integer"))?;
        build(n)
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<Tour, VerifyError> {
        let items = value
            .as_array()
            .ok_or_else(|| VerifyError::malformed("path must be a list of [x, y] points"))?;
        let points = items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([x, y]) => match (as_integer(x), as_integer(y)) {
                    (Some(x), Some(y)) => Ok(Corner::new(x, y)),
                    _ => Err(VerifyError::malformed(format!(
                        "coordinates must be integers, got {}",
                        describe(item)
                    ))),
                },
                _ => Err(VerifyError::malformed(format!(
                    "each vertex must be a list of length 2, got {}",
                    describe(item)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if points.len() < 2 {
            return Err(VerifyError::malformed("path must contain at least two points"));
        }
        Ok(Tour::new(points))
    }

    fn checks() -> &'static [Check<Tour>] {
        &CHECKS
    }
}
