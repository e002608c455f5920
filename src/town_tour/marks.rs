//! Marked interior intersections where the tour turns right.
//!
//! One hand-derived pattern per residue of `n mod 3`. Every pattern keeps its
//! points within `1 <= x, y <= n - 2`.

use std::collections::BTreeSet;

use super::Corner;

/// Alternating diagonal strides used after the seed points
const STRIDES: [(i64, i64); 2] = [(1, 2), (2, 1)];

/// The marks recipe, chosen by `n mod 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPattern {
    /// `n ≡ 2`: (2,1) then strides (+1,+2), (+2,+1), ...
    Staircase,
    /// `n ≡ 1`: seeds (2,1), (1,2), (4,3), then strides starting with (+1,+2)
    SeededFromFourThree,
    /// `n ≡ 0`: seeds (2,1), (1,2), (3,2), (4,4), then strides starting with (+2,+1)
    SeededFromFourFour,
}

impl MarkPattern {
    pub fn for_size(n: usize) -> Self {
        match n % 3 {
            2 => Self::Staircase,
            1 => Self::SeededFromFourThree,
            _ => Self::SeededFromFourFour,
        }
    }

    /// Marks for an `n × n` town.
    pub fn marks(self, n: usize) -> BTreeSet<Corner> {
        let limit = n as i64 - 2;
        if limit < 1 {
            return BTreeSet::new();
        }
        match self {
            Self::Staircase => staircase(limit),
            Self::SeededFromFourThree => seeded(limit, &[(2, 1), (1, 2), (4, 3)], 0),
            Self::SeededFromFourFour => seeded(limit, &[(2, 1), (1, 2), (3, 2), (4, 4)], 1),
        }
    }
}

fn within(limit: i64, (x, y): (i64, i64)) -> bool {
    (1..=limit).contains(&x) && (1..=limit).contains(&y)
}

/// Walk alternating strides from `from` while the next point stays in bounds.
fn stride_from(limit: i64, from: (i64, i64), mut stride: usize, marks: &mut BTreeSet<Corner>) {
    let mut pos = from;
    loop {
        let next = (pos.0 + STRIDES[stride].0, pos.1 + STRIDES[stride].1);
        if next.0 > limit || next.1 > limit {
            break;
        }
        pos = next;
        marks.insert(Corner::new(pos.0, pos.1));
        stride ^= 1;
    }
}

fn staircase(limit: i64) -> BTreeSet<Corner> {
    let mut marks = BTreeSet::new();
    let start = (2, 1);
    if within(limit, start) {
        marks.insert(Corner::new(start.0, start.1));
    }
    stride_from(limit, start, 0, &mut marks);
    marks
}

/// Place the seeds that fit; strides continue only if the final seed fits.
fn seeded(limit: i64, seeds: &[(i64, i64)], first_stride: usize) -> BTreeSet<Corner> {
    let mut marks = BTreeSet::new();
    let mut last = None;
    for &seed in seeds {
        if within(limit, seed) {
            marks.insert(Corner::new(seed.0, seed.1));
            last = Some(seed);
        }
    }
    if let (Some(last), Some(&final_seed)) = (last, seeds.last()) {
        if last == final_seed {
            stride_from(limit, last, first_stride, &mut marks);
        }
    }
    marks
}
