//! Permutations of `1..n` whose positive displacements `|a_i − i|` are
//! pairwise distinct.
//!
//! Such a permutation exists iff `n ≡ 0 or 1 (mod 4)`. The constructor
//! searches for the stronger condition that *all* n displacements
//! `0..n` occur exactly once, assigning one displacement value at a time
//! and always picking the value with the fewest remaining options (MRV).

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use serde::Serialize;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::construction::{as_integer, describe, parse_text};
use crate::error::{ConstructionError, ParameterError, VerifyError};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

/// A permutation of `1..=n`, stored as the one-line notation `a_1, ..., a_n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permutation(Vec<i64>);

impl Permutation {
    pub fn new(values: Vec<i64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `|a_i − i|` for each 1-based position `i`
    pub fn displacements(&self) -> Vec<u64> {
        self.0
            .iter()
            .zip(1i64..)
            .map(|(&a, i)| a.abs_diff(i))
            .collect()
    }
}

/// Mutable backtracking state over positions and values `1..=n`.
struct SearchState {
    n: usize,
    /// `assignment[i - 1]` is the value at position `i`, 0 while unassigned
    assignment: Vec<usize>,
    pos_free: Vec<bool>,
    val_free: Vec<bool>,
    /// Displacements not yet realised by any position
    remaining: BTreeSet<usize>,
    steps: usize,
    max_steps: usize,
}

/// A tentative `position -> value` assignment that is undone on drop unless kept.
struct Tentative<'s> {
    state: &'s mut SearchState,
    position: usize,
    value: usize,
    keep: bool,
}

impl Deref for Tentative<'_> {
    type Target = SearchState;

    fn deref(&self) -> &SearchState {
        self.state
    }
}

impl DerefMut for Tentative<'_> {
    fn deref_mut(&mut self) -> &mut SearchState {
        self.state
    }
}

impl Drop for Tentative<'_> {
    fn drop(&mut self) {
        if !self.keep {
            self.state.assignment[self.position - 1] = 0;
            self.state.pos_free[self.position] = true;
            self.state.val_free[self.value] = true;
        }
    }
}

impl SearchState {
    fn new(n: usize, max_steps: usize) -> Self {
        Self {
            n,
            assignment: vec![0; n],
            pos_free: vec![true; n + 1],
            val_free: vec![true; n + 1],
            remaining: (0..n).collect(),
            steps: 0,
            max_steps,
        }
    }

    /// Feasible `(position, value)` pairs realising displacement `d`.
    fn candidates(&self, d: usize) -> Vec<(usize, usize)> {
        let n = self.n;
        if d == 0 {
            return (1..=n)
                .filter(|&i| self.pos_free[i] && self.val_free[i])
                .map(|i| (i, i))
                .collect();
        }
        let mut pairs = Vec::new();
        for i in (1..=n).filter(|&i| self.pos_free[i]) {
            if i + d <= n && self.val_free[i + d] {
                pairs.push((i, i + d));
            }
            if i > d && self.val_free[i - d] {
                pairs.push((i, i - d));
            }
        }
        // Pairs touching the ends of the range first; stable for equal keys
        pairs.sort_by_key(|&(i, j)| i.min(n + 1 - i).min(j).min(n + 1 - j));
        pairs
    }

    /// While displacement 0 is unplaced, some index must be free as both
    /// position and value.
    fn zero_still_placeable(&self) -> bool {
        !self.remaining.contains(&0)
            || (1..=self.n).any(|i| self.pos_free[i] && self.val_free[i])
    }

    /// MRV choice: fewest candidates, ties to the larger displacement. A
    /// displacement with no candidates is returned at once so the caller fails.
    fn choose_displacement(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for &d in &self.remaining {
            let count = self.candidates(d).len();
            if count == 0 {
                return Some(d);
            }
            match best {
                Some((best_count, best_d)) if count > best_count || (count == best_count && d < best_d) => {}
                _ => best = Some((count, d)),
            }
        }
        best.map(|(_, d)| d)
    }

    fn assign(&mut self, position: usize, value: usize) -> Result<Tentative<'_>, ConstructionError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ConstructionError::SearchExhausted { steps: self.max_steps });
        }
        self.assignment[position - 1] = value;
        self.pos_free[position] = false;
        self.val_free[value] = false;
        Ok(Tentative {
            state: self,
            position,
            value,
            keep: false,
        })
    }

    fn backtrack(&mut self, placed: usize) -> Result<bool, ConstructionError> {
        if placed == self.n {
            return Ok(true);
        }
        if !self.zero_still_placeable() {
            return Ok(false);
        }
        let Some(d) = self.choose_displacement() else {
            return Ok(false);
        };
        let candidates = self.candidates(d);
        if candidates.is_empty() {
            return Ok(false);
        }

        self.remaining.remove(&d);
        for (i, j) in candidates {
            if !self.pos_free[i] || !self.val_free[j] {
                continue;
            }
            let mut tentative = self.assign(i, j)?;
            if tentative.backtrack(placed + 1)? {
                tentative.keep = true;
                return Ok(true);
            }
        }
        self.remaining.insert(d);
        Ok(false)
    }
}

/// Search for a distinct-displacement permutation of `1..=n`.
///
/// Returns `Ok(None)` when `n ≡ 2, 3 (mod 4)`, where none exists.
pub fn search(n: usize, max_steps: usize) -> Result<Option<Permutation>, ConstructionError> {
    if n == 0 {
        return Err(ParameterError::new("n", "must be a positive integer").into());
    }
    if n % 4 > 1 {
        return Ok(None);
    }
    let fixed: &[i64] = match n {
        1 => &[1],
        4 => &[3, 2, 4, 1],
        5 => &[4, 2, 5, 3, 1],
        _ => &[],
    };
    if !fixed.is_empty() {
        return Ok(Some(Permutation::new(fixed.to_vec())));
    }

    let mut state = SearchState::new(n, max_steps);
    let found = state.backtrack(0)?;
    tracing::debug!(n, steps = state.steps, found, "displacement search finished");
    if !found {
        return Ok(None);
    }
    Ok(Some(Permutation::new(
        state.assignment.iter().map(|&v| v as i64).collect(),
    )))
}

/// Accept a bare comma-separated list such as `3, 2, 4, 1` or `(3, 2, 4, 1)`.
fn parse_bare_list(text: &str) -> Option<Value> {
    let mut body = text.trim();
    if (body.starts_with('[') && body.ends_with(']')) || (body.starts_with('(') && body.ends_with(')')) {
        body = body[1..body.len() - 1].trim();
    }
    if body.is_empty() {
        return Some(Value::Array(Vec::new()));
    }
    body.split(',')
        .map(|part| part.trim().parse::<i64>().ok().map(Value::from))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn required_n(params: &Parameters) -> Result<i64, VerifyError> {
    let n = params.require("n")?;
    if n <= 0 {
        return Err(ParameterError::new("n", "must be a positive integer").into());
    }
    Ok(n)
}

/// The parameter itself must admit a solution.
fn n_condition(_perm: &Permutation, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = required_n(params)?;
    if n % 4 > 1 {
        return Err(VerifyError::violation(format!(
            "n must satisfy n ≡ 0 or 1 (mod 4); got n = {n} (n % 4 = {})",
            n % 4
        )));
    }
    Ok(())
}

fn permutation_and_displacements(
    perm: &Permutation,
    params: &Parameters,
    _config: &SearchConfig,
) -> Result<(), VerifyError> {
    let n = required_n(params)?;
    if perm.len() as i64 != n {
        return Err(VerifyError::violation(format!(
            "incorrect length: expected {n}, got {}",
            perm.len()
        )));
    }
    if let Some(&bad) = perm.values().iter().find(|&&v| v < 1 || v > n) {
        return Err(VerifyError::violation(format!("entry {bad} is outside the range 1..{n}")));
    }
    let mut seen_value = vec![false; n as usize + 1];
    for &v in perm.values() {
        if std::mem::replace(&mut seen_value[v as usize], true) {
            return Err(VerifyError::violation(format!(
                "value {v} repeats; entries must be a permutation of 1..{n}"
            )));
        }
    }

    let mut first_position = vec![0usize; n as usize];
    for (i, d) in (1usize..).zip(perm.displacements()) {
        if d == 0 {
            continue;
        }
        let slot = &mut first_position[d as usize];
        if *slot != 0 {
            return Err(VerifyError::violation(format!(
                "positive displacements are not distinct: |a_{j} - {j}| = |a_{i} - {i}| = {d}",
                j = *slot
            )));
        }
        *slot = i;
    }
    Ok(())
}

static CHECKS: [Check<Permutation>; 2] = [
    Check {
        name: "n_condition",
        run: n_condition,
    },
    Check {
        name: "permutation_and_displacements",
        run: permutation_and_displacements,
    },
];

/// CT7: distinct-displacement permutation unit.
pub struct Displacement;

impl Problem for Displacement {
    const NAME: &'static str = "displacement";
    type Construction = Permutation;

    fn construct(params: &Parameters, config: &SearchConfig) -> Result<Option<Permutation>, ConstructionError> {
        let n = params.require("n")?;
        let n = usize::try_from(n)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParameterError::new("n", "must be a positive integer"))?;
        search(n, config.max_steps)
    }

    fn read_text(text: &str) -> Result<Value, VerifyError> {
        parse_text(text).or_else(|err| parse_bare_list(text).ok_or(err))
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<Permutation, VerifyError> {
        let items = value
            .as_array()
            .ok_or_else(|| VerifyError::malformed("construction must be a list of integers"))?;
        items
            .iter()
            .map(|item| {
                as_integer(item).ok_or_else(|| {
                    VerifyError::malformed(format!("all entries must be integers, got {}", describe(item)))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Permutation::new)
    }

    fn checks() -> &'static [Check<Permutation>] {
        &CHECKS
    }
}
