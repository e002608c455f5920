//! An integer that is an m-digit palindrome in m distinct bases.
//!
//! With `K = m!·Z` and `N = K^(m−1)`, the base `K/i − 1` expansion of `N` has
//! digits `i^(m−1)·C(m−1, j)`, which read the same both ways. `Z` is chosen
//! large enough that none of those digits reaches the base, so there are no
//! carries.

use itertools::Itertools;
use num_bigint::{BigInt, BigUint};
use num_integer::{binomial, Integer};
use num_traits::{One, Pow, Signed, Zero};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SearchConfig;
use crate::construction::{as_bigint, describe, json_bigint, json_bigint_vec};
use crate::error::{ConstructionError, ParameterError, VerifyError};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

/// Number of bases when the `m` parameter is absent
const DEFAULT_BASES: i64 = 4;

/// `N` together with the bases `a_1..a_m`, serialised as `{"n": N, "a": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalindromicBases {
    #[serde(with = "json_bigint")]
    pub n: BigInt,
    #[serde(with = "json_bigint_vec")]
    pub a: Vec<BigInt>,
}

fn factorial(m: usize) -> BigUint {
    (1..=m).map(BigUint::from).product()
}

/// Smallest safe multiplier `Z` for `m` bases.
fn multiplier(m: usize) -> BigUint {
    let top_binomial = binomial(BigUint::from(m - 1), BigUint::from((m - 1) / 2));
    let bound = Pow::pow(BigUint::from(m), m) * top_binomial + BigUint::from(2 * m);
    let z = Integer::div_ceil(&bound, &factorial(m)) + BigUint::one();
    z.max(BigUint::from(2u32))
}

/// Build `N` and `m` bases in which it is an `m`-digit palindrome.
pub fn build(m: usize) -> Result<PalindromicBases, ConstructionError> {
    if m < 2 {
        return Err(ParameterError::new("m", format!("must be at least 2, got {m}")).into());
    }
    let z = multiplier(m);
    let k = BigInt::from(factorial(m) * &z);
    let n = Pow::pow(&k, m - 1);
    let a: Vec<BigInt> = (1..=m).map(|i| &k / BigInt::from(i) - BigInt::one()).collect();
    tracing::debug!(m, %z, %k, "palindromic bases chosen");

    if let Some(bad) = a.iter().find(|b| **b <= BigInt::one()) {
        return Err(ConstructionError::internal(format!("base {bad} is not greater than 1")));
    }
    if !all_distinct(&a) {
        return Err(ConstructionError::internal("bases are not distinct"));
    }
    Ok(PalindromicBases { n, a })
}

fn all_distinct(values: &[BigInt]) -> bool {
    values.iter().all_unique()
}

/// Most significant digit first; `value` must be non-negative and `base > 1`.
pub fn digits_in_base(value: &BigInt, base: &BigInt) -> Vec<BigInt> {
    if value.is_zero() {
        return vec![BigInt::zero()];
    }
    let mut digits = Vec::new();
    let mut rest = value.clone();
    while rest.is_positive() {
        let (quotient, digit) = rest.div_rem(base);
        digits.push(digit);
        rest = quotient;
    }
    digits.reverse();
    digits
}

fn bases_wanted(params: &Parameters) -> Result<usize, VerifyError> {
    Ok(params.at_least("m", DEFAULT_BASES, 1)?)
}

/// `m` bases, each greater than 1, no two alike, and a positive `n`.
fn base_list(construction: &PalindromicBases, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let m = bases_wanted(params)?;
    let PalindromicBases { n, a } = construction;
    if a.len() != m {
        return Err(VerifyError::violation(format!(
            "expected exactly m={m} bases, got {}",
            a.len()
        )));
    }
    if let Some(bad) = a.iter().find(|b| **b <= BigInt::one()) {
        return Err(VerifyError::violation(format!(
            "all bases must be integers greater than 1, got {bad}"
        )));
    }
    if !all_distinct(a) {
        return Err(VerifyError::violation("bases must be distinct"));
    }
    if !n.is_positive() {
        return Err(VerifyError::violation(format!("n must be a positive integer, got {n}")));
    }
    Ok(())
}

/// In every base, `n` has exactly `m` digits that read the same both ways.
fn palindromes(construction: &PalindromicBases, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let m = bases_wanted(params)?;
    let PalindromicBases { n, a } = construction;
    if !n.is_positive() {
        return Err(VerifyError::violation(format!("n must be a positive integer, got {n}")));
    }
    for (idx, base) in (1..).zip(a) {
        if *base <= BigInt::one() {
            return Err(VerifyError::violation(format!("base a_{idx}={base} is not greater than 1")));
        }
        let digits = digits_in_base(n, base);
        if digits.len() != m {
            return Err(VerifyError::violation(format!(
                "in base a_{idx}={base}, n has {} digits, but must have exactly m={m} digits",
                digits.len()
            )));
        }
        if !digits.iter().eq(digits.iter().rev()) {
            return Err(VerifyError::violation(format!(
                "in base a_{idx}={base}, the expansion is not a palindrome"
            )));
        }
    }
    Ok(())
}

static CHECKS: [Check<PalindromicBases>; 2] = [
    Check {
        name: "base_list",
        run: base_list,
    },
    Check {
        name: "palindromes",
        run: palindromes,
    },
];

/// CT9: integer with palindromic expansions in many bases.
pub struct Palindrome;

impl Problem for Palindrome {
    const NAME: &'static str = "palindrome";
    type Construction = PalindromicBases;

    fn construct(params: &Parameters, _config: &SearchConfig) -> Result<Option<PalindromicBases>, ConstructionError> {
        let m = params.at_least("m", DEFAULT_BASES, 2)?;
        build(m).map(Some)
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<PalindromicBases, VerifyError> {
        let object = value
            .as_object()
            .ok_or_else(|| VerifyError::malformed("submission must be an object with keys 'n' and 'a'"))?;
        let (n, a) = match (object.get("n"), object.get("a")) {
            (Some(n), Some(a)) => (n, a),
            _ => return Err(VerifyError::malformed("missing 'n' or 'a' in submission")),
        };
        let n = as_bigint(n)
            .ok_or_else(|| VerifyError::malformed(format!("n must be an integer, got {}", describe(n))))?;
        let a = a
            .as_array()
            .and_then(|items| items.iter().map(as_bigint).collect::<Option<Vec<_>>>())
            .ok_or_else(|| VerifyError::malformed(format!("a must be a list of integers, got {}", describe(a))))?;
        Ok(PalindromicBases { n, a })
    }

    fn checks() -> &'static [Check<PalindromicBases>] {
        &CHECKS
    }
}
