//! Integer polynomials whose values at `1..=n` are distinct powers of two.
//!
//! With `g(x) = ∏(x − r)` and `h_i = g / (x − i)`, each factor
//! `f_i = 2^{a_i} + k_i·h_i` equals `2^{a_i}` at every `j ≠ i` and `2^{T_i}` at
//! `i`. Euler's theorem on the odd part of `h_i(i)` makes `k_i` integral, and
//! the product of all `f_i` takes power-of-two values with distinct exponents.

use std::str::FromStr;

use itertools::Itertools;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use crate::config::SearchConfig;
use crate::construction::{as_bigint, describe, json_bigint_vec, parse_text};
use crate::error::{ConstructionError, VerifyError};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

/// Coefficients in increasing degree order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial(Vec<BigInt>);

impl Serialize for Polynomial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        json_bigint_vec::serialize(&self.0, serializer)
    }
}

impl Polynomial {
    pub fn new(coefficients: Vec<BigInt>) -> Self {
        Self(coefficients)
    }

    pub fn coefficients(&self) -> &[BigInt] {
        &self.0
    }

    /// Horner evaluation
    pub fn eval(&self, x: &BigInt) -> BigInt {
        self.0
            .iter()
            .rev()
            .fold(BigInt::zero(), |acc, c| acc * x + c)
    }

    pub fn degree(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

fn multiply(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![BigInt::zero(); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate().filter(|(_, x)| !x.is_zero()) {
        for (j, y) in b.iter().enumerate().filter(|(_, y)| !y.is_zero()) {
            out[i + j] += x * y;
        }
    }
    out
}

/// Quotient of `p` by `(x − root)`; the remainder is dropped.
fn divide_by_root(p: &[BigInt], root: i64) -> Vec<BigInt> {
    let degree = p.len().saturating_sub(1);
    let root = BigInt::from(root);
    let mut quotient = vec![BigInt::zero(); degree];
    let mut carry = BigInt::zero();
    for k in (1..p.len()).rev() {
        carry = &p[k] + &carry * &root;
        quotient[k - 1] = carry.clone();
    }
    quotient
}

fn factorial(n: usize) -> BigInt {
    (1..=n).map(BigInt::from).product()
}

/// Euler's totient by trial division; fast when every prime factor is small.
fn totient(value: &BigUint) -> BigUint {
    if *value <= BigUint::one() {
        return BigUint::one();
    }
    let mut rest = value.clone();
    let mut result = value.clone();
    let mut d = BigUint::from(2u32);
    while &d * &d <= rest {
        if rest.is_multiple_of(&d) {
            while rest.is_multiple_of(&d) {
                rest /= &d;
            }
            let share = &result / &d;
            result -= share;
        }
        d += 1u32;
    }
    if rest > BigUint::one() {
        let share = &result / &rest;
        result -= share;
    }
    result
}

/// Build the product polynomial for `n` points; `n ≤ 0` gives the constant 1.
pub fn build(n: i64) -> Result<Polynomial, ConstructionError> {
    if n <= 0 {
        return Ok(Polynomial::new(vec![BigInt::one()]));
    }
    let n = n as usize;

    let g = (1..=n as i64).fold(vec![BigInt::one()], |p, r| {
        multiply(&p, &[BigInt::from(-r), BigInt::one()])
    });

    struct Factor {
        s: BigInt,
        a: u64,
        h: Vec<BigInt>,
    }
    let mut factors = Vec::with_capacity(n);
    let mut period = BigUint::one();
    for i in 1..=n {
        let sign = if (n - i) % 2 == 1 { -BigInt::one() } else { BigInt::one() };
        let s = sign * factorial(i - 1) * factorial(n - i);
        let a = s
            .trailing_zeros()
            .ok_or_else(|| ConstructionError::internal(format!("h_{i}({i}) vanished")))?;
        let odd = s.magnitude() >> a;
        period = period.lcm(&totient(&odd));
        factors.push(Factor {
            s,
            a,
            h: divide_by_root(&g, i as i64),
        });
    }
    tracing::debug!(n, %period, "powers-of-two polynomial exponent period");

    let mut product = vec![BigInt::one()];
    for (i, factor) in (1u64..).zip(&factors) {
        let exponent = period.clone() * i + factor.a;
        let exponent = u64::try_from(&exponent)
            .map_err(|_| ConstructionError::internal(format!("exponent {exponent} too large")))?;
        let low = BigInt::one() << factor.a;
        let numerator = (BigInt::one() << exponent) - &low;
        let (k, remainder) = numerator.div_rem(&factor.s);
        if !remainder.is_zero() {
            return Err(ConstructionError::internal(format!(
                "h_{i}({i}) = {} does not divide 2^{exponent} - 2^{}",
                factor.s, factor.a
            )));
        }
        let mut f: Vec<BigInt> = factor.h.iter().map(|c| &k * c).collect();
        match f.first_mut() {
            Some(c0) => *c0 += &low,
            None => f.push(low),
        }
        product = multiply(&product, &f);
    }

    while product.len() > 1 && product.last().is_some_and(Zero::is_zero) {
        product.pop();
    }
    Ok(Polynomial::new(product))
}

/// Accept `1 -3 2` or `1, -3, 2` besides list literals.
fn parse_tokens(text: &str) -> Option<Value> {
    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return None;
    }
    tokens
        .into_iter()
        .map(|t| {
            BigInt::from_str(t)
                .ok()
                .and_then(|big| Number::from_str(&big.to_string()).ok())
                .map(Value::Number)
        })
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn points(params: &Parameters) -> Result<usize, VerifyError> {
    Ok(params.at_least("n", 5, 1)?)
}

fn values_at_points(poly: &Polynomial, n: usize) -> Vec<BigInt> {
    (1..=n).map(|k| poly.eval(&BigInt::from(k))).collect()
}

fn is_power_of_two(value: &BigInt) -> bool {
    value.is_positive() && value.magnitude().count_ones() == 1
}

/// Every `P(k)` for `k = 1..=n` is a positive power of two.
fn powers_of_two(poly: &Polynomial, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    if poly.coefficients().is_empty() {
        return Err(VerifyError::violation("provide at least one coefficient"));
    }
    let n = points(params)?;
    for (k, value) in (1..).zip(values_at_points(poly, n)) {
        if !is_power_of_two(&value) {
            return Err(VerifyError::violation(format!(
                "P({k}) = {value} is not a positive power of 2"
            )));
        }
    }
    Ok(())
}

fn distinct_values(poly: &Polynomial, params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    let n = points(params)?;
    let values = values_at_points(poly, n);
    if let Some((i, j)) = (0..n)
        .tuple_combinations()
        .find(|&(i, j)| values[i] == values[j])
    {
        return Err(VerifyError::violation(format!(
            "the values P(1), ..., P({n}) are not all distinct: P({}) = P({}) = {}",
            i + 1,
            j + 1,
            values[i]
        )));
    }
    Ok(())
}

static CHECKS: [Check<Polynomial>; 2] = [
    Check {
        name: "powers_of_two",
        run: powers_of_two,
    },
    Check {
        name: "distinct_values",
        run: distinct_values,
    },
];

/// CT10: polynomial with distinct power-of-two values.
pub struct PowersOfTwo;

impl Problem for PowersOfTwo {
    const NAME: &'static str = "polynomial";
    type Construction = Polynomial;

    fn construct(params: &Parameters, _config: &SearchConfig) -> Result<Option<Polynomial>, ConstructionError> {
        let n = params.get("n").or_else(|| params.get("m")).unwrap_or(5);
        build(n).map(Some)
    }

    fn read_text(text: &str) -> Result<Value, VerifyError> {
        match parse_text(text) {
            Ok(value) if value.is_array() => Ok(value),
            Ok(_) => parse_tokens(text)
                .ok_or_else(|| VerifyError::malformed("all coefficients must be integers")),
            Err(err) => parse_tokens(text).ok_or(err),
        }
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<Polynomial, VerifyError> {
        let items = value
            .as_array()
            .ok_or_else(|| VerifyError::malformed("expected a list of integer coefficients"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                as_bigint(item).ok_or_else(|| {
                    VerifyError::malformed(format!("coefficient at index {i} is not an integer: {}", describe(item)))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Polynomial::new)
    }

    fn checks() -> &'static [Check<Polynomial>] {
        &CHECKS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&v| BigInt::from(v)).collect()
    }

    #[test]
    fn test_helpers() {
        // (x - 1)(x - 2) = x^2 - 3x + 2
        let g = multiply(&ints(&[-1, 1]), &ints(&[-2, 1]));
        assert_eq!(g, ints(&[2, -3, 1]));
        assert_eq!(divide_by_root(&g, 1), ints(&[-2, 1]));
        assert_eq!(divide_by_root(&g, 2), ints(&[-1, 1]));
        assert_eq!(Polynomial::new(g).eval(&BigInt::from(5)), BigInt::from(12));

        assert_eq!(totient(&BigUint::from(1u32)), BigUint::from(1u32));
        assert_eq!(totient(&BigUint::from(9u32)), BigUint::from(6u32));
        assert_eq!(totient(&BigUint::from(2835u32)), BigUint::from(1296u32));
    }

    #[test]
    fn test_small_constructions() {
        assert_eq!(build(0).unwrap().coefficients(), ints(&[1]));
        assert_eq!(build(1).unwrap().coefficients(), ints(&[2]));
        assert_eq!(build(2).unwrap().coefficients(), ints(&[-6, 11, -3]));
    }

    #[test]
    fn test_constructions_verify() {
        for n in 1..=5 {
            let params = Parameters::new().with("n", n);
            let poly = PowersOfTwo::construct(&params, &SearchConfig::default()).unwrap().unwrap();
            assert_eq!(poly.degree() as i64, n * (n - 1), "n = {n}");
            let report = PowersOfTwo::verify_construction(&poly, &params, &SearchConfig::default());
            assert!(report.valid, "n = {n}: {:?}", report.failure_summary());
        }
    }

    #[test]
    fn test_values_are_distinct_powers() {
        let poly = build(3).unwrap();
        let values = values_at_points(&poly, 3);
        assert!(values.iter().all(is_power_of_two));
        assert!(values.iter().all_unique());
    }

    #[test]
    fn test_text_forms() {
        let params = Parameters::new().with("n", 2);
        let config = SearchConfig::default();
        for text in ["[-6, 11, -3]", "(-6, 11, -3)", "-6 11 -3", "-6, 11,\n-3", "[-6.0, 11, -3]"] {
            let report = PowersOfTwo::verify(text, &params, &config);
            assert!(report.valid, "{text}: {:?}", report.failure_summary());
        }
        for text in ["[-6, true, -3]", "-6 11.5 -3", "[-6, 11.5, -3]", "   "] {
            let report = PowersOfTwo::verify(text, &params, &config);
            assert!(!report.valid, "{text}");
        }
    }

    #[test]
    fn test_violations() {
        let params = Parameters::new().with("n", 2);
        let config = SearchConfig::default();

        let constant = Polynomial::new(ints(&[4]));
        assert!(powers_of_two(&constant, &params, &config).is_ok());
        assert_eq!(
            distinct_values(&constant, &params, &config).unwrap_err(),
            VerifyError::violation("the values P(1), ..., P(2) are not all distinct: P(1) = P(2) = 4")
        );

        let linear = Polynomial::new(ints(&[0, 3]));
        assert_eq!(
            powers_of_two(&linear, &params, &config).unwrap_err(),
            VerifyError::violation("P(1) = 3 is not a positive power of 2")
        );

        let empty = Polynomial::new(Vec::new());
        assert!(powers_of_two(&empty, &params, &config).is_err());
    }
}
