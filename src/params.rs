//! Flat integer parameter map handed to constructors and verifiers.
//!
//! Matches the JSON object the harness sends, e.g. `{"n": 5}` or
//! `{"even_cycle": 4, "odd_cycle": 5, "mod": 3}`.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Named integer parameters; which keys matter is unit-specific.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, i64>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy in tests and the CLI
    pub fn with(mut self, key: &str, value: i64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn insert(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    pub fn get_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).unwrap_or(default)
    }

    /// Fetch a required parameter
    pub fn require(&self, key: &str) -> Result<i64, ParameterError> {
        self.get(key)
            .ok_or_else(|| ParameterError::new(key, "required but not provided"))
    }

    /// Fetch a parameter that must be at least `min`, falling back to `default`
    pub fn at_least(&self, key: &str, default: i64, min: i64) -> Result<usize, ParameterError> {
        let value = self.get_or(key, default);
        if value < min {
            return Err(ParameterError::new(
                key,
                format!("must be at least {min}, got {value}"),
            ));
        }
        usize::try_from(value)
            .map_err(|_| ParameterError::new(key, format!("{value} does not fit in usize")))
    }
}

impl FromIterator<(String, i64)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single `key=value` pair as written on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamAssignment {
    pub key: String,
    pub value: i64,
}

impl FromStr for ParamAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty parameter name in `{s}`"));
        }
        let value = value
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("parameter `{key}`: {e}"))?;
        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_json_object() {
        let params: Parameters =
            serde_json::from_str(r#"{"even_cycle": 4, "odd_cycle": 5, "mod": 3}"#).unwrap();
        assert_eq!(params.get("even_cycle"), Some(4));
        assert_eq!(params.get_or("mod", 7), 3);
        assert_eq!(params.get_or("missing", 7), 7);
    }

    #[test]
    fn test_require_and_at_least() {
        let params = Parameters::new().with("n", 0);
        assert!(params.require("m").is_err());
        assert_eq!(params.require("n"), Ok(0));

        let err = params.at_least("n", 5, 1).unwrap_err();
        assert_eq!(err.key, "n");
        assert_eq!(params.at_least("m", 5, 1), Ok(5));
    }

    #[test]
    fn test_param_assignment_parsing() {
        let assignment: ParamAssignment = "n = 12".parse().unwrap();
        assert_eq!(assignment.key, "n");
        assert_eq!(assignment.value, 12);

        assert!("n".parse::<ParamAssignment>().is_err());
        assert!("=3".parse::<ParamAssignment>().is_err());
        assert!("n=x".parse::<ParamAssignment>().is_err());
    }
}
