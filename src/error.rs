//! Error taxonomy shared by every problem unit.
//!
//! Input-shape problems, invariant violations and inconclusive searches are
//! verification failures. Broken constructions are a separate type since
//! they indicate a constructor bug rather than a bad submission.

use thiserror::Error;

/// A named parameter that is missing or outside the accepted range.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("parameter `{key}`: {reason}")]
pub struct ParameterError {
    /// Parameter name as it appears in the parameter map
    pub key: String,
    /// What was wrong with it
    pub reason: String,
}

impl ParameterError {
    pub fn new(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a construction failed a check.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The construction could not be normalised into the unit's native form.
    #[error("malformed construction: {0}")]
    Malformed(String),

    /// The construction parsed but breaks a required property.
    #[error("{0}")]
    Violation(String),

    /// A bounded search ran out of budget before reaching a verdict.
    #[error("search budget of {budget} nodes exhausted while {context}")]
    Inconclusive {
        /// Node expansions allowed
        budget: usize,
        /// What the search was looking for
        context: String,
    },

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

impl VerifyError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn violation(message: impl Into<String>) -> Self {
        Self::Violation(message.into())
    }
}

/// Why a constructor could not produce its object.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// An internal consistency check failed; this is a constructor bug.
    #[error("internal construction failure: {0}")]
    Internal(String),

    /// The step cap was reached before the search finished.
    #[error("search gave up after {steps} assignments")]
    SearchExhausted {
        /// Steps taken when the cap was hit
        steps: usize,
    },
}

impl ConstructionError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_error_converts_into_both_sides() {
        let err = ParameterError::new("n", "must be positive");
        assert_eq!(err.to_string(), "parameter `n`: must be positive");

        let verify: VerifyError = err.clone().into();
        assert!(matches!(verify, VerifyError::Parameter(ref p) if p.key == "n"));

        let construct: ConstructionError = err.into();
        assert_eq!(construct.to_string(), "parameter `n`: must be positive");
    }

    #[test]
    fn test_inconclusive_message() {
        let err = VerifyError::Inconclusive {
            budget: 10,
            context: "looking for a 6-cycle".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "search budget of 10 nodes exhausted while looking for a 6-cycle"
        );
    }
}
