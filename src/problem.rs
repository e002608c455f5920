//! The construct-then-verify contract every unit implements.

use std::fmt::Debug;

use serde::Serialize;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::construction::parse_text;
use crate::error::{ConstructionError, VerifyError};
use crate::params::Parameters;
use crate::report::{CheckOutcome, VerificationReport};

/// Signature of a single independent property check.
pub type CheckFn<C> = fn(&C, &Parameters, &SearchConfig) -> Result<(), VerifyError>;

/// A named property check run against a parsed construction.
pub struct Check<C> {
    pub name: &'static str,
    pub run: CheckFn<C>,
}

/// A problem unit: a deterministic constructor plus an independent verifier.
///
/// Verification never consults the constructor. Each check re-derives its
/// property from the parsed construction and the parameters alone.
pub trait Problem {
    /// Short identifier used in reports and on the command line
    const NAME: &'static str;

    /// Native form of the constructed object
    type Construction: Serialize + Clone + PartialEq + Debug + 'static;

    /// Build the object, or `Ok(None)` when provably none exists.
    fn construct(
        params: &Parameters,
        config: &SearchConfig,
    ) -> Result<Option<Self::Construction>, ConstructionError>;

    /// Normalise a JSON value into the native form, rejecting bad shapes.
    fn parse(value: &Value, params: &Parameters) -> Result<Self::Construction, VerifyError>;

    /// Independent property checks, all of which run on every verification.
    fn checks() -> &'static [Check<Self::Construction>];

    /// Turn submission text into JSON. Units with extra plain-text
    /// notations override this.
    fn read_text(text: &str) -> Result<Value, VerifyError> {
        parse_text(text)
    }

    /// Parse submission text, then run every check.
    fn verify(text: &str, params: &Parameters, config: &SearchConfig) -> VerificationReport {
        let parsed = Self::read_text(text).and_then(|value| Self::parse_value(&value, params));
        Self::report(parsed, params, config)
    }

    /// As [`Problem::verify`] for an already-decoded JSON value.
    fn verify_value(value: &Value, params: &Parameters, config: &SearchConfig) -> VerificationReport {
        Self::report(Self::parse_value(value, params), params, config)
    }

    /// As [`Problem::verify`] for a native construction.
    fn verify_construction(
        construction: &Self::Construction,
        params: &Parameters,
        config: &SearchConfig,
    ) -> VerificationReport {
        Self::report(Ok(construction.clone()), params, config)
    }

    #[doc(hidden)]
    fn parse_value(value: &Value, params: &Parameters) -> Result<Self::Construction, VerifyError> {
        match value {
            Value::String(text) => Self::parse(&Self::read_text(text)?, params),
            other => Self::parse(other, params),
        }
    }

    #[doc(hidden)]
    fn report(
        parsed: Result<Self::Construction, VerifyError>,
        params: &Parameters,
        config: &SearchConfig,
    ) -> VerificationReport {
        let checks = Self::checks();
        let outcomes = match parsed {
            Ok(construction) => checks
                .iter()
                .map(|check| {
                    let result = (check.run)(&construction, params, config);
                    if let Err(err) = &result {
                        tracing::debug!(unit = Self::NAME, check = check.name, %err, "check failed");
                    }
                    CheckOutcome::from_result(check.name, result)
                })
                .collect(),
            // Nothing to check against; every check fails with the parse error
            Err(err) => {
                tracing::debug!(unit = Self::NAME, %err, "construction rejected");
                checks
                    .iter()
                    .map(|check| CheckOutcome::from_result(check.name, Err(err.clone())))
                    .collect()
            }
        };
        VerificationReport::new(Self::NAME, outcomes)
    }
}
