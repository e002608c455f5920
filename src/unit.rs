//! Name-based dispatch over the problem units, for the command line.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::collinear_polygon::CollinearPolygon;
use crate::config::SearchConfig;
use crate::cycle_fan::CycleFan;
use crate::displacement::Displacement;
use crate::error::ConstructionError;
use crate::palindrome::Palindrome;
use crate::params::Parameters;
use crate::polynomial::PowersOfTwo;
use crate::problem::Problem;
use crate::report::VerificationReport;
use crate::town_tour::TownTour;
use crate::triangulation::Triangulation;

/// Every problem unit the crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Unit {
    /// CT1: graph whose edges all lie on 2k- and (2k+1)-cycles
    #[value(name = "cycle_fan", alias = "ct1")]
    CycleFan,
    /// CT3: simple polygon whose every side has a collinear partner
    #[value(name = "collinear_polygon", alias = "ct3")]
    CollinearPolygon,
    /// CT7: permutation with distinct positive displacements
    #[value(name = "displacement", alias = "ct7")]
    Displacement,
    /// CT9: integer palindromic in m bases
    #[value(name = "palindrome", alias = "ct9")]
    Palindrome,
    /// CT10: polynomial with distinct power-of-two values
    #[value(name = "polynomial", alias = "ct10")]
    Polynomial,
    /// CT11: straight-or-right tour of every town street side
    #[value(name = "town_tour", alias = "ct11")]
    TownTour,
    /// CT15: polygon with exactly n triangulations
    #[value(name = "triangulation", alias = "ct15")]
    Triangulation,
}

impl Unit {
    pub const ALL: [Unit; 7] = [
        Unit::CycleFan,
        Unit::CollinearPolygon,
        Unit::Displacement,
        Unit::Palindrome,
        Unit::Polynomial,
        Unit::TownTour,
        Unit::Triangulation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Unit::CycleFan => CycleFan::NAME,
            Unit::CollinearPolygon => CollinearPolygon::NAME,
            Unit::Displacement => Displacement::NAME,
            Unit::Palindrome => Palindrome::NAME,
            Unit::Polynomial => PowersOfTwo::NAME,
            Unit::TownTour => TownTour::NAME,
            Unit::Triangulation => Triangulation::NAME,
        }
    }

    /// Run the constructor and encode its result; "no solution" is `null`.
    pub fn construct_json(self, params: &Parameters, config: &SearchConfig) -> Result<Value, ConstructionError> {
        match self {
            Unit::CycleFan => construct_value::<CycleFan>(params, config),
            Unit::CollinearPolygon => construct_value::<CollinearPolygon>(params, config),
            Unit::Displacement => construct_value::<Displacement>(params, config),
            Unit::Palindrome => construct_value::<Palindrome>(params, config),
            Unit::Polynomial => construct_value::<PowersOfTwo>(params, config),
            Unit::TownTour => construct_value::<TownTour>(params, config),
            Unit::Triangulation => construct_value::<Triangulation>(params, config),
        }
    }

    /// Parse submission text and run every check of this unit.
    pub fn verify_text(self, text: &str, params: &Parameters, config: &SearchConfig) -> VerificationReport {
        match self {
            Unit::CycleFan => CycleFan::verify(text, params, config),
            Unit::CollinearPolygon => CollinearPolygon::verify(text, params, config),
            Unit::Displacement => Displacement::verify(text, params, config),
            Unit::Palindrome => Palindrome::verify(text, params, config),
            Unit::Polynomial => PowersOfTwo::verify(text, params, config),
            Unit::TownTour => TownTour::verify(text, params, config),
            Unit::Triangulation => Triangulation::verify(text, params, config),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn construct_value<P: Problem>(params: &Parameters, config: &SearchConfig) -> Result<Value, ConstructionError> {
    let construction = P::construct(params, config)?;
    if construction.is_none() {
        tracing::info!(unit = P::NAME, "no construction exists for these parameters");
    }
    to_json(&construction)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ConstructionError> {
    serde_json::to_value(value).map_err(|e| ConstructionError::internal(format!("cannot encode construction: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_distinct() {
        let mut names: Vec<&str> = Unit::ALL.iter().map(|u| u.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Unit::ALL.len());
        assert_eq!(Unit::TownTour.to_string(), "town_tour");
    }

    #[test]
    fn test_value_enum_accepts_names_and_aliases() {
        assert_eq!(Unit::from_str("cycle_fan", false), Ok(Unit::CycleFan));
        assert_eq!(Unit::from_str("ct15", false), Ok(Unit::Triangulation));
        assert_eq!(Unit::from_str("ct3", false), Ok(Unit::CollinearPolygon));
        assert!(Unit::from_str("ct16", false).is_err());
    }

    #[test]
    fn test_construct_then_verify_text() {
        let config = SearchConfig::default();
        let cases = [
            (Unit::CollinearPolygon, Parameters::new().with("n", 20)),
            (Unit::Displacement, Parameters::new().with("n", 8)),
            (Unit::Palindrome, Parameters::new().with("m", 3)),
            (Unit::Polynomial, Parameters::new().with("n", 3)),
            (Unit::TownTour, Parameters::new().with("n", 4)),
            (Unit::Triangulation, Parameters::new().with("n", 6)),
        ];
        for (unit, params) in cases {
            let value = unit.construct_json(&params, &config).unwrap();
            let report = unit.verify_text(&value.to_string(), &params, &config);
            assert!(report.valid, "{unit}: {:?}", report.failure_summary());
            assert_eq!(report.unit, unit.name());
        }
    }

    #[test]
    fn test_no_solution_is_null() {
        let config = SearchConfig::default();
        let value = Unit::Displacement
            .construct_json(&Parameters::new().with("n", 6), &config)
            .unwrap();
        assert_eq!(value, Value::Null);
        let value = Unit::TownTour
            .construct_json(&Parameters::new().with("n", 3), &config)
            .unwrap();
        assert_eq!(value, Value::Null);
    }
}
