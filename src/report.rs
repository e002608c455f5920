//! Verification results in the shape the command line prints.

use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CheckOutcome {
    pub fn from_result(name: &str, result: Result<(), VerifyError>) -> Self {
        Self {
            name: name.to_string(),
            passed: result.is_ok(),
            reason: result.err().map(|e| e.to_string()),
        }
    }
}

/// Outcome of every check for one construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub unit: String,
    pub valid: bool,
    pub checks: Vec<CheckOutcome>,
}

impl VerificationReport {
    pub fn new(unit: &str, checks: Vec<CheckOutcome>) -> Self {
        Self {
            unit: unit.to_string(),
            valid: checks.iter().all(|c| c.passed),
            checks,
        }
    }

    /// The first failing check, if any
    pub fn first_failure(&self) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| !c.passed)
    }

    /// Reasons of all failing checks, joined for display
    pub fn failure_summary(&self) -> Option<String> {
        let reasons: Vec<String> = self
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| format!("{}: {}", c.name, c.reason.as_deref().unwrap_or("failed")))
            .collect();
        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_validity_and_summary() {
        let report = VerificationReport::new(
            "demo",
            vec![
                CheckOutcome::from_result("first", Ok(())),
                CheckOutcome::from_result("second", Err(VerifyError::violation("edge (0, 1) missing"))),
            ],
        );
        assert!(!report.valid);
        assert_eq!(report.first_failure().unwrap().name, "second");
        assert_eq!(
            report.failure_summary().as_deref(),
            Some("second: edge (0, 1) missing")
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checks"][0]["passed"], serde_json::json!(true));
        assert!(json["checks"][0].get("reason").is_none());
    }

    #[test]
    fn test_empty_failures() {
        let report = VerificationReport::new("demo", vec![CheckOutcome::from_result("only", Ok(()))]);
        assert!(report.valid);
        assert!(report.failure_summary().is_none());
    }
}
