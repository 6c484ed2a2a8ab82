// Compliance Domain Model (derived, not persisted as source of truth)

use serde::{Deserialize, Serialize};

/// Derived flag indicating whether an employee holds a valid certificate
/// for each mandatory training type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    AtRisk,
    NonCompliant,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "COMPLIANT"),
            ComplianceStatus::AtRisk => write!(f, "AT_RISK"),
            ComplianceStatus::NonCompliant => write!(f, "NON_COMPLIANT"),
        }
    }
}

impl std::str::FromStr for ComplianceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "COMPLIANT" => Ok(ComplianceStatus::Compliant),
            "AT_RISK" => Ok(ComplianceStatus::AtRisk),
            "NON_COMPLIANT" => Ok(ComplianceStatus::NonCompliant),
            other => Err(format!("Unknown compliance status: {}", other)),
        }
    }
}

/// A certificate that still counts but is inside the warning window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringEntry {
    pub certificate_id: String,
    pub training_type_code: String,
    pub expiry_date: chrono::NaiveDate,
}

/// Per-employee compliance evaluation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub employee_id: String,
    pub status: ComplianceStatus,
    /// Mandatory training type codes with no valid certificate
    pub missing: Vec<String>,
    pub expiring: Vec<ExpiringEntry>,
    pub evaluated_at: i64, // epoch ms
}

/// Aggregate counts over active employees
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub employees_evaluated: i64,
    pub compliant: i64,
    pub at_risk: i64,
    pub non_compliant: i64,
}
