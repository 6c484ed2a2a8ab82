// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid certificate state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Certificate not found: {0}")]
    CertificateNotFound(String),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("Invalid date range: issue {issue} is after expiry {expiry}")]
    InvalidDateRange { issue: String, expiry: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
