//! Credent SDK - Rust Client Library
//!
//! Provides a convenient client for interacting with the Credent Compliance
//! Engine daemon.
//!
//! # Example
//!
//! ```no_run
//! use credent_sdk::{CredentClient, RegisterEmployeeRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = CredentClient::connect("http://127.0.0.1:9620").await?;
//!
//!     // Register an employee
//!     let response = client.register_employee(RegisterEmployeeRequest {
//!         staff_number: "EMP-0042".to_string(),
//!         full_name: "Jane Doe".to_string(),
//!         email: "jane.doe@example.com".to_string(),
//!         department_id: None,
//!     }).await?;
//!
//!     println!("Employee registered: {}", response.employee_id);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::CredentClient;
pub use error::{Result, SdkError};
pub use types::{
    CertificateView, ComplianceEmployeeResponse, ComplianceSummaryResponse, ContainerCheckResponse,
    ContainerRepairResponse, DispatchRunResponse, EmployeeView, ExpiringEntry, ExportRunResponse,
    IssueCertificateRequest, RegisterEmployeeRequest, RegisterEmployeeResponse,
};
