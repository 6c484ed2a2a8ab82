//! Credent Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    CertificateView, ComplianceEmployeeResponse, ComplianceSummaryResponse, ContainerCheckResponse,
    ContainerRepairResponse, DispatchRunResponse, EmployeeView, ExportRunResponse,
    IssueCertificateRequest, RegisterEmployeeRequest, RegisterEmployeeResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::traits::ToRpcParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Serialize;
use serde_json::value::RawValue;
use std::time::Duration;

/// Sends a request struct as named JSON-RPC params (a single object)
/// so the server can parse it field by field.
struct NamedParams<T>(T);

impl<T: Serialize> ToRpcParams for NamedParams<T> {
    fn to_rpc_params(self) -> std::result::Result<Option<Box<RawValue>>, serde_json::Error> {
        serde_json::value::to_raw_value(&self.0).map(Some)
    }
}

/// Credent Compliance Engine Client
///
/// Provides a high-level interface to interact with the Credent daemon.
///
/// # Example
///
/// ```no_run
/// use credent_sdk::CredentClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CredentClient::connect("http://127.0.0.1:9620").await?;
/// # Ok(())
/// # }
/// ```
pub struct CredentClient {
    client: HttpClient,
}

impl CredentClient {
    /// Connect to the Credent daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9620`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::InvalidEndpoint(format!("{}: {}", url, e)))?;

        Ok(Self { client })
    }

    /// Register an employee and bootstrap their file container
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use credent_sdk::{CredentClient, RegisterEmployeeRequest};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = CredentClient::connect("http://127.0.0.1:9620").await?;
    /// let response = client.register_employee(RegisterEmployeeRequest {
    ///     staff_number: "EMP-0042".to_string(),
    ///     full_name: "Jane Doe".to_string(),
    ///     email: "jane.doe@example.com".to_string(),
    ///     department_id: None,
    /// }).await?;
    ///
    /// println!("Employee ID: {}", response.employee_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn register_employee(
        &self,
        request: RegisterEmployeeRequest,
    ) -> Result<RegisterEmployeeResponse> {
        let response = self
            .client
            .request("employee.register.v1", NamedParams(request))
            .await?;

        Ok(response)
    }

    /// Fetch one employee by ID
    pub async fn get_employee(&self, employee_id: impl Into<String>) -> Result<EmployeeView> {
        let params = serde_json::json!({ "employee_id": employee_id.into() });
        let response = self
            .client
            .request("employee.get.v1", NamedParams(params))
            .await?;

        Ok(response)
    }

    /// Issue a certificate
    ///
    /// Older certificates for the same employee and training type are
    /// superseded in the same transaction.
    pub async fn issue_certificate(
        &self,
        request: IssueCertificateRequest,
    ) -> Result<CertificateView> {
        let response = self
            .client
            .request("certificate.issue.v1", NamedParams(request))
            .await?;

        Ok(response)
    }

    /// Revoke a certificate (terminal, cannot be undone)
    pub async fn revoke_certificate(
        &self,
        certificate_id: impl Into<String>,
    ) -> Result<CertificateView> {
        let params = serde_json::json!({ "certificate_id": certificate_id.into() });
        let response = self
            .client
            .request("certificate.revoke.v1", NamedParams(params))
            .await?;

        Ok(response)
    }

    /// Evaluate one employee's training compliance
    pub async fn employee_compliance(
        &self,
        employee_id: impl Into<String>,
    ) -> Result<ComplianceEmployeeResponse> {
        let params = serde_json::json!({ "employee_id": employee_id.into() });
        let response = self
            .client
            .request("compliance.employee.v1", NamedParams(params))
            .await?;

        Ok(response)
    }

    /// Aggregate compliance counts over the active roster
    pub async fn compliance_summary(&self) -> Result<ComplianceSummaryResponse> {
        let response = self
            .client
            .request("compliance.summary.v1", NamedParams(serde_json::json!({})))
            .await?;

        Ok(response)
    }

    /// Trigger one notification dispatch pass
    ///
    /// Returns a conflict error if a dispatch pass is already running.
    pub async fn run_dispatch(&self) -> Result<DispatchRunResponse> {
        let response = self
            .client
            .request("dispatch.run.v1", NamedParams(serde_json::json!({})))
            .await?;

        Ok(response)
    }

    /// Health-check one employee's file container
    pub async fn check_container(
        &self,
        employee_id: impl Into<String>,
    ) -> Result<ContainerCheckResponse> {
        let params = serde_json::json!({ "employee_id": employee_id.into() });
        let response = self
            .client
            .request("container.check.v1", NamedParams(params))
            .await?;

        Ok(response)
    }

    /// Repair one employee's file container
    ///
    /// Recreates missing directories and rebuilds the metadata sidecar.
    pub async fn repair_container(
        &self,
        employee_id: impl Into<String>,
    ) -> Result<ContainerRepairResponse> {
        let params = serde_json::json!({ "employee_id": employee_id.into() });
        let response = self
            .client
            .request("container.repair.v1", NamedParams(params))
            .await?;

        Ok(response)
    }

    /// Export a dataset to the daemon's export directory
    ///
    /// # Arguments
    ///
    /// * `dataset` - `employees` or `certificates`
    /// * `format` - `csv` or `json`
    pub async fn run_export(
        &self,
        dataset: impl Into<String>,
        format: impl Into<String>,
    ) -> Result<ExportRunResponse> {
        let params = serde_json::json!({
            "dataset": dataset.into(),
            "format": format.into(),
        });
        let response = self
            .client
            .request("export.run.v1", NamedParams(params))
            .await?;

        Ok(response)
    }
}
