//! JSON-RPC Server
//!
//! Binds the JSON-RPC 2.0 server to localhost TCP and registers the
//! method table.

use crate::handler::{RpcDeps, RpcHandler};
use crate::types::{
    ComplianceEmployeeRequest, ComplianceSummaryRequest, ContainerCheckRequest,
    ContainerRepairRequest, DispatchRunRequest, ExportRunRequest, GetEmployeeRequest,
    IssueCertificateRequest, MaintenanceRequest, RegisterEmployeeRequest,
    RevokeCertificateRequest, StatsRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

// Note: jsonrpsee doesn't support Unix sockets directly (hyper limitation)
// Using TCP on localhost as secure alternative (no external access)
const DEFAULT_SOCKET_PATH: &str = "~/.credent/credent.sock";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9620;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub socket_path: PathBuf, // Reserved for future UDS support
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            socket_path: shellexpand::tilde(DEFAULT_SOCKET_PATH).into_owned().into(),
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

macro_rules! register {
    ($module:expr, $handler:expr, $name:literal, $req:ty, $method:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($name, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse()?;
                    handler.$method(req).await
                }
            })
            .map_err(|e| e.to_string())?;
    }};
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, deps: RpcDeps) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(deps)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: only binds to 127.0.0.1 (no external access)
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP (localhost only)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());
        let h = &self.handler;

        register!(module, h, "employee.register.v1", RegisterEmployeeRequest, register_employee);
        register!(module, h, "employee.get.v1", GetEmployeeRequest, get_employee);
        register!(module, h, "certificate.issue.v1", IssueCertificateRequest, issue_certificate);
        register!(module, h, "certificate.revoke.v1", RevokeCertificateRequest, revoke_certificate);
        register!(module, h, "compliance.employee.v1", ComplianceEmployeeRequest, compliance_employee);
        register!(module, h, "compliance.summary.v1", ComplianceSummaryRequest, compliance_summary);
        register!(module, h, "dispatch.run.v1", DispatchRunRequest, dispatch_run);
        register!(module, h, "container.check.v1", ContainerCheckRequest, container_check);
        register!(module, h, "container.repair.v1", ContainerRepairRequest, container_repair);
        register!(module, h, "export.run.v1", ExportRunRequest, export_run);
        register!(module, h, "admin.stats.v1", StatsRequest, stats);
        register!(module, h, "admin.maintenance.v1", MaintenanceRequest, maintenance);

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_expands_socket_path() {
        let config = RpcServerConfig::default();
        let path = config.socket_path.to_str().unwrap();
        assert!(!path.starts_with('~'), "tilde not expanded: {}", path);
        assert!(path.ends_with(".credent/credent.sock"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9620);
    }
}
