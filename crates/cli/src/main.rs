//! Credent CLI - Command-line interface for the Credent Compliance Engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9620";

#[derive(Parser)]
#[command(name = "credent")]
#[command(about = "Credent Compliance Engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "CREDENT_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Employee management
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Certificate management
    #[command(subcommand)]
    Cert(CertCommands),

    /// Compliance views
    Compliance {
        /// Evaluate a single employee instead of the roster summary
        #[arg(long)]
        employee: Option<String>,
    },

    /// Trigger one notification dispatch pass
    Dispatch,

    /// Container health
    #[command(subcommand)]
    Container(ContainerCommands),

    /// Export a dataset to the export directory
    Export {
        /// Dataset: employees or certificates
        dataset: String,

        /// Output format: csv or json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Show system status
    Status,

    /// Run maintenance operations
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },
}

#[derive(Subcommand)]
enum EmployeeCommands {
    /// Register a new employee
    Add {
        /// Staff number (unique)
        #[arg(short, long)]
        staff_number: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Email address (unique)
        #[arg(short, long)]
        email: String,

        /// Department ID
        #[arg(short, long)]
        department: Option<String>,
    },

    /// Show one employee
    Show {
        /// Employee ID
        employee_id: String,
    },
}

#[derive(Subcommand)]
enum CertCommands {
    /// Issue a certificate (supersedes older ones in the series)
    Issue {
        /// Employee ID
        #[arg(short, long)]
        employee: String,

        /// Training type code (e.g. FIRST-AID)
        #[arg(short, long)]
        training: String,

        /// Issue date (YYYY-MM-DD)
        #[arg(short, long)]
        issued: String,

        /// Explicit expiry date (YYYY-MM-DD); defaults to the training
        /// type's validity
        #[arg(long)]
        expires: Option<String>,

        /// Issuing provider
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Revoke a certificate (terminal)
    Revoke {
        /// Certificate ID
        certificate_id: String,
    },
}

#[derive(Subcommand)]
enum ContainerCommands {
    /// Check a container's health
    Check {
        /// Employee ID
        employee_id: String,
    },

    /// Repair a container (recreates dirs, rebuilds the sidecar)
    Repair {
        /// Employee ID
        employee_id: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct CertificateRow {
    certificate_id: String,
    generation: i64,
    status: String,
    verification_code: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Employee(cmd) => match cmd {
            EmployeeCommands::Add {
                staff_number,
                name,
                email,
                department,
            } => {
                let params = json!({
                    "staff_number": staff_number,
                    "full_name": name,
                    "email": email,
                    "department_id": department,
                });

                let result = call_rpc(&cli.rpc_url, "employee.register.v1", params).await?;

                println!("{}", "✓ Employee registered".green().bold());
                println!();
                println!("  {} {}", "Employee ID:".bold(), result["employee_id"]);
                println!("  {} {}", "Staff Number:".bold(), result["staff_number"]);
            }

            EmployeeCommands::Show { employee_id } => {
                let params = json!({ "employee_id": employee_id });
                let result = call_rpc(&cli.rpc_url, "employee.get.v1", params).await?;

                println!("{}", "Employee".cyan().bold());
                println!();
                println!("  {} {}", "ID:".bold(), result["employee_id"]);
                println!("  {} {}", "Staff Number:".bold(), result["staff_number"]);
                println!("  {} {}", "Name:".bold(), result["full_name"]);
                println!("  {} {}", "Email:".bold(), result["email"]);
                println!("  {} {}", "Status:".bold(), result["status"]);
                println!(
                    "  {} {}",
                    "Compliance:".bold(),
                    result["compliance_status"].as_str().unwrap_or("NOT_AUDITED")
                );
            }
        },

        Commands::Cert(cmd) => match cmd {
            CertCommands::Issue {
                employee,
                training,
                issued,
                expires,
                provider,
            } => {
                let params = json!({
                    "employee_id": employee,
                    "training_type_code": training,
                    "issue_date": issued,
                    "expiry_date": expires,
                    "provider": provider,
                });

                let result = call_rpc(&cli.rpc_url, "certificate.issue.v1", params).await?;
                let row: CertificateRow = serde_json::from_value(result)?;

                println!("{}", "✓ Certificate issued".green().bold());
                println!();
                println!("{}", Table::new(vec![row]));
            }

            CertCommands::Revoke { certificate_id } => {
                let params = json!({ "certificate_id": certificate_id });
                call_rpc(&cli.rpc_url, "certificate.revoke.v1", params).await?;

                println!(
                    "{}",
                    format!("✓ Certificate {} revoked", certificate_id)
                        .green()
                        .bold()
                );
            }
        },

        Commands::Compliance { employee } => match employee {
            Some(employee_id) => {
                let params = json!({ "employee_id": employee_id });
                let result = call_rpc(&cli.rpc_url, "compliance.employee.v1", params).await?;

                let status = result["status"].as_str().unwrap_or("?");
                let colored_status = match status {
                    "COMPLIANT" => status.green().bold(),
                    "AT_RISK" => status.yellow().bold(),
                    _ => status.red().bold(),
                };

                println!("{}", "Compliance Report".cyan().bold());
                println!();
                println!("  {} {}", "Employee:".bold(), result["employee_id"]);
                println!("  {} {}", "Status:".bold(), colored_status);

                if let Some(missing) = result["missing"].as_array() {
                    if !missing.is_empty() {
                        println!("  {}", "Missing:".bold());
                        for code in missing {
                            println!("    {} {}", "✗".red(), code);
                        }
                    }
                }
                if let Some(expiring) = result["expiring"].as_array() {
                    for entry in expiring {
                        println!(
                            "    {} {} expires {}",
                            "!".yellow(),
                            entry["training_type_code"],
                            entry["expiry_date"]
                        );
                    }
                }
            }
            None => {
                let result = call_rpc(&cli.rpc_url, "compliance.summary.v1", json!({})).await?;

                println!("{}", "Compliance Summary".cyan().bold());
                println!();
                println!("  {} {}", "Evaluated:".bold(), result["employees_evaluated"]);
                println!(
                    "  {} {}",
                    "Compliant:".bold(),
                    result["compliant"].to_string().green()
                );
                println!(
                    "  {} {}",
                    "At Risk:".bold(),
                    result["at_risk"].to_string().yellow()
                );
                println!(
                    "  {} {}",
                    "Non-Compliant:".bold(),
                    result["non_compliant"].to_string().red()
                );
            }
        },

        Commands::Dispatch => {
            println!("{}", "Running dispatch pass...".cyan().bold());
            let result = call_rpc(&cli.rpc_url, "dispatch.run.v1", json!({})).await?;

            println!();
            println!("  {} {}", "Scanned:".bold(), result["scanned"]);
            println!("  {} {}", "Warnings created:".bold(), result["warnings_created"]);
            println!("  {} {}", "Marked expired:".bold(), result["expired_marked"]);
            println!("  {} {}", "Delivered:".bold(), result["delivered"]);
            println!("  {} {}", "Retried:".bold(), result["retried"]);
            println!("  {} {}", "Failed:".bold(), result["failed"]);
        }

        Commands::Container(cmd) => match cmd {
            ContainerCommands::Check { employee_id } => {
                let params = json!({ "employee_id": employee_id });
                let result = call_rpc(&cli.rpc_url, "container.check.v1", params).await?;

                if result["healthy"].as_bool().unwrap_or(false) {
                    println!("{}", "✓ Container healthy".green().bold());
                } else {
                    println!("{}", "✗ Container unhealthy".red().bold());
                    if let Some(issues) = result["issues"].as_array() {
                        for issue in issues {
                            println!("  {} {}", "•".bold(), issue);
                        }
                    }
                    println!();
                    println!("  Run: credent container repair {}", employee_id);
                }
            }

            ContainerCommands::Repair { employee_id } => {
                let params = json!({ "employee_id": employee_id });
                let result = call_rpc(&cli.rpc_url, "container.repair.v1", params).await?;

                println!("{}", "✓ Container repaired".green().bold());
                if let Some(dirs) = result["created_dirs"].as_array() {
                    for dir in dirs {
                        println!("  {} created {}", "+".green(), dir);
                    }
                }
                if result["metadata_rebuilt"].as_bool().unwrap_or(false) {
                    println!("  {} metadata sidecar rebuilt", "✓".green());
                }
            }
        },

        Commands::Export { dataset, format } => {
            let params = json!({ "dataset": dataset, "format": format });
            let result = call_rpc(&cli.rpc_url, "export.run.v1", params).await?;

            println!("{}", "✓ Export completed".green().bold());
            println!();
            println!("  {} {}", "Rows:".bold(), result["rows"]);
            println!("  {} {}", "File:".bold(), result["path"]);
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Active Employees:".bold(), stats["active_employees"]);
                    println!(
                        "  {} {}",
                        "Active Certificates:".bold(),
                        stats["active_certificates"]
                    );
                    println!(
                        "  {} {}",
                        "Expiring Soon:".bold(),
                        stats["expiring_soon_certificates"].to_string().yellow()
                    );
                    println!(
                        "  {} {}",
                        "Expired:".bold(),
                        stats["expired_certificates"].to_string().red()
                    );
                    println!(
                        "  {} {}",
                        "Pending Notifications:".bold(),
                        stats["pending_notifications"]
                    );
                    println!();
                    let db_mb =
                        stats["db_size_bytes"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    println!("  {} {:.2} MB", "DB Size:".bold(), db_mb);
                    println!(
                        "  {} {} / {} GB",
                        "Disk:".bold(),
                        stats["disk_used_gb"],
                        stats["disk_total_gb"]
                    );
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Maintenance { force_vacuum } => {
            println!("{}", "Running maintenance...".cyan().bold());
            println!();

            if force_vacuum {
                println!("  {} Force VACUUM enabled", "•".bold());
            }

            let params = json!({ "force_vacuum": force_vacuum });

            match call_rpc(&cli.rpc_url, "admin.maintenance.v1", params).await {
                Ok(result) => {
                    println!("  ✓ Maintenance completed");
                    println!();
                    if result["vacuum_run"].as_bool().unwrap_or(false) {
                        println!(
                            "  {} VACUUM executed ({:.2} MB reclaimed)",
                            "✓".green(),
                            result["reclaimed_mb"].as_f64().unwrap_or(0.0)
                        );
                    } else {
                        println!("  ○ VACUUM skipped (not needed)");
                    }
                    println!(
                        "  {} {:.2} MB database, {:.1}% fragmentation",
                        "✓".green(),
                        result["db_size_mb"].as_f64().unwrap_or(0.0),
                        result["fragmentation_percent"].as_f64().unwrap_or(0.0)
                    );
                    println!(
                        "  {} {} notifications on record, {} pending",
                        "✓".green(),
                        result["notification_count"],
                        result["pending_notifications"]
                    );
                }
                Err(e) => {
                    println!("  {} Maintenance failed: {}", "✗".red(), e);
                }
            }
        }
    }

    Ok(())
}
