//! Exports - employee roster and certificate register as CSV or JSON
//! lines. Rows are mapped declaratively (header list + cell values), the
//! writer only knows how to serialize a table.

use crate::error::{AppError, Result};
use crate::port::{CertificateRepository, EmployeeRepository, TimeProvider, TrainingTypeRepository};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDataset {
    Employees,
    Certificates,
}

impl ExportDataset {
    fn file_stem(&self) -> &'static str {
        match self {
            ExportDataset::Employees => "employees",
            ExportDataset::Certificates => "certificates",
        }
    }
}

impl std::fmt::Display for ExportDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

impl std::str::FromStr for ExportDataset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "employees" => Ok(ExportDataset::Employees),
            "certificates" => Ok(ExportDataset::Certificates),
            other => Err(format!("Unknown export dataset: {}", other)),
        }
    }
}

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "jsonl",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// Result of a completed export
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub dataset: ExportDataset,
    pub format: ExportFormat,
    pub path: String,
    pub rows: usize,
}

/// A mapped table, ready for serialization
struct Table {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

/// Export service writing into a configured directory
pub struct ExportService {
    employee_repo: Arc<dyn EmployeeRepository>,
    certificate_repo: Arc<dyn CertificateRepository>,
    training_type_repo: Arc<dyn TrainingTypeRepository>,
    time_provider: Arc<dyn TimeProvider>,
    export_dir: PathBuf,
}

impl ExportService {
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        certificate_repo: Arc<dyn CertificateRepository>,
        training_type_repo: Arc<dyn TrainingTypeRepository>,
        time_provider: Arc<dyn TimeProvider>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            employee_repo,
            certificate_repo,
            training_type_repo,
            time_provider,
            export_dir: export_dir.into(),
        }
    }

    /// Run an export and return the written path + row count
    pub async fn run(&self, dataset: ExportDataset, format: ExportFormat) -> Result<ExportOutcome> {
        let table = match dataset {
            ExportDataset::Employees => self.employees_table().await?,
            ExportDataset::Certificates => self.certificates_table().await?,
        };

        let path = self.output_path(dataset, format);
        let content = match format {
            ExportFormat::Csv => render_csv(&table),
            ExportFormat::Json => render_json_lines(&table)?,
        };

        tokio::fs::create_dir_all(&self.export_dir).await?;
        tokio::fs::write(&path, content).await?;

        let outcome = ExportOutcome {
            dataset,
            format,
            path: path.to_string_lossy().into_owned(),
            rows: table.rows.len(),
        };
        info!(
            dataset = %dataset,
            format = %format,
            path = %outcome.path,
            rows = outcome.rows,
            "Export written"
        );
        Ok(outcome)
    }

    async fn employees_table(&self) -> Result<Table> {
        let employees = self.employee_repo.list(None).await?;
        let rows = employees
            .into_iter()
            .map(|e| {
                vec![
                    e.staff_number,
                    e.full_name,
                    e.email,
                    e.department_id.unwrap_or_default(),
                    e.status.to_string(),
                    e.compliance_status
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                ]
            })
            .collect();

        Ok(Table {
            headers: &[
                "staff_number",
                "full_name",
                "email",
                "department_id",
                "employment_status",
                "compliance_status",
            ],
            rows,
        })
    }

    async fn certificates_table(&self) -> Result<Table> {
        let types: HashMap<String, String> = self
            .training_type_repo
            .list()
            .await?
            .into_iter()
            .map(|t| (t.id, t.code))
            .collect();

        let certificates = self.certificate_repo.list_all().await?;
        let rows = certificates
            .into_iter()
            .map(|c| {
                vec![
                    c.id.clone(),
                    c.employee_id.clone(),
                    types
                        .get(&c.training_type_id)
                        .cloned()
                        .unwrap_or_else(|| c.training_type_id.clone()),
                    c.generation.to_string(),
                    c.issue_date.to_string(),
                    c.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
                    c.status.to_string(),
                    c.verification_code.as_str().to_string(),
                    c.provider.unwrap_or_default(),
                ]
            })
            .collect();

        Ok(Table {
            headers: &[
                "certificate_id",
                "employee_id",
                "training_type",
                "generation",
                "issue_date",
                "expiry_date",
                "status",
                "verification_code",
                "provider",
            ],
            rows,
        })
    }

    fn output_path(&self, dataset: ExportDataset, format: ExportFormat) -> PathBuf {
        let stamp = chrono::DateTime::from_timestamp_millis(self.time_provider.now_millis())
            .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        self.export_dir.join(format!(
            "{}_{}.{}",
            dataset.file_stem(),
            stamp,
            format.extension()
        ))
    }
}

/// RFC-4180-style CSV: quote fields containing comma, quote or newline,
/// double embedded quotes
fn render_csv(table: &Table) -> String {
    let mut out = String::new();
    out.push_str(&table.headers.join(","));
    out.push('\n');
    for row in &table.rows {
        let encoded: Vec<String> = row.iter().map(|cell| csv_escape(cell)).collect();
        out.push_str(&encoded.join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// One JSON object per line, keyed by the header names
fn render_json_lines(table: &Table) -> Result<String> {
    let mut out = String::new();
    for row in &table.rows {
        let object: serde_json::Map<String, serde_json::Value> = table
            .headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(value.as_str())))
            .collect();
        out.push_str(&serde_json::to_string(&object)?);
        out.push('\n');
    }
    Ok(out)
}

/// Validate the export directory is usable (daemon startup check)
pub async fn ensure_export_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Storage(format!("Cannot create export dir {:?}: {}", dir, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Certificate, Employee};
    use crate::port::time_provider::mocks::MockTimeProvider;

    #[test]
    fn test_csv_escaping() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_csv_render_header_and_rows() {
        let table = Table {
            headers: &["a", "b"],
            rows: vec![vec!["1".to_string(), "x,y".to_string()]],
        };
        assert_eq!(render_csv(&table), "a,b\n1,\"x,y\"\n");
    }

    #[test]
    fn test_json_lines_render() {
        let table = Table {
            headers: &["name", "status"],
            rows: vec![vec!["Jo".to_string(), "ACTIVE".to_string()]],
        };
        let out = render_json_lines(&table).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["name"], "Jo");
        assert_eq!(parsed["status"], "ACTIVE");
    }

    mod end_to_end {
        use super::*;
        use crate::domain::{
            CertificateStatus, ComplianceStatus, EmploymentStatus, TrainingType,
        };
        use crate::error::Result;
        use crate::port::{
            CertificateRepository, EmployeeRepository, TrainingTypeRepository,
        };
        use async_trait::async_trait;
        use chrono::NaiveDate;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Repos {
            employees: Mutex<Vec<Employee>>,
            certificates: Mutex<Vec<Certificate>>,
            types: Mutex<Vec<TrainingType>>,
        }

        #[async_trait]
        impl EmployeeRepository for Repos {
            async fn insert(&self, e: &Employee) -> Result<()> {
                self.employees.lock().unwrap().push(e.clone());
                Ok(())
            }
            async fn update(&self, _e: &Employee) -> Result<()> {
                Ok(())
            }
            async fn find_by_id(&self, _id: &String) -> Result<Option<Employee>> {
                Ok(None)
            }
            async fn find_by_email(&self, _email: &str) -> Result<Option<Employee>> {
                Ok(None)
            }
            async fn list(&self, _s: Option<EmploymentStatus>) -> Result<Vec<Employee>> {
                Ok(self.employees.lock().unwrap().clone())
            }
            async fn update_compliance(
                &self,
                _id: &String,
                _s: ComplianceStatus,
                _now: i64,
            ) -> Result<()> {
                Ok(())
            }
            async fn touch_container_checked(&self, _id: &String, _now: i64) -> Result<()> {
                Ok(())
            }
            async fn count_by_status(&self, _s: EmploymentStatus) -> Result<i64> {
                Ok(0)
            }
        }

        #[async_trait]
        impl CertificateRepository for Repos {
            async fn insert(&self, c: &Certificate) -> Result<()> {
                self.certificates.lock().unwrap().push(c.clone());
                Ok(())
            }
            async fn update(&self, _c: &Certificate) -> Result<()> {
                Ok(())
            }
            async fn find_by_id(&self, _id: &String) -> Result<Option<Certificate>> {
                Ok(None)
            }
            async fn find_current_for(&self, _e: &String) -> Result<Vec<Certificate>> {
                Ok(vec![])
            }
            async fn find_expiring_between(
                &self,
                _f: NaiveDate,
                _t: NaiveDate,
            ) -> Result<Vec<Certificate>> {
                Ok(vec![])
            }
            async fn find_overdue(&self, _t: NaiveDate) -> Result<Vec<Certificate>> {
                Ok(vec![])
            }
            async fn find_non_terminal(&self) -> Result<Vec<Certificate>> {
                Ok(vec![])
            }
            async fn update_status(
                &self,
                _id: &String,
                _s: CertificateStatus,
                _now: i64,
            ) -> Result<()> {
                Ok(())
            }
            async fn count_by_status(&self, _s: CertificateStatus) -> Result<i64> {
                Ok(0)
            }
            async fn list_all(&self) -> Result<Vec<Certificate>> {
                Ok(self.certificates.lock().unwrap().clone())
            }
        }

        #[async_trait]
        impl TrainingTypeRepository for Repos {
            async fn insert(&self, t: &TrainingType) -> Result<()> {
                self.types.lock().unwrap().push(t.clone());
                Ok(())
            }
            async fn find_by_id(&self, _id: &String) -> Result<Option<TrainingType>> {
                Ok(None)
            }
            async fn find_by_code(&self, _code: &str) -> Result<Option<TrainingType>> {
                Ok(None)
            }
            async fn list(&self) -> Result<Vec<TrainingType>> {
                Ok(self.types.lock().unwrap().clone())
            }
            async fn list_mandatory(&self) -> Result<Vec<TrainingType>> {
                Ok(vec![])
            }
        }

        fn date(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        #[tokio::test]
        async fn test_employee_csv_export_writes_file() {
            let repos = Arc::new(Repos::default());
            EmployeeRepository::insert(repos.as_ref(), &Employee::new_test("Export, Person"))
                .await
                .unwrap();

            let dir = tempfile::tempdir().unwrap();
            let service = ExportService::new(
                repos.clone(),
                repos.clone(),
                repos.clone(),
                Arc::new(MockTimeProvider::new(1_700_000_000_000)),
                dir.path(),
            );

            let outcome = service
                .run(ExportDataset::Employees, ExportFormat::Csv)
                .await
                .unwrap();
            assert_eq!(outcome.rows, 1);

            let content = std::fs::read_to_string(&outcome.path).unwrap();
            assert!(content.starts_with("staff_number,full_name,email"));
            assert!(content.contains("\"Export, Person\""));
        }

        #[tokio::test]
        async fn test_certificate_json_export_resolves_type_code() {
            let repos = Arc::new(Repos::default());
            let tt = TrainingType::new_test("FIRST-AID", true);
            TrainingTypeRepository::insert(repos.as_ref(), &tt).await.unwrap();
            CertificateRepository::insert(
                repos.as_ref(),
                &Certificate::new_test("emp-1", tt.id.clone(), 1, date(2025, 1, 1), None),
            )
            .await
            .unwrap();

            let dir = tempfile::tempdir().unwrap();
            let service = ExportService::new(
                repos.clone(),
                repos.clone(),
                repos.clone(),
                Arc::new(MockTimeProvider::new(1_700_000_000_000)),
                dir.path(),
            );

            let outcome = service
                .run(ExportDataset::Certificates, ExportFormat::Json)
                .await
                .unwrap();
            let content = std::fs::read_to_string(&outcome.path).unwrap();
            let row: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
            assert_eq!(row["training_type"], "FIRST-AID");
            assert_eq!(row["expiry_date"], "");
        }
    }
}
