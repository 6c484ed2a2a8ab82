// Container Domain Model
//
// A container is the per-employee directory tree plus a JSON metadata
// sidecar. The database record and the directory contents are authoritative;
// the sidecar is a rebuildable cache and repair always rewrites it.

use serde::{Deserialize, Serialize};

/// Sidecar file name inside the employee container root
pub const METADATA_FILE_NAME: &str = "container_metadata.json";

/// Current sidecar schema version
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Document categories, one subdirectory each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerCategory {
    Certificates,
    BackgroundChecks,
    Documents,
    Photos,
}

impl ContainerCategory {
    pub const ALL: [ContainerCategory; 4] = [
        ContainerCategory::Certificates,
        ContainerCategory::BackgroundChecks,
        ContainerCategory::Documents,
        ContainerCategory::Photos,
    ];

    /// Directory name under the container root
    pub fn dir_name(&self) -> &'static str {
        match self {
            ContainerCategory::Certificates => "certificates",
            ContainerCategory::BackgroundChecks => "background_checks",
            ContainerCategory::Documents => "documents",
            ContainerCategory::Photos => "photos",
        }
    }
}

impl std::fmt::Display for ContainerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// File counts per category, stored in the sidecar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub certificates: usize,
    pub background_checks: usize,
    pub documents: usize,
    pub photos: usize,
}

impl FileCounts {
    pub fn get(&self, category: ContainerCategory) -> usize {
        match category {
            ContainerCategory::Certificates => self.certificates,
            ContainerCategory::BackgroundChecks => self.background_checks,
            ContainerCategory::Documents => self.documents,
            ContainerCategory::Photos => self.photos,
        }
    }

    pub fn set(&mut self, category: ContainerCategory, count: usize) {
        match category {
            ContainerCategory::Certificates => self.certificates = count,
            ContainerCategory::BackgroundChecks => self.background_checks = count,
            ContainerCategory::Documents => self.documents = count,
            ContainerCategory::Photos => self.photos = count,
        }
    }

    pub fn total(&self) -> usize {
        self.certificates + self.background_checks + self.documents + self.photos
    }
}

/// JSON sidecar content (`container_metadata.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub schema_version: u32,
    pub employee_id: String,
    pub employee_name: String,
    pub created_at: i64, // epoch ms
    pub refreshed_at: i64,
    pub file_counts: FileCounts,
}

impl ContainerMetadata {
    pub fn new(
        employee_id: impl Into<String>,
        employee_name: impl Into<String>,
        now_millis: i64,
        file_counts: FileCounts,
    ) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            employee_id: employee_id.into(),
            employee_name: employee_name.into(),
            created_at: now_millis,
            refreshed_at: now_millis,
            file_counts,
        }
    }
}

/// A single problem found during a container health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ContainerIssue {
    MissingRoot,
    MissingCategoryDir { category: ContainerCategory },
    MissingMetadata,
    CorruptMetadata { detail: String },
    NameMismatch { recorded: String, expected: String },
    CountDrift { category: ContainerCategory, recorded: usize, actual: usize },
}

/// Result of checking one employee container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHealthReport {
    pub employee_id: String,
    pub issues: Vec<ContainerIssue>,
    pub checked_at: i64, // epoch ms
}

impl ContainerHealthReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of repairing one employee container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub employee_id: String,
    pub created_dirs: Vec<String>,
    pub metadata_rebuilt: bool,
    pub repaired_at: i64, // epoch ms
}
