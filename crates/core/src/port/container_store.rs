// Container Store Port
// Abstraction over the per-employee directory tree + metadata sidecar

use crate::domain::{ContainerCategory, ContainerMetadata};
use crate::error::Result;
use async_trait::async_trait;

/// Storage port for employee containers
///
/// Implementations:
/// - FsContainerStore: private-disk directory tree (production)
/// - MockContainerStore: in-memory map (tests)
#[async_trait]
pub trait ContainerStore: Send + Sync {
    /// True if the container root directory exists
    async fn root_exists(&self, employee_id: &str) -> Result<bool>;

    /// True if the given category directory exists
    async fn category_exists(&self, employee_id: &str, category: ContainerCategory)
        -> Result<bool>;

    /// Create the container root and all category directories (idempotent).
    /// Returns the paths that were newly created.
    async fn ensure_layout(&self, employee_id: &str) -> Result<Vec<String>>;

    /// Read and parse the metadata sidecar.
    /// Ok(None) if the sidecar is absent; Err on unreadable/corrupt content
    /// is avoided - corrupt sidecars surface as Ok(Some(Err)) via
    /// `read_metadata_raw`, so the checker can classify them.
    async fn read_metadata(&self, employee_id: &str) -> Result<Option<ContainerMetadata>>;

    /// Raw sidecar bytes for corruption diagnosis. Ok(None) if absent.
    async fn read_metadata_raw(&self, employee_id: &str) -> Result<Option<Vec<u8>>>;

    /// Write (overwrite) the metadata sidecar
    async fn write_metadata(&self, employee_id: &str, metadata: &ContainerMetadata) -> Result<()>;

    /// Count regular files in a category directory (0 if the dir is missing)
    async fn count_files(&self, employee_id: &str, category: ContainerCategory) -> Result<usize>;

    /// List file names in a category directory
    async fn list_files(
        &self,
        employee_id: &str,
        category: ContainerCategory,
    ) -> Result<Vec<String>>;

    /// Store an uploaded file into a category directory
    async fn put_file(
        &self,
        employee_id: &str,
        category: ContainerCategory,
        file_name: &str,
        contents: &[u8],
    ) -> Result<()>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockState {
        roots: HashSet<String>,
        dirs: HashSet<(String, ContainerCategory)>,
        files: HashMap<(String, ContainerCategory), Vec<String>>,
        metadata: HashMap<String, Vec<u8>>,
    }

    /// In-memory ContainerStore for tests
    #[derive(Default)]
    pub struct MockContainerStore {
        state: Mutex<MockState>,
    }

    impl MockContainerStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Drop a category dir to simulate manual tampering
        pub fn remove_category(&self, employee_id: &str, category: ContainerCategory) {
            let mut state = self.state.lock().unwrap();
            state.dirs.remove(&(employee_id.to_string(), category));
            state.files.remove(&(employee_id.to_string(), category));
        }

        /// Overwrite the sidecar with arbitrary bytes (corruption tests)
        pub fn corrupt_metadata(&self, employee_id: &str, bytes: &[u8]) {
            let mut state = self.state.lock().unwrap();
            state.metadata.insert(employee_id.to_string(), bytes.to_vec());
        }

        /// Delete the sidecar
        pub fn remove_metadata(&self, employee_id: &str) {
            let mut state = self.state.lock().unwrap();
            state.metadata.remove(employee_id);
        }
    }

    #[async_trait]
    impl ContainerStore for MockContainerStore {
        async fn root_exists(&self, employee_id: &str) -> Result<bool> {
            Ok(self.state.lock().unwrap().roots.contains(employee_id))
        }

        async fn category_exists(
            &self,
            employee_id: &str,
            category: ContainerCategory,
        ) -> Result<bool> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .dirs
                .contains(&(employee_id.to_string(), category)))
        }

        async fn ensure_layout(&self, employee_id: &str) -> Result<Vec<String>> {
            let mut state = self.state.lock().unwrap();
            let mut created = Vec::new();
            if state.roots.insert(employee_id.to_string()) {
                created.push(format!("employees/{}", employee_id));
            }
            for category in ContainerCategory::ALL {
                if state.dirs.insert((employee_id.to_string(), category)) {
                    created.push(format!("employees/{}/{}", employee_id, category.dir_name()));
                }
            }
            Ok(created)
        }

        async fn read_metadata(&self, employee_id: &str) -> Result<Option<ContainerMetadata>> {
            let state = self.state.lock().unwrap();
            match state.metadata.get(employee_id) {
                None => Ok(None),
                Some(bytes) => Ok(serde_json::from_slice(bytes).ok()),
            }
        }

        async fn read_metadata_raw(&self, employee_id: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.state.lock().unwrap().metadata.get(employee_id).cloned())
        }

        async fn write_metadata(
            &self,
            employee_id: &str,
            metadata: &ContainerMetadata,
        ) -> Result<()> {
            let bytes = serde_json::to_vec_pretty(metadata)?;
            let mut state = self.state.lock().unwrap();
            state.roots.insert(employee_id.to_string());
            state.metadata.insert(employee_id.to_string(), bytes);
            Ok(())
        }

        async fn count_files(
            &self,
            employee_id: &str,
            category: ContainerCategory,
        ) -> Result<usize> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .files
                .get(&(employee_id.to_string(), category))
                .map(|f| f.len())
                .unwrap_or(0))
        }

        async fn list_files(
            &self,
            employee_id: &str,
            category: ContainerCategory,
        ) -> Result<Vec<String>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .files
                .get(&(employee_id.to_string(), category))
                .cloned()
                .unwrap_or_default())
        }

        async fn put_file(
            &self,
            employee_id: &str,
            category: ContainerCategory,
            file_name: &str,
            _contents: &[u8],
        ) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.roots.insert(employee_id.to_string());
            state.dirs.insert((employee_id.to_string(), category));
            state
                .files
                .entry((employee_id.to_string(), category))
                .or_default()
                .push(file_name.to_string());
            Ok(())
        }
    }
}
