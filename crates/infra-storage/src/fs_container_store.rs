// Filesystem ContainerStore implementation
//
// Layout under the data root:
//   employees/{employee_id}/certificates/
//   employees/{employee_id}/background_checks/
//   employees/{employee_id}/documents/
//   employees/{employee_id}/photos/
//   employees/{employee_id}/container_metadata.json

use async_trait::async_trait;
use credent_core::domain::{ContainerCategory, ContainerMetadata, METADATA_FILE_NAME};
use credent_core::error::{AppError, Result};
use credent_core::port::ContainerStore;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FsContainerStore {
    data_root: PathBuf,
}

impl FsContainerStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    fn container_root(&self, employee_id: &str) -> PathBuf {
        self.data_root.join("employees").join(employee_id)
    }

    fn category_dir(&self, employee_id: &str, category: ContainerCategory) -> PathBuf {
        self.container_root(employee_id).join(category.dir_name())
    }

    fn metadata_path(&self, employee_id: &str) -> PathBuf {
        self.container_root(employee_id).join(METADATA_FILE_NAME)
    }

    fn storage_err(path: &Path, e: std::io::Error) -> AppError {
        AppError::Storage(format!("{}: {}", path.display(), e))
    }
}

#[async_trait]
impl ContainerStore for FsContainerStore {
    async fn root_exists(&self, employee_id: &str) -> Result<bool> {
        Ok(self.container_root(employee_id).is_dir())
    }

    async fn category_exists(
        &self,
        employee_id: &str,
        category: ContainerCategory,
    ) -> Result<bool> {
        Ok(self.category_dir(employee_id, category).is_dir())
    }

    async fn ensure_layout(&self, employee_id: &str) -> Result<Vec<String>> {
        let mut created = Vec::new();

        let root = self.container_root(employee_id);
        if !root.is_dir() {
            tokio::fs::create_dir_all(&root)
                .await
                .map_err(|e| Self::storage_err(&root, e))?;
            created.push(root.to_string_lossy().to_string());
        }

        for category in ContainerCategory::ALL {
            let dir = self.category_dir(employee_id, category);
            if !dir.is_dir() {
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(|e| Self::storage_err(&dir, e))?;
                created.push(dir.to_string_lossy().to_string());
            }
        }

        if !created.is_empty() {
            debug!(employee_id = %employee_id, created = created.len(), "Container layout created");
        }

        Ok(created)
    }

    async fn read_metadata(&self, employee_id: &str) -> Result<Option<ContainerMetadata>> {
        match self.read_metadata_raw(employee_id).await? {
            None => Ok(None),
            Some(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
        }
    }

    async fn read_metadata_raw(&self, employee_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.metadata_path(employee_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::storage_err(&path, e)),
        }
    }

    async fn write_metadata(&self, employee_id: &str, metadata: &ContainerMetadata) -> Result<()> {
        let root = self.container_root(employee_id);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| Self::storage_err(&root, e))?;

        let path = self.metadata_path(employee_id);
        let bytes = serde_json::to_vec_pretty(metadata)?;

        // Write-then-rename so a crash never leaves a half-written sidecar
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Self::storage_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Self::storage_err(&path, e))?;

        Ok(())
    }

    async fn count_files(&self, employee_id: &str, category: ContainerCategory) -> Result<usize> {
        Ok(self.list_files(employee_id, category).await?.len())
    }

    async fn list_files(
        &self,
        employee_id: &str,
        category: ContainerCategory,
    ) -> Result<Vec<String>> {
        let dir = self.category_dir(employee_id, category);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::storage_err(&dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::storage_err(&dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Self::storage_err(&dir, e))?;
            if file_type.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();

        Ok(names)
    }

    async fn put_file(
        &self,
        employee_id: &str,
        category: ContainerCategory,
        file_name: &str,
        contents: &[u8],
    ) -> Result<()> {
        // Plain names only: path separators or traversal would escape the
        // category directory
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name == "."
            || file_name == ".."
        {
            return Err(AppError::Validation(format!(
                "Invalid file name: {:?}",
                file_name
            )));
        }

        let dir = self.category_dir(employee_id, category);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Self::storage_err(&dir, e))?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| Self::storage_err(&path, e))?;

        debug!(employee_id = %employee_id, category = %category, file = %file_name, "File stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credent_core::domain::FileCounts;

    fn store() -> (tempfile::TempDir, FsContainerStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsContainerStore::new(tmp.path());
        (tmp, store)
    }

    #[tokio::test]
    async fn test_ensure_layout_is_idempotent() {
        let (_tmp, store) = store();

        let created = store.ensure_layout("emp-1").await.unwrap();
        assert_eq!(created.len(), 5); // root + 4 categories

        let created = store.ensure_layout("emp-1").await.unwrap();
        assert!(created.is_empty());

        assert!(store.root_exists("emp-1").await.unwrap());
        for category in ContainerCategory::ALL {
            assert!(store.category_exists("emp-1", category).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let (_tmp, store) = store();
        store.ensure_layout("emp-1").await.unwrap();

        assert!(store.read_metadata("emp-1").await.unwrap().is_none());

        let metadata = ContainerMetadata::new("emp-1", "Jo Worker", 1_000, FileCounts::default());
        store.write_metadata("emp-1", &metadata).await.unwrap();

        let read = store.read_metadata("emp-1").await.unwrap().unwrap();
        assert_eq!(read, metadata);
    }

    #[tokio::test]
    async fn test_corrupt_metadata_reads_as_none_but_raw_is_some() {
        let (tmp, store) = store();
        store.ensure_layout("emp-1").await.unwrap();

        let path = tmp
            .path()
            .join("employees")
            .join("emp-1")
            .join(METADATA_FILE_NAME);
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        assert!(store.read_metadata("emp-1").await.unwrap().is_none());
        assert!(store.read_metadata_raw("emp-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_and_count_files() {
        let (_tmp, store) = store();
        store.ensure_layout("emp-1").await.unwrap();

        store
            .put_file("emp-1", ContainerCategory::Certificates, "first-aid.pdf", b"pdf")
            .await
            .unwrap();
        store
            .put_file("emp-1", ContainerCategory::Certificates, "forklift.pdf", b"pdf")
            .await
            .unwrap();

        let count = store
            .count_files("emp-1", ContainerCategory::Certificates)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let files = store
            .list_files("emp-1", ContainerCategory::Certificates)
            .await
            .unwrap();
        assert_eq!(files, vec!["first-aid.pdf", "forklift.pdf"]);

        // Sidecar does not count as a category file
        let count = store
            .count_files("emp-1", ContainerCategory::Photos)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_put_file_rejects_traversal() {
        let (_tmp, store) = store();

        let err = store
            .put_file("emp-1", ContainerCategory::Documents, "../escape.txt", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
