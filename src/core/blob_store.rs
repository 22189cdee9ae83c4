/*
 * Opaque binary storage for uploaded file content, addressed by
 * `(course_id, file_id)`. Whole-value put/get/delete only; there are no partial
 * reads. `CoreBlobStore` keeps one file per blob under
 * `<root>/<course_id>/<file_id>.bin`.
 */
use super::storage::{Result, StorageError, validate_key};
use std::fs;
use std::path::PathBuf;

const BLOB_FILE_EXTENSION: &str = "bin";

pub trait BlobStoreOperations: Send + Sync {
    fn put(&self, course_id: &str, file_id: &str, content: &[u8]) -> Result<()>;
    fn get(&self, course_id: &str, file_id: &str) -> Result<Vec<u8>>;
    /* Deleting a missing blob is not an error. */
    fn delete(&self, course_id: &str, file_id: &str) -> Result<()>;
}

pub struct CoreBlobStore {
    root: PathBuf,
}

impl CoreBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CoreBlobStore { root: root.into() }
    }

    fn blob_path(&self, course_id: &str, file_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(validate_key(course_id)?)
            .join(format!("{}.{BLOB_FILE_EXTENSION}", validate_key(file_id)?)))
    }
}

impl BlobStoreOperations for CoreBlobStore {
    fn put(&self, course_id: &str, file_id: &str, content: &[u8]) -> Result<()> {
        let path = self.blob_path(course_id, file_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        log::debug!(
            "CoreBlobStore: Stored {} bytes for '{course_id}/{file_id}'.",
            content.len()
        );
        Ok(())
    }

    fn get(&self, course_id: &str, file_id: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(course_id, file_id)?;
        if !path.exists() {
            return Err(StorageError::NotFound(format!("{course_id}/{file_id}")));
        }
        Ok(fs::read(&path)?)
    }

    fn delete(&self, course_id: &str, file_id: &str) -> Result<()> {
        let path = self.blob_path(course_id, file_id)?;
        if path.exists() {
            fs::remove_file(&path)?;
            log::debug!("CoreBlobStore: Deleted blob '{course_id}/{file_id}'.");
        } else {
            log::trace!("CoreBlobStore: No blob to delete at {path:?}");
        }
        Ok(())
    }
}
