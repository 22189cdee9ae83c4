/*
 * This module persists course data as whole JSON documents, replaced on every
 * write. Three kinds of document exist:
 *   - the canonical module list, under one well-known key (`modules.json`);
 *   - the file metadata of a course (`courses/<course>/files.json`);
 *   - the rich-text content of a page (`courses/<course>/pages/<page>.html`).
 *
 * It includes a trait for store operations (`CourseStoreOperations`) to allow
 * mock stores in tests, and a concrete implementation (`CoreCourseStore`) rooted
 * in a directory. Keys used to derive file names are validated, never rewritten,
 * so two distinct keys can never map onto the same document.
 */
use super::file_refs::FileCatalog;
use super::models::{Module, default_modules};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

const MODULES_FILENAME: &str = "modules.json";
const FILES_META_FILENAME: &str = "files.json";
const COURSES_SUBFOLDER_NAME: &str = "courses";
const PAGES_SUBFOLDER_NAME: &str = "pages";
const BLOBS_SUBFOLDER_NAME: &str = "blobs";
const PAGE_FILE_EXTENSION: &str = "html";

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Serde(serde_json::Error),
    InvalidKey(String),
    NotFound(String),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serde(err)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "Storage I/O error: {e}"),
            StorageError::Serde(e) => write!(f, "Serialization/Deserialization error: {e}"),
            StorageError::InvalidKey(key) => write!(
                f,
                "Invalid storage key: '{key}'. Contains invalid characters or is empty."
            ),
            StorageError::NotFound(key) => write!(f, "Nothing stored under '{key}'"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub fn is_valid_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/* Keys become path components: they must be non-empty and must not be "." or "..". */
pub fn validate_key(key: &str) -> Result<&str> {
    if key.is_empty() || key == "." || key == ".." || !key.chars().all(is_valid_key_char) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(key)
}

pub trait CourseStoreOperations: Send + Sync {
    /* Returns the default outline when nothing has been stored yet. */
    fn load_modules(&self) -> Result<Vec<Module>>;
    fn save_modules(&self, modules: &[Module]) -> Result<()>;
    /* Returns an empty catalog when the course has no metadata document yet. */
    fn load_files_meta(&self, course_id: &str) -> Result<FileCatalog>;
    fn save_files_meta(&self, course_id: &str, catalog: &FileCatalog) -> Result<()>;
    fn load_page_content(&self, course_id: &str, page_id: &str) -> Result<Option<String>>;
    fn save_page_content(&self, course_id: &str, page_id: &str, content: &str) -> Result<()>;
}

pub struct CoreCourseStore {
    root: PathBuf,
}

impl CoreCourseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CoreCourseStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /* Directory where a blob store sharing this root keeps its content. */
    pub fn blob_dir(&self) -> PathBuf {
        self.root.join(BLOBS_SUBFOLDER_NAME)
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            log::debug!("CoreCourseStore: Created storage directory: {dir:?}");
        }
        Ok(())
    }

    fn course_dir(&self, course_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(COURSES_SUBFOLDER_NAME)
            .join(validate_key(course_id)?))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            log::trace!("CoreCourseStore: No document at {path:?}");
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }
}

impl CourseStoreOperations for CoreCourseStore {
    fn load_modules(&self) -> Result<Vec<Module>> {
        let path = self.root.join(MODULES_FILENAME);
        let Some(modules) = Self::read_json::<Vec<Module>>(&path)? else {
            log::info!("CoreCourseStore: No modules stored yet; starting from the default outline.");
            return Ok(default_modules());
        };
        log::debug!(
            "CoreCourseStore: Loaded {} modules from {:?}.",
            modules.len(),
            path
        );
        Ok(modules)
    }

    fn save_modules(&self, modules: &[Module]) -> Result<()> {
        let path = self.root.join(MODULES_FILENAME);
        Self::write_json(&path, modules)?;
        log::debug!(
            "CoreCourseStore: Saved {} modules to {:?}.",
            modules.len(),
            path
        );
        Ok(())
    }

    fn load_files_meta(&self, course_id: &str) -> Result<FileCatalog> {
        let path = self.course_dir(course_id)?.join(FILES_META_FILENAME);
        let catalog: FileCatalog = Self::read_json(&path)?.unwrap_or_default();
        log::debug!(
            "CoreCourseStore: Loaded metadata of {} files for course '{course_id}'.",
            catalog.files().len()
        );
        Ok(catalog)
    }

    fn save_files_meta(&self, course_id: &str, catalog: &FileCatalog) -> Result<()> {
        let path = self.course_dir(course_id)?.join(FILES_META_FILENAME);
        Self::write_json(&path, catalog)?;
        log::debug!(
            "CoreCourseStore: Saved metadata of {} files for course '{course_id}'.",
            catalog.files().len()
        );
        Ok(())
    }

    fn load_page_content(&self, course_id: &str, page_id: &str) -> Result<Option<String>> {
        let path = self
            .course_dir(course_id)?
            .join(PAGES_SUBFOLDER_NAME)
            .join(format!("{}.{PAGE_FILE_EXTENSION}", validate_key(page_id)?));
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn save_page_content(&self, course_id: &str, page_id: &str, content: &str) -> Result<()> {
        let dir = self.course_dir(course_id)?.join(PAGES_SUBFOLDER_NAME);
        Self::ensure_dir(&dir)?;
        let path = dir.join(format!("{}.{PAGE_FILE_EXTENSION}", validate_key(page_id)?));
        fs::write(&path, content)?;
        log::debug!("CoreCourseStore: Saved page '{page_id}' of course '{course_id}'.");
        Ok(())
    }
}
