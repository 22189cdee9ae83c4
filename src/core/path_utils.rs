/*
 * This module provides utility functions for locating, and creating on demand,
 * the application's platform-specific directories: the local configuration
 * directory (last opened course) and the local data directory (course store
 * and blobs).
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/*
 * Makes sure `dir` exists, creating it and its parents if needed.
 * Returns `None` (after logging) when it cannot be created.
 */
pub fn ensure_dir(dir: &Path) -> Option<PathBuf> {
    if dir.exists() {
        log::trace!("PathUtils: Directory already exists: {dir:?}");
        return Some(dir.to_path_buf());
    }
    if let Err(e) = fs::create_dir_all(dir) {
        log::error!("PathUtils: Failed to create directory {dir:?}: {e}");
        return None;
    }
    log::debug!("PathUtils: Created directory: {dir:?}");
    Some(dir.to_path_buf())
}

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. `None` if the platform offers no home directory
 * or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving config dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|dirs| ensure_dir(dirs.config_local_dir()))
}

/* Same as `get_base_app_config_local_dir`, for the local data directory. */
pub fn get_base_app_data_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving data dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|dirs| ensure_dir(dirs.data_local_dir()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_creates_nested_directories() {
        // Arrange
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        // Act
        let created = ensure_dir(&nested);

        // Assert
        assert_eq!(created, Some(nested.clone()));
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_dir_returns_existing() {
        let dir = tempdir().unwrap();
        assert_eq!(ensure_dir(dir.path()), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_ensure_dir_fails_when_a_file_is_in_the_way() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        assert_eq!(ensure_dir(&blocker.join("child")), None);
    }
}
