/*
 * Manages application-level settings that outlive a session: currently the id
 * of the last opened course. Settings live as small text files in the
 * application's local configuration directory, found through `path_utils`,
 * unless a directory is given explicitly.
 *
 * It uses a trait (`ConfigManagerOperations`) so the controller and tests can
 * swap in other backends.
 */
use crate::core::path_utils;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

const LAST_COURSE_ID_FILENAME: &str = "last_course_id.txt";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    NoConfigDirectory,
    Utf8Error(std::string::FromUtf8Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<std::string::FromUtf8Error> for ConfigError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ConfigError::Utf8Error(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::NoConfigDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
            ConfigError::Utf8Error(e) => write!(f, "Configuration file UTF-8 error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Utf8Error(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub trait ConfigManagerOperations: Send + Sync {
    fn load_last_course_id(&self, app_name: &str) -> Result<Option<String>>;
    fn save_last_course_id(&self, app_name: &str, course_id: Option<&str>) -> Result<()>;
}

pub struct CoreConfigManager {
    config_dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {
            config_dir_override: None,
        }
    }

    /* Keeps settings in `dir` instead of the platform configuration directory. */
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        CoreConfigManager {
            config_dir_override: Some(dir.into()),
        }
    }

    fn config_dir(&self, app_name: &str) -> Result<PathBuf> {
        let dir = match &self.config_dir_override {
            Some(dir) => path_utils::ensure_dir(dir),
            None => path_utils::get_base_app_config_local_dir(app_name),
        };
        dir.ok_or(ConfigError::NoConfigDirectory)
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * Reads the last opened course id. A missing or blank file means no course
     * has been opened yet.
     */
    fn load_last_course_id(&self, app_name: &str) -> Result<Option<String>> {
        log::trace!("CoreConfigManager: Loading last course id for app '{app_name}'");
        let file_path = self.config_dir(app_name)?.join(LAST_COURSE_ID_FILENAME);

        if !file_path.exists() {
            log::debug!("CoreConfigManager: Last course file {file_path:?} does not exist.");
            return Ok(None);
        }

        let mut file = File::open(&file_path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let contents = String::from_utf8(bytes)?;

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            log::debug!("CoreConfigManager: Last course file {file_path:?} is empty.");
            Ok(None)
        } else {
            log::debug!("CoreConfigManager: Loaded last course id '{trimmed}'.");
            Ok(Some(trimmed.to_string()))
        }
    }

    /* Passing `None` clears the stored value. */
    fn save_last_course_id(&self, app_name: &str, course_id: Option<&str>) -> Result<()> {
        log::trace!("CoreConfigManager: Saving last course id {course_id:?} for app '{app_name}'");
        let file_path = self.config_dir(app_name)?.join(LAST_COURSE_ID_FILENAME);

        let mut file = File::create(&file_path)?;
        file.write_all(course_id.unwrap_or_default().as_bytes())?;
        log::debug!("CoreConfigManager: Saved last course id {course_id:?} to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const APP_NAME: &str = "AnyApp";

    #[test]
    fn test_save_and_load_last_course_id() {
        // Arrange
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_dir(dir.path());

        // Act
        manager
            .save_last_course_id(APP_NAME, Some("bio-101"))
            .unwrap();

        // Assert
        match manager.load_last_course_id(APP_NAME) {
            Ok(Some(id)) => assert_eq!(id, "bio-101"),
            Ok(None) => panic!("Expected a course id, but got None."),
            Err(e) => panic!("Failed to load course id: {e:?}"),
        }
    }

    #[test]
    fn test_load_last_course_id_not_exists() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_dir(dir.path().join("fresh"));
        assert!(matches!(manager.load_last_course_id(APP_NAME), Ok(None)));
    }

    #[test]
    fn test_load_last_course_id_blank_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LAST_COURSE_ID_FILENAME), "  \n").unwrap();
        let manager = CoreConfigManager::with_dir(dir.path());
        assert!(matches!(manager.load_last_course_id(APP_NAME), Ok(None)));
    }

    #[test]
    fn test_save_none_clears_and_overwrites() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_dir(dir.path());
        manager.save_last_course_id(APP_NAME, Some("one")).unwrap();
        manager.save_last_course_id(APP_NAME, Some("two")).unwrap();
        assert_eq!(
            manager.load_last_course_id(APP_NAME).unwrap(),
            Some("two".to_string())
        );
        manager.save_last_course_id(APP_NAME, None).unwrap();
        assert_eq!(manager.load_last_course_id(APP_NAME).unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LAST_COURSE_ID_FILENAME), [0xff, 0xfe]).unwrap();
        let manager = CoreConfigManager::with_dir(dir.path());
        assert!(matches!(
            manager.load_last_course_id(APP_NAME),
            Err(ConfigError::Utf8Error(_))
        ));
    }
}
