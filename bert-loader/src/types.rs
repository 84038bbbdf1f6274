use crate::detection::{split_path_list, Platform, SearchOptions};
use crate::error::LoaderError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the library file directly
pub const LIBRARY_PATH_ENV: &str = "BERT_LIBRARY_PATH";

/// Environment variable with extra directories to search first
pub const LIBRARY_DIRS_ENV: &str = "BERT_LIBRARY_DIRS";

/// Configuration for locating the native library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Base library name, expanded per platform (e.g. "bert" -> "libbert.so")
    pub library_name: String,
    /// Explicit library file, bypasses the directory search
    pub library_path: Option<PathBuf>,
    /// Extra directories searched before the system ones
    pub search_dirs: Vec<PathBuf>,
    /// Search the linker environment variable and system library directories
    pub include_system_dirs: bool,
    /// Search the current working directory last
    pub include_cwd: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_name: "bert".to_string(),
            library_path: None,
            search_dirs: Vec::new(),
            include_system_dirs: true,
            include_cwd: true,
        }
    }
}

impl LibraryConfig {
    /// Default configuration overlaid with `BERT_LIBRARY_PATH` and `BERT_LIBRARY_DIRS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LibraryConfig::from_env`] with a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(LIBRARY_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.library_path = Some(PathBuf::from(path));
        }

        if let Some(dirs) = lookup(LIBRARY_DIRS_ENV) {
            config.search_dirs = split_path_list(&dirs);
        }

        config
    }

    /// Builder-style helper to add a search directory
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Builder-style helper to pin the library file
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Validate the library configuration
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.library_name.trim().is_empty() {
            return Err(LoaderError::InvalidConfig(
                "Library name cannot be empty".to_string(),
            ));
        }

        if let Some(path) = &self.library_path {
            if path.as_os_str().is_empty() {
                return Err(LoaderError::InvalidConfig(
                    "Library path cannot be empty".to_string(),
                ));
            }
            if path.is_dir() {
                return Err(LoaderError::InvalidConfig(format!(
                    "Library path is a directory: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    pub(crate) fn search_options(&self) -> SearchOptions {
        SearchOptions {
            include_system_dirs: self.include_system_dirs,
            include_cwd: self.include_cwd,
        }
    }
}

/// Metadata about a loaded library
#[derive(Debug, Clone)]
pub struct LibraryMetadata {
    /// File the library was opened from
    pub path: PathBuf,
    /// Platform naming rules used during discovery
    pub platform: Platform,
    /// Time taken to open the library and resolve its symbols
    pub load_time: Duration,
}
