use crate::error::LoaderError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Operating system families with distinct library naming and search rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux and every other Unix
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Shared library extension, including the leading dot
    pub fn library_extension(&self) -> &'static str {
        match self {
            Platform::Windows => ".dll",
            Platform::MacOs => ".dylib",
            Platform::Linux => ".so",
        }
    }

    /// Environment variable the dynamic linker consults for extra directories
    pub fn library_env_var(&self) -> &'static str {
        match self {
            Platform::Windows => "PATH",
            Platform::MacOs => "DYLD_LIBRARY_PATH",
            Platform::Linux => "LD_LIBRARY_PATH",
        }
    }

    /// Turn a library name into the file name expected on this platform.
    ///
    /// `bert` becomes `libbert.so`, `libbert.dylib` or `bert.dll`. Names that
    /// already end in the platform extension are returned as-is.
    pub fn library_file_name(&self, name: &str) -> String {
        let ext = self.library_extension();
        if name.ends_with(ext) {
            return name.to_string();
        }

        match self {
            Platform::Windows => format!("{}{}", name, ext),
            Platform::MacOs | Platform::Linux => {
                if name.starts_with("lib") {
                    format!("{}{}", name, ext)
                } else {
                    format!("lib{}{}", name, ext)
                }
            }
        }
    }

    /// Directories from the platform environment variable followed by the
    /// conventional system library directories.
    ///
    /// `lookup` resolves environment variables so callers and tests can supply
    /// their own environment.
    pub fn system_dirs<F>(&self, lookup: F) -> Vec<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut dirs: Vec<PathBuf> = lookup(self.library_env_var())
            .map(|value| split_path_list(&value))
            .unwrap_or_default();

        match self {
            Platform::Windows => {
                let system_root = lookup("SystemRoot").unwrap_or_default();
                let root = PathBuf::from(system_root);
                dirs.push(root.join("System32"));
                dirs.push(root.join("SysWOW64"));
            }
            Platform::MacOs => {
                dirs.push(PathBuf::from("/usr/lib"));
                dirs.push(PathBuf::from("/usr/local/lib"));
            }
            Platform::Linux => {
                dirs.push(PathBuf::from("/lib"));
                dirs.push(PathBuf::from("/usr/lib"));
                dirs.push(PathBuf::from("/usr/local/lib"));
            }
        }

        dirs
    }
}

/// Which implicit locations `find_library` adds after the caller's directories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub include_system_dirs: bool,
    pub include_cwd: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_system_dirs: true,
            include_cwd: true,
        }
    }
}

/// Split an OS path list (`:` on Unix, `;` on Windows), dropping empty entries
pub fn split_path_list(value: &str) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Search for a dynamic library by name.
///
/// Directories are checked in this order: `extra_dirs`, the platform system
/// directories, then the current working directory. The first regular file
/// wins. On failure the error lists every path that was checked.
pub fn find_library(
    name: &str,
    platform: Platform,
    extra_dirs: &[PathBuf],
    options: SearchOptions,
) -> Result<PathBuf, LoaderError> {
    let file_name = platform.library_file_name(name);

    let mut dirs: Vec<PathBuf> = extra_dirs.to_vec();
    if options.include_system_dirs {
        dirs.extend(platform.system_dirs(|key| std::env::var(key).ok()));
    }
    if options.include_cwd {
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd);
        }
    }

    let mut searched = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let candidate = dir.join(&file_name);
        debug!("Checking for native library at {}", candidate.display());
        if is_regular_file(&candidate) {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    Err(LoaderError::NotFound {
        library: file_name,
        searched,
    })
}

fn is_regular_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file())
        .unwrap_or(false)
}
