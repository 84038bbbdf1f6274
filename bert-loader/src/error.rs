use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating or opening the native library
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No candidate file exists in any searched directory
    #[error("Library '{library}' not found, checked following paths:\n{}📁 Set BERT_LIBRARY_PATH to the library file or add its directory to BERT_LIBRARY_DIRS", format_searched(.searched))]
    NotFound {
        library: String,
        searched: Vec<PathBuf>,
    },

    /// The dynamic linker refused the file
    #[error("Failed to load {}: {reason}\n🔧 Verify the file is a shared library built for this platform and architecture", .path.display())]
    LoadFailed { path: PathBuf, reason: String },

    /// The library opened but does not export a required function
    #[error("Failed to resolve symbol '{symbol}' in {}\n🔧 The library is likely from an incompatible build of bert.cpp", .path.display())]
    MissingSymbol { symbol: String, path: PathBuf },

    /// Invalid loader configuration
    #[error("Invalid library config: {0}\n⚙️ Ensure library_name is not empty and library_path points to a file")]
    InvalidConfig(String),

    /// I/O error during file checks
    #[error("I/O error: {0}\n💾 Check file permissions")]
    Io(#[from] std::io::Error),
}

impl LoaderError {
    /// Paths checked before giving up, empty for errors other than `NotFound`
    pub fn searched_paths(&self) -> &[PathBuf] {
        match self {
            LoaderError::NotFound { searched, .. } => searched,
            _ => &[],
        }
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|path| format!(" - {}\n", path.display()))
        .collect()
}
