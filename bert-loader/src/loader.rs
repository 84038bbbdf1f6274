use crate::detection::{find_library, Platform};
use crate::error::LoaderError;
use crate::ffi::{BertApi, SYMBOLS};
use crate::types::{LibraryConfig, LibraryMetadata};
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info};

static GLOBAL_LIBRARY: OnceLock<Arc<BertLibrary>> = OnceLock::new();

/// An opened native BERT library with all of its symbols resolved.
///
/// The function pointers in [`BertApi`] stay valid for as long as this value
/// is alive, so model handles keep an `Arc<BertLibrary>`.
pub struct BertLibrary {
    api: BertApi,
    path: Option<PathBuf>,
    // Must outlive `api`; `None` for tables supplied through `from_api`.
    _library: Option<Library>,
}

impl BertLibrary {
    /// Open the library at `path` and resolve every required symbol
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        debug!("Opening native library {}", path.display());

        // SAFETY: loading a library runs its initializers; we only ever point
        // this at a bert.cpp build chosen by the user or the search path.
        let library = unsafe { Library::new(path) }.map_err(|e| LoaderError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // SAFETY: each alias in `ffi` matches the C prototype of the symbol
        // it is resolved from.
        let api = unsafe {
            BertApi {
                load_from_file: resolve(&library, SYMBOLS[0], path)?,
                free: resolve(&library, SYMBOLS[1], path)?,
                encode: resolve(&library, SYMBOLS[2], path)?,
                encode_batch: resolve(&library, SYMBOLS[3], path)?,
                tokenize: resolve(&library, SYMBOLS[4], path)?,
                eval: resolve(&library, SYMBOLS[5], path)?,
                eval_batch: resolve(&library, SYMBOLS[6], path)?,
                n_embd: resolve(&library, SYMBOLS[7], path)?,
                n_max_tokens: resolve(&library, SYMBOLS[8], path)?,
                vocab_id_to_token: resolve(&library, SYMBOLS[9], path)?,
            }
        };

        Ok(Self {
            api,
            path: Some(path.to_path_buf()),
            _library: Some(library),
        })
    }

    /// Wrap a function table that is already available in the process,
    /// e.g. a statically linked build or an in-process test double.
    pub fn from_api(api: BertApi) -> Self {
        Self {
            api,
            path: None,
            _library: None,
        }
    }

    /// Process-wide library, located with [`LibraryConfig::from_env`] on first use.
    ///
    /// A failed load is not remembered; the next call searches again.
    pub fn global() -> Result<Arc<BertLibrary>, LoaderError> {
        if let Some(library) = GLOBAL_LIBRARY.get() {
            return Ok(Arc::clone(library));
        }

        let (library, _) = LibraryLoader::new(LibraryConfig::from_env()).load()?;
        Ok(Arc::clone(GLOBAL_LIBRARY.get_or_init(|| Arc::new(library))))
    }

    /// Resolved function table
    pub fn api(&self) -> &BertApi {
        &self.api
    }

    /// File the library was opened from, if it came from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for BertLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertLibrary")
            .field("path", &self.path)
            .field("dynamic", &self._library.is_some())
            .finish()
    }
}

unsafe fn resolve<T: Copy>(library: &Library, name: &str, path: &Path) -> Result<T, LoaderError> {
    let symbol: Symbol<T> =
        library
            .get(name.as_bytes())
            .map_err(|_| LoaderError::MissingSymbol {
                symbol: name.to_string(),
                path: path.to_path_buf(),
            })?;
    Ok(*symbol)
}

/// Finds and opens the native library according to a [`LibraryConfig`]
#[derive(Debug, Clone)]
pub struct LibraryLoader {
    config: LibraryConfig,
    platform: Platform,
}

impl LibraryLoader {
    /// Create a loader for the current platform
    pub fn new(config: LibraryConfig) -> Self {
        Self {
            config,
            platform: Platform::current(),
        }
    }

    /// Loader configuration
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Resolve the library file without opening it
    pub fn locate(&self) -> Result<PathBuf, LoaderError> {
        self.config.validate()?;

        if let Some(path) = &self.config.library_path {
            let not_found = || LoaderError::NotFound {
                library: path.display().to_string(),
                searched: vec![path.clone()],
            };
            return match std::fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => Ok(path.clone()),
                Ok(_) => Err(not_found()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
                Err(e) => Err(LoaderError::Io(e)),
            };
        }

        find_library(
            &self.config.library_name,
            self.platform,
            &self.config.search_dirs,
            self.config.search_options(),
        )
    }

    /// Locate and open the library
    pub fn load(&self) -> Result<(BertLibrary, LibraryMetadata), LoaderError> {
        let start = Instant::now();
        let path = self.locate()?;
        let library = BertLibrary::open(&path)?;
        let load_time = start.elapsed();

        info!(
            "Loaded native library {} in {:.2}ms",
            path.display(),
            load_time.as_secs_f64() * 1000.0
        );

        Ok((
            library,
            LibraryMetadata {
                path,
                platform: self.platform,
                load_time,
            },
        ))
    }
}
