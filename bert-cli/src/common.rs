use bert_embedding::{BertModel, EmbeddingConfig};
use bert_loader::types::LIBRARY_PATH_ENV;
use bert_loader::{BertLibrary, LibraryConfig, LibraryLoader};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Largest thread count accepted on the command line
pub const MAX_THREADS: usize = 256;

/// Arguments shared by every subcommand that needs a loaded model
#[derive(Args, Clone, Debug)]
pub struct ModelArgs {
    /// Model file
    #[arg(long, short, help = "Path to the BERT model file (e.g. minilm12-q4.bin)")]
    pub model: PathBuf,

    /// Native library file
    #[arg(long, help = "Explicit path to the native bert library")]
    pub library: Option<PathBuf>,

    /// Extra library directories
    #[arg(
        long = "lib-dir",
        help = "Extra directory to search for the native library (repeatable)"
    )]
    pub lib_dirs: Vec<PathBuf>,

    /// Inference threads
    #[arg(long, help = "Threads for native inference (default: min(6, CPU count))")]
    pub threads: Option<usize>,

    /// Enable debug output
    #[arg(long, help = "Enable debug output")]
    pub debug: bool,
}

impl ModelArgs {
    /// Library configuration: environment first, then command-line overrides
    pub fn library_config(&self) -> LibraryConfig {
        self.apply_to(LibraryConfig::from_env())
    }

    /// Apply `--library` and `--lib-dir` on top of `config`.
    ///
    /// `--lib-dir` drops an explicit path inherited from the environment,
    /// since that path would otherwise skip the directory search.
    pub fn apply_to(&self, mut config: LibraryConfig) -> LibraryConfig {
        if !self.lib_dirs.is_empty() {
            if let Some(env_path) = config.library_path.take() {
                warn!(
                    "Ignoring {}={} because --lib-dir was given",
                    LIBRARY_PATH_ENV,
                    env_path.display()
                );
            }
            let mut dirs = self.lib_dirs.clone();
            dirs.append(&mut config.search_dirs);
            config.search_dirs = dirs;
        }
        if let Some(library) = &self.library {
            config.library_path = Some(library.clone());
        }
        config
    }

    /// Embedding configuration with the thread override applied
    pub fn embedding_config(&self, batch_size: usize, normalize: bool) -> EmbeddingConfig {
        let defaults = EmbeddingConfig::default();
        EmbeddingConfig {
            threads: self.threads.unwrap_or(defaults.threads),
            batch_size,
            normalize_embeddings: normalize,
        }
    }
}

/// Validate model, library and thread arguments
pub fn validate_model_args(args: &ModelArgs) -> anyhow::Result<()> {
    validate_model_file(&args.model)?;

    if let Some(library) = &args.library {
        if !library.is_file() {
            return Err(anyhow::anyhow!(
                "Library file does not exist: {}\n💡 Point --library at libbert.so, libbert.dylib or bert.dll",
                library.display()
            ));
        }
    }

    for dir in &args.lib_dirs {
        if !dir.is_dir() {
            return Err(anyhow::anyhow!(
                "Library directory does not exist: {}\n💡 Each --lib-dir must be an existing directory",
                dir.display()
            ));
        }
    }

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err(anyhow::anyhow!(
                "Thread count must be greater than 0\n💡 Omit --threads to use min(6, CPU count)"
            ));
        }
        if threads > MAX_THREADS {
            return Err(anyhow::anyhow!(
                "Thread count is too large: {}. Maximum is {}",
                threads,
                MAX_THREADS
            ));
        }
    }

    Ok(())
}

fn validate_model_file(model: &Path) -> anyhow::Result<()> {
    if model.as_os_str().is_empty() {
        return Err(anyhow::anyhow!(
            "Model path cannot be empty\n💡 Provide the path to a ggml BERT model file"
        ));
    }
    if !model.exists() {
        return Err(anyhow::anyhow!(
            "Model file does not exist: {}\n💡 Download a ggml BERT model (e.g. minilm12-q4.bin) and pass its path",
            model.display()
        ));
    }
    if !model.is_file() {
        return Err(anyhow::anyhow!(
            "Model path is not a file: {}\n💡 Provide the model file itself, not its directory",
            model.display()
        ));
    }
    Ok(())
}

/// Locate and open the native library described by `args`
pub fn open_library(args: &ModelArgs) -> anyhow::Result<Arc<BertLibrary>> {
    let loader = LibraryLoader::new(args.library_config());
    let (library, metadata) = loader
        .load()
        .map_err(|e| anyhow::anyhow!("Failed to load native library: {}", e))?;

    info!(
        "Native library: {} ({:?}, {:.1}ms)",
        metadata.path.display(),
        metadata.platform,
        metadata.load_time.as_secs_f64() * 1000.0
    );
    Ok(Arc::new(library))
}

/// Open the library and load the model described by `args`
pub fn load_model(
    args: &ModelArgs,
    batch_size: usize,
    normalize: bool,
) -> anyhow::Result<BertModel> {
    let library = open_library(args)?;
    let config = args.embedding_config(batch_size, normalize);
    BertModel::load_with_library(library, &args.model, config)
        .map_err(|e| anyhow::anyhow!("Failed to load model: {}", e))
}

/// Install the tracing subscriber: DEBUG with `--debug`, WARN otherwise
pub fn init_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

/// Process exit code for a failed command: 2 validation, 3 library/model load, 1 other
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    let error_msg = error.to_string();
    if error_msg.contains("does not exist")
        || error_msg.contains("cannot be empty")
        || error_msg.contains("is not a file")
        || error_msg.contains("must have .parquet extension")
        || error_msg.contains("Batch size")
        || error_msg.contains("Thread count")
    {
        2
    } else if error_msg.contains("Failed to load") {
        3
    } else {
        1
    }
}
