//! # Bert Loader
//!
//! Locates the precompiled BERT inference library for the running platform,
//! opens it with the system dynamic linker and resolves its exported symbols.
//! Higher-level crates build safe model handles on top of [`BertLibrary`].

pub mod detection;
pub mod error;
pub mod ffi;
pub mod loader;
pub mod types;

// Re-export main types for convenience
pub use detection::{find_library, Platform, SearchOptions};
pub use error::LoaderError;
pub use ffi::{BertApi, BertContext};
pub use loader::{BertLibrary, LibraryLoader};
pub use types::{LibraryConfig, LibraryMetadata};
