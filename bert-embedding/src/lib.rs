//! # bert-embedding
//!
//! Text embeddings from the native BERT library through a safe Rust API.
//! All tokenization and inference happen in the native code; this crate
//! owns the model handle and moves strings and buffers across the C boundary.
//!
//! ## Features
//!
//! - Single and batch text embedding
//! - Tokenization, token embedding and vocabulary lookup
//! - Optional L2 normalization of the returned vectors
//! - Async batch processing of text files
//! - MD5 hash generation for text deduplication
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bert_embedding::{BertModel, EmbeddingConfig};
//!
//! # fn example() -> Result<(), bert_embedding::EmbeddingError> {
//! let model = BertModel::load("models/minilm12-q4.bin", EmbeddingConfig::default())?;
//!
//! let embedding = model.embed_text("This is a test sentence.")?;
//! assert_eq!(embedding.len(), model.size());
//!
//! let tokens = model.tokenize("Hello")?;
//! for token in &tokens {
//!     println!("{} -> {}", token, model.token_string(*token)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod marshal;
pub mod model;
pub mod types;

// Re-export public API
pub use batch::BatchProcessor;
pub use error::{EmbeddingError, EmbeddingResult as Result};
pub use model::BertModel;
pub use types::{cosine_similarity, normalize, EmbeddingConfig, EmbeddingResult, Token};
