use crate::error::{EmbeddingError, EmbeddingResult as Result};
use serde::{Deserialize, Serialize};

/// Largest batch size accepted by [`EmbeddingConfig::validate`]
pub const MAX_BATCH_SIZE: usize = 1024;

/// Upper bound for the default thread count
pub const DEFAULT_MAX_THREADS: usize = 6;

/// Vocabulary id produced by the native tokenizer
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub i32);

impl Token {
    pub fn id(self) -> i32 {
        self.0
    }
}

impl From<i32> for Token {
    fn from(id: i32) -> Self {
        Token(id)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single text embedding operation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The original text that was embedded
    pub text: String,
    /// MD5 hash of the text for deduplication
    pub text_hash: String,
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Length of the tokenized sequence
    pub sequence_length: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl EmbeddingResult {
    /// Create a new embedding result
    pub fn new(
        text: String,
        embedding: Vec<f32>,
        sequence_length: usize,
        processing_time_ms: u64,
    ) -> Self {
        let text_hash = format!("{:x}", md5::compute(&text));
        Self {
            text,
            text_hash,
            embedding,
            sequence_length,
            processing_time_ms,
        }
    }
}

/// Configuration for embedding operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Threads the native library may use per call
    pub threads: usize,
    /// Batch size for processing multiple texts
    pub batch_size: usize,
    /// Whether to normalize embedding vectors to unit length
    pub normalize_embeddings: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get().clamp(1, DEFAULT_MAX_THREADS),
            batch_size: 32,
            normalize_embeddings: false,
        }
    }
}

impl EmbeddingConfig {
    /// Validate the embedding configuration
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(EmbeddingError::configuration(
                "Thread count must be greater than 0",
            ));
        }
        if i32::try_from(self.threads).is_err() {
            return Err(EmbeddingError::configuration(format!(
                "Thread count {} does not fit in a C int",
                self.threads
            )));
        }
        if self.batch_size == 0 {
            return Err(EmbeddingError::configuration(
                "Batch size must be greater than 0",
            ));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(EmbeddingError::configuration(format!(
                "Batch size {} exceeds maximum of {}",
                self.batch_size, MAX_BATCH_SIZE
            )));
        }
        Ok(())
    }
}

/// Scale `embedding` to unit L2 norm in place. Zero vectors are left as-is.
pub fn normalize(embedding: &mut [f32]) {
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in embedding.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity of two embeddings of the same dimension
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
