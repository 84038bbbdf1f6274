use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during embedding operations
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The native library could not be located or opened
    #[error("Library error: {0}")]
    Loader(#[from] bert_loader::LoaderError),

    /// The native library rejected the model or returned invalid values
    #[error("Model error: {0}")]
    Model(String),

    /// Model file does not exist
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The model was closed and its native context freed
    #[error("Model is closed")]
    ModelClosed,

    /// Text could not be passed across the C boundary
    #[error("Text encoding error: {0}")]
    TextEncoding(String),

    /// Batch call without any inputs
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Token sequence longer than the model accepts
    #[error("Too many tokens: {count} exceeds model maximum of {max}")]
    TooManyTokens { count: usize, max: usize },

    /// Token id without a vocabulary entry
    #[error("Unknown token id: {0}")]
    UnknownToken(i32),

    /// Error during batch processing
    #[error("Batch processing error: {0}")]
    BatchProcessing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when embedding dimensions don't match expectations
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Create a new model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model(message.into())
    }

    /// Create a new text encoding error
    pub fn text_encoding<S: Into<String>>(message: S) -> Self {
        Self::TextEncoding(message.into())
    }

    /// Create a new batch processing error
    pub fn batch_processing<S: Into<String>>(message: S) -> Self {
        Self::BatchProcessing(message.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
