use bert_embedding::EmbeddingResult;
use polars::prelude::ParquetWriter as PolarsParquetWriter;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Error types for Parquet operations
#[derive(Error, Debug)]
pub enum ParquetError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema mismatch: expected {expected} dimensions, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Empty embedding vector")]
    EmptyEmbedding,
}

/// Collects embedding results and writes them as one Parquet file.
///
/// Columns: `text`, `text_hash`, `sequence_length`, `processing_time_ms`,
/// then one `emb_{i}` float column per embedding dimension.
pub struct ParquetWriter {
    output_path: PathBuf,
    embedding_dim: usize,
    records_written: usize,
    /// Rows accepted so far, written out on `close`
    frame: Option<DataFrame>,
}

impl ParquetWriter {
    /// Create a new ParquetWriter
    ///
    /// # Arguments
    /// * `output_path` - Path to the output Parquet file
    /// * `embedding_dim` - Dimension of the embedding vectors
    ///
    /// # Returns
    /// * `Result<Self, ParquetError>` - New ParquetWriter or error
    pub fn new(output_path: &Path, embedding_dim: usize) -> Result<Self, ParquetError> {
        if embedding_dim == 0 {
            return Err(ParquetError::EmptyEmbedding);
        }

        debug!(
            "Creating ParquetWriter: path={:?}, embedding_dim={}",
            output_path, embedding_dim
        );

        Ok(Self {
            output_path: output_path.to_path_buf(),
            embedding_dim,
            records_written: 0,
            frame: None,
        })
    }

    /// Append a batch of embedding results
    ///
    /// # Arguments
    /// * `results` - Embedding results, all `embedding_dim` wide
    ///
    /// # Returns
    /// * `Result<(), ParquetError>` - Success or error
    pub fn write_batch(&mut self, results: Vec<EmbeddingResult>) -> Result<(), ParquetError> {
        if results.is_empty() {
            debug!("Skipping empty batch");
            return Ok(());
        }

        for result in results.iter() {
            if result.embedding.len() != self.embedding_dim {
                return Err(ParquetError::SchemaMismatch {
                    expected: self.embedding_dim,
                    actual: result.embedding.len(),
                });
            }
        }

        let chunk = self.to_dataframe(&results)?;
        match self.frame.as_mut() {
            Some(frame) => {
                frame.vstack_mut(&chunk)?;
            }
            None => self.frame = Some(chunk),
        }
        self.records_written += results.len();

        debug!(
            "Buffered batch of {} records (total: {})",
            results.len(),
            self.records_written
        );
        Ok(())
    }

    /// Write the Parquet file and close the writer
    ///
    /// An empty file with the full schema is written when no batch arrived.
    ///
    /// # Returns
    /// * `Result<usize, ParquetError>` - Number of records written or error
    pub fn close(mut self) -> Result<usize, ParquetError> {
        let mut df = match self.frame.take() {
            Some(df) => df,
            None => self.to_dataframe(&[])?,
        };

        let file = std::fs::File::create(&self.output_path)?;
        PolarsParquetWriter::new(file).finish(&mut df)?;

        info!(
            "ParquetWriter closed successfully: {} records written to {:?}",
            self.records_written, self.output_path
        );
        Ok(self.records_written)
    }

    /// Get the number of records written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }

    fn to_dataframe(&self, results: &[EmbeddingResult]) -> Result<DataFrame, ParquetError> {
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        let text_hashes: Vec<&str> = results.iter().map(|r| r.text_hash.as_str()).collect();
        let sequence_lengths: Vec<u32> = results.iter().map(|r| r.sequence_length as u32).collect();
        let processing_times: Vec<u64> = results.iter().map(|r| r.processing_time_ms).collect();

        let mut columns = vec![
            Series::new("text", texts),
            Series::new("text_hash", text_hashes),
            Series::new("sequence_length", sequence_lengths),
            Series::new("processing_time_ms", processing_times),
        ];

        for i in 0..self.embedding_dim {
            let values: Vec<f32> = results.iter().map(|r| r.embedding[i]).collect();
            columns.push(Series::new(&format!("emb_{}", i), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}
