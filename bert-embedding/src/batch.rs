use crate::error::{EmbeddingError, EmbeddingResult as Result};
use crate::model::BertModel;
use crate::types::EmbeddingResult;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Processor for handling batch embedding operations
pub struct BatchProcessor {
    model: Arc<BertModel>,
    batch_size: usize,
}

impl BatchProcessor {
    /// Create a new batch processor with the given model and batch size
    pub fn new(model: Arc<BertModel>, batch_size: usize) -> Self {
        Self { model, batch_size }
    }

    /// Process a batch of texts and return embedding results in input order
    pub async fn process_batch(&mut self, texts: &[String]) -> Result<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if self.batch_size == 0 {
            return Err(EmbeddingError::configuration(
                "Batch size must be greater than 0",
            ));
        }

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.to_vec();
        let batch_size = self.batch_size;

        // Native calls block; keep them off the async workers.
        let (owned, embeddings, lengths, elapsed_ms) =
            tokio::task::spawn_blocking(move || -> Result<_> {
                let start = Instant::now();
                let lengths = owned
                    .iter()
                    .map(|text| model.tokenize(text).map(|tokens| tokens.len()))
                    .collect::<Result<Vec<usize>>>()?;
                let embeddings = model.embed_text_batch(&owned, batch_size)?;
                Ok((owned, embeddings, lengths, start.elapsed().as_millis() as u64))
            })
            .await
            .map_err(|e| EmbeddingError::batch_processing(format!("worker task failed: {}", e)))??;

        let per_text_ms = elapsed_ms / owned.len() as u64;
        debug!(
            "Embedded {} texts in {}ms ({}ms per text)",
            owned.len(),
            elapsed_ms,
            per_text_ms
        );

        Ok(owned
            .into_iter()
            .zip(embeddings)
            .zip(lengths)
            .map(|((text, embedding), length)| {
                EmbeddingResult::new(text, embedding, length, per_text_ms)
            })
            .collect())
    }

    /// Process texts from a file, one text per line; blank lines are skipped
    pub async fn process_file<P: AsRef<Path>>(
        &mut self,
        input_path: P,
    ) -> Result<Vec<EmbeddingResult>> {
        let mut all = Vec::new();
        self.process_file_streaming(input_path, |batch| {
            all.extend(batch);
            Ok(())
        })
        .await?;
        Ok(all)
    }

    /// Process a file batch by batch, handing each finished batch to `on_batch`.
    ///
    /// Returns the number of texts embedded.
    pub async fn process_file_streaming<P, F>(
        &mut self,
        input_path: P,
        mut on_batch: F,
    ) -> Result<usize>
    where
        P: AsRef<Path>,
        F: FnMut(Vec<EmbeddingResult>) -> Result<()>,
    {
        let input_path = input_path.as_ref();
        info!("Processing texts from {}", input_path.display());

        let file = File::open(input_path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut pending: Vec<String> = Vec::with_capacity(self.batch_size);
        let mut processed = 0;

        while let Some(line) = lines.next_line().await? {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            pending.push(text.to_string());

            if pending.len() >= self.batch_size {
                let batch = std::mem::take(&mut pending);
                let results = self.process_batch(&batch).await?;
                processed += results.len();
                on_batch(results)?;
            }
        }

        if !pending.is_empty() {
            let results = self.process_batch(&pending).await?;
            processed += results.len();
            on_batch(results)?;
        }

        info!("Processed {} texts from {}", processed, input_path.display());
        Ok(processed)
    }

    /// Get the configured batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Set a new batch size for processing
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    /// The model used by this processor
    pub fn model(&self) -> &Arc<BertModel> {
        &self.model
    }
}
