use crate::error::{EmbeddingError, EmbeddingResult as Result};
use crate::marshal::{length_descending_order, restore_order, to_c_int, to_c_string, to_c_strings};
use crate::types::{normalize, EmbeddingConfig, Token};
use bert_loader::{BertApi, BertContext, BertLibrary};
use std::ffi::{c_char, CStr};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Raw native context pointer, null once freed
struct ContextHandle(*mut BertContext);

// SAFETY: the pointer is only dereferenced by the native library while the
// owning `BertModel` holds its mutex, so moving it between threads is sound.
unsafe impl Send for ContextHandle {}

/// A BERT model loaded into the native library.
///
/// The native context is not re-entrant; every call is serialized through an
/// internal mutex, which makes `BertModel` safe to share behind an `Arc`.
pub struct BertModel {
    library: Arc<BertLibrary>,
    context: Mutex<ContextHandle>,
    config: EmbeddingConfig,
    path: PathBuf,
    size: usize,
    max_tokens: usize,
    n_max_tokens: i32,
    threads: i32,
}

impl BertModel {
    /// Load a model file using the process-wide native library
    pub fn load(model_path: impl AsRef<Path>, config: EmbeddingConfig) -> Result<Self> {
        let library = BertLibrary::global()?;
        Self::load_with_library(library, model_path, config)
    }

    /// Load a model file using an explicitly opened library
    pub fn load_with_library(
        library: Arc<BertLibrary>,
        model_path: impl AsRef<Path>,
        config: EmbeddingConfig,
    ) -> Result<Self> {
        config.validate()?;
        let threads = to_c_int(config.threads, "thread count")?;

        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(EmbeddingError::ModelNotFound(path.to_path_buf()));
        }
        let path_str = path.to_str().ok_or_else(|| {
            EmbeddingError::text_encoding(format!(
                "model path is not valid UTF-8: {}",
                path.display()
            ))
        })?;
        let c_path = to_c_string(path_str)?;

        let start = Instant::now();
        let api = *library.api();

        // SAFETY: `c_path` is NUL-terminated and outlives the call.
        let ctx = unsafe { (api.load_from_file)(c_path.as_ptr()) };
        if ctx.is_null() {
            return Err(EmbeddingError::model(format!(
                "failed to load model from {}",
                path.display()
            )));
        }

        // SAFETY: `ctx` is the live context returned above.
        let (n_embd, n_max_tokens) = unsafe { ((api.n_embd)(ctx), (api.n_max_tokens)(ctx)) };
        if n_embd <= 0 || n_max_tokens <= 0 {
            // SAFETY: freeing the context we own; it is not used afterwards.
            unsafe { (api.free)(ctx) };
            return Err(EmbeddingError::model(format!(
                "model reported invalid dimensions (n_embd={}, n_max_tokens={})",
                n_embd, n_max_tokens
            )));
        }

        info!(
            "Loaded model {} in {:.1}ms ({} dimensions, {} max tokens)",
            path.display(),
            start.elapsed().as_secs_f64() * 1000.0,
            n_embd,
            n_max_tokens
        );

        Ok(Self {
            library,
            context: Mutex::new(ContextHandle(ctx)),
            config,
            path: path.to_path_buf(),
            size: n_embd as usize,
            max_tokens: n_max_tokens as usize,
            n_max_tokens,
            threads,
        })
    }

    /// Dimensionality of the embeddings produced by the model
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum number of tokens in a single input sequence
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn threads(&self) -> usize {
        self.threads as usize
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// The native library backing this model
    pub fn library(&self) -> &Arc<BertLibrary> {
        &self.library
    }

    /// Whether the native context is still alive
    pub fn is_open(&self) -> bool {
        match self.context.lock() {
            Ok(guard) => !guard.0.is_null(),
            Err(poisoned) => !poisoned.into_inner().0.is_null(),
        }
    }

    /// Free the native context. Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self
            .context
            .lock()
            .map_err(|_| EmbeddingError::model("model context lock poisoned"))?;

        if !guard.0.is_null() {
            // SAFETY: the pointer is live and nulled right after, so it is freed once.
            unsafe { (self.api().free)(guard.0) };
            guard.0 = ptr::null_mut();
            debug!("Closed model {}", self.path.display());
        }
        Ok(())
    }

    /// Encode a single text into its embedding
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let c_text = to_c_string(text)?;
        let mut embedding = vec![0.0f32; self.size];

        let guard = self.lock_context()?;
        // SAFETY: `embedding` holds exactly n_embd floats and `c_text` outlives the call.
        unsafe {
            (self.api().encode)(guard.0, self.threads, c_text.as_ptr(), embedding.as_mut_ptr())
        };
        drop(guard);

        Ok(self.finish(embedding))
    }

    /// Encode several texts in one native call. Output order matches `texts`.
    pub fn embed_text_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput(
                "no input texts provided".to_string(),
            ));
        }
        let n_batch = self.batch_size_arg(batch_size.min(texts.len()))?;
        let n_inputs = to_c_int(texts.len(), "input count")?;

        let c_texts = to_c_strings(texts)?;
        let text_ptrs: Vec<*const c_char> = c_texts.iter().map(|s| s.as_ptr()).collect();

        let mut embeddings: Vec<Vec<f32>> = (0..texts.len()).map(|_| vec![0.0; self.size]).collect();
        let mut out_ptrs: Vec<*mut f32> = embeddings.iter_mut().map(|e| e.as_mut_ptr()).collect();

        debug!("Encoding batch of {} texts (batch size {})", texts.len(), n_batch);

        let guard = self.lock_context()?;
        // SAFETY: `text_ptrs` and `out_ptrs` each have `n_inputs` entries; every
        // text is NUL-terminated and every output buffer holds n_embd floats.
        // All backing storage outlives the call.
        unsafe {
            (self.api().encode_batch)(
                guard.0,
                self.threads,
                n_batch,
                n_inputs,
                text_ptrs.as_ptr(),
                out_ptrs.as_mut_ptr(),
            )
        };
        drop(guard);

        Ok(embeddings.into_iter().map(|e| self.finish(e)).collect())
    }

    /// Split `text` into vocabulary ids, truncated to [`BertModel::max_tokens`]
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let c_text = to_c_string(text)?;
        let mut buffer = vec![0i32; self.max_tokens];
        let mut n_tokens: i32 = 0;

        let guard = self.lock_context()?;
        // SAFETY: `buffer` has room for `n_max_tokens` ids and `n_tokens` is a valid out pointer.
        unsafe {
            (self.api().tokenize)(
                guard.0,
                c_text.as_ptr(),
                buffer.as_mut_ptr(),
                &mut n_tokens,
                self.n_max_tokens,
            )
        };
        drop(guard);

        if n_tokens > self.n_max_tokens {
            warn!(
                "Native tokenizer reported {} tokens for a {}-token buffer",
                n_tokens, self.n_max_tokens
            );
        }
        let count = usize::try_from(n_tokens).unwrap_or(0).min(self.max_tokens);
        buffer.truncate(count);
        Ok(buffer.into_iter().map(Token).collect())
    }

    /// Embed an already tokenized sequence
    pub fn embed_tokens(&self, tokens: &[Token]) -> Result<Vec<f32>> {
        if tokens.is_empty() {
            return Err(EmbeddingError::EmptyInput(
                "no tokens provided".to_string(),
            ));
        }
        self.check_token_count(tokens.len())?;

        let mut ids: Vec<i32> = tokens.iter().map(|t| t.0).collect();
        let n_tokens = to_c_int(ids.len(), "token count")?;
        let mut embedding = vec![0.0f32; self.size];

        let guard = self.lock_context()?;
        // SAFETY: `ids` holds `n_tokens` ids and `embedding` holds n_embd floats.
        unsafe {
            (self.api().eval)(
                guard.0,
                self.threads,
                ids.as_mut_ptr(),
                n_tokens,
                embedding.as_mut_ptr(),
            )
        };
        drop(guard);

        Ok(self.finish(embedding))
    }

    /// Embed several token sequences. Output order matches `batches`.
    ///
    /// The native batcher sizes each batch by its first sequence, so sequences
    /// are submitted longest first in chunks of `batch_size`.
    pub fn embed_tokens_batch(
        &self,
        batches: &[Vec<Token>],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>> {
        if batches.is_empty() {
            return Err(EmbeddingError::EmptyInput(
                "no input token sequences provided".to_string(),
            ));
        }
        self.batch_size_arg(batch_size)?;
        for sequence in batches {
            self.check_token_count(sequence.len())?;
        }

        let lengths: Vec<usize> = batches.iter().map(Vec::len).collect();
        let order = length_descending_order(&lengths);
        let mut sorted: Vec<Vec<f32>> = Vec::with_capacity(batches.len());

        let guard = self.lock_context()?;
        for chunk in order.chunks(batch_size) {
            let mut ids: Vec<Vec<i32>> = chunk
                .iter()
                .map(|&i| batches[i].iter().map(|t| t.0).collect())
                .collect();
            let mut n_tokens: Vec<i32> = ids
                .iter()
                .map(|seq| to_c_int(seq.len(), "token count"))
                .collect::<Result<_>>()?;
            let mut token_ptrs: Vec<*mut i32> = ids
                .iter_mut()
                .map(|seq| {
                    if seq.is_empty() {
                        ptr::null_mut()
                    } else {
                        seq.as_mut_ptr()
                    }
                })
                .collect();

            let mut outputs: Vec<Vec<f32>> =
                (0..chunk.len()).map(|_| vec![0.0; self.size]).collect();
            let mut out_ptrs: Vec<*mut f32> =
                outputs.iter_mut().map(|e| e.as_mut_ptr()).collect();
            let n_batch = to_c_int(chunk.len(), "batch size")?;

            // SAFETY: the three pointer arrays have `n_batch` entries each;
            // token pointers are null only where the count is 0, and every
            // output buffer holds n_embd floats. Storage outlives the call.
            unsafe {
                (self.api().eval_batch)(
                    guard.0,
                    self.threads,
                    n_batch,
                    token_ptrs.as_mut_ptr(),
                    n_tokens.as_mut_ptr(),
                    out_ptrs.as_mut_ptr(),
                )
            };

            sorted.extend(outputs);
        }
        drop(guard);

        let embeddings = sorted.into_iter().map(|e| self.finish(e)).collect();
        Ok(restore_order(embeddings, &order))
    }

    /// Vocabulary string for a token id
    pub fn token_string(&self, token: Token) -> Result<String> {
        if token.0 < 0 {
            return Err(EmbeddingError::UnknownToken(token.0));
        }

        let guard = self.lock_context()?;
        // SAFETY: the context is live while the guard is held.
        let raw = unsafe { (self.api().vocab_id_to_token)(guard.0, token.0) };
        if raw.is_null() {
            return Err(EmbeddingError::UnknownToken(token.0));
        }

        // SAFETY: non-null pointer into the model vocabulary, valid while the
        // context lives; copied out before the guard is released.
        let value = unsafe { CStr::from_ptr(raw) }
            .to_str()
            .map_err(|e| {
                EmbeddingError::text_encoding(format!("token {} is not valid UTF-8: {}", token, e))
            })?
            .to_owned();
        drop(guard);

        Ok(value)
    }

    fn api(&self) -> &BertApi {
        self.library.api()
    }

    fn lock_context(&self) -> Result<MutexGuard<'_, ContextHandle>> {
        let guard = self
            .context
            .lock()
            .map_err(|_| EmbeddingError::model("model context lock poisoned"))?;
        if guard.0.is_null() {
            return Err(EmbeddingError::ModelClosed);
        }
        Ok(guard)
    }

    fn batch_size_arg(&self, batch_size: usize) -> Result<i32> {
        if batch_size == 0 {
            return Err(EmbeddingError::configuration(
                "Batch size must be greater than 0",
            ));
        }
        to_c_int(batch_size, "batch size")
    }

    fn check_token_count(&self, count: usize) -> Result<()> {
        if count > self.max_tokens {
            return Err(EmbeddingError::TooManyTokens {
                count,
                max: self.max_tokens,
            });
        }
        Ok(())
    }

    fn finish(&self, mut embedding: Vec<f32>) -> Vec<f32> {
        if self.config.normalize_embeddings {
            normalize(&mut embedding);
        }
        embedding
    }
}

impl Drop for BertModel {
    fn drop(&mut self) {
        let handle = match self.context.get_mut() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !handle.0.is_null() {
            // SAFETY: last owner of a live context.
            unsafe { (self.library.api().free)(handle.0) };
            handle.0 = ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for BertModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertModel")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("max_tokens", &self.max_tokens)
            .field("threads", &self.threads)
            .field("open", &self.is_open())
            .finish()
    }
}
